// ⚙️ Configuration - simulated registry and server settings from environment

use std::time::Duration;

/// Settings for the simulated registry lookup.
///
/// A draw `r` in [0, 1) resolves to CANCELADO when `r > cancelled_threshold`,
/// SUSPENSO when `r > suspended_threshold`, REGULAR otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub suspended_threshold: f64,
    pub cancelled_threshold: f64,
    /// Fixed seed for reproducible draws
    pub seed: Option<u64>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            min_delay_ms: 200,
            max_delay_ms: 800,
            suspended_threshold: 0.90,
            cancelled_threshold: 0.95,
            seed: None,
        }
    }
}

impl RegistryConfig {
    /// Load from `VALID_GUARD_*` environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let min_delay_ms = env_parse("VALID_GUARD_MIN_DELAY_MS").unwrap_or(defaults.min_delay_ms);
        let max_delay_ms = env_parse("VALID_GUARD_MAX_DELAY_MS").unwrap_or(defaults.max_delay_ms);
        let suspended_threshold = env_parse("VALID_GUARD_SUSPENDED_THRESHOLD")
            .unwrap_or(defaults.suspended_threshold);
        let cancelled_threshold = env_parse("VALID_GUARD_CANCELLED_THRESHOLD")
            .unwrap_or(defaults.cancelled_threshold);
        let seed = env_parse("VALID_GUARD_SEED");

        RegistryConfig {
            min_delay_ms,
            max_delay_ms,
            suspended_threshold,
            cancelled_threshold,
            seed,
        }
        .normalized()
    }

    /// Builder entry point, mostly for tests
    pub fn builder() -> RegistryConfigBuilder {
        RegistryConfigBuilder {
            config: Self::default(),
        }
    }

    /// Delay window as durations, min first
    pub fn delay_window(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.min_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }

    /// Swap inverted bounds so the delay window and thresholds stay usable
    fn normalized(mut self) -> Self {
        if self.min_delay_ms > self.max_delay_ms {
            std::mem::swap(&mut self.min_delay_ms, &mut self.max_delay_ms);
        }
        if self.suspended_threshold > self.cancelled_threshold {
            std::mem::swap(&mut self.suspended_threshold, &mut self.cancelled_threshold);
        }
        self
    }
}

/// Builder for constructing `RegistryConfig` in tests.
pub struct RegistryConfigBuilder {
    config: RegistryConfig,
}

impl RegistryConfigBuilder {
    pub fn delay_ms(mut self, min: u64, max: u64) -> Self {
        self.config.min_delay_ms = min;
        self.config.max_delay_ms = max;
        self
    }

    pub fn thresholds(mut self, suspended: f64, cancelled: f64) -> Self {
        self.config.suspended_threshold = suspended;
        self.config.cancelled_threshold = cancelled;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn build(self) -> RegistryConfig {
        self.config.normalized()
    }
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub addr: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        ServerConfig {
            addr: std::env::var("VALID_GUARD_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into()),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
