// 🏛️ Registry lookup - status of an id number at the fiscal registry
//
// Only a simulated client exists: random latency, probabilistic status.
// A real client plugs in through the RegistryClient trait.

use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::records::RegistryStatus;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Capability the pipeline calls once per valid record.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    async fn check_status(
        &self,
        id_number: &str,
        is_valid: bool,
    ) -> Result<RegistryStatus, RegistryError>;
}

/// Map a uniform draw in [0, 1) to a status
pub fn status_for_draw(r: f64, config: &RegistryConfig) -> RegistryStatus {
    if r > config.cancelled_threshold {
        RegistryStatus::Cancelled
    } else if r > config.suspended_threshold {
        RegistryStatus::Suspended
    } else {
        RegistryStatus::Regular
    }
}

/// Simulated registry: 200-800 ms latency, ~90% REGULAR / ~5% SUSPENSO /
/// ~5% CANCELADO. Invalid numbers always resolve to NULO.
pub struct SimulatedRegistry {
    config: RegistryConfig,
    rng: Mutex<StdRng>,
}

impl SimulatedRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        SimulatedRegistry {
            config,
            rng: Mutex::new(rng),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Draw (delay, r) under the lock, released before any await
    fn draw(&self) -> (Duration, f64) {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let delay_ms = rng.gen_range(self.config.min_delay_ms..=self.config.max_delay_ms);
        let r: f64 = rng.gen();
        (Duration::from_millis(delay_ms), r)
    }
}

impl Default for SimulatedRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

#[async_trait]
impl RegistryClient for SimulatedRegistry {
    async fn check_status(
        &self,
        id_number: &str,
        is_valid: bool,
    ) -> Result<RegistryStatus, RegistryError> {
        let (delay, r) = self.draw();
        tokio::time::sleep(delay).await;

        let status = if is_valid {
            status_for_draw(r, &self.config)
        } else {
            RegistryStatus::Null
        };

        debug!(
            id_number,
            delay_ms = delay.as_millis() as u64,
            status = status.as_wire(),
            "registry lookup resolved"
        );
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tokio::time::Instant;

    #[test]
    fn test_status_for_draw_thresholds() {
        let config = RegistryConfig::default();
        assert_eq!(status_for_draw(0.0, &config), RegistryStatus::Regular);
        assert_eq!(status_for_draw(0.90, &config), RegistryStatus::Regular);
        assert_eq!(status_for_draw(0.91, &config), RegistryStatus::Suspended);
        assert_eq!(status_for_draw(0.95, &config), RegistryStatus::Suspended);
        assert_eq!(status_for_draw(0.951, &config), RegistryStatus::Cancelled);
        assert_eq!(status_for_draw(0.999, &config), RegistryStatus::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_resolves_null() {
        let registry = SimulatedRegistry::default();
        for _ in 0..20 {
            let status = registry.check_status("12345678900", false).await.unwrap();
            assert_eq!(status, RegistryStatus::Null);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_valid_resolves_within_window() {
        let registry = SimulatedRegistry::new(RegistryConfig::builder().seed(42).build());
        let allowed: HashSet<RegistryStatus> = [
            RegistryStatus::Regular,
            RegistryStatus::Suspended,
            RegistryStatus::Cancelled,
        ]
        .into_iter()
        .collect();

        for _ in 0..50 {
            let start = Instant::now();
            let status = registry.check_status("06819885253", true).await.unwrap();
            let elapsed = start.elapsed();

            assert!(allowed.contains(&status));
            assert!(elapsed >= Duration::from_millis(200), "{:?}", elapsed);
            assert!(elapsed <= Duration::from_millis(801), "{:?}", elapsed);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_seed_is_reproducible() {
        let config = RegistryConfig::builder().seed(7).build();
        let a = SimulatedRegistry::new(config.clone());
        let b = SimulatedRegistry::new(config);

        for _ in 0..20 {
            assert_eq!(
                a.check_status("06819885253", true).await.unwrap(),
                b.check_status("06819885253", true).await.unwrap()
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_negative_thresholds_always_cancelled() {
        let config = RegistryConfig::builder()
            .thresholds(-1.0, -1.0)
            .delay_ms(0, 0)
            .build();
        let registry = SimulatedRegistry::new(config);
        let status = registry.check_status("06819885253", true).await.unwrap();
        assert_eq!(status, RegistryStatus::Cancelled);
    }
}
