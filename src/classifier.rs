// 📊 Record Classifier - display enrichment, filtering and summary stats
//
// Pure transformations over a snapshot of the record collection.
// The active filter is always passed in explicitly.

use crate::format::format_id_number;
use crate::records::{RegistryStatus, ValidatedRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// FILTER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Filter {
    #[default]
    All,
    Valid,
    Invalid,
    /// Registry status REGULAR (implies valid)
    Regular,
}

impl Filter {
    /// Filters in the order they are offered to users
    pub const ALL_FILTERS: [Filter; 4] = [Filter::All, Filter::Valid, Filter::Regular, Filter::Invalid];

    pub fn matches(&self, record: &ValidatedRecord) -> bool {
        match self {
            Filter::All => true,
            Filter::Valid => record.is_valid,
            Filter::Invalid => !record.is_valid,
            Filter::Regular => record.registry_status == RegistryStatus::Regular,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Filter::All => "Todos",
            Filter::Valid => "Apenas Válidos",
            Filter::Invalid => "Inválidos",
            Filter::Regular => "Situação Regular",
        }
    }

    /// Next filter in UI order, wrapping around
    pub fn next(&self) -> Self {
        let i = Self::ALL_FILTERS.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL_FILTERS[(i + 1) % Self::ALL_FILTERS.len()]
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Filter::All => "ALL",
            Filter::Valid => "VALID",
            Filter::Invalid => "INVALID",
            Filter::Regular => "REGULAR",
        };
        f.write_str(s)
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "" => Ok(Filter::All),
            "valid" => Ok(Filter::Valid),
            "invalid" => Ok(Filter::Invalid),
            "regular" => Ok(Filter::Regular),
            other => Err(format!(
                "unknown filter '{}': expected all, valid, invalid or regular",
                other
            )),
        }
    }
}

// ============================================================================
// DISPLAY RECORD
// ============================================================================

/// Semantic color of a label, rendered by each frontend its own way
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorTag {
    Success,
    Danger,
    Info,
    Warning,
    InProgress,
    Neutral,
}

impl ColorTag {
    pub fn for_validity(is_valid: bool) -> Self {
        if is_valid {
            ColorTag::Success
        } else {
            ColorTag::Danger
        }
    }

    pub fn for_registry(status: RegistryStatus) -> Self {
        match status {
            RegistryStatus::Regular => ColorTag::Info,
            RegistryStatus::Suspended => ColorTag::Warning,
            RegistryStatus::Cancelled => ColorTag::Danger,
            RegistryStatus::Pending => ColorTag::InProgress,
            _ => ColorTag::Neutral,
        }
    }
}

/// ValidatedRecord plus presentation fields. Recomputed on every render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRecord {
    #[serde(flatten)]
    pub record: ValidatedRecord,
    pub formatted_id_number: String,
    pub status_label: String,
    pub status_color: ColorTag,
    pub registry_label: String,
    pub registry_color: ColorTag,
}

/// Derive the presentation fields of one record
pub fn enrich(record: ValidatedRecord) -> DisplayRecord {
    let formatted_id_number = if record.is_valid {
        format_id_number(&record.id_number)
    } else {
        record.id_number.clone()
    };
    let status_label = if record.is_valid { "Válido" } else { "Inválido" };

    DisplayRecord {
        formatted_id_number,
        status_label: status_label.to_string(),
        status_color: ColorTag::for_validity(record.is_valid),
        registry_label: record.registry_status.as_wire().to_string(),
        registry_color: ColorTag::for_registry(record.registry_status),
        record,
    }
}

/// Enrich every record, then keep those matching `filter` (order preserved)
pub fn classify(records: &[ValidatedRecord], filter: Filter) -> Vec<DisplayRecord> {
    records
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .map(enrich)
        .collect()
}

// ============================================================================
// SUMMARY
// ============================================================================

/// Aggregate over the full collection, independent of the active filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub regular_count: usize,
    /// Percentage with one decimal ("66.7%"), "0%" when empty
    pub valid_rate: String,
}

impl SummaryStats {
    pub fn summary(&self) -> String {
        format!(
            "Total: {}, Válidos: {}, Inválidos: {}, Regulares: {}, Taxa: {}",
            self.total, self.valid_count, self.invalid_count, self.regular_count, self.valid_rate
        )
    }
}

pub fn summarize(records: &[ValidatedRecord]) -> SummaryStats {
    let total = records.len();
    let valid_count = records.iter().filter(|r| r.is_valid).count();
    let regular_count = records
        .iter()
        .filter(|r| r.registry_status == RegistryStatus::Regular)
        .count();

    let valid_rate = if total == 0 {
        "0%".to_string()
    } else {
        // Tenths of a percent, ties round up
        let tenths = (valid_count * 1000 + total / 2) / total;
        format!("{}.{}%", tenths / 10, tenths % 10)
    };

    SummaryStats {
        total,
        valid_count,
        invalid_count: total - valid_count,
        regular_count,
        valid_rate,
    }
}
