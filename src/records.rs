// 🗂️ Records - validated records, registry status and the shared in-memory store

use crate::checksum::validate;
use crate::error::{Result, ValidGuardError};
use crate::extraction::CandidateRecord;
use crate::region::resolve_region;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

// ============================================================================
// REGISTRY STATUS
// ============================================================================

/// Lifecycle state reported by the fiscal registry (Receita Federal).
/// Serialized with the registry's own wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistryStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "REGULAR")]
    Regular,
    #[serde(rename = "SUSPENSO")]
    Suspended,
    #[serde(rename = "CANCELADO")]
    Cancelled,
    #[serde(rename = "NULO")]
    Null,
    #[serde(rename = "ERROR")]
    Error,
}

impl RegistryStatus {
    /// Wire value used in labels and exports
    pub fn as_wire(&self) -> &'static str {
        match self {
            RegistryStatus::Pending => "PENDING",
            RegistryStatus::Regular => "REGULAR",
            RegistryStatus::Suspended => "SUSPENSO",
            RegistryStatus::Cancelled => "CANCELADO",
            RegistryStatus::Null => "NULO",
            RegistryStatus::Error => "ERROR",
        }
    }

    /// Still waiting on the registry
    pub fn is_pending(&self) -> bool {
        *self == RegistryStatus::Pending
    }
}

impl fmt::Display for RegistryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl FromStr for RegistryStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(RegistryStatus::Pending),
            "REGULAR" => Ok(RegistryStatus::Regular),
            "SUSPENSO" | "SUSPENDED" => Ok(RegistryStatus::Suspended),
            "CANCELADO" | "CANCELLED" => Ok(RegistryStatus::Cancelled),
            "NULO" | "NULL" => Ok(RegistryStatus::Null),
            "ERROR" => Ok(RegistryStatus::Error),
            other => Err(format!("unknown registry status: {}", other)),
        }
    }
}

// ============================================================================
// VALIDATED RECORD
// ============================================================================

/// A checked id number with its person data.
///
/// `region` is `Some` exactly when `is_valid` is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRecord {
    /// Stable identity (UUID) - the key status updates are applied by
    pub id: String,
    pub name: String,
    /// Digits as received, any length
    pub id_number: String,
    pub date_of_birth: String,
    pub is_valid: bool,
    pub region: Option<String>,
    pub registry_status: RegistryStatus,
    pub checked_at: DateTime<Utc>,
}

impl ValidatedRecord {
    /// Build a record for a raw id number and person data.
    ///
    /// Valid numbers start `PENDING` (a registry check will follow), invalid
    /// ones start as `ERROR` and are never sent to the registry.
    pub fn new(name: String, id_number: String, date_of_birth: String) -> Self {
        let is_valid = validate(&id_number);
        let region = is_valid.then(|| resolve_region(&id_number).to_string());
        let registry_status = if is_valid {
            RegistryStatus::Pending
        } else {
            RegistryStatus::Error
        };

        ValidatedRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            id_number,
            date_of_birth,
            is_valid,
            region,
            registry_status,
            checked_at: Utc::now(),
        }
    }

    /// Re-validates instead of trusting the extraction-time flag
    pub fn from_candidate(candidate: CandidateRecord) -> Self {
        Self::new(candidate.name, candidate.id_number, candidate.date_of_birth)
    }

    /// Bare number from a pasted list, no person data
    pub fn from_id_number(id_number: String) -> Self {
        Self::new(String::new(), id_number, String::new())
    }

    /// Needs a registry lookup
    pub fn awaiting_registry(&self) -> bool {
        self.is_valid && self.registry_status.is_pending()
    }
}

// ============================================================================
// RECORD STORE
// ============================================================================

/// Shared, newest-first collection of validated records.
///
/// Cloning the store clones the handle, not the records. Every status
/// update touches a single record (by id), so concurrent checks never race
/// each other.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    inner: Arc<Mutex<Vec<ValidatedRecord>>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ValidatedRecord>> {
        // A panicked writer cannot leave a half-written record behind
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Put a batch in front of everything stored so far, keeping batch order
    pub fn prepend_batch(&self, batch: Vec<ValidatedRecord>) {
        let mut records = self.lock();
        records.splice(0..0, batch);
    }

    /// Replace the status of the record with `id`. Last writer wins.
    ///
    /// Returns false when no record has that id.
    pub fn update_status(&self, id: &str, status: RegistryStatus) -> bool {
        let mut records = self.lock();
        match records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.registry_status = status;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<ValidatedRecord> {
        self.lock().iter().find(|r| r.id == id).cloned()
    }

    /// Copy of the current collection, newest first
    pub fn snapshot(&self) -> Vec<ValidatedRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Records still waiting on the registry
    pub fn pending_count(&self) -> usize {
        self.lock().iter().filter(|r| r.awaiting_registry()).count()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

// ============================================================================
// INPUT
// ============================================================================

/// Read an uploaded file (.txt / .csv / .json or anything else) as raw text.
/// No structured parsing happens here.
pub fn read_input(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| ValidGuardError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read all of standard input as raw text
pub fn read_stdin() -> Result<String> {
    let mut bytes = Vec::new();
    std::io::stdin()
        .read_to_end(&mut bytes)
        .map_err(|source| ValidGuardError::Io {
            path: "<stdin>".to_string(),
            source,
        })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
