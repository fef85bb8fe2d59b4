// Valid Guard - Core Library
// CPF validation, extraction from free text and registry status checks.
// Exposes all modules for use in CLI, API server, and tests

pub mod checksum;
pub mod region;
pub mod format;
pub mod extraction;
pub mod records;
pub mod classifier;
pub mod registry;
pub mod pipeline;
pub mod export;
pub mod form;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use checksum::{check_digits, compute_check_digit, strip_digits, validate};
pub use region::{resolve_region, UNKNOWN_REGION};
pub use format::{format_id_number, mask_date_of_birth};
pub use extraction::{
    extract_id_numbers, extract_records, CandidateRecord, LineMatcher, MatchKind,
};
pub use records::{read_input, read_stdin, RecordStore, RegistryStatus, ValidatedRecord};
pub use classifier::{classify, enrich, summarize, ColorTag, DisplayRecord, Filter, SummaryStats};
pub use registry::{status_for_draw, RegistryClient, SimulatedRegistry};
pub use pipeline::{Pipeline, StatusUpdate, Submission};
pub use export::{render_csv, write_csv, ExportLayout};
pub use form::{validate_form, FieldErrors, FormData, FormValidation};
pub use config::{RegistryConfig, ServerConfig};
pub use error::{RegistryError, ValidGuardError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
