//! Error types for the pavemend library.
//!
//! Data-quality defects (bad headers, bad values, duplicate rows) are never
//! errors: they travel in validation reports so the caller can show every
//! problem at once. This enum covers caller mistakes and internal failures
//! only.

use thiserror::Error;

/// Main error type for pavemend operations.
#[derive(Debug, Error)]
pub enum PavemendError {
    /// Requested schema profile does not exist.
    #[error("Unknown profile '{0}' (expected deflection, lte_season, or lte_crack)")]
    UnknownProfile(String),

    /// Error from the CSV reader.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty input or no header row to work with.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// `apply_fixes` was called before the session was fully resolved.
    #[error("Session is not ready to apply: {}", blockers.join("; "))]
    NotReady {
        /// Human-readable descriptions of everything still unresolved.
        blockers: Vec<String>,
    },

    /// The apply step produced a dataset that still fails validation.
    ///
    /// This is an internal-consistency failure (the resolution set the
    /// caller handed over was incomplete), not a data-quality report, and
    /// must not be surfaced to end users as a validation message.
    #[error("Applied dataset still has {remaining} defect(s); resolution set was incomplete")]
    Inconsistent {
        /// Number of defects left after applying every fix.
        remaining: usize,
    },

    /// A pipeline operation was invoked out of order.
    #[error("Invalid pipeline state: expected {expected}, found {found}")]
    InvalidState {
        expected: &'static str,
        found: &'static str,
    },

    /// JSON serialization error (report export).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for pavemend operations.
pub type Result<T> = std::result::Result<T, PavemendError>;
