//! Defect detection over parsed tables.
//!
//! All three detectors run over the same parsed rows and accumulate their
//! findings into one report. Nothing here returns an error for bad data:
//! the report *is* the result, complete in a single pass.

mod duplicates;
mod headers;
mod values;

pub use duplicates::{canonical_key, detect_duplicates, DuplicateGroup};
pub use headers::{
    canonical_header, classify_headers, is_valid_header, DuplicateHeader, HeaderCopy,
    HeaderReport, InvalidHeader, InvalidHeaderReason,
};
pub use values::{check_values, ValueIssue, ValueIssueKind, DMI_STEP};

use serde::{Deserialize, Serialize};

use crate::input::SurveyTable;
use crate::schema::SchemaProfile;

/// Everything `validate` found, in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Header partition: valid / missing / invalid / duplicate.
    pub headers: HeaderReport,
    /// Per-row value constraint violations.
    pub value_issues: Vec<ValueIssue>,
    /// Rows sharing an identity key.
    pub duplicate_groups: Vec<DuplicateGroup>,
}

impl ValidationReport {
    /// True when the table already satisfies the target schema.
    pub fn is_clean(&self) -> bool {
        self.defect_count() == 0
    }

    /// Total number of distinct defects across all three detectors.
    pub fn defect_count(&self) -> usize {
        self.headers.defect_count() + self.value_issues.len() + self.duplicate_groups.len()
    }
}

/// Run every detector over the table and collect the full defect set.
///
/// `current_year` is injected rather than read from a clock so the same
/// input always yields the same report.
pub fn validate(
    table: &SurveyTable,
    profile: &SchemaProfile,
    current_year: i32,
) -> ValidationReport {
    ValidationReport {
        headers: classify_headers(table, profile, current_year),
        value_issues: check_values(table, profile, current_year),
        duplicate_groups: detect_duplicates(table, profile),
    }
}
