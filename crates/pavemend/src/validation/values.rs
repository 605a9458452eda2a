//! Per-row value constraint checks.

use serde::{Deserialize, Serialize};

use crate::input::{CellValue, SurveyTable};
use crate::schema::{ProfileKind, SchemaProfile};

use super::headers::classify_headers;

/// Measurement-point spacing for deflection readings, in DMI units.
pub const DMI_STEP: f64 = 50.0;

/// What kind of constraint a value violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueIssueKind {
    /// Parseable number outside its allowed bounds.
    OutOfRange,
    /// DMI value that is not a multiple of the measurement spacing.
    NotDivisible,
    /// Text or malformed token where a constrained value was expected.
    BadFormat,
    /// Required value left blank.
    Empty,
}

impl ValueIssueKind {
    pub fn label(&self) -> &'static str {
        match self {
            ValueIssueKind::OutOfRange => "out of range",
            ValueIssueKind::NotDivisible => "not divisible",
            ValueIssueKind::BadFormat => "bad format",
            ValueIssueKind::Empty => "empty required value",
        }
    }
}

/// One value defect, pinned to its row and column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueIssue {
    /// Zero-based data row index (header row excluded).
    pub row: usize,
    /// Column the offending value sits under.
    pub column: String,
    pub kind: ValueIssueKind,
    /// Exact offending value plus what was expected.
    pub detail: String,
}

/// Check every row against the profile's per-column constraints.
///
/// Issues accumulate; a row with three bad cells yields three issues.
pub fn check_values(
    table: &SurveyTable,
    profile: &SchemaProfile,
    current_year: i32,
) -> Vec<ValueIssue> {
    let mut issues = Vec::new();

    if let Some(identity_col) = table.column_index(profile.identity_column) {
        for (row, cell) in table.column_values(identity_col).enumerate() {
            let issue = match profile.kind {
                ProfileKind::Deflection => check_dmi(cell),
                _ => check_year(cell, current_year),
            };
            if let Some((kind, detail)) = issue {
                issues.push(ValueIssue {
                    row,
                    column: profile.identity_column.to_string(),
                    kind,
                    detail,
                });
            }
        }
    }

    // Measurement cells under already-valid headers must be numeric or blank.
    let header_report = classify_headers(table, profile, current_year);
    for (col, header) in table.headers.iter().enumerate() {
        if header == profile.identity_column || !header_report.valid.contains(header) {
            continue;
        }
        for (row, cell) in table.column_values(col).enumerate() {
            if let CellValue::Text(raw) = cell {
                issues.push(ValueIssue {
                    row,
                    column: header.clone(),
                    kind: ValueIssueKind::BadFormat,
                    detail: format!("'{raw}' is not a numeric measurement"),
                });
            }
        }
    }

    issues.sort_by(|a, b| (a.row, &a.column).cmp(&(b.row, &b.column)));
    issues
}

/// DMI: required, numeric, non-negative, and on the 50-unit grid (0 is valid).
fn check_dmi(cell: &CellValue) -> Option<(ValueIssueKind, String)> {
    match cell {
        CellValue::Empty => Some((
            ValueIssueKind::Empty,
            "DMI is required and must not be blank".to_string(),
        )),
        CellValue::Text(raw) => Some((
            ValueIssueKind::BadFormat,
            format!("'{raw}' does not parse as a number"),
        )),
        CellValue::Numeric(n) if *n < 0.0 => Some((
            ValueIssueKind::OutOfRange,
            format!("{} is negative; DMI must be >= 0", cell.render()),
        )),
        CellValue::Numeric(n) if n % DMI_STEP != 0.0 => Some((
            ValueIssueKind::NotDivisible,
            format!("{} is not a multiple of {}", cell.render(), DMI_STEP as i64),
        )),
        CellValue::Numeric(_) => None,
    }
}

/// Year: exactly four digits and not beyond the current calendar year.
fn check_year(cell: &CellValue, current_year: i32) -> Option<(ValueIssueKind, String)> {
    let year = match cell {
        CellValue::Numeric(n) if n.fract() == 0.0 => *n as i64,
        CellValue::Empty => {
            return Some((
                ValueIssueKind::BadFormat,
                "Year is required and must not be blank".to_string(),
            ))
        }
        other => {
            return Some((
                ValueIssueKind::BadFormat,
                format!("'{}' is not a 4-digit year", other.render()),
            ))
        }
    };

    if !(1000..=9999).contains(&year) {
        return Some((
            ValueIssueKind::BadFormat,
            format!("'{}' is not a 4-digit year", cell.render()),
        ));
    }
    if year > i64::from(current_year) {
        return Some((
            ValueIssueKind::OutOfRange,
            format!("{year} is beyond the current year {current_year}"),
        ));
    }
    None
}
