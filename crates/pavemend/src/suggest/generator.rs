//! Suggestion set construction from a validation report.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::input::SurveyTable;
use crate::schema::{ProfileKind, SchemaProfile};
use crate::validation::{ValidationReport, DMI_STEP};

use super::matcher::{match_header, RuleOutcome};

/// Proposed rename for one invalid header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSuggestion {
    /// Header as it appeared in the input.
    pub from: String,
    /// Proposed canonical target. `None` means no confident correction;
    /// the column should be deleted or named manually.
    pub to: Option<String>,
    /// Which matching rule produced the target, for auditability. Not
    /// read back in: a deserialized suggestion carries no rule.
    #[serde(skip_serializing_if = "Option::is_none", skip_deserializing)]
    pub rule: Option<&'static str>,
}

/// Two or more source headers resolving to one canonical target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionCollision {
    /// The contested target name.
    pub target: String,
    /// Every source header proposing that target. When the target already
    /// exists as a valid input header, that header is listed here too.
    pub sources: Vec<String>,
}

/// Proposed correction for one distinct offending identity value.
///
/// Surfaced per distinct raw value, not per row: the caller corrects once
/// and the fix covers every row sharing that value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCorrection {
    /// Canonical column the fix targets (post-rename).
    pub column: String,
    /// Offending value, canonically rendered.
    pub raw: String,
    /// Proposed replacement.
    pub corrected: f64,
    /// Every row carrying the offending value, in file order.
    pub rows: Vec<usize>,
}

/// Everything the suggester proposes for one validation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionSet {
    pub headers: Vec<HeaderSuggestion>,
    pub collisions: Vec<SuggestionCollision>,
    pub value_corrections: Vec<ValueCorrection>,
}

impl SuggestionSet {
    pub fn has_collisions(&self) -> bool {
        !self.collisions.is_empty()
    }

    /// True when every invalid header got a confident target and nothing
    /// collides: the set can be applied without human intervention.
    pub fn is_unambiguous(&self) -> bool {
        !self.has_collisions() && self.headers.iter().all(|s| s.to.is_some())
    }
}

/// Compute the suggestion set for a report.
///
/// Pure function of its inputs; running it twice yields identical sets.
pub fn suggest_fixes(
    report: &ValidationReport,
    table: &SurveyTable,
    profile: &SchemaProfile,
    current_year: i32,
) -> SuggestionSet {
    let mut headers = Vec::new();
    for invalid in &report.headers.invalid {
        let (to, rule) = match match_header(&invalid.name, profile, current_year) {
            Some((rule, RuleOutcome::Target(target))) => (Some(target), Some(rule)),
            Some((rule, RuleOutcome::Unresolvable)) => (None, Some(rule)),
            _ => (None, None),
        };
        headers.push(HeaderSuggestion {
            from: invalid.name.clone(),
            to,
            rule,
        });
    }

    let collisions = find_collisions(&headers, &report.headers.valid);
    let value_corrections = dmi_corrections(table, profile, &headers);

    SuggestionSet {
        headers,
        collisions,
        value_corrections,
    }
}

/// Group proposed targets and flag any that is claimed more than once, or
/// that would shadow a header the input already has in valid form.
fn find_collisions(
    suggestions: &[HeaderSuggestion],
    valid_headers: &[String],
) -> Vec<SuggestionCollision> {
    let mut by_target: IndexMap<String, Vec<String>> = IndexMap::new();
    for suggestion in suggestions {
        if let Some(target) = &suggestion.to {
            let key = target.to_lowercase();
            let entry = by_target.entry(key).or_default();
            if entry.is_empty() {
                if let Some(existing) = valid_headers
                    .iter()
                    .find(|v| v.eq_ignore_ascii_case(target))
                {
                    entry.push(existing.clone());
                }
            }
            entry.push(suggestion.from.clone());
        }
    }

    by_target
        .into_iter()
        .filter(|(_, sources)| sources.len() >= 2)
        .map(|(key, sources)| {
            // Report the target in its canonical spelling.
            let target = suggestions
                .iter()
                .filter_map(|s| s.to.as_deref())
                .find(|t| t.to_lowercase() == key)
                .unwrap_or(&key)
                .to_string();
            SuggestionCollision { target, sources }
        })
        .collect()
}

/// Snap-to-grid corrections for deflection identity values, one per
/// distinct offending raw value.
///
/// The identity column may still be arriving under a malformed name; if a
/// suggestion renames some column to `DMI`, its values are corrected here
/// so the repaired sheet comes out clean in the same pass.
fn dmi_corrections(
    table: &SurveyTable,
    profile: &SchemaProfile,
    suggestions: &[HeaderSuggestion],
) -> Vec<ValueCorrection> {
    if profile.kind != ProfileKind::Deflection {
        return Vec::new();
    }

    let identity_col = table.column_index(profile.identity_column).or_else(|| {
        suggestions
            .iter()
            .find(|s| s.to.as_deref() == Some(profile.identity_column))
            .and_then(|s| table.column_index(&s.from))
    });
    let Some(col) = identity_col else {
        return Vec::new();
    };

    let mut by_raw: IndexMap<String, (f64, Vec<usize>)> = IndexMap::new();
    for (row, cell) in table.column_values(col).enumerate() {
        let Some(n) = cell.as_numeric() else { continue };
        if n >= 0.0 && n % DMI_STEP == 0.0 {
            continue;
        }
        let corrected = ((n / DMI_STEP).round() * DMI_STEP).max(0.0);
        by_raw
            .entry(cell.render())
            .or_insert_with(|| (corrected, Vec::new()))
            .1
            .push(row);
    }

    by_raw
        .into_iter()
        .map(|(raw, (corrected, rows))| ValueCorrection {
            column: profile.identity_column.to_string(),
            raw,
            corrected,
            rows,
        })
        .collect()
}
