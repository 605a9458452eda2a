//! Reconciliation session: the one mutable object in the pipeline.
//!
//! Holds every decision a caller makes about a defective sheet. Readiness
//! is recomputed from current state on every query, never cached, and
//! dropping the session discards all decisions without touching the
//! source data.

use indexmap::{IndexMap, IndexSet};

use crate::input::{CellValue, SurveyTable};
use crate::schema::SchemaProfile;
use crate::suggest::{HeaderSuggestion, SuggestionSet};
use crate::validation::{canonical_header, is_valid_header, ValidationReport};

/// How one invalid header is currently resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Rename to this canonical target.
    Target(String),
    /// Delete the column.
    Drop,
    /// Still undecided; blocks applying.
    Unresolved,
}

/// Mutable decision state for one upload attempt.
///
/// Deliberately not serializable: the session lives and dies with the
/// attempt, never outliving it on disk.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationSession {
    /// Suggestions adopted from the suggester, in report order.
    suggestions: Vec<HeaderSuggestion>,
    /// Caller renames, keyed by source header. Wins over the suggestion.
    manual_overrides: IndexMap<String, String>,
    /// Source headers the caller chose to delete instead of renaming.
    dropped: IndexSet<String>,
    /// Chosen surviving row per duplicate-group identity key.
    duplicate_choices: IndexMap<String, usize>,
    /// Chosen surviving column per duplicated header (lowercased name).
    duplicate_header_choices: IndexMap<String, usize>,
    /// Value fixes applying to every cell sharing a raw value, keyed
    /// (canonical column, canonically rendered raw value).
    distinct_value_fixes: IndexMap<(String, String), CellValue>,
    /// Point fixes for single cells, keyed (row, canonical column).
    cell_fixes: IndexMap<(usize, String), CellValue>,
}

impl ReconciliationSession {
    /// Empty session (for sheets with no suggestions to adopt).
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a session from a suggestion set: header targets and distinct
    /// value corrections start out accepted and may be overridden.
    pub fn from_suggestions(set: &SuggestionSet) -> Self {
        let mut session = Self::new();
        session.suggestions = set.headers.clone();
        for correction in &set.value_corrections {
            session.distinct_value_fixes.insert(
                (correction.column.clone(), correction.raw.clone()),
                CellValue::Numeric(correction.corrected),
            );
        }
        session
    }

    // ------------------------------------------------------------------
    // Mutations. Each one invalidates nothing: readiness is derived fresh.
    // ------------------------------------------------------------------

    /// Rename `from` to an explicit target, superseding any suggestion.
    pub fn override_target(&mut self, from: impl Into<String>, to: impl Into<String>) {
        let from = from.into();
        self.dropped.shift_remove(&from);
        self.manual_overrides.insert(from, to.into());
    }

    /// Delete the column instead of renaming it.
    pub fn drop_header(&mut self, from: impl Into<String>) {
        let from = from.into();
        self.manual_overrides.shift_remove(&from);
        self.dropped.insert(from);
    }

    /// Pick the surviving row for a duplicate group.
    pub fn choose_duplicate_row(&mut self, identity_key: impl Into<String>, row: usize) {
        self.duplicate_choices.insert(identity_key.into(), row);
    }

    /// Pick the surviving physical copy of a duplicated header.
    pub fn choose_duplicate_column(&mut self, name: &str, column: usize) {
        self.duplicate_header_choices
            .insert(name.trim().to_lowercase(), column);
    }

    /// Correct every cell in `column` whose canonical rendering equals `raw`.
    pub fn fix_value(
        &mut self,
        column: impl Into<String>,
        raw: impl Into<String>,
        corrected: CellValue,
    ) {
        self.distinct_value_fixes
            .insert((column.into(), raw.into()), corrected);
    }

    /// Correct one specific cell.
    pub fn fix_cell(&mut self, row: usize, column: impl Into<String>, corrected: CellValue) {
        self.cell_fixes.insert((row, column.into()), corrected);
    }

    // ------------------------------------------------------------------
    // Queries.
    // ------------------------------------------------------------------

    pub fn suggestions(&self) -> &[HeaderSuggestion] {
        &self.suggestions
    }

    /// Current resolution for a source header: manual override first, then
    /// an explicit drop, then the adopted suggestion.
    pub fn resolution(&self, from: &str) -> Resolution {
        if let Some(target) = self.manual_overrides.get(from) {
            return Resolution::Target(target.clone());
        }
        if self.dropped.contains(from) {
            return Resolution::Drop;
        }
        match self
            .suggestions
            .iter()
            .find(|s| s.from == from)
            .and_then(|s| s.to.clone())
        {
            Some(target) => Resolution::Target(target),
            None => Resolution::Unresolved,
        }
    }

    /// Explicit surviving-row choice for an identity key, if any.
    pub fn duplicate_row_choice(&self, identity_key: &str) -> Option<usize> {
        self.duplicate_choices.get(identity_key).copied()
    }

    /// Explicit surviving-column choice for a duplicated header, if any.
    pub fn duplicate_column_choice(&self, name: &str) -> Option<usize> {
        self.duplicate_header_choices
            .get(&name.trim().to_lowercase())
            .copied()
    }

    /// Distinct-value fix for a (column, raw value) pair, if any.
    pub fn distinct_fix(&self, column: &str, raw: &str) -> Option<&CellValue> {
        self.distinct_value_fixes
            .get(&(column.to_string(), raw.to_string()))
    }

    /// Point fix for a cell, if any.
    pub fn cell_fix(&self, row: usize, column: &str) -> Option<&CellValue> {
        self.cell_fixes.get(&(row, column.to_string()))
    }

    /// Everything that still blocks applying, as renderable messages.
    ///
    /// Pure function of the session, the report, and the parsed table;
    /// recomputed in full on every call.
    pub fn readiness(
        &self,
        table: &SurveyTable,
        report: &ValidationReport,
        profile: &SchemaProfile,
        current_year: i32,
    ) -> Vec<String> {
        let mut blockers = Vec::new();

        // Every invalid header needs a target or an explicit drop.
        let mut resolved_targets: Vec<(String, String)> = Vec::new();
        for invalid in &report.headers.invalid {
            match self.resolution(&invalid.name) {
                Resolution::Target(target) => {
                    resolved_targets.push((invalid.name.clone(), target));
                }
                Resolution::Drop => {}
                Resolution::Unresolved => blockers.push(format!(
                    "column '{}' has no resolved target; rename or drop it",
                    invalid.name
                )),
            }
        }

        // No two resolved targets may collide, and none may shadow a
        // surviving valid header (compared in canonical spelling).
        let mut claimed: IndexMap<String, Vec<String>> = IndexMap::new();
        for valid in &report.headers.valid {
            claimed
                .entry(canonical_header(valid, profile).to_lowercase())
                .or_default()
                .push(valid.clone());
        }
        // The surviving copy of a duplicated header claims its name too.
        for dup in &report.headers.duplicate {
            claimed
                .entry(canonical_header(&dup.name, profile).to_lowercase())
                .or_default()
                .push(dup.name.clone());
        }
        // Targets are compared in canonical spelling, the same way the
        // apply step will rename them.
        for (from, target) in &resolved_targets {
            claimed
                .entry(canonical_header(target, profile).to_lowercase())
                .or_default()
                .push(from.clone());
        }
        for (target, sources) in &claimed {
            if sources.len() >= 2 {
                blockers.push(format!(
                    "suggestion collision on '{}': {} all resolve to it",
                    target,
                    sources.join(", ")
                ));
            }
        }

        // Explicit duplicate choices must point at real group members.
        for group in &report.duplicate_groups {
            if let Some(choice) = self.duplicate_row_choice(&group.key) {
                if !group.members.contains(&choice) {
                    blockers.push(format!(
                        "chosen row {} is not a member of duplicate group '{}'",
                        choice, group.key
                    ));
                }
            }
        }
        for dup in &report.headers.duplicate {
            if let Some(choice) = self.duplicate_column_choice(&dup.name) {
                if !dup.copies.iter().any(|c| c.column == choice) {
                    blockers.push(format!(
                        "chosen column {} is not a copy of duplicated header '{}'",
                        choice, dup.name
                    ));
                }
            }
            // Keeping one copy only repairs the sheet if the name itself
            // is acceptable.
            if !is_valid_header(&dup.name, profile, current_year) {
                blockers.push(format!(
                    "duplicated header '{}' is not a recognized column even once",
                    dup.name
                ));
            }
        }

        // A required column absent from the input must be supplied by some
        // rename; nothing else can conjure it.
        for missing in &report.headers.missing {
            let supplied = resolved_targets
                .iter()
                .any(|(_, target)| target.eq_ignore_ascii_case(missing));
            if !supplied {
                blockers.push(format!(
                    "required column '{missing}' is missing and no rename supplies it"
                ));
            }
        }

        // Every reported value defect needs a pending fix; otherwise the
        // apply step is guaranteed to fail its consistency gate.
        for issue in &report.value_issues {
            let covered = self.cell_fix(issue.row, &issue.column).is_some()
                || table
                    .column_index(&issue.column)
                    .and_then(|col| table.get(issue.row, col))
                    .is_some_and(|cell| self.distinct_fix(&issue.column, &cell.render()).is_some());
            if !covered {
                blockers.push(format!(
                    "row {} column '{}' still has an uncorrected value ({})",
                    issue.row,
                    issue.column,
                    issue.kind.label()
                ));
            }
        }

        blockers
    }

    /// True when nothing blocks applying.
    pub fn can_apply(
        &self,
        table: &SurveyTable,
        report: &ValidationReport,
        profile: &SchemaProfile,
        current_year: i32,
    ) -> bool {
        self.readiness(table, report, profile, current_year).is_empty()
    }
}
