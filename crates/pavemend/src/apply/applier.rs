//! Fix application: produce a repaired table from a resolved session.

use indexmap::{IndexMap, IndexSet};

use crate::error::{PavemendError, Result};
use crate::input::{CellValue, SurveyTable};
use crate::schema::SchemaProfile;
use crate::session::{ReconciliationSession, Resolution};
use crate::validation::{canonical_header, detect_duplicates, validate, ValidationReport};

use super::dataset::CleanedDataset;

/// Apply every resolved fix in one deterministic pass.
///
/// The source table is never mutated. Steps, in order: rename and drop
/// columns, substitute corrected values, collapse duplicate rows, reorder
/// columns canonically, then re-validate. A dataset that still carries any
/// defect after all that is refused outright.
pub fn apply_fixes(
    table: &SurveyTable,
    report: &ValidationReport,
    session: &ReconciliationSession,
    profile: &SchemaProfile,
    current_year: i32,
) -> Result<CleanedDataset> {
    let blockers = session.readiness(table, report, profile, current_year);
    if !blockers.is_empty() {
        return Err(PavemendError::NotReady { blockers });
    }

    let columns = plan_columns(table, report, session, profile);

    // Value substitution happens against the original cell's canonical
    // rendering, under the column's post-rename name. A point fix beats a
    // distinct-value fix for the same cell.
    let headers: Vec<String> = columns.iter().map(|(_, name)| name.clone()).collect();
    let mut rows = Vec::with_capacity(table.row_count());
    for (row_idx, row) in table.rows.iter().enumerate() {
        let mut out = Vec::with_capacity(columns.len());
        for (source, name) in &columns {
            let cell = row.get(*source).unwrap_or(&CellValue::Empty);
            // Fixes may be keyed by either the canonical name or the
            // header's original spelling.
            let source_name = &table.headers[*source];
            let fixed = if let Some(fix) = session
                .cell_fix(row_idx, name)
                .or_else(|| session.cell_fix(row_idx, source_name))
            {
                fix.clone()
            } else if let Some(fix) = session
                .distinct_fix(name, &cell.render())
                .or_else(|| session.distinct_fix(source_name, &cell.render()))
            {
                fix.clone()
            } else {
                cell.clone()
            };
            out.push(fixed);
        }
        rows.push(out);
    }

    // Duplicates are re-detected on the repaired rows: a value fix can merge
    // two previously distinct identity keys, and those collisions must
    // collapse too.
    let repaired = SurveyTable::new(headers, rows);
    let mut losers: IndexSet<usize> = IndexSet::new();
    for group in detect_duplicates(&repaired, profile) {
        let winner = session
            .duplicate_row_choice(&group.key)
            .filter(|chosen| group.members.contains(chosen))
            .unwrap_or_else(|| group.default_winner());
        losers.extend(group.members.iter().copied().filter(|&m| m != winner));
    }
    let rows: Vec<Vec<CellValue>> = repaired
        .rows
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| !losers.contains(idx))
        .map(|(_, row)| row)
        .collect();

    let cleaned = SurveyTable::new(repaired.headers, rows);
    let check = validate(&cleaned, profile, current_year);
    if !check.is_clean() {
        return Err(PavemendError::Inconsistent {
            remaining: check.defect_count(),
        });
    }

    CleanedDataset::new(cleaned)
}

/// Decide, per surviving output column, its source index and canonical name.
///
/// Required columns come first in profile order; everything else keeps its
/// input order. Dropped columns and losing duplicate copies are omitted.
fn plan_columns(
    table: &SurveyTable,
    report: &ValidationReport,
    session: &ReconciliationSession,
    profile: &SchemaProfile,
) -> Vec<(usize, String)> {
    // None marks a column explicitly dropped.
    let mut planned: IndexMap<usize, Option<String>> = IndexMap::new();

    for dup in &report.headers.duplicate {
        let keep = session
            .duplicate_column_choice(&dup.name)
            .unwrap_or_else(|| dup.fullest_copy());
        for copy in &dup.copies {
            let slot = if copy.column == keep {
                Some(canonical_header(&copy.name, profile))
            } else {
                None
            };
            planned.insert(copy.column, slot);
        }
    }

    for invalid in &report.headers.invalid {
        let slot = match session.resolution(&invalid.name) {
            Resolution::Target(target) => Some(canonical_header(&target, profile)),
            // The readiness gate rules out Unresolved before we get here.
            Resolution::Drop | Resolution::Unresolved => None,
        };
        planned.insert(invalid.column, slot);
    }

    let mut kept: Vec<(usize, String)> = Vec::new();
    for (idx, header) in table.headers.iter().enumerate() {
        let name = match planned.get(&idx) {
            Some(Some(name)) => name.clone(),
            Some(None) => continue,
            None => canonical_header(header, profile),
        };
        kept.push((idx, name));
    }

    let mut ordered = Vec::with_capacity(kept.len());
    for required in profile.required_columns {
        if let Some(pos) = kept.iter().position(|(_, name)| name == required) {
            ordered.push(kept.remove(pos));
        }
    }
    ordered.extend(kept);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::parse;
    use crate::schema::{ProfileKind, SchemaRegistry};
    use crate::suggest::suggest_fixes;

    const YEAR: i32 = 2025;

    fn run(csv: &str, kind: ProfileKind) -> Result<CleanedDataset> {
        let table = parse(csv).unwrap();
        let profile = SchemaRegistry::get(kind);
        let report = validate(&table, profile, YEAR);
        let set = suggest_fixes(&report, &table, profile, YEAR);
        let session = ReconciliationSession::from_suggestions(&set);
        apply_fixes(&table, &report, &session, profile, YEAR)
    }

    #[test]
    fn test_clean_input_passes_through_canonically() {
        let dataset = run("DMI,Winter22\n050,1.5\n100,2\n", ProfileKind::Deflection).unwrap();
        assert_eq!(
            dataset.to_csv_string(),
            "DMI,Winter_2022\n50,1.5\n100,2\n"
        );
    }

    #[test]
    fn test_rename_fix_and_value_fix_in_one_pass() {
        let dataset = run("DMI2,Wintr_22\n0,1\n130,2\n", ProfileKind::Deflection).unwrap();
        assert_eq!(dataset.table.headers, vec!["DMI", "Winter_2022"]);
        assert_eq!(dataset.to_csv_string(), "DMI,Winter_2022\n0,1\n150,2\n");
    }

    #[test]
    fn test_duplicate_rows_collapse_to_last_occurrence() {
        let dataset = run(
            "DMI,Winter_2022\n0,1\n50,2\n50,3\n100,4\n",
            ProfileKind::Deflection,
        )
        .unwrap();
        assert_eq!(dataset.row_count(), 3);
        assert_eq!(dataset.to_csv_string(), "DMI,Winter_2022\n0,1\n50,3\n100,4\n");
    }

    #[test]
    fn test_value_fix_can_create_new_duplicates_that_collapse() {
        // 130 snaps to 150, colliding with the existing 150 row; the
        // post-fix occurrence order still decides the winner.
        let dataset = run(
            "DMI,Winter_2022\n130,1\n150,2\n",
            ProfileKind::Deflection,
        )
        .unwrap();
        assert_eq!(dataset.to_csv_string(), "DMI,Winter_2022\n150,2\n");
    }

    #[test]
    fn test_explicit_duplicate_row_choice_wins() {
        let table = parse("DMI,Winter_2022\n50,1\n50,2\n").unwrap();
        let profile = SchemaRegistry::get(ProfileKind::Deflection);
        let report = validate(&table, profile, YEAR);
        let mut session = ReconciliationSession::new();
        session.choose_duplicate_row("50", 0);
        let dataset = apply_fixes(&table, &report, &session, profile, YEAR).unwrap();
        assert_eq!(dataset.to_csv_string(), "DMI,Winter_2022\n50,1\n");
    }

    #[test]
    fn test_duplicate_header_keeps_fullest_copy_by_default() {
        let dataset = run(
            "Year,Winter,winter,Summer\n2021,,80,85\n2022,,81,86\n",
            ProfileKind::LteSeason,
        )
        .unwrap();
        assert_eq!(dataset.table.headers, vec!["Year", "Winter", "Summer"]);
        assert_eq!(
            dataset.to_csv_string(),
            "Year,Winter,Summer\n2021,80,85\n2022,81,86\n"
        );
    }

    #[test]
    fn test_equivalent_season_encodings_merge_into_one_column() {
        let table = parse("DMI,Winter22,Winter_2022\n0,1,\n50,2,\n").unwrap();
        let profile = SchemaRegistry::get(ProfileKind::Deflection);
        let report = validate(&table, profile, YEAR);
        // The pair is reported as a duplicate header, never as clean.
        assert_eq!(report.headers.duplicate.len(), 1);

        let session = ReconciliationSession::new();
        assert!(session.can_apply(&table, &report, profile, YEAR));
        let dataset = apply_fixes(&table, &report, &session, profile, YEAR).unwrap();
        assert_eq!(dataset.table.headers, vec!["DMI", "Winter_2022"]);
        assert_eq!(dataset.to_csv_string(), "DMI,Winter_2022\n0,1\n50,2\n");
    }

    #[test]
    fn test_dropped_column_disappears() {
        let table = parse("DMI,Comments,Winter_2022\n0,fine,1\n").unwrap();
        let profile = SchemaRegistry::get(ProfileKind::Deflection);
        let report = validate(&table, profile, YEAR);
        let mut session = ReconciliationSession::new();
        session.drop_header("Comments");
        let dataset = apply_fixes(&table, &report, &session, profile, YEAR).unwrap();
        assert_eq!(dataset.table.headers, vec!["DMI", "Winter_2022"]);
    }

    #[test]
    fn test_required_columns_lead_the_output_order() {
        let dataset = run(
            "Winter,Large,Year,Small,Medium\n80,3,2021,1,2\n",
            ProfileKind::LteCrack,
        );
        // "Winter" is unrecognized for the crack profile and unresolved.
        assert!(matches!(dataset, Err(PavemendError::NotReady { .. })));

        let dataset = run(
            "Large,Year,Small,Medium\n3,2021,1,2\n",
            ProfileKind::LteCrack,
        )
        .unwrap();
        assert_eq!(
            dataset.table.headers,
            vec!["Year", "Small", "Medium", "Large"]
        );
        assert_eq!(
            dataset.to_csv_string(),
            "Year,Small,Medium,Large\n2021,1,2,3\n"
        );
    }

    #[test]
    fn test_not_ready_lists_blockers() {
        let err = run("DMI,Wintr_2031\n0,1\n", ProfileKind::Deflection).unwrap_err();
        match err {
            PavemendError::NotReady { blockers } => {
                assert!(blockers.iter().any(|b| b.contains("Wintr_2031")));
            }
            other => panic!("expected NotReady, got {other:?}"),
        }
    }

    #[test]
    fn test_cell_fix_beats_distinct_fix() {
        let table = parse("DMI,Winter_2022\n130,1\n130,2\n").unwrap();
        let profile = SchemaRegistry::get(ProfileKind::Deflection);
        let report = validate(&table, profile, YEAR);
        let set = suggest_fixes(&report, &table, profile, YEAR);
        let mut session = ReconciliationSession::from_suggestions(&set);
        // The distinct fix snaps both rows to 150; pin row 0 to 100 instead.
        session.fix_cell(0, "DMI", CellValue::Numeric(100.0));
        let dataset = apply_fixes(&table, &report, &session, profile, YEAR).unwrap();
        assert_eq!(
            dataset.to_csv_string(),
            "DMI,Winter_2022\n100,1\n150,2\n"
        );
    }

    #[test]
    fn test_apply_is_idempotent_on_its_own_output() {
        let first = run("DMI2,Wintr_22\n050,1\n130,2\n", ProfileKind::Deflection).unwrap();
        let second = run(first.to_csv_string(), ProfileKind::Deflection).unwrap();
        assert_eq!(first.content_hash, second.content_hash);
        assert_eq!(first.to_csv_string(), second.to_csv_string());
    }
}
