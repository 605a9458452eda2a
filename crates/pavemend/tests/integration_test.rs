//! End-to-end tests for the full parse -> validate -> suggest -> apply loop.

use pavemend::validation::InvalidHeaderReason;
use pavemend::{
    apply_fixes, parse, suggest_fixes, validate, CleanedDataset, ImportPipeline, PavemendError,
    PipelineState, ProfileKind, ReconciliationSession, SchemaRegistry,
};

const YEAR: i32 = 2025;

fn auto_apply(csv: &str, kind: ProfileKind) -> pavemend::Result<CleanedDataset> {
    let table = parse(csv)?;
    let profile = SchemaRegistry::get(kind);
    let report = validate(&table, profile, YEAR);
    let set = suggest_fixes(&report, &table, profile, YEAR);
    let session = ReconciliationSession::from_suggestions(&set);
    apply_fixes(&table, &report, &session, profile, YEAR)
}

#[test]
fn test_fuzzy_deflection_headers_get_canonical_targets() {
    let table = parse("DMI2,Wintr_22,Sumer22\n0,1,2\n").unwrap();
    let profile = SchemaRegistry::get(ProfileKind::Deflection);
    let report = validate(&table, profile, YEAR);
    assert_eq!(report.headers.invalid.len(), 3);

    let set = suggest_fixes(&report, &table, profile, YEAR);
    let targets: Vec<_> = set.headers.iter().filter_map(|s| s.to.as_deref()).collect();
    assert_eq!(targets, vec!["DMI", "Winter_2022", "Summer_2022"]);
}

#[test]
fn test_off_grid_dmi_values_snap_to_the_nearest_multiple() {
    let table = parse("DMI,Winter_2022\n0,1\n50,2\n130,3\n").unwrap();
    let profile = SchemaRegistry::get(ProfileKind::Deflection);
    let report = validate(&table, profile, YEAR);
    let set = suggest_fixes(&report, &table, profile, YEAR);

    // Only the offending value gets a correction; 0 and 50 are untouched.
    assert_eq!(set.value_corrections.len(), 1);
    assert_eq!(set.value_corrections[0].raw, "130");
    assert_eq!(set.value_corrections[0].corrected, 150.0);
}

#[test]
fn test_last_occurrence_wins_for_unchosen_duplicates() {
    let mut csv = String::from("DMI,Winter_2022\n");
    for i in 0..8 {
        let dmi = if i == 3 || i == 7 { 100 } else { i * 1000 + 50 };
        csv.push_str(&format!("{dmi},{i}\n"));
    }
    let dataset = auto_apply(&csv, ProfileKind::Deflection).unwrap();
    assert_eq!(dataset.row_count(), 7);

    // The surviving DMI=100 row carries the measurement from file index 7.
    let winter = dataset.table.column_index("Winter_2022").unwrap();
    let dmi = dataset.table.column_index("DMI").unwrap();
    let survivor = (0..dataset.table.row_count())
        .find(|&r| dataset.table.get(r, dmi).unwrap().as_numeric() == Some(100.0))
        .unwrap();
    assert_eq!(
        dataset.table.get(survivor, winter).unwrap().as_numeric(),
        Some(7.0)
    );
}

#[test]
fn test_future_years_are_flagged_and_never_auto_corrected() {
    // In the header.
    let table = parse("Year2031,Winter,Summer\n2021,80,85\n").unwrap();
    let profile = SchemaRegistry::get(ProfileKind::LteSeason);
    let report = validate(&table, profile, YEAR);
    assert_eq!(report.headers.invalid[0].reason, InvalidHeaderReason::FutureYear);
    let set = suggest_fixes(&report, &table, profile, YEAR);
    assert_eq!(set.headers[0].to, None);

    // In the data.
    let err = auto_apply("Year,Winter,Summer\n2031,80,85\n", ProfileKind::LteSeason).unwrap_err();
    assert!(matches!(err, PavemendError::NotReady { .. }));
}

#[test]
fn test_colliding_abbreviations_block_until_resolved() {
    let table = parse("Year,Wi,Win,Summer\n2021,1,2,3\n").unwrap();
    let profile = SchemaRegistry::get(ProfileKind::LteSeason);
    let report = validate(&table, profile, YEAR);
    let set = suggest_fixes(&report, &table, profile, YEAR);

    assert!(set.has_collisions());
    assert_eq!(set.collisions[0].target, "Winter");

    let mut session = ReconciliationSession::from_suggestions(&set);
    assert!(!session.can_apply(&table, &report, profile, YEAR));

    session.drop_header("Wi");
    assert!(session.can_apply(&table, &report, profile, YEAR));
    let dataset = apply_fixes(&table, &report, &session, profile, YEAR).unwrap();
    assert_eq!(dataset.table.headers, vec!["Year", "Winter", "Summer"]);
}

#[test]
fn test_crack_profile_typo_repairs_to_the_exact_required_set() {
    let dataset = auto_apply(
        "Year,Small,Meduim,Large\n2021,1,2,3\n2022,4,5,6\n",
        ProfileKind::LteCrack,
    )
    .unwrap();
    assert_eq!(
        dataset.table.headers,
        vec!["Year", "Small", "Medium", "Large"]
    );
    let profile = SchemaRegistry::get(ProfileKind::LteCrack);
    assert!(validate(&dataset.table, profile, YEAR).is_clean());
}

#[test]
fn test_validation_is_deterministic() {
    let csv = "DMI2,Wintr_22,Wintr22,Comments\n130,1,2,x\n,3,4,y\n";
    let table = parse(csv).unwrap();
    let profile = SchemaRegistry::get(ProfileKind::Deflection);
    assert_eq!(
        validate(&table, profile, YEAR),
        validate(&table, profile, YEAR)
    );
}

#[test]
fn test_applied_output_revalidates_clean_and_reapplies_byte_identically() {
    let csv = "DMI2,Wintr_22,Sumer22\n050,1,2\n130,3,4\n150,5,6\n";
    let first = auto_apply(csv, ProfileKind::Deflection).unwrap();

    let profile = SchemaRegistry::get(ProfileKind::Deflection);
    assert!(validate(&first.table, profile, YEAR).is_clean());

    // DMI invariant holds on every surviving row.
    let dmi = first.table.column_index("DMI").unwrap();
    for cell in first.table.column_values(dmi) {
        let n = cell.as_numeric().unwrap();
        assert!(n >= 0.0 && n % 50.0 == 0.0);
    }

    // A second pass over the cleaned output changes nothing.
    let second = auto_apply(first.to_csv_string(), ProfileKind::Deflection).unwrap();
    assert_eq!(first.content_hash, second.content_hash);
    assert_eq!(first.to_csv_string(), second.to_csv_string());
}

#[test]
fn test_cleaned_csv_survives_a_disk_round_trip() {
    let dataset = auto_apply("DMI2,Wintr_22\n130,1\n", ProfileKind::Deflection).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cleaned.csv");
    std::fs::write(&path, dataset.to_csv_string()).unwrap();

    let reread = std::fs::read_to_string(&path).unwrap();
    let table = parse(&reread).unwrap();
    let profile = SchemaRegistry::get(ProfileKind::Deflection);
    assert!(validate(&table, profile, YEAR).is_clean());
    assert_eq!(table, dataset.table);
}

#[test]
fn test_pipeline_walks_the_full_state_machine() {
    let mut pipeline = ImportPipeline::new(ProfileKind::Deflection, YEAR);
    assert_eq!(pipeline.state(), PipelineState::Idle);

    pipeline
        .parse_text("DMI2,Wintr_22\n0,1\n130,2\n130,3\n")
        .unwrap();
    assert_eq!(pipeline.state(), PipelineState::Parsed);

    pipeline.validate().unwrap();
    assert_eq!(pipeline.state(), PipelineState::Invalid);

    pipeline.suggest().unwrap();
    assert_eq!(pipeline.state(), PipelineState::Suggested);

    pipeline.resolve().unwrap();
    assert_eq!(pipeline.state(), PipelineState::Resolved);

    let dataset = pipeline.apply().unwrap();
    // Both 130 rows snapped to 150 and collapsed; last one wins.
    assert_eq!(dataset.to_csv_string(), "DMI,Winter_2022\n0,1\n150,3\n");

    assert_eq!(pipeline.state(), PipelineState::Applied);
}

#[test]
fn test_header_only_sheet_is_parsed_and_validated() {
    let table = parse("Year,Winter,Summer\n").unwrap();
    assert_eq!(table.row_count(), 0);
    let profile = SchemaRegistry::get(ProfileKind::LteSeason);
    assert!(validate(&table, profile, YEAR).is_clean());
}

#[test]
fn test_empty_input_is_a_caller_error() {
    assert!(matches!(
        parse("\n\n  \n"),
        Err(PavemendError::EmptyData(_))
    ));
}
