//! Duplicate-row detection by identity key.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::input::{CellValue, SurveyTable};
use crate::schema::SchemaProfile;

/// Rows sharing one identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Canonical identity key shared by the members.
    pub key: String,
    /// Member row indices in file order. Always at least two.
    pub members: Vec<usize>,
}

impl DuplicateGroup {
    /// Default winner: the last occurrence in file order. The most recent
    /// edit of a measurement point supersedes earlier ones.
    pub fn default_winner(&self) -> usize {
        *self.members.last().expect("group has at least two members")
    }
}

/// Canonical duplicate-detection key for an identity cell.
///
/// Trims, parses, and re-stringifies, so `"050"` and `"50"` collide. Cells
/// without a parseable numeric value get no key and never join a group:
/// they are already flagged by the value validator, and grouping them would
/// compound one defect into two.
pub fn canonical_key(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Numeric(_) => Some(cell.render()),
        _ => None,
    }
}

/// Group rows by the profile's identity key and keep the multiplicities.
pub fn detect_duplicates(table: &SurveyTable, profile: &SchemaProfile) -> Vec<DuplicateGroup> {
    let Some(identity_col) = table.column_index(profile.identity_column) else {
        return Vec::new();
    };

    let mut by_key: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (row, cell) in table.column_values(identity_col).enumerate() {
        if let Some(key) = canonical_key(cell) {
            by_key.entry(key).or_default().push(row);
        }
    }

    by_key
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|(key, members)| DuplicateGroup { key, members })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::parse;
    use crate::schema::{ProfileKind, SchemaRegistry};

    fn detect(csv: &str, profile: ProfileKind) -> Vec<DuplicateGroup> {
        let table = parse(csv).unwrap();
        detect_duplicates(&table, SchemaRegistry::get(profile))
    }

    #[test]
    fn test_no_duplicates() {
        let groups = detect("DMI,Winter_2022\n0,1\n50,2\n100,3\n", ProfileKind::Deflection);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_groups_share_canonical_key() {
        // "050" and "50" are the same measurement point.
        let groups = detect("DMI,Winter_2022\n050,1\n50,2\n", ProfileKind::Deflection);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "50");
        assert_eq!(groups[0].members, vec![0, 1]);
    }

    #[test]
    fn test_last_occurrence_wins_by_default() {
        let groups = detect(
            "DMI,Winter_2022\n0,1\n50,2\n100,3\n100,4\n150,5\n",
            ProfileKind::Deflection,
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].default_winner(), 3);
    }

    #[test]
    fn test_unparseable_identity_rows_are_excluded() {
        let groups = detect(
            "DMI,Winter_2022\nabc,1\nabc,2\n,3\n,4\n",
            ProfileKind::Deflection,
        );
        assert!(groups.is_empty());
    }

    #[test]
    fn test_year_identity_for_fixed_profiles() {
        let groups = detect(
            "Year,Winter,Summer\n2021,80,85\n2022,81,86\n2021,82,87\n",
            ProfileKind::LteSeason,
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "2021");
        assert_eq!(groups[0].members, vec![0, 2]);
        assert_eq!(groups[0].default_winner(), 2);
    }

    #[test]
    fn test_missing_identity_column_yields_no_groups() {
        let groups = detect("DMI2,Winter_2022\n0,1\n0,2\n", ProfileKind::Deflection);
        assert!(groups.is_empty());
    }
}
