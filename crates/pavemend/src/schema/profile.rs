//! Schema profiles and the registry that serves them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PavemendError, Result};

/// Which of the three supported sheet shapes a profile describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    /// Deflection readings: `DMI` plus season/year measurement columns.
    Deflection,
    /// LTE by season: `Year`, `Winter`, `Summer`.
    LteSeason,
    /// LTE by crack spacing: `Year`, `Small`, `Medium`, `Large`.
    LteCrack,
}

impl ProfileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKind::Deflection => "deflection",
            ProfileKind::LteSeason => "lte_season",
            ProfileKind::LteCrack => "lte_crack",
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileKind {
    type Err = PavemendError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "deflection" => Ok(ProfileKind::Deflection),
            "lte_season" => Ok(ProfileKind::LteSeason),
            "lte_crack" => Ok(ProfileKind::LteCrack),
            other => Err(PavemendError::UnknownProfile(other.to_string())),
        }
    }
}

/// Canonical column set and value constraints for one sheet shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaProfile {
    /// Which shape this is.
    pub kind: ProfileKind,
    /// Required fixed columns, in canonical output order. Empty for shapes
    /// whose measurement columns are dynamically named.
    pub required_columns: &'static [&'static str],
    /// Column whose value identifies a row for duplicate detection.
    pub identity_column: &'static str,
    /// Whether `Season_Year` measurement columns are accepted in addition to
    /// the required set.
    pub dynamic_season_columns: bool,
}

static DEFLECTION: SchemaProfile = SchemaProfile {
    kind: ProfileKind::Deflection,
    required_columns: &["DMI"],
    identity_column: "DMI",
    dynamic_season_columns: true,
};

static LTE_SEASON: SchemaProfile = SchemaProfile {
    kind: ProfileKind::LteSeason,
    required_columns: &["Year", "Winter", "Summer"],
    identity_column: "Year",
    dynamic_season_columns: false,
};

static LTE_CRACK: SchemaProfile = SchemaProfile {
    kind: ProfileKind::LteCrack,
    required_columns: &["Year", "Small", "Medium", "Large"],
    identity_column: "Year",
    dynamic_season_columns: false,
};

/// Pure lookup of schema profiles. No state, no side effects.
pub struct SchemaRegistry;

impl SchemaRegistry {
    /// Look a profile up by its wire name.
    pub fn profile(name: &str) -> Result<&'static SchemaProfile> {
        Ok(Self::get(name.parse()?))
    }

    /// Profile for a known kind.
    pub fn get(kind: ProfileKind) -> &'static SchemaProfile {
        match kind {
            ProfileKind::Deflection => &DEFLECTION,
            ProfileKind::LteSeason => &LTE_SEASON,
            ProfileKind::LteCrack => &LTE_CRACK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        let profile = SchemaRegistry::profile("lte_crack").unwrap();
        assert_eq!(profile.kind, ProfileKind::LteCrack);
        assert_eq!(
            profile.required_columns,
            &["Year", "Small", "Medium", "Large"]
        );
        assert_eq!(profile.identity_column, "Year");
        assert!(!profile.dynamic_season_columns);
    }

    #[test]
    fn test_unknown_profile_is_fatal() {
        let err = SchemaRegistry::profile("lte_seasonal").unwrap_err();
        assert!(matches!(err, PavemendError::UnknownProfile(_)));
    }

    #[test]
    fn test_deflection_is_dynamic() {
        let profile = SchemaRegistry::get(ProfileKind::Deflection);
        assert!(profile.dynamic_season_columns);
        assert_eq!(profile.identity_column, "DMI");
    }

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in [
            ProfileKind::Deflection,
            ProfileKind::LteSeason,
            ProfileKind::LteCrack,
        ] {
            assert_eq!(kind.as_str().parse::<ProfileKind>().unwrap(), kind);
        }
    }
}
