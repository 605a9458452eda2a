//! Header classification: partition input headers into valid, invalid, and
//! duplicate, and report required columns that are missing entirely.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::input::SurveyTable;
use crate::schema::SchemaProfile;

/// Valid deflection measurement header: season word plus a 2-or-4-digit year
/// (3-digit tokens match too and are rejected with a precise sub-reason).
static SEASON_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(Winter|Summer)[_\s]?(\d{2,4})$").unwrap());

/// Identity-like header that is not exactly the canonical identity name.
static DMI_LIKE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?i)dmi[\w-]*$").unwrap());
static YEAR_LIKE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?i)year[\w-]*$").unwrap());

/// Trailing digit run inside an identity-like header (`Year2031`).
static EMBEDDED_YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*$").unwrap());

/// Why a header failed classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidHeaderReason {
    /// Looks like the identity column but is not spelled exactly right.
    MalformedIdentity,
    /// Season/year header whose year token is not 2 or 4 digits.
    BadYearFormat,
    /// Year component lies beyond the current calendar year.
    FutureYear,
    /// Nothing in the profile accounts for this header.
    Unrecognized,
}

impl InvalidHeaderReason {
    /// Human-readable label for rendering.
    pub fn label(&self) -> &'static str {
        match self {
            InvalidHeaderReason::MalformedIdentity => "malformed identity column",
            InvalidHeaderReason::BadYearFormat => "bad year format",
            InvalidHeaderReason::FutureYear => "future year",
            InvalidHeaderReason::Unrecognized => "unrecognized column",
        }
    }
}

/// A header that is present but does not fit the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidHeader {
    /// Header as it appeared in the input.
    pub name: String,
    /// Column position in the input.
    pub column: usize,
    pub reason: InvalidHeaderReason,
}

/// One physical copy of a duplicated header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderCopy {
    /// Column position in the input.
    pub column: usize,
    /// Header spelling at that position (copies may differ in case).
    pub name: String,
    /// Rows with a non-empty value under this copy. Informational: it hints
    /// at which copy to keep but does not resolve the duplicate by itself.
    pub occupancy: usize,
}

/// A header name appearing more than once (case-insensitively, after trim).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateHeader {
    /// First-seen spelling of the colliding name.
    pub name: String,
    /// Every copy, in column order.
    pub copies: Vec<HeaderCopy>,
}

impl DuplicateHeader {
    /// The copy with the most populated rows (earliest wins ties).
    pub fn fullest_copy(&self) -> usize {
        self.copies
            .iter()
            .max_by_key(|c| c.occupancy)
            .map(|c| c.column)
            .unwrap_or(0)
    }
}

/// Partition of the input headers plus the absent required columns.
///
/// Every header in the input lands in exactly one of `valid`, `invalid`, or
/// `duplicate`; `missing` names columns the input does not have at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderReport {
    pub valid: Vec<String>,
    pub missing: Vec<String>,
    pub invalid: Vec<InvalidHeader>,
    pub duplicate: Vec<DuplicateHeader>,
}

impl HeaderReport {
    pub fn is_clean(&self) -> bool {
        self.defect_count() == 0
    }

    pub fn defect_count(&self) -> usize {
        self.missing.len() + self.invalid.len() + self.duplicate.len()
    }
}

/// Canonical spelling of an already-valid header.
///
/// Season headers normalize to `Season_FullYear` (`Winter22` ->
/// `Winter_2022`); fixed columns keep their required spelling; anything
/// else passes through unchanged.
pub fn canonical_header(header: &str, profile: &SchemaProfile) -> String {
    if profile.dynamic_season_columns {
        if let Some(caps) = SEASON_HEADER_RE.captures(header) {
            if let Some(year) = expand_year(&caps[2]) {
                return format!("{}_{year}", &caps[1]);
            }
        }
    }
    profile
        .required_columns
        .iter()
        .find(|r| r.eq_ignore_ascii_case(header))
        .map(|r| r.to_string())
        .unwrap_or_else(|| header.to_string())
}

/// Expand a 2-digit year token to four digits (`22` -> `2022`).
pub(crate) fn expand_year(token: &str) -> Option<i32> {
    match token.len() {
        2 => token.parse::<i32>().ok().map(|y| 2000 + y),
        4 => token.parse::<i32>().ok(),
        _ => None,
    }
}

/// Classify every input header against the profile.
pub fn classify_headers(
    table: &SurveyTable,
    profile: &SchemaProfile,
    current_year: i32,
) -> HeaderReport {
    // Duplicates first: a name that collides is a duplicate regardless of
    // whether any single copy would have been valid. Grouping runs on the
    // canonical spelling, so variants that only differ in case or season
    // encoding (`Winter22` vs `Winter_2022`) collide here instead of both
    // passing as valid and clashing when the fixes are applied.
    let mut by_norm: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (idx, header) in table.headers.iter().enumerate() {
        by_norm
            .entry(canonical_header(header.trim(), profile).to_lowercase())
            .or_default()
            .push(idx);
    }

    let mut duplicate = Vec::new();
    let mut duplicated_cols: Vec<usize> = Vec::new();
    for (_, cols) in &by_norm {
        if cols.len() < 2 {
            continue;
        }
        duplicated_cols.extend(cols);
        duplicate.push(DuplicateHeader {
            name: table.headers[cols[0]].clone(),
            copies: cols
                .iter()
                .map(|&c| HeaderCopy {
                    column: c,
                    name: table.headers[c].clone(),
                    occupancy: table.occupancy(c),
                })
                .collect(),
        });
    }

    let mut valid = Vec::new();
    let mut invalid = Vec::new();
    for (idx, header) in table.headers.iter().enumerate() {
        if duplicated_cols.contains(&idx) {
            continue;
        }
        match classify_one(header, profile, current_year) {
            Ok(()) => valid.push(header.clone()),
            Err(reason) => invalid.push(InvalidHeader {
                name: header.clone(),
                column: idx,
                reason,
            }),
        }
    }

    // A required column is missing when no input header spells it exactly;
    // a duplicated copy still counts as present.
    let missing = profile
        .required_columns
        .iter()
        .filter(|required| !table.headers.iter().any(|h| h == *required))
        .map(|r| r.to_string())
        .collect();

    HeaderReport {
        valid,
        missing,
        invalid,
        duplicate,
    }
}

/// Whether a header would classify as valid on its own (ignoring
/// duplication). Used to decide if keeping one copy of a duplicated
/// header is enough to repair it.
pub fn is_valid_header(header: &str, profile: &SchemaProfile, current_year: i32) -> bool {
    classify_one(header, profile, current_year).is_ok()
}

/// Classify a single non-duplicated header.
fn classify_one(
    header: &str,
    profile: &SchemaProfile,
    current_year: i32,
) -> std::result::Result<(), InvalidHeaderReason> {
    if profile.required_columns.contains(&header) {
        return Ok(());
    }

    if profile.dynamic_season_columns {
        if let Some(caps) = SEASON_HEADER_RE.captures(header) {
            let token = &caps[2];
            return match expand_year(token) {
                Some(year) if year > current_year => Err(InvalidHeaderReason::FutureYear),
                Some(_) => Ok(()),
                None => Err(InvalidHeaderReason::BadYearFormat),
            };
        }
    }

    // Identity-like but not exact: the required identity column is malformed,
    // not duplicated. A recognizable year token gets the more precise reason.
    let identity_like = match profile.identity_column {
        "DMI" => DMI_LIKE_RE.is_match(header),
        "Year" => YEAR_LIKE_RE.is_match(header),
        _ => false,
    };
    if identity_like {
        if profile.identity_column == "Year" {
            if let Some(caps) = EMBEDDED_YEAR_RE.captures(header) {
                return match expand_year(&caps[1]) {
                    Some(year) if year > current_year => Err(InvalidHeaderReason::FutureYear),
                    Some(_) => Err(InvalidHeaderReason::MalformedIdentity),
                    None => Err(InvalidHeaderReason::BadYearFormat),
                };
            }
        }
        return Err(InvalidHeaderReason::MalformedIdentity);
    }

    Err(InvalidHeaderReason::Unrecognized)
}
