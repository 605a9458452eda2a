//! Ranked header matching.
//!
//! The matching policy is an explicit ordered list of rules evaluated
//! top-to-bottom; the first rule whose pattern matches settles the header,
//! either with a target or with "matched but no confident correction".
//! Keeping the rules separate keeps each one independently testable.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::{ProfileKind, SchemaProfile};

/// Season words a fuzzy token may resolve to.
const SEASONS: &[&str] = &["Winter", "Summer"];

static DMI_VARIANT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?i)dmi[\w-]*$").unwrap());
static YEAR_VARIANT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?i)year[\w-]*(\d*)$").unwrap());

/// Season token plus a 2-or-4-digit year, nothing else.
static SEASON_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)([a-z]+)[_\s-]?(\d{2}|\d{4})$").unwrap());

/// Lenient decomposition: letters, then digits, then an arbitrary suffix.
static LETTERS_DIGITS_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)([a-z]+)[_\s-]?(\d+)[\w\s-]*$").unwrap());

static TRAILING_DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*$").unwrap());

/// What a single rule decided about a header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// Rule matched and proposes this canonical target.
    Target(String),
    /// Rule matched but no safe correction exists (drop or name manually).
    Unresolvable,
    /// Rule does not apply; try the next one.
    NoMatch,
}

/// One entry of the ranked matching policy.
struct HeaderRule {
    /// Short identifier, surfaced in suggestions for auditability.
    name: &'static str,
    apply: fn(&str, i32) -> RuleOutcome,
}

/// Run the profile's ranked rules over one header, first match wins.
///
/// Returns the winning rule's name alongside its outcome; `None` when no
/// rule matched at all.
pub fn match_header(
    header: &str,
    profile: &SchemaProfile,
    current_year: i32,
) -> Option<(&'static str, RuleOutcome)> {
    let rules: &[HeaderRule] = match profile.kind {
        ProfileKind::Deflection => &DEFLECTION_RULES,
        ProfileKind::LteSeason => &LTE_SEASON_RULES,
        ProfileKind::LteCrack => &LTE_CRACK_RULES,
    };

    for rule in rules {
        match (rule.apply)(header.trim(), current_year) {
            RuleOutcome::NoMatch => continue,
            outcome => return Some((rule.name, outcome)),
        }
    }
    None
}

static DEFLECTION_RULES: [HeaderRule; 3] = [
    HeaderRule {
        name: "dmi-variant",
        apply: dmi_variant,
    },
    HeaderRule {
        name: "season-year",
        apply: season_year,
    },
    HeaderRule {
        name: "letters-digits-suffix",
        apply: letters_digits_suffix,
    },
];

static LTE_SEASON_RULES: [HeaderRule; 4] = [
    HeaderRule {
        name: "year-variant",
        apply: year_variant,
    },
    HeaderRule {
        name: "canonical-case",
        apply: |h, y| canonical_case(h, y, &["Year", "Winter", "Summer"]),
    },
    HeaderRule {
        name: "edit-distance",
        apply: |h, y| edit_distance_rule(h, y, &["Year", "Winter", "Summer"]),
    },
    HeaderRule {
        name: "prefix-abbreviation",
        apply: |h, y| prefix_rule(h, y, &["Year", "Winter", "Summer"]),
    },
];

static LTE_CRACK_RULES: [HeaderRule; 4] = [
    HeaderRule {
        name: "year-variant",
        apply: year_variant,
    },
    HeaderRule {
        name: "canonical-case",
        apply: |h, y| canonical_case(h, y, &["Year", "Small", "Medium", "Large"]),
    },
    HeaderRule {
        name: "edit-distance",
        apply: |h, y| edit_distance_rule(h, y, &["Year", "Small", "Medium", "Large"]),
    },
    HeaderRule {
        name: "prefix-abbreviation",
        apply: |h, y| prefix_rule(h, y, &["Year", "Small", "Medium", "Large"]),
    },
];

/// `DMI2`, `dmi`, `DMI-old` and friends all mean the identity column.
fn dmi_variant(header: &str, _current_year: i32) -> RuleOutcome {
    if header != "DMI" && DMI_VARIANT_RE.is_match(header) {
        RuleOutcome::Target("DMI".to_string())
    } else {
        RuleOutcome::NoMatch
    }
}

/// `Year2020` means the identity column; `Year2031` carries a year the data
/// cannot have yet and is never auto-corrected.
fn year_variant(header: &str, current_year: i32) -> RuleOutcome {
    if header == "Year" || !YEAR_VARIANT_RE.is_match(header) {
        return RuleOutcome::NoMatch;
    }
    if let Some(caps) = TRAILING_DIGITS_RE.captures(header) {
        match expand_year_token(&caps[1]) {
            Some(year) if year > current_year => return RuleOutcome::Unresolvable,
            Some(_) => return RuleOutcome::Target("Year".to_string()),
            None => return RuleOutcome::Unresolvable,
        }
    }
    RuleOutcome::Target("Year".to_string())
}

/// Recompose `Season_FullYear` from a fuzzy season token and a year token.
fn season_year(header: &str, current_year: i32) -> RuleOutcome {
    let Some(caps) = SEASON_YEAR_RE.captures(header) else {
        return RuleOutcome::NoMatch;
    };
    compose_season_year(&caps[1], &caps[2], current_year)
}

/// Last-resort decomposition that tolerates a trailing suffix.
fn letters_digits_suffix(header: &str, current_year: i32) -> RuleOutcome {
    let Some(caps) = LETTERS_DIGITS_SUFFIX_RE.captures(header) else {
        return RuleOutcome::NoMatch;
    };
    let digits = &caps[2];
    if digits.len() != 2 && digits.len() != 4 {
        return RuleOutcome::NoMatch;
    }
    compose_season_year(&caps[1], digits, current_year)
}

fn compose_season_year(season_token: &str, year_token: &str, current_year: i32) -> RuleOutcome {
    let Some(season) = match_season(season_token) else {
        return RuleOutcome::NoMatch;
    };
    match expand_year_token(year_token) {
        // A future year cannot be repaired by renaming; the caller has to
        // decide what the header was supposed to say.
        Some(year) if year > current_year => RuleOutcome::Unresolvable,
        Some(year) => RuleOutcome::Target(format!("{season}_{year}")),
        None => RuleOutcome::Unresolvable,
    }
}

/// Exact canonical name, wrong case or stray whitespace.
fn canonical_case(header: &str, _current_year: i32, targets: &[&'static str]) -> RuleOutcome {
    for target in targets {
        if header.eq_ignore_ascii_case(target) {
            return RuleOutcome::Target(target.to_string());
        }
    }
    RuleOutcome::NoMatch
}

/// Typo within edit distance 2 of exactly one canonical name.
fn edit_distance_rule(header: &str, _current_year: i32, targets: &[&'static str]) -> RuleOutcome {
    if header.chars().count() < 4 {
        return RuleOutcome::NoMatch;
    }
    let mut best: Option<(&str, usize)> = None;
    let mut ambiguous = false;
    for target in targets {
        let d = edit_distance(&header.to_lowercase(), &target.to_lowercase());
        match best {
            Some((_, bd)) if d < bd => {
                best = Some((target, d));
                ambiguous = false;
            }
            Some((_, bd)) if d == bd => ambiguous = true,
            None => best = Some((target, d)),
            _ => {}
        }
    }
    match best {
        Some((target, d)) if d <= 2 && !ambiguous => RuleOutcome::Target(target.to_string()),
        _ => RuleOutcome::NoMatch,
    }
}

/// Common abbreviation: the header is a prefix of exactly one canonical name.
fn prefix_rule(header: &str, _current_year: i32, targets: &[&'static str]) -> RuleOutcome {
    if header.chars().count() < 2 {
        return RuleOutcome::NoMatch;
    }
    let lower = header.to_lowercase();
    let mut matches = targets
        .iter()
        .filter(|t| t.to_lowercase().starts_with(&lower));
    match (matches.next(), matches.next()) {
        (Some(target), None) => RuleOutcome::Target(target.to_string()),
        _ => RuleOutcome::NoMatch,
    }
}

/// Fuzzy season token: exact, prefix of at least two characters, or a typo
/// within edit distance 2 (for tokens long enough to make that safe).
fn match_season(token: &str) -> Option<&'static str> {
    let lower = token.to_lowercase();
    for season in SEASONS {
        if lower == season.to_lowercase() {
            return Some(season);
        }
    }
    if lower.chars().count() >= 2 {
        let mut prefixed = SEASONS
            .iter()
            .filter(|s| s.to_lowercase().starts_with(&lower));
        if let (Some(season), None) = (prefixed.next(), prefixed.next()) {
            return Some(season);
        }
    }
    if lower.chars().count() >= 4 {
        for season in SEASONS {
            if edit_distance(&lower, &season.to_lowercase()) <= 2 {
                return Some(season);
            }
        }
    }
    None
}

/// Expand a 2-digit year token to four digits (`22` -> `2022`).
fn expand_year_token(token: &str) -> Option<i32> {
    match token.len() {
        2 => token.parse::<i32>().ok().map(|y| 2000 + y),
        4 => token.parse::<i32>().ok(),
        _ => None,
    }
}

/// Levenshtein distance, two-row rolling table.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
