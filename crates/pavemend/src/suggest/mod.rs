//! Fix suggestion: fuzzy header correction and numeric value corrections.

mod generator;
mod matcher;

pub use generator::{
    suggest_fixes, HeaderSuggestion, SuggestionCollision, SuggestionSet, ValueCorrection,
};
pub use matcher::{match_header, RuleOutcome};
