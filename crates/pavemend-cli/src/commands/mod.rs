//! CLI command implementations.

pub mod apply;
pub mod suggest;
pub mod validate;

use std::path::Path;

use chrono::Datelike;

/// Read the input file, refusing early with a clear message when it is absent.
pub(crate) fn read_input(file: &Path) -> Result<String, Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }
    Ok(std::fs::read_to_string(file)?)
}

/// Year bound for validation: the caller's override, or this calendar year.
pub(crate) fn year_bound(year: Option<i32>) -> i32 {
    year.unwrap_or_else(|| chrono::Utc::now().year())
}
