//! Delimited-text parser.
//!
//! Parsing is deliberately forgiving: short rows are padded, long rows are
//! truncated, and nothing about a malformed row aborts the pass. Defects are
//! the validators' job, so the whole defect set can be collected at once.

use crate::error::{PavemendError, Result};

use super::table::{CellValue, SurveyTable};

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Field delimiter.
    pub delimiter: u8,
    /// Quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
        }
    }
}

/// Parse raw delimited text into a [`SurveyTable`].
///
/// The first non-blank line is the header row and fixes the column order;
/// blank lines anywhere are skipped.
pub fn parse(text: &str) -> Result<SurveyTable> {
    parse_with_config(text, &ParserConfig::default())
}

/// Parse with an explicit configuration.
pub fn parse_with_config(text: &str, config: &ParserConfig) -> Result<SurveyTable> {
    if text.trim().is_empty() {
        return Err(PavemendError::EmptyData("no header row found".to_string()));
    }

    // Leading blank lines precede any quoting and are safe to strip; the
    // rest of the text reaches the reader untouched so newlines inside
    // quoted fields survive. Past the header, truly empty lines never
    // surface as records and a whitespace-only line surfaces as one
    // blank field, skipped below.
    let mut start = 0;
    for line in text.split_inclusive('\n') {
        if !line.trim().is_empty() {
            break;
        }
        start += line.len();
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .quote(config.quote)
        .has_headers(true)
        .flexible(true)
        .from_reader(text[start..].as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(PavemendError::EmptyData("no columns found".to_string()));
    }

    let expected_cols = headers.len();
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record?;
        if record.len() == 1 && record.get(0).is_some_and(|f| f.trim().is_empty()) {
            continue;
        }
        let mut row: Vec<CellValue> = record.iter().map(CellValue::from_raw).collect();

        // Pad short rows; truncate long ones.
        while row.len() < expected_cols {
            row.push(CellValue::Empty);
        }
        row.truncate(expected_cols);

        rows.push(row);
    }

    Ok(SurveyTable::new(headers, rows))
}
