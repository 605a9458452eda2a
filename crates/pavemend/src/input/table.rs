//! Parsed table structure with tagged cell values.

use serde::{Deserialize, Serialize};

/// A single spreadsheet cell, tagged by shape.
///
/// Validators operate on the tagged form only; nothing in the pipeline
/// coerces text to numbers implicitly, so a bad cell can never leak a NaN
/// into downstream arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellValue {
    /// Blank or whitespace-only cell.
    Empty,
    /// Cell whose trimmed text parses as a number.
    Numeric(f64),
    /// Any other non-empty text.
    Text(String),
}

impl CellValue {
    /// Tag a raw field from the delimited input.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => CellValue::Numeric(n),
            _ => CellValue::Text(trimmed.to_string()),
        }
    }

    /// Numeric view of the cell, if it has one.
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            CellValue::Numeric(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Canonical text rendering.
    ///
    /// Numerics re-stringify through their parsed value, so `"050"` and
    /// `"50"` render identically. Integral values drop the fraction.
    pub fn render(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Numeric(n) => render_numeric(*n),
            CellValue::Text(s) => s.clone(),
        }
    }
}

/// Render a finite number without a trailing `.0` when it is integral.
fn render_numeric(n: f64) -> String {
    if n == 0.0 {
        // Collapses -0.0 as well.
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Parsed tabular data: a header row plus row-major tagged cells.
///
/// Rows are immutable once parsed; every transformation builds a new table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyTable {
    /// Column headers in input order (trimmed, original spelling kept).
    pub headers: Vec<String>,
    /// Row data in file order. Every row has exactly `headers.len()` cells.
    pub rows: Vec<Vec<CellValue>>,
}

impl SurveyTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { headers, rows }
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Index of the first column with exactly this header.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// All values for a column by index, one per row.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &CellValue> {
        self.rows
            .iter()
            .map(move |row| row.get(index).unwrap_or(&CellValue::Empty))
    }

    /// A specific cell.
    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// How many rows carry a non-empty value in this column.
    pub fn occupancy(&self, index: usize) -> usize {
        self.column_values(index).filter(|c| !c.is_empty()).count()
    }
}
