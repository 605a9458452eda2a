//! Cleaned output dataset with a content hash for idempotence checks.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::input::SurveyTable;

/// A repaired table that has passed re-validation.
///
/// The CSV rendering and its hash are computed once at construction, so two
/// datasets with the same `content_hash` are byte-identical on disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanedDataset {
    /// The repaired table in canonical column order.
    pub table: SurveyTable,
    /// `sha256:<hex>` over the canonical CSV rendering.
    pub content_hash: String,
    #[serde(skip)]
    content: String,
}

impl CleanedDataset {
    pub(crate) fn new(table: SurveyTable) -> Result<Self> {
        let content = render_csv(&table)?;
        let content_hash = format!("sha256:{:x}", Sha256::digest(content.as_bytes()));
        Ok(Self {
            table,
            content_hash,
            content,
        })
    }

    /// Canonical CSV rendering: header row first, cells in canonical form
    /// (`050` comes out as `50`, integral floats drop the fraction).
    pub fn to_csv_string(&self) -> &str {
        &self.content
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }
}

fn render_csv(table: &SurveyTable) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|cell| cell.render()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::CellValue;

    fn dataset() -> CleanedDataset {
        let table = SurveyTable::new(
            vec!["DMI".into(), "Winter_2022".into()],
            vec![
                vec![CellValue::Numeric(0.0), CellValue::Numeric(1.5)],
                vec![CellValue::Numeric(50.0), CellValue::Text("".into())],
            ],
        );
        CleanedDataset::new(table).unwrap()
    }

    #[test]
    fn test_csv_rendering_is_canonical() {
        assert_eq!(dataset().to_csv_string(), "DMI,Winter_2022\n0,1.5\n50,\n");
    }

    #[test]
    fn test_hash_is_stable_and_prefixed() {
        let a = dataset();
        let b = dataset();
        assert!(a.content_hash.starts_with("sha256:"));
        assert_eq!(a.content_hash, b.content_hash);
    }
}
