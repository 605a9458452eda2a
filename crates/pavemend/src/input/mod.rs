//! Parsing raw delimited text into tagged-cell tables.

mod parser;
mod table;

pub use parser::{parse, parse_with_config, ParserConfig};
pub use table::{CellValue, SurveyTable};
