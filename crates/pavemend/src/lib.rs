//! Pavemend: validation and auto-repair for pavement survey imports.
//!
//! Pavemend takes delimited survey exports (deflection and load-transfer
//! readings) whose headers and values have drifted from the canonical
//! schema, reports every defect in one pass, proposes deterministic fixes,
//! and applies the fixes a caller accepts.
//!
//! # Core Principles
//!
//! - **Non-destructive**: the parsed input is never mutated; applying fixes
//!   builds a new dataset
//! - **Whole-report validation**: every defect is surfaced at once, never
//!   one failure at a time
//! - **Deterministic**: same input, same profile, same injected year, same
//!   output, byte for byte
//!
//! # Example
//!
//! ```no_run
//! use pavemend::{ImportPipeline, ProfileKind};
//!
//! let mut pipeline = ImportPipeline::new(ProfileKind::Deflection, 2025);
//! pipeline.parse_text("DMI2,Wintr_22\n0,1.5\n130,2.0\n").unwrap();
//! if !pipeline.validate().unwrap().is_clean() {
//!     pipeline.suggest().unwrap();
//!     pipeline.resolve().unwrap();
//! }
//! let dataset = pipeline.apply().unwrap();
//! println!("{}", dataset.to_csv_string());
//! ```

pub mod apply;
pub mod error;
pub mod input;
pub mod schema;
pub mod session;
pub mod suggest;
pub mod validation;

mod pipeline;

pub use apply::{apply_fixes, CleanedDataset};
pub use error::{PavemendError, Result};
pub use input::{parse, CellValue, SurveyTable};
pub use pipeline::{ImportPipeline, PipelineState};
pub use schema::{ProfileKind, SchemaProfile, SchemaRegistry};
pub use session::{ReconciliationSession, Resolution};
pub use suggest::{suggest_fixes, SuggestionSet};
pub use validation::{validate, ValidationReport};
