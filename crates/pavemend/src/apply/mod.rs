//! Applying resolved fixes to produce a cleaned dataset.

mod applier;
mod dataset;

pub use applier::apply_fixes;
pub use dataset::CleanedDataset;
