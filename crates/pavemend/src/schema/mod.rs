//! Canonical column schemas for the three supported sheet shapes.

mod profile;

pub use profile::{ProfileKind, SchemaProfile, SchemaRegistry};
