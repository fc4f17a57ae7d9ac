//! Geography lookup table handling.
//!
//! Turns the flat data zone lookup table into the read-only
//! [`GeographyHierarchy`](crate::models::GeographyHierarchy).

pub mod builder;
pub mod loader;

pub use builder::{BuildOutput, ColumnLayout, HierarchyBuilder};
pub use loader::{load_table, GeographySource};
