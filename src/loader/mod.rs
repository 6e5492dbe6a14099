//! Content loaders
//!
//! Parser for the unit/ability content format (.txt)

pub mod content;

pub use content::{ContentLoader, ContentSet, UnitDefinition};
