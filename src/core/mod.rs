//! Core data types: identifiers, grid positions, and units

pub mod position;
pub mod types;
pub mod unit;

pub use position::Position;
pub use types::{AbilityId, PlayerId, UnitId, UnitTypeId};
pub use unit::{StatKind, Unit};
