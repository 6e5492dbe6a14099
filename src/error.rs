//! Error types for Grid Skirmish

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkirmishError {
    #[error("Invalid content format: {0}")]
    InvalidContentFormat(String),

    #[error("Unit not found: {0}")]
    UnitNotFound(u32),

    #[error("Position out of bounds: ({0}, {1})")]
    OutOfBounds(i32, i32),

    #[error("Cell occupied: ({0}, {1})")]
    CellOccupied(i32, i32),

    #[error("Invalid game action: {0}")]
    InvalidAction(String),

    #[error("Expression parse error: {0}")]
    ExpressionError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SkirmishError>;
