pub mod error;
pub mod types;

#[cfg(feature = "simulation")]
pub mod simulation;

#[cfg(feature = "insights")]
pub mod insights;

pub use error::{ArithmeticFault, CalculationStage, ConsorcioError};
pub use types::*;

/// Standard result type for all consorcio operations
pub type ConsorcioResult<T> = Result<T, ConsorcioError>;
