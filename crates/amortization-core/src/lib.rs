pub mod engines;
pub mod error;
pub mod format;
pub mod inputs;
pub mod rounding;
pub mod schedule;
pub mod types;

#[cfg(feature = "analysis")]
pub mod analysis;

pub use error::{AmortizationError, FieldError};
pub use types::*;

/// Standard result type for all amortization operations
pub type AmortizationResult<T> = Result<T, AmortizationError>;
