// ============================================================================
// Numeric Errors
// Error types for minor-unit arithmetic
// ============================================================================

use std::fmt;

/// Errors that can occur while computing amounts in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericError {
    /// Result exceeded i64::MAX
    Overflow,
    /// Result fell below the allowed minimum (zero for balances)
    Underflow,
    /// Amount, price or quantity was zero or negative where a positive value is required
    NonPositive,
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::Overflow => {
                write!(f, "arithmetic overflow: result exceeded maximum value")
            },
            NumericError::Underflow => {
                write!(f, "arithmetic underflow: result below minimum value")
            },
            NumericError::NonPositive => write!(f, "value must be positive"),
        }
    }
}

impl std::error::Error for NumericError {}

/// Result type alias for numeric operations
pub type NumericResult<T> = Result<T, NumericError>;
