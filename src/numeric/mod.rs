// ============================================================================
// Numeric Module
// Checked integer arithmetic on minor currency units
// ============================================================================
//
// Balances, prices and quantities are plain i64 counts of the smallest unit
// of their currency (satoshi, cent, ...). Every operation that can move money
// goes through a checked helper here and reports overflow as an error.

mod errors;
mod minor_units;

pub use errors::{NumericError, NumericResult};
pub use minor_units::{checked_credit, checked_debit, checked_notional, ensure_positive};
