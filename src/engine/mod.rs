// ============================================================================
// Engine Module
// Contains the matching and settlement business logic
// ============================================================================

mod exchange;
mod ledger;
mod matcher;
mod settlement;

pub mod factory;

pub use exchange::{Exchange, SubmitReceipt};
pub use factory::{create_from_config, ExchangeBuilder};
pub use ledger::Ledger;
pub use matcher::{Fill, MatchInterrupted, MatchOutcome, OrderMatcher};
pub use settlement::SettlementExecutor;
