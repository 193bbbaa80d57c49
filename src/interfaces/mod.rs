// ============================================================================
// Interfaces Module
// Contains all trait definitions and contracts
// ============================================================================

mod account_lookup;
mod event_handler;

pub use account_lookup::AccountLookup;
pub use event_handler::{
    ChannelEventHandler, EventHandler, LoggingEventHandler, NoOpEventHandler, OrderEvent,
};
