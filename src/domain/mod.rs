// ============================================================================
// Domain Models Module
// Contains all core domain entities and value objects
// ============================================================================

pub mod account;
pub mod config;
pub mod ids;
pub mod order;
pub mod pair;
pub mod trade;

pub use account::{Account, Entry, Principal, Transfer};
pub use config::{EngineConfig, StoreConfig};
pub use ids::{AccountId, EntryId, OrderId, TradeId, TransferId};
pub use order::{Order, OrderRequest, Side};
pub use pair::{Currency, Pair};
pub use trade::{FillLegs, Leg, Settlement, Trade};

// Re-export state machine
pub use order::state::{OrderStatus, OrderTransition};
