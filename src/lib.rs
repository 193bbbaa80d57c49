// ============================================================================
// Exchange Settlement Library
// Durable order matching with per-fill atomic settlement
// ============================================================================

//! # Exchange Settlement
//!
//! The settlement core of a digital-asset exchange: incoming limit orders are
//! matched against resting counter-orders read from durable storage, and every
//! fill moves funds between the counterparties' accounts atomically.
//!
//! ## Features
//!
//! - **Durable order state** in SQLite; no in-memory order book
//! - **Per-fill atomicity**: the trade, both transfers and the counter-order
//!   update of one fill commit together or not at all
//! - **No double-spend**: counter-orders are updated conditionally on the
//!   quantity the matcher observed, account rows are locked in ascending id
//! - **Double-entry ledger**: the entries of an account always sum to its
//!   balance
//! - **Event hooks** for auditing and notification
//!
//! ## Example
//!
//! ```rust
//! use exchange_settlement::prelude::*;
//!
//! let exchange = ExchangeBuilder::new().in_memory().build().unwrap();
//!
//! // Provision and fund accounts (normally done by the account service)
//! let (seller_btc, seller_usdt, buyer_btc, buyer_usdt) = exchange
//!     .store()
//!     .run_atomic(|tx| {
//!         let accounts = AccountRepository::new(tx);
//!         let ledger = Ledger::new(tx);
//!         let seller_btc = accounts.create("seller", Currency::Btc)?.id;
//!         let seller_usdt = accounts.create("seller", Currency::Usdt)?.id;
//!         let buyer_btc = accounts.create("buyer", Currency::Btc)?.id;
//!         let buyer_usdt = accounts.create("buyer", Currency::Usdt)?.id;
//!         ledger.deposit(seller_btc, 10)?;
//!         ledger.deposit(buyer_usdt, 1_000)?;
//!         Ok((seller_btc, seller_usdt, buyer_btc, buyer_usdt))
//!     })
//!     .unwrap();
//!
//! let pair: Pair = "BTC/USDT".parse().unwrap();
//!
//! let ask = OrderRequest::ask(pair, 100, 10, seller_btc, seller_usdt);
//! exchange.submit_order(&Principal::new("seller"), ask).unwrap();
//!
//! let bid = OrderRequest::bid(pair, 100, 10, buyer_usdt, buyer_btc);
//! let receipt = exchange.submit_order(&Principal::new("buyer"), bid).unwrap();
//!
//! assert_eq!(receipt.status, OrderStatus::Completed);
//! assert_eq!(receipt.filled, 10);
//! ```

pub mod domain;
pub mod engine;
pub mod error;
pub mod interfaces;
pub mod numeric;
pub mod store;
pub mod utils;

// Re-exports for convenience
pub mod prelude {
    pub use crate::domain::order::state::{OrderStatus, OrderTransition};
    pub use crate::domain::{
        Account, AccountId, Currency, EngineConfig, Entry, Leg, Order, OrderId, OrderRequest,
        Pair, Principal, Settlement, Side, StoreConfig, Trade, TradeId, Transfer,
    };
    pub use crate::engine::{
        create_from_config, Exchange, ExchangeBuilder, Fill, Ledger, MatchInterrupted,
        MatchOutcome, OrderMatcher, SettlementExecutor, SubmitReceipt,
    };
    pub use crate::error::{EngineError, EngineResult, ErrorKind};
    pub use crate::interfaces::{
        AccountLookup, ChannelEventHandler, EventHandler, LoggingEventHandler, NoOpEventHandler,
        OrderEvent,
    };
    pub use crate::store::{AccountRepository, Journal, OrderRepository, Store};
}
