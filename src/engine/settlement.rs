// ============================================================================
// Settlement Executor
// Records a trade and both of its legs as one unit
// ============================================================================

use crate::domain::{Leg, Settlement};
use crate::engine::Ledger;
use crate::error::EngineResult;
use crate::numeric::ensure_positive;
use crate::store::{Journal, Store};
use rusqlite::Connection;
use tracing::debug;

/// Settles the two opposite-currency legs of one fill.
///
/// `settle` works on the caller's scope and never opens one of its own, so a
/// failure in the second leg is undone together with the trade row and the
/// first leg when that scope rolls back.
pub struct SettlementExecutor<'c> {
    conn: &'c Connection,
}

impl<'c> SettlementExecutor<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn settle(&self, first: Leg, second: Leg) -> EngineResult<Settlement> {
        ensure_positive(first.amount)?;
        ensure_positive(second.amount)?;

        let trade = Journal::new(self.conn).append_trade(&first, &second)?;

        let ledger = Ledger::new(self.conn);
        let first_transfer = ledger.transfer(first.from_account, first.to_account, first.amount)?;
        let second_transfer =
            ledger.transfer(second.from_account, second.to_account, second.amount)?;

        debug!(
            trade_id = %trade.id,
            first_amount = first.amount,
            second_amount = second.amount,
            "Trade settled"
        );

        Ok(Settlement {
            trade,
            first_transfer,
            second_transfer,
        })
    }
}

impl SettlementExecutor<'_> {
    /// Settle in a scope of its own, for callers that are not already inside one.
    pub fn settle_atomic(store: &Store, first: Leg, second: Leg) -> EngineResult<Settlement> {
        store.run_atomic(|tx| SettlementExecutor::new(tx).settle(first, second))
    }
}
