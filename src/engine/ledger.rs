// ============================================================================
// Ledger
// Directional fund movements between single-currency accounts
// ============================================================================

use crate::domain::{AccountId, Entry, Leg, Transfer};
use crate::error::{EngineError, EngineResult};
use crate::numeric::ensure_positive;
use crate::store::{AccountRepository, Journal};
use rusqlite::Connection;
use tracing::debug;

/// Moves funds inside the caller's atomic scope.
///
/// Every balance change is mirrored by a signed entry, so the entries of an
/// account always sum to its balance. A failed call leaves its writes in the
/// enclosing scope, which the caller must roll back; [`Store::run_atomic`]
/// does that automatically.
///
/// [`Store::run_atomic`]: crate::store::Store::run_atomic
pub struct Ledger<'c> {
    accounts: AccountRepository<'c>,
    journal: Journal<'c>,
}

impl<'c> Ledger<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            accounts: AccountRepository::new(conn),
            journal: Journal::new(conn),
        }
    }

    /// Move `amount` from `from` to `to`.
    ///
    /// Both accounts are locked lowest id first, whoever the payer is, so two
    /// transfers over the same pair of accounts never wait on each other in
    /// opposite orders.
    pub fn transfer(&self, from: AccountId, to: AccountId, amount: i64) -> EngineResult<Transfer> {
        ensure_positive(amount)?;

        let (low, high) = if from <= to { (from, to) } else { (to, from) };
        let low_account = self.accounts.lock(low)?;
        let high_account = if high == low {
            low_account.clone()
        } else {
            self.accounts.lock(high)?
        };
        let (source, destination) = if from == low {
            (low_account, high_account)
        } else {
            (high_account, low_account)
        };

        if source.currency != destination.currency {
            return Err(EngineError::CurrencyMismatch {
                account_id: to,
                expected: source.currency,
                actual: destination.currency,
            });
        }
        // Refuses with InsufficientFunds before anything is written
        self.accounts.debit(from, amount)?;
        self.accounts.credit(to, amount)?;

        let transfer = self.journal.append_transfer(&Leg::new(from, to, amount))?;
        self.journal.append_entry(from, -amount)?;
        self.journal.append_entry(to, amount)?;

        debug!(
            transfer_id = %transfer.id,
            from = %from,
            to = %to,
            amount,
            currency = %source.currency,
            "Transfer recorded"
        );
        Ok(transfer)
    }

    /// Credit external funds to an account.
    pub fn deposit(&self, account_id: AccountId, amount: i64) -> EngineResult<Entry> {
        ensure_positive(amount)?;

        self.accounts.lock(account_id)?;
        self.accounts.credit(account_id, amount)?;
        let entry = self.journal.append_entry(account_id, amount)?;

        debug!(account_id = %account_id, amount, "Deposit recorded");
        Ok(entry)
    }

    /// Whether the account's balance equals the sum of its entries.
    pub fn reconcile(&self, account_id: AccountId) -> EngineResult<bool> {
        let account = self.accounts.get(account_id)?;
        let sum = self.journal.entry_sum(account_id)?;
        Ok(account.balance == sum)
    }
}
