// ============================================================================
// Account Lookup Interface
// Read access to accounts owned by the provisioning service
// ============================================================================

use crate::domain::{Account, AccountId};
use crate::error::EngineResult;

/// Resolves account references on incoming orders.
///
/// The exchange only reads accounts through this trait when checking a
/// request; balances are always re-read under lock by the ledger.
pub trait AccountLookup: Send + Sync {
    /// Fails with `AccountNotFound` for unknown ids
    fn get_account(&self, id: AccountId) -> EngineResult<Account>;
}
