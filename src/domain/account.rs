// ============================================================================
// Account and Ledger Records
// ============================================================================

use super::pair::Currency;
use super::{AccountId, EntryId, TransferId};
use chrono::{DateTime, Utc};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Single-currency balance owned by one principal.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Account {
    pub id: AccountId,
    pub owner: String,
    /// Minor units, never negative
    pub balance: i64,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
}

/// One directional movement of funds between two accounts of the same currency.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transfer {
    pub id: TransferId,
    pub from_account: AccountId,
    pub to_account: AccountId,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Signed ledger line. The entries of an account always sum to its balance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Entry {
    pub id: EntryId,
    pub account_id: AccountId,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// The authenticated caller on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Principal {
    username: String,
}

impl Principal {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn owns(&self, account: &Account) -> bool {
        account.owner == self.username
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}
