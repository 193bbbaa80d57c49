// ============================================================================
// Account Repository
// ============================================================================

use crate::domain::{Account, AccountId, Currency};
use crate::error::{EngineError, EngineResult};
use crate::numeric::{checked_credit, checked_debit, NumericError};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

const ACCOUNT_COLUMNS: &str = "id, owner, balance, currency, created_at";

/// Account rows, read and written through the connection of the current scope.
pub struct AccountRepository<'c> {
    conn: &'c Connection,
}

impl<'c> AccountRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Open a zero-balance account. Funding goes through the ledger.
    pub fn create(&self, owner: &str, currency: Currency) -> EngineResult<Account> {
        let account = self.conn.query_row(
            &format!(
                "INSERT INTO accounts (owner, balance, currency, created_at) \
                 VALUES (?1, 0, ?2, ?3) RETURNING {ACCOUNT_COLUMNS}"
            ),
            params![owner, currency, Utc::now()],
            map_account,
        )?;
        Ok(account)
    }

    pub fn get(&self, id: AccountId) -> EngineResult<Account> {
        self.conn
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"),
                params![id],
                map_account,
            )
            .optional()?
            .ok_or(EngineError::AccountNotFound(id))
    }

    /// Take the row's write lock inside the current scope and return the
    /// locked state. Callers touching several accounts must lock them in
    /// ascending id order.
    pub fn lock(&self, id: AccountId) -> EngineResult<Account> {
        self.conn
            .query_row(
                &format!(
                    "UPDATE accounts SET balance = balance WHERE id = ?1 \
                     RETURNING {ACCOUNT_COLUMNS}"
                ),
                params![id],
                map_account,
            )
            .optional()?
            .ok_or(EngineError::AccountNotFound(id))
    }

    /// Add `amount` to the balance.
    pub fn credit(&self, id: AccountId, amount: i64) -> EngineResult<Account> {
        let current = self.get(id)?;
        let balance = checked_credit(current.balance, amount)?;
        self.set_balance(id, balance)
    }

    /// Take `amount` from the balance. A debit below zero is refused with
    /// `InsufficientFunds` and nothing is written.
    pub fn debit(&self, id: AccountId, amount: i64) -> EngineResult<Account> {
        let current = self.get(id)?;
        let balance = match checked_debit(current.balance, amount) {
            Ok(balance) => balance,
            Err(NumericError::Underflow) => {
                return Err(EngineError::InsufficientFunds {
                    account_id: id,
                    balance: current.balance,
                    required: amount,
                })
            },
            Err(err) => return Err(err.into()),
        };
        self.set_balance(id, balance)
    }

    fn set_balance(&self, id: AccountId, balance: i64) -> EngineResult<Account> {
        let account = self.conn.query_row(
            &format!("UPDATE accounts SET balance = ?1 WHERE id = ?2 RETURNING {ACCOUNT_COLUMNS}"),
            params![balance, id],
            map_account,
        )?;
        Ok(account)
    }

    /// All accounts of one owner, oldest first
    pub fn list_by_owner(&self, owner: &str) -> EngineResult<Vec<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE owner = ?1 ORDER BY id"
        ))?;
        let accounts = stmt
            .query_map(params![owner], map_account)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(accounts)
    }
}

fn map_account(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        owner: row.get(1)?,
        balance: row.get(2)?,
        currency: row.get(3)?,
        created_at: row.get(4)?,
    })
}
