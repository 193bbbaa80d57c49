// ============================================================================
// Store Module
// Durable SQLite storage and the unit-of-work primitive
// ============================================================================

mod accounts;
mod codec;
mod journal;
mod orders;
mod schema;

pub use accounts::AccountRepository;
pub use journal::Journal;
pub use orders::OrderRepository;

use crate::domain::{Account, AccountId, StoreConfig};
use crate::error::EngineResult;
use crate::interfaces::AccountLookup;
use parking_lot::Mutex;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, info, warn};

/// Handle to the durable store.
///
/// Constructed once and shared (`Arc<Store>`) by every component. Work that
/// must commit or abort as a whole runs inside [`Store::run_atomic`]; nested
/// components receive the same transaction handle instead of opening their
/// own scope.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) the database described by `config`.
    pub fn open(config: &StoreConfig) -> EngineResult<Self> {
        let conn = match &config.path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent).map_err(|err| {
                            crate::error::EngineError::Validation(format!(
                                "cannot create database directory {}: {}",
                                parent.display(),
                                err
                            ))
                        })?;
                    }
                }

                let conn = Connection::open(path)?;
                let mode: String =
                    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
                info!(path = %path.display(), journal_mode = %mode, "Opened settlement store");
                conn
            },
            None => {
                debug!("Opened in-memory settlement store");
                Connection::open_in_memory()?
            },
        };

        conn.busy_timeout(config.busy_timeout)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::ensure(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Volatile store for tests and benchmarks
    pub fn open_in_memory() -> EngineResult<Self> {
        Self::open(&StoreConfig::default())
    }

    /// Run `work` inside one atomic scope.
    ///
    /// Commits when `work` returns `Ok`, rolls back when it returns `Err`.
    /// `work` must not call `run_atomic` again: the connection is held for
    /// the whole scope and nested scopes deadlock.
    pub fn run_atomic<T, F>(&self, work: F) -> EngineResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> EngineResult<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        match work(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            },
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            },
        }
    }

    /// Run read-only `work` against the connection without a write scope.
    pub fn read<T, F>(&self, work: F) -> EngineResult<T>
    where
        F: FnOnce(&Connection) -> EngineResult<T>,
    {
        let conn = self.conn.lock();
        work(&conn)
    }
}

impl AccountLookup for Store {
    fn get_account(&self, id: AccountId) -> EngineResult<Account> {
        self.read(|conn| AccountRepository::new(conn).get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Currency;
    use crate::error::EngineError;

    #[test]
    fn test_commit_on_success() {
        let store = Store::open_in_memory().unwrap();

        let account = store
            .run_atomic(|tx| AccountRepository::new(tx).create("alice", Currency::Btc))
            .unwrap();

        let fetched = store.get_account(account.id).unwrap();
        assert_eq!(fetched.owner, "alice");
        assert_eq!(fetched.balance, 0);
    }

    #[test]
    fn test_rollback_on_error() {
        let store = Store::open_in_memory().unwrap();

        let result: EngineResult<()> = store.run_atomic(|tx| {
            AccountRepository::new(tx).create("bob", Currency::Usdt)?;
            Err(EngineError::validation("abort"))
        });
        assert!(result.is_err());

        let count: i64 = store
            .read(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_durable_store_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("settlement-store-{}", uuid::Uuid::new_v4()));
        let config = StoreConfig {
            path: Some(dir.join("ledger.db")),
            ..StoreConfig::default()
        };

        let id = {
            let store = Store::open(&config).unwrap();
            store
                .run_atomic(|tx| AccountRepository::new(tx).create("carol", Currency::Eth))
                .unwrap()
                .id
        };

        let reopened = Store::open(&config).unwrap();
        assert_eq!(reopened.get_account(id).unwrap().currency, Currency::Eth);

        drop(reopened);
        let _ = std::fs::remove_dir_all(dir);
    }
}
