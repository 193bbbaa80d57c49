// ============================================================================
// Journal
// Append-only transfer, entry and trade records
// ============================================================================

use crate::domain::{AccountId, Entry, Leg, Trade, TradeId, Transfer, TransferId};
use crate::error::{EngineError, EngineResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

const TRANSFER_COLUMNS: &str = "id, from_account_id, to_account_id, amount, created_at";
const ENTRY_COLUMNS: &str = "id, account_id, amount, created_at";
const TRADE_COLUMNS: &str = "id, first_from_account_id, first_to_account_id, first_amount, \
                             second_from_account_id, second_to_account_id, second_amount, created_at";

/// Rows here are created once and never updated or deleted.
pub struct Journal<'c> {
    conn: &'c Connection,
}

impl<'c> Journal<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Appends
    // ========================================================================

    pub fn append_transfer(&self, leg: &Leg) -> EngineResult<Transfer> {
        let transfer = self.conn.query_row(
            &format!(
                "INSERT INTO transfers (from_account_id, to_account_id, amount, created_at) \
                 VALUES (?1, ?2, ?3, ?4) RETURNING {TRANSFER_COLUMNS}"
            ),
            params![leg.from_account, leg.to_account, leg.amount, Utc::now()],
            map_transfer,
        )?;
        Ok(transfer)
    }

    pub fn append_entry(&self, account_id: AccountId, amount: i64) -> EngineResult<Entry> {
        let entry = self.conn.query_row(
            &format!(
                "INSERT INTO entries (account_id, amount, created_at) \
                 VALUES (?1, ?2, ?3) RETURNING {ENTRY_COLUMNS}"
            ),
            params![account_id, amount, Utc::now()],
            map_entry,
        )?;
        Ok(entry)
    }

    pub fn append_trade(&self, first: &Leg, second: &Leg) -> EngineResult<Trade> {
        let trade = self.conn.query_row(
            &format!(
                "INSERT INTO trades (first_from_account_id, first_to_account_id, first_amount, \
                 second_from_account_id, second_to_account_id, second_amount, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) RETURNING {TRADE_COLUMNS}"
            ),
            params![
                first.from_account,
                first.to_account,
                first.amount,
                second.from_account,
                second.to_account,
                second.amount,
                Utc::now(),
            ],
            map_trade,
        )?;
        Ok(trade)
    }

    // ========================================================================
    // Audit reads
    // ========================================================================

    pub fn transfer(&self, id: TransferId) -> EngineResult<Transfer> {
        self.conn
            .query_row(
                &format!("SELECT {TRANSFER_COLUMNS} FROM transfers WHERE id = ?1"),
                params![id],
                map_transfer,
            )
            .optional()?
            .ok_or(EngineError::TransferNotFound(id))
    }

    pub fn trade(&self, id: TradeId) -> EngineResult<Trade> {
        self.conn
            .query_row(
                &format!("SELECT {TRADE_COLUMNS} FROM trades WHERE id = ?1"),
                params![id],
                map_trade,
            )
            .optional()?
            .ok_or(EngineError::TradeNotFound(id))
    }

    pub fn entries(&self, account_id: AccountId) -> EngineResult<Vec<Entry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE account_id = ?1 ORDER BY id"
        ))?;
        let entries = stmt
            .query_map(params![account_id], map_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Sum of an account's signed entries; equals its balance at all times.
    pub fn entry_sum(&self, account_id: AccountId) -> EngineResult<i64> {
        let sum = self.conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM entries WHERE account_id = ?1",
            params![account_id],
            |row| row.get(0),
        )?;
        Ok(sum)
    }

    pub fn transfer_count(&self) -> EngineResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM transfers", [], |row| row.get(0))?)
    }

    pub fn trade_count(&self) -> EngineResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM trades", [], |row| row.get(0))?)
    }

    /// Trades in which the account took part on either leg, oldest first
    pub fn trades_for(&self, account_id: AccountId) -> EngineResult<Vec<Trade>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TRADE_COLUMNS} FROM trades \
             WHERE first_from_account_id = ?1 OR first_to_account_id = ?1 \
                OR second_from_account_id = ?1 OR second_to_account_id = ?1 \
             ORDER BY id"
        ))?;
        let trades = stmt
            .query_map(params![account_id], map_trade)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(trades)
    }
}

fn map_transfer(row: &Row<'_>) -> rusqlite::Result<Transfer> {
    Ok(Transfer {
        id: row.get(0)?,
        from_account: row.get(1)?,
        to_account: row.get(2)?,
        amount: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_entry(row: &Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry {
        id: row.get(0)?,
        account_id: row.get(1)?,
        amount: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn map_trade(row: &Row<'_>) -> rusqlite::Result<Trade> {
    Ok(Trade {
        id: row.get(0)?,
        first: Leg::new(row.get(1)?, row.get(2)?, row.get(3)?),
        second: Leg::new(row.get(4)?, row.get(5)?, row.get(6)?),
        created_at: row.get(7)?,
    })
}
