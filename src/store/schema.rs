// ============================================================================
// Schema
// Tables backing orders, accounts and the append-only journal
// ============================================================================

use rusqlite::Connection;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    owner       TEXT    NOT NULL,
    balance     INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
    currency    TEXT    NOT NULL,
    created_at  TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS orders (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    side             TEXT    NOT NULL CHECK (side IN ('bid', 'ask')),
    pair             TEXT    NOT NULL,
    from_account_id  INTEGER NOT NULL REFERENCES accounts (id),
    to_account_id    INTEGER NOT NULL REFERENCES accounts (id),
    price            INTEGER NOT NULL CHECK (price > 0),
    initial_amount   INTEGER NOT NULL CHECK (initial_amount > 0),
    remaining_amount INTEGER NOT NULL
        CHECK (remaining_amount >= 0 AND remaining_amount <= initial_amount),
    status           TEXT    NOT NULL CHECK (status IN ('active', 'completed', 'canceled')),
    created_at       TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS orders_tradable_idx ON orders (side, pair, status, id);

CREATE TABLE IF NOT EXISTS transfers (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    from_account_id INTEGER NOT NULL REFERENCES accounts (id),
    to_account_id   INTEGER NOT NULL REFERENCES accounts (id),
    amount          INTEGER NOT NULL CHECK (amount > 0),
    created_at      TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS entries (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id  INTEGER NOT NULL REFERENCES accounts (id),
    amount      INTEGER NOT NULL,
    created_at  TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS entries_account_idx ON entries (account_id);

CREATE TABLE IF NOT EXISTS trades (
    id                     INTEGER PRIMARY KEY AUTOINCREMENT,
    first_from_account_id  INTEGER NOT NULL REFERENCES accounts (id),
    first_to_account_id    INTEGER NOT NULL REFERENCES accounts (id),
    first_amount           INTEGER NOT NULL CHECK (first_amount > 0),
    second_from_account_id INTEGER NOT NULL REFERENCES accounts (id),
    second_to_account_id   INTEGER NOT NULL REFERENCES accounts (id),
    second_amount          INTEGER NOT NULL CHECK (second_amount > 0),
    created_at             TEXT    NOT NULL
);
";

/// Create any missing tables and indexes.
pub(crate) fn ensure(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        ensure(&conn).unwrap();
        ensure(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
                 AND name IN ('accounts', 'orders', 'transfers', 'entries', 'trades')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 5);
    }
}
