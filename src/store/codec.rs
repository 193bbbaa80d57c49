// ============================================================================
// Column Codecs
// SQLite representations of domain value objects
// ============================================================================

use crate::domain::{
    AccountId, Currency, EntryId, OrderId, OrderStatus, Pair, Side, TradeId, TransferId,
};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

/// Stored as their textual form (`"bid"`, `"BTC/USDT"`, ...)
macro_rules! text_column {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.to_string()))
                }
            }

            impl FromSql for $ty {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value
                        .as_str()?
                        .parse::<$ty>()
                        .map_err(|err| FromSqlError::Other(Box::new(err)))
                }
            }
        )*
    };
}

/// Stored as INTEGER row ids
macro_rules! id_column {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.value()))
                }
            }

            impl FromSql for $ty {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value.as_i64().map(<$ty>::new)
                }
            }
        )*
    };
}

text_column!(Side, OrderStatus, Pair, Currency);
id_column!(OrderId, AccountId, TradeId, TransferId, EntryId);

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_values_survive_a_round_trip_through_sqlite() {
        let conn = Connection::open_in_memory().unwrap();
        let pair: Pair = "ETH/BTC".parse().unwrap();

        let (side, status, stored_pair, id): (Side, OrderStatus, Pair, OrderId) = conn
            .query_row(
                "SELECT ?1, ?2, ?3, ?4",
                rusqlite::params![Side::Ask, OrderStatus::Canceled, pair, OrderId::new(17)],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();

        assert_eq!(side, Side::Ask);
        assert_eq!(status, OrderStatus::Canceled);
        assert_eq!(stored_pair, pair);
        assert_eq!(id, OrderId::new(17));
    }

    #[test]
    fn test_unknown_text_is_a_conversion_error() {
        let conn = Connection::open_in_memory().unwrap();
        let result: rusqlite::Result<Side> = conn.query_row("SELECT 'sideways'", [], |row| row.get(0));
        assert!(result.is_err());
    }
}
