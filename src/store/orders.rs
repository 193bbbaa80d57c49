// ============================================================================
// Order Repository
// Durable store of resting orders
// ============================================================================

use crate::domain::config::MAX_PAGE_SIZE;
use crate::domain::{
    AccountId, Order, OrderId, OrderStatus, OrderTransition, Pair, Side,
};
use crate::error::{EngineError, EngineResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

const ORDER_COLUMNS: &str = "id, side, pair, from_account_id, to_account_id, price, \
                             initial_amount, remaining_amount, status, created_at";

/// Price filter applied to resting orders of `counter_side`: asks priced at
/// or below the limit, bids priced at or above it.
fn price_filter(counter_side: Side) -> &'static str {
    match counter_side {
        Side::Ask => "price <= ?3",
        Side::Bid => "price >= ?3",
    }
}

pub struct OrderRepository<'c> {
    conn: &'c Connection,
}

impl<'c> OrderRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Insert an active order with `remaining = initial = amount`.
    pub fn create(
        &self,
        side: Side,
        pair: Pair,
        from_account: AccountId,
        to_account: AccountId,
        price: i64,
        amount: i64,
    ) -> EngineResult<Order> {
        if price <= 0 || amount <= 0 {
            return Err(EngineError::validation("price and amount must be positive"));
        }

        let order = self.conn.query_row(
            &format!(
                "INSERT INTO orders (side, pair, from_account_id, to_account_id, price, \
                 initial_amount, remaining_amount, status, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?7, ?8) RETURNING {ORDER_COLUMNS}"
            ),
            params![
                side,
                pair,
                from_account,
                to_account,
                price,
                amount,
                OrderStatus::Active,
                Utc::now(),
            ],
            map_order,
        )?;
        Ok(order)
    }

    pub fn get(&self, id: OrderId) -> EngineResult<Order> {
        self.conn
            .query_row(
                &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"),
                params![id],
                map_order,
            )
            .optional()?
            .ok_or(EngineError::OrderNotFound(id))
    }

    /// One page of active `counter_side` orders on `pair` that can trade
    /// against an incoming limit of `price`, in ascending id order.
    ///
    /// `page` is 1-based.
    pub fn list_tradable_counter_orders(
        &self,
        pair: Pair,
        price: i64,
        counter_side: Side,
        page: u32,
        page_size: u32,
    ) -> EngineResult<Vec<Order>> {
        if page == 0 {
            return Err(EngineError::validation("page numbers start at 1"));
        }
        check_page_size(page_size)?;

        let offset = i64::from(page - 1) * i64::from(page_size);
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE side = ?1 AND pair = ?2 AND {} AND status = 'active' \
             ORDER BY id LIMIT ?4 OFFSET ?5",
            price_filter(counter_side)
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let orders = stmt
            .query_map(
                params![counter_side, pair, price, page_size, offset],
                map_order,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(orders)
    }

    /// Keyset variant of [`list_tradable_counter_orders`]: the next
    /// `page_size` tradable orders with an id greater than `after`.
    ///
    /// Orders completed by earlier fills drop out of the active set, so
    /// offset paging would skip unvisited orders; a cursor does not.
    ///
    /// [`list_tradable_counter_orders`]: OrderRepository::list_tradable_counter_orders
    pub fn list_tradable_after(
        &self,
        pair: Pair,
        price: i64,
        counter_side: Side,
        after: Option<OrderId>,
        page_size: u32,
    ) -> EngineResult<Vec<Order>> {
        check_page_size(page_size)?;

        let after = after.map_or(0, OrderId::value);
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE side = ?1 AND pair = ?2 AND {} AND status = 'active' AND id > ?4 \
             ORDER BY id LIMIT ?5",
            price_filter(counter_side)
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let orders = stmt
            .query_map(params![counter_side, pair, price, after, page_size], map_order)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(orders)
    }

    /// Record a fill against an active order.
    ///
    /// The write only lands if the stored remaining quantity still equals
    /// `expected_remaining` and the order is still active; otherwise the
    /// caller lost a race and gets `Conflict`.
    pub fn update(
        &self,
        id: OrderId,
        expected_remaining: i64,
        new_remaining: i64,
        new_status: OrderStatus,
    ) -> EngineResult<Order> {
        if new_remaining < 0 || new_remaining > expected_remaining {
            return Err(EngineError::Validation(format!(
                "remaining of order {} cannot go from {} to {}",
                id, expected_remaining, new_remaining
            )));
        }
        // Counter-orders are listed as active; the fill must lead from there
        // to `new_status` in the transition table
        let observed = OrderStatus::Active;
        if observed.transition(OrderTransition::for_fill(new_remaining)) != Some(new_status) {
            return Err(EngineError::Validation(format!(
                "order {} with remaining {} cannot be {}",
                id, new_remaining, new_status
            )));
        }

        let updated = self
            .conn
            .query_row(
                &format!(
                    "UPDATE orders SET remaining_amount = ?1, status = ?2 \
                     WHERE id = ?3 AND remaining_amount = ?4 AND status = ?5 \
                     RETURNING {ORDER_COLUMNS}"
                ),
                params![new_remaining, new_status, id, expected_remaining, observed],
                map_order,
            )
            .optional()?;

        match updated {
            Some(order) => Ok(order),
            None => {
                let current = self.get(id)?;
                Err(EngineError::Conflict {
                    order_id: id,
                    expected: expected_remaining,
                    actual: current.remaining_amount,
                    status: current.status,
                })
            },
        }
    }

    /// Cancel an order if its current status allows it. The remaining
    /// quantity is kept as is.
    pub fn cancel(&self, id: OrderId) -> EngineResult<Order> {
        let current = self.get(id)?;
        let new_status = current.apply(OrderTransition::Cancel)?;

        let canceled = self
            .conn
            .query_row(
                &format!(
                    "UPDATE orders SET status = ?1 WHERE id = ?2 AND status = ?3 \
                     RETURNING {ORDER_COLUMNS}"
                ),
                params![new_status, id, current.status],
                map_order,
            )
            .optional()?;

        match canceled {
            Some(order) => Ok(order),
            None => {
                let latest = self.get(id)?;
                Err(EngineError::Conflict {
                    order_id: id,
                    expected: current.remaining_amount,
                    actual: latest.remaining_amount,
                    status: latest.status,
                })
            },
        }
    }

    /// Orders placed from or into an account, oldest first
    pub fn list_by_account(&self, account_id: AccountId) -> EngineResult<Vec<Order>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE from_account_id = ?1 OR to_account_id = ?1 ORDER BY id"
        ))?;
        let orders = stmt
            .query_map(params![account_id], map_order)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(orders)
    }
}

fn check_page_size(page_size: u32) -> EngineResult<()> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(EngineError::Validation(format!(
            "page size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, page_size
        )));
    }
    Ok(())
}

fn map_order(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        side: row.get(1)?,
        pair: row.get(2)?,
        from_account: row.get(3)?,
        to_account: row.get(4)?,
        price: row.get(5)?,
        initial_amount: row.get(6)?,
        remaining_amount: row.get(7)?,
        status: row.get(8)?,
        created_at: row.get(9)?,
    })
}
