// ============================================================================
// Order Matcher
// Walks resting counter-orders and settles one fill at a time
// ============================================================================

use crate::domain::{FillLegs, Order, OrderId, OrderRequest, OrderStatus, Trade};
use crate::engine::SettlementExecutor;
use crate::error::{EngineError, EngineResult};
use crate::store::{OrderRepository, Store};
use thiserror::Error;
use tracing::{debug, info_span, warn};
use uuid::Uuid;

/// One settled fill against a resting order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fill {
    /// The resting order as stored after this fill
    pub counter_order: Order,
    pub trade: Trade,
    pub quantity: i64,
    /// Execution price, always the resting order's price
    pub price: i64,
}

/// Result of matching an incoming order against the resting book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub status: OrderStatus,
    pub total_traded: i64,
    pub fills: Vec<Fill>,
}

impl MatchOutcome {
    fn empty() -> Self {
        Self {
            status: OrderStatus::Active,
            total_traded: 0,
            fills: Vec::new(),
        }
    }

    /// Quantity of an order of `amount` still open after this outcome
    pub fn remaining(&self, amount: i64) -> i64 {
        amount - self.total_traded
    }
}

/// Matching stopped on an error after `progress` was already committed.
///
/// Fills in `progress` are durable; only the fill that hit `source` was
/// rolled back.
#[derive(Debug, Error)]
#[error("matching interrupted after trading {}: {source}", .progress.total_traded)]
pub struct MatchInterrupted {
    pub progress: MatchOutcome,
    #[source]
    pub source: EngineError,
}

/// Matches incoming orders against resting counter-orders in ascending id
/// order, at the resting price.
///
/// Each fill commits on its own: the trade, both transfers and the
/// counter-order update share one scope. A whole match is not atomic.
pub struct OrderMatcher<'s> {
    store: &'s Store,
    page_size: u32,
}

impl<'s> OrderMatcher<'s> {
    pub fn new(store: &'s Store, page_size: u32) -> Self {
        Self { store, page_size }
    }

    pub fn match_order(&self, request: &OrderRequest) -> Result<MatchOutcome, MatchInterrupted> {
        let match_id = Uuid::new_v4();
        let span = info_span!(
            "match_order",
            %match_id,
            side = %request.side,
            pair = %request.pair,
            price = request.price,
            amount = request.amount
        );
        let _enter = span.enter();

        let counter_side = request.side.opposite();
        let mut outcome = MatchOutcome::empty();
        let mut cursor: Option<OrderId> = None;

        'pages: loop {
            let page = self.store.read(|conn| {
                OrderRepository::new(conn).list_tradable_after(
                    request.pair,
                    request.price,
                    counter_side,
                    cursor,
                    self.page_size,
                )
            });
            let page = match page {
                Ok(page) => page,
                Err(source) => return Err(interrupt(outcome, source)),
            };

            if page.is_empty() {
                break;
            }
            debug!(count = page.len(), after = ?cursor, "Fetched counter-orders");

            for counter in page {
                cursor = Some(counter.id);

                let quantity = outcome.remaining(request.amount).min(counter.remaining_amount);
                match self.fill(request, &counter, quantity) {
                    Ok(fill) => {
                        outcome.total_traded += quantity;
                        outcome.fills.push(fill);
                    },
                    Err(source) => return Err(interrupt(outcome, source)),
                }

                if outcome.remaining(request.amount) == 0 {
                    outcome.status = OrderStatus::Completed;
                    break 'pages;
                }
            }
        }

        debug!(
            total_traded = outcome.total_traded,
            fills = outcome.fills.len(),
            status = %outcome.status,
            "Matching finished"
        );
        Ok(outcome)
    }

    /// Settle `quantity` against `counter` and record the counter-order's new
    /// remaining quantity in the same scope.
    fn fill(&self, request: &OrderRequest, counter: &Order, quantity: i64) -> EngineResult<Fill> {
        let legs = FillLegs::between(request, counter, quantity)?;

        let fill = self.store.run_atomic(|tx| {
            let settlement = SettlementExecutor::new(tx).settle(legs.base, legs.quote)?;

            let remaining = counter.remaining_amount - quantity;
            let counter_order = OrderRepository::new(tx).update(
                counter.id,
                counter.remaining_amount,
                remaining,
                counter.status_after_fill(remaining)?,
            )?;

            Ok(Fill {
                counter_order,
                trade: settlement.trade,
                quantity,
                price: counter.price,
            })
        })?;

        debug!(
            counter_order_id = %counter.id,
            trade_id = %fill.trade.id,
            quantity,
            price = counter.price,
            "Fill settled"
        );
        Ok(fill)
    }
}

fn interrupt(progress: MatchOutcome, source: EngineError) -> MatchInterrupted {
    warn!(
        total_traded = progress.total_traded,
        error = %source,
        "Matching interrupted"
    );
    MatchInterrupted { progress, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountId, Currency, Pair, Side};
    use crate::engine::Ledger;
    use crate::store::{AccountRepository, Journal};

    /// A maker who rests orders and a taker who matches against them, each
    /// holding one BTC and one USDT account.
    struct Book {
        store: Store,
        pair: Pair,
        maker_btc: AccountId,
        maker_usdt: AccountId,
        taker_btc: AccountId,
        taker_usdt: AccountId,
    }

    fn book(maker_funds: (i64, i64), taker_funds: (i64, i64)) -> Book {
        let store = Store::open_in_memory().unwrap();
        let ids = store
            .run_atomic(|tx| {
                let accounts = AccountRepository::new(tx);
                let ledger = Ledger::new(tx);
                let mut ids = Vec::new();
                for (owner, (btc, usdt)) in [("maker", maker_funds), ("taker", taker_funds)] {
                    let btc_account = accounts.create(owner, Currency::Btc)?.id;
                    let usdt_account = accounts.create(owner, Currency::Usdt)?.id;
                    if btc > 0 {
                        ledger.deposit(btc_account, btc)?;
                    }
                    if usdt > 0 {
                        ledger.deposit(usdt_account, usdt)?;
                    }
                    ids.extend([btc_account, usdt_account]);
                }
                Ok(ids)
            })
            .unwrap();

        Book {
            store,
            pair: Pair::new(Currency::Btc, Currency::Usdt).unwrap(),
            maker_btc: ids[0],
            maker_usdt: ids[1],
            taker_btc: ids[2],
            taker_usdt: ids[3],
        }
    }

    impl Book {
        fn rest(&self, side: Side, price: i64, amount: i64) -> Order {
            let (from, to) = match side {
                Side::Ask => (self.maker_btc, self.maker_usdt),
                Side::Bid => (self.maker_usdt, self.maker_btc),
            };
            self.store
                .run_atomic(|tx| {
                    OrderRepository::new(tx).create(side, self.pair, from, to, price, amount)
                })
                .unwrap()
        }

        fn taker_bid(&self, price: i64, amount: i64) -> OrderRequest {
            OrderRequest::bid(self.pair, price, amount, self.taker_usdt, self.taker_btc)
        }

        fn taker_ask(&self, price: i64, amount: i64) -> OrderRequest {
            OrderRequest::ask(self.pair, price, amount, self.taker_btc, self.taker_usdt)
        }

        fn order(&self, id: OrderId) -> Order {
            self.store
                .read(|conn| OrderRepository::new(conn).get(id))
                .unwrap()
        }

        fn balance(&self, id: AccountId) -> i64 {
            self.store
                .read(|conn| AccountRepository::new(conn).get(id))
                .unwrap()
                .balance
        }

        fn trade_count(&self) -> i64 {
            self.store
                .read(|conn| Journal::new(conn).trade_count())
                .unwrap()
        }
    }

    #[test]
    fn test_exact_fill() {
        let book = book((10, 0), (0, 1_000));
        let ask = book.rest(Side::Ask, 100, 10);

        let outcome = OrderMatcher::new(&book.store, 10)
            .match_order(&book.taker_bid(100, 10))
            .unwrap();

        assert_eq!(outcome.status, OrderStatus::Completed);
        assert_eq!(outcome.total_traded, 10);
        assert_eq!(outcome.fills.len(), 1);

        let ask = book.order(ask.id);
        assert_eq!(ask.remaining_amount, 0);
        assert_eq!(ask.status, OrderStatus::Completed);

        let trade = &outcome.fills[0].trade;
        assert_eq!(trade.first.amount, 10);
        assert_eq!(trade.second.amount, 1_000);
        assert_eq!(book.trade_count(), 1);

        assert_eq!(book.balance(book.taker_btc), 10);
        assert_eq!(book.balance(book.maker_usdt), 1_000);
    }

    #[test]
    fn test_partial_fill_across_two_asks() {
        let book = book((20, 0), (0, 1_500));
        let first = book.rest(Side::Ask, 100, 10);
        let second = book.rest(Side::Ask, 100, 10);

        let outcome = OrderMatcher::new(&book.store, 10)
            .match_order(&book.taker_bid(100, 15))
            .unwrap();

        assert_eq!(outcome.status, OrderStatus::Completed);
        assert_eq!(outcome.total_traded, 15);
        assert_eq!(outcome.remaining(15), 0);
        assert_eq!(book.trade_count(), 2);

        let first = book.order(first.id);
        assert_eq!((first.remaining_amount, first.status), (0, OrderStatus::Completed));
        let second = book.order(second.id);
        assert_eq!((second.remaining_amount, second.status), (5, OrderStatus::Active));
    }

    #[test]
    fn test_stops_as_soon_as_incoming_is_exhausted() {
        let book = book((30, 0), (0, 1_000));
        book.rest(Side::Ask, 100, 10);
        let untouched = book.rest(Side::Ask, 100, 10);

        let outcome = OrderMatcher::new(&book.store, 10)
            .match_order(&book.taker_bid(100, 10))
            .unwrap();

        assert_eq!(outcome.fills.len(), 1);
        assert_eq!(book.order(untouched.id).remaining_amount, 10);
    }

    #[test]
    fn test_no_counter_orders_leaves_incoming_active() {
        let book = book((0, 0), (0, 1_000));

        let outcome = OrderMatcher::new(&book.store, 10)
            .match_order(&book.taker_bid(100, 10))
            .unwrap();

        assert_eq!(outcome.status, OrderStatus::Active);
        assert_eq!(outcome.total_traded, 0);
        assert!(outcome.fills.is_empty());
    }

    #[test]
    fn test_fills_at_resting_price_and_respects_limit() {
        let book = book((10, 0), (0, 10_000));
        let cheap = book.rest(Side::Ask, 90, 5);
        let too_expensive = book.rest(Side::Ask, 130, 5);

        let outcome = OrderMatcher::new(&book.store, 10)
            .match_order(&book.taker_bid(120, 10))
            .unwrap();

        assert_eq!(outcome.total_traded, 5);
        assert_eq!(outcome.status, OrderStatus::Active);
        assert_eq!(outcome.fills[0].counter_order.id, cheap.id);
        assert_eq!(outcome.fills[0].price, 90);
        assert_eq!(outcome.fills[0].trade.second.amount, 450);

        assert_eq!(book.order(too_expensive.id).remaining_amount, 5);
        assert_eq!(book.balance(book.taker_usdt), 10_000 - 450);
    }

    #[test]
    fn test_ask_fills_bids_at_or_above_limit() {
        let book = book((0, 10_000), (10, 0));
        let low = book.rest(Side::Bid, 95, 4);
        let high = book.rest(Side::Bid, 110, 4);

        let outcome = OrderMatcher::new(&book.store, 10)
            .match_order(&book.taker_ask(100, 10))
            .unwrap();

        assert_eq!(outcome.total_traded, 4);
        assert_eq!(outcome.fills[0].counter_order.id, high.id);
        assert_eq!(outcome.fills[0].price, 110);
        assert_eq!(book.order(low.id).remaining_amount, 4);

        assert_eq!(book.balance(book.taker_usdt), 440);
        assert_eq!(book.balance(book.maker_btc), 4);
    }

    #[test]
    fn test_traverses_more_than_one_page() {
        let book = book((25, 0), (0, 2_500));
        let asks: Vec<Order> = (0..25).map(|_| book.rest(Side::Ask, 100, 1)).collect();

        let outcome = OrderMatcher::new(&book.store, 10)
            .match_order(&book.taker_bid(100, 25))
            .unwrap();

        assert_eq!(outcome.status, OrderStatus::Completed);
        assert_eq!(outcome.total_traded, 25);

        let filled: Vec<OrderId> = outcome.fills.iter().map(|f| f.counter_order.id).collect();
        let expected: Vec<OrderId> = asks.iter().map(|a| a.id).collect();
        assert_eq!(filled, expected);
    }

    #[test]
    fn test_interruption_keeps_earlier_fills() {
        // Taker can pay for the first ask but not the second
        let book = book((20, 0), (0, 1_500));
        let first = book.rest(Side::Ask, 100, 10);
        let second = book.rest(Side::Ask, 100, 10);

        let interrupted = OrderMatcher::new(&book.store, 10)
            .match_order(&book.taker_bid(100, 20))
            .unwrap_err();

        assert_eq!(interrupted.progress.total_traded, 10);
        assert_eq!(interrupted.progress.status, OrderStatus::Active);
        assert!(matches!(
            interrupted.source,
            EngineError::InsufficientFunds { required: 1_000, .. }
        ));

        assert_eq!(book.order(first.id).status, OrderStatus::Completed);
        assert_eq!(book.order(second.id).remaining_amount, 10);
        assert_eq!(book.trade_count(), 1);
        assert_eq!(book.balance(book.taker_btc), 10);
        assert_eq!(book.balance(book.taker_usdt), 500);
    }

    #[test]
    fn test_stale_counter_order_rolls_back_its_fill() {
        let book = book((10, 0), (0, 1_000));
        let ask = book.rest(Side::Ask, 100, 10);
        let matcher = OrderMatcher::new(&book.store, 10);

        // Another matcher consumed part of the ask after it was listed
        book.store
            .run_atomic(|tx| OrderRepository::new(tx).update(ask.id, 10, 6, OrderStatus::Active))
            .unwrap();

        let result = matcher.fill(&book.taker_bid(100, 10), &ask, 10);
        assert!(matches!(result, Err(EngineError::Conflict { actual: 6, .. })));

        assert_eq!(book.trade_count(), 0);
        assert_eq!(book.balance(book.maker_btc), 10);
        assert_eq!(book.balance(book.taker_usdt), 1_000);
    }
}
