// ============================================================================
// Exchange
// Order submission, cancellation and lookup on behalf of a principal
// ============================================================================

use crate::domain::{
    Account, AccountId, Currency, EngineConfig, Order, OrderId, OrderRequest, OrderStatus,
    Principal,
};
use crate::engine::{Fill, MatchInterrupted, OrderMatcher};
use crate::error::{EngineError, EngineResult};
use crate::interfaces::{AccountLookup, EventHandler, OrderEvent};
use crate::store::{OrderRepository, Store};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// What a successful submission reports back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    /// The incoming order as persisted after matching
    pub order: Order,
    pub status: OrderStatus,
    pub filled: i64,
    pub fills: Vec<Fill>,
}

/// Entry point used by the transport layer.
///
/// Holds no order state of its own: every call reads from and writes to the
/// shared [`Store`]. Safe to share between threads.
pub struct Exchange {
    store: Arc<Store>,
    config: EngineConfig,
    accounts: Arc<dyn AccountLookup>,
    event_handler: Arc<dyn EventHandler>,
}

impl Exchange {
    pub fn new(
        store: Arc<Store>,
        config: EngineConfig,
        accounts: Arc<dyn AccountLookup>,
        event_handler: Arc<dyn EventHandler>,
    ) -> Self {
        Self {
            store,
            config,
            accounts,
            event_handler,
        }
    }

    /// Match a limit order against the resting book and persist what is left
    /// of it.
    ///
    /// Fills commit one by one. If matching stops on an error after at least
    /// one fill, the order is still persisted with its partial remainder and
    /// the call fails with [`EngineError::Interrupted`] carrying the filled
    /// quantity. If it stops before any fill, nothing is persisted. A failure
    /// to persist the order after fills is reported as
    /// [`EngineError::PersistFailed`], again with the filled quantity.
    pub fn submit_order(
        &self,
        principal: &Principal,
        request: OrderRequest,
    ) -> EngineResult<SubmitReceipt> {
        request.validate()?;
        self.check_account(
            principal,
            request.from_account,
            request.side.source_currency(&request.pair),
        )?;
        self.check_account(
            principal,
            request.to_account,
            request.side.destination_currency(&request.pair),
        )?;

        self.event_handler.on_event(OrderEvent::OrderAccepted {
            request: request.clone(),
            timestamp: Utc::now(),
        });

        let matcher = OrderMatcher::new(&self.store, self.config.page_size);
        match matcher.match_order(&request) {
            Ok(outcome) => {
                let order = self.persist_incoming(&request, outcome.total_traded)?;
                let mut events = fill_events(order.id, &outcome.fills);

                if order.status == OrderStatus::Completed {
                    events.push(OrderEvent::OrderCompleted {
                        order_id: order.id,
                        total_filled: outcome.total_traded,
                        timestamp: Utc::now(),
                    });
                } else {
                    events.push(OrderEvent::OrderRested {
                        order_id: order.id,
                        price: order.price,
                        remaining: order.remaining_amount,
                        timestamp: Utc::now(),
                    });
                }
                self.event_handler.on_events(events);

                info!(
                    order_id = %order.id,
                    principal = %principal,
                    side = %order.side,
                    pair = %order.pair,
                    filled = outcome.total_traded,
                    status = %order.status,
                    "Order submitted"
                );

                Ok(SubmitReceipt {
                    status: order.status,
                    filled: outcome.total_traded,
                    fills: outcome.fills,
                    order,
                })
            },
            Err(MatchInterrupted { progress, source }) => {
                if progress.total_traded == 0 {
                    warn!(principal = %principal, error = %source, "Order rejected during matching");
                    return Err(source);
                }

                let order = self.persist_incoming(&request, progress.total_traded)?;
                let mut events = fill_events(order.id, &progress.fills);
                events.push(OrderEvent::OrderInterrupted {
                    order_id: order.id,
                    filled: progress.total_traded,
                    reason: source.to_string(),
                    timestamp: Utc::now(),
                });
                self.event_handler.on_events(events);

                warn!(
                    order_id = %order.id,
                    filled = progress.total_traded,
                    remaining = order.remaining_amount,
                    error = %source,
                    "Order partially filled before matching stopped"
                );

                Err(EngineError::Interrupted {
                    order_id: order.id,
                    filled: progress.total_traded,
                    source: Box::new(source),
                })
            },
        }
    }

    /// Cancel an active order owned by `principal`. The remaining quantity
    /// is left untouched.
    pub fn cancel_order(&self, principal: &Principal, id: OrderId) -> EngineResult<Order> {
        let order = self.get_order(principal, id)?;

        let canceled = self
            .store
            .run_atomic(|tx| OrderRepository::new(tx).cancel(order.id))?;

        self.event_handler.on_event(OrderEvent::OrderCancelled {
            order_id: canceled.id,
            remaining: canceled.remaining_amount,
            timestamp: Utc::now(),
        });
        info!(order_id = %canceled.id, principal = %principal, "Order cancelled");

        Ok(canceled)
    }

    /// Look up an order whose source account belongs to `principal`.
    pub fn get_order(&self, principal: &Principal, id: OrderId) -> EngineResult<Order> {
        let order = self
            .store
            .read(|conn| OrderRepository::new(conn).get(id))?;

        let account = self.accounts.get_account(order.from_account)?;
        authorize(principal, &account)?;

        Ok(order)
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========================================================================
    // Private methods
    // ========================================================================

    fn check_account(
        &self,
        principal: &Principal,
        id: AccountId,
        expected: Currency,
    ) -> EngineResult<()> {
        let account = self.accounts.get_account(id)?;
        if account.currency != expected {
            return Err(EngineError::CurrencyMismatch {
                account_id: id,
                expected,
                actual: account.currency,
            });
        }
        authorize(principal, &account)
    }

    /// Store the incoming order with `remaining = amount - filled`.
    ///
    /// Fills already committed stay committed if this fails, so the error
    /// carries `filled` whenever it is non-zero.
    fn persist_incoming(&self, request: &OrderRequest, filled: i64) -> EngineResult<Order> {
        self.store.run_atomic(|tx| {
            let orders = OrderRepository::new(tx);
            let order = orders.create(
                request.side,
                request.pair,
                request.from_account,
                request.to_account,
                request.price,
                request.amount,
            )?;

            if filled == 0 {
                return Ok(order);
            }
            let remaining = request.amount - filled;
            orders.update(
                order.id,
                order.remaining_amount,
                remaining,
                order.status_after_fill(remaining)?,
            )
        })
        .map_err(|source| {
            if filled == 0 {
                return source;
            }
            warn!(filled, error = %source, "Filled order could not be persisted");
            EngineError::PersistFailed {
                filled,
                source: Box::new(source),
            }
        })
    }
}

fn authorize(principal: &Principal, account: &Account) -> EngineResult<()> {
    if principal.owns(account) {
        Ok(())
    } else {
        Err(EngineError::Unauthorized {
            account_id: account.id,
            principal: principal.username().to_string(),
        })
    }
}

fn fill_events(order_id: OrderId, fills: &[Fill]) -> Vec<OrderEvent> {
    fills
        .iter()
        .map(|fill| OrderEvent::OrderFilled {
            order_id,
            counter_order_id: fill.counter_order.id,
            trade_id: fill.trade.id,
            quantity: fill.quantity,
            price: fill.price,
            timestamp: Utc::now(),
        })
        .collect()
}
