// ============================================================================
// Event Handler Interface
// Defines the contract for handling order and settlement events
// ============================================================================

use crate::domain::{OrderId, OrderRequest, TradeId};
use chrono::{DateTime, Utc};
use crossbeam::channel::{self, Receiver, Sender};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Events emitted by the exchange after state has been committed
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OrderEvent {
    /// Order passed validation and account checks
    OrderAccepted {
        request: OrderRequest,
        timestamp: DateTime<Utc>,
    },

    /// One fill settled against a resting order
    OrderFilled {
        order_id: OrderId,
        counter_order_id: OrderId,
        trade_id: TradeId,
        quantity: i64,
        price: i64,
        timestamp: DateTime<Utc>,
    },

    /// Order fully filled
    OrderCompleted {
        order_id: OrderId,
        total_filled: i64,
        timestamp: DateTime<Utc>,
    },

    /// Order left active with an open remainder
    OrderRested {
        order_id: OrderId,
        price: i64,
        remaining: i64,
        timestamp: DateTime<Utc>,
    },

    /// Matching stopped on an error after some fills committed
    OrderInterrupted {
        order_id: OrderId,
        filled: i64,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Order cancelled
    OrderCancelled {
        order_id: OrderId,
        remaining: i64,
        timestamp: DateTime<Utc>,
    },
}

impl OrderEvent {
    /// Identifier of the order the event is about, once it has one
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            OrderEvent::OrderAccepted { .. } => None,
            OrderEvent::OrderFilled { order_id, .. }
            | OrderEvent::OrderCompleted { order_id, .. }
            | OrderEvent::OrderRested { order_id, .. }
            | OrderEvent::OrderInterrupted { order_id, .. }
            | OrderEvent::OrderCancelled { order_id, .. } => Some(*order_id),
        }
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Event handler trait for processing exchange events
/// Implementations can handle auditing, notifications, etc.
pub trait EventHandler: Send + Sync {
    /// Handle an order event
    fn on_event(&self, event: OrderEvent);

    /// Batch event handler
    fn on_events(&self, events: Vec<OrderEvent>) {
        for event in events {
            self.on_event(event);
        }
    }
}

/// No-op event handler for testing
pub struct NoOpEventHandler;

impl EventHandler for NoOpEventHandler {
    fn on_event(&self, _event: OrderEvent) {}
}

/// Logging event handler
pub struct LoggingEventHandler;

impl EventHandler for LoggingEventHandler {
    fn on_event(&self, event: OrderEvent) {
        tracing::info!(order_id = ?event.order_id(), "Exchange event: {:?}", event);
    }
}

/// Forwards events to a channel consumed on another thread.
pub struct ChannelEventHandler {
    sender: Sender<OrderEvent>,
}

impl ChannelEventHandler {
    /// Unbounded channel; the receiver side is returned to the caller
    pub fn new() -> (Self, Receiver<OrderEvent>) {
        let (sender, receiver) = channel::unbounded();
        (Self { sender }, receiver)
    }
}

impl EventHandler for ChannelEventHandler {
    fn on_event(&self, event: OrderEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("Event receiver dropped, discarding event");
        }
    }
}
