// ============================================================================
// Order Domain Model
// ============================================================================

use super::pair::{Currency, Pair, ParseError};
use super::{AccountId, OrderId};
use crate::error::{EngineError, EngineResult};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Value Objects
// ============================================================================

/// Bids buy the base currency with the quote currency, asks sell it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Bid => "bid",
            Side::Ask => "ask",
        }
    }

    /// Whether an incoming order on this side with limit `limit` can trade
    /// against a resting counter-order priced at `resting_price`.
    pub fn crosses(&self, limit: i64, resting_price: i64) -> bool {
        match self {
            Side::Bid => resting_price <= limit,
            Side::Ask => resting_price >= limit,
        }
    }

    /// Currency debited from the order's source account.
    pub fn source_currency(&self, pair: &Pair) -> Currency {
        match self {
            Side::Bid => pair.quote(),
            Side::Ask => pair.base(),
        }
    }

    /// Currency credited to the order's destination account.
    pub fn destination_currency(&self, pair: &Pair) -> Currency {
        match self {
            Side::Bid => pair.base(),
            Side::Ask => pair.quote(),
        }
    }

    fn base_account(&self, from: AccountId, to: AccountId) -> AccountId {
        match self {
            Side::Bid => to,
            Side::Ask => from,
        }
    }

    fn quote_account(&self, from: AccountId, to: AccountId) -> AccountId {
        match self {
            Side::Bid => from,
            Side::Ask => to,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bid" => Ok(Side::Bid),
            "ask" => Ok(Side::Ask),
            other => Err(ParseError::UnknownSide(other.to_string())),
        }
    }
}

// ============================================================================
// Order State Machine
// ============================================================================

pub mod state {
    use super::ParseError;
    use std::fmt;
    use std::str::FromStr;

    #[cfg(feature = "serde")]
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub enum OrderStatus {
        Active,
        Completed,
        Canceled,
    }

    impl OrderStatus {
        pub fn as_str(&self) -> &'static str {
            match self {
                OrderStatus::Active => "active",
                OrderStatus::Completed => "completed",
                OrderStatus::Canceled => "canceled",
            }
        }

    }

    impl fmt::Display for OrderStatus {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    impl FromStr for OrderStatus {
        type Err = ParseError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
                "active" => Ok(OrderStatus::Active),
                "completed" => Ok(OrderStatus::Completed),
                "canceled" => Ok(OrderStatus::Canceled),
                other => Err(ParseError::UnknownStatus(other.to_string())),
            }
        }
    }

    /// Valid state transitions for the order state machine
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub enum OrderTransition {
        PartialFill,
        Fill,
        Cancel,
    }

    impl OrderTransition {
        /// The fill transition that leaves `remaining` open.
        pub fn for_fill(remaining: i64) -> OrderTransition {
            if remaining == 0 {
                OrderTransition::Fill
            } else {
                OrderTransition::PartialFill
            }
        }
    }

    impl OrderStatus {
        /// Apply a transition, or `None` if it is not allowed from this status.
        pub fn transition(&self, transition: OrderTransition) -> Option<OrderStatus> {
            match (self, transition) {
                (OrderStatus::Active, OrderTransition::PartialFill) => Some(OrderStatus::Active),
                (OrderStatus::Active, OrderTransition::Fill) => Some(OrderStatus::Completed),
                (OrderStatus::Active, OrderTransition::Cancel) => Some(OrderStatus::Canceled),
                _ => None,
            }
        }
    }
}

pub use state::{OrderStatus, OrderTransition};

// ============================================================================
// Order Request
// ============================================================================

/// A limit order as submitted, before it has an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderRequest {
    pub side: Side,
    pub pair: Pair,
    /// Limit price in quote minor units per base unit
    pub price: i64,
    /// Quantity in base minor units
    pub amount: i64,
    /// Debited account: quote currency for bids, base currency for asks
    pub from_account: AccountId,
    /// Credited account: base currency for bids, quote currency for asks
    pub to_account: AccountId,
}

impl OrderRequest {
    pub fn bid(pair: Pair, price: i64, amount: i64, from: AccountId, to: AccountId) -> Self {
        Self {
            side: Side::Bid,
            pair,
            price,
            amount,
            from_account: from,
            to_account: to,
        }
    }

    pub fn ask(pair: Pair, price: i64, amount: i64, from: AccountId, to: AccountId) -> Self {
        Self {
            side: Side::Ask,
            pair,
            price,
            amount,
            from_account: from,
            to_account: to,
        }
    }

    pub fn base_account(&self) -> AccountId {
        self.side.base_account(self.from_account, self.to_account)
    }

    pub fn quote_account(&self) -> AccountId {
        self.side.quote_account(self.from_account, self.to_account)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.price <= 0 {
            return Err(EngineError::validation("price must be positive"));
        }
        if self.amount <= 0 {
            return Err(EngineError::validation("amount must be positive"));
        }
        if self.from_account == self.to_account {
            return Err(EngineError::validation(
                "source and destination accounts must differ",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Order Entity
// ============================================================================

/// A persisted order. Rows are never deleted; matching and cancellation are
/// the only mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub pair: Pair,
    pub from_account: AccountId,
    pub to_account: AccountId,
    pub price: i64,
    pub initial_amount: i64,
    pub remaining_amount: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Account holding (sell side) or receiving (buy side) the base currency.
    pub fn base_account(&self) -> AccountId {
        self.side.base_account(self.from_account, self.to_account)
    }

    /// Account paying (buy side) or receiving (sell side) the quote currency.
    pub fn quote_account(&self) -> AccountId {
        self.side.quote_account(self.from_account, self.to_account)
    }

    /// Status after a fill that leaves `remaining` open, looked up in the
    /// transition table from the current status.
    pub fn status_after_fill(&self, remaining: i64) -> EngineResult<OrderStatus> {
        self.apply(OrderTransition::for_fill(remaining))
    }

    pub fn apply(&self, transition: OrderTransition) -> EngineResult<OrderStatus> {
        self.status
            .transition(transition)
            .ok_or(EngineError::InvalidTransition {
                order_id: self.id,
                from: self.status,
                transition,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Currency;

    fn btc_usdt() -> Pair {
        Pair::new(Currency::Btc, Currency::Usdt).unwrap()
    }

    #[test]
    fn test_side_crossing_rule() {
        // A bid takes asks at or below its limit
        assert!(Side::Bid.crosses(100, 100));
        assert!(Side::Bid.crosses(100, 90));
        assert!(!Side::Bid.crosses(100, 101));

        // An ask takes bids at or above its limit
        assert!(Side::Ask.crosses(100, 100));
        assert!(Side::Ask.crosses(100, 110));
        assert!(!Side::Ask.crosses(100, 99));
    }

    #[test]
    fn test_side_currencies() {
        let pair = btc_usdt();
        assert_eq!(Side::Bid.source_currency(&pair), Currency::Usdt);
        assert_eq!(Side::Bid.destination_currency(&pair), Currency::Btc);
        assert_eq!(Side::Ask.source_currency(&pair), Currency::Btc);
        assert_eq!(Side::Ask.destination_currency(&pair), Currency::Usdt);
        assert_eq!(Side::Ask.opposite(), Side::Bid);
    }

    #[test]
    fn test_status_transitions() {
        assert_eq!(
            OrderStatus::Active.transition(OrderTransition::Fill),
            Some(OrderStatus::Completed)
        );
        assert_eq!(
            OrderStatus::Active.transition(OrderTransition::Cancel),
            Some(OrderStatus::Canceled)
        );
        assert_eq!(OrderStatus::Completed.transition(OrderTransition::Cancel), None);
        assert_eq!(OrderStatus::Canceled.transition(OrderTransition::Cancel), None);
        assert_eq!(OrderStatus::Canceled.transition(OrderTransition::PartialFill), None);
        assert_eq!(OrderTransition::for_fill(0), OrderTransition::Fill);
        assert_eq!(OrderTransition::for_fill(3), OrderTransition::PartialFill);
    }

    #[test]
    fn test_status_text_round_trip() {
        for status in [OrderStatus::Active, OrderStatus::Completed, OrderStatus::Canceled] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("activate".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_request_validation() {
        let pair = btc_usdt();
        let ok = OrderRequest::bid(pair, 100, 10, AccountId::new(1), AccountId::new(2));
        assert!(ok.validate().is_ok());

        let zero_price = OrderRequest { price: 0, ..ok.clone() };
        assert!(matches!(zero_price.validate(), Err(EngineError::Validation(_))));

        let negative_amount = OrderRequest { amount: -1, ..ok.clone() };
        assert!(negative_amount.validate().is_err());

        let same_account = OrderRequest {
            to_account: AccountId::new(1),
            ..ok
        };
        assert!(same_account.validate().is_err());
    }

    #[test]
    fn test_order_account_roles() {
        let order = Order {
            id: OrderId::new(1),
            side: Side::Ask,
            pair: btc_usdt(),
            from_account: AccountId::new(10),
            to_account: AccountId::new(11),
            price: 100,
            initial_amount: 10,
            remaining_amount: 4,
            status: OrderStatus::Active,
            created_at: Utc::now(),
        };

        assert_eq!(order.base_account(), AccountId::new(10));
        assert_eq!(order.quote_account(), AccountId::new(11));

        let bid = OrderRequest::bid(btc_usdt(), 100, 1, AccountId::new(20), AccountId::new(21));
        assert_eq!(bid.base_account(), AccountId::new(21));
        assert_eq!(bid.quote_account(), AccountId::new(20));
    }

    #[test]
    fn test_order_applies_transitions_from_its_status() {
        let mut order = Order {
            id: OrderId::new(5),
            side: Side::Bid,
            pair: btc_usdt(),
            from_account: AccountId::new(1),
            to_account: AccountId::new(2),
            price: 100,
            initial_amount: 10,
            remaining_amount: 10,
            status: OrderStatus::Active,
            created_at: Utc::now(),
        };
        assert_eq!(order.status_after_fill(4).unwrap(), OrderStatus::Active);
        assert_eq!(order.status_after_fill(0).unwrap(), OrderStatus::Completed);

        order.status = OrderStatus::Completed;
        assert!(matches!(
            order.status_after_fill(0),
            Err(EngineError::InvalidTransition {
                from: OrderStatus::Completed,
                transition: OrderTransition::Fill,
                ..
            })
        ));
        assert!(order.apply(OrderTransition::Cancel).is_err());
    }
}
