// ============================================================================
// Trade Domain Model
// ============================================================================

use crate::numeric::{checked_notional, NumericResult};
use chrono::{DateTime, Utc};

use super::{AccountId, Order, OrderRequest, Side, TradeId, Transfer};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One directional fund movement in a single currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Leg {
    pub from_account: AccountId,
    pub to_account: AccountId,
    pub amount: i64,
}

impl Leg {
    pub fn new(from_account: AccountId, to_account: AccountId, amount: i64) -> Self {
        Self {
            from_account,
            to_account,
            amount,
        }
    }
}

/// The two opposite-currency legs of one fill.
///
/// `base` moves `quantity` of the base currency from seller to buyer, `quote`
/// moves `resting price * quantity` of the quote currency from buyer to
/// seller. The incoming order's own limit never sets the fill price.
///
/// # Example
/// ```text
/// Resting ask: 10 BTC @ 100, from=seller.btc, to=seller.usdt
/// Incoming bid: 4 BTC @ 120, from=buyer.usdt, to=buyer.btc
/// base  leg: seller.btc  -> buyer.btc    4
/// quote leg: buyer.usdt  -> seller.usdt  400
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FillLegs {
    pub base: Leg,
    pub quote: Leg,
}

impl FillLegs {
    pub fn between(incoming: &OrderRequest, resting: &Order, quantity: i64) -> NumericResult<Self> {
        let notional = checked_notional(resting.price, quantity)?;

        let incoming_accounts = (incoming.base_account(), incoming.quote_account());
        let resting_accounts = (resting.base_account(), resting.quote_account());
        let ((seller_base, seller_quote), (buyer_base, buyer_quote)) = match incoming.side {
            Side::Bid => (resting_accounts, incoming_accounts),
            Side::Ask => (incoming_accounts, resting_accounts),
        };

        Ok(Self {
            base: Leg::new(seller_base, buyer_base, quantity),
            quote: Leg::new(buyer_quote, seller_quote, notional),
        })
    }
}

/// Record grouping the two transfers of one matched fill.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Trade {
    pub id: TradeId,
    pub first: Leg,
    pub second: Leg,
    pub created_at: DateTime<Utc>,
}

/// A committed trade together with the transfers that implement it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Settlement {
    pub trade: Trade,
    pub first_transfer: Transfer,
    pub second_transfer: Transfer,
}
