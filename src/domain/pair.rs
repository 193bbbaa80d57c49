// ============================================================================
// Currencies and Trading Pairs
// ============================================================================

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Failure to parse a domain value from its textual form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unsupported currency: {0}")]
    UnknownCurrency(String),

    #[error("unsupported trading pair: {0}")]
    UnsupportedPair(String),

    #[error("unknown order side: {0}")]
    UnknownSide(String),

    #[error("unknown order status: {0}")]
    UnknownStatus(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Currency {
    Brl,
    Cad,
    Eur,
    Jpy,
    Usd,
    Btc,
    Eth,
    Matic,
    Sol,
    Usdt,
}

impl Currency {
    pub const ALL: [Currency; 10] = [
        Currency::Brl,
        Currency::Cad,
        Currency::Eur,
        Currency::Jpy,
        Currency::Usd,
        Currency::Btc,
        Currency::Eth,
        Currency::Matic,
        Currency::Sol,
        Currency::Usdt,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Brl => "BRL",
            Currency::Cad => "CAD",
            Currency::Eur => "EUR",
            Currency::Jpy => "JPY",
            Currency::Usd => "USD",
            Currency::Btc => "BTC",
            Currency::Eth => "ETH",
            Currency::Matic => "MATIC",
            Currency::Sol => "SOL",
            Currency::Usdt => "USDT",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .iter()
            .copied()
            .find(|currency| currency.code() == s)
            .ok_or_else(|| ParseError::UnknownCurrency(s.to_string()))
    }
}

/// An ordered base/quote currency pair, written `BASE/QUOTE`.
///
/// Quantities are counted in the base currency, prices in quote units per
/// base unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pair {
    base: Currency,
    quote: Currency,
}

/// Pairs the exchange lists.
const SUPPORTED_PAIRS: [(Currency, Currency); 14] = [
    (Currency::Usdt, Currency::Brl),
    (Currency::Usdt, Currency::Cad),
    (Currency::Usdt, Currency::Eur),
    (Currency::Usdt, Currency::Jpy),
    (Currency::Usdt, Currency::Usd),
    (Currency::Btc, Currency::Usdt),
    (Currency::Eth, Currency::Usdt),
    (Currency::Matic, Currency::Usdt),
    (Currency::Sol, Currency::Usdt),
    (Currency::Eth, Currency::Btc),
    (Currency::Matic, Currency::Btc),
    (Currency::Sol, Currency::Btc),
    (Currency::Matic, Currency::Eth),
    (Currency::Sol, Currency::Eth),
];

impl Pair {
    /// Build a listed pair.
    pub fn new(base: Currency, quote: Currency) -> Result<Self, ParseError> {
        if SUPPORTED_PAIRS.contains(&(base, quote)) {
            Ok(Self { base, quote })
        } else {
            Err(ParseError::UnsupportedPair(format!("{}/{}", base, quote)))
        }
    }

    pub fn base(&self) -> Currency {
        self.base
    }

    pub fn quote(&self) -> Currency {
        self.quote
    }

    pub fn supported() -> impl Iterator<Item = Pair> {
        SUPPORTED_PAIRS
            .iter()
            .map(|&(base, quote)| Pair { base, quote })
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl FromStr for Pair {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unsupported = || ParseError::UnsupportedPair(s.to_string());
        let (base, quote) = s.split_once('/').ok_or_else(unsupported)?;
        let base = base.parse::<Currency>().map_err(|_| unsupported())?;
        let quote = quote.parse::<Currency>().map_err(|_| unsupported())?;
        Pair::new(base, quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_supported_pair() {
        let pair: Pair = "BTC/USDT".parse().unwrap();
        assert_eq!(pair.base(), Currency::Btc);
        assert_eq!(pair.quote(), Currency::Usdt);
        assert_eq!(pair.to_string(), "BTC/USDT");
    }

    #[test]
    fn test_reject_unlisted_pairs() {
        // Inverted and unknown pairs are not listed
        assert!(matches!(
            "USDT/BTC".parse::<Pair>(),
            Err(ParseError::UnsupportedPair(_))
        ));
        assert!("DOGE/USDT".parse::<Pair>().is_err());
        assert!("BTCUSDT".parse::<Pair>().is_err());
        assert!(Pair::new(Currency::Usd, Currency::Eur).is_err());
    }

    #[test]
    fn test_every_supported_pair_round_trips_through_text() {
        for pair in Pair::supported() {
            assert_eq!(pair.to_string().parse::<Pair>().unwrap(), pair);
        }
        assert_eq!(Pair::supported().count(), 14);
    }
}
