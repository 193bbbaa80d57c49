// ============================================================================
// Engine Errors
// Error taxonomy shared by the store, the ledger and the matcher
// ============================================================================

use crate::domain::pair::ParseError;
use crate::domain::{
    AccountId, Currency, OrderId, OrderStatus, OrderTransition, TradeId, TransferId,
};
use crate::numeric::NumericError;
use thiserror::Error;

/// Top-level error returned by every fallible operation in the crate.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed request field (price, amount, page, ...)
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unsupported trading pair: {0}")]
    InvalidPair(String),

    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("trade not found: {0}")]
    TradeNotFound(TradeId),

    #[error("transfer not found: {0}")]
    TransferNotFound(TransferId),

    #[error("account {account_id} does not belong to {principal}")]
    Unauthorized {
        account_id: AccountId,
        principal: String,
    },

    #[error("account {account_id} holds {actual}, expected {expected}")]
    CurrencyMismatch {
        account_id: AccountId,
        expected: Currency,
        actual: Currency,
    },

    /// Lost an optimistic-update race on an order
    #[error("order {order_id} changed concurrently: expected remaining {expected}, found {actual} ({status})")]
    Conflict {
        order_id: OrderId,
        expected: i64,
        actual: i64,
        status: OrderStatus,
    },

    #[error("cannot apply {transition:?} to order {order_id} in status {from}")]
    InvalidTransition {
        order_id: OrderId,
        from: OrderStatus,
        transition: OrderTransition,
    },

    #[error("insufficient funds in account {account_id}: balance {balance}, required {required}")]
    InsufficientFunds {
        account_id: AccountId,
        balance: i64,
        required: i64,
    },

    #[error("arithmetic error: {0}")]
    Numeric(#[from] NumericError),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Matching stopped after some fills were already committed
    #[error("order {order_id} interrupted after filling {filled}: {source}")]
    Interrupted {
        order_id: OrderId,
        filled: i64,
        source: Box<EngineError>,
    },

    /// Fills were committed but the incoming order itself could not be stored
    #[error("order filled {filled} but could not be persisted: {source}")]
    PersistFailed {
        filled: i64,
        source: Box<EngineError>,
    },
}

/// Coarse classification used by the transport layer to pick a response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    InvalidPair,
    NotFound,
    AccountNotFound,
    Unauthorized,
    CurrencyMismatch,
    Conflict,
    InsufficientFunds,
    Internal,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Validation(_) | EngineError::Numeric(_) => ErrorKind::Validation,
            EngineError::InvalidPair(_) => ErrorKind::InvalidPair,
            EngineError::OrderNotFound(_)
            | EngineError::TradeNotFound(_)
            | EngineError::TransferNotFound(_) => ErrorKind::NotFound,
            EngineError::AccountNotFound(_) => ErrorKind::AccountNotFound,
            EngineError::Unauthorized { .. } => ErrorKind::Unauthorized,
            EngineError::CurrencyMismatch { .. } => ErrorKind::CurrencyMismatch,
            EngineError::Conflict { .. } | EngineError::InvalidTransition { .. } => {
                ErrorKind::Conflict
            },
            EngineError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            EngineError::Storage(_) => ErrorKind::Internal,
            EngineError::Interrupted { source, .. } | EngineError::PersistFailed { source, .. } => {
                source.kind()
            },
        }
    }

    /// True when re-listing and re-submitting may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Conflict
            && !matches!(self, EngineError::InvalidTransition { .. })
    }

    /// Quantity already settled for the incoming order when this error was
    /// raised, if any.
    pub fn filled(&self) -> Option<i64> {
        match self {
            EngineError::Interrupted { filled, .. } | EngineError::PersistFailed { filled, .. } => {
                Some(*filled)
            },
            _ => None,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }
}

impl From<ParseError> for EngineError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::UnknownCurrency(value) | ParseError::UnsupportedPair(value) => {
                EngineError::InvalidPair(value)
            },
            other => EngineError::Validation(other.to_string()),
        }
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
