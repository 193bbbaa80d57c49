// ============================================================================
// Exchange Factory
// Creates exchanges with proper configuration
// ============================================================================

use crate::domain::EngineConfig;
use crate::engine::Exchange;
use crate::error::EngineResult;
use crate::interfaces::{AccountLookup, EventHandler, NoOpEventHandler};
use crate::store::Store;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Factory Functions
// ============================================================================

/// Creates an exchange from configuration
///
/// Opens the store described by `config.store`; accounts are looked up in
/// that same store.
///
/// # Example
/// ```
/// use exchange_settlement::prelude::*;
/// use std::sync::Arc;
///
/// let exchange = create_from_config(EngineConfig::in_memory(), Arc::new(NoOpEventHandler)).unwrap();
/// assert_eq!(exchange.config().page_size, 10);
/// ```
pub fn create_from_config(
    config: EngineConfig,
    event_handler: Arc<dyn EventHandler>,
) -> EngineResult<Exchange> {
    config.validate()?;

    let store = Arc::new(Store::open(&config.store)?);
    let accounts: Arc<dyn AccountLookup> = store.clone();

    Ok(Exchange::new(store, config, accounts, event_handler))
}

// ============================================================================
// Builder Pattern for Advanced Configuration
// ============================================================================

/// Builder for creating exchanges with fluent API
///
/// # Example
/// ```
/// use exchange_settlement::prelude::*;
/// use std::sync::Arc;
///
/// let exchange = ExchangeBuilder::new()
///     .in_memory()
///     .with_page_size(25)
///     .with_event_handler(Arc::new(LoggingEventHandler))
///     .build()
///     .unwrap();
/// assert_eq!(exchange.config().page_size, 25);
/// ```
pub struct ExchangeBuilder {
    config: EngineConfig,
    store: Option<Arc<Store>>,
    accounts: Option<Arc<dyn AccountLookup>>,
    event_handler: Arc<dyn EventHandler>,
}

impl ExchangeBuilder {
    pub fn new() -> Self {
        Self::from_config(EngineConfig::default())
    }

    pub fn from_config(config: EngineConfig) -> Self {
        Self {
            config,
            store: None,
            accounts: None,
            event_handler: Arc::new(NoOpEventHandler),
        }
    }

    // ========================================================================
    // Storage Configuration
    // ========================================================================

    /// Keep everything in memory (default)
    pub fn in_memory(mut self) -> Self {
        self.config.store.path = None;
        self
    }

    /// Persist to a database file
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config = self.config.with_database_path(path);
        self
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_busy_timeout(timeout);
        self
    }

    /// Share an already open store instead of opening one from configuration
    pub fn with_store(mut self, store: Arc<Store>) -> Self {
        self.store = Some(store);
        self
    }

    // ========================================================================
    // Matching and Collaborators
    // ========================================================================

    /// Set the number of counter-orders fetched per page while matching
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.config = self.config.with_page_size(page_size);
        self
    }

    /// Resolve accounts through an external service instead of the store
    pub fn with_account_lookup(mut self, accounts: Arc<dyn AccountLookup>) -> Self {
        self.accounts = Some(accounts);
        self
    }

    pub fn with_event_handler(mut self, event_handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = event_handler;
        self
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build the exchange
    pub fn build(self) -> EngineResult<Exchange> {
        self.config.validate()?;

        let store = match self.store {
            Some(store) => store,
            None => Arc::new(Store::open(&self.config.store)?),
        };
        let accounts: Arc<dyn AccountLookup> = match self.accounts {
            Some(accounts) => accounts,
            None => store.clone(),
        };

        Ok(Exchange::new(store, self.config, accounts, self.event_handler))
    }

    /// Get the configuration without building (for inspection)
    pub fn get_config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Default for ExchangeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
