// ============================================================================
// Engine Configuration
// Storage location and matching parameters
// ============================================================================

use crate::error::{EngineError, EngineResult};
use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Counter-orders fetched per page when matching
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page a caller may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// How long a writer waits on a locked database before failing
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Store Configuration
// ============================================================================

/// Where and how the durable store is opened
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StoreConfig {
    /// Database file. `None` keeps everything in memory (tests, benches)
    pub path: Option<PathBuf>,

    /// Busy timeout applied to the SQLite connection
    pub busy_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

// ============================================================================
// Complete Engine Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineConfig {
    pub store: StoreConfig,

    /// Counter-orders examined per page while matching
    pub page_size: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl EngineConfig {
    /// Volatile configuration backed by an in-memory database
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Durable configuration backed by a database file
    pub fn durable(path: impl Into<PathBuf>) -> Self {
        Self::default().with_database_path(path)
    }

    /// Builder method: Set the database file
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store.path = Some(path.into());
        self
    }

    /// Builder method: Set the busy timeout
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.store.busy_timeout = timeout;
        self
    }

    /// Builder method: Set the matching page size
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(EngineError::Validation(format!(
                "page size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }

        if let Some(path) = &self.store.path {
            if path.as_os_str().is_empty() {
                return Err(EngineError::validation("database path cannot be empty"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.page_size, 10);
        assert!(config.store.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfig::durable("/var/lib/exchange/ledger.db")
            .with_page_size(25)
            .with_busy_timeout(Duration::from_millis(250));

        assert_eq!(config.page_size, 25);
        assert_eq!(config.store.busy_timeout, Duration::from_millis(250));
        assert_eq!(
            config.store.path,
            Some(PathBuf::from("/var/lib/exchange/ledger.db"))
        );
    }

    #[test]
    fn test_validation() {
        assert!(EngineConfig::in_memory().with_page_size(0).validate().is_err());
        assert!(EngineConfig::in_memory().with_page_size(101).validate().is_err());
        assert!(EngineConfig::durable("").validate().is_err());
    }
}
