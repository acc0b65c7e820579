//! Pool provider resolution.
//!
//! Pool implementations are pluggable: each is registered under a driver
//! identity string, and a holder resolves the identity named by its
//! configuration exactly once, when it lazily creates its pool.
//!
//! Resolution probes two scopes in order. The primary scope holds providers
//! registered for this manager; the fallback scope holds providers shared by
//! the embedding application. A miss in one scope continues to the next; a
//! hit binds immediately. A miss in both is fatal to the call that forced
//! initialization and is reported as a resolution error, not a pool error.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::DataSourceConfig;
use crate::error::{BoxError, PoolError, PoolResult};

/// A connection pool owned by a provider binding.
pub trait ManagedPool: Send + Sync + std::fmt::Debug {
    /// Configured capacity of the pool.
    fn max_size(&self) -> u32;

    /// Close the pool, releasing its connections. May block; only ever
    /// invoked on a blocking-capable context.
    fn close(&self) -> Result<(), BoxError>;
}

/// Factory for [`ManagedPool`]s, registered under a driver identity.
pub trait PoolProvider: Send + Sync + 'static {
    fn create_pool(&self, config: &DataSourceConfig) -> Result<Box<dyn ManagedPool>, BoxError>;
}

/// Provider lookup table with a primary and a fallback scope.
#[derive(Default)]
pub struct ProviderRegistry {
    primary: HashMap<String, Arc<dyn PoolProvider>>,
    fallback: HashMap<String, Arc<dyn PoolProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider in the primary scope. Replaces any previous
    /// registration for the same driver identity.
    pub fn register(&mut self, driver: impl Into<String>, provider: Arc<dyn PoolProvider>) {
        let driver = driver.into();
        debug!(driver = %driver, scope = "primary", "Registered pool provider");
        self.primary.insert(driver, provider);
    }

    /// Register a provider in the fallback scope, probed only when the
    /// primary scope has no entry for the driver.
    pub fn register_fallback(
        &mut self,
        driver: impl Into<String>,
        provider: Arc<dyn PoolProvider>,
    ) {
        let driver = driver.into();
        debug!(driver = %driver, scope = "fallback", "Registered pool provider");
        self.fallback.insert(driver, provider);
    }

    /// Resolve a driver identity, probing primary then fallback.
    pub fn resolve(&self, driver: &str) -> Option<Arc<dyn PoolProvider>> {
        if let Some(provider) = self.primary.get(driver) {
            debug!(driver = %driver, scope = "primary", "Resolved pool provider");
            return Some(provider.clone());
        }
        if let Some(provider) = self.fallback.get(driver) {
            debug!(driver = %driver, scope = "fallback", "Resolved pool provider");
            return Some(provider.clone());
        }
        None
    }

    /// Number of registered providers across both scopes.
    pub fn len(&self) -> usize {
        self.primary.len() + self.fallback.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.fallback.is_empty()
    }
}

/// The resolved pool of one holder: driver identity, the pool itself and its
/// reported capacity, fixed at creation.
#[derive(Debug)]
pub struct ProviderBinding {
    driver: String,
    pool: Box<dyn ManagedPool>,
    max_size: u32,
}

impl ProviderBinding {
    /// Resolve the configured driver and create the pool.
    ///
    /// Failures leave no partial state behind: either a complete binding is
    /// returned or the caller retries from scratch on the next call.
    pub fn resolve(
        registry: &ProviderRegistry,
        datasource: &str,
        config: &DataSourceConfig,
    ) -> PoolResult<Self> {
        let provider = registry
            .resolve(&config.provider)
            .ok_or_else(|| PoolError::provider_not_found(&config.provider))?;
        let pool = provider
            .create_pool(config)
            .map_err(|e| PoolError::pool_creation(datasource, e.to_string()))?;
        let max_size = pool.max_size();
        Ok(Self {
            driver: config.provider.clone(),
            pool,
            max_size,
        })
    }

    pub fn driver(&self) -> &str {
        &self.driver
    }

    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    /// Close the underlying pool, consuming the binding. May block.
    pub fn close_pool(self) -> Result<(), BoxError> {
        self.pool.close()
    }
}
