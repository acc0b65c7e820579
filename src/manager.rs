//! Manager front door.
//!
//! A [`PoolManager`] owns the datasource registry together with the injected
//! collaborators (connector, pool providers, metrics). It is cheap to clone;
//! clones share one registry, so clients created through any clone can share
//! holders.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::client::PoolClient;
use crate::config::DataSourceConfig;
use crate::connector::Connector;
use crate::error::{PoolError, PoolResult};
use crate::holder::ConnectionHolder;
use crate::metrics::MetricsProvider;
use crate::provider::{PoolProvider, ProviderRegistry};
use crate::registry::SharedRegistry;

/// Datasource name used by [`PoolManager::create_shared`] when the caller
/// does not pick one.
pub const DEFAULT_DS: &str = "DEFAULT_DS";

pub(crate) struct ManagerShared {
    pub(crate) registry: SharedRegistry,
    pub(crate) providers: ProviderRegistry,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) metrics: Option<Arc<dyn MetricsProvider>>,
}

/// Creates client handles and tracks the shared datasources behind them.
#[derive(Clone)]
pub struct PoolManager {
    shared: Arc<ManagerShared>,
}

impl PoolManager {
    pub fn builder() -> PoolManagerBuilder {
        PoolManagerBuilder::new()
    }

    /// Create a client attached to a shared datasource.
    ///
    /// Handles created with the same name share one holder and therefore
    /// one pool; `None` selects [`DEFAULT_DS`]. Creation never does I/O;
    /// pool and worker come into existence on the first connection request.
    pub fn create_shared(&self, config: DataSourceConfig, datasource: Option<&str>) -> PoolClient {
        self.create(datasource.unwrap_or(DEFAULT_DS), config)
    }

    /// Create a client with a private datasource under a generated name.
    pub fn create_non_shared(&self, config: DataSourceConfig) -> PoolClient {
        let name = format!("ds_{}", Uuid::new_v4().simple());
        self.create(&name, config)
    }

    fn create(&self, name: &str, config: DataSourceConfig) -> PoolClient {
        let holder = self
            .shared
            .registry
            .acquire(name, || Arc::new(ConnectionHolder::new(name)));
        debug!(datasource = %name, config = %config, "Created client handle");
        PoolClient::new(self.shared.clone(), holder, config)
    }

    /// Number of datasources currently alive in the registry.
    pub fn datasource_count(&self) -> usize {
        self.shared.registry.len()
    }
}

impl std::fmt::Debug for PoolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolManager").finish_non_exhaustive()
    }
}

/// Builder for [`PoolManager`].
pub struct PoolManagerBuilder {
    providers: ProviderRegistry,
    connector: Option<Arc<dyn Connector>>,
    metrics: Option<Arc<dyn MetricsProvider>>,
}

impl PoolManagerBuilder {
    fn new() -> Self {
        Self {
            providers: ProviderRegistry::new(),
            connector: None,
            metrics: None,
        }
    }

    /// Set the connector all datasources acquire their connections through.
    pub fn connector(mut self, connector: impl Connector) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Register a pool provider under a driver identity (primary scope).
    pub fn provider(mut self, driver: impl Into<String>, provider: impl PoolProvider) -> Self {
        self.providers.register(driver, Arc::new(provider));
        self
    }

    /// Register a pool provider in the fallback scope, consulted only when
    /// the primary scope misses.
    pub fn fallback_provider(
        mut self,
        driver: impl Into<String>,
        provider: impl PoolProvider,
    ) -> Self {
        self.providers.register_fallback(driver, Arc::new(provider));
        self
    }

    /// Install a metrics provider.
    pub fn metrics(mut self, metrics: impl MetricsProvider) -> Self {
        self.metrics = Some(Arc::new(metrics));
        self
    }

    pub fn build(self) -> PoolResult<PoolManager> {
        let connector = self
            .connector
            .ok_or_else(|| PoolError::invalid_config("a connector is required"))?;
        Ok(PoolManager {
            shared: Arc::new(ManagerShared {
                registry: SharedRegistry::new(),
                providers: self.providers,
                connector,
                metrics: self.metrics,
            }),
        })
    }
}
