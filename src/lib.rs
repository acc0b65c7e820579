//! Reference-Counted Connection Pool Manager
//!
//! This library manages shareable database connection pools keyed by
//! datasource name. Client handles created with the same name attach to one
//! lazily-created pool; the pool is torn down exactly when the last handle
//! closes, with the blocking pool close dispatched off the caller's async
//! context and its outcome reported through the returned completion.
//!
//! The SQL side is deliberately absent: connections come from an injected
//! [`Connector`], pools from registered [`PoolProvider`]s. This crate only
//! decides how many live pools exist and when they die.
//!
//! ```no_run
//! use db_pool_manager::{DataSourceConfig, PoolManager};
//! # use db_pool_manager::{AcquireTarget, BoxError, Connection, Connector};
//! # use db_pool_manager::{ManagedPool, PoolProvider};
//! # struct MyConnector;
//! # impl Connector for MyConnector {
//! #     fn connect(&self, _: &AcquireTarget) -> Result<Box<dyn Connection>, BoxError> {
//! #         unimplemented!()
//! #     }
//! # }
//! # struct MyProvider;
//! # impl PoolProvider for MyProvider {
//! #     fn create_pool(&self, _: &DataSourceConfig) -> Result<Box<dyn ManagedPool>, BoxError> {
//! #         unimplemented!()
//! #     }
//! # }
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = PoolManager::builder()
//!     .connector(MyConnector)
//!     .provider("hsqldb", MyProvider)
//!     .build()?;
//!
//! let config = DataSourceConfig::new("mem:orders").with_username("sa");
//! let client = manager.create_shared(config, Some("orders"));
//! let conn = client.get_connection().await?;
//! drop(conn);
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod connector;
pub mod error;
pub mod manager;
pub mod metrics;
pub mod provider;

mod executor;
mod holder;
mod registry;

pub use client::{Closing, PoolClient};
pub use config::{DEFAULT_PROVIDER, DataSourceConfig};
pub use connector::{AcquireTarget, Connection, Connector};
pub use error::{BoxError, PoolError, PoolResult};
pub use manager::{DEFAULT_DS, PoolManager, PoolManagerBuilder};
pub use metrics::{MetricsProvider, MetricsSink};
pub use provider::{ManagedPool, PoolProvider, ProviderBinding, ProviderRegistry};
