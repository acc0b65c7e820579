//! Database connector seam.
//!
//! The actual connection-acquisition call is external to this crate. Callers
//! supply a [`Connector`]; the manager only decides where and when it runs.

use crate::config::DataSourceConfig;
use crate::error::BoxError;

/// Everything one blocking acquire call consumes, snapshotted from the
/// configuration of the handle that issued it.
#[derive(Debug, Clone)]
pub struct AcquireTarget {
    /// Connection string as configured. May be a bare suffix; composing the
    /// full string (scheme prefixes and the like) is the connector's business.
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl AcquireTarget {
    /// Snapshot the acquire-relevant fields of a configuration.
    pub fn from_config(config: &DataSourceConfig) -> Self {
        Self {
            url: config.url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }
}

/// A live database connection produced by a [`Connector`].
///
/// Connections release their resources on drop; this crate never closes them
/// explicitly.
pub trait Connection: Send + std::fmt::Debug {
    /// Whether the connection is still usable.
    fn is_open(&self) -> bool;
}

/// Blocking connection factory.
///
/// `connect` always runs on the datasource's dedicated acquire worker, never
/// on the caller's async context, so implementations are free to block.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self, target: &AcquireTarget) -> Result<Box<dyn Connection>, BoxError>;
}
