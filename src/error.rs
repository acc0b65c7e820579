//! Error types for the pool manager.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Variants map onto the three failure classes the manager distinguishes: resolution
//! and pool-creation failures (fatal to the call that forced lazy initialization),
//! per-call acquisition failures, and teardown failures captured during close.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("No pool provider registered for driver '{driver}'")]
    ProviderNotFound { driver: String },

    #[error("Pool creation failed for datasource '{datasource}': {message}")]
    PoolCreation { datasource: String, message: String },

    #[error("Connection acquisition failed for datasource '{datasource}': {message}")]
    Acquire { datasource: String, message: String },

    #[error("Teardown failed for datasource '{datasource}': {message}")]
    Teardown { datasource: String, message: String },

    #[error("Client handle for datasource '{datasource}' is already closed")]
    HandleClosed { datasource: String },

    #[error("Datasource '{datasource}' is closed")]
    DataSourceClosed { datasource: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PoolError {
    /// Create a provider resolution error.
    pub fn provider_not_found(driver: impl Into<String>) -> Self {
        Self::ProviderNotFound {
            driver: driver.into(),
        }
    }

    /// Create a pool creation error.
    pub fn pool_creation(datasource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PoolCreation {
            datasource: datasource.into(),
            message: message.into(),
        }
    }

    /// Create a connection acquisition error.
    pub fn acquire(datasource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Acquire {
            datasource: datasource.into(),
            message: message.into(),
        }
    }

    /// Create a teardown error.
    pub fn teardown(datasource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Teardown {
            datasource: datasource.into(),
            message: message.into(),
        }
    }

    /// Create a handle-already-closed error.
    pub fn handle_closed(datasource: impl Into<String>) -> Self {
        Self::HandleClosed {
            datasource: datasource.into(),
        }
    }

    /// Create a datasource-closed error.
    pub fn datasource_closed(datasource: impl Into<String>) -> Self {
        Self::DataSourceClosed {
            datasource: datasource.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the datasource name this error relates to, if available.
    pub fn datasource(&self) -> Option<&str> {
        match self {
            Self::PoolCreation { datasource, .. } => Some(datasource),
            Self::Acquire { datasource, .. } => Some(datasource),
            Self::Teardown { datasource, .. } => Some(datasource),
            Self::HandleClosed { datasource } => Some(datasource),
            Self::DataSourceClosed { datasource } => Some(datasource),
            _ => None,
        }
    }

    /// Check if this error is retryable.
    ///
    /// Acquisition failures are per-call and never poison the shared holder.
    /// Pool creation failures leave the holder without a pool, so the next
    /// call runs initialization again from scratch.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Acquire { .. } | Self::PoolCreation { .. })
    }
}

/// Result type alias for pool manager operations.
pub type PoolResult<T> = Result<T, PoolError>;

/// Boxed error type accepted at the collaborator seams (connector, provider,
/// metrics). Mapped into [`PoolError`] with datasource context at the call site.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
