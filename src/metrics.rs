//! Pool capacity metrics seam.
//!
//! A holder reports its pool's capacity once, right after lazy pool creation,
//! and closes the returned sink synchronously as the first teardown step.

/// Metrics sink for one datasource's pool.
pub trait MetricsSink: Send + Sync {
    /// Lifecycle call; invoked exactly once when the datasource closes.
    fn close(&self);
}

/// Factory consulted once per holder after its pool is created.
pub trait MetricsProvider: Send + Sync + 'static {
    /// Build a sink for the named datasource. Returning `None` leaves the
    /// holder without one, which disables metrics for that datasource.
    fn datasource_metrics(
        &self,
        datasource: &str,
        max_pool_size: u32,
    ) -> Option<Box<dyn MetricsSink>>;
}
