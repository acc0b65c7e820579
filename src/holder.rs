//! Reference-counted owner of one datasource's shared resources.
//!
//! A holder owns three sub-resources, each created lazily: the provider
//! binding (the pool), the acquire worker, and an optional metrics sink.
//! Reference counting itself lives in the registry; the holder only knows
//! how to initialize its resources on demand and how to tear them down once.
//!
//! Teardown is two-phase. The metrics sink closes and the worker receives
//! its shutdown signal synchronously; the pool close, which may block, is
//! dispatched onto a blocking-capable context and its outcome reported
//! through the returned [`PoolClose`]. The two slots become [`Slot::Closed`]
//! under their own locks, so a lazy-init call racing the teardown can only
//! observe closed, never resurrect a resource.

use std::mem;
use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::config::DataSourceConfig;
use crate::error::{PoolError, PoolResult};
use crate::executor::{AcquireWorker, Job};
use crate::metrics::{MetricsProvider, MetricsSink};
use crate::provider::{ProviderBinding, ProviderRegistry};

/// Lazily-initialized resource slot that cannot be refilled once closed.
enum Slot<T> {
    Empty,
    Ready(T),
    Closed,
}

struct PoolState {
    binding: ProviderBinding,
    sink: Option<Box<dyn MetricsSink>>,
}

/// Resolution of the asynchronous half of a teardown.
pub(crate) enum PoolClose {
    /// Pool close running on a blocking-capable task.
    Spawned(tokio::task::JoinHandle<PoolResult<()>>),
    /// Already resolved: no pool existed, or the close ran inline.
    Done(PoolResult<()>),
}

pub(crate) struct ConnectionHolder {
    name: String,
    /// Pool plus metrics sink. Guarded separately from the worker slot
    /// because pool creation blocks and runs on the worker thread, and
    /// callers queueing jobs must not wait behind it.
    pool_state: Mutex<Slot<PoolState>>,
    worker: Mutex<Slot<AcquireWorker>>,
}

impl ConnectionHolder {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pool_state: Mutex::new(Slot::Empty),
            worker: Mutex::new(Slot::Empty),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Resolve the provider binding if this holder does not have one yet.
    ///
    /// Runs on the acquire worker. A resolution or creation failure leaves
    /// the slot empty, so the next call retries initialization from scratch.
    pub(crate) fn ensure_pool(
        &self,
        config: &DataSourceConfig,
        providers: &ProviderRegistry,
        metrics: Option<&dyn MetricsProvider>,
    ) -> PoolResult<()> {
        let mut slot = self.pool_state.lock().unwrap();
        match &*slot {
            Slot::Ready(_) => return Ok(()),
            Slot::Closed => return Err(PoolError::datasource_closed(&self.name)),
            Slot::Empty => {}
        }

        let binding = ProviderBinding::resolve(providers, &self.name, config)?;
        let sink = metrics.and_then(|m| m.datasource_metrics(&self.name, binding.max_size()));
        info!(
            datasource = %self.name,
            driver = %binding.driver(),
            max_pool_size = binding.max_size(),
            "Pool created"
        );
        *slot = Slot::Ready(PoolState { binding, sink });
        Ok(())
    }

    /// Queue a blocking job on this holder's worker, spawning it on first use.
    pub(crate) fn submit(&self, job: Job) -> PoolResult<()> {
        let mut slot = self.worker.lock().unwrap();
        match &*slot {
            Slot::Ready(worker) => return worker.submit(job),
            Slot::Closed => return Err(PoolError::datasource_closed(&self.name)),
            Slot::Empty => {}
        }

        let worker = AcquireWorker::spawn(&self.name)
            .map_err(|e| PoolError::internal(format!("failed to spawn acquire worker: {e}")))?;
        worker.submit(job)?;
        *slot = Slot::Ready(worker);
        Ok(())
    }

    /// Tear down this holder's resources. Called exactly once, by whoever
    /// released the last reference, after the registry entry is gone.
    ///
    /// The metrics sink closes first, synchronously. The pool close is
    /// dispatched and reported through the returned [`PoolClose`]; a failure
    /// there is captured, never raised, and does not stop the worker
    /// shutdown that follows.
    pub(crate) fn teardown(&self) -> PoolClose {
        info!(datasource = %self.name, "Closing datasource");

        let pool_close = {
            let mut slot = self.pool_state.lock().unwrap();
            match mem::replace(&mut *slot, Slot::Closed) {
                Slot::Ready(state) => {
                    if let Some(sink) = state.sink {
                        sink.close();
                        debug!(datasource = %self.name, "Metrics sink closed");
                    }
                    self.dispatch_pool_close(state.binding)
                }
                _ => PoolClose::Done(Ok(())),
            }
        };

        let mut slot = self.worker.lock().unwrap();
        if let Slot::Ready(worker) = mem::replace(&mut *slot, Slot::Closed) {
            // Dropping the worker closes its queue; the thread drains and exits.
            drop(worker);
            debug!(datasource = %self.name, "Acquire worker shut down");
        }

        pool_close
    }

    fn dispatch_pool_close(&self, binding: ProviderBinding) -> PoolClose {
        let name = self.name.clone();
        let close = move || {
            debug!(datasource = %name, driver = %binding.driver(), "Closing pool");
            binding.close_pool().map_err(|e| {
                warn!(datasource = %name, error = %e, "Pool close failed");
                PoolError::teardown(&name, e.to_string())
            })
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => PoolClose::Spawned(handle.spawn_blocking(close)),
            // No runtime to dispatch onto; close inline on this thread.
            Err(_) => PoolClose::Done(close()),
        }
    }
}

impl std::fmt::Debug for ConnectionHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHolder")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
