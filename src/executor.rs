//! Dedicated blocking-acquire worker.
//!
//! Each holder lazily spawns exactly one worker: a named OS thread draining
//! an unbounded FIFO of blocking jobs. Connection acquisition blocks, and it
//! must never do so on the caller's async context.

use std::io;
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::{PoolError, PoolResult};

/// A unit of blocking work queued to the worker.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// One dedicated OS thread per datasource for blocking acquire calls.
///
/// Shutdown is signal-only: dropping the worker closes the channel, the
/// thread drains whatever is already queued and exits on its own. Nothing
/// joins the thread, and queued jobs are never cancelled.
pub(crate) struct AcquireWorker {
    datasource: String,
    tx: mpsc::UnboundedSender<Job>,
}

impl AcquireWorker {
    /// Spawn the worker thread for a datasource.
    pub(crate) fn spawn(datasource: &str) -> io::Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let name = datasource.to_string();
        thread::Builder::new()
            .name(format!("ds-acquire-{datasource}"))
            .spawn(move || {
                while let Some(job) = rx.blocking_recv() {
                    job();
                }
                trace!(datasource = %name, "Acquire worker stopped");
            })?;
        debug!(datasource = %datasource, "Spawned acquire worker");
        Ok(Self {
            datasource: datasource.to_string(),
            tx,
        })
    }

    /// Queue a job at the tail of the FIFO.
    ///
    /// Fails only if the worker thread is gone, which a well-behaved job
    /// (one that does not panic) can never cause.
    pub(crate) fn submit(&self, job: Job) -> PoolResult<()> {
        self.tx.send(job).map_err(|_| {
            PoolError::internal(format!("acquire worker for '{}' is gone", self.datasource))
        })
    }
}
