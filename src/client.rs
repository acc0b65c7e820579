//! Client handle.
//!
//! A [`PoolClient`] is the public face of one reference into a shared
//! holder. It owns no pool state itself; everything shared lives behind the
//! holder, and the handle merely forwards acquire requests to the holder's
//! worker and its one permitted close to the registry's release path.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::config::DataSourceConfig;
use crate::connector::{AcquireTarget, Connection};
use crate::error::{PoolError, PoolResult};
use crate::holder::{ConnectionHolder, PoolClose};
use crate::manager::ManagerShared;
use crate::registry::Released;

/// Handle to a shared datasource.
///
/// Multiple handles created with the same datasource name share one pool;
/// the pool dies when the last of them closes. Each handle may close exactly
/// once. An unclosed handle releases its reference on drop, with the
/// teardown outcome unobservable.
pub struct PoolClient {
    shared: Arc<ManagerShared>,
    holder: Arc<ConnectionHolder>,
    config: DataSourceConfig,
    closed: AtomicBool,
}

impl PoolClient {
    pub(crate) fn new(
        shared: Arc<ManagerShared>,
        holder: Arc<ConnectionHolder>,
        config: DataSourceConfig,
    ) -> Self {
        Self {
            shared,
            holder,
            config,
            closed: AtomicBool::new(false),
        }
    }

    /// Name of the datasource this handle references.
    pub fn data_source_name(&self) -> &str {
        self.holder.name()
    }

    /// The configuration this handle was created with.
    pub fn config(&self) -> &DataSourceConfig {
        &self.config
    }

    /// Whether `close` has been called on this handle.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Acquire a connection from the shared datasource.
    ///
    /// The blocking acquire runs on the holder's dedicated worker; the first
    /// call also forces lazy pool creation there, so a driver identity that
    /// cannot be resolved surfaces here as a resolution error rather than a
    /// connector error. The result is delivered back to the awaiting task.
    pub async fn get_connection(&self) -> PoolResult<Box<dyn Connection>> {
        if self.is_closed() {
            return Err(PoolError::handle_closed(self.holder.name()));
        }

        let (tx, rx) = oneshot::channel();
        let shared = self.shared.clone();
        let holder = self.holder.clone();
        let config = self.config.clone();
        let target = AcquireTarget::from_config(&self.config);
        self.holder.submit(Box::new(move || {
            let result = holder
                .ensure_pool(&config, &shared.providers, shared.metrics.as_deref())
                .and_then(|_| {
                    shared
                        .connector
                        .connect(&target)
                        .map_err(|e| PoolError::acquire(holder.name(), e.to_string()))
                });
            // The receiver is gone if the caller's task was cancelled; the
            // acquired connection then closes on drop.
            let _ = tx.send(result);
        }))?;

        rx.await
            .map_err(|_| PoolError::internal("acquire worker dropped the result"))?
    }

    /// Release this handle's reference to the shared datasource.
    ///
    /// Everything irreversible happens before this method returns: the
    /// reference count drops, and if this was the last handle the registry
    /// entry is removed, the metrics sink is closed, the worker gets its
    /// shutdown signal and the pool close is dispatched. The returned
    /// [`Closing`] only reports the outcome; discarding it fire-and-forgets
    /// the teardown.
    ///
    /// A handle closes once. A second call does not decrement anything and
    /// resolves to a handle-closed error.
    pub fn close(&self) -> Closing {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Closing::ready(Err(PoolError::handle_closed(self.holder.name())));
        }
        debug!(datasource = %self.holder.name(), "Closing client handle");

        match self.shared.registry.release(self.holder.name()) {
            Released::StillShared { remaining } => {
                debug!(
                    datasource = %self.holder.name(),
                    remaining,
                    "Holder still shared, resources stay alive"
                );
                Closing::ready(Ok(()))
            }
            Released::LastHandle(holder) => Closing::from_pool_close(holder.teardown()),
            Released::Missing => {
                warn!(datasource = %self.holder.name(), "No registry entry on release");
                Closing::ready(Err(PoolError::internal(format!(
                    "no registry entry for datasource '{}'",
                    self.holder.name()
                ))))
            }
        }
    }
}

impl Drop for PoolClient {
    fn drop(&mut self) {
        if !self.is_closed() {
            warn!(
                datasource = %self.holder.name(),
                "Client handle dropped without close, releasing its reference"
            );
            let _ = self.close();
        }
    }
}

impl std::fmt::Debug for PoolClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolClient")
            .field("datasource", &self.holder.name())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Completion of a [`PoolClient::close`] call.
///
/// By the time a `Closing` exists the synchronous teardown steps are done;
/// awaiting it waits for the pool close and combines both outcomes. Dropping
/// it detaches the in-flight pool close rather than cancelling it.
#[must_use = "dropping a Closing detaches the teardown outcome"]
pub struct Closing {
    state: CloseState,
}

enum CloseState {
    Ready(PoolResult<()>),
    Pending(tokio::task::JoinHandle<PoolResult<()>>),
}

impl Closing {
    fn ready(result: PoolResult<()>) -> Self {
        Self {
            state: CloseState::Ready(result),
        }
    }

    fn from_pool_close(close: PoolClose) -> Self {
        match close {
            PoolClose::Done(result) => Self::ready(result),
            PoolClose::Spawned(handle) => Self {
                state: CloseState::Pending(handle),
            },
        }
    }

    /// Wait for the combined teardown outcome.
    pub async fn wait(self) -> PoolResult<()> {
        match self.state {
            CloseState::Ready(result) => result,
            CloseState::Pending(handle) => match handle.await {
                Ok(result) => result,
                Err(e) => Err(PoolError::internal(format!("pool close task failed: {e}"))),
            },
        }
    }
}

impl std::future::IntoFuture for Closing {
    type Output = PoolResult<()>;
    type IntoFuture = std::pin::Pin<Box<dyn std::future::Future<Output = PoolResult<()>> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}
