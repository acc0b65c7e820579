//! Shared test doubles for the integration suites.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, Once};
use std::time::Duration;

use db_pool_manager::{
    AcquireTarget, BoxError, Connection, Connector, DataSourceConfig, ManagedPool, MetricsProvider,
    MetricsSink, PoolManager, PoolProvider,
};
use tracing_subscriber::EnvFilter;

/// Install a subscriber once per test binary so `RUST_LOG` works.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Gate that blocks a fake's blocking call until the test opens it.
#[derive(Debug, Default)]
pub struct Gate {
    open: Mutex<bool>,
    cv: Condvar,
}

impl Gate {
    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.cv.notify_all();
    }

    pub fn wait_open(&self) {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.cv.wait(open).unwrap();
        }
    }
}

#[derive(Debug)]
pub struct FakeConnection {
    open: bool,
}

impl Connection for FakeConnection {
    fn is_open(&self) -> bool {
        self.open
    }
}

/// Connector counting its calls, with a scripted failure switch and an
/// optional gate to hold an in-flight acquire open.
#[derive(Clone, Default)]
pub struct FakeConnector {
    /// Completed `connect` calls.
    pub connects: Arc<AtomicUsize>,
    /// Calls that entered `connect`, counted before any gate wait.
    pub entered: Arc<AtomicUsize>,
    pub fail: Arc<AtomicBool>,
    pub last_target: Arc<Mutex<Option<AcquireTarget>>>,
    gate: Arc<Mutex<Option<Arc<Gate>>>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `connect` calls block until the gate opens.
    pub fn set_gate(&self, gate: Arc<Gate>) {
        *self.gate.lock().unwrap() = Some(gate);
    }
}

impl Connector for FakeConnector {
    fn connect(&self, target: &AcquireTarget) -> Result<Box<dyn Connection>, BoxError> {
        *self.last_target.lock().unwrap() = Some(target.clone());
        self.entered.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.wait_open();
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err("connector refused".into());
        }
        Ok(Box::new(FakeConnection { open: true }))
    }
}

/// Counters shared between a provider, the pools it creates and the test body.
#[derive(Debug, Default)]
pub struct PoolStats {
    pub created: AtomicUsize,
    pub closed: AtomicUsize,
}

#[derive(Debug)]
pub struct FakePool {
    stats: Arc<PoolStats>,
    max_size: u32,
    fail_close: bool,
    close_gate: Option<Arc<Gate>>,
}

impl ManagedPool for FakePool {
    fn max_size(&self) -> u32 {
        self.max_size
    }

    fn close(&self) -> Result<(), BoxError> {
        if let Some(gate) = &self.close_gate {
            gate.wait_open();
        }
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err("pool close refused".into());
        }
        Ok(())
    }
}

/// Pool provider with scripted creation failures and close behavior.
#[derive(Clone)]
pub struct FakeProvider {
    pub stats: Arc<PoolStats>,
    fail_creates: Arc<AtomicUsize>,
    fail_close: bool,
    max_size: u32,
    close_gate: Option<Arc<Gate>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(PoolStats::default()),
            fail_creates: Arc::new(AtomicUsize::new(0)),
            fail_close: false,
            max_size: 10,
            close_gate: None,
        }
    }

    /// Pools created by this provider fail their close call.
    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Pools created by this provider block in close until the gate opens.
    pub fn with_close_gate(mut self, gate: Arc<Gate>) -> Self {
        self.close_gate = Some(gate);
        self
    }

    /// Fail the next `n` pool creations.
    pub fn fail_next_creates(&self, n: usize) {
        self.fail_creates.store(n, Ordering::SeqCst);
    }
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolProvider for FakeProvider {
    fn create_pool(&self, _config: &DataSourceConfig) -> Result<Box<dyn ManagedPool>, BoxError> {
        if self.fail_creates.load(Ordering::SeqCst) > 0 {
            self.fail_creates.fetch_sub(1, Ordering::SeqCst);
            return Err("pool creation refused".into());
        }
        self.stats.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakePool {
            stats: self.stats.clone(),
            max_size: self.max_size,
            fail_close: self.fail_close,
            close_gate: self.close_gate.clone(),
        }))
    }
}

/// Metrics provider recording sink lifecycle and the reported capacity.
#[derive(Clone, Default)]
pub struct CountingMetrics {
    pub created: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    pub last_max: Arc<AtomicUsize>,
}

struct CountingSink {
    closed: Arc<AtomicUsize>,
}

impl MetricsSink for CountingSink {
    fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl MetricsProvider for CountingMetrics {
    fn datasource_metrics(
        &self,
        _datasource: &str,
        max_pool_size: u32,
    ) -> Option<Box<dyn MetricsSink>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.last_max.store(max_pool_size as usize, Ordering::SeqCst);
        Some(Box::new(CountingSink {
            closed: self.closed.clone(),
        }))
    }
}

/// Manager wired with fresh fakes, returning the handles tests assert on.
pub fn manager_with_fakes() -> (PoolManager, FakeProvider, FakeConnector) {
    init_tracing();
    let provider = FakeProvider::new();
    let connector = FakeConnector::new();
    let manager = PoolManager::builder()
        .connector(connector.clone())
        .provider("hsqldb", provider.clone())
        .build()
        .unwrap();
    (manager, provider, connector)
}

pub fn test_config() -> DataSourceConfig {
    DataSourceConfig::new("mem:testdb").with_username("sa")
}

/// Poll `check` until it passes or roughly a second has gone by.
pub async fn eventually(check: impl Fn() -> bool) {
    for _ in 0..100 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within deadline");
}
