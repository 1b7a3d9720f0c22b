#![allow(dead_code)]

//! In-memory doubles for the runtime daemon and its registry.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use hutch::{
    ContainerId, ContainerRuntime, HutchError, HutchResult, ImageSource, ServiceRegistry,
    SessionManager, SessionOptions,
};

/// Scripted stand-in for the runtime daemon.
///
/// Containers and their running state live in plain maps; log output is a
/// per-container queue of fragments handed out one per fetch (the daemon's
/// delta contract). Any operation can be primed to fail once with a
/// communication error.
pub struct FakeRuntime {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    containers: Vec<ContainerId>,
    running: HashSet<ContainerId>,
    pending_logs: HashMap<ContainerId, VecDeque<String>>,
    /// Returned by every fetch once the queue is drained.
    steady_log: HashMap<ContainerId, String>,
    fail_once: HashSet<&'static str>,
    images: HashMap<ContainerId, Vec<u8>>,
    /// Applied inside every fetch, simulating a slow daemon.
    fetch_delay: Option<Duration>,
    fetch_count: usize,
    fetches_in_flight: usize,
    max_fetches_in_flight: usize,
    add_count: usize,
}

impl FakeRuntime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState::default()),
        })
    }

    pub fn with_containers(ids: &[&str]) -> Arc<Self> {
        let fake = Self::new();
        {
            let mut state = fake.state.lock();
            state.containers = ids.iter().map(|s| s.to_string()).collect();
        }
        fake
    }

    pub fn set_running(&self, id: &str, running: bool) {
        let mut state = self.state.lock();
        if running {
            state.running.insert(id.to_string());
        } else {
            state.running.remove(id);
        }
    }

    /// Queue a fragment to be returned by exactly one future fetch.
    pub fn push_log(&self, id: &str, fragment: &str) {
        self.state
            .lock()
            .pending_logs
            .entry(id.to_string())
            .or_default()
            .push_back(fragment.to_string());
    }

    /// Make every fetch (after the queue drains) return this fragment.
    pub fn set_steady_log(&self, id: &str, fragment: &str) {
        self.state
            .lock()
            .steady_log
            .insert(id.to_string(), fragment.to_string());
    }

    /// Prime the named operation to fail once with a communication error.
    pub fn fail_once(&self, op: &'static str) {
        self.state.lock().fail_once.insert(op);
    }

    /// Make every future fetch stall for `delay` before answering.
    pub fn set_fetch_delay(&self, delay: Duration) {
        self.state.lock().fetch_delay = Some(delay);
    }

    pub fn fetch_count(&self) -> usize {
        self.state.lock().fetch_count
    }

    /// Highest number of fetches ever observed in flight at once.
    pub fn max_fetches_in_flight(&self) -> usize {
        self.state.lock().max_fetches_in_flight
    }

    pub fn add_count(&self) -> usize {
        self.state.lock().add_count
    }

    pub fn received_image(&self, id: &str) -> Option<Vec<u8>> {
        self.state.lock().images.get(id).cloned()
    }

    fn check_failure(&self, op: &'static str) -> HutchResult<()> {
        if self.state.lock().fail_once.remove(op) {
            return Err(HutchError::Communication(format!("{}: peer died", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn is_running(&self, id: &str) -> HutchResult<bool> {
        self.check_failure("is_running")?;
        Ok(self.state.lock().running.contains(id))
    }

    async fn start(&self, id: &str, _attach: bool) -> HutchResult<bool> {
        self.check_failure("start")?;
        let mut state = self.state.lock();
        if !state.containers.iter().any(|c| c == id) || state.running.contains(id) {
            return Ok(false);
        }
        state.running.insert(id.to_string());
        Ok(true)
    }

    async fn stop(&self, id: &str) -> HutchResult<bool> {
        self.check_failure("stop")?;
        Ok(self.state.lock().running.remove(id))
    }

    async fn add_container(&self, id: &str, image: ImageSource) -> HutchResult<bool> {
        self.check_failure("add_container")?;
        use tokio::io::AsyncReadExt;

        let (mut reader, len) = image.into_parts();
        let mut bytes = Vec::with_capacity(len as usize);
        reader
            .read_to_end(&mut bytes)
            .await
            .map_err(|e| HutchError::Communication(format!("reading image: {}", e)))?;

        let mut state = self.state.lock();
        state.add_count += 1;
        if state.containers.iter().any(|c| c == id) {
            return Ok(false);
        }
        state.containers.push(id.to_string());
        state.images.insert(id.to_string(), bytes);
        Ok(true)
    }

    async fn delete_container(&self, id: &str) -> HutchResult<bool> {
        self.check_failure("delete_container")?;
        let mut state = self.state.lock();
        if state.running.contains(id) {
            return Ok(false);
        }
        let before = state.containers.len();
        state.containers.retain(|c| c != id);
        Ok(state.containers.len() != before)
    }

    async fn list_containers(&self) -> HutchResult<Vec<ContainerId>> {
        self.check_failure("list_containers")?;
        Ok(self.state.lock().containers.clone())
    }

    async fn fetch_logs(&self, id: &str) -> HutchResult<String> {
        self.check_failure("fetch_logs")?;
        let delay = {
            let mut state = self.state.lock();
            state.fetch_count += 1;
            state.fetches_in_flight += 1;
            state.max_fetches_in_flight =
                state.max_fetches_in_flight.max(state.fetches_in_flight);
            state.fetch_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        state.fetches_in_flight -= 1;
        if let Some(fragment) = state.pending_logs.get_mut(id).and_then(|q| q.pop_front()) {
            return Ok(fragment);
        }
        Ok(state.steady_log.get(id).cloned().unwrap_or_default())
    }
}

/// Registry double handing out a pre-built runtime (or nothing).
pub struct FakeRegistry {
    runtime: Mutex<Option<Arc<FakeRuntime>>>,
    lookups: AtomicUsize,
}

impl FakeRegistry {
    pub fn serving(runtime: Arc<FakeRuntime>) -> Arc<Self> {
        Arc::new(Self {
            runtime: Mutex::new(Some(runtime)),
            lookups: AtomicUsize::new(0),
        })
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            runtime: Mutex::new(None),
            lookups: AtomicUsize::new(0),
        })
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceRegistry for FakeRegistry {
    async fn lookup(&self, _name: &str) -> HutchResult<Option<Arc<dyn ContainerRuntime>>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .runtime
            .lock()
            .clone()
            .map(|r| r as Arc<dyn ContainerRuntime>))
    }
}

/// Options tuned so tests finish quickly on real time.
pub fn fast_options() -> SessionOptions {
    SessionOptions {
        poll_interval: Duration::from_millis(10),
        idle_check_interval: Duration::from_millis(25),
        ..SessionOptions::default()
    }
}

/// Manager wired to a fake daemon, plus handles to both doubles.
pub fn manager_with(
    runtime: Arc<FakeRuntime>,
) -> (Arc<SessionManager>, Arc<FakeRegistry>) {
    let registry = FakeRegistry::serving(runtime);
    let sessions = Arc::new(SessionManager::new(registry.clone(), fast_options()));
    (sessions, registry)
}

/// Poll `probe` every few milliseconds until it returns true or the
/// deadline passes.
pub async fn wait_until<F>(what: &str, mut probe: F)
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if probe() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for: {}", what);
}
