//! Process-wide registry of running followers.
//!
//! Every [`Follower`](crate::Follower) registers itself here when spawned.
//! [`stop_all`] stops whatever is still alive, and a [`ShutdownGuard`]
//! held in `main` calls it on the way out, so no worker thread outlives
//! the program's main scope even when it returns early with an error.

use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError, Weak};

use tracing::debug;

/// Anything that can be stopped at shutdown.
pub(crate) trait Stop: Send + Sync {
    fn stop(&self);
}

static REGISTRY: LazyLock<Mutex<Vec<Weak<dyn Stop>>>> = LazyLock::new(|| Mutex::new(Vec::new()));

fn registry() -> MutexGuard<'static, Vec<Weak<dyn Stop>>> {
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn register(entry: Weak<dyn Stop>) {
    let mut entries = registry();
    entries.retain(|e| e.strong_count() > 0);
    entries.push(entry);
}

/// Stop every follower that is still alive and clear the registry.
///
/// Returns how many followers were visited. Stopping is idempotent, so
/// followers that had already been stopped are counted but unaffected.
pub fn stop_all() -> usize {
    let live: Vec<Arc<dyn Stop>> = registry().drain(..).filter_map(|e| e.upgrade()).collect();
    for entry in &live {
        entry.stop();
    }
    debug!(count = live.len(), "stopped registered followers");
    live.len()
}

/// Number of registered followers that have not been dropped yet.
pub fn live_count() -> usize {
    registry().iter().filter(|e| e.strong_count() > 0).count()
}

/// Calls [`stop_all`] when dropped.
///
/// ```no_run
/// fn main() {
///     let _shutdown = vusb_follow::ShutdownGuard::new();
///     // spawn followers, run the host loop ...
/// }
/// ```
#[derive(Debug, Default)]
#[must_use = "followers are stopped when the guard is dropped"]
pub struct ShutdownGuard {
    _private: (),
}

impl ShutdownGuard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        stop_all();
    }
}
