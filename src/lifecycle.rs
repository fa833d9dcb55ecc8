use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;
use tracing::debug;

/// Mounted flag shared between a component and the async work it starts.
///
/// Late completions check `is_alive()` before committing. This is the only
/// cancellation mechanism for in-flight requests: they keep running, their
/// results are just dropped.
#[derive(Clone, Debug)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Returns true only for the call that actually ended the scope.
    pub fn end(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Disposer for a long-lived listener task.
///
/// Releasing ends the liveness scope and aborts the task exactly once,
/// whether through `unsubscribe()` or on drop.
#[derive(Debug)]
pub struct Subscription {
    name: &'static str,
    liveness: Liveness,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Spawns `task` on the current runtime, tied to `liveness`.
    pub fn spawn<F>(name: &'static str, liveness: Liveness, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        debug!(subscription = name, "subscribed");
        Self {
            name,
            liveness,
            handle: Some(tokio::spawn(task)),
        }
    }

    /// A subscription with nothing behind it, e.g. when no provider exists.
    pub fn inert(name: &'static str) -> Self {
        let liveness = Liveness::new();
        liveness.end();
        Self {
            name,
            liveness,
            handle: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some() && self.liveness.is_alive()
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.liveness.end();
        handle.abort();
        debug!(subscription = self.name, "unsubscribed");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
