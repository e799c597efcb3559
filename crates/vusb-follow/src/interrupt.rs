use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A user-initiated interrupt shared between threads.
///
/// The host program triggers it (typically from a Ctrl-C handler). A
/// [`Follower`](crate::Follower) that sees it leaves its loop; a
/// [`MainLoop`](crate::MainLoop) or [`QueueSink`](crate::QueueSink) that
/// sees it asks the host loop to quit. Once triggered it stays triggered.
#[derive(Clone, Debug, Default)]
pub struct Interrupt {
    triggered: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::Release);
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_observe_trigger() {
        let a = Interrupt::new();
        let b = a.clone();
        assert!(!b.is_triggered());
        a.trigger();
        assert!(b.is_triggered());
    }
}
