use std::path::Path;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;

/// One progress report: what is loading and how far along it is.
#[derive(Clone, Debug, PartialEq)]
pub struct Progress {
    pub label: String,
    /// In `[0, 1]`, never decreasing for a given follower.
    pub fraction: f64,
}

/// Receiver of [`Progress`] reports, e.g. a progress bar.
///
/// Delivery is lossy by contract: only the latest value matters, so an
/// implementation may drop reports it cannot take right away.
pub trait ProgressSink: Send {
    fn report(&self, progress: Progress);
}

impl<F> ProgressSink for F
where
    F: Fn(Progress) + Send,
{
    fn report(&self, progress: Progress) {
        self(progress);
    }
}

impl ProgressSink for Sender<Progress> {
    fn report(&self, progress: Progress) {
        // A full or closed channel just loses this update.
        let _ = self.try_send(progress);
    }
}

/// `"Loading <file name>"`.
pub fn label_for(path: &Path) -> String {
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    format!("Loading {name}")
}

/// Rate-limits and clamps the reports of a single follower.
///
/// Data-driven reports go out at most once per `interval`. The end of
/// file report (1.0) goes out once each time the follower reaches the
/// end. Every published fraction is clamped to `[0, 1]` and is never
/// lower than the previous one.
pub struct ProgressTracker {
    label: String,
    sink: Option<Box<dyn ProgressSink>>,
    interval: Duration,
    next_due: Option<Instant>,
    last: f64,
}

impl ProgressTracker {
    pub fn new(label: String, sink: Option<Box<dyn ProgressSink>>, interval: Duration) -> Self {
        Self {
            label,
            sink,
            interval,
            next_due: None,
            last: 0.0,
        }
    }

    /// Called after data was parsed; publishes if the interval has elapsed.
    pub fn on_data(&mut self, fraction: f64) {
        let now = Instant::now();
        if self.next_due.is_some_and(|due| now < due) {
            return;
        }
        self.next_due = Some(now + self.interval);
        self.publish(fraction);
    }

    /// Called when a read returned no data.
    pub fn on_eof(&mut self) {
        if self.last < 1.0 {
            self.publish(1.0);
        }
    }

    /// The last fraction published.
    pub fn last(&self) -> f64 {
        self.last
    }

    fn publish(&mut self, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0).max(self.last);
        self.last = fraction;
        if let Some(sink) = &self.sink {
            sink.report(Progress {
                label: self.label.clone(),
                fraction,
            });
        }
    }
}
