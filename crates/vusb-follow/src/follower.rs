use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::config::FollowerConfig;
use crate::error::{FollowError, ParseError};
use crate::interrupt::Interrupt;
use crate::parser::Parser;
use crate::progress::{ProgressSink, ProgressTracker, label_for};
use crate::shutdown::{self, Stop};
use crate::source::CaptureSource;

/// Back-off between drains while `stop` waits for the worker to exit.
const STOP_BACKOFF: Duration = Duration::from_millis(1);

/// Scans one capture file on a dedicated thread and feeds it to a
/// [`Parser`].
///
/// ```text
///   capture file ──► CaptureSource ──► worker thread ──► Parser::parse
///                                           │                 │
///                                           ▼                 ▼
///                                     ProgressSink       EventQueue ──► QueueSink
/// ```
///
/// The worker reads whole lines or fixed-size chunks depending on
/// [`Parser::line_oriented`]. At end of file it reports progress 1.0,
/// marks itself [exhausted](Follower::is_exhausted) and polls for more
/// data, which is how tail mode picks up appended lines.
///
/// Progress is an estimate. A multi-member gzip file or one holding
/// 4 GiB or more can report 1.0 early, so consumers that need to know
/// everything has been read check [`is_exhausted`](Follower::is_exhausted).
///
/// [`stop`](Follower::stop) can be called from any thread, any number of
/// times. The first call ends the worker and returns once the thread has
/// been joined; every later or concurrent call returns after that too.
/// Dropping the follower stops it.
///
/// ```no_run
/// use vusb_follow::{EventQueue, Follower, LineParser};
///
/// let queue = EventQueue::bounded(512);
/// let follower = Follower::builder("usb.log", LineParser::new(queue.clone()))
///     .tail(true)
///     .spawn()?;
/// // ... consume `queue` ...
/// follower.stop();
/// # Ok::<(), vusb_follow::FollowError>(())
/// ```
pub struct Follower {
    shared: Arc<Shared>,
}

impl Follower {
    pub fn builder<P: Parser>(path: impl Into<PathBuf>, parser: P) -> FollowerBuilder<P> {
        FollowerBuilder {
            path: path.into(),
            parser,
            tail: false,
            progress: None,
            config: FollowerConfig::default(),
            interrupt: None,
        }
    }

    /// Stop the worker and wait for it to exit.
    pub fn stop(&self) {
        self.shared.stop();
    }

    /// Whether the worker loop is still going. Turns false after
    /// [`stop`](Self::stop), an interrupt, or a fatal read error.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Whether the worker has parsed everything currently in the file.
    ///
    /// Every event from the data read so far has been pushed by the time
    /// this turns true. It turns false again when the file grows, and
    /// stays false while an unterminated tail line is held back.
    pub fn is_exhausted(&self) -> bool {
        self.shared.exhausted.load(Ordering::Acquire)
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    /// The label attached to progress reports, `"Loading <file name>"`.
    pub fn label(&self) -> &str {
        &self.shared.label
    }
}

impl Drop for Follower {
    fn drop(&mut self) {
        self.shared.stop();
    }
}

impl std::fmt::Debug for Follower {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Follower")
            .field("path", &self.shared.path)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

// ── Builder ───────────────────────────────────────────────────────────

/// Configures and starts a [`Follower`].
pub struct FollowerBuilder<P: Parser> {
    path: PathBuf,
    parser: P,
    tail: bool,
    progress: Option<Box<dyn ProgressSink>>,
    config: FollowerConfig,
    interrupt: Option<Interrupt>,
}

impl<P: Parser> FollowerBuilder<P> {
    /// Start at the current end of the file and only read what is
    /// appended afterwards.
    #[must_use]
    pub fn tail(mut self, tail: bool) -> Self {
        self.tail = tail;
        self
    }

    #[must_use]
    pub fn progress(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.progress = Some(Box::new(sink));
        self
    }

    #[must_use]
    pub fn config(mut self, config: FollowerConfig) -> Self {
        self.config = config;
        self
    }

    /// Leave the loop when `interrupt` fires. A parser returning
    /// [`ParseError::Interrupted`] triggers it.
    #[must_use]
    pub fn interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    /// Open the capture file and start the worker thread.
    ///
    /// Nothing is left running when this fails.
    ///
    /// # Errors
    ///
    /// - [`FollowError::Config`] if the config does not validate.
    /// - [`FollowError::Open`], [`FollowError::GzipFooter`] or
    ///   [`FollowError::Io`] if the file cannot be opened.
    /// - [`FollowError::Spawn`] if the thread cannot be created.
    pub fn spawn(self) -> Result<Follower, FollowError> {
        self.config.validate()?;
        let source = CaptureSource::open(&self.path, self.tail)?;

        let label = label_for(&self.path);
        let running = Arc::new(AtomicBool::new(true));
        let exhausted = Arc::new(AtomicBool::new(false));
        let queue = self.parser.event_queue().clone();

        let worker = Worker {
            tracker: ProgressTracker::new(label.clone(), self.progress, self.config.progress_interval),
            source,
            parser: self.parser,
            config: self.config,
            tail: self.tail,
            running: Arc::clone(&running),
            exhausted: Arc::clone(&exhausted),
            interrupt: self.interrupt,
        };

        let thread_name = format!("follow {}", label.trim_start_matches("Loading "));
        let handle = thread::Builder::new()
            .name(thread_name)
            .spawn(move || worker.run())
            .map_err(FollowError::Spawn)?;

        let shared = Arc::new(Shared {
            path: self.path,
            label,
            running,
            exhausted,
            worker: Mutex::new(Some(handle)),
            drain: Box::new(move || queue.drain()),
        });

        let entry: Arc<dyn Stop> = Arc::clone(&shared) as Arc<dyn Stop>;
        shutdown::register(Arc::downgrade(&entry));
        debug!(path = %shared.path.display(), tail = self.tail, "follower started");

        Ok(Follower { shared })
    }
}

// ── Shared state ──────────────────────────────────────────────────────

struct Shared {
    path: PathBuf,
    label: String,
    running: Arc<AtomicBool>,
    exhausted: Arc<AtomicBool>,
    /// `Some` until the first `stop` takes and joins it.
    worker: Mutex<Option<JoinHandle<()>>>,
    /// Discards everything pending in the parser's queue.
    drain: Box<dyn Fn() -> usize + Send + Sync>,
}

impl Stop for Shared {
    fn stop(&self) {
        // Held across the join so concurrent callers wait for the exit.
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(handle) = worker.take() else {
            return;
        };

        self.running.store(false, Ordering::Release);

        // The worker may be blocked pushing into a full queue; keep
        // making room until it notices the flag and returns.
        let mut drained = 0;
        loop {
            drained += (self.drain)();
            if handle.is_finished() {
                break;
            }
            thread::sleep(STOP_BACKOFF);
        }

        if handle.join().is_err() {
            error!(path = %self.path.display(), "follower thread panicked");
        }
        debug!(path = %self.path.display(), drained, "follower stopped");
    }
}

// ── Worker ────────────────────────────────────────────────────────────

enum Flow {
    /// Data was parsed; read again right away.
    Continue,
    /// Nothing new to parse; wait for the file to grow.
    Idle,
    /// Leave the loop.
    Exit,
}

struct Worker<P: Parser> {
    source: CaptureSource,
    parser: P,
    tracker: ProgressTracker,
    config: FollowerConfig,
    tail: bool,
    running: Arc<AtomicBool>,
    exhausted: Arc<AtomicBool>,
    interrupt: Option<Interrupt>,
}

impl<P: Parser> Worker<P> {
    fn run(mut self) {
        let line_oriented = self.parser.line_oriented();
        let mut line = Vec::new();
        let mut chunk = if line_oriented {
            Vec::new()
        } else {
            vec![0u8; self.config.chunk_size]
        };

        while self.running.load(Ordering::Acquire) {
            if self.interrupt.as_ref().is_some_and(Interrupt::is_triggered) {
                debug!(path = %self.source.path().display(), "follower interrupted");
                break;
            }

            let flow = if line_oriented {
                self.step_line(&mut line)
            } else {
                self.step_chunk(&mut chunk)
            };

            match flow {
                Flow::Continue => self.exhausted.store(false, Ordering::Release),
                Flow::Idle => {
                    // A held partial line is unparsed data, not end of file.
                    let at_eof = line.is_empty();
                    if at_eof {
                        self.tracker.on_eof();
                    }
                    self.exhausted.store(at_eof, Ordering::Release);
                    thread::sleep(self.config.poll_interval);
                }
                Flow::Exit => break,
            }
        }

        self.running.store(false, Ordering::Release);
    }

    fn step_line(&mut self, line: &mut Vec<u8>) -> Flow {
        match self.source.read_line(line) {
            Ok(0) => Flow::Idle,
            // An unterminated line may still be growing; keep it and
            // append the rest on the next read.
            Ok(_) if self.tail && line.last() != Some(&b'\n') => Flow::Idle,
            Ok(_) => {
                let flow = self.feed(line);
                line.clear();
                flow
            }
            Err(e) => self.read_failed(&e),
        }
    }

    fn step_chunk(&mut self, chunk: &mut [u8]) -> Flow {
        match self.source.read_chunk(chunk) {
            Ok(0) => Flow::Idle,
            Ok(n) => self.feed(&chunk[..n]),
            Err(e) => self.read_failed(&e),
        }
    }

    fn feed(&mut self, data: &[u8]) -> Flow {
        match self.parser.parse(data) {
            Ok(()) => {}
            Err(ParseError::Malformed { reason }) => {
                warn!(path = %self.source.path().display(), %reason, "skipping malformed input");
            }
            Err(ParseError::Interrupted) => {
                if let Some(interrupt) = &self.interrupt {
                    interrupt.trigger();
                }
                debug!(path = %self.source.path().display(), "parser interrupted");
                return Flow::Exit;
            }
            Err(ParseError::Disconnected) => {
                debug!(path = %self.source.path().display(), "event queue disconnected");
                return Flow::Exit;
            }
        }
        self.tracker.on_data(self.source.fraction());
        Flow::Continue
    }

    fn read_failed(&self, e: &std::io::Error) -> Flow {
        error!(path = %self.source.path().display(), error = %e, "read failed, stopping follower");
        Flow::Exit
    }
}
