use std::cell::RefCell;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, VecDeque};
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use crate::interrupt::Interrupt;

/// Longest a blocking [`MainLoop::iteration`] sleeps before checking for
/// an interrupt again.
const MAX_BLOCK: Duration = Duration::from_millis(50);

/// A unit of work handed to a host loop.
pub type Task = Box<dyn FnOnce()>;

/// The scheduling facilities a cooperative host event loop offers.
///
/// This is what a [`QueueSink`](crate::QueueSink) needs from a UI
/// toolkit: run something later, run something when idle, and stop.
/// Tasks run on the loop's own thread, one at a time.
pub trait HostLoop {
    /// Run `task` once, no sooner than `delay` from now.
    fn timeout_add(&self, delay: Duration, task: Task);

    /// Run `task` once, when no timer is due.
    fn idle_add(&self, task: Task);

    /// Ask the loop to return from [`MainLoop::run`] (or equivalent).
    fn quit(&self);
}

// ── MainLoop ──────────────────────────────────────────────────────────

/// A minimal single-threaded [`HostLoop`].
///
/// Each iteration first runs every timer whose deadline has passed. If
/// none was due it runs one idle task. If there was nothing to run it
/// sleeps until the next timer, in steps of at most 50 ms so an
/// [`Interrupt`] is noticed promptly. The loop ends when asked to quit,
/// when the interrupt fires, or when nothing is left to do.
///
/// Dropping the loop discards its pending tasks.
pub struct MainLoop {
    handle: LoopHandle,
    interrupt: Option<Interrupt>,
}

impl Default for MainLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl MainLoop {
    pub fn new() -> Self {
        Self {
            handle: LoopHandle {
                state: Rc::new(RefCell::new(LoopState::default())),
            },
            interrupt: None,
        }
    }

    /// A loop that quits as soon as `interrupt` fires.
    pub fn with_interrupt(interrupt: Interrupt) -> Self {
        let mut main = Self::new();
        main.interrupt = Some(interrupt);
        main
    }

    /// The handle tasks and sinks use to schedule work on this loop.
    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    /// Iterate until quit, interrupted, or out of work.
    pub fn run(&self) {
        while self.iteration(true) {}
    }

    /// Run one step. Returns `false` when the loop should end.
    pub fn iteration(&self, may_block: bool) -> bool {
        if let Some(interrupt) = &self.interrupt
            && interrupt.is_triggered()
        {
            self.handle.quit();
        }
        if self.handle.is_quit() {
            return false;
        }

        let now = Instant::now();
        let due = self.handle.take_due(now);
        if !due.is_empty() {
            for task in due {
                task();
            }
            return true;
        }

        if let Some(task) = self.handle.take_idle() {
            task();
            return true;
        }

        match self.handle.next_deadline() {
            None => false,
            Some(deadline) => {
                if may_block {
                    thread::sleep(deadline.saturating_duration_since(now).min(MAX_BLOCK));
                }
                true
            }
        }
    }
}

impl Drop for MainLoop {
    fn drop(&mut self) {
        // Tasks often hold handles back to this loop; dropping them
        // outside the borrow breaks the cycle.
        let pending = {
            let mut state = self.handle.state.borrow_mut();
            (
                std::mem::take(&mut state.timers),
                std::mem::take(&mut state.idle),
            )
        };
        drop(pending);
    }
}

// ── LoopHandle ────────────────────────────────────────────────────────

/// Cheap, cloneable access to a [`MainLoop`]'s queues.
#[derive(Clone)]
pub struct LoopHandle {
    state: Rc<RefCell<LoopState>>,
}

impl LoopHandle {
    pub fn is_quit(&self) -> bool {
        self.state.borrow().quit
    }

    /// Number of scheduled timers plus idle tasks.
    pub fn pending(&self) -> usize {
        let state = self.state.borrow();
        state.timers.len() + state.idle.len()
    }

    fn take_due(&self, now: Instant) -> Vec<Task> {
        let mut state = self.state.borrow_mut();
        let mut due = Vec::new();
        while state.timers.peek().is_some_and(|Reverse(t)| t.deadline <= now) {
            if let Some(Reverse(timer)) = state.timers.pop() {
                due.push(timer.task);
            }
        }
        due
    }

    fn take_idle(&self) -> Option<Task> {
        self.state.borrow_mut().idle.pop_front()
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.state.borrow().timers.peek().map(|Reverse(t)| t.deadline)
    }
}

impl HostLoop for LoopHandle {
    fn timeout_add(&self, delay: Duration, task: Task) {
        let mut state = self.state.borrow_mut();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.timers.push(Reverse(Timer {
            deadline: Instant::now() + delay,
            seq,
            task,
        }));
    }

    fn idle_add(&self, task: Task) {
        self.state.borrow_mut().idle.push_back(task);
    }

    fn quit(&self) {
        self.state.borrow_mut().quit = true;
    }
}

impl std::fmt::Debug for LoopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("LoopHandle")
            .field("timers", &state.timers.len())
            .field("idle", &state.idle.len())
            .field("quit", &state.quit)
            .finish()
    }
}

#[derive(Default)]
struct LoopState {
    timers: BinaryHeap<Reverse<Timer>>,
    idle: VecDeque<Task>,
    next_seq: u64,
    quit: bool,
}

/// Ordered by deadline, then by insertion so equal deadlines run FIFO.
struct Timer {
    deadline: Instant,
    seq: u64,
    task: Task,
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timer {}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.deadline, self.seq).cmp(&(other.deadline, other.seq))
    }
}
