use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

use tracing::debug;

use crate::config::SinkConfig;
use crate::error::ConfigError;
use crate::host::{HostLoop, Task};
use crate::interrupt::Interrupt;
use crate::queue::EventQueue;

/// Delivers events from an [`EventQueue`] to a callback from inside a
/// cooperative [`HostLoop`], without ever blocking it.
///
/// Each poll drains the queue in batches until its time slice runs out,
/// checking the clock between batches, then hands control back:
///
/// ```text
///   poll ─► queue empty ──────────► timeout_add(idle_interval, poll)
///      └──► slice used up, busy ──► idle_add(poll)
/// ```
///
/// An idle queue is checked again after `idle_interval`; a busy one is
/// resumed as soon as the host has handled its own pending work. Events
/// reach the callback in the order they were pushed.
pub struct QueueSink<E, H: HostLoop> {
    host: H,
    queue: EventQueue<E>,
    callback: RefCell<Box<dyn FnMut(E)>>,
    config: SinkConfig,
    interrupt: Option<Interrupt>,
    detached: Cell<bool>,
}

/// Configures and attaches a [`QueueSink`].
pub struct QueueSinkBuilder<E, H: HostLoop> {
    host: H,
    callback: Box<dyn FnMut(E)>,
    config: SinkConfig,
    interrupt: Option<Interrupt>,
}

impl<E: 'static, H: HostLoop + 'static> QueueSink<E, H> {
    pub fn builder(host: H, callback: impl FnMut(E) + 'static) -> QueueSinkBuilder<E, H> {
        QueueSinkBuilder {
            host,
            callback: Box::new(callback),
            config: SinkConfig::default(),
            interrupt: None,
        }
    }

    /// The queue producers push into. Clone it for a parser.
    pub fn queue(&self) -> &EventQueue<E> {
        &self.queue
    }

    /// Stop rescheduling. Events still queued are left in place.
    pub fn detach(&self) {
        self.detached.set(true);
    }

    pub fn is_detached(&self) -> bool {
        self.detached.get()
    }

    fn poll(self: &Rc<Self>) {
        if self.detached.get() {
            return;
        }

        let deadline = Instant::now() + self.config.time_slice;
        loop {
            for _ in 0..self.config.batch_size {
                if self.interrupt.as_ref().is_some_and(Interrupt::is_triggered) {
                    debug!("queue sink interrupted, quitting host loop");
                    self.detached.set(true);
                    self.host.quit();
                    return;
                }

                let Some(event) = self.queue.try_pop() else {
                    self.reschedule(false);
                    return;
                };
                (self.callback.borrow_mut())(event);

                if self.detached.get() {
                    return;
                }
            }

            if Instant::now() >= deadline {
                break;
            }
        }

        self.reschedule(true);
    }

    fn reschedule(self: &Rc<Self>, busy: bool) {
        let sink = Rc::clone(self);
        let task: Task = Box::new(move || sink.poll());
        if busy {
            self.host.idle_add(task);
        } else {
            self.host.timeout_add(self.config.idle_interval, task);
        }
    }
}

impl<E: 'static, H: HostLoop + 'static> QueueSinkBuilder<E, H> {
    #[must_use]
    pub fn config(mut self, config: SinkConfig) -> Self {
        self.config = config;
        self
    }

    /// Quit the host loop instead of delivering further events once
    /// `interrupt` fires.
    #[must_use]
    pub fn interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    /// Create the queue and schedule the first poll as idle work.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Zero`] if the config does not validate.
    pub fn attach(self) -> Result<Rc<QueueSink<E, H>>, ConfigError> {
        self.config.validate()?;
        let sink = Rc::new(QueueSink {
            host: self.host,
            queue: EventQueue::bounded(self.config.capacity),
            callback: RefCell::new(self.callback),
            config: self.config,
            interrupt: self.interrupt,
            detached: Cell::new(false),
        });
        sink.reschedule(true);
        Ok(sink)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::host::{LoopHandle, MainLoop};

    fn collecting(main: &MainLoop, config: SinkConfig) -> (Rc<QueueSink<u32, LoopHandle>>, Rc<RefCell<Vec<u32>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = {
            let seen = Rc::clone(&seen);
            QueueSink::builder(main.handle(), move |e| seen.borrow_mut().push(e))
                .config(config)
                .attach()
                .unwrap()
        };
        (sink, seen)
    }

    #[test]
    fn delivers_in_order_across_polls() {
        let main = MainLoop::new();
        let config = SinkConfig {
            batch_size: 2,
            time_slice: Duration::from_nanos(1),
            ..SinkConfig::default()
        };
        let (sink, seen) = collecting(&main, config);
        for e in 1..=7 {
            sink.queue().push(e).unwrap();
        }

        while seen.borrow().len() < 7 {
            assert!(main.iteration(false));
        }
        assert_eq!(*seen.borrow(), [1, 2, 3, 4, 5, 6, 7]);
        sink.detach();
    }

    #[test]
    fn busy_queue_is_resumed_as_idle_work() {
        let main = MainLoop::new();
        let handle = main.handle();
        let config = SinkConfig {
            batch_size: 1,
            time_slice: Duration::from_nanos(1),
            ..SinkConfig::default()
        };
        let (sink, seen) = collecting(&main, config);
        sink.queue().push(1).unwrap();
        sink.queue().push(2).unwrap();

        // First poll delivers one event, then yields.
        assert!(main.iteration(false));
        assert_eq!(*seen.borrow(), [1]);
        assert_eq!(handle.pending(), 1);

        assert!(main.iteration(false));
        assert_eq!(*seen.borrow(), [1, 2]);
        sink.detach();
    }

    #[test]
    fn empty_queue_waits_for_idle_interval() {
        let main = MainLoop::new();
        let config = SinkConfig {
            idle_interval: Duration::from_millis(20),
            ..SinkConfig::default()
        };
        let (sink, seen) = collecting(&main, config);

        // Initial poll finds nothing and arms a timer.
        assert!(main.iteration(false));
        sink.queue().push(9).unwrap();
        assert!(main.iteration(false));
        assert!(seen.borrow().is_empty());

        let start = Instant::now();
        while seen.borrow().is_empty() {
            assert!(main.iteration(true));
        }
        assert!(start.elapsed() >= Duration::from_millis(5));
        assert_eq!(*seen.borrow(), [9]);
        sink.detach();
    }

    #[test]
    fn detach_stops_rescheduling() {
        let main = MainLoop::new();
        let (sink, _seen) = collecting(&main, SinkConfig::default());
        sink.detach();
        assert!(sink.is_detached());

        main.run();
        assert_eq!(Rc::strong_count(&sink), 1);
    }

    #[test]
    fn interrupt_quits_host() {
        let main = MainLoop::new();
        let handle = main.handle();
        let interrupt = Interrupt::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = {
            let seen = Rc::clone(&seen);
            let trigger = interrupt.clone();
            QueueSink::builder(handle.clone(), move |e: u32| {
                seen.borrow_mut().push(e);
                if e == 2 {
                    trigger.trigger();
                }
            })
            .interrupt(interrupt.clone())
            .attach()
            .unwrap()
        };
        for e in 1..=4 {
            sink.queue().push(e).unwrap();
        }

        main.run();
        assert!(handle.is_quit());
        assert_eq!(*seen.borrow(), [1, 2]);
        assert_eq!(sink.queue().len(), 2);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let main = MainLoop::new();
        let config = SinkConfig {
            capacity: 0,
            ..SinkConfig::default()
        };
        let err = QueueSink::<u32, _>::builder(main.handle(), |_| {}).config(config).attach();
        assert!(matches!(err, Err(ConfigError::Zero { field: "capacity" })));
    }
}
