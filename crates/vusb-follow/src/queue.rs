use crossbeam_channel::{Receiver, SendError, Sender, bounded};

/// Bounded FIFO between a producing [`Follower`](crate::Follower) and a
/// consuming [`QueueSink`](crate::QueueSink).
///
/// ```text
///   Follower thread ──push()──► [ e1 e2 e3 ... ] ──try_pop()──► host loop
///                     blocks        capacity        never blocks
///                     when full
/// ```
///
/// Both ends live in one value; clones share the same channel. Because
/// every clone holds a receiver, `push` can only fail if every clone
/// has been dropped mid-call, which a live producer never observes.
pub struct EventQueue<E> {
    tx: Sender<E>,
    rx: Receiver<E>,
    capacity: usize,
}

impl<E> Clone for EventQueue<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: self.rx.clone(),
            capacity: self.capacity,
        }
    }
}

impl<E> EventQueue<E> {
    /// A queue holding at most `capacity` events.
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self { tx, rx, capacity }
    }

    /// Enqueue an event, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns the event back if the channel has been disconnected.
    pub fn push(&self, event: E) -> Result<(), SendError<E>> {
        self.tx.send(event)
    }

    /// Dequeue the oldest event without blocking.
    pub fn try_pop(&self) -> Option<E> {
        self.rx.try_recv().ok()
    }

    /// Discard every pending event and return how many were dropped.
    pub fn drain(&self) -> usize {
        self.rx.try_iter().count()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.rx.is_full()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn fifo_order() {
        let queue = EventQueue::bounded(4);
        for e in ["e1", "e2", "e3"] {
            queue.push(e).unwrap();
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.try_pop(), Some("e1"));
        assert_eq!(queue.try_pop(), Some("e2"));
        assert_eq!(queue.try_pop(), Some("e3"));
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn drain_discards_everything() {
        let queue = EventQueue::bounded(8);
        for i in 0..5 {
            queue.push(i).unwrap();
        }
        assert_eq!(queue.drain(), 5);
        assert!(queue.is_empty());
        assert_eq!(queue.drain(), 0);
    }

    #[test]
    fn push_blocks_until_space_is_freed() {
        let queue = EventQueue::bounded(1);
        queue.push(1).unwrap();
        assert!(queue.is_full());

        let producer = {
            let queue = queue.clone();
            thread::spawn(move || queue.push(2).unwrap())
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!producer.is_finished());

        assert_eq!(queue.try_pop(), Some(1));
        producer.join().unwrap();
        assert_eq!(queue.try_pop(), Some(2));
    }

    #[test]
    fn clones_share_one_channel() {
        let a = EventQueue::bounded(2);
        let b = a.clone();
        a.push("x").unwrap();
        assert_eq!(b.try_pop(), Some("x"));
        assert_eq!(b.capacity(), 2);
    }
}
