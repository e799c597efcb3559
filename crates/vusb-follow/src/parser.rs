use vusb_struct::{Record, RecordDecoder};

use crate::error::{ConfigError, ParseError};
use crate::queue::EventQueue;

/// Domain logic plugged into a [`Follower`](crate::Follower).
///
/// The follower calls [`parse`](Parser::parse) on its own thread with
/// either one line (terminator included) or one chunk of raw bytes,
/// depending on [`line_oriented`](Parser::line_oriented). The parser
/// turns that input into events and pushes them onto its
/// [`event_queue`](Parser::event_queue); pushing blocks while the queue
/// is full.
///
/// The follower keeps a clone of the queue so it can drain it on stop.
pub trait Parser: Send + 'static {
    type Event: Send + 'static;

    /// Whether the follower should feed this parser whole lines.
    /// Fixed for the lifetime of the parser.
    fn line_oriented(&self) -> bool;

    /// Consume one line or chunk.
    ///
    /// # Errors
    ///
    /// [`ParseError::Malformed`] is logged by the follower, which keeps
    /// going. [`ParseError::Interrupted`] stops the follower loop.
    fn parse(&mut self, data: &[u8]) -> Result<(), ParseError>;

    fn event_queue(&self) -> &EventQueue<Self::Event>;
}

// ── LineParser ────────────────────────────────────────────────────────

/// Emits every non-empty line as a `String`, terminator stripped.
///
/// Invalid UTF-8 is replaced rather than rejected, since capture logs
/// frequently contain stray binary.
pub struct LineParser {
    queue: EventQueue<String>,
}

impl LineParser {
    pub fn new(queue: EventQueue<String>) -> Self {
        Self { queue }
    }
}

impl Parser for LineParser {
    type Event = String;

    fn line_oriented(&self) -> bool {
        true
    }

    fn parse(&mut self, data: &[u8]) -> Result<(), ParseError> {
        let line = String::from_utf8_lossy(data);
        let line = line.trim_end_matches(['\r', '\n']);
        if !line.is_empty() {
            self.queue.push(line.to_owned())?;
        }
        Ok(())
    }

    fn event_queue(&self) -> &EventQueue<String> {
        &self.queue
    }
}

// ── RecordParser ──────────────────────────────────────────────────────

/// Frames a binary stream into fixed-size records.
///
/// Chunks from the follower do not line up with record boundaries, so
/// bytes left over after the last whole record are kept and prefixed to
/// the next chunk:
///
/// ```text
///   chunk 1: [ rec0 | rec1 | re ]
///   chunk 2:              [ c2 | rec3 | ... ]
///                     pending ─┘
/// ```
pub struct RecordParser {
    decoder: RecordDecoder,
    record_size: usize,
    pending: Vec<u8>,
    queue: EventQueue<Record>,
}

impl RecordParser {
    /// # Errors
    ///
    /// [`ConfigError::VariableRecord`] if the decoder has no fixed,
    /// non-zero size.
    pub fn new(decoder: RecordDecoder, queue: EventQueue<Record>) -> Result<Self, ConfigError> {
        let record_size = decoder
            .fixed_size()
            .filter(|&size| size > 0)
            .ok_or_else(|| ConfigError::VariableRecord {
                record: decoder.name().to_string(),
            })?;

        Ok(Self {
            decoder,
            record_size,
            pending: Vec::with_capacity(record_size),
            queue,
        })
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Bytes held back waiting for the rest of a record.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl Parser for RecordParser {
    type Event = Record;

    fn line_oriented(&self) -> bool {
        false
    }

    fn parse(&mut self, data: &[u8]) -> Result<(), ParseError> {
        self.pending.extend_from_slice(data);

        let mut framed = 0;
        for bytes in self.pending.chunks_exact(self.record_size) {
            let (record, _) = self.decoder.decode(bytes);
            self.queue.push(record)?;
            framed += bytes.len();
        }

        self.pending.drain(..framed);
        Ok(())
    }

    fn event_queue(&self) -> &EventQueue<Record> {
        &self.queue
    }
}
