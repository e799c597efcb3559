#![warn(clippy::pedantic)]

//! Follow capture logs on a background thread and hand the events they
//! produce to a cooperative host loop.
//!
//! ```text
//!   Follower (thread) ──parse──► EventQueue ──poll──► QueueSink (host loop) ──► callback
//! ```

pub mod config;
pub mod error;
pub mod shutdown;

mod follower;
mod host;
mod interrupt;
mod parser;
mod progress;
mod queue;
mod sink;
mod source;

pub use config::{DEFAULT_CHUNK_SIZE, DEFAULT_QUEUE_CAPACITY, FollowerConfig, SinkConfig};
pub use error::{ConfigError, FollowError, ParseError};
pub use follower::{Follower, FollowerBuilder};
pub use host::{HostLoop, LoopHandle, MainLoop, Task};
pub use interrupt::Interrupt;
pub use parser::{LineParser, Parser, RecordParser};
pub use progress::{Progress, ProgressSink, ProgressTracker, label_for};
pub use queue::EventQueue;
pub use shutdown::{ShutdownGuard, stop_all};
pub use sink::{QueueSink, QueueSinkBuilder};
pub use source::CaptureSource;
