use std::path::PathBuf;

use crossbeam_channel::SendError;

/// Errors that can occur while starting or running a [`Follower`](crate::Follower).
///
/// Everything here is surfaced to the caller of
/// [`FollowerBuilder::spawn`](crate::FollowerBuilder::spawn) before any
/// thread is started. Once the worker is running, a read failure is
/// logged and ends the worker instead of being returned.
///
/// ```text
///   FollowError
///   ├── Open          ← capture file could not be opened
///   ├── GzipFooter    ← .gz file too short to hold its 4-byte size footer
///   ├── Spawn         ← the OS refused to start the worker thread
///   ├── Config(ConfigError)
///   └── Io(std::io::Error)  ← seek / metadata / tail-skip failures
/// ```
#[derive(Debug, thiserror::Error)]
pub enum FollowError {
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A gzip file ends with a 4-byte little-endian uncompressed size.
    /// Anything shorter cannot be a gzip stream.
    #[error("{} is too short to carry a gzip footer ({len} bytes)", path.display())]
    GzipFooter { path: PathBuf, len: u64 },

    #[error("failed to spawn follower thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors a [`Parser`](crate::Parser) reports back to the follower loop.
///
/// `Malformed` is logged and the loop carries on with the next chunk.
/// `Interrupted` ends the loop as if the user had interrupted it.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed input: {reason}")]
    Malformed { reason: String },

    #[error("event queue disconnected")]
    Disconnected,

    #[error("parser interrupted")]
    Interrupted,
}

impl<T> From<SendError<T>> for ParseError {
    fn from(_: SendError<T>) -> Self {
        ParseError::Disconnected
    }
}

/// Out-of-range settings in [`FollowerConfig`](crate::FollowerConfig),
/// [`SinkConfig`](crate::SinkConfig) or a parser's construction.
///
/// These are defects in the calling code, not in the capture data.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("record {record:?} has no fixed size and cannot be framed")]
    VariableRecord { record: String },
}
