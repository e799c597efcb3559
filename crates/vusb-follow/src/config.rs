use std::time::Duration;

use crate::error::ConfigError;

/// Default size of a chunk read by non line-oriented parsers.
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Default capacity of a [`QueueSink`](crate::QueueSink) queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 512;

/// Tuning for a [`Follower`](crate::Follower).
///
/// ```text
/// ┌───────────────────┬─────────┬───────────────────────────────────────┐
/// │ Field             │ Default │ Purpose                               │
/// ├───────────────────┼─────────┼───────────────────────────────────────┤
/// │ chunk_size        │ 16 KiB  │ bytes per read for chunk parsers      │
/// │ poll_interval     │ 100 ms  │ sleep after hitting end of file       │
/// │ progress_interval │ 200 ms  │ minimum gap between progress reports  │
/// └───────────────────┴─────────┴───────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FollowerConfig {
    pub chunk_size: usize,
    pub poll_interval: Duration,
    pub progress_interval: Duration,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            poll_interval: Duration::from_millis(100),
            progress_interval: Duration::from_millis(200),
        }
    }
}

impl FollowerConfig {
    /// # Errors
    ///
    /// [`ConfigError::Zero`] if `chunk_size` or `poll_interval` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Zero { field: "chunk_size" });
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Zero {
                field: "poll_interval",
            });
        }
        Ok(())
    }
}

/// Tuning for a [`QueueSink`](crate::QueueSink).
///
/// ```text
/// ┌───────────────┬─────────┬──────────────────────────────────────────┐
/// │ Field         │ Default │ Purpose                                  │
/// ├───────────────┼─────────┼──────────────────────────────────────────┤
/// │ capacity      │ 512     │ bound of the event queue                 │
/// │ time_slice    │ 250 ms  │ longest a single poll may run            │
/// │ batch_size    │ 10      │ events drained between clock checks      │
/// │ idle_interval │ 200 ms  │ delay before polling an empty queue      │
/// └───────────────┴─────────┴──────────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    pub capacity: usize,
    pub time_slice: Duration,
    pub batch_size: usize,
    pub idle_interval: Duration,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
            time_slice: Duration::from_millis(250),
            batch_size: 10,
            idle_interval: Duration::from_millis(200),
        }
    }
}

impl SinkConfig {
    /// # Errors
    ///
    /// [`ConfigError::Zero`] if `capacity`, `batch_size` or `time_slice` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Zero { field: "capacity" });
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Zero { field: "batch_size" });
        }
        if self.time_slice.is_zero() {
            return Err(ConfigError::Zero { field: "time_slice" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(FollowerConfig::default().validate().is_ok());
        assert!(SinkConfig::default().validate().is_ok());
        assert_eq!(FollowerConfig::default().chunk_size, 16384);
        assert_eq!(SinkConfig::default().capacity, 512);
    }

    #[test]
    fn zero_values_rejected() {
        let config = FollowerConfig {
            chunk_size: 0,
            ..FollowerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Zero { field: "chunk_size" })
        ));

        let config = SinkConfig {
            batch_size: 0,
            ..SinkConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Zero { field: "batch_size" })
        ));

        let config = SinkConfig {
            time_slice: Duration::ZERO,
            ..SinkConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
