//! Delay between a failed attempt and its retry.

use crate::error::{JobQueueError, JobQueueResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long a job waits in `Retrying` before its next attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Retry immediately.
    #[default]
    None,
    /// Wait the same delay before every retry.
    Fixed {
        #[serde(rename = "delay_ms", with = "millis")]
        delay: Duration,
    },
    /// Double the delay after every failure, capped at `max`.
    Exponential {
        #[serde(rename = "initial_ms", with = "millis")]
        initial: Duration,
        #[serde(rename = "max_ms", with = "millis")]
        max: Duration,
    },
}

impl BackoffStrategy {
    /// Delay before the retry that follows failed attempt number `attempt`
    /// (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Self::None => Duration::ZERO,
            Self::Fixed { delay } => delay,
            Self::Exponential { initial, max } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1).min(31));
                initial.saturating_mul(factor).min(max)
            }
        }
    }

    pub fn validate(&self) -> JobQueueResult<()> {
        match *self {
            Self::Exponential { initial, max } if initial > max => Err(JobQueueError::InvalidOptions(
                format!("exponential backoff starts at {initial:?}, above its cap of {max:?}"),
            )),
            _ => Ok(()),
        }
    }
}

// Durations are written as whole milliseconds in config files.
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
