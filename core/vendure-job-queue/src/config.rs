//! Service-wide defaults, loadable from TOML.

use crate::backoff::BackoffStrategy;
use crate::error::{JobQueueError, JobQueueResult};
use crate::job::AddJobOptions;
use serde::{Deserialize, Serialize};

/// Defaults applied by [`JobQueue::add_default`](crate::JobQueue::add_default).
///
/// ```toml
/// default_retries = 3
///
/// [backoff]
/// kind = "exponential"
/// initial_ms = 500
/// max_ms = 30000
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobQueueConfig {
    pub default_retries: u32,
    pub backoff: BackoffStrategy,
}

impl JobQueueConfig {
    pub fn from_toml_str(input: &str) -> JobQueueResult<Self> {
        let config: Self =
            toml::from_str(input).map_err(|e| JobQueueError::InvalidOptions(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> JobQueueResult<()> {
        self.backoff.validate()
    }

    pub fn job_options(&self) -> AddJobOptions {
        AddJobOptions::with_retries(self.default_retries).backoff(self.backoff)
    }
}
