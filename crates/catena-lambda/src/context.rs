//! Invocation context handed to a function by the runtime.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Metadata about the current invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LambdaContext {
    /// Name of the function.
    pub function_name: String,
    /// Version of the function being executed.
    pub function_version: String,
    /// ARN used to invoke the function.
    pub invoked_function_arn: String,
    /// Configured memory limit, as reported by the runtime.
    #[serde(rename = "memoryLimitInMB")]
    pub memory_limit_in_mb: String,
    /// Identifier of the invocation request.
    pub aws_request_id: String,
    /// Log group of the function.
    pub log_group_name: String,
    /// Log stream of the function instance.
    pub log_stream_name: String,
    /// Invocation deadline in milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
}

impl LambdaContext {
    /// Sets the invocation deadline.
    #[must_use]
    pub const fn with_deadline_ms(mut self, deadline_ms: u64) -> Self {
        self.deadline_ms = Some(deadline_ms);
        self
    }

    /// Returns the time left before the deadline, measured from `now_ms`.
    ///
    /// Returns `None` when no deadline is known, and zero once it has
    /// passed.
    #[must_use]
    pub const fn remaining_time(&self, now_ms: u64) -> Option<Duration> {
        match self.deadline_ms {
            Some(deadline) => Some(Duration::from_millis(deadline.saturating_sub(now_ms))),
            None => None,
        }
    }
}
