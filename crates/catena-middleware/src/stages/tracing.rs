//! Tracing middleware.
//!
//! Wraps the remainder of the chain in a `tracing` span and logs how long
//! the downstream stages took once `next` returns. Every run gets a
//! time-ordered [`RequestId`] (UUID v7) that is recorded on the span and
//! stored as a context extension for later stages.

use crate::context::PipelineContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use catena_core::StageResult;
use std::fmt;
use tracing::Instrument;
use uuid::Uuid;

/// Identifier of a single chain run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a new time-ordered id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Middleware that opens a span around the rest of the chain.
///
/// Place it first so the span covers every other stage.
#[derive(Debug, Clone)]
pub struct TracingMiddleware {
    service_name: String,
}

impl TracingMiddleware {
    /// Creates a tracing stage for the given service.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Returns the service name recorded on every span.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Default for TracingMiddleware {
    fn default() -> Self {
        Self::new("unknown")
    }
}

impl<T, Q, C> Middleware<T, Q, C> for TracingMiddleware
where
    T: Send + Sync + 'static,
    Q: Clone + Send + Sync + 'static,
    C: Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn run<'a>(
        &'a self,
        request: &'a T,
        response: Q,
        transport: &'a C,
        ctx: &'a mut PipelineContext,
        next: Next<'a, T, Q, C>,
    ) -> BoxFuture<'a, StageResult<Q>> {
        let request_id = ctx.get_extension::<RequestId>().copied().unwrap_or_default();
        ctx.set_extension(request_id);

        let span = tracing::info_span!(
            "catena.run",
            service = %self.service_name,
            request_id = %request_id,
            stages = next.remaining(),
        );

        Box::pin(
            async move {
                let started = ctx.elapsed();
                let result = next.run(request, response, transport, ctx).await;
                let duration = ctx.elapsed().saturating_sub(started);

                match &result {
                    Ok(_) => tracing::info!(
                        duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                        "downstream completed"
                    ),
                    Err(error) if error.is_resolved() => tracing::info!(
                        duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                        "downstream resolved by an error handler"
                    ),
                    Err(error) => tracing::warn!(
                        duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                        error.code = error.code(),
                        "downstream failed"
                    ),
                }

                result
            }
            .instrument(span),
        )
    }
}
