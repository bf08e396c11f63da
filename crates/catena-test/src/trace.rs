//! Ordering recorder for chain tests.
//!
//! A [`Trace`] hands out [`TraceStage`]s that log `name:down` before calling
//! `next` and `name:up` once it returns `Ok`, so a test can assert the onion
//! order of a run. Failures propagate with `?` and leave no `up` entry.

use catena_core::StageResult;
use catena_middleware::{BoxFuture, Middleware, Next, PipelineContext};
use std::sync::{Arc, Mutex, PoisonError};

/// Shared, ordered log of stage events.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Trace {
    /// Creates an empty trace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.into());
    }

    /// Returns a copy of the entries recorded so far.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns a stage named `name` that records into this trace.
    #[must_use]
    pub fn stage(&self, name: &'static str) -> TraceStage {
        TraceStage {
            name,
            trace: self.clone(),
        }
    }

    /// Asserts the recorded entries.
    ///
    /// # Panics
    ///
    /// Panics if the entries differ from `expected`.
    pub fn assert_entries(&self, expected: &[&str]) {
        assert_eq!(self.entries(), expected, "Unexpected stage order");
    }
}

/// A pass-through stage recording its entry and exit.
#[derive(Debug, Clone)]
pub struct TraceStage {
    name: &'static str,
    trace: Trace,
}

impl<T, Q, C> Middleware<T, Q, C> for TraceStage
where
    T: Send + Sync + 'static,
    Q: Clone + Send + Sync + 'static,
    C: Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn run<'a>(
        &'a self,
        request: &'a T,
        response: Q,
        transport: &'a C,
        ctx: &'a mut PipelineContext,
        next: Next<'a, T, Q, C>,
    ) -> BoxFuture<'a, StageResult<Q>> {
        Box::pin(async move {
            self.trace.record(format!("{}:down", self.name));
            let result = next.run(request, response, transport, ctx).await?;
            self.trace.record(format!("{}:up", self.name));
            Ok(result)
        })
    }
}
