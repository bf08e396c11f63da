//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait that every chain stage
//! implements, and the [`Next`] continuation a stage uses to run the rest of
//! the chain.
//!
//! A stage can:
//!
//! - continue by calling `next.run(..)` and return what it returns, possibly
//!   post-processed (the "after" half of the onion),
//! - short-circuit by returning a result without calling `next`,
//! - fail by returning `Err(StageError)`. The failure is resolved by the
//!   stage's `on_error` or the chain default, and that result is final.
//!
//! `next` is consumed by `run`, so a stage can call it at most once.
//!
//! # Example
//!
//! ```
//! use catena_middleware::{BoxFuture, Middleware, Next, PipelineContext};
//! use catena_core::StageResult;
//!
//! struct Timing;
//!
//! impl Middleware<String, String, ()> for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn run<'a>(
//!         &'a self,
//!         request: &'a String,
//!         response: String,
//!         transport: &'a (),
//!         ctx: &'a mut PipelineContext,
//!         next: Next<'a, String, String, ()>,
//!     ) -> BoxFuture<'a, StageResult<String>> {
//!         Box::pin(async move {
//!             let result = next.run(request, response, transport, ctx).await?;
//!             tracing::debug!(elapsed = ?ctx.elapsed(), "downstream finished");
//!             Ok(result)
//!         })
//!     }
//! }
//! ```

use crate::context::PipelineContext;
use crate::handler::{ErrorHandler, Handler};
use catena_core::{StageError, StageResult};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed future returned by stages and handlers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased middleware that can be stored in a chain.
pub type BoxedMiddleware<T, Q, C> = Arc<dyn Middleware<T, Q, C>>;

/// The core middleware trait.
///
/// `T` is the request type, `Q` the result type and `C` the transport
/// context supplied by the caller of the chain.
///
/// # Invariants
///
/// - A middleware calls `next.run()` at most once; not calling it is a
///   short-circuit.
/// - A middleware only adds to the [`PipelineContext`]; it never removes
///   what earlier stages wrote.
pub trait Middleware<T, Q, C>: Send + Sync + 'static {
    /// Returns the name of this stage, used for logging and metrics.
    fn name(&self) -> &'static str;

    /// Runs this stage.
    ///
    /// `response` is the response-so-far: the chain's default response,
    /// possibly adjusted by upstream stages before they called `next`.
    fn run<'a>(
        &'a self,
        request: &'a T,
        response: Q,
        transport: &'a C,
        ctx: &'a mut PipelineContext,
        next: Next<'a, T, Q, C>,
    ) -> BoxFuture<'a, StageResult<Q>>;

    /// Recovers from a failure of this stage.
    ///
    /// Returning `None` means the stage declares no recovery and the chain's
    /// default error handler resolves the failure instead. `response` is the
    /// response-so-far this stage received.
    fn on_error<'a>(
        &'a self,
        _request: &'a T,
        _response: &'a Q,
        _transport: &'a C,
        _ctx: &'a PipelineContext,
        _error: &'a StageError,
    ) -> Option<BoxFuture<'a, Q>> {
        None
    }
}

/// Continuation that runs the remainder of the chain.
///
/// A `Next` only carries the position of the following stage; every run of
/// a chain builds its own, so a single chain can serve concurrent runs.
pub struct Next<'a, T, Q, C> {
    stages: &'a [BoxedMiddleware<T, Q, C>],
    handler: &'a dyn Handler<T, Q, C>,
    error_handler: &'a dyn ErrorHandler<T, Q, C>,
    index: usize,
}

impl<'a, T, Q, C> Next<'a, T, Q, C>
where
    T: Send + Sync + 'static,
    Q: Clone + Send + Sync + 'static,
    C: Send + Sync + 'static,
{
    /// Creates a continuation positioned at the first of `stages`.
    pub(crate) fn new(
        stages: &'a [BoxedMiddleware<T, Q, C>],
        handler: &'a dyn Handler<T, Q, C>,
        error_handler: &'a dyn ErrorHandler<T, Q, C>,
    ) -> Self {
        Self {
            stages,
            handler,
            error_handler,
            index: 0,
        }
    }

    /// Returns the number of stages left before the terminal handler.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.stages.len().saturating_sub(self.index)
    }

    /// Runs the next stage, or the terminal handler if none is left.
    ///
    /// A failing middleware stage is resolved here, by its own `on_error` or
    /// the chain default. That result is final for the run: it is stored in
    /// the context and every enclosing `next` returns
    /// [`StageError::resolved`], so enclosing stages unwind through `?`
    /// and whatever they return instead is discarded. A terminal handler
    /// failure comes back as its own `Err`; it belongs to the stage that
    /// called this `next`.
    ///
    /// This consumes `self` so it can only be called once.
    pub fn run(
        self,
        request: &'a T,
        response: Q,
        transport: &'a C,
        ctx: &'a mut PipelineContext,
    ) -> BoxFuture<'a, StageResult<Q>> {
        Box::pin(async move {
            let Some(stage) = self.stages.get(self.index) else {
                tracing::debug!(stage = "handler", "invoking terminal handler");
                return self.handler.call(request, response, transport, ctx).await;
            };

            let name = stage.name();
            tracing::debug!(stage = name, index = self.index, "entering stage");

            let next = Self {
                stages: self.stages,
                handler: self.handler,
                error_handler: self.error_handler,
                index: self.index + 1,
            };

            let received = response.clone();
            let outcome = stage.run(request, response, transport, ctx, next).await;
            if ctx.has_extension::<Resolved<Q>>() {
                tracing::trace!(stage = name, "run already resolved downstream");
                return Err(StageError::resolved());
            }

            let error = match outcome {
                Ok(result) => return Ok(result),
                Err(error) => error,
            };

            tracing::warn!(
                stage = name,
                error.code = error.code(),
                error.kind = %error.kind(),
                "stage failed"
            );
            metrics::counter!("catena_stage_failures_total", "stage" => name).increment(1);

            let recovered = match stage.on_error(request, &received, transport, ctx, &error) {
                Some(recovery) => Some(recovery.await),
                None => None,
            };

            let result = match recovered {
                Some(result) => result,
                None => {
                    tracing::debug!(stage = name, "no stage recovery, using default error handler");
                    self.error_handler
                        .handle(request, &received, transport, ctx, error)
                        .await
                }
            };
            ctx.set_extension(Resolved(result));
            Err(StageError::resolved())
        })
    }
}

/// Final result of a run, produced by an error handler.
pub(crate) struct Resolved<Q>(pub(crate) Q);

/// A middleware built from a function.
///
/// The function must be generic over the continuation lifetime, which in
/// practice means a `fn` item rather than a closure.
///
/// # Example
///
/// ```
/// use catena_middleware::{BoxFuture, FnMiddleware, Next, PipelineContext};
/// use catena_core::StageResult;
/// use serde_json::json;
///
/// fn annotate<'a>(
///     request: &'a String,
///     response: String,
///     transport: &'a (),
///     ctx: &'a mut PipelineContext,
///     next: Next<'a, String, String, ()>,
/// ) -> BoxFuture<'a, StageResult<String>> {
///     ctx.insert_data("annotated", json!(true));
///     next.run(request, response, transport, ctx)
/// }
///
/// let middleware = FnMiddleware::new("annotate", annotate);
/// # let _ = middleware;
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a new function-based middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<T, Q, C, F> Middleware<T, Q, C> for FnMiddleware<F>
where
    F: for<'a> Fn(
            &'a T,
            Q,
            &'a C,
            &'a mut PipelineContext,
            Next<'a, T, Q, C>,
        ) -> BoxFuture<'a, StageResult<Q>>
        + Send
        + Sync
        + 'static,
    T: 'static,
    Q: 'static,
    C: 'static,
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
        (self.func)(request, response, transport, ctx, next)
    }
}
