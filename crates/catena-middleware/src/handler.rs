//! Terminal handler and default error handler traits.
//!
//! The terminal [`Handler`] is the core of the onion. It sees the context
//! after every middleware ran its "before" half and produces the result that
//! travels back out through the stages.
//!
//! The [`ErrorHandler`] is the chain-wide fallback for a stage failure that
//! the failing stage does not recover from itself.

use crate::context::PipelineContext;
use crate::middleware::BoxFuture;
use catena_core::{StageError, StageResult};
use std::future::Future;

/// The terminal handler of a chain.
pub trait Handler<T, Q, C>: Send + Sync + 'static {
    /// Produces the result for a request.
    ///
    /// `response` is the response-so-far handed down by the last middleware.
    fn call<'a>(
        &'a self,
        request: &'a T,
        response: Q,
        transport: &'a C,
        ctx: &'a PipelineContext,
    ) -> BoxFuture<'a, StageResult<Q>>;
}

/// The chain-wide default error handler.
pub trait ErrorHandler<T, Q, C>: Send + Sync + 'static {
    /// Turns a stage failure into a result.
    fn handle<'a>(
        &'a self,
        request: &'a T,
        response: &'a Q,
        transport: &'a C,
        ctx: &'a PipelineContext,
        error: StageError,
    ) -> BoxFuture<'a, Q>;
}

/// A terminal handler built from a closure.
///
/// The returned future must not borrow the arguments; clone what it needs
/// before the `async` block.
///
/// ```
/// use catena_middleware::{FnHandler, PipelineContext};
/// use catena_core::StageError;
///
/// let handler = FnHandler::new(|request: &String, response: String, _: &(), _ctx: &PipelineContext| {
///     let reply = format!("{response}{request}");
///     async move { Ok::<_, StageError>(reply) }
/// });
/// # let _ = handler;
/// ```
pub struct FnHandler<F> {
    func: F,
}

impl<F> FnHandler<F> {
    /// Wraps a closure as a terminal handler.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<T, Q, C, F, Fut> Handler<T, Q, C> for FnHandler<F>
where
    T: Send + Sync + 'static,
    Q: Send + 'static,
    C: Send + Sync + 'static,
    F: Fn(&T, Q, &C, &PipelineContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StageResult<Q>> + Send + 'static,
{
    fn call<'a>(
        &'a self,
        request: &'a T,
        response: Q,
        transport: &'a C,
        ctx: &'a PipelineContext,
    ) -> BoxFuture<'a, StageResult<Q>> {
        Box::pin((self.func)(request, response, transport, ctx))
    }
}

/// A default error handler built from a closure.
pub struct FnErrorHandler<F> {
    func: F,
}

impl<F> FnErrorHandler<F> {
    /// Wraps a closure as a default error handler.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<T, Q, C, F, Fut> ErrorHandler<T, Q, C> for FnErrorHandler<F>
where
    T: Send + Sync + 'static,
    Q: Send + Sync + 'static,
    C: Send + Sync + 'static,
    F: Fn(&T, &Q, &C, &PipelineContext, StageError) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Q> + Send + 'static,
{
    fn handle<'a>(
        &'a self,
        request: &'a T,
        response: &'a Q,
        transport: &'a C,
        ctx: &'a PipelineContext,
        error: StageError,
    ) -> BoxFuture<'a, Q> {
        Box::pin((self.func)(request, response, transport, ctx, error))
    }
}
