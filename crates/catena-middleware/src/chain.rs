//! The chain orchestrator.
//!
//! A [`Chain`] holds the ordered middleware list, the terminal handler, the
//! default error handler and the default response. It is immutable while
//! running: `run` takes `&self` and builds a fresh [`PipelineContext`] and
//! continuation for every call, so one chain can serve any number of
//! concurrent runs.
//!
//! # Example
//!
//! ```
//! use catena_middleware::{Chain, FnErrorHandler, FnHandler, PipelineContext};
//! use catena_core::StageError;
//!
//! # tokio_test::block_on(async {
//! let chain = Chain::new(
//!     FnErrorHandler::new(|_: &String, _: &String, _: &(), _: &PipelineContext, _: StageError| async {
//!         "failed".to_string()
//!     }),
//!     String::from("default"),
//! )
//! .handler(FnHandler::new(|request: &String, _: String, _: &(), _: &PipelineContext| {
//!     let reply = format!("hello {request}");
//!     async move { Ok::<_, StageError>(reply) }
//! }));
//!
//! let result = chain.run("world".to_string(), ()).await.unwrap();
//! assert_eq!(result, "hello world");
//! # });
//! ```

use crate::context::PipelineContext;
use crate::handler::{ErrorHandler, Handler};
use crate::middleware::{BoxedMiddleware, Middleware, Next, Resolved};
use catena_core::ChainError;
use std::fmt;
use std::sync::Arc;

/// An ordered middleware chain with a terminal handler.
pub struct Chain<T, Q, C> {
    middlewares: Vec<BoxedMiddleware<T, Q, C>>,
    handler: Option<Arc<dyn Handler<T, Q, C>>>,
    error_handler: Arc<dyn ErrorHandler<T, Q, C>>,
    default_response: Q,
}

impl<T, Q, C> Chain<T, Q, C>
where
    T: Send + Sync + 'static,
    Q: Clone + Send + Sync + 'static,
    C: Send + Sync + 'static,
{
    /// Creates an empty chain.
    ///
    /// `error_handler` resolves any stage failure that the failing stage
    /// does not recover from. `default_response` is the response-so-far the
    /// first stage receives.
    pub fn new<E>(error_handler: E, default_response: Q) -> Self
    where
        E: ErrorHandler<T, Q, C>,
    {
        Self {
            middlewares: Vec::new(),
            handler: None,
            error_handler: Arc::new(error_handler),
            default_response,
        }
    }

    /// Appends a middleware to the chain.
    ///
    /// Stages run in the order they were added.
    #[must_use]
    pub fn with<M>(self, middleware: M) -> Self
    where
        M: Middleware<T, Q, C>,
    {
        self.with_arc(Arc::new(middleware))
    }

    /// Appends an already shared middleware to the chain.
    #[must_use]
    pub fn with_arc(mut self, middleware: BoxedMiddleware<T, Q, C>) -> Self {
        tracing::trace!(
            stage = middleware.name(),
            position = self.middlewares.len(),
            "registering stage"
        );
        self.middlewares.push(middleware);
        self
    }

    /// Sets the terminal handler.
    ///
    /// Calling this again replaces the previous handler.
    #[must_use]
    pub fn handler<H>(mut self, handler: H) -> Self
    where
        H: Handler<T, Q, C>,
    {
        if self.handler.is_some() {
            tracing::debug!("replacing terminal handler");
        }
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Returns the names of the registered stages in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.middlewares.iter().map(|m| m.name()).collect()
    }

    /// Returns the number of registered stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.middlewares.len()
    }

    /// Returns `true` if a terminal handler is registered.
    #[must_use]
    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Returns the default response handed to the first stage.
    #[must_use]
    pub fn default_response(&self) -> &Q {
        &self.default_response
    }

    /// Runs the chain for one request.
    ///
    /// Every stage failure is resolved into a normal result by the failing
    /// stage's `on_error` or the default error handler. That result is
    /// returned as is, without passing back through the stages that
    /// enclose the failing one. The only error
    /// this returns is [`ChainError::HandlerNotDefined`], raised before any
    /// middleware runs.
    pub async fn run(&self, request: T, transport: C) -> Result<Q, ChainError> {
        let Some(handler) = self.handler.as_deref() else {
            tracing::error!(stages = self.middlewares.len(), "run without a terminal handler");
            metrics::counter!("catena_chain_runs_total", "outcome" => "misconfigured").increment(1);
            return Err(ChainError::HandlerNotDefined);
        };

        let mut ctx = PipelineContext::new();
        let next = Next::new(&self.middlewares, handler, self.error_handler.as_ref());

        let outcome = next
            .run(&request, self.default_response.clone(), &transport, &mut ctx)
            .await;

        let result = match (outcome, ctx.take_extension::<Resolved<Q>>()) {
            (_, Some(Resolved(result))) => {
                metrics::counter!("catena_chain_runs_total", "outcome" => "recovered").increment(1);
                result
            }
            (Ok(result), None) => {
                metrics::counter!("catena_chain_runs_total", "outcome" => "completed").increment(1);
                result
            }
            (Err(error), None) => {
                tracing::warn!(
                    stage = "handler",
                    error.code = error.code(),
                    error.kind = %error.kind(),
                    "terminal handler failed"
                );
                metrics::counter!("catena_chain_runs_total", "outcome" => "recovered").increment(1);
                self.error_handler
                    .handle(&request, &self.default_response, &transport, &ctx, error)
                    .await
            }
        };

        tracing::debug!(
            stages = self.middlewares.len(),
            duration_ms = u64::try_from(ctx.elapsed().as_millis()).unwrap_or(u64::MAX),
            "chain run finished"
        );

        Ok(result)
    }
}

impl<T, Q: Clone, C> Clone for Chain<T, Q, C> {
    fn clone(&self) -> Self {
        Self {
            middlewares: self.middlewares.clone(),
            handler: self.handler.clone(),
            error_handler: Arc::clone(&self.error_handler),
            default_response: self.default_response.clone(),
        }
    }
}

impl<T: 'static, Q: 'static, C: 'static> fmt::Debug for Chain<T, Q, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field(
                "stages",
                &self.middlewares.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .field("has_handler", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{FnErrorHandler, FnHandler};
    use crate::middleware::BoxFuture;
    use catena_core::{StageError, StageResult};
    use serde_json::json;
    use std::sync::Mutex;

    type Req = String;
    type Res = String;
    type Log = Arc<Mutex<Vec<String>>>;

    /// Records "before" and "after" events around `next`.
    struct OrderTracking {
        name: &'static str,
        log: Log,
    }

    impl Middleware<Req, Res, ()> for OrderTracking {
        fn name(&self) -> &'static str {
            self.name
        }

        fn run<'a>(
            &'a self,
            request: &'a Req,
            response: Res,
            transport: &'a (),
            ctx: &'a mut PipelineContext,
            next: Next<'a, Req, Res, ()>,
        ) -> BoxFuture<'a, StageResult<Res>> {
            Box::pin(async move {
                self.log.lock().unwrap().push(format!("{}:before", self.name));
                ctx.insert_data(self.name, json!(true));
                let result = next.run(request, response, transport, ctx).await?;
                self.log.lock().unwrap().push(format!("{}:after", self.name));
                Ok(result)
            })
        }
    }

    struct ShortCircuit;

    impl Middleware<Req, Res, ()> for ShortCircuit {
        fn name(&self) -> &'static str {
            "short_circuit"
        }

        fn run<'a>(
            &'a self,
            _request: &'a Req,
            _response: Res,
            _transport: &'a (),
            _ctx: &'a mut PipelineContext,
            _next: Next<'a, Req, Res, ()>,
        ) -> BoxFuture<'a, StageResult<Res>> {
            Box::pin(async { Ok("short-circuited".to_string()) })
        }
    }

    /// Fails and recovers with a fixed value.
    struct Recovers;

    impl Middleware<Req, Res, ()> for Recovers {
        fn name(&self) -> &'static str {
            "recovers"
        }

        fn run<'a>(
            &'a self,
            _request: &'a Req,
            _response: Res,
            _transport: &'a (),
            _ctx: &'a mut PipelineContext,
            _next: Next<'a, Req, Res, ()>,
        ) -> BoxFuture<'a, StageResult<Res>> {
            Box::pin(async { Err(StageError::validation("MissingAttribute", "missing")) })
        }

        fn on_error<'a>(
            &'a self,
            _request: &'a Req,
            _response: &'a Res,
            _transport: &'a (),
            _ctx: &'a PipelineContext,
            _error: &'a StageError,
        ) -> Option<BoxFuture<'a, Res>> {
            Some(Box::pin(async { "recovered".to_string() }))
        }
    }

    type TestChain = Chain<Req, Res, ()>;

    fn fallback() -> impl ErrorHandler<Req, Res, ()> {
        FnErrorHandler::new(
            |_: &Req, _: &Res, _: &(), _: &PipelineContext, error: StageError| {
                std::future::ready(format!("default:{}", error.code()))
            },
        )
    }

    fn echo(log: Log) -> impl Handler<Req, Res, ()> {
        FnHandler::new(move |request: &Req, response: Res, _: &(), ctx: &PipelineContext| {
            log.lock().unwrap().push("handler".to_string());
            let reply = format!("{response}{request}:{}", ctx.data().len());
            std::future::ready(Ok::<_, StageError>(reply))
        })
    }

    fn tracker(name: &'static str, log: &Log) -> OrderTracking {
        OrderTracking {
            name,
            log: Arc::clone(log),
        }
    }

    #[tokio::test]
    async fn test_run_without_handler_fails() {
        let log = Log::default();
        let chain = TestChain::new(fallback(), String::new()).with(tracker("first", &log));

        let error = chain.run("req".to_string(), ()).await.unwrap_err();

        assert_eq!(error, ChainError::HandlerNotDefined);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_chain_runs_handler() {
        let log = Log::default();
        let chain = TestChain::new(fallback(), "so-far:".to_string()).handler(echo(Arc::clone(&log)));

        let result = chain.run("req".to_string(), ()).await.unwrap();

        assert_eq!(result, "so-far:req:0");
        assert_eq!(*log.lock().unwrap(), vec!["handler"]);
    }

    #[tokio::test]
    async fn test_onion_order() {
        let log = Log::default();
        let chain = TestChain::new(fallback(), String::new())
            .with(tracker("first", &log))
            .with(tracker("second", &log))
            .handler(echo(Arc::clone(&log)));

        let result = chain.run("req".to_string(), ()).await.unwrap();

        assert_eq!(result, "req:2");
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "first:before",
                "second:before",
                "handler",
                "second:after",
                "first:after"
            ]
        );
    }

    #[tokio::test]
    async fn test_short_circuit_skips_rest() {
        let log = Log::default();
        let chain = TestChain::new(fallback(), String::new())
            .with(tracker("first", &log))
            .with(ShortCircuit)
            .with(tracker("never", &log))
            .handler(echo(Arc::clone(&log)));

        let result = chain.run("req".to_string(), ()).await.unwrap();

        assert_eq!(result, "short-circuited");
        assert_eq!(*log.lock().unwrap(), vec!["first:before", "first:after"]);
    }

    #[tokio::test]
    async fn test_recovered_result_is_returned_unchanged() {
        let log = Log::default();
        let chain = TestChain::new(fallback(), String::new())
            .with(tracker("outer", &log))
            .with(Recovers)
            .with(tracker("never", &log))
            .handler(echo(Arc::clone(&log)));

        for _ in 0..2 {
            log.lock().unwrap().clear();
            assert_eq!(chain.run("req".to_string(), ()).await.unwrap(), "recovered");
            assert_eq!(*log.lock().unwrap(), vec!["outer:before"]);
        }
    }

    #[tokio::test]
    async fn test_terminal_failure_without_stages_uses_default() {
        let chain = TestChain::new(fallback(), String::new()).handler(FnHandler::new(
            |_: &Req, _: Res, _: &(), _: &PipelineContext| {
                std::future::ready(Err::<Res, _>(StageError::internal("boom")))
            },
        ));

        let result = chain.run("req".to_string(), ()).await.unwrap();
        assert_eq!(result, "default:InternalError");
    }

    #[tokio::test]
    async fn test_handler_last_writer_wins() {
        let log = Log::default();
        let chain = TestChain::new(fallback(), String::new())
            .handler(FnHandler::new(|_: &Req, _: Res, _: &(), _: &PipelineContext| {
                std::future::ready(Ok::<_, StageError>("first".to_string()))
            }))
            .handler(echo(Arc::clone(&log)));

        assert!(chain.has_handler());
        assert_eq!(chain.run("req".to_string(), ()).await.unwrap(), "req:0");
    }

    #[tokio::test]
    async fn test_stage_introspection() {
        let log = Log::default();
        let chain = TestChain::new(fallback(), "default".to_string())
            .with(tracker("first", &log))
            .with(ShortCircuit);

        assert_eq!(chain.stage_count(), 2);
        assert_eq!(chain.stage_names(), vec!["first", "short_circuit"]);
        assert_eq!(chain.default_response(), "default");
        assert!(!chain.has_handler());
        assert!(format!("{chain:?}").contains("short_circuit"));
    }

    #[test]
    fn test_debug_lists_stages_and_handler() {
        let log = Log::default();
        let chain = TestChain::new(fallback(), String::new())
            .with(tracker("first", &log))
            .handler(echo(Arc::clone(&log)));

        let debug = format!("{chain:?}");
        assert!(debug.starts_with("Chain"));
        assert!(debug.contains("[\"first\"]"));
        assert!(debug.contains("has_handler: true"));
    }

    #[tokio::test]
    async fn test_concurrent_runs_share_nothing() {
        let log = Log::default();
        let chain = Arc::new(
            TestChain::new(fallback(), String::new())
                .with(tracker("first", &log))
                .handler(echo(Arc::clone(&log))),
        );

        let mut tasks = Vec::new();
        for i in 0..8 {
            let chain = Arc::clone(&chain);
            tasks.push(tokio::spawn(async move {
                chain.run(format!("req{i}"), ()).await.unwrap()
            }));
        }

        for (i, task) in tasks.into_iter().enumerate() {
            assert_eq!(task.await.unwrap(), format!("req{i}:1"));
        }
    }
}
