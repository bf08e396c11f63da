//! # Catena Middleware
//!
//! Onion-model middleware chain for the Catena framework.
//!
//! A [`Chain`] runs an ordered list of [`Middleware`] stages around a
//! terminal [`Handler`]. Each stage receives a [`Next`] continuation and
//! decides whether to call it:
//!
//! ```text
//! run → M1 → M2 → … → Mn → Handler
//!        ↑    ↑         ↑      │
//!        └────┴── after ┴──────┘
//! ```
//!
//! - Stages run in registration order on the way down and in reverse order
//!   on the way back up.
//! - A stage that returns without calling `next` short-circuits the rest
//!   of the chain.
//! - A stage that fails is recovered by its own [`Middleware::on_error`],
//!   or by the chain's default [`ErrorHandler`] when it declares none.
//!   Exactly one error handler runs per failure.
//! - A [`PipelineContext`] is created fresh for every run and only ever
//!   grows.
//!
//! ## Example
//!
//! ```
//! use catena_middleware::{
//!     BoxFuture, Chain, FnErrorHandler, FnHandler, Middleware, Next, PipelineContext,
//! };
//! use catena_core::{StageError, StageResult};
//! use serde_json::json;
//!
//! struct Annotate;
//!
//! impl Middleware<String, String, ()> for Annotate {
//!     fn name(&self) -> &'static str {
//!         "annotate"
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
//!         ctx.insert_data("testing", json!(true));
//!         next.run(request, response, transport, ctx)
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let chain = Chain::new(
//!     FnErrorHandler::new(|_: &String, _: &String, _: &(), _: &PipelineContext, _: StageError| async {
//!         "Internal Server Error".to_string()
//!     }),
//!     String::new(),
//! )
//! .with(Annotate)
//! .handler(FnHandler::new(|_: &String, _: String, _: &(), ctx: &PipelineContext| {
//!     let testing = ctx.data_value("testing").cloned();
//!     async move { Ok::<_, StageError>(format!("testing={}", testing.unwrap_or_default())) }
//! }));
//!
//! assert_eq!(chain.run("req".to_string(), ()).await.unwrap(), "testing=true");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/catena-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod context;
pub mod handler;
pub mod middleware;
pub mod stages;

pub use chain::Chain;
pub use context::PipelineContext;
pub use handler::{ErrorHandler, FnErrorHandler, FnHandler, Handler};
pub use middleware::{BoxFuture, BoxedMiddleware, FnMiddleware, Middleware, Next};
pub use stages::{RequestId, TracingMiddleware};
