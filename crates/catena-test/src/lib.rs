//! # Catena Test
//!
//! Test utilities for Catena chains.
//!
//! - **Fixtures**: mock invocation contexts and API Gateway events
//! - **Assertions**: chainable checks on chain results
//! - **Trace**: records stage entry and exit to assert onion ordering
//!
//! ## Example
//!
//! ```
//! use catena_lambda::stages::JsonBodyParser;
//! use catena_lambda::{handle, pipeline};
//! use catena_middleware::FnHandler;
//! use catena_test::{mock_context, mock_event, ResponseAssertions};
//! # use catena_core::StageError;
//! # use catena_lambda::{ApiGatewayProxyEvent, ApiGatewayProxyResult, LambdaContext};
//! # use catena_middleware::PipelineContext;
//!
//! let chain = pipeline()
//!     .with(JsonBodyParser::new())
//!     .handler(FnHandler::new(
//!         |_: &ApiGatewayProxyEvent, response: ApiGatewayProxyResult, _: &LambdaContext, _: &PipelineContext| {
//!             std::future::ready(Ok::<_, StageError>(response))
//!         },
//!     ));
//!
//! # tokio_test::block_on(async {
//! handle(&chain, mock_event(), mock_context())
//!     .await
//!     .assert_status(400)
//!     .assert_error_code("EmptyBodyError");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/catena-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod assertions;
mod fixtures;
mod trace;

pub use assertions::ResponseAssertions;
pub use fixtures::{mock_context, mock_context_at, mock_event, mock_json_event, MOCK_REMAINING_MS};
pub use trace::{Trace, TraceStage};
