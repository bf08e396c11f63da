//! # Catena Lambda
//!
//! API Gateway proxy adapter for Catena chains.
//!
//! This crate fixes the chain's request, result and transport types to the
//! API Gateway proxy integration and ships the middleware suite most
//! functions start with:
//!
//! ```text
//! event → JsonBodyParser → Validator(schema, mode) → handler → result
//! ```
//!
//! ## Example
//!
//! ```
//! use catena_lambda::schema::{Attribute, Schema, ValidationMode};
//! use catena_lambda::stages::{JsonBodyParser, Validator};
//! use catena_lambda::{handle, pipeline, ApiGatewayProxyEvent, ApiGatewayProxyResult, LambdaContext};
//! use catena_middleware::{FnHandler, PipelineContext};
//! use catena_core::StageError;
//! use serde_json::json;
//!
//! let schema = Schema::builder()
//!     .attribute("name", Attribute::string().required())
//!     .attribute("age", Attribute::number().required())
//!     .build();
//!
//! let chain = pipeline()
//!     .with(JsonBodyParser::new())
//!     .with(Validator::new(schema, ValidationMode::Put))
//!     .handler(FnHandler::new(
//!         |_: &ApiGatewayProxyEvent, _: ApiGatewayProxyResult, _: &LambdaContext, _: &PipelineContext| {
//!             let result = ApiGatewayProxyResult::ok_json(&json!({ "message": "emitted by lambda handler" }));
//!             async move { Ok::<_, StageError>(result) }
//!         },
//!     ));
//!
//! # tokio_test::block_on(async {
//! let event = ApiGatewayProxyEvent::new("POST", "/people")
//!     .with_json_body(&json!({ "name": "Lucas" }));
//! let result = handle(&chain, event, LambdaContext::default()).await;
//!
//! assert_eq!(result.status_code, 400);
//! assert_eq!(result.body_json().unwrap()["error"], "MissingAttribute");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/catena-lambda/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod event;
pub mod pipeline;
pub mod schema;
pub mod stages;

pub use context::LambdaContext;
pub use event::{ApiGatewayProxyEvent, ApiGatewayProxyResult};
pub use pipeline::{default_response, handle, pipeline, pipeline_with, DefaultErrorHandler, LambdaChain};
