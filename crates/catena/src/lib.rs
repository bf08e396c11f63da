//! # Catena
//!
//! Onion-style middleware chains for request handlers.
//!
//! A [`Chain`](middleware::Chain) runs an ordered list of stages around a
//! terminal handler. Each stage sees the request, the response-so-far, the
//! transport context and a per-run [`PipelineContext`](middleware::PipelineContext),
//! and decides whether to continue, short-circuit or fail. Failures are
//! resolved by the failing stage's own `on_error`, falling back to the
//! chain's default error handler, so a run always produces a result.
//!
//! ## Quick Start
//!
//! ```
//! use catena::prelude::*;
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
//!             std::future::ready(Ok::<_, StageError>(result))
//!         },
//!     ));
//!
//! # tokio_test::block_on(async {
//! let event = ApiGatewayProxyEvent::new("POST", "/people")
//!     .with_json_body(&json!({ "name": "Lucas", "age": 28 }));
//! let result = handle(&chain, event, LambdaContext::default()).await;
//!
//! assert_eq!(result.status_code, 200);
//! # });
//! ```
//!
//! ## Architecture
//!
//! ```text
//! event → stage 1 → stage 2 → … → handler
//!                                    ↓
//! result ← stage 1 ← stage 2 ← … ←───┘
//! ```
//!
//! | Crate | Contents |
//! |-------|----------|
//! | [`core`] | Stage errors and chain errors |
//! | [`middleware`] | `Chain`, `Middleware`, `Next`, handlers, `PipelineContext` |
//! | [`lambda`] | API Gateway types, the standard pipeline and its stages |
//! | [`config`] | Layered configuration |
//! | [`telemetry`] | Logging setup and metric names |

#![doc(html_root_url = "https://docs.rs/catena/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use catena_core as core;

// Re-export middleware types
pub use catena_middleware as middleware;

// Re-export the API Gateway adapter
pub use catena_lambda as lambda;

// Re-export configuration
pub use catena_config as config;

// Re-export telemetry
pub use catena_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```
/// use catena::prelude::*;
/// ```
pub mod prelude {
    pub use catena_core::{ChainError, ErrorKind, StageError, StageResult};

    pub use catena_middleware::{
        BoxFuture, Chain, ErrorHandler, FnErrorHandler, FnHandler, FnMiddleware, Handler,
        Middleware, Next, PipelineContext, RequestId, TracingMiddleware,
    };

    pub use catena_lambda::schema::{Attribute, Schema, ValidationMode};
    pub use catena_lambda::stages::{
        ContextData, HttpParameters, JsonBodyParser, ParsedItem, ResponseHeaders, Validator,
    };
    pub use catena_lambda::{
        handle, pipeline, pipeline_with, ApiGatewayProxyEvent, ApiGatewayProxyResult,
        DefaultErrorHandler, LambdaChain, LambdaContext,
    };

    pub use catena_config::{CatenaConfig, ConfigLoader};
    pub use catena_telemetry::{init_logging, LogConfig};
}
