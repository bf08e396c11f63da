//! JSON body parser middleware.
//!
//! Parses the raw event body and merges it into the context body so later
//! stages and the terminal handler can read it with
//! [`PipelineContext::body`].

use crate::event::{ApiGatewayProxyEvent, ApiGatewayProxyResult};
use crate::LambdaContext;
use catena_core::{ErrorKind, StageError, StageResult};
use catena_middleware::{BoxFuture, Middleware, Next, PipelineContext};
use serde_json::json;

/// Error code raised when the event carries no body.
pub const EMPTY_BODY_ERROR: &str = "EmptyBodyError";

/// Error code raised when the body is not valid JSON.
pub const SYNTAX_ERROR: &str = "SyntaxError";

const EMPTY_BODY_MESSAGE: &str = "The request body is empty.";
const INVALID_JSON_MESSAGE: &str = "Invalid JSON format in the request body.";

/// Middleware that parses a JSON request body.
///
/// An absent or empty body fails with `EmptyBodyError`; malformed JSON
/// fails with `SyntaxError`. Both are answered with a `400` result.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBodyParser;

impl JsonBodyParser {
    /// Creates the parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Middleware<ApiGatewayProxyEvent, ApiGatewayProxyResult, LambdaContext> for JsonBodyParser {
    fn name(&self) -> &'static str {
        "json_body_parser"
    }

    fn run<'a>(
        &'a self,
        request: &'a ApiGatewayProxyEvent,
        response: ApiGatewayProxyResult,
        transport: &'a LambdaContext,
        ctx: &'a mut PipelineContext,
        next: Next<'a, ApiGatewayProxyEvent, ApiGatewayProxyResult, LambdaContext>,
    ) -> BoxFuture<'a, StageResult<ApiGatewayProxyResult>> {
        Box::pin(async move {
            let raw = request
                .body
                .as_deref()
                .filter(|body| !body.is_empty())
                .ok_or_else(|| StageError::parse(EMPTY_BODY_ERROR, EMPTY_BODY_MESSAGE))?;

            let body: serde_json::Value = serde_json::from_str(raw)?;
            ctx.merge_json(json!({ "body": body }));

            next.run(request, response, transport, ctx).await
        })
    }

    fn on_error<'a>(
        &'a self,
        _request: &'a ApiGatewayProxyEvent,
        _response: &'a ApiGatewayProxyResult,
        _transport: &'a LambdaContext,
        _ctx: &'a PipelineContext,
        error: &'a StageError,
    ) -> Option<BoxFuture<'a, ApiGatewayProxyResult>> {
        // Downstream failures are left to the default error handler.
        if error.kind() != ErrorKind::Parse {
            return None;
        }

        let body = if error.is_code(EMPTY_BODY_ERROR) {
            json!({ "error": EMPTY_BODY_ERROR, "message": error.message() })
        } else {
            json!({ "error": SYNTAX_ERROR, "message": INVALID_JSON_MESSAGE })
        };

        Some(Box::pin(async move { ApiGatewayProxyResult::json(400, &body) }))
    }
}
