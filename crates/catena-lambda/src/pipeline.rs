//! The standard API Gateway chain.
//!
//! [`pipeline`] builds a [`LambdaChain`] preloaded with the default error
//! handler and the default success response, ready for stages and a
//! terminal handler. [`handle`] is the adapter entry point that turns the
//! chain result into something the gateway can always serialize.

use crate::event::{ApiGatewayProxyEvent, ApiGatewayProxyResult, ACCESS_CONTROL_ALLOW_ORIGIN};
use crate::LambdaContext;
use catena_config::PipelineSection;
use catena_core::StageError;
use catena_middleware::{BoxFuture, Chain, ErrorHandler, PipelineContext};
use serde_json::json;

/// A chain over API Gateway proxy events.
pub type LambdaChain = Chain<ApiGatewayProxyEvent, ApiGatewayProxyResult, LambdaContext>;

const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// Builds a chain with the default settings.
///
/// - Errors no stage recovers from become `500 {"message":"Internal Server Error"}`.
/// - The first stage receives `200 {"message":"Success"}` with JSON and
///   CORS headers as its response-so-far.
///
/// ```
/// use catena_lambda::pipeline;
///
/// let chain = pipeline();
/// assert_eq!(chain.default_response().status_code, 200);
/// assert!(!chain.has_handler());
/// ```
#[must_use]
pub fn pipeline() -> LambdaChain {
    pipeline_with(&PipelineSection::default())
}

/// Builds a chain from pipeline settings.
#[must_use]
pub fn pipeline_with(settings: &PipelineSection) -> LambdaChain {
    Chain::new(
        DefaultErrorHandler::from_settings(settings),
        default_response(settings),
    )
}

/// Returns the response-so-far a chain built from `settings` starts with.
#[must_use]
pub fn default_response(settings: &PipelineSection) -> ApiGatewayProxyResult {
    ApiGatewayProxyResult::json(
        settings.success_status,
        &json!({ "message": settings.success_message }),
    )
    .with_header(ACCESS_CONTROL_ALLOW_ORIGIN, settings.cors_allow_origin.clone())
}

/// Runs `chain` for one invocation.
///
/// A misconfigured chain is logged and answered with a `500` result, so the
/// caller always gets a result it can return to the gateway.
pub async fn handle(
    chain: &LambdaChain,
    event: ApiGatewayProxyEvent,
    context: LambdaContext,
) -> ApiGatewayProxyResult {
    let request_id = context.aws_request_id.clone();
    match chain.run(event, context).await {
        Ok(result) => {
            tracing::debug!(request_id = %request_id, status = result.status_code, "invocation finished");
            result
        }
        Err(error) => {
            tracing::error!(
                request_id = %request_id,
                error.name = error.name(),
                error = %error,
                "chain is misconfigured"
            );
            ApiGatewayProxyResult::json(500, &json!({ "message": INTERNAL_SERVER_ERROR }))
        }
    }
}

/// The default error handler of a [`LambdaChain`].
///
/// Logs the failure and answers with a generic `500` result. The stage
/// error is only included in the body when `expose_internal_errors` is set.
#[derive(Debug, Clone)]
pub struct DefaultErrorHandler {
    message: String,
    expose_internal_errors: bool,
}

impl DefaultErrorHandler {
    /// Creates a handler answering with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            expose_internal_errors: false,
        }
    }

    /// Creates a handler from pipeline settings.
    #[must_use]
    pub fn from_settings(settings: &PipelineSection) -> Self {
        Self {
            message: settings.internal_error_message.clone(),
            expose_internal_errors: settings.expose_internal_errors,
        }
    }

    /// Includes the stage error in the result body.
    #[must_use]
    pub const fn expose_internal_errors(mut self, expose: bool) -> Self {
        self.expose_internal_errors = expose;
        self
    }
}

impl Default for DefaultErrorHandler {
    fn default() -> Self {
        Self::new(INTERNAL_SERVER_ERROR)
    }
}

impl ErrorHandler<ApiGatewayProxyEvent, ApiGatewayProxyResult, LambdaContext> for DefaultErrorHandler {
    fn handle<'a>(
        &'a self,
        _request: &'a ApiGatewayProxyEvent,
        _response: &'a ApiGatewayProxyResult,
        transport: &'a LambdaContext,
        _ctx: &'a PipelineContext,
        error: StageError,
    ) -> BoxFuture<'a, ApiGatewayProxyResult> {
        tracing::error!(
            request_id = %transport.aws_request_id,
            error.code = error.code(),
            error.kind = %error.kind(),
            error = ?error,
            "unhandled stage failure"
        );

        let body = if self.expose_internal_errors {
            json!({
                "message": self.message,
                "error": error.code(),
                "detail": error.message(),
            })
        } else {
            json!({ "message": self.message })
        };

        Box::pin(async move { ApiGatewayProxyResult::json(500, &body) })
    }
}
