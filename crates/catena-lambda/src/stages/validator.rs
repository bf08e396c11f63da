//! Schema validation middleware.
//!
//! Validates the parsed body held in the context against a [`Schema`] and
//! stores the parsed item as a [`ParsedItem`] extension. Place it after
//! [`JsonBodyParser`](super::JsonBodyParser).

use crate::event::{ApiGatewayProxyEvent, ApiGatewayProxyResult};
use crate::schema::{Schema, SchemaError, ValidationMode};
use crate::LambdaContext;
use catena_core::{ErrorKind, StageError, StageResult};
use catena_middleware::{BoxFuture, Middleware, Next, PipelineContext};
use serde_json::{json, Value};

/// Codes answered with a `400` result.
const KNOWN_CODES: [&str; 4] = [
    "MissingAttribute",
    "InvalidAttribute",
    "CustomValidation",
    "InvalidItem",
];

/// The item produced by a successful validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedItem {
    item: Value,
    mode: ValidationMode,
}

impl ParsedItem {
    /// Returns the parsed item.
    #[must_use]
    pub const fn item(&self) -> &Value {
        &self.item
    }

    /// Returns the mode the item was parsed in.
    #[must_use]
    pub const fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Returns a single attribute of the item.
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.item.get(attribute)
    }
}

/// Middleware that validates the request body.
///
/// # Example
///
/// ```
/// use catena_lambda::schema::{Attribute, Schema, ValidationMode};
/// use catena_lambda::stages::Validator;
///
/// let schema = Schema::builder()
///     .attribute("name", Attribute::string().required())
///     .build();
/// let validator = Validator::new(schema, ValidationMode::Put);
/// assert_eq!(validator.mode(), ValidationMode::Put);
/// ```
#[derive(Debug, Clone)]
pub struct Validator {
    schema: Schema,
    mode: ValidationMode,
}

impl Validator {
    /// Creates a validator for `schema` in `mode`.
    #[must_use]
    pub const fn new(schema: Schema, mode: ValidationMode) -> Self {
        Self { schema, mode }
    }

    /// Returns the validation mode.
    #[must_use]
    pub const fn mode(&self) -> ValidationMode {
        self.mode
    }

    fn validate(&self, ctx: &PipelineContext) -> StageResult<Value> {
        let body = ctx.body().ok_or_else(|| {
            StageError::validation("InvalidItem", "No request body to validate")
        })?;
        self.schema.parse(body, self.mode).map_err(|error: SchemaError| {
            tracing::debug!(
                stage = "validator",
                error.code = error.code(),
                path = error.path().unwrap_or_default(),
                "item rejected"
            );
            StageError::from(error)
        })
    }
}

impl Middleware<ApiGatewayProxyEvent, ApiGatewayProxyResult, LambdaContext> for Validator {
    fn name(&self) -> &'static str {
        "validator"
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
            let item = self.validate(ctx)?;
            ctx.set_extension(ParsedItem {
                item,
                mode: self.mode,
            });
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
        let known = error.kind() == ErrorKind::Validation && KNOWN_CODES.contains(&error.code());
        let result = if known {
            ApiGatewayProxyResult::json(
                400,
                &json!({
                    "error": error.code(),
                    "message": error.message(),
                    "path": error.path(),
                }),
            )
        } else {
            ApiGatewayProxyResult::json(
                500,
                &json!({
                    "error": "UnknownError",
                    "message": "An unknown error occurred.",
                }),
            )
        };

        Some(Box::pin(async move { result }))
    }
}
