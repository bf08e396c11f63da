//! Merges a fixed value into the context data slot.

use crate::event::{ApiGatewayProxyEvent, ApiGatewayProxyResult};
use crate::LambdaContext;
use catena_core::StageResult;
use catena_middleware::{BoxFuture, Middleware, Next, PipelineContext};
use serde_json::Value;

/// Middleware that annotates every run with a fixed data entry.
///
/// ```
/// use catena_lambda::stages::ContextData;
/// use serde_json::json;
///
/// let stage = ContextData::new("testing", json!(true));
/// assert_eq!(stage.key(), "testing");
/// ```
#[derive(Debug, Clone)]
pub struct ContextData {
    key: String,
    value: Value,
}

impl ContextData {
    /// Creates a stage that merges `value` under `key`.
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Returns the data key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Middleware<ApiGatewayProxyEvent, ApiGatewayProxyResult, LambdaContext> for ContextData {
    fn name(&self) -> &'static str {
        "context_data"
    }

    fn run<'a>(
        &'a self,
        request: &'a ApiGatewayProxyEvent,
        response: ApiGatewayProxyResult,
        transport: &'a LambdaContext,
        ctx: &'a mut PipelineContext,
        next: Next<'a, ApiGatewayProxyEvent, ApiGatewayProxyResult, LambdaContext>,
    ) -> BoxFuture<'a, StageResult<ApiGatewayProxyResult>> {
        ctx.insert_data(self.key.clone(), self.value.clone());
        next.run(request, response, transport, ctx)
    }
}
