//! Adds headers to the result on the way back out of the chain.

use crate::event::{ApiGatewayProxyEvent, ApiGatewayProxyResult};
use crate::LambdaContext;
use catena_core::StageResult;
use catena_middleware::{BoxFuture, Middleware, Next, PipelineContext};
use std::collections::BTreeMap;

/// Middleware that post-processes the result of the rest of the chain.
///
/// Headers already present on the result, in any letter case, are kept.
/// A result produced by an error handler further down is final and leaves
/// the chain without passing through this stage, so put headers every
/// error response needs on the chain's default response instead.
#[derive(Debug, Clone, Default)]
pub struct ResponseHeaders {
    headers: BTreeMap<String, String>,
}

impl ResponseHeaders {
    /// Creates a stage with no headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header to set.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

impl Middleware<ApiGatewayProxyEvent, ApiGatewayProxyResult, LambdaContext> for ResponseHeaders {
    fn name(&self) -> &'static str {
        "response_headers"
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
            let mut result = next.run(request, response, transport, ctx).await?;
            for (name, value) in &self.headers {
                if result.header(name).is_none() {
                    result.set_header(name.clone(), value.clone());
                }
            }
            Ok(result)
        })
    }
}
