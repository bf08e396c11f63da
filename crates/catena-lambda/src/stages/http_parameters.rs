//! Copies request parameters into the context.

use crate::event::{ApiGatewayProxyEvent, ApiGatewayProxyResult};
use crate::LambdaContext;
use catena_core::StageResult;
use catena_middleware::{BoxFuture, Middleware, Next, PipelineContext};

/// Middleware that exposes query string and path parameters through the
/// context. It never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpParameters;

impl HttpParameters {
    /// Creates the stage.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Middleware<ApiGatewayProxyEvent, ApiGatewayProxyResult, LambdaContext> for HttpParameters {
    fn name(&self) -> &'static str {
        "http_parameters"
    }

    fn run<'a>(
        &'a self,
        request: &'a ApiGatewayProxyEvent,
        response: ApiGatewayProxyResult,
        transport: &'a LambdaContext,
        ctx: &'a mut PipelineContext,
        next: Next<'a, ApiGatewayProxyEvent, ApiGatewayProxyResult, LambdaContext>,
    ) -> BoxFuture<'a, StageResult<ApiGatewayProxyResult>> {
        if let Some(params) = &request.query_string_parameters {
            ctx.merge_query_string_parameters(params.clone());
        }
        if let Some(params) = &request.path_parameters {
            ctx.merge_path_parameters(params.clone());
        }

        next.run(request, response, transport, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::pipeline;
    use catena_core::StageError;
    use catena_middleware::FnHandler;
    use serde_json::json;

    fn chain() -> crate::LambdaChain {
        pipeline().with(HttpParameters::new()).handler(FnHandler::new(
            |_: &ApiGatewayProxyEvent, _: ApiGatewayProxyResult, _: &LambdaContext, ctx: &PipelineContext| {
                let body = json!({
                    "query": ctx.query_string_parameters(),
                    "path": ctx.path_parameters(),
                });
                std::future::ready(Ok::<_, StageError>(ApiGatewayProxyResult::ok_json(&body)))
            },
        ))
    }

    #[tokio::test]
    async fn test_copies_parameters() {
        let event = ApiGatewayProxyEvent::new("GET", "/accounts/NAT")
            .with_query_parameter("page", "2")
            .with_path_parameter("id", "NAT");

        let result = chain().run(event, LambdaContext::default()).await.unwrap();
        let body = result.body_json().unwrap();

        assert_eq!(body["query"], json!({ "page": "2" }));
        assert_eq!(body["path"], json!({ "id": "NAT" }));
    }

    #[tokio::test]
    async fn test_absent_parameters_stay_absent() {
        let event = ApiGatewayProxyEvent::new("GET", "/accounts");

        let result = chain().run(event, LambdaContext::default()).await.unwrap();
        let body = result.body_json().unwrap();

        assert!(body["query"].is_null());
        assert!(body["path"].is_null());
    }
}
