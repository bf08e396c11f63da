//! Mock invocations.
//!
//! The values mirror what the runtime hands a function named
//! `myLambdaFunction` deployed at `$LATEST`.

use catena_lambda::{ApiGatewayProxyEvent, LambdaContext};
use serde_json::Value;

/// Time left when a mock invocation starts, in milliseconds.
pub const MOCK_REMAINING_MS: u64 = 30_000;

/// Returns the context of a mock invocation.
///
/// # Example
///
/// ```
/// use catena_test::mock_context;
///
/// let context = mock_context();
/// assert_eq!(context.function_name, "myLambdaFunction");
/// ```
#[must_use]
pub fn mock_context() -> LambdaContext {
    LambdaContext {
        function_name: "myLambdaFunction".to_string(),
        function_version: "$LATEST".to_string(),
        invoked_function_arn: "arn:aws:lambda:us-east-1:123456789012:function:myLambdaFunction"
            .to_string(),
        memory_limit_in_mb: "128".to_string(),
        aws_request_id: "c9d89b7e-xmpl-46b7-8967-50f1d6e51560".to_string(),
        log_group_name: "/aws/lambda/myLambdaFunction".to_string(),
        log_stream_name: "2024/08/14/[$LATEST]abcdef1234567890abcdef1234567890".to_string(),
        deadline_ms: None,
    }
}

/// Returns [`mock_context`] with a deadline [`MOCK_REMAINING_MS`] after `now_ms`.
#[must_use]
pub fn mock_context_at(now_ms: u64) -> LambdaContext {
    mock_context().with_deadline_ms(now_ms.saturating_add(MOCK_REMAINING_MS))
}

/// Returns a `POST /` event without a body.
#[must_use]
pub fn mock_event() -> ApiGatewayProxyEvent {
    ApiGatewayProxyEvent::new("POST", "/").with_header("Content-Type", "application/json")
}

/// Returns [`mock_event`] carrying `body` encoded as JSON.
#[must_use]
pub fn mock_json_event(body: &Value) -> ApiGatewayProxyEvent {
    mock_event().with_json_body(body)
}
