//! Assertions on chain results.

use catena_lambda::ApiGatewayProxyResult;
use serde_json::Value;

/// Assertion helpers for [`ApiGatewayProxyResult`].
///
/// Every assertion returns `&Self` so checks can be chained.
///
/// # Example
///
/// ```
/// use catena_lambda::ApiGatewayProxyResult;
/// use catena_test::ResponseAssertions;
/// use serde_json::json;
///
/// let result = ApiGatewayProxyResult::json(400, &json!({ "error": "EmptyBodyError" }));
///
/// result.assert_status(400).assert_error_code("EmptyBodyError");
/// ```
pub trait ResponseAssertions {
    /// Parses the body as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not valid JSON.
    fn json_body(&self) -> Value;

    /// Asserts the status code.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    fn assert_status(&self, expected: u16) -> &Self;

    /// Asserts the `error` field of the JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the body has no `error` string or it doesn't match.
    fn assert_error_code(&self, expected: &str) -> &Self;

    /// Asserts the `message` field of the JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the body has no `message` string or it doesn't match.
    fn assert_message(&self, expected: &str) -> &Self;

    /// Asserts that a header exists with the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    fn assert_header(&self, name: &str, expected: &str) -> &Self;
}

impl ResponseAssertions for ApiGatewayProxyResult {
    fn json_body(&self) -> Value {
        self.body_json()
            .unwrap_or_else(|e| panic!("Body is not valid JSON ({e}): {}", self.body))
    }

    fn assert_status(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status_code, expected,
            "Expected status {}, got {} with body {}",
            expected, self.status_code, self.body
        );
        self
    }

    fn assert_error_code(&self, expected: &str) -> &Self {
        let body = self.json_body();
        let actual = body["error"]
            .as_str()
            .unwrap_or_else(|| panic!("Body has no error code: {body}"));
        assert_eq!(actual, expected, "Error code mismatch");
        self
    }

    fn assert_message(&self, expected: &str) -> &Self {
        let body = self.json_body();
        let actual = body["message"]
            .as_str()
            .unwrap_or_else(|| panic!("Body has no message: {body}"));
        assert_eq!(actual, expected, "Message mismatch");
        self
    }

    fn assert_header(&self, name: &str, expected: &str) -> &Self {
        let actual = self
            .header(name)
            .unwrap_or_else(|| panic!("Header '{name}' not found"));
        assert_eq!(
            actual, expected,
            "Header '{}': expected '{}', got '{}'",
            name, expected, actual
        );
        self
    }
}
