//! API Gateway proxy request and result types.
//!
//! Field names follow the API Gateway REST proxy integration wire format
//! (`camelCase`), so events can be deserialized straight from the JSON the
//! gateway delivers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Header name for the response content type.
pub const CONTENT_TYPE: &str = "Content-Type";

/// Header name for the CORS allowed origin.
pub const ACCESS_CONTROL_ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";

/// Content type of every JSON result.
pub const APPLICATION_JSON: &str = "application/json";

/// An incoming API Gateway proxy event.
///
/// # Example
///
/// ```
/// use catena_lambda::ApiGatewayProxyEvent;
/// use serde_json::json;
///
/// let event = ApiGatewayProxyEvent::new("POST", "/accounts")
///     .with_json_body(&json!({ "id": "nat" }))
///     .with_path_parameter("stage", "dev");
///
/// assert_eq!(event.body.as_deref(), Some(r#"{"id":"nat"}"#));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayProxyEvent {
    /// Resource path template.
    #[serde(default)]
    pub resource: String,

    /// Request path.
    #[serde(default)]
    pub path: String,

    /// HTTP method.
    #[serde(default)]
    pub http_method: String,

    /// Request headers.
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,

    /// Query string parameters.
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,

    /// Path parameters.
    #[serde(default)]
    pub path_parameters: Option<HashMap<String, String>>,

    /// Raw request body.
    #[serde(default)]
    pub body: Option<String>,

    /// Whether `body` is base64 encoded.
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl ApiGatewayProxyEvent {
    /// Creates an event for the given method and path.
    pub fn new(http_method: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            resource: path.clone(),
            path,
            http_method: http_method.into(),
            ..Self::default()
        }
    }

    /// Sets the raw body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the body to the JSON encoding of `value`.
    #[must_use]
    pub fn with_json_body(self, value: &Value) -> Self {
        self.with_body(value.to_string())
    }

    /// Adds a request header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Adds a query string parameter.
    #[must_use]
    pub fn with_query_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_string_parameters
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Adds a path parameter.
    #[must_use]
    pub fn with_path_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_parameters
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Looks up a header, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.as_ref().and_then(|headers| {
            headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        })
    }
}

/// The result returned to API Gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayProxyResult {
    /// HTTP status code.
    pub status_code: u16,

    /// Response headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Response body.
    #[serde(default)]
    pub body: String,
}

impl ApiGatewayProxyResult {
    /// Creates a result with a raw body and no headers.
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Creates a JSON result.
    #[must_use]
    pub fn json(status_code: u16, body: &Value) -> Self {
        Self::new(status_code, body.to_string()).with_header(CONTENT_TYPE, APPLICATION_JSON)
    }

    /// Creates a `200` JSON result.
    #[must_use]
    pub fn ok_json(body: &Value) -> Self {
        Self::json(200, body)
    }

    /// Sets a header, replacing any header with the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Sets a header in place, replacing any header with the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
    }

    /// Looks up a header, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if the status code is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status_code, 200..=299)
    }

    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON.
    pub fn body_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}
