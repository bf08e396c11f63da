//! Pipeline context types.
//!
//! The [`PipelineContext`] carries derived data through one run of a chain.
//! It is created empty at the start of every run and dropped when the run
//! returns, so nothing leaks between invocations.
//!
//! Writes are merges: a stage adding a field never erases fields written by
//! earlier stages, and there is no operation for removing a field.

use serde_json::{Map, Value};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Context that flows through the middleware chain.
///
/// # Example
///
/// ```
/// use catena_middleware::context::PipelineContext;
/// use serde_json::json;
///
/// let mut ctx = PipelineContext::new();
/// ctx.merge_body(json!({ "name": "Lucas" }));
/// ctx.insert_data("testing", json!(true));
///
/// assert_eq!(ctx.body().unwrap()["name"], "Lucas");
/// assert_eq!(ctx.data_value("testing"), Some(&json!(true)));
/// ```
#[derive(Debug)]
pub struct PipelineContext {
    /// Parsed request body.
    body: Option<Value>,

    /// Query string parameters extracted from the request.
    query_string_parameters: Option<HashMap<String, String>>,

    /// Path parameters extracted from the request.
    path_parameters: Option<HashMap<String, String>>,

    /// Free-form slot for middleware-specific state.
    data: Map<String, Value>,

    /// When the run started.
    started_at: Instant,

    /// Type-erased extension data keyed by type.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl PipelineContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            body: None,
            query_string_parameters: None,
            path_parameters: None,
            data: Map::new(),
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the parsed body, if a stage has set one.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Merges a value into the parsed body.
    ///
    /// Objects are merged key by key, so fields written by earlier stages
    /// survive unless the incoming value sets the same key.
    pub fn merge_body(&mut self, body: Value) {
        match self.body.as_mut() {
            Some(existing) => merge_value(existing, body),
            None => self.body = Some(body),
        }
    }

    /// Returns the query string parameters, if extracted.
    #[must_use]
    pub fn query_string_parameters(&self) -> Option<&HashMap<String, String>> {
        self.query_string_parameters.as_ref()
    }

    /// Merges query string parameters into the context.
    ///
    /// Existing keys are overwritten by incoming ones; other keys are kept.
    pub fn merge_query_string_parameters<I>(&mut self, params: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.query_string_parameters
            .get_or_insert_with(HashMap::new)
            .extend(params);
    }

    /// Returns the path parameters, if extracted.
    #[must_use]
    pub fn path_parameters(&self) -> Option<&HashMap<String, String>> {
        self.path_parameters.as_ref()
    }

    /// Merges path parameters into the context.
    pub fn merge_path_parameters<I>(&mut self, params: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.path_parameters
            .get_or_insert_with(HashMap::new)
            .extend(params);
    }

    /// Returns the auxiliary data slot.
    #[must_use]
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Returns a single value from the data slot.
    #[must_use]
    pub fn data_value(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Inserts a value into the data slot.
    ///
    /// When both the existing and the incoming value are objects they are
    /// merged key by key, so two stages can contribute to the same entry.
    pub fn insert_data(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.data.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                self.data.insert(key, value);
            }
        }
    }

    /// Merges every entry of `data` into the data slot.
    pub fn merge_data(&mut self, data: Map<String, Value>) {
        for (key, value) in data {
            self.insert_data(key, value);
        }
    }

    /// Merges a JSON patch into the context.
    ///
    /// Known fields (`body`, `queryStringParameters`, `pathParameters`,
    /// `data`) are merged; anything else is dropped. Non-string parameter
    /// values are dropped as well.
    ///
    /// ```
    /// use catena_middleware::context::PipelineContext;
    /// use serde_json::json;
    ///
    /// let mut ctx = PipelineContext::new();
    /// ctx.merge_json(json!({
    ///     "body": { "id": "nat" },
    ///     "pathParameters": { "accountId": "NAT" },
    ///     "somethingElse": 1
    /// }));
    ///
    /// assert_eq!(ctx.body().unwrap()["id"], "nat");
    /// assert_eq!(ctx.path_parameters().unwrap()["accountId"], "NAT");
    /// ```
    pub fn merge_json(&mut self, patch: Value) {
        let Value::Object(fields) = patch else {
            return;
        };

        for (field, value) in fields {
            match field.as_str() {
                "body" => self.merge_body(value),
                "queryStringParameters" => {
                    self.merge_query_string_parameters(string_entries(value));
                }
                "pathParameters" => self.merge_path_parameters(string_entries(value)),
                "data" => {
                    if let Value::Object(data) = value {
                        self.merge_data(data);
                    }
                }
                other => {
                    tracing::trace!(field = other, "dropping unknown context field");
                }
            }
        }
    }

    /// Returns `true` if no stage has written anything yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_none()
            && self.query_string_parameters.is_none()
            && self.path_parameters.is_none()
            && self.data.is_empty()
            && self.extensions.is_empty()
    }

    /// Returns when the run started.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the run started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value.
    ///
    /// ```
    /// use catena_middleware::context::PipelineContext;
    ///
    /// struct Caller(&'static str);
    ///
    /// let mut ctx = PipelineContext::new();
    /// ctx.set_extension(Caller("account-service"));
    ///
    /// assert_eq!(ctx.get_extension::<Caller>().unwrap().0, "account-service");
    /// ```
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub(crate) fn take_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|v| *v)
    }

    /// Checks if an extension of the given type exists.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_value(existing: &mut Value, incoming: Value) {
    match (existing, incoming) {
        (Value::Object(current), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match current.get_mut(&key) {
                    Some(slot) => merge_value(slot, value),
                    None => {
                        current.insert(key, value);
                    }
                }
            }
        }
        (slot, incoming) => *slot = incoming,
    }
}

fn string_entries(value: Value) -> Vec<(String, String)> {
    match value {
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(k, v)| match v {
                Value::String(s) => Some((k, s)),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_context_is_empty() {
        let ctx = PipelineContext::new();
        assert!(ctx.is_empty());
        assert!(ctx.body().is_none());
        assert!(ctx.query_string_parameters().is_none());
        assert!(ctx.path_parameters().is_none());
        assert!(ctx.data().is_empty());
    }

    #[test]
    fn test_insert_data_merges_objects() {
        let mut ctx = PipelineContext::new();
        ctx.insert_data("audit", json!({ "parsed": true }));
        ctx.insert_data("audit", json!({ "validated": true }));

        assert_eq!(
            ctx.data_value("audit"),
            Some(&json!({ "parsed": true, "validated": true }))
        );
    }

    #[test]
    fn test_insert_data_keeps_other_keys() {
        let mut ctx = PipelineContext::new();
        ctx.insert_data("first", json!(1));
        ctx.insert_data("second", json!(2));

        assert_eq!(ctx.data().len(), 2);
        assert_eq!(ctx.data_value("first"), Some(&json!(1)));
    }

    #[test]
    fn test_parameters_merge() {
        let mut ctx = PipelineContext::new();
        ctx.merge_query_string_parameters([("page".to_string(), "1".to_string())]);
        ctx.merge_query_string_parameters([("limit".to_string(), "10".to_string())]);

        let params = ctx.query_string_parameters().unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params["page"], "1");
    }

    #[test]
    fn test_merge_json_drops_unknown_fields() {
        let mut ctx = PipelineContext::new();
        ctx.merge_json(json!({
            "data": { "testing": true },
            "unknown": "dropped"
        }));

        assert_eq!(ctx.data_value("testing"), Some(&json!(true)));
        assert!(ctx.data_value("unknown").is_none());
        assert!(ctx.body().is_none());
    }

    #[test]
    fn test_merge_json_merges_body() {
        let mut ctx = PipelineContext::new();
        ctx.merge_body(json!({ "name": "Lucas" }));
        ctx.merge_json(json!({ "body": { "age": 28 } }));

        assert_eq!(ctx.body(), Some(&json!({ "name": "Lucas", "age": 28 })));
    }

    #[test]
    fn test_second_body_write_keeps_earlier_keys() {
        let mut ctx = PipelineContext::new();
        ctx.merge_body(json!({ "name": "Lucas", "address": { "city": "Recife" } }));
        ctx.merge_body(json!({ "age": 28, "address": { "zip": "50000" } }));

        assert_eq!(
            ctx.body(),
            Some(&json!({
                "name": "Lucas",
                "age": 28,
                "address": { "city": "Recife", "zip": "50000" }
            }))
        );
    }

    #[test]
    fn test_merge_json_ignores_non_objects() {
        let mut ctx = PipelineContext::new();
        ctx.merge_json(json!([1, 2, 3]));
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_extensions() {
        #[derive(Debug, PartialEq)]
        struct Marker(u32);

        let mut ctx = PipelineContext::new();
        assert!(!ctx.has_extension::<Marker>());

        ctx.set_extension(Marker(7));
        assert!(ctx.has_extension::<Marker>());
        assert_eq!(ctx.get_extension::<Marker>(), Some(&Marker(7)));
        assert!(!ctx.is_empty());

        assert_eq!(ctx.take_extension::<Marker>(), Some(Marker(7)));
        assert!(!ctx.has_extension::<Marker>());
    }

    #[test]
    fn test_elapsed_time() {
        let ctx = PipelineContext::new();
        std::thread::sleep(Duration::from_millis(5));
        assert!(ctx.elapsed() >= Duration::from_millis(5));
    }
}
