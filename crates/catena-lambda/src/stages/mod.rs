//! Middleware suite for API Gateway chains.
//!
//! | Stage | Purpose |
//! |-------|---------|
//! | [`JsonBodyParser`] | Parse the JSON body into the context |
//! | [`HttpParameters`] | Copy query string and path parameters into the context |
//! | [`Validator`] | Validate the parsed body against a [`Schema`](crate::schema::Schema) |
//! | [`ContextData`] | Merge a fixed value into the context data slot |
//! | [`ResponseHeaders`] | Add headers to the result on the way out |

pub mod context_data;
pub mod http_parameters;
pub mod json_body_parser;
pub mod response_headers;
pub mod validator;

pub use context_data::ContextData;
pub use http_parameters::HttpParameters;
pub use json_body_parser::JsonBodyParser;
pub use response_headers::ResponseHeaders;
pub use validator::{ParsedItem, Validator};
