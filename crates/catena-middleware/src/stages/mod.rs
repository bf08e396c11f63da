//! Transport-independent middleware stages.
//!
//! Stages that need to look at a concrete request or result type live in
//! the transport adapter crates.

pub mod tracing;

pub use self::tracing::{RequestId, TracingMiddleware};
