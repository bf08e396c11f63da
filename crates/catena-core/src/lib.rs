//! # Catena Core
//!
//! Shared error taxonomy for the Catena middleware pipeline.
//!
//! Every stage failure is a [`StageError`] carrying a discriminator code that
//! error handlers branch on. Misuse of the engine is a [`ChainError`].
//!
//! ```
//! use catena_core::{ChainError, StageError};
//!
//! let failure = StageError::parse("EmptyBodyError", "The request body is empty.");
//! assert_eq!(failure.status(), 400);
//!
//! let misuse = ChainError::HandlerNotDefined;
//! assert_eq!(misuse.name(), "HandlerNotDefinedError");
//! ```

#![doc(html_root_url = "https://docs.rs/catena-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;

pub use error::{ChainError, ErrorEnvelope, ErrorKind, StageError, StageResult};
