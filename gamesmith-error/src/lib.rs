//! # gamesmith-error
//!
//! Unified error handling for gamesmith.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what error occurred (e.g., InvalidRequest, MalformedArtifact)
//! - **Error Context**: Assist in locating the cause with rich context
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use gamesmith_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::MalformedArtifact, "difficulty 'Extreme' is not allowed")
//!         .with_operation("generator::generate")
//!         .with_context("attempt", "3")
//!         .with_context("model", "gpt-4o-mini"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All functions return `Result<T, gamesmith_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent ops only append context
//! - Don't abuse `From<OtherError>` to prevent raw error leakage

mod error;
mod kind;

pub use error::Error;
pub use kind::ErrorKind;

/// Result type alias using gamesmith Error
pub type Result<T> = std::result::Result<T, Error>;
