//! Runtime error types
//!
//! Re-exports gamesmith-error and provides runtime-specific conveniences.

pub use gamesmith_error::{Error, ErrorKind, Result};

/// Create an InvalidRequest error for an empty user request
pub fn empty_request() -> Error {
    Error::invalid_request("request must not be empty")
}

/// Create a ConfigInvalid error for an incomplete learner profile
pub fn invalid_profile(field: &'static str, reason: impl Into<String>) -> Error {
    Error::config_invalid(reason)
        .with_operation("profile::validate")
        .with_context("field", field)
}

/// Create an ExecutionFault error raised by a running program
pub fn execution_fault(message: impl Into<String>) -> Error {
    Error::execution_fault(message).with_operation("interpreter::run")
}

/// Create an ExecutionFault error for an interpreter that could not start
pub fn interpreter_unavailable(program: impl Into<String>, reason: impl Into<String>) -> Error {
    let program = program.into();
    Error::execution_fault(format!("failed to start {}: {}", program, reason.into()))
        .with_operation("interpreter::spawn")
        .with_context("program", program)
}
