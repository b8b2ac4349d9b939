//! Error kinds for gamesmith operations

use std::fmt;

/// The kind of error that occurred.
///
/// Callers match on `ErrorKind` to decide what to tell the user. A request
/// ends with `InvalidRequest`, `GenerationUnavailable` or `MalformedArtifact`;
/// `ExecutionFault` never leaves the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// Invalid configuration or parameters
    ConfigInvalid,

    // =========================================================================
    // Generation errors
    // =========================================================================
    /// The user request was empty or malformed
    InvalidRequest,

    /// The generation backend is unreachable or rejected the call
    GenerationUnavailable,

    /// The backend output failed schema validation after all retries
    MalformedArtifact,

    // =========================================================================
    // Execution errors
    // =========================================================================
    /// The generated program raised while running
    ExecutionFault,

    // =========================================================================
    // IO errors
    // =========================================================================
    /// IO operation failed
    IoFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::ConfigInvalid => "ConfigInvalid",

            ErrorKind::InvalidRequest => "InvalidRequest",
            ErrorKind::GenerationUnavailable => "GenerationUnavailable",
            ErrorKind::MalformedArtifact => "MalformedArtifact",

            ErrorKind::ExecutionFault => "ExecutionFault",

            ErrorKind::IoFailed => "IoFailed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::MalformedArtifact.to_string(), "MalformedArtifact");
        assert_eq!(
            ErrorKind::GenerationUnavailable.to_string(),
            "GenerationUnavailable"
        );
        assert_eq!(ErrorKind::IoFailed.as_str(), "IoFailed");
    }
}
