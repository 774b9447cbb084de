//! Shared primitives used across EcoLens crates.

use core::fmt;

/// Result alias used across the workspace.
pub type EngineResult<T> = Result<T, EngineError>;

/// Top-level error type carried through every subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub code: &'static str,
    pub message: String,
}

impl EngineError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::EngineError;

    #[test]
    fn display_joins_code_and_message() {
        let error = EngineError::new("cache.read_failed", "file is missing");
        assert_eq!(error.to_string(), "cache.read_failed: file is missing");
    }
}
