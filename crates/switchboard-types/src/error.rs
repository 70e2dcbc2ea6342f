use thiserror::Error;

use crate::routing::TaskComplexity;

/// Errors from routing and fallback execution.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// No candidates exist for a tier. Fatal, never retried.
    #[error("no candidate models configured for {complexity} tasks")]
    Configuration { complexity: TaskComplexity },

    /// A routing table failed validation.
    #[error("invalid routing table: {0}")]
    InvalidConfig(String),

    /// The attempt budget for one turn is spent.
    #[error("giving up after {attempts} attempts; last model '{model}' failed: {last_error}")]
    TerminalFailure {
        model: String,
        attempts: u32,
        last_error: String,
    },

    /// The router has nothing left to try after `model` failed.
    #[error("no fallback available after '{model}' failed for {complexity} task: {last_error}")]
    NoFallbackAvailable {
        model: String,
        complexity: TaskComplexity,
        last_error: String,
    },
}

/// Errors from repository operations (used by trait definitions in switchboard-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("query error: {0}")]
    Query(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_failure_names_model_and_attempts() {
        let err = RoutingError::TerminalFailure {
            model: "claude-opus-4".to_string(),
            attempts: 3,
            last_error: "timeout".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("claude-opus-4"));
        assert!(msg.contains("3 attempts"));
    }

    #[test]
    fn test_configuration_error_display() {
        let err = RoutingError::Configuration {
            complexity: TaskComplexity::Complex,
        };
        assert_eq!(err.to_string(), "no candidate models configured for complex tasks");
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }
}
