//! Terminal results of a bridge invocation.

use std::io;
use std::time::Duration;

/// Exactly one of these is produced per request.
pub type Outcome = Result<String, BridgeError>;

/// Failure category, independent of the underlying cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidInput,
    LaunchError,
    RuntimeError,
    WorkerError,
    Timeout,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::LaunchError => "launch_error",
            Self::RuntimeError => "runtime_error",
            Self::WorkerError => "worker_error",
            Self::Timeout => "timeout",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("prompt is required")]
    InvalidInput,

    #[error("failed to launch worker: {0}")]
    Launch(#[source] io::Error),

    #[error("worker communication failed: {0}")]
    Runtime(#[source] io::Error),

    /// `code` is `None` when the worker was terminated by a signal.
    #[error("non-zero exit")]
    Worker { code: Option<i32> },

    #[error("worker timed out after {0:?}")]
    Timeout(Duration),
}

impl BridgeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidInput => FailureKind::InvalidInput,
            Self::Launch(_) => FailureKind::LaunchError,
            Self::Runtime(_) => FailureKind::RuntimeError,
            Self::Worker { .. } => FailureKind::WorkerError,
            Self::Timeout(_) => FailureKind::Timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_match_variants() {
        let not_found = || io::Error::new(io::ErrorKind::NotFound, "missing");
        assert_eq!(BridgeError::InvalidInput.kind(), FailureKind::InvalidInput);
        assert_eq!(BridgeError::Launch(not_found()).kind(), FailureKind::LaunchError);
        assert_eq!(BridgeError::Runtime(not_found()).kind(), FailureKind::RuntimeError);
        assert_eq!(
            BridgeError::Worker { code: Some(1) }.kind(),
            FailureKind::WorkerError
        );
        assert_eq!(
            BridgeError::Timeout(Duration::from_secs(1)).kind(),
            FailureKind::Timeout
        );
    }

    #[test]
    fn error_display() {
        assert_eq!(BridgeError::InvalidInput.to_string(), "prompt is required");
        assert_eq!(
            BridgeError::Worker { code: Some(2) }.to_string(),
            "non-zero exit"
        );
    }

    #[test]
    fn failure_kind_label_matches_serialized_form() {
        for kind in [
            FailureKind::InvalidInput,
            FailureKind::LaunchError,
            FailureKind::RuntimeError,
            FailureKind::WorkerError,
            FailureKind::Timeout,
        ] {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
        }
    }

    #[test]
    fn failure_kind_serializes_snake_case() {
        insta::assert_json_snapshot!(
            [FailureKind::LaunchError, FailureKind::WorkerError],
            @r#"
        [
          "launch_error",
          "worker_error"
        ]
        "#
        );
    }
}
