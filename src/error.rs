//! Error types for the CNI preflight engine
//!
//! Every failure in the preflight chain is terminal: the first error raised by
//! any stage is returned to the caller and no later stage runs.

use crate::domain::ports::Kind;
use std::time::Duration;
use thiserror::Error;

/// Reason a cluster name was rejected by the configuration gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterNameError {
    /// The name contains a `.` character
    ContainsDot,
    /// The name is not a DNS-label-like string
    PatternMismatch,
}

impl std::fmt::Display for ClusterNameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClusterNameError::ContainsDot => write!(f, "dots are not allowed"),
            ClusterNameError::PatternMismatch => {
                write!(f, "must consist of lowercase alphanumerics and '-', and start and end with an alphanumeric")
            }
        }
    }
}

/// Unified error type for the preflight engine
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Duplicate validation check {check:?} registered for kind \"{kind}\"")]
    DuplicateCheck { kind: Kind, check: String },

    // =========================================================================
    // Detection Errors
    // =========================================================================
    #[error("Provider lookup failed: {provider} - {reason}")]
    ProviderLookup { provider: String, reason: String },

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("validation check for kind \"{kind}\" failed: {source}")]
    ValidationCheck {
        kind: Kind,
        check: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Command failed: {program} - {reason}")]
    Command { program: String, reason: String },

    #[error("Version parse error: {0}")]
    VersionParse(String),

    #[error("{tool} version {found} is too old, at least {required} is required")]
    VersionTooOld {
        tool: String,
        found: String,
        required: String,
    },

    // =========================================================================
    // Configuration Gate Errors
    // =========================================================================
    #[error("invalid cluster name {name:?}, {reason}")]
    InvalidClusterName {
        name: String,
        reason: ClusterNameError,
    },

    #[error("invalid encryption mode {0:?}")]
    InvalidEncryptionMode(String),

    // =========================================================================
    // Cancellation
    // =========================================================================
    #[error("Preflight cancelled")]
    Cancelled,

    #[error("Preflight timed out after {0:?}")]
    Timeout(Duration),

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl Error {
    /// Check if this error is fixed by changing the installer's input
    /// rather than the cluster or the environment
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::Configuration(_)
                | Error::InvalidClusterName { .. }
                | Error::InvalidEncryptionMode(_)
        )
    }

    /// Check if this error came from cancellation or the overall deadline
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled | Error::Timeout(_))
    }

    /// The flag that would skip the failing check, for check failures
    pub fn disable_hint(&self) -> Option<String> {
        match self {
            Error::ValidationCheck { check, .. } => Some(format!("--disable-check={}", check)),
            _ => None,
        }
    }
}

/// Result type alias for the preflight engine
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_check_message() {
        let err = Error::ValidationCheck {
            kind: Kind::Minikube,
            check: "minimum-version".into(),
            source: Box::new(Error::VersionTooOld {
                tool: "minikube".into(),
                found: "1.4.0".into(),
                required: "1.5.2".into(),
            }),
        };

        assert_eq!(
            err.to_string(),
            "validation check for kind \"minikube\" failed: minikube version 1.4.0 is too old, at least 1.5.2 is required"
        );
        assert_eq!(err.disable_hint().as_deref(), Some("--disable-check=minimum-version"));
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_error_classification() {
        let name = Error::InvalidClusterName {
            name: "ab.cd".into(),
            reason: ClusterNameError::ContainsDot,
        };
        assert!(name.is_user_error());
        assert!(name.disable_hint().is_none());

        assert!(Error::Cancelled.is_cancellation());
        assert!(Error::Timeout(Duration::from_secs(5)).is_cancellation());
        assert!(!Error::InvalidEncryptionMode("aes".into()).is_cancellation());

        assert!(Error::Configuration("unknown configuration keys: x".into()).is_user_error());
        assert!(!Error::Cancelled.is_user_error());
        assert!(!Error::ProviderLookup {
            provider: "azure".into(),
            reason: "ResourceNotFound".into(),
        }
        .is_user_error());
    }
}
