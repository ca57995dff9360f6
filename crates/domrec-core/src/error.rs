//! Error types for the reconciliation core
//!
//! The error taxonomy is closed: a failure is either local
//! (`ValidationFailed`, `MalformedIdentifier`) or the classified outcome of a
//! remote call (`NotFound`, `Rejected`, `Unknown`), always wrapped with the
//! operation and identity it belongs to.

use thiserror::Error;

use crate::traits::GatewayError;
use crate::validate::Violations;

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Lifecycle operation names, used to attribute failures to the call that
/// produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Import,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Import => "import",
        };
        f.write_str(name)
    }
}

/// Classified outcome of a failed remote call.
///
/// Classification is derived solely from the status code the gateway
/// reported, never from message content. Codes outside 4xx (and calls that
/// produced no status at all) land in `Unknown`: treating them as absence
/// would mask a transient outage as a deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteFailure {
    /// The remote service confirmed the resource does not exist (404).
    NotFound,
    /// The remote service refused the request as invalid (other 4xx).
    Rejected {
        /// Remote message, surfaced verbatim
        reason: String,
    },
    /// Transport failure or server-side error; not interpreted as absence.
    Unknown {
        /// Description of the underlying failure
        cause: String,
    },
}

impl RemoteFailure {
    /// Classify a gateway error by its reported status code.
    pub fn classify(err: &GatewayError) -> Self {
        match err.status {
            Some(404) => RemoteFailure::NotFound,
            Some(code) if (400..500).contains(&code) => RemoteFailure::Rejected {
                reason: err.message.clone(),
            },
            _ => RemoteFailure::Unknown {
                cause: err.to_string(),
            },
        }
    }

    /// Whether this failure means the resource is confirmed absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteFailure::NotFound)
    }
}

/// Core error type for reconciliation operations
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Desired state failed the local validation pipeline; no remote call
    /// was made.
    #[error("validation failed for {identity}: {violations}")]
    ValidationFailed {
        /// Identity the desired state maps to
        identity: String,
        /// Field-level violations, in rule order
        violations: Violations,
    },

    /// The remote service confirmed the resource does not exist.
    #[error("failed to {operation} {identity}: not found")]
    NotFound {
        /// Operation that observed the absence
        operation: Operation,
        /// Identity of the missing resource
        identity: String,
    },

    /// The remote service refused the request as semantically invalid.
    #[error("failed to {operation} {identity}: rejected by the remote service: {reason}")]
    Rejected {
        /// Operation that was refused
        operation: Operation,
        /// Identity the request addressed
        identity: String,
        /// Remote message, surfaced verbatim
        reason: String,
    },

    /// Transport or server-side failure of unknown significance.
    #[error("failed to {operation} {identity}: {cause}")]
    Unknown {
        /// Operation that failed
        operation: Operation,
        /// Identity the request addressed
        identity: String,
        /// Description of the underlying failure
        cause: String,
    },

    /// An identifier string could not be decoded into a compound key.
    #[error("malformed identifier {raw:?}: {reason}")]
    MalformedIdentifier {
        /// The identifier as received
        raw: String,
        /// Why decoding failed
        reason: String,
    },
}

impl ReconcileError {
    /// Create a validation error for an identity
    pub fn validation(identity: impl Into<String>, violations: Violations) -> Self {
        Self::ValidationFailed {
            identity: identity.into(),
            violations,
        }
    }

    /// Create a malformed-identifier error
    pub fn malformed(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedIdentifier {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a classified remote failure with the operation and identity it
    /// belongs to.
    pub fn remote(
        operation: Operation,
        identity: impl Into<String>,
        failure: RemoteFailure,
    ) -> Self {
        let identity = identity.into();
        match failure {
            RemoteFailure::NotFound => Self::NotFound {
                operation,
                identity,
            },
            RemoteFailure::Rejected { reason } => Self::Rejected {
                operation,
                identity,
                reason,
            },
            RemoteFailure::Unknown { cause } => Self::Unknown {
                operation,
                identity,
                cause,
            },
        }
    }

    /// Whether this error reports a confirmed remote absence
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this error was produced locally, before any remote call
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed { .. } | Self::MalformedIdentifier { .. }
        )
    }
}
