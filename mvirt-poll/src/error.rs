//! Error types for backend calls and poll passes.

use thiserror::Error;

use crate::kind::ResourceKind;

/// Errors returned by a backend collaborator call (listing, lookup, build).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Object vanished or never existed.
    #[error("no {kind} matching '{key}'")]
    NotFound { kind: ResourceKind, key: String },

    /// The backend does not implement this call.
    #[error("{0} is not supported by this backend")]
    Unsupported(String),

    /// Connection to the backend failed or was dropped.
    #[error("connection: {0}")]
    Connection(String),

    /// The call reached the backend and failed there.
    #[error("{0}")]
    Call(String),

    /// Internal invariant violated by the caller or a collaborator.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl BackendError {
    /// Fatal errors abort the poll; everything else degrades gracefully.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BackendError::Invariant(_))
    }
}

/// Result type for backend collaborator calls.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Errors that abort a poll pass.
#[derive(Debug, Error)]
pub enum PollError {
    /// A collaborator reported a fatal error for one object.
    #[error("{kind} poll aborted on '{key}': {source}")]
    Backend {
        kind: ResourceKind,
        key: String,
        #[source]
        source: BackendError,
    },

    /// A domain record claims to be running but has no ID.
    #[error("domain record '{key}' is active but has no ID")]
    MissingDomainId { key: String },

    /// Two domain records in one snapshot claim the same identity.
    #[error("domain records '{first}' and '{second}' both claim {identity}")]
    DuplicateDomainIdentity {
        first: String,
        second: String,
        identity: String,
    },
}

/// Result type for poll passes.
pub type Result<T> = std::result::Result<T, PollError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_invariant_is_fatal() {
        assert!(BackendError::Invariant("bad key".to_string()).is_fatal());
        assert!(!BackendError::Connection("reset".to_string()).is_fatal());
        assert!(!BackendError::Call("boom".to_string()).is_fatal());
        assert!(!BackendError::Unsupported("listAllNetworks".to_string()).is_fatal());
        assert!(
            !BackendError::NotFound {
                kind: ResourceKind::Network,
                key: "default".to_string(),
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_poll_error_display() {
        let err = PollError::Backend {
            kind: ResourceKind::StoragePool,
            key: "images".to_string(),
            source: BackendError::Invariant("empty key".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "pool poll aborted on 'images': invariant violated: empty key"
        );
    }
}
