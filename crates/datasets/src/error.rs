use crate::fetch::ResourceKind;

/// Failure taxonomy for the data layer.
///
/// The split matters for retry policy: validation failures never reach the
/// network, transport failures get a user-facing retry affordance, and
/// structurally invalid payloads are never retried automatically (the
/// snapshot itself is broken; retrying cannot help).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    Validation {
        reason: String,
    },
    Network {
        resource: ResourceKind,
        reason: String,
    },
    PayloadShape {
        resource: ResourceKind,
        reason: String,
    },
}

impl DataError {
    pub fn validation(reason: impl Into<String>) -> Self {
        DataError::Validation {
            reason: reason.into(),
        }
    }

    pub fn network(resource: ResourceKind, reason: impl Into<String>) -> Self {
        DataError::Network {
            resource,
            reason: reason.into(),
        }
    }

    pub fn payload_shape(resource: ResourceKind, reason: impl Into<String>) -> Self {
        DataError::PayloadShape {
            resource,
            reason: reason.into(),
        }
    }

    /// Whether a user-facing retry affordance makes sense.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DataError::Network { .. })
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::Validation { reason } => write!(f, "validation error: {reason}"),
            DataError::Network { resource, reason } => {
                write!(f, "network error loading {resource}: {reason}")
            }
            DataError::PayloadShape { resource, reason } => {
                write!(f, "malformed {resource} payload: {reason}")
            }
        }
    }
}

impl std::error::Error for DataError {}
