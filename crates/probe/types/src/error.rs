//! Error types for probe history queries

use crate::{Channel, RevisionId};

/// Errors raised while building or querying a probe dataset.
///
/// Absent data (a probe without history for a channel, a channel missing
/// from the revision table) is never an error; it is excluded from results.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("malformed version in {field}: {value:?}")]
    MalformedVersion { field: &'static str, value: String },

    #[error("unknown {kind} constraint: {value:?}")]
    UnknownConstraint { kind: &'static str, value: String },

    #[error("revision {revision} not found on channel {channel}")]
    UnknownRevision { channel: Channel, revision: RevisionId },

    #[error("channel {0} has no known versions")]
    EmptyChannel(Channel),
}

impl ProbeError {
    pub fn malformed(field: &'static str, value: impl Into<String>) -> Self {
        Self::MalformedVersion {
            field,
            value: value.into(),
        }
    }
}

/// Result type alias for probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = ProbeError::malformed("expiry_version", "sixty");
        assert!(e.to_string().contains("expiry_version"));
        assert!(e.to_string().contains("sixty"));

        let e = ProbeError::UnknownRevision {
            channel: Channel::from("beta"),
            revision: RevisionId::from("abc123"),
        };
        assert_eq!(e.to_string(), "revision abc123 not found on channel beta");

        let e = ProbeError::UnknownConstraint {
            kind: "version",
            value: "was_in".into(),
        };
        assert!(e.to_string().contains("was_in"));
    }
}
