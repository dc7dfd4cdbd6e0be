//! Identifier newtypes

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ProbeError, ProbeResult};

/// An integer product version, e.g. `61`.
pub type Version = u32;

/// Parse a base-10 version string.
///
/// Only the leading dot-separated component is significant, so `"61"` and
/// `"61.0a1"` both yield `61`.
pub fn parse_version(field: &'static str, raw: &str) -> ProbeResult<Version> {
    let major = raw.trim().split('.').next().unwrap_or_default();
    major
        .parse::<Version>()
        .map_err(|_| ProbeError::malformed(field, raw))
}

/// A release channel (`release`, `beta`, `aurora`, `nightly`).
///
/// Channels are independent version spaces. Unknown channel names in the
/// data are carried through rather than rejected.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(pub String);

impl Channel {
    pub const RELEASE: &'static str = "release";
    pub const BETA: &'static str = "beta";
    pub const AURORA: &'static str = "aurora";
    pub const NIGHTLY: &'static str = "nightly";
    /// Pseudo-channel shared by every channel in supplementary probe files.
    pub const ALL: &'static str = "all";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_release(&self) -> bool {
        self.0 == Self::RELEASE
    }

    pub fn is_all(&self) -> bool {
        self.0 == Self::ALL
    }
}

impl From<&str> for Channel {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Channel {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Probe identifier, conventionally `"{type}/{name}"`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProbeId(pub String);

impl ProbeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name segment after the first `/`, or the whole id.
    pub fn short_name(&self) -> &str {
        self.0.split_once('/').map(|(_, n)| n).unwrap_or(&self.0)
    }
}

impl From<&str> for ProbeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque build identifier, unique within a channel.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(pub String);

impl RevisionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RevisionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_and_dotted_versions() {
        assert_eq!(parse_version("version", "60").unwrap(), 60);
        assert_eq!(parse_version("version", "61.0a1").unwrap(), 61);
        assert_eq!(parse_version("version", " 55 ").unwrap(), 55);
    }

    #[test]
    fn parse_rejects_non_numeric() {
        let err = parse_version("expiry_version", "never").unwrap_err();
        assert_eq!(err, ProbeError::malformed("expiry_version", "never"));
        assert!(parse_version("version", "").is_err());
        assert!(parse_version("version", "-3").is_err());
        assert!(parse_version("version", "61abc").is_err());
    }

    #[test]
    fn probe_short_name() {
        assert_eq!(ProbeId::from("histogram/GC_MS").short_name(), "GC_MS");
        assert_eq!(ProbeId::from("plain").short_name(), "plain");
        assert_eq!(
            ProbeId::from("scalar/a.b/c").short_name(),
            "a.b/c"
        );
    }

    #[test]
    fn channel_serde_is_transparent() {
        let c: Channel = serde_json::from_str("\"nightly\"").unwrap();
        assert_eq!(c.as_str(), Channel::NIGHTLY);
        assert!(!c.is_release());
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"nightly\"");
    }
}
