//! Probe definitions and their per-channel history

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

use crate::{parse_version, Channel, ProbeId, ProbeResult, RevisionRef, Version};

/// Literal expiry meaning "recorded indefinitely".
pub const NEVER: &str = "never";

/// Version at and after which a measurement stops being recorded.
///
/// The raw string is kept so that a malformed value surfaces as an error at
/// query time rather than failing the whole dataset load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExpiryVersion {
    Never,
    Version(String),
}

impl ExpiryVersion {
    pub fn at(version: Version) -> Self {
        Self::Version(version.to_string())
    }

    pub fn is_never(&self) -> bool {
        matches!(self, ExpiryVersion::Never)
    }

    /// Numeric expiry, `None` for `never`.
    pub fn version(&self) -> ProbeResult<Option<Version>> {
        match self {
            ExpiryVersion::Never => Ok(None),
            ExpiryVersion::Version(raw) => parse_version("expiry_version", raw).map(Some),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ExpiryVersion::Never => NEVER,
            ExpiryVersion::Version(raw) => raw,
        }
    }
}

impl Serialize for ExpiryVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ExpiryVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) if s == NEVER => ExpiryVersion::Never,
            Raw::Text(s) => ExpiryVersion::Version(s),
            Raw::Number(n) => ExpiryVersion::Version(n.to_string()),
        })
    }
}

/// One recorded configuration state of a probe on a channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Collected regardless of user preference (release population).
    #[serde(default)]
    pub optout: bool,
    pub expiry_version: ExpiryVersion,
    pub revisions: RevisionRef,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bug_numbers: Vec<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl HistoryEntry {
    pub fn new(revisions: RevisionRef, expiry_version: ExpiryVersion) -> Self {
        Self {
            description: String::new(),
            optout: false,
            expiry_version,
            revisions,
            bug_numbers: Vec::new(),
            details: serde_json::Map::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_optout(mut self, optout: bool) -> Self {
        self.optout = optout;
        self
    }

    pub fn with_bugs(mut self, bugs: Vec<u64>) -> Self {
        self.bug_numbers = bugs;
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }

    /// Population label used by listings.
    pub fn population(&self) -> &'static str {
        if self.optout {
            "release"
        } else {
            "prerelease"
        }
    }
}

/// A probe and its per-channel history, newest entry first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProbeDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub probe_type: String,
    #[serde(default)]
    pub history: BTreeMap<Channel, Vec<HistoryEntry>>,
    /// Fields not interpreted by the engine, passed through unmodified.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ProbeDefinition {
    pub fn new(name: impl Into<String>, probe_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            probe_type: probe_type.into(),
            history: BTreeMap::new(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_history(mut self, channel: impl Into<Channel>, entries: Vec<HistoryEntry>) -> Self {
        self.history.insert(channel.into(), entries);
        self
    }

    pub fn history_for(&self, channel: &Channel) -> Option<&[HistoryEntry]> {
        self.history.get(channel).map(Vec::as_slice)
    }

    /// Newest recorded state on a channel.
    pub fn newest(&self, channel: &Channel) -> Option<&HistoryEntry> {
        self.history.get(channel).and_then(|h| h.first())
    }

    /// Oldest recorded state on a channel.
    pub fn oldest(&self, channel: &Channel) -> Option<&HistoryEntry> {
        self.history.get(channel).and_then(|h| h.last())
    }
}

/// `probeId → definition`, the shape of every probe dataset.
pub type ProbeMap = BTreeMap<ProbeId, ProbeDefinition>;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProbeError;

    const ENTRY: &str = r#"{
        "description": "Clicks on the button",
        "optout": true,
        "expiry_version": "65",
        "revisions": {"first": "r1", "last": "latest"},
        "bug_numbers": [1234, 5678],
        "details": {"kind": "count", "keyed": false}
    }"#;

    #[test]
    fn history_entry_deserializes() {
        let h: HistoryEntry = serde_json::from_str(ENTRY).unwrap();
        assert!(h.optout);
        assert_eq!(h.population(), "release");
        assert_eq!(h.expiry_version.version().unwrap(), Some(65));
        assert_eq!(h.bug_numbers, vec![1234, 5678]);
        assert_eq!(h.details.get("kind").unwrap(), "count");
    }

    #[test]
    fn nullable_fields_default() {
        let json = r#"{
            "description": null,
            "expiry_version": "never",
            "revisions": {"firstVersion": 40},
            "bug_numbers": null,
            "details": null
        }"#;
        let h: HistoryEntry = serde_json::from_str(json).unwrap();
        assert!(h.description.is_empty());
        assert!(!h.optout);
        assert_eq!(h.population(), "prerelease");
        assert!(h.expiry_version.is_never());
        assert_eq!(h.expiry_version.version().unwrap(), None);
        assert!(h.bug_numbers.is_empty());
        assert!(h.details.is_empty());
    }

    #[test]
    fn malformed_expiry_is_reported_on_use() {
        let e = ExpiryVersion::Version("soon".into());
        assert_eq!(
            e.version().unwrap_err(),
            ProbeError::malformed("expiry_version", "soon")
        );
    }

    #[test]
    fn numeric_expiry_accepted() {
        let e: ExpiryVersion = serde_json::from_str("61").unwrap();
        assert_eq!(e, ExpiryVersion::at(61));
        assert_eq!(serde_json::to_string(&e).unwrap(), "\"61\"");
    }

    #[test]
    fn probe_definition_round_trips_extra_fields() {
        let json = format!(
            r#"{{"name": "UI_BUTTON_CLICK", "type": "histogram", "origin": "x",
                "history": {{"release": [{ENTRY}]}}}}"#
        );
        let p: ProbeDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(p.probe_type, "histogram");
        assert_eq!(p.extra.get("origin").unwrap(), "x");
        let release = Channel::from("release");
        assert_eq!(p.history_for(&release).unwrap().len(), 1);
        assert!(p.history_for(&Channel::from("beta")).is_none());

        let out = serde_json::to_value(&p).unwrap();
        assert_eq!(out["type"], "histogram");
        assert_eq!(out["origin"], "x");
    }
}
