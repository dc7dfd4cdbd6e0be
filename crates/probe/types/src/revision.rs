//! Revision tables and revision references
//!
//! The revision table maps each channel's build identifiers to the version
//! they shipped in. Its per-channel order is the dataset order, which the
//! version index relies on when several revisions share a version.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::{parse_version, Channel, ProbeResult, RevisionId, Version};

/// Literal used by history entries whose range is still open.
pub const LATEST: &str = "latest";

/// Per-revision metadata. Only `version` is interpreted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevisionDetails {
    /// Version as a base-10 string, e.g. `"61"`.
    pub version: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RevisionDetails {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn parsed_version(&self) -> ProbeResult<Version> {
        parse_version("version", &self.version)
    }
}

/// The revisions of one channel, in dataset order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RevisionLog {
    entries: Vec<(RevisionId, RevisionDetails)>,
    /// Position of each id in `entries`.
    positions: HashMap<RevisionId, usize>,
}

impl RevisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a revision. A repeated id replaces the earlier details in place.
    pub fn push(&mut self, revision: RevisionId, details: RevisionDetails) {
        match self.positions.get(&revision) {
            Some(&pos) => self.entries[pos].1 = details,
            None => {
                self.positions.insert(revision.clone(), self.entries.len());
                self.entries.push((revision, details));
            }
        }
    }

    pub fn with(mut self, revision: impl Into<String>, version: impl Into<String>) -> Self {
        self.push(RevisionId(revision.into()), RevisionDetails::new(version));
        self
    }

    pub fn get(&self, revision: &RevisionId) -> Option<&RevisionDetails> {
        self.positions.get(revision).map(|&pos| &self.entries[pos].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RevisionId, &RevisionDetails)> {
        self.entries.iter().map(|(id, d)| (id, d))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for RevisionLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, details) in &self.entries {
            map.serialize_entry(id, details)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RevisionLog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LogVisitor;

        impl<'de> Visitor<'de> for LogVisitor {
            type Value = RevisionLog;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of revision id to revision details")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut log = RevisionLog::new();
                while let Some((id, details)) =
                    access.next_entry::<RevisionId, RevisionDetails>()?
                {
                    log.push(id, details);
                }
                Ok(log)
            }
        }

        deserializer.deserialize_map(LogVisitor)
    }
}

/// `channel → revision → details`, the raw `revisions.json` dataset.
pub type RevisionTable = BTreeMap<Channel, RevisionLog>;

/// Upper bound of a revision span.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LastRevision {
    /// Still shipping: resolves to the channel's newest version.
    Latest,
    Revision(RevisionId),
}

impl Serialize for LastRevision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LastRevision::Latest => serializer.serialize_str(LATEST),
            LastRevision::Revision(id) => serializer.serialize_str(id.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for LastRevision {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(if raw == LATEST {
            LastRevision::Latest
        } else {
            LastRevision::Revision(RevisionId(raw))
        })
    }
}

/// The builds a history entry covers.
///
/// Exactly one of the two forms is present in the data; an input carrying
/// both `first` and `firstVersion`, or neither, fails to deserialize.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRevisionRef", into = "RawRevisionRef")]
pub enum RevisionRef {
    /// Span between two revisions of the channel.
    Span { first: RevisionId, last: LastRevision },
    /// The introducing revision is unknown, only its version.
    FirstVersion { first_version: Version, last: LastRevision },
}

impl RevisionRef {
    pub fn span(first: impl Into<String>, last: impl Into<String>) -> Self {
        let last: String = last.into();
        Self::Span {
            first: RevisionId(first.into()),
            last: if last == LATEST {
                LastRevision::Latest
            } else {
                LastRevision::Revision(RevisionId(last))
            },
        }
    }

    pub fn from_version(first_version: Version) -> Self {
        Self::FirstVersion {
            first_version,
            last: LastRevision::Latest,
        }
    }

    pub fn last(&self) -> &LastRevision {
        match self {
            RevisionRef::Span { last, .. } | RevisionRef::FirstVersion { last, .. } => last,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawRevisionRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    first: Option<RevisionId>,
    #[serde(
        rename = "firstVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    first_version: Option<VersionValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last: Option<LastRevision>,
}

/// `firstVersion` appears both as a JSON number and as a numeric string.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum VersionValue {
    Number(Version),
    Text(String),
}

impl TryFrom<RawRevisionRef> for RevisionRef {
    type Error = String;

    fn try_from(raw: RawRevisionRef) -> Result<Self, Self::Error> {
        let last = raw.last.unwrap_or(LastRevision::Latest);
        match (raw.first, raw.first_version) {
            (Some(first), None) => Ok(RevisionRef::Span { first, last }),
            (None, Some(value)) => {
                let first_version = match value {
                    VersionValue::Number(v) => v,
                    VersionValue::Text(s) => {
                        parse_version("firstVersion", &s).map_err(|e| e.to_string())?
                    }
                };
                Ok(RevisionRef::FirstVersion {
                    first_version,
                    last,
                })
            }
            (Some(_), Some(_)) => Err("revisions carries both `first` and `firstVersion`".into()),
            (None, None) => Err("revisions needs `first` or `firstVersion`".into()),
        }
    }
}

impl From<RevisionRef> for RawRevisionRef {
    fn from(r: RevisionRef) -> Self {
        match r {
            RevisionRef::Span { first, last } => RawRevisionRef {
                first: Some(first),
                first_version: None,
                last: Some(last),
            },
            RevisionRef::FirstVersion {
                first_version,
                last,
            } => RawRevisionRef {
                first: None,
                first_version: Some(VersionValue::Number(first_version)),
                last: Some(last),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_log_keeps_dataset_order() {
        let json = r#"{"zz": {"version": "60"}, "aa": {"version": "61", "date": "x"}}"#;
        let log: RevisionLog = serde_json::from_str(json).unwrap();
        let ids: Vec<&str> = log.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["zz", "aa"]);
        let aa = log.get(&RevisionId::from("aa")).unwrap();
        assert_eq!(aa.parsed_version().unwrap(), 61);
        assert_eq!(aa.extra.get("date").unwrap(), "x");
    }

    #[test]
    fn repeated_revision_replaces_in_place() {
        let log = RevisionLog::new()
            .with("r1", "58")
            .with("r2", "59")
            .with("r1", "60");
        let ids: Vec<&str> = log.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2"]);
        assert_eq!(log.len(), 2);
        assert_eq!(log.get(&RevisionId::from("r1")).unwrap().version, "60");
        assert_eq!(log.get(&RevisionId::from("r2")).unwrap().version, "59");
        assert!(log.get(&RevisionId::from("r3")).is_none());
    }

    #[test]
    fn revision_log_serializes_as_map() {
        let log = RevisionLog::new().with("r2", "61").with("r1", "60");
        let json = serde_json::to_string(&log).unwrap();
        assert_eq!(json, r#"{"r2":{"version":"61"},"r1":{"version":"60"}}"#);
    }

    #[test]
    fn span_reference_deserializes() {
        let r: RevisionRef = serde_json::from_str(r#"{"first": "r1", "last": "latest"}"#).unwrap();
        assert_eq!(r, RevisionRef::span("r1", "latest"));
        assert_eq!(r.last(), &LastRevision::Latest);

        let r: RevisionRef = serde_json::from_str(r#"{"first": "r1", "last": "r2"}"#).unwrap();
        assert_eq!(
            r.last(),
            &LastRevision::Revision(RevisionId::from("r2"))
        );
    }

    #[test]
    fn first_version_reference_accepts_number_or_string() {
        let r: RevisionRef = serde_json::from_str(r#"{"firstVersion": 55}"#).unwrap();
        assert_eq!(r, RevisionRef::from_version(55));

        let r: RevisionRef = serde_json::from_str(r#"{"firstVersion": "56"}"#).unwrap();
        assert_eq!(r, RevisionRef::from_version(56));

        assert!(serde_json::from_str::<RevisionRef>(r#"{"firstVersion": "abc"}"#).is_err());
    }

    #[test]
    fn exactly_one_form_required() {
        assert!(serde_json::from_str::<RevisionRef>(r#"{"last": "latest"}"#).is_err());
        assert!(serde_json::from_str::<RevisionRef>(
            r#"{"first": "r1", "firstVersion": 3, "last": "latest"}"#
        )
        .is_err());
    }

    #[test]
    fn reference_serializes_back_to_wire_shape() {
        let json = serde_json::to_value(RevisionRef::span("r1", "r9")).unwrap();
        assert_eq!(json, serde_json::json!({"first": "r1", "last": "r9"}));

        let json = serde_json::to_value(RevisionRef::from_version(40)).unwrap();
        assert_eq!(json, serde_json::json!({"firstVersion": 40, "last": "latest"}));
    }
}
