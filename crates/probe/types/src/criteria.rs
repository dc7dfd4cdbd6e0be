//! Query criteria: lifecycle and text constraints
//!
//! Constraints are closed enumerations. Values arriving as strings (command
//! line, config files) go through `FromStr`, which is the only place an
//! unrecognized constraint can appear and is reported as
//! [`ProbeError::UnknownConstraint`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::{parse_version, Channel, ProbeError, Version};

/// Lifecycle constraint evaluated against a target version.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionConstraint {
    /// Recording at the version.
    #[default]
    IsIn,
    /// Introduced exactly at the version.
    NewIn,
    /// Expired at the version.
    IsExpired,
}

impl VersionConstraint {
    pub const ALL: [VersionConstraint; 3] = [
        VersionConstraint::IsIn,
        VersionConstraint::NewIn,
        VersionConstraint::IsExpired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VersionConstraint::IsIn => "is_in",
            VersionConstraint::NewIn => "new_in",
            VersionConstraint::IsExpired => "is_expired",
        }
    }

    /// Adjective used in chart captions ("Count of recorded probes").
    pub fn label(&self) -> &'static str {
        match self {
            VersionConstraint::IsIn => "recorded",
            VersionConstraint::NewIn => "new",
            VersionConstraint::IsExpired => "expired",
        }
    }
}

impl FromStr for VersionConstraint {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ProbeError::UnknownConstraint {
                kind: "version",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which text fields a free-text query is matched against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextConstraint {
    InName,
    InDescription,
    #[default]
    InAny,
}

impl TextConstraint {
    pub const ALL: [TextConstraint; 3] = [
        TextConstraint::InName,
        TextConstraint::InDescription,
        TextConstraint::InAny,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TextConstraint::InName => "in_name",
            TextConstraint::InDescription => "in_description",
            TextConstraint::InAny => "in_any",
        }
    }
}

impl FromStr for TextConstraint {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ProbeError::UnknownConstraint {
                kind: "text",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for TextConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target version of a query, or `any` when none is selected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VersionSelector {
    #[default]
    Any,
    Version(Version),
}

impl VersionSelector {
    pub fn version(&self) -> Option<Version> {
        match self {
            VersionSelector::Any => None,
            VersionSelector::Version(v) => Some(*v),
        }
    }
}

impl From<Version> for VersionSelector {
    fn from(v: Version) -> Self {
        VersionSelector::Version(v)
    }
}

impl FromStr for VersionSelector {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "any" {
            return Ok(VersionSelector::Any);
        }
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ProbeError::malformed("version", s));
        }
        parse_version("version", s).map(VersionSelector::Version)
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSelector::Any => f.write_str("any"),
            VersionSelector::Version(v) => write!(f, "{}", v),
        }
    }
}

impl Serialize for VersionSelector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            VersionSelector::Any => serializer.serialize_str("any"),
            VersionSelector::Version(v) => serializer.serialize_u32(*v),
        }
    }
}

impl<'de> Deserialize<'de> for VersionSelector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(Version),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(v) => Ok(VersionSelector::Version(v)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// One search query. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub channel: Channel,
    pub version_constraint: VersionConstraint,
    pub version: VersionSelector,
    pub text_constraint: TextConstraint,
    pub text: String,
    /// Keep only opt-out (release population) entries.
    pub optout_only: bool,
}

impl FilterCriteria {
    /// Criteria matching every entry of `channel`.
    pub fn new(channel: impl Into<Channel>) -> Self {
        Self {
            channel: channel.into(),
            version_constraint: VersionConstraint::default(),
            version: VersionSelector::Any,
            text_constraint: TextConstraint::default(),
            text: String::new(),
            optout_only: false,
        }
    }

    pub fn with_constraint(mut self, constraint: VersionConstraint) -> Self {
        self.version_constraint = constraint;
        self
    }

    pub fn with_version(mut self, version: impl Into<VersionSelector>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_text(mut self, constraint: TextConstraint, text: impl Into<String>) -> Self {
        self.text_constraint = constraint;
        self.text = text.into();
        self
    }

    pub fn with_optout_only(mut self, optout_only: bool) -> Self {
        self.optout_only = optout_only;
        self
    }
}
