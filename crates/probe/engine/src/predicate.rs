//! Lifecycle and text predicates over history entries
//!
//! Lifecycle predicates (target version `v`, resolved range `[first, last]`):
//!
//! | constraint   | holds when                                                  |
//! |--------------|-------------------------------------------------------------|
//! | `is_in`      | `first <= v <= last` and expiry is `never` or `>= v`        |
//! | `new_in`     | `first == v`                                                |
//! | `is_expired` | `first <= v <= last` and expiry is numeric and `<= v`       |
//!
//! Without a target version (`any`), `is_in` and `new_in` always hold and
//! `is_expired` reduces to "has a numeric expiry".

use probe_types::{
    Channel, HistoryEntry, ProbeResult, TextConstraint, Version, VersionConstraint,
    VersionSelector,
};

use crate::{RangeResolver, ResolvedRange, VersionIndex};

/// Recording at `v`: inside the range and not yet expired.
pub fn recording_at(range: ResolvedRange, expiry: Option<Version>, v: Version) -> bool {
    range.contains(v) && expiry.map_or(true, |e| e >= v)
}

/// Introduced exactly at `v`.
pub fn introduced_at(range: ResolvedRange, v: Version) -> bool {
    !range.is_inverted() && range.first == v
}

/// Inside the range and expired at or before `v`.
pub fn expired_at(range: ResolvedRange, expiry: Option<Version>, v: Version) -> bool {
    range.contains(v) && expiry.is_some_and(|e| e <= v)
}

/// Evaluates lifecycle constraints for entries of a dataset.
#[derive(Clone, Copy, Debug)]
pub struct PredicateEngine<'a> {
    resolver: RangeResolver<'a>,
}

impl<'a> PredicateEngine<'a> {
    pub fn new(index: &'a VersionIndex) -> Self {
        Self {
            resolver: RangeResolver::new(index),
        }
    }

    pub fn resolver(&self) -> &RangeResolver<'a> {
        &self.resolver
    }

    /// Evaluate `constraint` for `entry` on `channel` at `target`.
    pub fn matches_version(
        &self,
        constraint: VersionConstraint,
        entry: &HistoryEntry,
        channel: &Channel,
        target: VersionSelector,
    ) -> ProbeResult<bool> {
        match (constraint, target) {
            (VersionConstraint::IsIn | VersionConstraint::NewIn, VersionSelector::Any) => Ok(true),
            (VersionConstraint::IsExpired, VersionSelector::Any) => {
                Ok(!entry.expiry_version.is_never())
            }
            (VersionConstraint::IsIn, VersionSelector::Version(v)) => self.is_in(entry, channel, v),
            (VersionConstraint::NewIn, VersionSelector::Version(v)) => {
                self.new_in(entry, channel, v)
            }
            (VersionConstraint::IsExpired, VersionSelector::Version(v)) => {
                self.is_expired(entry, channel, v)
            }
        }
    }

    pub fn is_in(&self, entry: &HistoryEntry, channel: &Channel, v: Version) -> ProbeResult<bool> {
        let range = self.resolver.resolve(channel, &entry.revisions)?;
        let expiry = entry.expiry_version.version()?;
        Ok(recording_at(range, expiry, v))
    }

    pub fn new_in(&self, entry: &HistoryEntry, channel: &Channel, v: Version) -> ProbeResult<bool> {
        let range = self.resolver.resolve(channel, &entry.revisions)?;
        Ok(introduced_at(range, v))
    }

    pub fn is_expired(
        &self,
        entry: &HistoryEntry,
        channel: &Channel,
        v: Version,
    ) -> ProbeResult<bool> {
        let range = self.resolver.resolve(channel, &entry.revisions)?;
        let expiry = entry.expiry_version.version()?;
        Ok(expired_at(range, expiry, v))
    }
}

/// A case-insensitive free-text query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextQuery {
    needle: String,
}

impl TextQuery {
    pub fn new(text: &str) -> Self {
        Self {
            needle: text.to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    fn found_in(&self, haystack: &str) -> bool {
        haystack.to_lowercase().contains(&self.needle)
    }

    /// Match against a probe name and an entry description.
    /// An empty query matches everything.
    pub fn matches(&self, constraint: TextConstraint, name: &str, description: &str) -> bool {
        if self.is_empty() {
            return true;
        }
        match constraint {
            TextConstraint::InName => self.found_in(name),
            TextConstraint::InDescription => self.found_in(description),
            TextConstraint::InAny => self.found_in(name) || self.found_in(description),
        }
    }
}
