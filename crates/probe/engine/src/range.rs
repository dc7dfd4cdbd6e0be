//! Resolution of revision references into integer version ranges

use serde::Serialize;

use probe_types::{
    Channel, LastRevision, ProbeError, ProbeResult, RevisionId, RevisionRef, Version,
};
use tracing::warn;

use crate::VersionIndex;

/// Inclusive `[first, last]` version span of a history entry on a channel.
///
/// Computed per query, never stored. An inverted range (`first > last`)
/// comes from bad upstream data and contains no version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedRange {
    pub first: Version,
    pub last: Version,
}

impl ResolvedRange {
    pub fn new(first: Version, last: Version) -> Self {
        Self { first, last }
    }

    pub fn contains(&self, version: Version) -> bool {
        self.first <= version && version <= self.last
    }

    pub fn is_inverted(&self) -> bool {
        self.first > self.last
    }
}

/// Resolves [`RevisionRef`]s against a channel's revision table.
#[derive(Clone, Copy, Debug)]
pub struct RangeResolver<'a> {
    index: &'a VersionIndex,
}

impl<'a> RangeResolver<'a> {
    pub fn new(index: &'a VersionIndex) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &'a VersionIndex {
        self.index
    }

    /// Resolve a reference on `channel`.
    ///
    /// `first`/`last` revisions are looked up by id in the channel's table;
    /// `latest` resolves to the channel's newest version. The range is not
    /// checked for `first <= last`.
    pub fn resolve(&self, channel: &Channel, reference: &RevisionRef) -> ProbeResult<ResolvedRange> {
        let first = match reference {
            RevisionRef::Span { first, .. } => self.lookup(channel, first)?,
            RevisionRef::FirstVersion { first_version, .. } => *first_version,
        };

        let last = match reference.last() {
            LastRevision::Latest => self
                .index
                .max_version(channel)
                .ok_or_else(|| ProbeError::EmptyChannel(channel.clone()))?,
            LastRevision::Revision(revision) => self.lookup(channel, revision)?,
        };

        let range = ResolvedRange::new(first, last);
        if range.is_inverted() {
            warn!(
                channel = %channel,
                first,
                last,
                "inverted version range, entry will never match"
            );
        }
        Ok(range)
    }

    fn lookup(&self, channel: &Channel, revision: &RevisionId) -> ProbeResult<Version> {
        self.index
            .version_of_revision(channel, revision)
            .ok_or_else(|| ProbeError::UnknownRevision {
                channel: channel.clone(),
                revision: revision.clone(),
            })
    }
}
