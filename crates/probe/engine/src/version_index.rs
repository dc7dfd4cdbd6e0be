//! Per-channel `version ↔ revision` index
//!
//! Built once per dataset load from the raw revision table. Several builds
//! may ship the same version; the index keeps the revision seen last in
//! dataset order for each version, while the reverse direction keeps every
//! revision so that history entries can address any build directly.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use probe_types::{Channel, ProbeResult, RevisionId, RevisionTable, Version};
use tracing::debug;

#[derive(Clone, Debug, Default)]
struct ChannelVersions {
    by_version: BTreeMap<Version, RevisionId>,
    by_revision: HashMap<RevisionId, Version>,
}

/// Bidirectional version index over every channel of a dataset.
#[derive(Clone, Debug, Default)]
pub struct VersionIndex {
    channels: BTreeMap<Channel, ChannelVersions>,
}

impl VersionIndex {
    /// Build the index from `channel → revision → {version}`.
    ///
    /// Fails with `MalformedVersion` if any revision carries a non-numeric
    /// version. Channels without revisions are left out.
    pub fn build(table: &RevisionTable) -> ProbeResult<Self> {
        let mut channels = BTreeMap::new();

        for (channel, log) in table {
            if log.is_empty() {
                continue;
            }

            let mut versions = ChannelVersions::default();
            for (revision, details) in log.iter() {
                let version = details.parsed_version()?;
                versions.by_version.insert(version, revision.clone());
                versions.by_revision.insert(revision.clone(), version);
            }

            debug!(
                channel = %channel,
                revisions = versions.by_revision.len(),
                versions = versions.by_version.len(),
                "indexed channel"
            );
            channels.insert(channel.clone(), versions);
        }

        Ok(Self { channels })
    }

    /// Whether the channel has any known version.
    pub fn has_channel(&self, channel: &Channel) -> bool {
        self.channels.contains_key(channel)
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.keys()
    }

    /// All versions known to a channel, ascending. Empty for unknown channels.
    pub fn versions_of(&self, channel: &Channel) -> BTreeSet<Version> {
        self.channels
            .get(channel)
            .map(|c| c.by_version.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Last-seen revision that shipped `version` on the channel.
    pub fn revision_of(&self, channel: &Channel, version: Version) -> Option<&RevisionId> {
        self.channels.get(channel)?.by_version.get(&version)
    }

    /// Version of any revision of the channel, looked up by id.
    pub fn version_of_revision(&self, channel: &Channel, revision: &RevisionId) -> Option<Version> {
        self.channels.get(channel)?.by_revision.get(revision).copied()
    }

    pub fn max_version(&self, channel: &Channel) -> Option<Version> {
        self.channels
            .get(channel)?
            .by_version
            .last_key_value()
            .map(|(v, _)| *v)
    }

    pub fn min_version(&self, channel: &Channel) -> Option<Version> {
        self.channels
            .get(channel)?
            .by_version
            .first_key_value()
            .map(|(v, _)| *v)
    }

    /// Union of versions across channels, newest first.
    pub fn all_versions(&self) -> Vec<Version> {
        let all: BTreeSet<Version> = self
            .channels
            .values()
            .flat_map(|c| c.by_version.keys().copied())
            .collect();
        all.into_iter().rev().collect()
    }

    /// Clamp a selected version into the channel's known span.
    ///
    /// Versions below the oldest or above the newest known version snap to
    /// that bound; anything in between is returned unchanged.
    pub fn closest_version(&self, channel: &Channel, version: Version) -> Option<Version> {
        let min = self.min_version(channel)?;
        let max = self.max_version(channel)?;
        Some(version.clamp(min, max))
    }

    /// Total number of revisions indexed across channels.
    pub fn revision_count(&self) -> usize {
        self.channels.values().map(|c| c.by_revision.len()).sum()
    }
}
