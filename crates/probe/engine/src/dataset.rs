//! The immutable, normalized probe dataset
//!
//! A [`Dataset`] is assembled once after every input has been loaded and is
//! only ever handed out by shared reference, so no query can observe a
//! partially built dataset.
//!
//! Normalization performed by [`DatasetBuilder::build`]:
//!
//! 1. index the revision table;
//! 2. replace the `all` pseudo-channel of each probe with independent copies
//!    for every configured channel;
//! 3. merge supplementary probe sets over the main one;
//! 4. order every history newest first by resolved introduction version.
//!    A history with an unresolvable entry keeps its input order; the
//!    resolution error surfaces from the query that touches it.

use std::cmp::Reverse;

use probe_types::{
    Channel, DatasetMappings, GeneralInfo, HistoryEntry, ProbeDefinition, ProbeId, ProbeMap,
    ProbeResult, RevisionTable,
};
use tracing::{debug, info, warn};

use crate::{ExplorerConfig, RangeResolver, VersionIndex};

/// Loaded probe data plus its version index.
#[derive(Clone, Debug)]
pub struct Dataset {
    config: ExplorerConfig,
    index: VersionIndex,
    probes: ProbeMap,
    general: Option<GeneralInfo>,
    mappings: DatasetMappings,
}

impl Dataset {
    pub fn builder(config: ExplorerConfig) -> DatasetBuilder {
        DatasetBuilder::new(config)
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn index(&self) -> &VersionIndex {
        &self.index
    }

    pub fn probes(&self) -> &ProbeMap {
        &self.probes
    }

    pub fn probe(&self, id: &ProbeId) -> Option<&ProbeDefinition> {
        self.probes.get(id)
    }

    pub fn general(&self) -> Option<&GeneralInfo> {
        self.general.as_ref()
    }

    pub fn mappings(&self) -> &DatasetMappings {
        &self.mappings
    }

    pub fn resolver(&self) -> RangeResolver<'_> {
        RangeResolver::new(&self.index)
    }

    /// Find a probe id ignoring ASCII and Unicode case.
    pub fn find_probe_id(&self, query: &str) -> Option<&ProbeId> {
        let wanted = query.to_lowercase();
        self.probes
            .keys()
            .find(|id| id.as_str().to_lowercase() == wanted)
    }
}

/// Collects raw inputs and produces a normalized [`Dataset`].
#[derive(Debug)]
pub struct DatasetBuilder {
    config: ExplorerConfig,
    revisions: RevisionTable,
    probes: ProbeMap,
    supplementary: Vec<ProbeMap>,
    general: Option<GeneralInfo>,
    mappings: DatasetMappings,
}

impl DatasetBuilder {
    pub fn new(config: ExplorerConfig) -> Self {
        Self {
            config,
            revisions: RevisionTable::new(),
            probes: ProbeMap::new(),
            supplementary: Vec::new(),
            general: None,
            mappings: DatasetMappings::new(),
        }
    }

    pub fn revisions(mut self, revisions: RevisionTable) -> Self {
        self.revisions = revisions;
        self
    }

    pub fn probes(mut self, probes: ProbeMap) -> Self {
        self.probes = probes;
        self
    }

    /// Add a probe set (environment fields, simple measurements, ...).
    /// Its probes replace main probes with the same id.
    pub fn supplementary_probes(mut self, probes: ProbeMap) -> Self {
        self.supplementary.push(probes);
        self
    }

    pub fn general(mut self, general: GeneralInfo) -> Self {
        self.general = Some(general);
        self
    }

    pub fn dataset_mappings(mut self, mappings: DatasetMappings) -> Self {
        self.mappings = mappings;
        self
    }

    pub fn build(self) -> ProbeResult<Dataset> {
        let index = VersionIndex::build(&self.revisions)?;

        let mut probes = self.probes;
        for set in self.supplementary {
            probes.extend(set);
        }

        let resolver = RangeResolver::new(&index);
        for (id, probe) in probes.iter_mut() {
            explode_all_channel(probe, &self.config.explode_channels);
            for (channel, history) in probe.history.iter_mut() {
                if !index.has_channel(channel) {
                    continue;
                }
                match order_newest_first(&resolver, channel, history) {
                    Ok(true) => {
                        debug!(probe = %id, channel = %channel, "reordered history newest first")
                    }
                    Ok(false) => {}
                    Err(e) => warn!(
                        probe = %id,
                        channel = %channel,
                        error = %e,
                        "unresolvable history entry, keeping input order"
                    ),
                }
            }
        }

        info!(
            channels = index.channels().count(),
            revisions = index.revision_count(),
            probes = probes.len(),
            "dataset loaded"
        );

        Ok(Dataset {
            config: self.config,
            index,
            probes,
            general: self.general,
            mappings: self.mappings,
        })
    }
}

/// Replace an `all` history with one independent copy per channel.
fn explode_all_channel(probe: &mut ProbeDefinition, channels: &[Channel]) {
    let Some(shared) = probe.history.remove(&Channel::from(Channel::ALL)) else {
        return;
    };
    for channel in channels {
        probe.history.insert(channel.clone(), shared.clone());
    }
}

/// Stable sort by introduction version, newest first. Returns whether the
/// input order changed. The history is left untouched when any entry fails
/// to resolve.
fn order_newest_first(
    resolver: &RangeResolver<'_>,
    channel: &Channel,
    history: &mut Vec<HistoryEntry>,
) -> ProbeResult<bool> {
    let firsts = history
        .iter()
        .map(|entry| resolver.resolve(channel, &entry.revisions).map(|r| r.first))
        .collect::<ProbeResult<Vec<_>>>()?;

    if firsts.windows(2).all(|w| w[0] >= w[1]) {
        return Ok(false);
    }
    let mut keyed: Vec<_> = firsts.into_iter().zip(std::mem::take(history)).collect();
    keyed.sort_by_key(|(first, _)| Reverse(*first));
    history.extend(keyed.into_iter().map(|(_, entry)| entry));
    Ok(true)
}
