//! Per-version opt-in/opt-out counts for the stats chart

use std::collections::BTreeMap;

use probe_types::{
    AggregationBucket, Channel, HistoryEntry, ProbeResult, Version, VersionConstraint,
};
use tracing::debug;

use crate::predicate::{expired_at, recording_at};
use crate::{Dataset, RangeResolver, ResolvedRange};

/// Computes count series over every probe of a dataset.
pub struct Aggregator<'a> {
    dataset: &'a Dataset,
    resolver: RangeResolver<'a>,
}

impl<'a> Aggregator<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self {
            dataset,
            resolver: dataset.resolver(),
        }
    }

    /// One bucket per known version of `channel`, ascending, untrimmed.
    ///
    /// - `new_in`: each probe counts once, at the introduction version of its
    ///   oldest entry.
    /// - `is_in`: per version, the first entry recording at that version
    ///   counts; at most one entry per probe per version.
    /// - `is_expired`: only the newest entry is considered, at every version
    ///   it is expired at.
    pub fn counts_per_version(
        &self,
        channel: &Channel,
        constraint: VersionConstraint,
    ) -> ProbeResult<Vec<AggregationBucket>> {
        let mut buckets: BTreeMap<Version, AggregationBucket> = self
            .dataset
            .index()
            .versions_of(channel)
            .into_iter()
            .map(|v| (v, AggregationBucket::empty(v)))
            .collect();
        if buckets.is_empty() {
            return Ok(Vec::new());
        }

        for (id, probe) in self.dataset.probes() {
            let Some(history) = probe.history_for(channel) else {
                continue;
            };

            match constraint {
                VersionConstraint::NewIn => {
                    let Some(oldest) = history.last() else {
                        continue;
                    };
                    let range = self.resolver.resolve(channel, &oldest.revisions)?;
                    if range.is_inverted() {
                        continue;
                    }
                    match buckets.get_mut(&range.first) {
                        Some(bucket) => bucket.record(oldest.optout),
                        None => debug!(
                            probe = %id,
                            version = range.first,
                            "introduction version unknown to channel, not counted"
                        ),
                    }
                }
                VersionConstraint::IsIn => {
                    let resolved = self.resolve_all(channel, history)?;
                    for (version, bucket) in buckets.iter_mut() {
                        let recording = resolved
                            .iter()
                            .find(|(range, expiry, _)| recording_at(*range, *expiry, *version));
                        if let Some((_, _, optout)) = recording {
                            bucket.record(*optout);
                        }
                    }
                }
                VersionConstraint::IsExpired => {
                    let Some(newest) = history.first() else {
                        continue;
                    };
                    let range = self.resolver.resolve(channel, &newest.revisions)?;
                    let expiry = newest.expiry_version.version()?;
                    for (version, bucket) in buckets.iter_mut() {
                        if expired_at(range, expiry, *version) {
                            bucket.record(newest.optout);
                        }
                    }
                }
            }
        }

        Ok(buckets.into_values().collect())
    }

    /// Counts trimmed for display, see [`trim_series`].
    pub fn count_series(
        &self,
        channel: &Channel,
        constraint: VersionConstraint,
    ) -> ProbeResult<Vec<AggregationBucket>> {
        let raw = self.counts_per_version(channel, constraint)?;
        let series = trim_series(raw);
        debug!(
            channel = %channel,
            constraint = %constraint,
            buckets = series.len(),
            "computed count series"
        );
        Ok(series)
    }

    fn resolve_all(
        &self,
        channel: &Channel,
        history: &[HistoryEntry],
    ) -> ProbeResult<Vec<(ResolvedRange, Option<Version>, bool)>> {
        history
            .iter()
            .map(|h| {
                Ok((
                    self.resolver.resolve(channel, &h.revisions)?,
                    h.expiry_version.version()?,
                    h.optout,
                ))
            })
            .collect()
    }
}

/// Prepare a count series for charting.
///
/// Sorts by version, drops leading and trailing zero-total buckets, then
/// drops the earliest remaining bucket: every probe still tracked when the
/// data begins shows up as introduced there, which would dwarf the rest of
/// the chart. Never underflows; fewer than two non-empty buckets yield an
/// empty series.
pub fn trim_series(mut buckets: Vec<AggregationBucket>) -> Vec<AggregationBucket> {
    buckets.sort_by_key(|b| b.version);

    let Some(start) = buckets.iter().position(|b| !b.is_empty()) else {
        return Vec::new();
    };
    let end = buckets
        .iter()
        .rposition(|b| !b.is_empty())
        .map_or(start, |i| i + 1);

    buckets
        .drain(start..end)
        .skip(1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExplorerConfig;
    use probe_types::{
        ExpiryVersion, ProbeDefinition, ProbeId, ProbeMap, RevisionLog, RevisionRef, RevisionTable,
    };

    fn bucket(version: Version, optin: u64, optout: u64) -> AggregationBucket {
        AggregationBucket {
            version,
            optin,
            optout,
            total: optin + optout,
        }
    }

    fn dataset(probes: ProbeMap) -> Dataset {
        let mut revisions = RevisionTable::new();
        revisions.insert(
            Channel::from("release"),
            RevisionLog::new()
                .with("r57", "57")
                .with("r58", "58")
                .with("r59", "59")
                .with("r60", "60")
                .with("r61", "61"),
        );
        Dataset::builder(ExplorerConfig::default())
            .revisions(revisions)
            .probes(probes)
            .build()
            .unwrap()
    }

    fn entry(first: &str, last: &str, expiry: ExpiryVersion, optout: bool) -> HistoryEntry {
        HistoryEntry::new(RevisionRef::span(first, last), expiry).with_optout(optout)
    }

    fn probe(id: &str, history: Vec<HistoryEntry>) -> (ProbeId, ProbeDefinition) {
        (
            ProbeId::from(id),
            ProbeDefinition::new(id, "histogram").with_history("release", history),
        )
    }

    fn totals(buckets: &[AggregationBucket]) -> Vec<(Version, u64, u64)> {
        buckets.iter().map(|b| (b.version, b.optin, b.optout)).collect()
    }

    #[test]
    fn new_in_counts_oldest_entry_once() {
        let probes = ProbeMap::from([
            probe(
                "a",
                vec![
                    entry("r60", "latest", ExpiryVersion::Never, true),
                    entry("r58", "r59", ExpiryVersion::Never, false),
                ],
            ),
            probe("b", vec![entry("r58", "latest", ExpiryVersion::Never, true)]),
            probe("c", vec![entry("r61", "latest", ExpiryVersion::Never, false)]),
        ]);
        let dataset = dataset(probes);
        let counts = Aggregator::new(&dataset)
            .counts_per_version(&Channel::from("release"), VersionConstraint::NewIn)
            .unwrap();
        assert_eq!(
            totals(&counts),
            vec![(57, 0, 0), (58, 1, 1), (59, 0, 0), (60, 0, 0), (61, 1, 0)]
        );
    }

    #[test]
    fn is_in_counts_first_matching_entry_per_version() {
        // Overlapping entries at 59: only the newest (first) counts, as opt-out.
        let probes = ProbeMap::from([probe(
            "a",
            vec![
                entry("r59", "latest", ExpiryVersion::Never, true),
                entry("r58", "r59", ExpiryVersion::Never, false),
            ],
        )]);
        let dataset = dataset(probes);
        let counts = Aggregator::new(&dataset)
            .counts_per_version(&Channel::from("release"), VersionConstraint::IsIn)
            .unwrap();
        assert_eq!(
            totals(&counts),
            vec![(57, 0, 0), (58, 1, 0), (59, 0, 1), (60, 0, 1), (61, 0, 1)]
        );
    }

    #[test]
    fn is_in_respects_expiry() {
        let probes = ProbeMap::from([probe(
            "a",
            vec![entry("r57", "latest", ExpiryVersion::at(59), false)],
        )]);
        let dataset = dataset(probes);
        let counts = Aggregator::new(&dataset)
            .counts_per_version(&Channel::from("release"), VersionConstraint::IsIn)
            .unwrap();
        let recorded: Vec<Version> = counts.iter().filter(|b| b.total > 0).map(|b| b.version).collect();
        assert_eq!(recorded, vec![57, 58, 59]);
    }

    #[test]
    fn is_expired_uses_newest_entry_only() {
        let probes = ProbeMap::from([probe(
            "a",
            vec![
                entry("r59", "latest", ExpiryVersion::at(60), true),
                entry("r57", "r58", ExpiryVersion::at(57), false),
            ],
        )]);
        let dataset = dataset(probes);
        let counts = Aggregator::new(&dataset)
            .counts_per_version(&Channel::from("release"), VersionConstraint::IsExpired)
            .unwrap();
        assert_eq!(
            totals(&counts),
            vec![(57, 0, 0), (58, 0, 0), (59, 0, 0), (60, 0, 1), (61, 0, 1)]
        );
    }

    #[test]
    fn new_in_skips_versions_outside_channel() {
        let probes = ProbeMap::from([(
            ProbeId::from("old"),
            ProbeDefinition::new("old", "histogram").with_history(
                "release",
                vec![HistoryEntry::new(RevisionRef::from_version(40), ExpiryVersion::Never)],
            ),
        )]);
        let dataset = dataset(probes);
        let counts = Aggregator::new(&dataset)
            .counts_per_version(&Channel::from("release"), VersionConstraint::NewIn)
            .unwrap();
        assert!(counts.iter().all(AggregationBucket::is_empty));
    }

    #[test]
    fn unknown_channel_has_no_buckets() {
        let dataset = dataset(ProbeMap::new());
        let counts = Aggregator::new(&dataset)
            .counts_per_version(&Channel::from("beta"), VersionConstraint::IsIn)
            .unwrap();
        assert!(counts.is_empty());
    }

    #[test]
    fn trim_drops_edges_and_first_nonzero() {
        let series = vec![
            bucket(61, 0, 0),
            bucket(57, 0, 0),
            bucket(58, 4, 4),
            bucket(59, 1, 0),
            bucket(60, 0, 2),
            bucket(62, 0, 0),
        ];
        assert_eq!(totals(&trim_series(series)), vec![(59, 1, 0), (60, 0, 2)]);
    }

    #[test]
    fn trim_keeps_interior_zeros() {
        let series = vec![bucket(1, 1, 0), bucket(2, 1, 0), bucket(3, 0, 0), bucket(4, 0, 1)];
        assert_eq!(totals(&trim_series(series)), vec![(2, 1, 0), (3, 0, 0), (4, 0, 1)]);
    }

    #[test]
    fn trim_never_underflows() {
        assert!(trim_series(Vec::new()).is_empty());
        assert!(trim_series(vec![bucket(1, 0, 0), bucket(2, 0, 0)]).is_empty());
        assert!(trim_series(vec![bucket(1, 0, 5)]).is_empty());
        assert!(trim_series(vec![bucket(1, 0, 0), bucket(2, 5, 0), bucket(3, 0, 0)]).is_empty());
        assert_eq!(trim_series(vec![bucket(1, 1, 0), bucket(2, 2, 0)]).len(), 1);
    }
}
