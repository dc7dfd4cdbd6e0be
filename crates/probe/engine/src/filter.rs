//! Filtering probes down to the history entries matching a query

use serde::Serialize;

use probe_types::{Channel, FilterCriteria, HistoryEntry, ProbeId, ProbeMap, ProbeResult};
use tracing::debug;

use crate::{Dataset, PredicateEngine, TextQuery};

/// Applies [`FilterCriteria`] to probe maps of one dataset.
pub struct FilterPipeline<'a> {
    dataset: &'a Dataset,
    predicates: PredicateEngine<'a>,
}

impl<'a> FilterPipeline<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self {
            dataset,
            predicates: PredicateEngine::new(dataset.index()),
        }
    }

    /// Filter the whole dataset.
    pub fn filter(&self, criteria: &FilterCriteria) -> ProbeResult<ProbeMap> {
        self.filter_probes(self.dataset.probes(), criteria)
    }

    /// Filter an arbitrary probe map (e.g. a previous result) using this
    /// dataset's revisions.
    ///
    /// Each surviving probe keeps only the matching entries of
    /// `criteria.channel`; probes left without entries are dropped. Other
    /// channels and fields are passed through.
    pub fn filter_probes(&self, probes: &ProbeMap, criteria: &FilterCriteria) -> ProbeResult<ProbeMap> {
        let mut filtered = ProbeMap::new();
        if !self.dataset.index().has_channel(&criteria.channel) {
            debug!(channel = %criteria.channel, "no revisions for channel");
            return Ok(filtered);
        }

        let query = TextQuery::new(&criteria.text);
        for (id, probe) in probes {
            let Some(history) = probe.history_for(&criteria.channel) else {
                continue;
            };

            let matching = self.matching_entries(&probe.name, history, criteria, &query)?;
            if matching.is_empty() {
                continue;
            }

            let mut narrowed = probe.clone();
            narrowed.history.insert(criteria.channel.clone(), matching);
            filtered.insert(id.clone(), narrowed);
        }

        debug!(
            channel = %criteria.channel,
            constraint = %criteria.version_constraint,
            version = %criteria.version,
            matched = filtered.len(),
            "filtered probes"
        );
        Ok(filtered)
    }

    /// Opt-out, then version constraint, then text; each step only narrows.
    fn matching_entries(
        &self,
        name: &str,
        history: &[HistoryEntry],
        criteria: &FilterCriteria,
        query: &TextQuery,
    ) -> ProbeResult<Vec<HistoryEntry>> {
        let mut matching = Vec::new();
        for entry in history {
            if criteria.optout_only && !entry.optout {
                continue;
            }
            if !self.predicates.matches_version(
                criteria.version_constraint,
                entry,
                &criteria.channel,
                criteria.version,
            )? {
                continue;
            }
            if !query.matches(criteria.text_constraint, name, &entry.description) {
                continue;
            }
            matching.push(entry.clone());
        }
        Ok(matching)
    }
}

/// Filter `dataset` with `criteria`.
pub fn filter(dataset: &Dataset, criteria: &FilterCriteria) -> ProbeResult<ProbeMap> {
    FilterPipeline::new(dataset).filter(criteria)
}

/// Probe ids in listing order: by name segment, case-insensitive.
pub fn sorted_probe_ids(probes: &ProbeMap) -> Vec<&ProbeId> {
    let mut ids: Vec<&ProbeId> = probes.keys().collect();
    ids.sort_by_cached_key(|id| id.short_name().to_lowercase());
    ids
}

/// Counts shown alongside search results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SearchSummary {
    pub probe_count: usize,
    pub entry_count: usize,
}

impl SearchSummary {
    pub fn of(filtered: &ProbeMap, channel: &Channel) -> Self {
        Self {
            probe_count: filtered.len(),
            entry_count: filtered
                .values()
                .filter_map(|p| p.history_for(channel))
                .map(<[HistoryEntry]>::len)
                .sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExplorerConfig;
    use probe_types::{
        ExpiryVersion, ProbeDefinition, ProbeError, RevisionLog, RevisionRef, RevisionTable,
        TextConstraint, VersionConstraint,
    };

    fn dataset() -> Dataset {
        let mut revisions = RevisionTable::new();
        revisions.insert(
            Channel::from("release"),
            RevisionLog::new()
                .with("r1", "58")
                .with("r2", "59")
                .with("r3", "60"),
        );
        revisions.insert(
            Channel::from("beta"),
            RevisionLog::new().with("b1", "59").with("b2", "61"),
        );

        let mut probes = ProbeMap::new();
        probes.insert(
            ProbeId::from("histogram/UI_BUTTON_CLICK"),
            ProbeDefinition::new("UI_BUTTON_CLICK", "histogram")
                .with_history(
                    "release",
                    vec![
                        HistoryEntry::new(RevisionRef::span("r2", "latest"), ExpiryVersion::Never)
                            .with_description("Clicks, now opt-out")
                            .with_optout(true),
                        HistoryEntry::new(RevisionRef::span("r1", "r1"), ExpiryVersion::Never)
                            .with_description("Clicks on toolbar"),
                    ],
                )
                .with_history(
                    "beta",
                    vec![HistoryEntry::new(RevisionRef::span("b1", "latest"), ExpiryVersion::Never)],
                ),
        );
        probes.insert(
            ProbeId::from("scalar/gc.count"),
            ProbeDefinition::new("gc.count", "scalar").with_history(
                "release",
                vec![HistoryEntry::new(RevisionRef::span("r1", "latest"), ExpiryVersion::at(59))
                    .with_description("Number of GCs")],
            ),
        );
        probes.insert(
            ProbeId::from("event/nightly.only"),
            ProbeDefinition::new("nightly.only", "event").with_history(
                "nightly",
                vec![HistoryEntry::new(RevisionRef::from_version(60), ExpiryVersion::Never)],
            ),
        );

        Dataset::builder(ExplorerConfig::default())
            .revisions(revisions)
            .probes(probes)
            .build()
            .unwrap()
    }

    fn descriptions(map: &ProbeMap, id: &str) -> Vec<String> {
        map[&ProbeId::from(id)]
            .history_for(&Channel::from("release"))
            .unwrap()
            .iter()
            .map(|h| h.description.clone())
            .collect()
    }

    #[test]
    fn any_version_keeps_everything_on_channel() {
        let dataset = dataset();
        let result = filter(&dataset, &FilterCriteria::new("release")).unwrap();
        assert_eq!(result.len(), 2);
        assert!(!result.contains_key(&ProbeId::from("event/nightly.only")));
        assert_eq!(SearchSummary::of(&result, &Channel::from("release")).entry_count, 3);
    }

    #[test]
    fn optout_filter_narrows_entries() {
        let dataset = dataset();
        let criteria = FilterCriteria::new("release").with_optout_only(true);
        let result = filter(&dataset, &criteria).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(
            descriptions(&result, "histogram/UI_BUTTON_CLICK"),
            vec!["Clicks, now opt-out"]
        );
    }

    #[test]
    fn version_filter_keeps_only_matching_entries() {
        let dataset = dataset();
        let criteria = FilterCriteria::new("release")
            .with_constraint(VersionConstraint::IsIn)
            .with_version(58);
        let result = filter(&dataset, &criteria).unwrap();
        assert_eq!(
            descriptions(&result, "histogram/UI_BUTTON_CLICK"),
            vec!["Clicks on toolbar"]
        );
        assert!(result.contains_key(&ProbeId::from("scalar/gc.count")));

        // gc.count expires at 59, so it is gone at 60.
        let criteria = criteria.with_version(60);
        let result = filter(&dataset, &criteria).unwrap();
        assert!(!result.contains_key(&ProbeId::from("scalar/gc.count")));
    }

    #[test]
    fn other_channels_pass_through() {
        let dataset = dataset();
        let criteria = FilterCriteria::new("release").with_optout_only(true);
        let result = filter(&dataset, &criteria).unwrap();
        let probe = &result[&ProbeId::from("histogram/UI_BUTTON_CLICK")];
        assert_eq!(probe.history_for(&Channel::from("beta")).unwrap().len(), 1);
        assert_eq!(probe.probe_type, "histogram");
    }

    #[test]
    fn text_filter() {
        let dataset = dataset();
        let criteria =
            FilterCriteria::new("release").with_text(TextConstraint::InDescription, "TOOLBAR");
        let result = filter(&dataset, &criteria).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(
            descriptions(&result, "histogram/UI_BUTTON_CLICK"),
            vec!["Clicks on toolbar"]
        );

        let criteria = FilterCriteria::new("release").with_text(TextConstraint::InName, "gc");
        let result = filter(&dataset, &criteria).unwrap();
        assert_eq!(result.keys().collect::<Vec<_>>(), vec![&ProbeId::from("scalar/gc.count")]);
    }

    #[test]
    fn expired_any_version_needs_numeric_expiry() {
        let dataset = dataset();
        let criteria = FilterCriteria::new("release").with_constraint(VersionConstraint::IsExpired);
        let result = filter(&dataset, &criteria).unwrap();
        assert_eq!(result.keys().collect::<Vec<_>>(), vec![&ProbeId::from("scalar/gc.count")]);
    }

    #[test]
    fn unknown_channel_yields_nothing() {
        let dataset = dataset();
        // nightly has probes but no revisions.
        let result = filter(&dataset, &FilterCriteria::new("nightly")).unwrap();
        assert!(result.is_empty());
        let result = filter(&dataset, &FilterCriteria::new("esr")).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn filter_is_idempotent() {
        let dataset = dataset();
        let pipeline = FilterPipeline::new(&dataset);
        let criteria = FilterCriteria::new("release")
            .with_version(59)
            .with_text(TextConstraint::InAny, "click");
        let once = pipeline.filter(&criteria).unwrap();
        let twice = pipeline.filter_probes(&once, &criteria).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn malformed_expiry_surfaces() {
        let dataset = dataset();
        let mut probes = dataset.probes().clone();
        probes.insert(
            ProbeId::from("scalar/bad"),
            ProbeDefinition::new("bad", "scalar").with_history(
                "release",
                vec![HistoryEntry::new(
                    RevisionRef::span("r1", "latest"),
                    ExpiryVersion::Version("later".into()),
                )],
            ),
        );
        let criteria = FilterCriteria::new("release").with_version(59);
        let err = FilterPipeline::new(&dataset)
            .filter_probes(&probes, &criteria)
            .unwrap_err();
        assert_eq!(err, ProbeError::malformed("expiry_version", "later"));
    }

    #[test]
    fn listing_order_is_by_name() {
        let mut probes = ProbeMap::new();
        for id in ["scalar/zeta", "histogram/Alpha", "event/beta"] {
            probes.insert(ProbeId::from(id), ProbeDefinition::new(id, "x"));
        }
        let ids: Vec<&str> = sorted_probe_ids(&probes).iter().map(|i| i.as_str()).collect();
        assert_eq!(ids, vec!["histogram/Alpha", "event/beta", "scalar/zeta"]);
    }
}
