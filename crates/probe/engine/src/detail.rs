//! Detail summary for a single probe

use serde::Serialize;

use probe_types::{Channel, HistoryEntry, ProbeDefinition, ProbeId, ProbeResult, Version};

use crate::{Dataset, ExplorerConfig, ResolvedRange};

/// Detail properties and the probe types they apply to.
const DETAIL_PROPERTIES: &[(&str, &[&str])] = &[
    ("kind", &["histogram", "scalar", "environment", "info", "simpleMeasurements"]),
    ("keyed", &["histogram", "scalar"]),
    ("record_in_processes", &["scalar", "event"]),
    ("cpp_guard", &["histogram", "scalar", "event"]),
    ("low", &["histogram"]),
    ("high", &["histogram"]),
    ("n_buckets", &["histogram"]),
    ("methods", &["event"]),
    ("objects", &["event"]),
    ("extra_keys", &["event"]),
];

const LONGITUDINAL: &str = "longitudinal";

/// Telemetry dashboard flavour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DashboardKind {
    Distribution,
    Evolution,
}

impl DashboardKind {
    fn page(&self) -> &'static str {
        match self {
            DashboardKind::Distribution => "dist",
            DashboardKind::Evolution => "evo",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChannelRecording {
    pub channel: Channel,
    pub recorded: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DashboardLinks {
    pub distribution: String,
    pub evolution: String,
}

/// Where the probe can be found in derived datasets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DatasetAlias {
    pub dataset: String,
    pub names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BugLink {
    pub number: u64,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DetailProperty {
    pub name: String,
    pub value: String,
}

/// Everything the detail view shows for one probe on one channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProbeDetail {
    pub id: ProbeId,
    pub name: String,
    pub probe_type: String,
    pub channel: Channel,
    pub population: String,
    pub description: String,
    pub recording: Vec<ChannelRecording>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboards: Option<DashboardLinks>,
    pub datasets: Vec<DatasetAlias>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_counter_url: Option<String>,
    pub bugs: Vec<BugLink>,
    pub properties: Vec<DetailProperty>,
}

impl ProbeDetail {
    /// Build the detail summary from the probe's newest state on `channel`.
    ///
    /// Returns `None` when the probe is unknown or has no history there.
    pub fn build(dataset: &Dataset, id: &ProbeId, channel: &Channel) -> ProbeResult<Option<Self>> {
        let Some(probe) = dataset.probe(id) else {
            return Ok(None);
        };
        let Some(state) = probe.newest(channel) else {
            return Ok(None);
        };
        let config = dataset.config();
        let resolver = dataset.resolver();

        let mut recording = Vec::new();
        for (ch, history) in &probe.history {
            if !dataset.index().has_channel(ch) {
                continue;
            }
            if let Some(text) = recording_range_for_history(dataset, ch, history)? {
                recording.push(ChannelRecording {
                    channel: ch.clone(),
                    recorded: text,
                });
            }
        }

        let dashboards = if has_dashboard(probe, state) && dataset.index().has_channel(channel) {
            let range = resolver.resolve(channel, &state.revisions)?;
            Some(DashboardLinks {
                distribution: dashboard_url(config, DashboardKind::Distribution, probe, channel, range),
                evolution: dashboard_url(config, DashboardKind::Evolution, probe, channel, range),
            })
        } else {
            None
        };

        Ok(Some(Self {
            id: id.clone(),
            name: probe.name.clone(),
            probe_type: probe.probe_type.clone(),
            channel: channel.clone(),
            population: state.population().to_string(),
            description: state.description.clone(),
            recording,
            dashboards,
            datasets: dataset_aliases(dataset, id, probe, state),
            use_counter_url: use_counter_url(config, probe),
            bugs: state
                .bug_numbers
                .iter()
                .map(|n| BugLink {
                    number: *n,
                    url: format!("{}{}", config.bugzilla_url, n),
                })
                .collect(),
            properties: detail_properties(probe, state),
        }))
    }
}

/// Human-readable recording span: `from 60`, or `60 to 64` when the probe
/// expires in 65.
pub fn recording_range_text(first: Version, expiry: &probe_types::ExpiryVersion) -> ProbeResult<String> {
    Ok(match expiry.version()? {
        None => format!("from {}", first),
        Some(e) => format!("{} to {}", first, e.saturating_sub(1)),
    })
}

/// Span of a whole channel history: introduction of the oldest entry to the
/// expiry of the newest.
fn recording_range_for_history(
    dataset: &Dataset,
    channel: &Channel,
    history: &[HistoryEntry],
) -> ProbeResult<Option<String>> {
    // Newest first: the start comes from the last entry, the expiry from the first.
    let (Some(newest), Some(oldest)) = (history.first(), history.last()) else {
        return Ok(None);
    };
    let first = dataset.resolver().resolve(channel, &oldest.revisions)?.first;
    recording_range_text(first, &newest.expiry_version).map(Some)
}

fn has_dashboard(probe: &ProbeDefinition, state: &HistoryEntry) -> bool {
    match probe.probe_type.as_str() {
        "histogram" | "scalar" => true,
        "simpleMeasurements" => matches!(
            state.details.get("kind").and_then(|k| k.as_str()),
            Some("number" | "bool")
        ),
        _ => false,
    }
}

/// Dashboard measure names are prefixed for non-histogram probes.
fn dashboard_measure(probe: &ProbeDefinition) -> String {
    match probe.probe_type.as_str() {
        "scalar" => format!("SCALARS_{}", probe.name.to_uppercase()),
        "simpleMeasurements" => format!("SIMPLE_MEASURES_{}", probe.name.to_uppercase()),
        _ => probe.name.clone(),
    }
}

pub fn dashboard_url(
    config: &ExplorerConfig,
    kind: DashboardKind,
    probe: &ProbeDefinition,
    channel: &Channel,
    range: ResolvedRange,
) -> String {
    format!(
        "{}/{}.html#!max_channel_version={}%252F{}&min_channel_version={}%252F{}&measure={}&product=Firefox",
        config.dashboard_base_url.trim_end_matches('/'),
        kind.page(),
        channel,
        range.last,
        channel,
        range.first,
        dashboard_measure(probe),
    )
}

fn dataset_aliases(
    dataset: &Dataset,
    id: &ProbeId,
    probe: &ProbeDefinition,
    state: &HistoryEntry,
) -> Vec<DatasetAlias> {
    let config = dataset.config();
    let alias = |name: &str, names: Vec<String>| DatasetAlias {
        dataset: name.to_string(),
        names,
        doc_url: config.dataset_doc_urls.get(name).cloned(),
    };

    let mut aliases: Vec<DatasetAlias> = dataset
        .mappings()
        .get(id)
        .into_iter()
        .flatten()
        .map(|(name, column)| alias(name, vec![column.clone()]))
        .collect();

    let column = probe.name.to_lowercase().replace('.', "_");
    match probe.probe_type.as_str() {
        "scalar" if state.optout && records_in_main(state) => {
            aliases.push(alias(LONGITUDINAL, vec![format!("scalar_parent_{}", column)]));
        }
        "histogram" if state.optout => {
            let per_process = format!("{}_<process>", column);
            aliases.push(alias(LONGITUDINAL, vec![column, per_process]));
        }
        _ => {}
    }
    aliases
}

fn records_in_main(state: &HistoryEntry) -> bool {
    state
        .details
        .get("record_in_processes")
        .and_then(|p| p.as_array())
        .is_some_and(|procs| procs.iter().any(|p| p.as_str() == Some("main")))
}

/// Use counters (`USE_COUNTER2_<GROUP>_..._<KIND>`) have their own dashboard.
fn use_counter_url(config: &ExplorerConfig, probe: &ProbeDefinition) -> Option<String> {
    if probe.probe_type != "histogram" || !probe.name.starts_with("USE_COUNTER2_") {
        return None;
    }
    let parts: Vec<&str> = probe.name.split('_').collect();
    let group = parts.get(2)?;
    let kind = parts.last()?.to_lowercase();
    Some(format!("{}#group={}&kind={}", config.use_counter_url, group, kind))
}

fn detail_properties(probe: &ProbeDefinition, state: &HistoryEntry) -> Vec<DetailProperty> {
    DETAIL_PROPERTIES
        .iter()
        .filter(|(_, types)| types.contains(&probe.probe_type.as_str()))
        .map(|(name, _)| DetailProperty {
            name: name.to_string(),
            value: state.details.get(*name).map(display_value).unwrap_or_default(),
        })
        .collect()
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}
