//! Probe search

use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;
use tracing::debug;

use probe_engine::{
    recording_range_text, sorted_probe_ids, Dataset, FilterPipeline, SearchSummary,
};
use probe_types::{
    FilterCriteria, ProbeMap, TextConstraint, VersionConstraint, VersionSelector,
};

use crate::commands::channel_or_default;
use crate::error::CliResult;
use crate::output::{print_output, print_single, OutputFormat};

const DESCRIPTION_WIDTH: usize = 60;

/// Search arguments
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Channel to search (defaults to the configured channel)
    #[arg(short, long)]
    pub channel: Option<String>,

    /// Lifecycle constraint (is_in, new_in, is_expired)
    #[arg(long, default_value = "is_in")]
    pub constraint: VersionConstraint,

    /// Target version, or "any"
    #[arg(long, default_value = "any")]
    pub version: VersionSelector,

    /// Free-text query, case-insensitive
    #[arg(short, long, default_value = "")]
    pub text: String,

    /// Where to look for the text (in_name, in_description, in_any)
    #[arg(long, default_value = "in_any")]
    pub search_type: TextConstraint,

    /// Only opt-out entries; always on for the release channel
    #[arg(long)]
    pub optout: bool,
}

#[derive(Tabled, Serialize)]
struct ProbeRow {
    #[tabled(rename = "Probe")]
    name: String,
    #[tabled(rename = "Type")]
    probe_type: String,
    #[tabled(rename = "Population")]
    population: String,
    #[tabled(rename = "Recorded")]
    recorded: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl SearchArgs {
    pub fn criteria(&self, dataset: &Dataset) -> FilterCriteria {
        let channel = channel_or_default(dataset, self.channel.clone());
        // Pre-release measurements are never useful on release.
        let optout_only = self.optout || channel.is_release();
        if optout_only && !self.optout {
            debug!(channel = %channel, "opt-out only forced for release channel");
        }
        let version = match self.version {
            VersionSelector::Version(v) => {
                let closest = dataset.index().closest_version(&channel, v).unwrap_or(v);
                if closest != v {
                    debug!(
                        channel = %channel,
                        requested = v,
                        version = closest,
                        "version clamped to channel span"
                    );
                }
                VersionSelector::Version(closest)
            }
            VersionSelector::Any => VersionSelector::Any,
        };
        FilterCriteria::new(channel)
            .with_constraint(self.constraint)
            .with_version(version)
            .with_text(self.search_type, self.text.clone())
            .with_optout_only(optout_only)
    }
}

/// Execute a search
pub fn execute(args: SearchArgs, dataset: &Dataset, format: OutputFormat) -> CliResult<()> {
    let criteria = args.criteria(dataset);
    let results = FilterPipeline::new(dataset).filter(&criteria)?;

    match format {
        OutputFormat::Table => {
            let summary = SearchSummary::of(&results, &criteria.channel);
            print_output(rows(dataset, &results, &criteria)?, format)?;
            println!(
                "{}",
                format!(
                    "{} probes, {} history entries {} {} on {}",
                    summary.probe_count,
                    summary.entry_count,
                    criteria.version_constraint.label(),
                    version_text(criteria.version),
                    criteria.channel
                )
                .dimmed()
            );
            Ok(())
        }
        OutputFormat::Json | OutputFormat::Yaml => print_single(&results, format),
    }
}

/// One row per matching history entry.
fn rows(
    dataset: &Dataset,
    results: &ProbeMap,
    criteria: &FilterCriteria,
) -> CliResult<Vec<ProbeRow>> {
    let resolver = dataset.resolver();
    let mut rows = Vec::new();
    for id in sorted_probe_ids(results) {
        let probe = &results[id];
        let Some(history) = probe.history_for(&criteria.channel) else {
            continue;
        };
        for entry in history {
            let first = resolver.resolve(&criteria.channel, &entry.revisions)?.first;
            rows.push(ProbeRow {
                name: probe.name.clone(),
                probe_type: probe.probe_type.clone(),
                population: entry.population().to_string(),
                recorded: recording_range_text(first, &entry.expiry_version)?,
                description: truncate(&entry.description, DESCRIPTION_WIDTH),
            });
        }
    }
    Ok(rows)
}

fn version_text(version: VersionSelector) -> String {
    match version {
        VersionSelector::Any => "in any version".to_string(),
        VersionSelector::Version(v) => format!("in {}", v),
    }
}

fn truncate(text: &str, width: usize) -> String {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() <= width {
        return text;
    }
    let cut: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{}…", cut)
}
