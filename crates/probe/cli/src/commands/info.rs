//! Dataset overview

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use probe_engine::Dataset;
use probe_types::{Channel, Version};

use crate::error::CliResult;
use crate::output::{print_field, print_heading, print_single, OutputFormat};

#[derive(Debug, Serialize)]
struct ChannelInfo {
    channel: Channel,
    versions: usize,
    min_version: Option<Version>,
    max_version: Option<Version>,
}

#[derive(Debug, Serialize)]
struct DatasetInfo {
    last_update: Option<DateTime<Utc>>,
    probes: usize,
    channels: Vec<ChannelInfo>,
}

fn collect(dataset: &Dataset) -> DatasetInfo {
    let index = dataset.index();
    DatasetInfo {
        last_update: dataset.general().map(|g| g.last_update),
        probes: dataset.probes().len(),
        channels: index
            .channels()
            .map(|channel| ChannelInfo {
                channel: channel.clone(),
                versions: index.versions_of(channel).len(),
                min_version: index.min_version(channel),
                max_version: index.max_version(channel),
            })
            .collect(),
    }
}

/// Execute the info command
pub fn execute(dataset: &Dataset, format: OutputFormat) -> CliResult<()> {
    let info = collect(dataset);
    if !matches!(format, OutputFormat::Table) {
        return print_single(&info, format);
    }

    print_heading("Probe dataset");
    match info.last_update {
        Some(ts) => print_field("Last update", ts.format("%Y-%m-%d %H:%M UTC")),
        None => print_field("Last update", "unknown".dimmed()),
    }
    print_field("Probes", info.probes);
    println!();
    for c in &info.channels {
        let span = match (c.min_version, c.max_version) {
            (Some(min), Some(max)) => format!("{} - {}", min, max),
            _ => "-".to_string(),
        };
        print_field(c.channel.as_str(), format!("{} ({} versions)", span, c.versions));
    }
    Ok(())
}
