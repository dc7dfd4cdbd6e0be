//! Known versions per channel

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use probe_engine::Dataset;
use probe_types::{Channel, Version};

use crate::error::CliResult;
use crate::output::{print_output, OutputFormat};

/// Versions arguments
#[derive(Args, Debug)]
pub struct VersionsArgs {
    /// Only this channel, with the revision each version resolves to
    #[arg(short, long)]
    pub channel: Option<String>,
}

#[derive(Tabled, Serialize)]
struct ChannelVersionRow {
    #[tabled(rename = "Version")]
    version: Version,
    #[tabled(rename = "Revision")]
    revision: String,
}

#[derive(Tabled, Serialize)]
struct VersionRow {
    #[tabled(rename = "Version")]
    version: Version,
    #[tabled(rename = "Channels")]
    channels: String,
}

/// Execute the versions command
pub fn execute(args: VersionsArgs, dataset: &Dataset, format: OutputFormat) -> CliResult<()> {
    let index = dataset.index();
    match args.channel.map(Channel::from) {
        Some(channel) => {
            let rows = index
                .versions_of(&channel)
                .into_iter()
                .rev()
                .map(|version| ChannelVersionRow {
                    version,
                    revision: index
                        .revision_of(&channel, version)
                        .map(|r| r.to_string())
                        .unwrap_or_default(),
                })
                .collect();
            print_output::<ChannelVersionRow>(rows, format)
        }
        None => {
            let rows = index
                .all_versions()
                .into_iter()
                .map(|version| VersionRow {
                    version,
                    channels: index
                        .channels()
                        .filter(|c| index.versions_of(c).contains(&version))
                        .map(Channel::as_str)
                        .collect::<Vec<_>>()
                        .join(", "),
                })
                .collect();
            print_output::<VersionRow>(rows, format)
        }
    }
}
