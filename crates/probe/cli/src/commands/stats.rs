//! Per-version probe counts

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use probe_engine::{Aggregator, Dataset};
use probe_types::{AggregationBucket, VersionConstraint};

use crate::commands::channel_or_default;
use crate::error::CliResult;
use crate::output::{print_info, print_output, OutputFormat};

/// Stats arguments
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Channel to chart (defaults to the configured channel)
    #[arg(short, long)]
    pub channel: Option<String>,

    /// What to count per version (is_in, new_in, is_expired)
    #[arg(long, default_value = "new_in")]
    pub constraint: VersionConstraint,

    /// Show every version, without trimming the series
    #[arg(long)]
    pub raw: bool,
}

#[derive(Tabled, Serialize)]
struct BucketRow {
    #[tabled(rename = "Version")]
    version: u32,
    #[tabled(rename = "Opt-in")]
    optin: u64,
    #[tabled(rename = "Opt-out")]
    optout: u64,
    #[tabled(rename = "Total")]
    total: u64,
}

impl From<AggregationBucket> for BucketRow {
    fn from(b: AggregationBucket) -> Self {
        Self {
            version: b.version,
            optin: b.optin,
            optout: b.optout,
            total: b.total,
        }
    }
}

/// Execute the stats command
pub fn execute(args: StatsArgs, dataset: &Dataset, format: OutputFormat) -> CliResult<()> {
    let channel = channel_or_default(dataset, args.channel);
    let aggregator = Aggregator::new(dataset);
    let series = if args.raw {
        aggregator.counts_per_version(&channel, args.constraint)?
    } else {
        aggregator.count_series(&channel, args.constraint)?
    };

    if matches!(format, OutputFormat::Table) {
        print_info(&format!(
            "Probes {} per version on {}",
            args.constraint.label(),
            channel
        ));
    }
    print_output(series.into_iter().map(BucketRow::from).collect(), format)
}
