//! Single probe detail

use clap::Args;
use colored::Colorize;

use probe_engine::{Dataset, ProbeDetail};

use crate::commands::channel_or_default;
use crate::error::{CliError, CliResult};
use crate::output::{print_field, print_heading, print_single, OutputFormat};

/// Show arguments
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Probe id, e.g. histogram/GC_MS (case-insensitive)
    pub probe_id: String,

    /// Channel whose newest state is shown (defaults to the configured channel)
    #[arg(short, long)]
    pub channel: Option<String>,
}

/// Execute the show command
pub fn execute(args: ShowArgs, dataset: &Dataset, format: OutputFormat) -> CliResult<()> {
    let channel = channel_or_default(dataset, args.channel);
    let id = dataset
        .find_probe_id(&args.probe_id)
        .ok_or_else(|| CliError::NotFound(format!("probe '{}'", args.probe_id)))?;
    let detail = ProbeDetail::build(dataset, id, &channel)?.ok_or_else(|| {
        CliError::NotFound(format!("probe '{}' has no history on {}", id, channel))
    })?;

    match format {
        OutputFormat::Table => {
            print_detail(&detail);
            Ok(())
        }
        _ => print_single(&detail, format),
    }
}

fn print_detail(detail: &ProbeDetail) {
    print_heading(&detail.name);
    print_field("Id", &detail.id);
    print_field("Type", &detail.probe_type);
    print_field("Population", &detail.population);
    print_field("Channel", &detail.channel);
    println!();
    println!("  {}", detail.description);
    println!();

    println!("{}", "Recorded".bold());
    for r in &detail.recording {
        print_field(r.channel.as_str(), &r.recorded);
    }

    if !detail.properties.is_empty() {
        println!("{}", "Details".bold());
        for p in &detail.properties {
            print_field(&p.name, &p.value);
        }
    }

    if let Some(dash) = &detail.dashboards {
        println!("{}", "Dashboards".bold());
        print_field("Distribution", &dash.distribution);
        print_field("Evolution", &dash.evolution);
    }
    if let Some(url) = &detail.use_counter_url {
        print_field("Use counters", url);
    }

    if !detail.datasets.is_empty() {
        println!("{}", "Datasets".bold());
        for d in &detail.datasets {
            print_field(&d.dataset, d.names.join(", "));
        }
    }

    if !detail.bugs.is_empty() {
        println!("{}", "Bugs".bold());
        for bug in &detail.bugs {
            print_field(&bug.number.to_string(), &bug.url);
        }
    }
}
