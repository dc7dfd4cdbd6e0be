//! CLI command implementations

pub mod info;
pub mod search;
pub mod show;
pub mod stats;
pub mod versions;

use probe_engine::Dataset;
use probe_types::Channel;

use crate::output::print_warning;

/// The requested channel, or the configured default.
pub(crate) fn channel_or_default(dataset: &Dataset, channel: Option<String>) -> Channel {
    let channel = channel
        .map(Channel::from)
        .unwrap_or_else(|| dataset.config().default_channel.clone());
    if !dataset.config().is_known_channel(&channel) {
        print_warning(&format!("'{}' is not a configured channel", channel));
    }
    channel
}
