//! Explorer configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use probe_types::Channel;

/// Configuration shared by the dataset builder and detail views.
///
/// Every field has a default, so a partial TOML file only overrides what it
/// names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Channels offered for selection.
    pub channels: Vec<Channel>,
    /// Channels that receive a copy of `all` histories, in this order.
    pub explode_channels: Vec<Channel>,
    /// Channel used when none is selected.
    pub default_channel: Channel,
    /// Telemetry dashboard root (`{base}/dist.html`, `{base}/evo.html`).
    pub dashboard_base_url: String,
    /// Bug tracker link prefix; the bug number is appended.
    pub bugzilla_url: String,
    /// Use-counter dashboard page.
    pub use_counter_url: String,
    /// Documentation links per dataset name.
    pub dataset_doc_urls: BTreeMap<String, String>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        let channels = |names: &[&str]| -> Vec<Channel> {
            names.iter().map(|n| Channel::from(*n)).collect()
        };
        Self {
            channels: channels(&[
                Channel::RELEASE,
                Channel::BETA,
                Channel::AURORA,
                Channel::NIGHTLY,
            ]),
            explode_channels: channels(&[Channel::RELEASE, Channel::BETA, Channel::NIGHTLY]),
            default_channel: Channel::from(Channel::RELEASE),
            dashboard_base_url: "https://telemetry.mozilla.org/new-pipeline".into(),
            bugzilla_url: "https://bugzilla.mozilla.org/show_bug.cgi?id=".into(),
            use_counter_url: "https://georgf.github.io/usecounters/".into(),
            dataset_doc_urls: BTreeMap::from([(
                "longitudinal".to_string(),
                "https://docs.telemetry.mozilla.org/concepts/choosing_a_dataset.html#longitudinal"
                    .to_string(),
            )]),
        }
    }
}

impl ExplorerConfig {
    pub fn is_known_channel(&self, channel: &Channel) -> bool {
        self.channels.contains(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ExplorerConfig::default();
        assert_eq!(config.channels.len(), 4);
        assert_eq!(config.explode_channels.len(), 3);
        assert!(!config.explode_channels.contains(&Channel::from("aurora")));
        assert!(config.is_known_channel(&Channel::from("aurora")));
        assert!(!config.is_known_channel(&Channel::from("esr")));
        assert!(config.dataset_doc_urls.contains_key("longitudinal"));
    }

    #[test]
    fn partial_override_keeps_defaults() {
        let config: ExplorerConfig =
            serde_json::from_str(r#"{"explode_channels": ["nightly"]}"#).unwrap();
        assert_eq!(config.explode_channels, vec![Channel::from("nightly")]);
        assert_eq!(config.default_channel, Channel::from("release"));
    }
}
