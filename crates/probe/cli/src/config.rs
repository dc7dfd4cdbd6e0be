//! CLI configuration file

use std::path::{Path, PathBuf};

use probe_engine::ExplorerConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CliResult;

/// Contents of the optional TOML configuration file.
///
/// ```toml
/// data_dir = "/srv/probe-data"
///
/// [explorer]
/// default_channel = "nightly"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Directory holding the JSON datasets, used when `--data-dir` is absent.
    pub data_dir: Option<PathBuf>,
    pub explorer: ExplorerConfig,
}

impl CliConfig {
    /// Load from `path`, or the defaults when no path is given.
    ///
    /// A path that does not exist is an error: it was asked for explicitly.
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }
}
