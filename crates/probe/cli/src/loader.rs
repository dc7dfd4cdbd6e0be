//! Reading the JSON datasets from a data directory

use std::fs;
use std::path::{Path, PathBuf};

use probe_engine::{Dataset, ExplorerConfig};
use probe_types::{DatasetMappings, GeneralInfo, ProbeMap, RevisionTable};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{CliError, CliResult};

pub const REVISIONS_FILE: &str = "revisions.json";
pub const PROBES_FILE: &str = "all_probes.json";
pub const GENERAL_FILE: &str = "general.json";
pub const DATASETS_FILE: &str = "datasets.json";
/// Probe sets merged over the main one, in merge order.
pub const SUPPLEMENTARY_FILES: [&str; 2] = ["environment.json", "other_fields.json"];

/// Load every dataset file under `dir` and build the [`Dataset`].
pub fn load_dataset(dir: &Path, config: ExplorerConfig) -> CliResult<Dataset> {
    let revisions: RevisionTable = read_required(&dir.join(REVISIONS_FILE))?;
    let probes: ProbeMap = read_required(&dir.join(PROBES_FILE))?;

    let mut builder = Dataset::builder(config).revisions(revisions).probes(probes);

    for name in SUPPLEMENTARY_FILES {
        if let Some(extra) = read_optional::<ProbeMap>(&dir.join(name))? {
            debug!(file = name, probes = extra.len(), "merging supplementary probes");
            builder = builder.supplementary_probes(extra);
        }
    }

    match read_optional::<GeneralInfo>(&dir.join(GENERAL_FILE))? {
        Some(general) => builder = builder.general(general),
        None => warn!(dir = %dir.display(), "no {} found, last update unknown", GENERAL_FILE),
    }

    if let Some(mappings) = read_optional::<DatasetMappings>(&dir.join(DATASETS_FILE))? {
        builder = builder.dataset_mappings(mappings);
    }

    Ok(builder.build()?)
}

fn read_required<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    read_optional(path)?.ok_or_else(|| CliError::MissingData(path.to_path_buf()))
}

fn read_optional<T: DeserializeOwned>(path: &Path) -> CliResult<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)?;
    let value = serde_json::from_str(&raw).map_err(|source| CliError::InvalidData {
        path: PathBuf::from(path),
        source,
    })?;
    Ok(Some(value))
}
