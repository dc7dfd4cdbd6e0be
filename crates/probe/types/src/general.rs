//! Dataset metadata

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::ProbeId;

/// Contents of `general.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralInfo {
    /// When the probe data was last scraped.
    #[serde(rename = "lastUpdate", deserialize_with = "timestamp_or_epoch")]
    pub last_update: DateTime<Utc>,
}

/// `lastUpdate` is either an RFC 3339 timestamp or epoch milliseconds.
fn timestamp_or_epoch<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Millis(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| serde::de::Error::custom(format!("epoch out of range: {}", ms))),
        Raw::Text(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom),
    }
}

/// `probeId → {dataset → column}` from `datasets.json`.
pub type DatasetMappings = BTreeMap<ProbeId, BTreeMap<String, String>>;
