//! Per-version count buckets

use serde::{Deserialize, Serialize};

use crate::Version;

/// Opt-in/opt-out probe counts for one version of a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationBucket {
    pub version: Version,
    pub optin: u64,
    pub optout: u64,
    pub total: u64,
}

impl AggregationBucket {
    pub fn empty(version: Version) -> Self {
        Self {
            version,
            optin: 0,
            optout: 0,
            total: 0,
        }
    }

    /// Count one probe, classified by its opt-out flag.
    pub fn record(&mut self, optout: bool) {
        if optout {
            self.optout += 1;
        } else {
            self.optin += 1;
        }
        self.total = self.optin + self.optout;
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
