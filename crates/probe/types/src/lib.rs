//! Probe History Domain Types
//!
//! A telemetry probe is a measurement shipped in the browser. Each probe
//! carries a per-channel history of configuration states, and each state is
//! valid over a range of builds addressed by revision identifiers.
//!
//! # Key Concepts
//!
//! - **Channel**: an independent release track with its own version numbers.
//! - **RevisionTable**: `channel → revision → version`, in dataset order.
//! - **ProbeDefinition**: name, type and per-channel `HistoryEntry` lists,
//!   newest entry first.
//! - **RevisionRef**: how a history entry addresses the builds it covers,
//!   either a revision span or a bare introduction version.
//! - **FilterCriteria**: the immutable value object describing one query.
//! - **AggregationBucket**: per-version opt-in/opt-out counts.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod aggregate;
mod criteria;
mod error;
mod general;
mod ids;
mod probe;
mod revision;

pub use aggregate::*;
pub use criteria::*;
pub use error::*;
pub use general::*;
pub use ids::*;
pub use probe::*;
pub use revision::*;
