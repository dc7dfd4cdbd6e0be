//! Probe history query engine
//!
//! Answers questions over a loaded probe dataset:
//!
//! - which build version each revision of a channel belongs to ([`VersionIndex`])
//! - which versions a history entry covers ([`RangeResolver`])
//! - whether an entry is recorded, new or expired at a version ([`PredicateEngine`])
//! - which probes match a search ([`FilterPipeline`])
//! - how many probes were recorded, new or expired per version ([`Aggregator`])
//! - what the detail view of a single probe shows ([`ProbeDetail`])
//!
//! All types borrow an immutable [`Dataset`]; nothing here mutates after
//! [`DatasetBuilder::build`] returns.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod aggregate;
mod config;
mod dataset;
mod detail;
mod filter;
pub mod predicate;
mod range;
mod version_index;

pub use aggregate::*;
pub use config::*;
pub use dataset::*;
pub use detail::*;
pub use filter::*;
pub use predicate::{PredicateEngine, TextQuery};
pub use range::*;
pub use version_index::*;
