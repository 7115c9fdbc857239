#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/xbrl-resolver/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! In-memory fact storage and concept search.
//!
//! - [`table::FactTable`] — column-indexed, immutable store for one filing.
//! - [`search::SearchEngine`] and [`search::SearchConfig`] — filter and
//!   format a table's rows against one search configuration.

/// The fact table.
pub mod table;
/// The search engine.
pub mod search;

pub use search::{Rejection, SearchConfig, SearchEngine, SearchResult, SearchType};
pub use table::{ConceptObservation, FactTable, RawFact, RawValue, StoredFact};
