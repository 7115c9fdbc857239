#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/xbrl-resolver/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! The field mapping registry.

/// [`MappingRegistry`] and its default field registrations.
pub mod registry;

pub use registry::{with_defaults, FieldSpec, MappingRegistry, MappingSource};
