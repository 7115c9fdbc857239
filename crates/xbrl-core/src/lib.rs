#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/xbrl-resolver/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types shared across the resolver workspace.
//!
//! - [`TraceableField`] — a value-plus-provenance pair.
//! - [`Provenance`] — XBRL / Computed / Assumed, tagged.
//! - [`FinancialReport`] and the industry extensions.
//! - [`ResolverConfig`] and [`ResolverError`].

/// Resolver-wide configuration (total-debt policy).
pub mod config;
/// Structural error types.
pub mod error;
/// The report data model.
pub mod model;
/// Provenance tagged union.
pub mod provenance;
/// The `TraceableField` value/provenance pair.
pub mod traceable;

pub use config::{PolicyReadOutcome, ResolverConfig, TotalDebtPolicy, TOTAL_DEBT_POLICY_ENV};
pub use error::{ResolverError, Result};
pub use model::{
    BaseFinancialModel, FinancialReport, FinancialServicesExtension, IndustrialExtension,
    IndustryExtension, IndustryType, Num, RealEstateExtension, Text,
};
pub use provenance::Provenance;
pub use traceable::TraceableField;
