#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/xbrl-resolver/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Field resolution, report assembly, and cross-period derivatives.

use tracing::warn;

use xbrl_core::{FinancialReport, ResolverConfig, TOTAL_DEBT_POLICY_ENV};
use xbrl_mapping::MappingRegistry;
use xbrl_search::FactTable;

/// Missing-value propagation combinators shared by every derived metric.
pub mod combine;
/// Cross-period derivatives.
pub mod derivatives;
/// Staged field resolution.
pub mod field;
/// The Report Factory.
pub mod factory;

pub use derivatives::apply_cross_period_derivatives;
pub use factory::ReportFactory;
pub use field::{extract_field, extract_text_field, parse_numeric};

/// Build one report per `(fiscal_year, table)` pair and apply cross-period
/// derivatives across the whole batch.
///
/// `sic_code` is shared across the batch — a single issuer doesn't change
/// SIC code year over year in this model. `registry` and `config` are read
/// once per report, not re-read per field.
#[must_use]
pub fn resolve_reports(
    tables: Vec<(i32, FactTable)>,
    ticker: &str,
    sic_code: Option<i64>,
    registry: &MappingRegistry,
    config: &ResolverConfig,
) -> Vec<FinancialReport> {
    let factory = ReportFactory::new(registry, config);
    let mut reports: Vec<FinancialReport> = tables
        .iter()
        .map(|(_year, table)| factory.build_report(table, ticker, sic_code))
        .collect();
    apply_cross_period_derivatives(&mut reports);
    reports
}

/// Build a single report with no cross-period derivatives — `working_capital_delta`
/// and `reinvestment_rate` remain missing, since they need at least one
/// other fiscal year to compare against.
#[must_use]
pub fn resolve_single_report(
    table: &FactTable,
    ticker: &str,
    sic_code: Option<i64>,
    registry: &MappingRegistry,
    config: &ResolverConfig,
) -> FinancialReport {
    ReportFactory::new(registry, config).build_report(table, ticker, sic_code)
}

/// Read [`ResolverConfig`] from the environment once, logging a warning if
/// [`TOTAL_DEBT_POLICY_ENV`] was set to an unrecognized value, then
/// building every report for the batch.
#[must_use]
pub fn resolve_reports_from_env(
    tables: Vec<(i32, FactTable)>,
    ticker: &str,
    sic_code: Option<i64>,
    registry: &MappingRegistry,
) -> Vec<FinancialReport> {
    let (config, outcome) = ResolverConfig::from_env();
    if let Some(raw) = outcome.invalid_raw_value {
        warn!(
            env_var = TOTAL_DEBT_POLICY_ENV,
            raw_value = %raw,
            "fundamental_total_debt_policy_env_invalid"
        );
    }
    resolve_reports(tables, ticker, sic_code, registry, &config)
}
