//! The report data model: [`BaseFinancialModel`], the three industry
//! extensions, and the [`FinancialReport`] container.

use serde::{Deserialize, Serialize};

use crate::traceable::TraceableField;

/// Numeric field shorthand used throughout the model.
pub type Num = TraceableField<f64>;

/// Text field shorthand used for context fields.
pub type Text = TraceableField<String>;

fn missing_num(name: &str) -> Num {
    TraceableField::missing(name, "Initial state")
}

fn missing_text(name: &str) -> Text {
    TraceableField::missing(name, "Initial state")
}

/// Fields common to every filing regardless of industry: context, balance
/// sheet, income statement, cash flow, and single/cross-period derived
/// metrics. See spec.md §3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseFinancialModel {
    // Context
    /// Ticker symbol as supplied by the caller.
    pub ticker: Text,
    /// SEC Central Index Key.
    pub cik: Text,
    /// Registrant name.
    pub company_name: Text,
    /// Standard Industrial Classification code.
    pub sic_code: Text,
    /// `dei:DocumentFiscalYearFocus`.
    pub fiscal_year: Text,
    /// `dei:DocumentFiscalPeriodFocus`.
    pub fiscal_period: Text,
    /// Shares outstanding.
    pub shares_outstanding: Num,

    // Balance sheet
    /// Total assets.
    pub total_assets: Num,
    /// Total liabilities.
    pub total_liabilities: Num,
    /// Total stockholders' equity.
    pub total_equity: Num,
    /// Cash and cash equivalents.
    pub cash_and_equivalents: Num,
    /// Current assets.
    pub current_assets: Num,
    /// Current liabilities.
    pub current_liabilities: Num,
    /// Total debt under the configured [`crate::config::TotalDebtPolicy`].
    pub total_debt: Num,
    /// Preferred stock (defaulted to zero with assumed provenance if absent).
    pub preferred_stock: Num,

    // Income statement
    /// Total revenue.
    pub total_revenue: Num,
    /// Operating income (EBIT).
    pub operating_income: Num,
    /// Income before tax.
    pub income_before_tax: Num,
    /// Interest expense.
    pub interest_expense: Num,
    /// Depreciation and amortization.
    pub depreciation_and_amortization: Num,
    /// Share-based compensation.
    pub share_based_compensation: Num,
    /// Net income.
    pub net_income: Num,
    /// Income tax expense.
    pub income_tax_expense: Num,
    /// EBITDA (computed: operating income + D&A).
    pub ebitda: Num,

    // Cash flow
    /// Operating cash flow.
    pub operating_cash_flow: Num,
    /// Dividends paid.
    pub dividends_paid: Num,

    // Derived metrics
    /// Current assets − current liabilities.
    pub working_capital: Num,
    /// Cross-period: working capital this year minus last year. Missing
    /// until the cross-period derivatives phase runs.
    pub working_capital_delta: Num,
    /// Income tax expense / income before tax.
    pub effective_tax_rate: Num,
    /// Interest expense / total debt.
    pub interest_cost_rate: Num,
    /// Operating income / revenue.
    pub ebit_margin: Num,
    /// Net income / revenue.
    pub net_margin: Num,
    /// Total equity + total debt − cash.
    pub invested_capital: Num,
    /// Operating income × (1 − effective tax rate).
    pub nopat: Num,
    /// NOPAT / invested capital.
    pub roic: Num,
    /// Cross-period: `(capex − D&A + wc_delta) / nopat`. Missing until the
    /// cross-period derivatives phase runs, and remains missing for
    /// non-Industrial issuers (CapEx is only modeled there).
    pub reinvestment_rate: Num,
}

impl BaseFinancialModel {
    /// An all-missing base model, useful as a starting point in tests and
    /// for the empty-fact-table boundary case (spec.md §8).
    #[must_use]
    pub fn blank() -> Self {
        Self {
            ticker: missing_text("Ticker"),
            cik: missing_text("CIK"),
            company_name: missing_text("Company Name"),
            sic_code: missing_text("SIC Code"),
            fiscal_year: missing_text("Fiscal Year"),
            fiscal_period: missing_text("Fiscal Period"),
            shares_outstanding: missing_num("Shares Outstanding"),
            total_assets: missing_num("Total Assets"),
            total_liabilities: missing_num("Total Liabilities"),
            total_equity: missing_num("Total Equity"),
            cash_and_equivalents: missing_num("Cash & Cash Equivalents"),
            current_assets: missing_num("Current Assets"),
            current_liabilities: missing_num("Current Liabilities"),
            total_debt: missing_num("Total Debt"),
            preferred_stock: missing_num("Preferred Stock"),
            total_revenue: missing_num("Total Revenue"),
            operating_income: missing_num("Operating Income (EBIT)"),
            income_before_tax: missing_num("Income Before Tax"),
            interest_expense: missing_num("Interest Expense"),
            depreciation_and_amortization: missing_num("Depreciation & Amortization"),
            share_based_compensation: missing_num("Share-Based Compensation"),
            net_income: missing_num("Net Income"),
            income_tax_expense: missing_num("Income Tax Expense"),
            ebitda: missing_num("EBITDA"),
            operating_cash_flow: missing_num("Operating Cash Flow (OCF)"),
            dividends_paid: missing_num("Dividends Paid"),
            working_capital: missing_num("Working Capital"),
            working_capital_delta: missing_num("Working Capital Delta"),
            effective_tax_rate: missing_num("Effective Tax Rate"),
            interest_cost_rate: missing_num("Interest Cost Rate"),
            ebit_margin: missing_num("EBIT Margin"),
            net_margin: missing_num("Net Margin"),
            invested_capital: missing_num("Invested Capital"),
            nopat: missing_num("NOPAT"),
            roic: missing_num("ROIC"),
            reinvestment_rate: missing_num("Reinvestment Rate"),
        }
    }
}

/// Applicable to manufacturing, tech, retail, software, and any issuer that
/// does not dispatch to Financial Services or Real Estate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustrialExtension {
    /// Inventory (net, falling back to gross).
    pub inventory: Num,
    /// Accounts receivable, net current.
    pub accounts_receivable: Num,
    /// Cost of goods sold.
    pub cogs: Num,
    /// R&D expense.
    pub rd_expense: Num,
    /// SG&A expense: prefers the aggregate concept, falls back to
    /// `selling_expense + ga_expense`.
    pub sga_expense: Num,
    /// Selling expense component, extracted independently of `sga_expense`.
    pub selling_expense: Num,
    /// General & administrative expense component, extracted independently
    /// of `sga_expense`.
    pub ga_expense: Num,
    /// Capital expenditures.
    pub capex: Num,
}

/// Applicable to banking, brokers, and financial services issuers. Assets
/// are loans, liabilities are deposits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialServicesExtension {
    /// Loans and leases receivable, net.
    pub loans_and_leases: Num,
    /// Deposits.
    pub deposits: Num,
    /// Allowance for credit losses (CECL, falling back to pre-CECL).
    pub allowance_for_credit_losses: Num,
    /// Interest income.
    pub interest_income: Num,
    /// Interest expense.
    pub interest_expense: Num,
    /// Provision for loan losses.
    pub provision_for_loan_losses: Num,
    /// Risk-weighted assets.
    pub risk_weighted_assets: Num,
    /// Tier 1 capital ratio.
    pub tier1_capital_ratio: Num,
}

/// Applicable to REITs. High depreciation tends to understate net income,
/// so FFO is computed to adjust for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealEstateExtension {
    /// Real estate investment property, at cost.
    pub real_estate_assets: Num,
    /// Accumulated depreciation on real estate investment property.
    pub accumulated_depreciation: Num,
    /// Depreciation & amortization, preferring the real-estate-specific concept.
    pub depreciation_and_amortization: Num,
    /// Gain on sale of properties.
    pub gain_on_sale: Num,
    /// Funds From Operations: `net_income + depreciation − gain_on_sale`.
    ///
    /// Assumes gain-on-sale is reported as a positive number meaning a gain;
    /// some filings report it as a negative value instead. The resolver does
    /// not adjust for this — see spec.md §9's open questions.
    pub ffo: Num,
}

/// Which industry extension a [`FinancialReport`] carries, chosen by SIC
/// dispatch (spec.md §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndustryType {
    /// Manufacturing, tech, retail, software, and the default bucket.
    Industrial,
    /// Banking, brokers, and financial services.
    FinancialServices,
    /// REITs (SIC 6798).
    RealEstate,
}

impl IndustryType {
    /// Dispatch from a raw SIC code, per spec.md §4.5.
    #[must_use]
    pub fn from_sic(sic: Option<i64>) -> Self {
        match sic {
            Some(6798) => Self::RealEstate,
            Some(code) if (6000..=6999).contains(&code) => Self::FinancialServices,
            Some(code) if (2000..=3999).contains(&code) => Self::Industrial,
            _ => Self::Industrial,
        }
    }

    /// The industry label used as the key into [`MappingRegistry`] industry
    /// overrides, matching the strings used in the original registrations.
    ///
    /// [`MappingRegistry`]: ../../xbrl_mapping/struct.MappingRegistry.html
    #[must_use]
    pub fn override_label(self) -> &'static str {
        match self {
            Self::Industrial => "Industrial",
            Self::FinancialServices => "Financial Services",
            Self::RealEstate => "Real Estate",
        }
    }
}

/// One of the three industry-specific field sets a [`FinancialReport`] may carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IndustryExtension {
    /// See [`IndustrialExtension`].
    Industrial(IndustrialExtension),
    /// See [`FinancialServicesExtension`].
    FinancialServices(FinancialServicesExtension),
    /// See [`RealEstateExtension`].
    RealEstate(RealEstateExtension),
}

impl IndustryExtension {
    /// The CapEx field, present only for Industrial issuers. Used by the
    /// cross-period derivatives phase to compute reinvestment rate.
    #[must_use]
    pub fn capex(&self) -> Option<&Num> {
        match self {
            Self::Industrial(ext) => Some(&ext.capex),
            _ => None,
        }
    }
}

/// The fully assembled output of the Report Factory: base fields, the
/// industry extension, and the industry classification used to choose it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialReport {
    /// Fields common across all industries.
    pub base: BaseFinancialModel,
    /// Industry-specific fields.
    pub extension: IndustryExtension,
    /// Which industry the report was built for.
    pub industry_type: IndustryType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sic_dispatch_reit_before_financial_services_range() {
        assert_eq!(IndustryType::from_sic(Some(6798)), IndustryType::RealEstate);
    }

    #[test]
    fn sic_dispatch_financial_services_range() {
        assert_eq!(
            IndustryType::from_sic(Some(6000)),
            IndustryType::FinancialServices
        );
        assert_eq!(
            IndustryType::from_sic(Some(6999)),
            IndustryType::FinancialServices
        );
    }

    #[test]
    fn sic_dispatch_defaults_to_industrial() {
        assert_eq!(IndustryType::from_sic(Some(1)), IndustryType::Industrial);
        assert_eq!(IndustryType::from_sic(None), IndustryType::Industrial);
    }

    #[test]
    fn blank_base_model_has_auditable_missing_fields() {
        let model = BaseFinancialModel::blank();
        assert!(model.total_revenue.value.is_none());
        assert!(matches!(
            model.total_revenue.provenance,
            crate::provenance::Provenance::Assumed { .. }
        ));
    }
}
