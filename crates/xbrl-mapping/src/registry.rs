//! The mapping registry: field keys to the search configurations that can
//! satisfy them, with issuer, industry, and default override layers.

use std::collections::HashMap;

use xbrl_core::ResolverError;
use xbrl_search::{SearchConfig, SearchType};

/// A field's name (for diagnostics and provenance) and the ordered list of
/// [`SearchConfig`]s the field resolver tries, in priority order, within
/// whichever stage it belongs to.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Human-readable field name, e.g. `"Total Assets"`.
    pub name: String,
    /// Search configurations, most preferred first.
    pub configs: Vec<SearchConfig>,
}

impl FieldSpec {
    /// Build a spec from a name and its configs.
    #[must_use]
    pub fn new(name: impl Into<String>, configs: Vec<SearchConfig>) -> Self {
        Self {
            name: name.into(),
            configs,
        }
    }
}

/// Which override layer a [`MappingRegistry::resolve`] call was satisfied
/// from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingSource {
    /// A registration specific to one issuer (ticker or CIK).
    Issuer,
    /// A registration specific to one [`xbrl_core::IndustryType`].
    Industry,
    /// The field's default registration.
    Default,
}

/// Field-key → [`FieldSpec`] registry with three override layers, checked
/// in priority order: issuer, then industry, then default.
#[derive(Debug, Default)]
pub struct MappingRegistry {
    defaults: HashMap<String, FieldSpec>,
    industry_overrides: HashMap<(String, String), FieldSpec>,
    issuer_overrides: HashMap<(String, String), FieldSpec>,
}

impl MappingRegistry {
    /// An empty registry with no registrations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a field's default spec. Overwrites any prior default for
    /// the same key.
    pub fn register(&mut self, field_key: impl Into<String>, spec: FieldSpec) {
        self.defaults.insert(field_key.into(), spec);
    }

    /// Register an industry-specific override, keyed by
    /// [`xbrl_core::IndustryType::override_label`].
    pub fn register_industry_override(
        &mut self,
        industry_label: impl Into<String>,
        field_key: impl Into<String>,
        spec: FieldSpec,
    ) {
        self.industry_overrides
            .insert((industry_label.into(), field_key.into()), spec);
    }

    /// Register an issuer-specific override, keyed by whatever identifier
    /// the caller uses consistently (ticker or CIK).
    pub fn register_issuer_override(
        &mut self,
        issuer: impl Into<String>,
        field_key: impl Into<String>,
        spec: FieldSpec,
    ) {
        self.issuer_overrides
            .insert((issuer.into(), field_key.into()), spec);
    }

    /// Resolve `field_key`, checking the issuer layer, then the industry
    /// layer, then the default. Returns `None` if no layer has a
    /// registration for this key.
    #[must_use]
    pub fn resolve(
        &self,
        field_key: &str,
        issuer: Option<&str>,
        industry_label: Option<&str>,
    ) -> Option<(&FieldSpec, MappingSource)> {
        if let Some(issuer) = issuer {
            if let Some(spec) = self
                .issuer_overrides
                .get(&(issuer.to_string(), field_key.to_string()))
            {
                return Some((spec, MappingSource::Issuer));
            }
        }
        if let Some(industry_label) = industry_label {
            if let Some(spec) = self
                .industry_overrides
                .get(&(industry_label.to_string(), field_key.to_string()))
            {
                return Some((spec, MappingSource::Industry));
            }
        }
        self.defaults
            .get(field_key)
            .map(|spec| (spec, MappingSource::Default))
    }

    /// All registered default field keys, sorted.
    #[must_use]
    pub fn list_fields(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.defaults.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

const USD_UNITS: [&str; 1] = ["usd"];
const SHARES_UNITS: [&str; 1] = ["shares"];
const PURE_UNITS: [&str; 1] = ["pure"];
const NO_UNITS: [&str; 0] = [];

const BS_STATEMENT_TOKENS: [&str; 2] = ["balance", "financial position"];
const IS_STATEMENT_TOKENS: [&str; 3] = ["income", "operation", "earning"];
const CF_STATEMENT_TOKENS: [&str; 1] = ["cash"];
const NO_STATEMENT_TOKENS: [&str; 0] = [];

/// Build one consolidated config, applying whichever of the statement-type,
/// period-type, and unit-whitelist constraints are non-empty/`Some`.
fn consolidated(
    tag: &str,
    statement_types: &[&str],
    period_type: Option<&str>,
    unit_whitelist: &[&str],
) -> Result<SearchConfig, ResolverError> {
    let mut config = SearchConfig::new(tag, SearchType::consolidated())?;
    if !statement_types.is_empty() {
        config = config.with_statement_types(statement_types.iter().copied());
    }
    if let Some(period_type) = period_type {
        config = config.with_period_type(period_type);
    }
    if !unit_whitelist.is_empty() {
        config = config.with_unit_whitelist(unit_whitelist.iter().copied());
    }
    Ok(config)
}

/// Build a field whose tags all share the same statement/period/unit
/// constraints (the common case in the original mapping module).
fn field(
    name: &str,
    tags: &[&str],
    statement_types: &[&str],
    period_type: Option<&str>,
    unit_whitelist: &[&str],
) -> Result<FieldSpec, ResolverError> {
    let configs = tags
        .iter()
        .map(|tag| consolidated(tag, statement_types, period_type, unit_whitelist))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FieldSpec::new(name, configs))
}

/// Build the registry's default field set, ported from the 40 field
/// registrations in the original mapping module plus the two industry
/// overrides (Financial Services → cash and equivalents, Real Estate →
/// depreciation and amortization), carrying over each field's
/// `statement_types`/`period_type`/`unit_whitelist` constraints — most
/// fields narrow to one of the balance-sheet, income-statement, or
/// cash-flow statement token groups, an instant or duration period, and a
/// USD (or shares/pure) unit whitelist. A handful of industrial/financial
/// fields the original left outside those three groups (`risk_weighted_assets`,
/// `tier1_capital_ratio`) keep no statement-type constraint, matching it.
///
/// # Errors
///
/// Returns [`ResolverError::InvalidConceptRegex`] only if one of the
/// hard-coded concept tags below is malformed, which would be a defect in
/// this function, not in caller input.
#[allow(clippy::too_many_lines)]
pub fn with_defaults() -> Result<MappingRegistry, ResolverError> {
    let mut registry = MappingRegistry::new();

    registry.register("cik", field("CIK", &["dei:EntityCentralIndexKey"], &NO_STATEMENT_TOKENS, None, &NO_UNITS)?);
    registry.register("company_name", field("Company Name", &["dei:EntityRegistrantName"], &NO_STATEMENT_TOKENS, None, &NO_UNITS)?);
    registry.register("fiscal_year", field("Fiscal Year", &["dei:DocumentFiscalYearFocus"], &NO_STATEMENT_TOKENS, None, &NO_UNITS)?);
    registry.register("fiscal_period", field("Fiscal Period", &["dei:DocumentFiscalPeriodFocus"], &NO_STATEMENT_TOKENS, None, &NO_UNITS)?);
    registry.register("shares_outstanding", field(
        "Shares Outstanding",
        &["dei:EntityCommonStockSharesOutstanding", "us-gaap:CommonStockSharesOutstanding"],
        &NO_STATEMENT_TOKENS, None, &SHARES_UNITS,
    )?);
    registry.register("total_assets", field("Total Assets", &["us-gaap:Assets"], &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS)?);
    registry.register("total_liabilities", field("Total Liabilities", &["us-gaap:Liabilities"], &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS)?);
    registry.register("total_equity", field(
        "Total Equity",
        &["us-gaap:StockholdersEquity", "us-gaap:StockholdersEquityIncludingPortionAttributableToNoncontrollingInterest"],
        &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS,
    )?);
    registry.register("cash_and_equivalents", field(
        "Cash & Cash Equivalents",
        &[
            "us-gaap:CashAndCashEquivalentsAtCarryingValue",
            "us-gaap:CashCashEquivalentsRestrictedCashAndRestrictedCashEquivalents",
            "us-gaap:Cash",
        ],
        &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS,
    )?);
    registry.register("current_assets", field("Current Assets", &["us-gaap:AssetsCurrent"], &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS)?);
    registry.register("current_liabilities", field("Current Liabilities", &["us-gaap:LiabilitiesCurrent"], &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS)?);
    registry.register("total_debt_combined", field(
        "Total Debt (Combined Concept)",
        &["us-gaap:DebtLongtermAndShorttermCombinedAmount"],
        &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS,
    )?);
    registry.register("debt_short", field("Short-Term Debt", &["us-gaap:ShortTermBorrowings", "us-gaap:DebtCurrent"], &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS)?);
    registry.register("debt_long", field("Long-Term Debt", &["us-gaap:LongTermDebtNoncurrent", "us-gaap:LongTermDebt"], &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS)?);
    registry.register("preferred_stock", field("Preferred Stock", &["us-gaap:PreferredStockValue"], &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS)?);
    registry.register("total_revenue", field(
        "Total Revenue",
        &["us-gaap:Revenues", "us-gaap:RevenueFromContractWithCustomerExcludingAssessedTax"],
        &IS_STATEMENT_TOKENS, Some("duration"), &USD_UNITS,
    )?);
    registry.register("operating_income", field("Operating Income (EBIT)", &["us-gaap:OperatingIncomeLoss"], &IS_STATEMENT_TOKENS, Some("duration"), &USD_UNITS)?);
    registry.register("income_before_tax", field(
        "Income Before Tax",
        &["us-gaap:IncomeLossFromContinuingOperationsBeforeIncomeTaxesExtraordinaryItemsNoncontrollingInterest"],
        &IS_STATEMENT_TOKENS, Some("duration"), &USD_UNITS,
    )?);
    registry.register("interest_expense", field("Interest Expense", &["us-gaap:InterestExpense"], &IS_STATEMENT_TOKENS, Some("duration"), &USD_UNITS)?);
    registry.register("depreciation_and_amortization", FieldSpec::new(
        "Depreciation & Amortization",
        vec![
            consolidated("us-gaap:DepreciationDepletionAndAmortization", &IS_STATEMENT_TOKENS, Some("duration"), &USD_UNITS)?,
            consolidated("us-gaap:DepreciationDepletionAndAmortization", &CF_STATEMENT_TOKENS, Some("duration"), &USD_UNITS)?,
            consolidated("us-gaap:DepreciationAndAmortization", &IS_STATEMENT_TOKENS, Some("duration"), &USD_UNITS)?,
            consolidated("us-gaap:DepreciationAndAmortization", &CF_STATEMENT_TOKENS, Some("duration"), &USD_UNITS)?,
        ],
    ));
    registry.register("share_based_compensation", FieldSpec::new(
        "Share-Based Compensation",
        vec![
            consolidated("us-gaap:ShareBasedCompensation", &IS_STATEMENT_TOKENS, Some("duration"), &USD_UNITS)?,
            consolidated("us-gaap:ShareBasedCompensation", &CF_STATEMENT_TOKENS, Some("duration"), &USD_UNITS)?,
        ],
    ));
    registry.register("net_income", field("Net Income", &["us-gaap:NetIncomeLoss"], &IS_STATEMENT_TOKENS, Some("duration"), &USD_UNITS)?);
    registry.register("income_tax_expense", field("Income Tax Expense", &["us-gaap:IncomeTaxExpenseBenefit"], &IS_STATEMENT_TOKENS, Some("duration"), &USD_UNITS)?);
    registry.register("operating_cash_flow", field(
        "Operating Cash Flow (OCF)",
        &["us-gaap:NetCashProvidedByUsedInOperatingActivities"],
        &CF_STATEMENT_TOKENS, Some("duration"), &USD_UNITS,
    )?);
    registry.register("dividends_paid", field(
        "Dividends Paid",
        &["us-gaap:PaymentsOfDividends", "us-gaap:PaymentsOfDividendsCommonStock"],
        &CF_STATEMENT_TOKENS, Some("duration"), &USD_UNITS,
    )?);
    registry.register("inventory", field("Inventory", &["us-gaap:InventoryNet", "us-gaap:InventoryGross"], &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS)?);
    registry.register("accounts_receivable", field(
        "Accounts Receivable",
        &["us-gaap:AccountsReceivableNetCurrent"],
        &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS,
    )?);
    registry.register("cogs", field("Cost of Goods Sold", &["us-gaap:CostOfGoodsAndServicesSold"], &IS_STATEMENT_TOKENS, Some("duration"), &USD_UNITS)?);
    registry.register("rd_expense", field(
        "R&D Expense",
        &["us-gaap:ResearchAndDevelopmentExpense"],
        &IS_STATEMENT_TOKENS, Some("duration"), &USD_UNITS,
    )?);
    registry.register("sga_expense", field(
        "SG&A Expense",
        &["us-gaap:SellingGeneralAndAdministrativeExpense"],
        &IS_STATEMENT_TOKENS, Some("duration"), &USD_UNITS,
    )?);
    registry.register("selling_expense", field("Selling Expense", &["us-gaap:SellingExpense"], &IS_STATEMENT_TOKENS, Some("duration"), &USD_UNITS)?);
    registry.register("ga_expense", field(
        "General & Administrative Expense",
        &["us-gaap:GeneralAndAdministrativeExpense"],
        &IS_STATEMENT_TOKENS, Some("duration"), &USD_UNITS,
    )?);
    registry.register("capex", field(
        "Capital Expenditures",
        &["us-gaap:PaymentsToAcquirePropertyPlantAndEquipment"],
        &CF_STATEMENT_TOKENS, Some("duration"), &USD_UNITS,
    )?);
    registry.register("loans_and_leases", field(
        "Loans & Leases Receivable",
        &["us-gaap:LoansAndLeasesReceivableNetReportedAmount"],
        &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS,
    )?);
    registry.register("deposits", field("Deposits", &["us-gaap:Deposits"], &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS)?);
    registry.register("allowance_for_credit_losses", field(
        "Allowance for Credit Losses",
        &["us-gaap:FinancingReceivableAllowanceForCreditLosses", "us-gaap:AllowanceForDoubtfulAccountsReceivable"],
        &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS,
    )?);
    registry.register("interest_income", field("Interest Income", &["us-gaap:InterestAndDividendIncomeOperating"], &IS_STATEMENT_TOKENS, Some("duration"), &USD_UNITS)?);
    registry.register("interest_expense_financial", field(
        "Interest Expense (Financial Services)",
        &["us-gaap:InterestExpense"],
        &IS_STATEMENT_TOKENS, Some("duration"), &USD_UNITS,
    )?);
    registry.register("provision_for_loan_losses", field(
        "Provision for Loan Losses",
        &["us-gaap:ProvisionForLoanLeaseAndOtherLosses"],
        &IS_STATEMENT_TOKENS, Some("duration"), &USD_UNITS,
    )?);
    registry.register("risk_weighted_assets", field("Risk-Weighted Assets", &["us-gaap:RiskWeightedAssets"], &NO_STATEMENT_TOKENS, Some("instant"), &USD_UNITS)?);
    registry.register("tier1_capital_ratio", field("Tier 1 Capital Ratio", &["us-gaap:Tier1RiskBasedCapitalToRiskWeightedAssets"], &NO_STATEMENT_TOKENS, Some("instant"), &PURE_UNITS)?);
    registry.register("real_estate_assets", field(
        "Real Estate Investment Property",
        &["us-gaap:RealEstateInvestmentPropertyAtCost"],
        &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS,
    )?);
    registry.register("accumulated_depreciation", field(
        "Accumulated Depreciation",
        &["us-gaap:RealEstateInvestmentPropertyAccumulatedDepreciation"],
        &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS,
    )?);
    registry.register("real_estate_dep_amort", field(
        "Depreciation & Amortization (Real Estate)",
        &["us-gaap:DepreciationAndAmortizationInRealEstate"],
        &IS_STATEMENT_TOKENS, Some("duration"), &USD_UNITS,
    )?);
    registry.register("gain_on_sale", field(
        "Gain on Sale of Properties",
        &["us-gaap:GainsLossesOnSalesOfInvestmentRealEstate"],
        &IS_STATEMENT_TOKENS, Some("duration"), &USD_UNITS,
    )?);

    registry.register("total_debt_with_finance_leases", field(
        "Total Debt Including Finance Leases (Combined Concept)",
        &["us-gaap:DebtAndCapitalLeaseObligations"],
        &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS,
    )?);
    registry.register("finance_lease_liabilities_combined", field(
        "Finance Lease Liabilities (Combined Concept)",
        &["us-gaap:FinanceLeaseLiability"],
        &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS,
    )?);
    registry.register("finance_lease_liabilities_current", field(
        "Finance Lease Liabilities (Current)",
        &["us-gaap:FinanceLeaseLiabilityCurrent"],
        &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS,
    )?);
    registry.register("finance_lease_liabilities_noncurrent", field(
        "Finance Lease Liabilities (Noncurrent)",
        &["us-gaap:FinanceLeaseLiabilityNoncurrent"],
        &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS,
    )?);
    registry.register("notes_payable", field(
        "Notes Payable (Combined)",
        &["us-gaap:NotesPayable"],
        &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS,
    )?);
    registry.register("notes_payable_current", field(
        "Notes Payable (Current)",
        &["us-gaap:NotesPayableCurrent"],
        &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS,
    )?);
    registry.register("notes_payable_noncurrent", field(
        "Notes Payable (Noncurrent)",
        &["us-gaap:NotesPayableNoncurrent"],
        &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS,
    )?);
    registry.register("loans_payable", field(
        "Loans Payable (Combined)",
        &["us-gaap:LoansPayable"],
        &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS,
    )?);
    registry.register("loans_payable_current", field(
        "Loans Payable (Current)",
        &["us-gaap:LoansPayableCurrent"],
        &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS,
    )?);
    registry.register("commercial_paper", field(
        "Commercial Paper",
        &["us-gaap:CommercialPaper"],
        &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS,
    )?);

    registry.register_industry_override(
        "Financial Services",
        "cash_and_equivalents",
        field(
            "Cash & Cash Equivalents (Banking)",
            &["us-gaap:CashAndDueFromBanks", "us-gaap:CashAndCashEquivalentsAtCarryingValue"],
            &BS_STATEMENT_TOKENS, Some("instant"), &USD_UNITS,
        )?,
    );
    registry.register_industry_override(
        "Real Estate",
        "depreciation_and_amortization",
        FieldSpec::new(
            "Depreciation & Amortization (Real Estate)",
            vec![
                consolidated("us-gaap:DepreciationAndAmortizationInRealEstate", &IS_STATEMENT_TOKENS, Some("duration"), &USD_UNITS)?,
                consolidated("us-gaap:DepreciationDepletionAndAmortization", &IS_STATEMENT_TOKENS, Some("duration"), &USD_UNITS)?,
                consolidated("us-gaap:DepreciationDepletionAndAmortization", &CF_STATEMENT_TOKENS, Some("duration"), &USD_UNITS)?,
            ],
        ),
    );

    Ok(registry)
}
