//! The Report Factory: SIC-code industry dispatch, base-field extraction,
//! the total-debt policy, and industry-extension assembly.

use tracing::{info, warn};

use xbrl_core::{
    BaseFinancialModel, FinancialReport, FinancialServicesExtension, IndustrialExtension,
    IndustryExtension, IndustryType, Num, Provenance, RealEstateExtension, ResolverConfig,
    Text, TotalDebtPolicy, TraceableField,
};
use xbrl_mapping::MappingRegistry;
use xbrl_search::FactTable;

use crate::combine::{combine2, divide, sum_allowing_partial};
use crate::field::{extract_field, extract_text_field};

fn num(table: &FactTable, registry: &MappingRegistry, key: &str, issuer: Option<&str>, industry: &str) -> Num {
    match registry.resolve(key, issuer, Some(industry)) {
        Some((spec, _source)) => extract_field(table, spec),
        None => TraceableField::missing(key, format!("field key {key:?} is not registered")),
    }
}

fn text(table: &FactTable, registry: &MappingRegistry, key: &str, issuer: Option<&str>, industry: &str) -> Text {
    match registry.resolve(key, issuer, Some(industry)) {
        Some((spec, _source)) => extract_text_field(table, spec),
        None => TraceableField::missing(key, format!("field key {key:?} is not registered")),
    }
}

/// Assembles one [`FinancialReport`] from a single filing's [`FactTable`].
///
/// `ticker` and `sic_code` are supplied by the caller (spec.md §6); every
/// other base and industry field is extracted from `table`. `issuer` is an
/// optional identifier (ticker or CIK) used to check
/// [`MappingRegistry`]'s issuer override layer before industry/default.
pub struct ReportFactory<'a> {
    registry: &'a MappingRegistry,
    config: &'a ResolverConfig,
}

impl<'a> ReportFactory<'a> {
    /// Build a factory over a registry and a resolver configuration.
    #[must_use]
    pub fn new(registry: &'a MappingRegistry, config: &'a ResolverConfig) -> Self {
        Self { registry, config }
    }

    /// Build one [`FinancialReport`] for `ticker` at `sic_code` from `table`.
    #[must_use]
    pub fn build_report(&self, table: &FactTable, ticker: &str, sic_code: Option<i64>) -> FinancialReport {
        let industry_type = IndustryType::from_sic(sic_code);
        let industry_label = industry_type.override_label();
        let issuer = Some(ticker);

        let base = self.build_base_model(table, ticker, sic_code, issuer, industry_label);
        let extension = match industry_type {
            IndustryType::Industrial => {
                IndustryExtension::Industrial(self.build_industrial_extension(table, issuer, industry_label))
            }
            IndustryType::FinancialServices => IndustryExtension::FinancialServices(
                self.build_financial_services_extension(table, issuer, industry_label),
            ),
            IndustryType::RealEstate => {
                IndustryExtension::RealEstate(self.build_real_estate_extension(table, issuer, industry_label, &base))
            }
        };

        FinancialReport {
            base,
            extension,
            industry_type,
        }
    }

    fn build_base_model(
        &self,
        table: &FactTable,
        ticker: &str,
        sic_code: Option<i64>,
        issuer: Option<&str>,
        industry_label: &str,
    ) -> BaseFinancialModel {
        let r = self.registry;
        let cik = text(table, r, "cik", issuer, industry_label).renamed("CIK");
        let company_name = text(table, r, "company_name", issuer, industry_label).renamed("Company Name");
        let fiscal_year = text(table, r, "fiscal_year", issuer, industry_label).renamed("Fiscal Year");
        let fiscal_period = text(table, r, "fiscal_period", issuer, industry_label).renamed("Fiscal Period");

        let shares_outstanding = num(table, r, "shares_outstanding", issuer, industry_label);
        let total_assets = num(table, r, "total_assets", issuer, industry_label);
        let total_liabilities = num(table, r, "total_liabilities", issuer, industry_label);
        let total_equity = num(table, r, "total_equity", issuer, industry_label);
        let cash_and_equivalents = num(table, r, "cash_and_equivalents", issuer, industry_label);
        let current_assets = num(table, r, "current_assets", issuer, industry_label);
        let current_liabilities = num(table, r, "current_liabilities", issuer, industry_label);

        let preferred_stock = {
            let extracted = num(table, r, "preferred_stock", issuer, industry_label);
            if extracted.is_present() {
                extracted
            } else {
                TraceableField::present(
                    "Preferred Stock",
                    0.0,
                    Provenance::missing("Assumed 0 due to no disclosure or no implementation now"),
                )
            }
        };

        let (total_debt, debt_source) =
            self.resolve_total_debt(table, issuer, industry_label, sic_code == Some(6798));
        info!(ticker, source = debt_source, "fundamental_total_debt_resolved");

        let total_revenue = num(table, r, "total_revenue", issuer, industry_label);
        let operating_income = num(table, r, "operating_income", issuer, industry_label);
        let income_before_tax = num(table, r, "income_before_tax", issuer, industry_label);
        let interest_expense = num(table, r, "interest_expense", issuer, industry_label);
        let depreciation_and_amortization = num(table, r, "depreciation_and_amortization", issuer, industry_label);
        let share_based_compensation = num(table, r, "share_based_compensation", issuer, industry_label);
        let net_income = num(table, r, "net_income", issuer, industry_label);
        let income_tax_expense = num(table, r, "income_tax_expense", issuer, industry_label);

        let ebitda = combine2(
            "EBITDA",
            &operating_income,
            &depreciation_and_amortization,
            "ADD",
            "OperatingIncome + D&A",
            |a, b| a + b,
        );

        let operating_cash_flow = num(table, r, "operating_cash_flow", issuer, industry_label);
        let dividends_paid = num(table, r, "dividends_paid", issuer, industry_label);

        let working_capital = combine2(
            "Working Capital",
            &current_assets,
            &current_liabilities,
            "SUB",
            "CurrentAssets - CurrentLiabilities",
            |a, b| a - b,
        );

        let effective_tax_rate = divide(
            "Effective Tax Rate",
            &income_tax_expense,
            &income_before_tax,
            "DIV",
            "IncomeTaxExpense / IncomeBeforeTax",
        );
        let interest_cost_rate = divide(
            "Interest Cost Rate",
            &interest_expense,
            &total_debt,
            "DIV",
            "InterestExpense / TotalDebt",
        );
        let ebit_margin = divide(
            "EBIT Margin",
            &operating_income,
            &total_revenue,
            "DIV",
            "OperatingIncome / Revenue",
        );
        let net_margin = divide("Net Margin", &net_income, &total_revenue, "DIV", "NetIncome / Revenue");

        let equity_plus_debt = combine2(
            "Equity + Debt",
            &total_equity,
            &total_debt,
            "ADD",
            "TotalEquity + TotalDebt",
            |a, b| a + b,
        );
        let invested_capital = combine2(
            "Invested Capital",
            &equity_plus_debt,
            &cash_and_equivalents,
            "SUB",
            "(TotalEquity + TotalDebt) - Cash",
            |a, b| a - b,
        );

        let one_minus_tax_rate = match effective_tax_rate.value {
            Some(rate) => TraceableField::present(
                "1 - Effective Tax Rate",
                1.0 - rate,
                Provenance::Computed {
                    op_code: "SUB",
                    expression: "1 - EffectiveTaxRate",
                    inputs: std::collections::BTreeMap::from([(
                        effective_tax_rate.name.clone(),
                        effective_tax_rate.clone(),
                    )]),
                },
            ),
            None => TraceableField::missing("1 - Effective Tax Rate", "missing effective tax rate"),
        };
        let nopat = combine2(
            "NOPAT",
            &operating_income,
            &one_minus_tax_rate,
            "MUL",
            "OperatingIncome * (1 - EffectiveTaxRate)",
            |a, b| a * b,
        );
        let roic = divide("ROIC", &nopat, &invested_capital, "DIV", "NOPAT / InvestedCapital");

        BaseFinancialModel {
            ticker: TraceableField::present(
                "Ticker",
                ticker.to_string(),
                Provenance::missing("Supplied by caller"),
            ),
            cik,
            company_name,
            sic_code: TraceableField::present(
                "SIC Code",
                sic_code.map(|c| c.to_string()).unwrap_or_default(),
                Provenance::missing("Supplied by caller"),
            ),
            fiscal_year,
            fiscal_period,
            shares_outstanding,
            total_assets,
            total_liabilities,
            total_equity,
            cash_and_equivalents,
            current_assets,
            current_liabilities,
            total_debt,
            preferred_stock,
            total_revenue,
            operating_income,
            income_before_tax,
            interest_expense,
            depreciation_and_amortization,
            share_based_compensation,
            net_income,
            income_tax_expense,
            ebitda,
            operating_cash_flow,
            dividends_paid,
            working_capital,
            working_capital_delta: TraceableField::missing(
                "Working Capital Delta",
                "Computed only during cross-period derivatives",
            ),
            effective_tax_rate,
            interest_cost_rate,
            ebit_margin,
            net_margin,
            invested_capital,
            nopat,
            roic,
            reinvestment_rate: TraceableField::missing(
                "Reinvestment Rate",
                "Computed only during cross-period derivatives",
            ),
        }
    }

    /// Resolve total debt under the configured policy. See spec.md §4.5 for
    /// the full four-step priority.
    ///
    /// The original design retried every debt component with statement
    /// filters cleared if the strict pass came back empty. Here that retry
    /// is subsumed by [`crate::field::extract_field`] itself: every field,
    /// total debt's components included, already falls through a
    /// `relaxed_context` stage with statement filters cleared before
    /// giving up (spec.md §4.4). A second top-level retry over the same
    /// already-relaxed components would just repeat the same searches.
    fn resolve_total_debt(
        &self,
        table: &FactTable,
        issuer: Option<&str>,
        industry_label: &str,
        is_real_estate: bool,
    ) -> (Num, &'static str) {
        let (total_debt, source) = self.try_total_debt(table, issuer, industry_label, is_real_estate);
        if !total_debt.is_present() {
            warn!("fundamental_total_debt_missing_after_all_stages");
        }
        (total_debt, source)
    }

    fn try_total_debt(
        &self,
        table: &FactTable,
        issuer: Option<&str>,
        industry_label: &str,
        is_real_estate: bool,
    ) -> (Num, &'static str) {
        let r = self.registry;
        let debt_ex_leases = self.debt_excluding_leases(table, issuer, industry_label, is_real_estate);
        let finance_lease_total = self.finance_lease_total(table, issuer, industry_label);
        let combined_with_leases = num(table, r, "total_debt_with_finance_leases", issuer, industry_label);

        match self.config.total_debt_policy {
            TotalDebtPolicy::IncludeFinanceLeases => {
                if combined_with_leases.is_present() {
                    (combined_with_leases, "combined_debt_including_finance_leases")
                } else if debt_ex_leases.is_present() && finance_lease_total.is_present() {
                    let total = sum_allowing_partial(
                        "Total Debt",
                        "ADD",
                        "DebtExcludingFinanceLeases + FinanceLeaseTotal",
                        &[&debt_ex_leases, &finance_lease_total],
                    );
                    (total, "debt_excluding_finance_leases_plus_finance_lease")
                } else if debt_ex_leases.is_present() {
                    (
                        debt_ex_leases.renamed("Total Debt"),
                        "debt_excluding_finance_leases_only",
                    )
                } else if finance_lease_total.is_present() {
                    (finance_lease_total.renamed("Total Debt"), "finance_lease_only")
                } else {
                    (TraceableField::missing("Total Debt", "no debt components found"), "missing")
                }
            }
            TotalDebtPolicy::ExcludeFinanceLeases => {
                if debt_ex_leases.is_present() {
                    (debt_ex_leases.renamed("Total Debt"), "debt_excluding_finance_leases")
                } else {
                    (TraceableField::missing("Total Debt", "no debt components found"), "missing")
                }
            }
        }
    }

    fn debt_excluding_leases(
        &self,
        table: &FactTable,
        issuer: Option<&str>,
        industry_label: &str,
        is_real_estate: bool,
    ) -> Num {
        let r = self.registry;
        let combined = num(table, r, "total_debt_combined", issuer, industry_label);
        if combined.is_present() {
            return combined;
        }
        if is_real_estate {
            return self.real_estate_debt_ex_leases(table, issuer, industry_label);
        }
        let short = num(table, r, "debt_short", issuer, industry_label);
        let long = num(table, r, "debt_long", issuer, industry_label);
        sum_allowing_partial("Total Debt (Ex-Leases)", "ADD", "ShortTermDebt + LongTermDebt", &[&short, &long])
    }

    fn finance_lease_total(&self, table: &FactTable, issuer: Option<&str>, industry_label: &str) -> Num {
        let r = self.registry;
        let combined = num(table, r, "finance_lease_liabilities_combined", issuer, industry_label);
        if combined.is_present() {
            return combined;
        }
        let current = num(table, r, "finance_lease_liabilities_current", issuer, industry_label);
        let noncurrent = num(table, r, "finance_lease_liabilities_noncurrent", issuer, industry_label);
        sum_allowing_partial(
            "Finance Lease Liabilities (Total)",
            "ADD",
            "FinanceLeaseCurrent + FinanceLeaseNoncurrent",
            &[&current, &noncurrent],
        )
    }

    /// Real-estate-specific debt reconstruction: prefers a current/
    /// noncurrent notes-payable split over the combined notes concept,
    /// prefers current loans-payable over the combined concept, and always
    /// folds in commercial paper. Distinct from the search-result dedup
    /// key and the stage-config dedup key — this function's inputs are
    /// already-resolved `Num`s, summed with a simple presence check, not a
    /// tuple-keyed row dedup.
    fn real_estate_debt_ex_leases(&self, table: &FactTable, issuer: Option<&str>, industry_label: &str) -> Num {
        let r = self.registry;

        let notes_current = num(table, r, "notes_payable_current", issuer, industry_label);
        let notes_noncurrent = num(table, r, "notes_payable_noncurrent", issuer, industry_label);
        let notes_combined = num(table, r, "notes_payable", issuer, industry_label);
        let notes = if notes_current.is_present() || notes_noncurrent.is_present() {
            sum_allowing_partial(
                "Notes Payable",
                "ADD",
                "NotesPayableCurrent + NotesPayableNoncurrent",
                &[&notes_current, &notes_noncurrent],
            )
        } else {
            notes_combined
        };

        let loans_current = num(table, r, "loans_payable_current", issuer, industry_label);
        let loans_combined = num(table, r, "loans_payable", issuer, industry_label);
        let loans = if loans_current.is_present() {
            loans_current
        } else {
            loans_combined
        };

        let commercial_paper = num(table, r, "commercial_paper", issuer, industry_label);

        sum_allowing_partial(
            "Total Debt (Ex-Leases, Real Estate)",
            "ADD",
            "Notes + Loans + CommercialPaper",
            &[&notes, &loans, &commercial_paper],
        )
    }

    fn build_industrial_extension(&self, table: &FactTable, issuer: Option<&str>, industry_label: &str) -> IndustrialExtension {
        let r = self.registry;
        let inventory = num(table, r, "inventory", issuer, industry_label);
        let accounts_receivable = num(table, r, "accounts_receivable", issuer, industry_label);
        let cogs = num(table, r, "cogs", issuer, industry_label);
        let rd_expense = num(table, r, "rd_expense", issuer, industry_label);
        let selling_expense = num(table, r, "selling_expense", issuer, industry_label);
        let ga_expense = num(table, r, "ga_expense", issuer, industry_label);

        let sga_direct = num(table, r, "sga_expense", issuer, industry_label);
        let sga_expense = if sga_direct.is_present() {
            sga_direct
        } else {
            sum_allowing_partial(
                "SG&A Expense",
                "ADD",
                "SellingExpense + GeneralAndAdministrativeExpense",
                &[&selling_expense, &ga_expense],
            )
        };

        let capex = num(table, r, "capex", issuer, industry_label);

        IndustrialExtension {
            inventory,
            accounts_receivable,
            cogs,
            rd_expense,
            sga_expense,
            selling_expense,
            ga_expense,
            capex,
        }
    }

    fn build_financial_services_extension(
        &self,
        table: &FactTable,
        issuer: Option<&str>,
        industry_label: &str,
    ) -> FinancialServicesExtension {
        let r = self.registry;
        FinancialServicesExtension {
            loans_and_leases: num(table, r, "loans_and_leases", issuer, industry_label),
            deposits: num(table, r, "deposits", issuer, industry_label),
            allowance_for_credit_losses: num(table, r, "allowance_for_credit_losses", issuer, industry_label),
            interest_income: num(table, r, "interest_income", issuer, industry_label),
            interest_expense: num(table, r, "interest_expense_financial", issuer, industry_label),
            provision_for_loan_losses: num(table, r, "provision_for_loan_losses", issuer, industry_label),
            risk_weighted_assets: num(table, r, "risk_weighted_assets", issuer, industry_label),
            tier1_capital_ratio: num(table, r, "tier1_capital_ratio", issuer, industry_label),
        }
    }

    fn build_real_estate_extension(
        &self,
        table: &FactTable,
        issuer: Option<&str>,
        industry_label: &str,
        base: &BaseFinancialModel,
    ) -> RealEstateExtension {
        let r = self.registry;
        let real_estate_assets = num(table, r, "real_estate_assets", issuer, industry_label);
        let accumulated_depreciation = num(table, r, "accumulated_depreciation", issuer, industry_label);
        let depreciation_and_amortization = num(table, r, "real_estate_dep_amort", issuer, industry_label);
        let gain_on_sale = num(table, r, "gain_on_sale", issuer, industry_label);

        let ffo = sum_allowing_partial(
            "Funds From Operations (FFO)",
            "FFO",
            "NetIncome + Depreciation - GainOnSale",
            &[&base.net_income, &depreciation_and_amortization, &negate(&gain_on_sale)],
        );

        RealEstateExtension {
            real_estate_assets,
            accumulated_depreciation,
            depreciation_and_amortization,
            gain_on_sale,
            ffo,
        }
    }
}

/// Negates a field's value while preserving its provenance's traceability,
/// used to fold gain-on-sale into the FFO sum as a subtraction via
/// [`sum_allowing_partial`]. Assumes gain-on-sale is reported positive; see
/// [`RealEstateExtension::ffo`]'s doc comment for the known limitation.
fn negate(field: &Num) -> Num {
    match field.value {
        Some(v) => TraceableField::present(field.name.clone(), -v, field.provenance.clone()),
        None => field.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xbrl_search::RawFact;

    fn table_with(facts: Vec<RawFact>) -> FactTable {
        FactTable::from_facts(facts).unwrap()
    }

    #[test]
    fn sic_6798_dispatches_to_real_estate_extension() {
        let registry = xbrl_mapping::with_defaults().unwrap();
        let config = ResolverConfig::default();
        let factory = ReportFactory::new(&registry, &config);
        let table = table_with(vec![RawFact::new("us-gaap:Assets", "1", "instant_2023-12-31")
            .with_statement_type("Consolidated Balance Sheets")
            .with_unit("usd")]);
        let report = factory.build_report(&table, "REIT", Some(6798));
        assert!(matches!(report.extension, IndustryExtension::RealEstate(_)));
    }

    #[test]
    fn total_debt_prefers_combined_with_leases_concept() {
        let registry = xbrl_mapping::with_defaults().unwrap();
        let config = ResolverConfig::default();
        let factory = ReportFactory::new(&registry, &config);
        let table = table_with(vec![RawFact::new(
            "us-gaap:DebtAndCapitalLeaseObligations",
            "500",
            "instant_2023-12-31",
        )
        .with_statement_type("Consolidated Balance Sheets")
        .with_unit("usd")]);
        let (total_debt, source) = factory.try_total_debt(&table, Some("T"), "Industrial", false);
        assert_eq!(total_debt.value, Some(500.0));
        assert_eq!(source, "combined_debt_including_finance_leases");
    }

    #[test]
    fn total_debt_reconstructs_from_short_and_long_when_no_combined_concept() {
        let registry = xbrl_mapping::with_defaults().unwrap();
        let config = ResolverConfig::default();
        let factory = ReportFactory::new(&registry, &config);
        let table = table_with(vec![
            RawFact::new("us-gaap:ShortTermBorrowings", "100", "instant_2023-12-31")
                .with_statement_type("Consolidated Balance Sheets")
                .with_unit("usd"),
            RawFact::new("us-gaap:LongTermDebtNoncurrent", "900", "instant_2023-12-31")
                .with_statement_type("Consolidated Balance Sheets")
                .with_unit("usd"),
        ]);
        let (total_debt, source) = factory.try_total_debt(&table, Some("T"), "Industrial", false);
        assert_eq!(total_debt.value, Some(1000.0));
        assert_eq!(source, "debt_excluding_finance_leases_only");
    }

    #[test]
    fn exclude_finance_leases_policy_ignores_lease_components() {
        let registry = xbrl_mapping::with_defaults().unwrap();
        let config = ResolverConfig {
            total_debt_policy: TotalDebtPolicy::ExcludeFinanceLeases,
        };
        let factory = ReportFactory::new(&registry, &config);
        let table = table_with(vec![RawFact::new(
            "us-gaap:DebtLongtermAndShorttermCombinedAmount",
            "750",
            "instant_2023-12-31",
        )
        .with_statement_type("Consolidated Balance Sheets")
        .with_unit("usd")]);
        let (total_debt, source) = factory.try_total_debt(&table, Some("T"), "Industrial", false);
        assert_eq!(total_debt.value, Some(750.0));
        assert_eq!(source, "debt_excluding_finance_leases");
    }
}
