use xbrl_core::{IndustryExtension, ResolverConfig, TotalDebtPolicy};
use xbrl_search::{FactTable, RawFact};

fn registry() -> xbrl_mapping::MappingRegistry {
    xbrl_mapping::with_defaults().expect("default registry must build")
}

#[test]
fn plain_tag_consolidated_numeric_match() {
    let table = FactTable::from_facts(vec![RawFact::new(
        "us-gaap:Assets",
        "1500000",
        "instant_2023-12-31",
    )
    .with_statement_type("Consolidated Balance Sheets")
    .with_unit("usd")])
    .unwrap();
    let report = xbrl_resolver::resolve_single_report(
        &table,
        "ACME",
        Some(3000),
        &registry(),
        &ResolverConfig::default(),
    );
    assert_eq!(report.base.total_assets.value, Some(1_500_000.0));
}

#[test]
fn parenthesized_negative_with_scale_parses_correctly() {
    let table = FactTable::from_facts(vec![RawFact::new(
        "us-gaap:NetIncomeLoss",
        "(1,250)",
        "duration_2023-01-01_2023-12-31",
    )
    .with_scale("3")
    .with_statement_type("Consolidated Statements of Operations")
    .with_unit("usd")])
    .unwrap();
    let report = xbrl_resolver::resolve_single_report(
        &table,
        "ACME",
        Some(3000),
        &registry(),
        &ResolverConfig::default(),
    );
    assert_eq!(report.base.net_income.value, Some(-1_250_000.0));
}

#[test]
fn staged_fallback_reaches_relaxed_context_when_statement_type_mismatches() {
    let table = FactTable::from_facts(vec![RawFact::new(
        "us-gaap:OperatingIncomeLoss",
        "42",
        "duration_2023-01-01_2023-12-31",
    )
    .with_statement_type("UnexpectedStatement")
    .with_unit("usd")])
    .unwrap();
    let report = xbrl_resolver::resolve_single_report(
        &table,
        "ACME",
        Some(3000),
        &registry(),
        &ResolverConfig::default(),
    );
    assert_eq!(report.base.operating_income.value, Some(42.0));
}

#[test]
fn total_debt_include_leases_uses_combined_concept_when_present() {
    let table = FactTable::from_facts(vec![RawFact::new(
        "us-gaap:DebtAndCapitalLeaseObligations",
        "9000",
        "instant_2023-12-31",
    )
    .with_statement_type("Consolidated Balance Sheets")
    .with_unit("usd")])
    .unwrap();
    let report = xbrl_resolver::resolve_single_report(
        &table,
        "ACME",
        Some(3000),
        &registry(),
        &ResolverConfig::default(),
    );
    assert_eq!(report.base.total_debt.value, Some(9000.0));
}

#[test]
fn total_debt_include_leases_reconstructs_from_ex_lease_and_finance_lease_components() {
    let table = FactTable::from_facts(vec![
        RawFact::new("us-gaap:ShortTermBorrowings", "100", "instant_2023-12-31")
            .with_statement_type("Consolidated Balance Sheets")
            .with_unit("usd"),
        RawFact::new("us-gaap:LongTermDebtNoncurrent", "800", "instant_2023-12-31")
            .with_statement_type("Consolidated Balance Sheets")
            .with_unit("usd"),
        RawFact::new("us-gaap:FinanceLeaseLiability", "50", "instant_2023-12-31")
            .with_statement_type("Consolidated Balance Sheets")
            .with_unit("usd"),
    ])
    .unwrap();
    let report = xbrl_resolver::resolve_single_report(
        &table,
        "ACME",
        Some(3000),
        &registry(),
        &ResolverConfig::default(),
    );
    assert_eq!(report.base.total_debt.value, Some(950.0));
}

#[test]
fn total_debt_exclude_leases_policy_ignores_finance_lease_components() {
    let table = FactTable::from_facts(vec![
        RawFact::new("us-gaap:ShortTermBorrowings", "100", "instant_2023-12-31")
            .with_statement_type("Consolidated Balance Sheets")
            .with_unit("usd"),
        RawFact::new("us-gaap:LongTermDebtNoncurrent", "800", "instant_2023-12-31")
            .with_statement_type("Consolidated Balance Sheets")
            .with_unit("usd"),
        RawFact::new("us-gaap:FinanceLeaseLiability", "50", "instant_2023-12-31")
            .with_statement_type("Consolidated Balance Sheets")
            .with_unit("usd"),
    ])
    .unwrap();
    let config = ResolverConfig {
        total_debt_policy: TotalDebtPolicy::ExcludeFinanceLeases,
    };
    let report = xbrl_resolver::resolve_single_report(&table, "ACME", Some(3000), &registry(), &config);
    assert_eq!(report.base.total_debt.value, Some(900.0));
}

#[test]
fn cross_period_reinvestment_rate_computed_for_industrial_batch() {
    let registry = registry();
    let config = ResolverConfig::default();
    let facts_2022 = vec![
        RawFact::new("us-gaap:AssetsCurrent", "500", "instant_2022-12-31")
            .with_statement_type("Consolidated Balance Sheets")
            .with_unit("usd"),
        RawFact::new("us-gaap:LiabilitiesCurrent", "200", "instant_2022-12-31")
            .with_statement_type("Consolidated Balance Sheets")
            .with_unit("usd"),
        RawFact::new("us-gaap:OperatingIncomeLoss", "300", "duration_2022-01-01_2022-12-31")
            .with_statement_type("Consolidated Statements of Operations")
            .with_unit("usd"),
        RawFact::new("us-gaap:IncomeTaxExpenseBenefit", "60", "duration_2022-01-01_2022-12-31")
            .with_statement_type("Consolidated Statements of Operations")
            .with_unit("usd"),
        RawFact::new(
            "us-gaap:IncomeLossFromContinuingOperationsBeforeIncomeTaxesExtraordinaryItemsNoncontrollingInterest",
            "300",
            "duration_2022-01-01_2022-12-31",
        )
        .with_statement_type("Consolidated Statements of Operations")
        .with_unit("usd"),
        RawFact::new("us-gaap:PaymentsToAcquirePropertyPlantAndEquipment", "40", "duration_2022-01-01_2022-12-31")
            .with_statement_type("Consolidated Statements of Cash Flows")
            .with_unit("usd"),
        RawFact::new("us-gaap:DepreciationDepletionAndAmortization", "30", "duration_2022-01-01_2022-12-31")
            .with_statement_type("Consolidated Statements of Cash Flows")
            .with_unit("usd"),
        RawFact::new("dei:DocumentFiscalYearFocus", "2022", "instant_2022-12-31"),
        RawFact::new("us-gaap:StockholdersEquity", "1000", "instant_2022-12-31")
            .with_statement_type("Consolidated Balance Sheets")
            .with_unit("usd"),
    ];
    let facts_2023 = vec![
        RawFact::new("us-gaap:AssetsCurrent", "650", "instant_2023-12-31")
            .with_statement_type("Consolidated Balance Sheets")
            .with_unit("usd"),
        RawFact::new("us-gaap:LiabilitiesCurrent", "220", "instant_2023-12-31")
            .with_statement_type("Consolidated Balance Sheets")
            .with_unit("usd"),
        RawFact::new("us-gaap:OperatingIncomeLoss", "360", "duration_2023-01-01_2023-12-31")
            .with_statement_type("Consolidated Statements of Operations")
            .with_unit("usd"),
        RawFact::new("us-gaap:IncomeTaxExpenseBenefit", "72", "duration_2023-01-01_2023-12-31")
            .with_statement_type("Consolidated Statements of Operations")
            .with_unit("usd"),
        RawFact::new(
            "us-gaap:IncomeLossFromContinuingOperationsBeforeIncomeTaxesExtraordinaryItemsNoncontrollingInterest",
            "360",
            "duration_2023-01-01_2023-12-31",
        )
        .with_statement_type("Consolidated Statements of Operations")
        .with_unit("usd"),
        RawFact::new("us-gaap:PaymentsToAcquirePropertyPlantAndEquipment", "55", "duration_2023-01-01_2023-12-31")
            .with_statement_type("Consolidated Statements of Cash Flows")
            .with_unit("usd"),
        RawFact::new("us-gaap:DepreciationDepletionAndAmortization", "35", "duration_2023-01-01_2023-12-31")
            .with_statement_type("Consolidated Statements of Cash Flows")
            .with_unit("usd"),
        RawFact::new("dei:DocumentFiscalYearFocus", "2023", "instant_2023-12-31"),
        RawFact::new("us-gaap:StockholdersEquity", "1100", "instant_2023-12-31")
            .with_statement_type("Consolidated Balance Sheets")
            .with_unit("usd"),
    ];

    let tables = vec![
        (2022, FactTable::from_facts(facts_2022).unwrap()),
        (2023, FactTable::from_facts(facts_2023).unwrap()),
    ];
    let reports = xbrl_resolver::resolve_reports(tables, "ACME", Some(3000), &registry, &config);

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].base.fiscal_year.value.as_deref(), Some("2023"));
    assert!(reports[0].base.working_capital_delta.is_present());
    assert!(matches!(reports[0].extension, IndustryExtension::Industrial(_)));
    assert!(reports[0].base.reinvestment_rate.is_present());
    assert!(!reports[1].base.working_capital_delta.is_present());
}

#[test]
fn empty_fact_table_yields_all_missing_base_fields() {
    let table = FactTable::from_facts(vec![]).unwrap();
    let report = xbrl_resolver::resolve_single_report(
        &table,
        "EMPTY",
        None,
        &registry(),
        &ResolverConfig::default(),
    );
    assert!(!report.base.total_assets.is_present());
    assert!(!report.base.total_debt.is_present());
}

#[test]
fn absent_anchor_date_does_not_panic_when_respecting_it() {
    let table = FactTable::from_facts(vec![RawFact::new(
        "us-gaap:Assets",
        "10",
        "instant_2023-12-31",
    )
    .with_statement_type("Consolidated Balance Sheets")
    .with_unit("usd")])
    .unwrap();
    assert_eq!(table.anchor_date(), None);
    let report = xbrl_resolver::resolve_single_report(
        &table,
        "ACME",
        Some(3000),
        &registry(),
        &ResolverConfig::default(),
    );
    assert_eq!(report.base.total_assets.value, Some(10.0));
}
