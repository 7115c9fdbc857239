//! Cross-period derivatives: metrics that need more than one fiscal year's
//! report to compute. Applied once, after every single-period report in a
//! batch has been built.

use std::collections::BTreeMap;

use xbrl_core::{FinancialReport, Provenance, TraceableField};

fn fiscal_year_of(report: &FinancialReport) -> Option<i32> {
    report
        .base
        .fiscal_year
        .value
        .as_deref()
        .and_then(|s| s.trim().parse::<i32>().ok())
}

/// Sort `reports` fiscal-year-descending, then compute `working_capital_delta`
/// (this year's working capital minus the prior year's) and
/// `reinvestment_rate` (`(capex - D&A + working_capital_delta) / nopat`,
/// Industrial issuers only — CapEx has no counterpart in the other
/// extensions). Each report's derived fields are set exactly once.
pub fn apply_cross_period_derivatives(reports: &mut [FinancialReport]) {
    reports.sort_by(|a, b| match (fiscal_year_of(a), fiscal_year_of(b)) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    let prior_working_capital: Vec<Option<f64>> =
        reports.iter().map(|r| r.base.working_capital.value).collect();

    for i in 0..reports.len() {
        let Some(prior_wc) = prior_working_capital.get(i + 1).copied().flatten() else {
            continue;
        };
        let report = &mut reports[i];
        let Some(current_wc) = report.base.working_capital.value else {
            continue;
        };

        report.base.working_capital_delta = TraceableField::present(
            "Working Capital Delta",
            current_wc - prior_wc,
            Provenance::Computed {
                op_code: "SUB",
                expression: "WorkingCapital(t) - WorkingCapital(t-1)",
                inputs: BTreeMap::from([("Working Capital".to_string(), report.base.working_capital.clone())]),
            },
        );
    }

    for i in 0..reports.len() {
        let capex = reports[i].extension.capex().and_then(|c| c.value);
        let Some(capex) = capex else { continue };

        let report = &mut reports[i];
        let dep = report.base.depreciation_and_amortization.value;
        let wc_delta = report.base.working_capital_delta.value;
        let nopat = report.base.nopat.value;

        report.base.reinvestment_rate = match (dep, wc_delta, nopat) {
            (Some(dep), Some(wc_delta), Some(nopat)) if nopat != 0.0 => TraceableField::present(
                "Reinvestment Rate",
                (capex - dep + wc_delta) / nopat,
                Provenance::Computed {
                    op_code: "REINVEST",
                    expression: "(CapEx - D&A + WorkingCapitalDelta) / NOPAT",
                    inputs: BTreeMap::new(),
                },
            ),
            _ => TraceableField::missing(
                "Reinvestment Rate",
                "missing CapEx, D&A, working capital delta, or NOPAT, or NOPAT is zero",
            ),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xbrl_core::{
        BaseFinancialModel, IndustrialExtension, IndustryExtension, IndustryType, Num, Text,
    };

    fn year(y: i32) -> Text {
        TraceableField::present("Fiscal Year", y.to_string(), Provenance::missing("test"))
    }

    fn present(name: &str, v: f64) -> Num {
        TraceableField::present(name, v, Provenance::missing("test"))
    }

    fn report(y: i32, working_capital: f64, capex: f64, dep: f64, nopat: f64) -> FinancialReport {
        let mut base = BaseFinancialModel::blank();
        base.fiscal_year = year(y);
        base.working_capital = present("Working Capital", working_capital);
        base.depreciation_and_amortization = present("D&A", dep);
        base.nopat = present("NOPAT", nopat);
        FinancialReport {
            base,
            extension: IndustryExtension::Industrial(IndustrialExtension {
                inventory: Num::missing("Inventory", "test"),
                accounts_receivable: Num::missing("AR", "test"),
                cogs: Num::missing("COGS", "test"),
                rd_expense: Num::missing("R&D", "test"),
                sga_expense: Num::missing("SG&A", "test"),
                selling_expense: Num::missing("Selling", "test"),
                ga_expense: Num::missing("G&A", "test"),
                capex: present("CapEx", capex),
            }),
            industry_type: IndustryType::Industrial,
        }
    }

    #[test]
    fn working_capital_delta_and_reinvestment_rate_computed_across_sorted_batch() {
        let mut reports = vec![
            report(2022, 100.0, 50.0, 20.0, 200.0),
            report(2023, 150.0, 60.0, 25.0, 220.0),
        ];
        apply_cross_period_derivatives(&mut reports);

        assert_eq!(reports[0].base.fiscal_year.value.as_deref(), Some("2023"));
        assert_eq!(reports[0].base.working_capital_delta.value, Some(50.0));
        let expected_reinvestment = (60.0 - 25.0 + 50.0) / 220.0;
        assert_eq!(reports[0].base.reinvestment_rate.value, Some(expected_reinvestment));

        assert_eq!(reports[1].base.working_capital_delta.value, None);
    }
}
