//! Missing-value propagation combinators.
//!
//! Every derived metric in this crate goes through exactly one of these two
//! functions, so "any missing input means a missing output" (or its one
//! documented exception, [`sum_allowing_partial`]) is implemented once
//! instead of re-checked ad hoc at every call site.

use std::collections::BTreeMap;

use xbrl_core::{Num, Provenance};

/// Combine two fields with `f`, propagating absence: if either input is
/// missing, the result is missing. Used for every ratio, margin, and
/// two-term arithmetic metric in the base model.
pub fn combine2(
    name: &str,
    a: &Num,
    b: &Num,
    op_code: &'static str,
    expression: &'static str,
    f: impl FnOnce(f64, f64) -> f64,
) -> Num {
    match (a.value, b.value) {
        (Some(x), Some(y)) => Num::present(
            name,
            f(x, y),
            Provenance::Computed {
                op_code,
                expression,
                inputs: BTreeMap::from([(a.name.clone(), a.clone()), (b.name.clone(), b.clone())]),
            },
        ),
        _ => Num::missing(name, format!("missing input(s) for {expression}")),
    }
}

/// Like [`combine2`], for division: additionally missing if the
/// denominator is exactly zero (avoids a silent infinity in a ratio field).
pub fn divide(name: &str, numerator: &Num, denominator: &Num, op_code: &'static str, expression: &'static str) -> Num {
    if denominator.value == Some(0.0) {
        return Num::missing(name, format!("division by zero for {expression}"));
    }
    combine2(name, numerator, denominator, op_code, expression, |x, y| x / y)
}

/// Sum every present input, treating a missing input as zero — *unless
/// every* input is missing, in which case the result itself is missing
/// rather than a misleading zero. Used for the handful of aggregate
/// fallback sums (SG&A from Selling + G&A, FFO, finance-lease and
/// notes-payable reconstruction) that explicitly tolerate partial data.
pub fn sum_allowing_partial(name: &str, op_code: &'static str, expression: &'static str, items: &[&Num]) -> Num {
    if items.iter().all(|field| field.value.is_none()) {
        let names: Vec<&str> = items.iter().map(|field| field.name.as_str()).collect();
        return Num::missing(name, format!("all inputs missing: {}", names.join(", ")));
    }
    let total: f64 = items.iter().map(|field| field.value.unwrap_or(0.0)).sum();
    let inputs = items
        .iter()
        .map(|field| (field.name.clone(), (*field).clone()))
        .collect();
    Num::present(
        name,
        total,
        Provenance::Computed {
            op_code,
            expression,
            inputs,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn present(name: &str, value: f64) -> Num {
        Num::present(name, value, Provenance::Assumed { description: "test".into() })
    }

    fn missing(name: &str) -> Num {
        Num::missing(name, "test")
    }

    #[test]
    fn combine2_propagates_missing_input() {
        let result = combine2("x", &present("a", 1.0), &missing("b"), "SUB", "a - b", |a, b| a - b);
        assert!(result.value.is_none());
    }

    #[test]
    fn divide_by_zero_is_missing() {
        let result = divide("x", &present("a", 1.0), &present("b", 0.0), "DIV", "a / b");
        assert!(result.value.is_none());
    }

    #[test]
    fn sum_allowing_partial_treats_missing_as_zero() {
        let result = sum_allowing_partial("x", "SUM", "a + b", &[&present("a", 3.0), &missing("b")]);
        assert_eq!(result.value, Some(3.0));
    }

    #[test]
    fn sum_allowing_partial_all_missing_is_missing() {
        let result = sum_allowing_partial("x", "SUM", "a + b", &[&missing("a"), &missing("b")]);
        assert!(result.value.is_none());
    }
}
