//! Resolver configuration.
//!
//! The total-debt policy is the only configuration knob the resolver reads
//! from the process environment, and it is read exactly once, at the top of
//! a report build, then threaded through as a parameter — never re-read
//! mid-build (see spec.md §9, "Environment variable reading").

use std::env;

/// Name of the environment variable controlling [`TotalDebtPolicy`].
pub const TOTAL_DEBT_POLICY_ENV: &str = "FUNDAMENTAL_TOTAL_DEBT_POLICY";

/// Whether total debt includes finance-lease liabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TotalDebtPolicy {
    /// Prefer a combined debt-plus-finance-lease figure, reconstructing it
    /// from components when no combined concept is disclosed.
    #[default]
    IncludeFinanceLeases,
    /// Exclude finance-lease liabilities from total debt entirely.
    ExcludeFinanceLeases,
}

impl TotalDebtPolicy {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "include_finance_leases" => Some(Self::IncludeFinanceLeases),
            "exclude_finance_leases" => Some(Self::ExcludeFinanceLeases),
            _ => None,
        }
    }

    /// Resolution-source label used in `total_debt_policy_applied` diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IncludeFinanceLeases => "include_finance_leases",
            Self::ExcludeFinanceLeases => "exclude_finance_leases",
        }
    }
}

/// Resolver-wide configuration, read once per report build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolverConfig {
    /// Whether total debt includes finance leases.
    pub total_debt_policy: TotalDebtPolicy,
}

/// Outcome of reading [`TOTAL_DEBT_POLICY_ENV`]: the resolved policy, and
/// whether the raw value (if any) was invalid and a fallback was applied.
#[derive(Debug, Clone)]
pub struct PolicyReadOutcome {
    /// The policy to use.
    pub policy: TotalDebtPolicy,
    /// `Some(raw)` if the environment variable was set to something that did
    /// not parse as a recognized policy.
    pub invalid_raw_value: Option<String>,
}

impl ResolverConfig {
    /// Build a config by reading [`TOTAL_DEBT_POLICY_ENV`] from the process
    /// environment once.
    #[must_use]
    pub fn from_env() -> (Self, PolicyReadOutcome) {
        let outcome = match env::var(TOTAL_DEBT_POLICY_ENV) {
            Ok(raw) if !raw.trim().is_empty() => match TotalDebtPolicy::parse(&raw) {
                Some(policy) => PolicyReadOutcome {
                    policy,
                    invalid_raw_value: None,
                },
                None => PolicyReadOutcome {
                    policy: TotalDebtPolicy::default(),
                    invalid_raw_value: Some(raw),
                },
            },
            _ => PolicyReadOutcome {
                policy: TotalDebtPolicy::default(),
                invalid_raw_value: None,
            },
        };
        (
            Self {
                total_debt_policy: outcome.policy,
            },
            outcome,
        )
    }
}
