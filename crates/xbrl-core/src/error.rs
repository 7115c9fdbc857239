//! Structural error types for the resolver.
//!
//! These cover only the error kinds that are genuinely exceptional —
//! programmer or integration mistakes. A field that cannot be found in a
//! filing is never an error; it is a [`crate::traceable::TraceableField`]
//! with a missing value and an explanatory provenance.

use thiserror::Error;

/// Errors that can surface out of the resolver.
#[derive(Error, Debug)]
pub enum ResolverError {
    /// The fact table is missing a mandatory column.
    #[error("fact table is missing mandatory column: {column}")]
    MissingColumn {
        /// Name of the missing column.
        column: &'static str,
    },

    /// A `SearchConfig`'s concept regex failed to compile.
    #[error("invalid concept regex {pattern:?}: {source}")]
    InvalidConceptRegex {
        /// The pattern that failed to compile.
        pattern: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// The caller asked to locate a specific fiscal year inside an already
    /// assembled batch of reports, and none matched.
    #[error("no report located for {ticker} fiscal year {fiscal_year}")]
    ReportNotLocatable {
        /// Ticker that was searched for.
        ticker: String,
        /// Fiscal year that was searched for.
        fiscal_year: i32,
    },
}

/// Result type alias using [`ResolverError`].
pub type Result<T> = std::result::Result<T, ResolverError>;
