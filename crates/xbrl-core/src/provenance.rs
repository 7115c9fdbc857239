//! Provenance: the record of how a field's value came to exist.
//!
//! Modeled as a tagged sum type with three variants rather than the dynamic
//! cross-module references the Python original uses. Each `Provenance` node
//! is built once and never mutated, so the `Computed` variant's `inputs` map
//! owns its `TraceableField`s by value instead of through an arena or shared
//! pointer — the graph is a DAG by construction and never needs to be walked
//! back up, so ownership-by-value is simplest and avoids any possibility of
//! a reference cycle.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::traceable::TraceableField;

/// How a [`TraceableField`]'s value was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Provenance {
    /// The value was read directly from an XBRL fact.
    Xbrl {
        /// The namespaced concept tag, e.g. `us-gaap:Revenues`.
        concept: String,
        /// The period key the fact was reported under.
        period: String,
    },
    /// The value was derived from other fields.
    Computed {
        /// Short symbolic operation code, e.g. `DIV`, `SUM`, `NOPAT`.
        op_code: &'static str,
        /// Human-readable expression, e.g. `"OperatingIncome / Revenue"`.
        expression: &'static str,
        /// The fields that fed this computation, keyed by a readable name.
        inputs: BTreeMap<String, TraceableField<f64>>,
    },
    /// The value was assumed or is explicitly absent; `description` records why.
    Assumed {
        /// Explanation of the assumption or absence.
        description: String,
    },
}

impl Provenance {
    /// Shorthand for an [`Provenance::Assumed`] describing a missing value.
    pub fn missing(description: impl Into<String>) -> Self {
        Self::Assumed {
            description: description.into(),
        }
    }

    /// The XBRL concept this provenance traces to, if any.
    #[must_use]
    pub fn concept(&self) -> Option<&str> {
        match self {
            Self::Xbrl { concept, .. } => Some(concept),
            _ => None,
        }
    }

    /// A short label describing the source of this value, used in diagnostics.
    #[must_use]
    pub fn source_label(&self) -> String {
        match self {
            Self::Xbrl { concept, .. } => concept.clone(),
            Self::Computed { expression, .. } => (*expression).to_string(),
            Self::Assumed { description } => description.clone(),
        }
    }
}
