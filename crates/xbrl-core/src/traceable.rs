//! [`TraceableField`]: a value-plus-provenance pair, the unit of composition
//! of a [`crate::model::FinancialReport`].

use serde::{Deserialize, Serialize};

use crate::provenance::Provenance;

/// A named value that may be absent, always carrying a [`Provenance`]
/// explaining either where the value came from or why it is missing.
///
/// Invariant: if `value` is `None`, `provenance` must describe why (an
/// [`Provenance::Assumed`] "missing" description, or a [`Provenance::Computed`]
/// whose own inputs are themselves missing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceableField<T> {
    /// Human-readable field name, e.g. `"Total Revenue"`.
    pub name: String,
    /// The resolved value, or `None` if it could not be determined.
    pub value: Option<T>,
    /// How the value (or its absence) came to be.
    pub provenance: Provenance,
}

impl<T> TraceableField<T> {
    /// Build a field with a present value.
    pub fn present(name: impl Into<String>, value: T, provenance: Provenance) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
            provenance,
        }
    }

    /// Build a missing field, with a description of why.
    pub fn missing(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            provenance: Provenance::missing(description),
        }
    }

    /// Rename a field in place, keeping its value and provenance.
    #[must_use]
    pub fn renamed(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    /// `true` if the field has a resolved value.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }
}

impl<T: Clone> TraceableField<T> {
    /// Borrow the value, cloning it out of the `Option`.
    #[must_use]
    pub fn value(&self) -> Option<T> {
        self.value.clone()
    }
}
