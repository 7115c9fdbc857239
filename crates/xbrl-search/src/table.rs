//! The fact table: an in-memory store of XBRL facts built once per filing
//! and never mutated afterward.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use xbrl_core::ResolverError;

/// A raw cell value as filed: either text or a number. Stored verbatim; no
/// numeric interpretation happens until the field resolver parses a search
/// result (spec.md §4.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawValue {
    /// A string value, including numbers written with formatting such as
    /// thousands separators or parenthesized negatives.
    Text(String),
    /// A bare number, already parsed by whatever produced the fact feed.
    Number(f64),
}

impl RawValue {
    /// Render the value the way it would appear if it had come in as text.
    /// Used for dedup keys and diagnostics, mirroring `str(raw_value)` in
    /// the original extractor.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

const UNIT_ALIASES: &[&str] = &["unit", "unit_ref", "unit_ref_id", "unit_id", "unit_key"];

/// One row destined for a [`FactTable`], built with the teacher's
/// builder-style `with_*` methods. `extra` carries every column the raw
/// feed supplied beyond the well-known ones, including the open set of
/// dimension columns and any unit-column aliasing.
#[derive(Debug, Clone)]
pub struct RawFact {
    concept: String,
    value: Option<RawValue>,
    period_key: String,
    label: Option<String>,
    statement_type: Option<String>,
    period_type: Option<String>,
    period_end: Option<String>,
    decimals: Option<String>,
    scale: Option<String>,
    unit: Option<String>,
    extra: BTreeMap<String, RawValue>,
}

impl RawFact {
    /// Start a new fact row. `concept`, `value`, and `period_key` are the
    /// only columns every row must carry.
    #[must_use]
    pub fn new(concept: impl Into<String>, value: impl Into<RawValue>, period_key: impl Into<String>) -> Self {
        Self {
            concept: concept.into(),
            value: Some(value.into()),
            period_key: period_key.into(),
            label: None,
            statement_type: None,
            period_type: None,
            period_end: None,
            decimals: None,
            scale: None,
            unit: None,
            extra: BTreeMap::new(),
        }
    }

    /// A row with no value at all (e.g. a context fact like a filer name).
    #[must_use]
    pub fn new_empty(concept: impl Into<String>, period_key: impl Into<String>) -> Self {
        Self {
            concept: concept.into(),
            value: None,
            period_key: period_key.into(),
            label: None,
            statement_type: None,
            period_type: None,
            period_end: None,
            decimals: None,
            scale: None,
            unit: None,
            extra: BTreeMap::new(),
        }
    }

    /// Human-readable label, if the feed carried one.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Which financial statement this row was sourced from.
    #[must_use]
    pub fn with_statement_type(mut self, statement_type: impl Into<String>) -> Self {
        self.statement_type = Some(statement_type.into());
        self
    }

    /// `"instant"` or `"duration"`.
    #[must_use]
    pub fn with_period_type(mut self, period_type: impl Into<String>) -> Self {
        self.period_type = Some(period_type.into());
        self
    }

    /// The period's end date, `YYYY-MM-DD`.
    #[must_use]
    pub fn with_period_end(mut self, period_end: impl Into<String>) -> Self {
        self.period_end = Some(period_end.into());
        self
    }

    /// Reporting precision in decimals (XBRL `decimals` attribute).
    #[must_use]
    pub fn with_decimals(mut self, decimals: impl Into<String>) -> Self {
        self.decimals = Some(decimals.into());
        self
    }

    /// Scale factor applied to the raw value before use.
    #[must_use]
    pub fn with_scale(mut self, scale: impl Into<String>) -> Self {
        self.scale = Some(scale.into());
        self
    }

    /// Canonical unit column. If the feed instead used one of the
    /// recognized aliases, use [`Self::with_column`] and let [`FactTable`]
    /// resolve it by priority.
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Any other named column: a unit-column alias, or a dimension column
    /// (axis/member/segment breakdown). [`FactTable::from_facts`]
    /// classifies dimension columns by name, not by how they arrive here.
    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    fn resolve_unit(&self) -> Option<String> {
        if let Some(unit) = &self.unit {
            return Some(unit.clone());
        }
        for alias in UNIT_ALIASES {
            if let Some(value) = self.extra.get(*alias) {
                let text = value.display();
                if !text.trim().is_empty() {
                    return Some(text);
                }
            }
        }
        None
    }
}

fn is_dimension_column_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.starts_with("dim_")
        || lower.contains("axis")
        || lower.contains("member")
        || lower.contains("segment")
        || lower.contains("dimension")
}

/// One stored fact, indexed by position in [`FactTable::rows`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFact {
    /// XBRL concept tag, e.g. `us-gaap:Assets` or a bare `Assets`.
    pub concept: String,
    /// Raw value as filed, or `None` for a context-only fact.
    pub value: Option<RawValue>,
    /// Human-readable label.
    pub label: Option<String>,
    /// Source financial statement.
    pub statement_type: Option<String>,
    /// `instant_YYYY-MM-DD` or `duration_YYYY-MM-DD_YYYY-MM-DD`.
    pub period_key: String,
    /// `"instant"` or `"duration"`, independent of `period_key`'s prefix.
    pub period_type: Option<String>,
    /// Period end date, used for latest-first ordering.
    pub period_end: Option<String>,
    /// XBRL `decimals` attribute.
    pub decimals: Option<String>,
    /// XBRL `scale` attribute (a power-of-ten exponent, as text).
    pub scale: Option<String>,
    /// Unit, resolved from whichever alias column carried it.
    pub unit: Option<String>,
    /// Dimension-column values for this row, keyed by column name. Columns
    /// absent from this row's source data are simply absent here — the
    /// consolidated/dimensional check in the search engine treats absence
    /// the same as an explicit "none" token.
    pub dimensions: BTreeMap<String, String>,
}

/// An in-memory, column-indexed store of XBRL facts for one filing.
///
/// Built once via [`FactTable::from_facts`] and immutable afterward: the
/// dimension-column set and the anchor date are both fixed at construction
/// (spec.md §4.1's invariants).
#[derive(Debug, Clone)]
pub struct FactTable {
    rows: Vec<StoredFact>,
    dimension_columns: Vec<String>,
    anchor_date: Option<String>,
}

/// One observation returned by [`FactTable::inspect_concept`]: a concept
/// tag's raw value and period, with no filtering applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptObservation {
    /// Matched row's period key.
    pub period_key: String,
    /// Matched row's raw value, rendered for display.
    pub raw_value: Option<String>,
    /// Matched row's unit.
    pub unit: Option<String>,
    /// Matched row's dimension values, for spotting why a row was or was
    /// not consolidated.
    pub dimensions: BTreeMap<String, String>,
}

impl FactTable {
    /// Build a table from raw rows.
    ///
    /// Dimension columns are the union, across all rows, of every column
    /// name matching the rule in spec.md §4.1 (`dim_` prefix, or a
    /// case-insensitive substring match on axis/member/segment/dimension).
    /// The anchor date is the `period_end` of the first row whose concept
    /// contains `DocumentPeriodEndDate` (case-insensitive); absent if no
    /// such row exists.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::MissingColumn`] if any row has an empty
    /// `period_key` — the one column every row must carry meaningfully.
    pub fn from_facts(facts: Vec<RawFact>) -> Result<Self, ResolverError> {
        let mut dimension_names = std::collections::BTreeSet::new();
        for fact in &facts {
            for name in fact.extra.keys() {
                if is_dimension_column_name(name) {
                    dimension_names.insert(name.clone());
                }
            }
        }

        let mut anchor_date = None;
        let mut rows = Vec::with_capacity(facts.len());
        for fact in facts {
            if fact.period_key.trim().is_empty() {
                return Err(ResolverError::MissingColumn { column: "period_key" });
            }

            if anchor_date.is_none()
                && fact.concept.to_lowercase().contains("documentperiodenddate")
            {
                anchor_date = fact
                    .period_end
                    .clone()
                    .or_else(|| fact.value.as_ref().map(RawValue::display));
            }

            let unit = fact.resolve_unit();
            let dimensions = dimension_names
                .iter()
                .filter_map(|name| fact.extra.get(name).map(|v| (name.clone(), v.display())))
                .collect();

            rows.push(StoredFact {
                concept: fact.concept,
                value: fact.value,
                label: fact.label,
                statement_type: fact.statement_type,
                period_key: fact.period_key,
                period_type: fact.period_type,
                period_end: fact.period_end,
                decimals: fact.decimals,
                scale: fact.scale,
                unit,
                dimensions,
            });
        }

        Ok(Self {
            rows,
            dimension_columns: dimension_names.into_iter().collect(),
            anchor_date,
        })
    }

    /// An empty table: no rows, no dimension columns, no anchor date.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            dimension_columns: Vec::new(),
            anchor_date: None,
        }
    }

    /// All stored rows, in original order.
    #[must_use]
    pub fn rows(&self) -> &[StoredFact] {
        &self.rows
    }

    /// The dimension-column names detected at construction, sorted.
    #[must_use]
    pub fn dimension_columns(&self) -> &[String] {
        &self.dimension_columns
    }

    /// `dei:DocumentPeriodEndDate`'s value, if the table had a row for it.
    #[must_use]
    pub fn anchor_date(&self) -> Option<&str> {
        self.anchor_date.as_deref()
    }

    /// A row is consolidated (not broken out by dimension) when every
    /// dimension column is either absent from the row or holds one of the
    /// "no breakdown" tokens: empty string, `none`, `none (total)`, `total`
    /// (case-insensitive). Mirrors `_apply_search_type_mask` in the
    /// original extractor.
    #[must_use]
    pub fn is_consolidated(&self, row: &StoredFact) -> bool {
        self.dimension_columns.iter().all(|col| match row.dimensions.get(col) {
            None => true,
            Some(value) => matches!(
                value.trim().to_lowercase().as_str(),
                "" | "none" | "none (total)" | "total"
            ),
        })
    }

    /// Every row whose concept contains `tag` (case-insensitive, no regex,
    /// no statement/period/unit filtering) — a raw debugging window into
    /// the table, for diagnosing why a concept didn't match a
    /// [`crate::search::SearchConfig`]. Mirrors `debug_asset_issue` in the
    /// original extractor.
    #[must_use]
    pub fn inspect_concept(&self, tag: &str) -> Vec<ConceptObservation> {
        let needle = tag.to_lowercase();
        self.rows
            .iter()
            .filter(|row| row.concept.to_lowercase().contains(&needle))
            .map(|row| ConceptObservation {
                period_key: row.period_key.clone(),
                raw_value: row.value.as_ref().map(RawValue::display),
                unit: row.unit.clone(),
                dimensions: row.dimensions.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_detection_matches_name_rule() {
        let facts = vec![RawFact::new("us-gaap:Assets", 100.0, "instant_2023-12-31")
            .with_column("us-gaap:StatementGeographicalAxis", "US")
            .with_column("dim_segment", "Retail")
            .with_column("unrelated_note", "n/a")];
        let table = FactTable::from_facts(facts).unwrap();
        assert_eq!(
            table.dimension_columns(),
            &["dim_segment".to_string(), "us-gaap:StatementGeographicalAxis".to_string()]
        );
    }

    #[test]
    fn dimension_detection_is_idempotent() {
        let build = || {
            FactTable::from_facts(vec![RawFact::new("us-gaap:Assets", 1.0, "instant_2023-12-31")
                .with_column("MemberAxis", "x")])
            .unwrap()
        };
        assert_eq!(build().dimension_columns(), build().dimension_columns());
    }

    #[test]
    fn consolidated_row_ignores_total_and_none_tokens() {
        let facts = vec![
            RawFact::new("us-gaap:Assets", 1.0, "instant_2023-12-31")
                .with_column("SegmentAxis", "None (Total)"),
            RawFact::new("us-gaap:Assets", 2.0, "instant_2023-12-31")
                .with_column("SegmentAxis", "Retail"),
        ];
        let table = FactTable::from_facts(facts).unwrap();
        assert!(table.is_consolidated(&table.rows()[0]));
        assert!(!table.is_consolidated(&table.rows()[1]));
    }

    #[test]
    fn anchor_date_located_from_dei_concept() {
        let facts = vec![
            RawFact::new("dei:DocumentPeriodEndDate", "2023-12-31", "instant_2023-12-31")
                .with_period_end("2023-12-31"),
            RawFact::new("us-gaap:Assets", 1.0, "instant_2023-12-31"),
        ];
        let table = FactTable::from_facts(facts).unwrap();
        assert_eq!(table.anchor_date(), Some("2023-12-31"));
    }

    #[test]
    fn anchor_date_absent_when_no_dei_row_present() {
        let facts = vec![RawFact::new("us-gaap:Assets", 1.0, "instant_2023-12-31")];
        let table = FactTable::from_facts(facts).unwrap();
        assert_eq!(table.anchor_date(), None);
    }

    #[test]
    fn unit_alias_priority_falls_back_through_the_chain() {
        let facts = vec![RawFact::new("us-gaap:Assets", 1.0, "instant_2023-12-31")
            .with_column("unit_ref_id", "USD")];
        let table = FactTable::from_facts(facts).unwrap();
        assert_eq!(table.rows()[0].unit.as_deref(), Some("USD"));
    }

    #[test]
    fn empty_period_key_is_a_missing_column_error() {
        let facts = vec![RawFact::new("us-gaap:Assets", 1.0, "")];
        assert!(matches!(
            FactTable::from_facts(facts),
            Err(ResolverError::MissingColumn { column: "period_key" })
        ));
    }
}
