//! The search engine: compiles a [`SearchConfig`] into a concept matcher and
//! filters/formats the fact table against it.

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use xbrl_core::ResolverError;

use crate::table::{FactTable, RawValue, StoredFact};

/// Whether a [`SearchConfig`] wants consolidated (no dimension breakdown)
/// or dimensional (broken out by axis/member) rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    /// Rows with no dimension breakdown — the "total" line.
    Consolidated,
    /// Rows broken out along at least one dimension.
    Dimensional,
}

impl SearchType {
    /// A consolidated search type.
    #[must_use]
    pub fn consolidated() -> Self {
        Self::Consolidated
    }

    /// A dimensional search type.
    #[must_use]
    pub fn dimensional() -> Self {
        Self::Dimensional
    }
}

fn is_plain_tag(tag: &str) -> bool {
    let mut colons = tag.split(':');
    match (colons.next(), colons.next(), colons.next()) {
        (Some(prefix), Some(local), None) => !prefix.is_empty() && !local.is_empty(),
        _ => false,
    }
}

fn concept_regex(tag: &str) -> Result<Regex, ResolverError> {
    let pattern = if is_plain_tag(tag) {
        format!("^{}$", regex::escape(tag))
    } else {
        format!(".*:{}$", regex::escape(tag))
    };
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ResolverError::InvalidConceptRegex { pattern, source })
}

/// Case-insensitive substring containment: a row's statement type matches a
/// config's requirement if any requested token appears anywhere in it (not
/// exact equality). Empty `want` always matches — "no filter configured".
fn statement_matches(want: &[String], statement_type: Option<&str>) -> bool {
    if want.is_empty() {
        return true;
    }
    match statement_type {
        Some(st) => {
            let st = st.to_lowercase();
            want.iter().any(|token| st.contains(&token.to_lowercase()))
        }
        None => false,
    }
}

fn normalize_unit(unit: &str) -> String {
    let trimmed = unit.trim();
    let after_colon = trimmed.rsplit(':').next().unwrap_or(trimmed);
    let stripped = after_colon.strip_prefix("u_").unwrap_or(after_colon);
    stripped.to_lowercase()
}

/// Parses a `period_key`'s sort date: the single date for `instant_*`, or
/// the end date for `duration_*_*`. Unparseable keys sort as the earliest
/// possible date, pushing them to the end of a latest-first ordering.
fn period_sort_key(period_key: &str) -> &str {
    if let Some(rest) = period_key.strip_prefix("instant_") {
        return rest;
    }
    if let Some(rest) = period_key.strip_prefix("duration_") {
        if let Some((_, end)) = rest.split_once('_') {
            return end;
        }
    }
    ""
}

/// One configuration for a single search pass over a [`FactTable`]. Built
/// once and reused across stages; the concept regex is compiled at
/// construction, not per row.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    concept_tag: String,
    regex: Regex,
    search_type: SearchType,
    dimension_regex: Option<Regex>,
    statement_types: Vec<String>,
    period_type: Option<String>,
    unit_whitelist: Vec<String>,
    unit_blacklist: Vec<String>,
    respect_anchor_date: bool,
}

impl SearchConfig {
    /// Build a config for `concept_tag` under `search_type`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::InvalidConceptRegex`] if `concept_tag`
    /// cannot be turned into a valid regex once escaped (this should only
    /// happen for a malformed registry entry).
    pub fn new(concept_tag: impl Into<String>, search_type: SearchType) -> Result<Self, ResolverError> {
        let concept_tag = concept_tag.into();
        let regex = concept_regex(&concept_tag)?;
        Ok(Self {
            concept_tag,
            regex,
            search_type,
            dimension_regex: None,
            statement_types: Vec::new(),
            period_type: None,
            unit_whitelist: Vec::new(),
            unit_blacklist: Vec::new(),
            respect_anchor_date: true,
        })
    }

    /// Restrict dimensional matches to dimension values matching this regex.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::InvalidConceptRegex`] if `pattern` is not a
    /// valid regex.
    pub fn with_dimension_regex(mut self, pattern: &str) -> Result<Self, ResolverError> {
        let compiled = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| ResolverError::InvalidConceptRegex {
                pattern: pattern.to_string(),
                source,
            })?;
        self.dimension_regex = Some(compiled);
        Ok(self)
    }

    /// Restrict matches to one of these statement types. Empty means any.
    #[must_use]
    pub fn with_statement_types(mut self, types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.statement_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict matches to `"instant"` or `"duration"` rows.
    #[must_use]
    pub fn with_period_type(mut self, period_type: impl Into<String>) -> Self {
        self.period_type = Some(period_type.into());
        self
    }

    /// Only accept these normalized units. Empty means any.
    #[must_use]
    pub fn with_unit_whitelist(mut self, units: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.unit_whitelist = units.into_iter().map(|u| normalize_unit(&u.into())).collect();
        self
    }

    /// Reject these normalized units even if otherwise matched.
    #[must_use]
    pub fn with_unit_blacklist(mut self, units: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.unit_blacklist = units.into_iter().map(|u| normalize_unit(&u.into())).collect();
        self
    }

    /// Only accept rows whose period ends on the table's anchor date
    /// (`dei:DocumentPeriodEndDate`). No-op if the table has no anchor.
    #[must_use]
    pub fn with_respect_anchor_date(mut self, respect: bool) -> Self {
        self.respect_anchor_date = respect;
        self
    }

    /// The raw concept tag this config searches for.
    #[must_use]
    pub fn concept_tag(&self) -> &str {
        &self.concept_tag
    }

    /// Whether this config looks for consolidated or dimensional rows.
    #[must_use]
    pub fn search_type(&self) -> SearchType {
        self.search_type
    }

    /// Whether this config restricts matches to specific statement types.
    #[must_use]
    pub fn has_statement_filter(&self) -> bool {
        !self.statement_types.is_empty()
    }

    /// Whether `statement_type` satisfies this config's statement-type
    /// requirement (case-insensitive substring containment; always true if
    /// no requirement is configured). Exposed for the field resolver's
    /// candidate ranking, which re-checks the same condition the search
    /// already filtered on.
    #[must_use]
    pub fn statement_match(&self, statement_type: Option<&str>) -> bool {
        statement_matches(&self.statement_types, statement_type)
    }

    /// A copy of this config with statement-type filtering cleared, used to
    /// build the relaxed-context resolution stage. Anchor-date respect is
    /// preserved — relaxing statement filters is not the same as relaxing
    /// which period counts as current.
    #[must_use]
    pub fn relaxed(&self) -> Self {
        Self {
            statement_types: Vec::new(),
            ..self.clone()
        }
    }

    /// A copy of this config coerced to [`SearchType::Dimensional`], used to
    /// build the strict-dimensional resolution stage from every primary
    /// config — not just the ones already registered as dimensional. If no
    /// `dimension_regex` was set, defaults to `.*` (any dimension value),
    /// matching how the original factory widens a plain concept search into
    /// a dimensional one.
    #[must_use]
    pub fn as_dimensional(&self) -> Self {
        if self.search_type == SearchType::Dimensional {
            return self.clone();
        }
        let dimension_regex = self.dimension_regex.clone().or_else(|| {
            Some(
                RegexBuilder::new(".*")
                    .case_insensitive(true)
                    .build()
                    .expect("static pattern"),
            )
        });
        Self {
            search_type: SearchType::Dimensional,
            dimension_regex,
            ..self.clone()
        }
    }

    /// The dedup/tie-break key used by the field resolver to collapse
    /// configs that are identical in every respect that matters to a
    /// search, distinct from the per-row search-dedup key in
    /// [`SearchResult::dedup_key`] and the real-estate debt component key
    /// in `xbrl-resolver`.
    #[must_use]
    pub fn stage_key(&self) -> String {
        format!(
            "{}|{:?}|{:?}|{}|{:?}|{}|{}|{}",
            self.concept_tag,
            self.search_type,
            self.dimension_regex.as_ref().map(Regex::as_str),
            self.statement_types.join(","),
            self.period_type,
            self.unit_whitelist.join(","),
            self.unit_blacklist.join(","),
            self.respect_anchor_date,
        )
    }
}

/// Why a row was rejected by a [`SearchConfig`], kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// The row's statement type wasn't in the config's whitelist.
    StatementType,
    /// The row's period type didn't match the config's requirement.
    PeriodType,
    /// The row's unit failed the whitelist or blacklist.
    Unit,
    /// `respect_anchor_date` was set and the row's period doesn't end on it.
    AnchorDate,
    /// The row didn't satisfy the dimension regex (dimensional searches only).
    DimensionRegex,
}

/// A single formatted, filtered match from [`SearchEngine::search`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Matched concept tag, as stored (not the search pattern).
    pub concept: String,
    /// Raw value, rendered for display and later numeric parsing.
    pub raw_value: Option<String>,
    /// Period key of the matched row.
    pub period_key: String,
    /// Normalized unit of the matched row.
    pub unit: Option<String>,
    /// Scale attribute, carried through for numeric parsing.
    pub scale: Option<String>,
    /// Dimension values of the matched row (empty for consolidated matches).
    pub dimensions: BTreeMap<String, String>,
    /// The config's statement types, for ranking by statement match.
    pub statement_type: Option<String>,
}

impl SearchResult {
    /// The search-level dedup key: concept, period, normalized unit, sorted
    /// dimension detail, and raw value. Distinct from [`SearchConfig::stage_key`].
    #[must_use]
    pub fn dedup_key(&self) -> String {
        let dims: Vec<String> = self
            .dimensions
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        format!(
            "{}|{}|{}|{}|{:?}",
            self.concept,
            self.period_key,
            self.unit.as_deref().unwrap_or(""),
            dims.join(","),
            self.raw_value,
        )
    }
}

/// Stateless filter/format pass over a [`FactTable`].
#[derive(Debug, Default)]
pub struct SearchEngine;

impl SearchEngine {
    /// Run `config` against `table`, returning matches sorted latest-period-first.
    #[must_use]
    pub fn search(table: &FactTable, config: &SearchConfig) -> Vec<SearchResult> {
        let (results, _rejections) = Self::search_with_rejections(table, config);
        results
    }

    /// Like [`Self::search`], but also returns the rows rejected and why —
    /// useful for the field resolver's "all stages empty" diagnostic.
    #[must_use]
    pub fn search_with_rejections(
        table: &FactTable,
        config: &SearchConfig,
    ) -> (Vec<SearchResult>, Vec<(StoredFact, Rejection)>) {
        let mut seen = std::collections::HashSet::new();
        let mut results = Vec::new();
        let mut rejections = Vec::new();

        for row in table.rows() {
            if !config.regex.is_match(&row.concept) {
                continue;
            }

            let consolidated = table.is_consolidated(row);
            match config.search_type {
                SearchType::Consolidated if !consolidated => continue,
                SearchType::Dimensional if consolidated => continue,
                _ => {}
            }

            if config.search_type == SearchType::Dimensional {
                if let Some(dim_regex) = &config.dimension_regex {
                    let any_match = row.dimensions.values().any(|v| dim_regex.is_match(v));
                    if !any_match {
                        rejections.push((row.clone(), Rejection::DimensionRegex));
                        continue;
                    }
                }
            }

            if !statement_matches(&config.statement_types, row.statement_type.as_deref()) {
                rejections.push((row.clone(), Rejection::StatementType));
                continue;
            }

            if let Some(period_type) = &config.period_type {
                let matches = row
                    .period_type
                    .as_deref()
                    .map(|pt| pt == period_type)
                    .unwrap_or_else(|| row.period_key.starts_with(period_type.as_str()));
                if !matches {
                    rejections.push((row.clone(), Rejection::PeriodType));
                    continue;
                }
            }

            let normalized_unit = row.unit.as_deref().map(normalize_unit);
            if !config.unit_whitelist.is_empty() {
                let ok = normalized_unit
                    .as_deref()
                    .is_some_and(|u| config.unit_whitelist.iter().any(|w| w == u));
                if !ok {
                    rejections.push((row.clone(), Rejection::Unit));
                    continue;
                }
            }
            if !config.unit_blacklist.is_empty() {
                let blocked = normalized_unit
                    .as_deref()
                    .is_some_and(|u| config.unit_blacklist.iter().any(|b| b == u));
                if blocked {
                    rejections.push((row.clone(), Rejection::Unit));
                    continue;
                }
            }

            if config.respect_anchor_date {
                if let Some(anchor) = table.anchor_date() {
                    let row_end = row.period_end.as_deref().unwrap_or_else(|| period_sort_key(&row.period_key));
                    if row_end != anchor {
                        rejections.push((row.clone(), Rejection::AnchorDate));
                        continue;
                    }
                }
            }

            let result = SearchResult {
                concept: row.concept.clone(),
                raw_value: row.value.as_ref().map(RawValue::display),
                period_key: row.period_key.clone(),
                unit: normalized_unit,
                scale: row.scale.clone(),
                dimensions: row.dimensions.clone(),
                statement_type: row.statement_type.clone(),
            };

            if seen.insert(result.dedup_key()) {
                results.push(result);
            }
        }

        results.sort_by(|a, b| period_sort_key(&b.period_key).cmp(period_sort_key(&a.period_key)));
        (results, rejections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::RawFact;

    #[test]
    fn plain_tag_matches_any_namespace_prefix() {
        let table = FactTable::from_facts(vec![RawFact::new(
            "us-gaap:Assets",
            100.0,
            "instant_2023-12-31",
        )])
        .unwrap();
        let config = SearchConfig::new("Assets", SearchType::consolidated()).unwrap();
        let results = SearchEngine::search(&table, &config);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].concept, "us-gaap:Assets");
    }

    #[test]
    fn namespaced_tag_matches_exactly() {
        let table = FactTable::from_facts(vec![
            RawFact::new("us-gaap:Assets", 1.0, "instant_2023-12-31"),
            RawFact::new("ifrs-full:Assets", 2.0, "instant_2023-12-31"),
        ])
        .unwrap();
        let config = SearchConfig::new("us-gaap:Assets", SearchType::consolidated()).unwrap();
        let results = SearchEngine::search(&table, &config);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].concept, "us-gaap:Assets");
    }

    #[test]
    fn dimensional_vs_consolidated_split() {
        let table = FactTable::from_facts(vec![
            RawFact::new("us-gaap:Revenues", 100.0, "duration_2023-01-01_2023-12-31"),
            RawFact::new("us-gaap:Revenues", 40.0, "duration_2023-01-01_2023-12-31")
                .with_column("SegmentAxis", "Retail"),
        ])
        .unwrap();

        let consolidated = SearchConfig::new("Revenues", SearchType::consolidated()).unwrap();
        let dimensional = SearchConfig::new("Revenues", SearchType::dimensional()).unwrap();
        assert_eq!(SearchEngine::search(&table, &consolidated).len(), 1);
        assert_eq!(SearchEngine::search(&table, &dimensional).len(), 1);
    }

    #[test]
    fn results_sort_latest_period_first() {
        let table = FactTable::from_facts(vec![
            RawFact::new("us-gaap:Assets", 1.0, "instant_2021-12-31"),
            RawFact::new("us-gaap:Assets", 2.0, "instant_2023-12-31"),
            RawFact::new("us-gaap:Assets", 3.0, "instant_2022-12-31"),
        ])
        .unwrap();
        let config = SearchConfig::new("Assets", SearchType::consolidated()).unwrap();
        let results = SearchEngine::search(&table, &config);
        let periods: Vec<_> = results.iter().map(|r| r.period_key.as_str()).collect();
        assert_eq!(
            periods,
            vec!["instant_2023-12-31", "instant_2022-12-31", "instant_2021-12-31"]
        );
    }

    #[test]
    fn anchor_date_filter_excludes_non_matching_periods() {
        let table = FactTable::from_facts(vec![
            RawFact::new("dei:DocumentPeriodEndDate", "2023-12-31", "instant_2023-12-31")
                .with_period_end("2023-12-31"),
            RawFact::new("us-gaap:Assets", 1.0, "instant_2023-12-31").with_period_end("2023-12-31"),
            RawFact::new("us-gaap:Assets", 2.0, "instant_2022-12-31").with_period_end("2022-12-31"),
        ])
        .unwrap();
        let config = SearchConfig::new("Assets", SearchType::consolidated())
            .unwrap()
            .with_respect_anchor_date(true);
        let results = SearchEngine::search(&table, &config);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].period_key, "instant_2023-12-31");
    }

    #[test]
    fn unit_blacklist_rejects_matching_unit() {
        let table = FactTable::from_facts(vec![RawFact::new(
            "us-gaap:SharesOutstanding",
            100.0,
            "instant_2023-12-31",
        )
        .with_unit("shares")])
        .unwrap();
        let config = SearchConfig::new("SharesOutstanding", SearchType::consolidated())
            .unwrap()
            .with_unit_blacklist(["shares"]);
        assert!(SearchEngine::search(&table, &config).is_empty());
    }

    #[test]
    fn empty_table_yields_no_results() {
        let table = FactTable::empty();
        let config = SearchConfig::new("Assets", SearchType::consolidated()).unwrap();
        assert!(SearchEngine::search(&table, &config).is_empty());
    }
}
