//! Staged field resolution: strict primary, strict dimensional, relaxed
//! context, in that order, each stage returning the first candidate a
//! ranking pass prefers.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use xbrl_core::{Provenance, TraceableField};
use xbrl_mapping::FieldSpec;
use xbrl_search::{FactTable, SearchConfig, SearchEngine, SearchResult, SearchType};

fn numeric_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[-+]?((\d+(\.\d*)?)|(\.\d+))([eE][-+]?\d+)?$").expect("static pattern"))
}

/// Parse a search result's raw value into a number, honoring the XBRL
/// `scale` attribute, parenthesized negatives, thousands separators, and
/// non-breaking spaces. Any value containing `<` or `>` (an HTML fragment
/// leaking through a feed) is rejected outright.
#[must_use]
pub fn parse_numeric(raw_value: Option<&str>, scale: Option<&str>) -> Option<f64> {
    let raw = raw_value?;
    let mut cleaned = raw.trim().replace(',', "").replace('\u{00A0}', "");
    if cleaned.is_empty() {
        return None;
    }
    if cleaned.contains('<') || cleaned.contains('>') {
        return None;
    }
    if cleaned.starts_with('(') && cleaned.ends_with(')') && cleaned.len() >= 2 {
        cleaned = format!("-{}", &cleaned[1..cleaned.len() - 1]);
    }
    if !numeric_pattern().is_match(&cleaned) {
        return None;
    }
    let value: f64 = cleaned.parse().ok()?;
    let scale_exp: i32 = scale
        .and_then(|s| s.trim().parse::<i32>().ok())
        .unwrap_or(0);
    Some(value * 10f64.powi(scale_exp))
}

/// `period_key`'s trailing date, used only for ranking candidates within a
/// stage — distinct from the search engine's own latest-first row
/// ordering and from either dedup key.
fn period_rank(period_key: &str) -> &str {
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

struct Candidate<'a, T> {
    result: SearchResult,
    value: T,
    config_index: usize,
    result_index: usize,
    config: &'a SearchConfig,
}

impl<T> Candidate<'_, T> {
    /// Earliest-registered config dominates first, then statement-type
    /// match, then dimension preference (consolidated configs prefer no
    /// breakdown; dimensional configs prefer a richer one), then latest
    /// period, then earliest search-result position, then concept name as a
    /// final deterministic tie-break.
    fn rank_key(&self) -> (Reverse<usize>, bool, i32, &str, Reverse<usize>, &str) {
        (
            Reverse(self.config_index),
            self.config.statement_match(self.result.statement_type.as_deref()),
            self.dimension_preference(),
            period_rank(&self.result.period_key),
            Reverse(self.result_index),
            self.result.concept.as_str(),
        )
    }

    fn dimension_preference(&self) -> i32 {
        let dim_count = self.result.dimensions.len() as i32;
        match self.config.search_type() {
            SearchType::Consolidated => i32::from(dim_count == 0),
            SearchType::Dimensional => dim_count,
        }
    }
}

fn dedup_configs(configs: Vec<SearchConfig>) -> Vec<SearchConfig> {
    let mut seen = HashSet::new();
    configs
        .into_iter()
        .filter(|c| seen.insert(c.stage_key()))
        .collect()
}

/// The three resolution stages, built from one field's configs: strict
/// primary (every config exactly as registered), strict dimensional (every
/// config coerced into a dimensional variant, defaulting an unset dimension
/// regex to "match any dimension value"), and relaxed context (both of the
/// above, with statement-type filtering cleared). Empty stages are dropped.
fn build_stages(spec: &FieldSpec) -> Vec<(&'static str, Vec<SearchConfig>)> {
    let primary: Vec<SearchConfig> = spec.configs.clone();
    let dimensional: Vec<SearchConfig> = spec.configs.iter().map(SearchConfig::as_dimensional).collect();
    let relaxed: Vec<SearchConfig> = primary
        .iter()
        .chain(dimensional.iter())
        .map(SearchConfig::relaxed)
        .collect();

    [
        ("strict_primary", dedup_configs(primary)),
        ("strict_dimensional", dedup_configs(dimensional)),
        ("relaxed_context", dedup_configs(relaxed)),
    ]
    .into_iter()
    .filter(|(_, configs)| !configs.is_empty())
    .collect()
}

/// Resolve one field against `table`, trying each stage in order and
/// taking the first stage that yields any parsable candidate. Within a
/// stage, candidates are ranked by statement-filter specificity, fewest
/// active dimensions, latest period, earliest-registered config, then
/// concept name, and the top-ranked candidate is returned.
///
/// If every stage comes up empty, the returned field is missing, with an
/// [`Provenance::Assumed`] description naming every concept tag and stage
/// that was tried.
#[must_use]
pub fn extract_field(table: &FactTable, spec: &FieldSpec) -> TraceableField<f64> {
    let stages = build_stages(spec);
    let mut tags_searched = Vec::new();
    let mut stages_searched = Vec::new();

    for (stage_name, configs) in &stages {
        stages_searched.push(*stage_name);
        let mut candidates = Vec::new();
        for (config_index, config) in configs.iter().enumerate() {
            tags_searched.push(config.concept_tag().to_string());
            let results = SearchEngine::search(table, config);
            for (result_index, result) in results.into_iter().enumerate() {
                if let Some(value) = parse_numeric(result.raw_value.as_deref(), result.scale.as_deref()) {
                    candidates.push(Candidate {
                        result,
                        value,
                        config_index,
                        result_index,
                        config,
                    });
                }
            }
        }

        if let Some(best) = candidates.iter().max_by(|a, b| a.rank_key().cmp(&b.rank_key())) {
            debug!(
                field = %spec.name,
                stage = *stage_name,
                concept = %best.result.concept,
                period = %best.result.period_key,
                "fundamental_xbrl_field_hit"
            );
            return TraceableField::present(
                &spec.name,
                best.value,
                Provenance::Xbrl {
                    concept: best.result.concept.clone(),
                    period: best.result.period_key.clone(),
                },
            );
        }
    }

    tags_searched.dedup();
    TraceableField::missing(
        &spec.name,
        format!(
            "No candidate found. tags_searched={tags_searched:?} stages_searched={stages_searched:?}"
        ),
    )
}

/// Like [`extract_field`], but for a text-valued field (fiscal year,
/// fiscal period, registrant name, CIK) rather than a number — no numeric
/// parsing, just the raw value as filed.
#[must_use]
pub fn extract_text_field(table: &FactTable, spec: &FieldSpec) -> TraceableField<String> {
    let stages = build_stages(spec);
    let mut tags_searched = Vec::new();
    let mut stages_searched = Vec::new();

    for (stage_name, configs) in &stages {
        stages_searched.push(*stage_name);
        let mut candidates = Vec::new();
        for (config_index, config) in configs.iter().enumerate() {
            tags_searched.push(config.concept_tag().to_string());
            let results = SearchEngine::search(table, config);
            for (result_index, result) in results.into_iter().enumerate() {
                let present = result
                    .raw_value
                    .as_deref()
                    .is_some_and(|v| !v.trim().is_empty());
                if present {
                    candidates.push(Candidate {
                        result,
                        value: (),
                        config_index,
                        result_index,
                        config,
                    });
                }
            }
        }

        if let Some(best) = candidates.iter().max_by(|a, b| a.rank_key().cmp(&b.rank_key())) {
            let value = best.result.raw_value.clone().unwrap_or_default();
            debug!(
                field = %spec.name,
                stage = *stage_name,
                concept = %best.result.concept,
                period = %best.result.period_key,
                "fundamental_xbrl_field_hit"
            );
            return TraceableField::present(
                &spec.name,
                value,
                Provenance::Xbrl {
                    concept: best.result.concept.clone(),
                    period: best.result.period_key.clone(),
                },
            );
        }
    }

    tags_searched.dedup();
    TraceableField::missing(
        &spec.name,
        format!(
            "No candidate found. tags_searched={tags_searched:?} stages_searched={stages_searched:?}"
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use xbrl_mapping::FieldSpec;
    use xbrl_search::{RawFact, SearchType};

    fn spec(tags: &[&str]) -> FieldSpec {
        let configs = tags
            .iter()
            .map(|t| SearchConfig::new(*t, SearchType::consolidated()).unwrap())
            .collect();
        FieldSpec::new("Test Field", configs)
    }

    #[test]
    fn parses_parenthesized_negative_with_scale() {
        assert_eq!(parse_numeric(Some("(1,234.5)"), Some("3")), Some(-1_234_500.0));
    }

    #[test]
    fn rejects_html_fragment() {
        assert_eq!(parse_numeric(Some("<span>1</span>"), None), None);
    }

    #[test]
    fn rejects_empty_string() {
        assert_eq!(parse_numeric(Some(""), None), None);
    }

    #[test]
    fn plain_tag_consolidated_numeric_match() {
        let table = FactTable::from_facts(vec![RawFact::new(
            "us-gaap:Assets",
            "1000",
            "instant_2023-12-31",
        )])
        .unwrap();
        let field = extract_field(&table, &spec(&["Assets"]));
        assert_eq!(field.value, Some(1000.0));
        assert!(matches!(field.provenance, Provenance::Xbrl { .. }));
    }

    #[test]
    fn falls_back_through_stages_to_relaxed_context() {
        let table = FactTable::from_facts(vec![RawFact::new(
            "us-gaap:Assets",
            "500",
            "instant_2023-12-31",
        )
        .with_statement_type("BalanceSheet")])
        .unwrap();
        let mut configs = vec![SearchConfig::new("Assets", SearchType::consolidated())
            .unwrap()
            .with_statement_types(["IncomeStatement"])];
        configs.push(
            SearchConfig::new("NothingMatchesThis", SearchType::dimensional()).unwrap(),
        );
        let field_spec = FieldSpec::new("Test Field", configs);
        let field = extract_field(&table, &field_spec);
        assert_eq!(field.value, Some(500.0));
    }

    #[test]
    fn missing_after_all_stages_empty_carries_diagnostic_description() {
        let table = FactTable::from_facts(vec![]).unwrap();
        let field = extract_field(&table, &spec(&["NoSuchConcept"]));
        assert!(field.value.is_none());
        match field.provenance {
            Provenance::Assumed { description } => {
                assert!(description.contains("NoSuchConcept"));
            }
            other => panic!("expected Assumed provenance, got {other:?}"),
        }
    }
}
