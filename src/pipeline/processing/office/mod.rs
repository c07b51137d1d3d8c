//! Office title standardization.
//!
//! Maps free-text office titles onto the fixed [`OfficeCategory`] taxonomy and
//! reports a confidence for each mapping. Matching runs in stages, stopping at
//! the first that succeeds: exact alias, exact alias after qualifier removal,
//! token-set containment, and finally an Unknown fallback scored by character
//! bigram similarity.

mod aliases;
pub mod district;

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::domain::{OfficeCategory, OfficeTier, StandardizedOffice};

use aliases::{ALIASES, JUDICIAL_KEYWORDS, LOCAL_KEYWORDS, QUALIFIERS, STOPWORDS};
pub use district::{clean_district_value, extract_district, strip_qualifiers};

/// Confidence of an exact alias match after qualifier removal.
pub const STRIPPED_EXACT_CONFIDENCE: f64 = 0.95;
/// Floor of the partial-match band.
pub const PARTIAL_BASE_CONFIDENCE: f64 = 0.8;
const PARTIAL_SPAN: f64 = 0.19;
/// Ceiling for Unknown results.
pub const UNKNOWN_MAX_CONFIDENCE: f64 = 0.5;

const SCORE_EPSILON: f64 = 1e-9;

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("non-alnum pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

static SHARED: Lazy<Arc<OfficeStandardizer>> = Lazy::new(|| Arc::new(OfficeStandardizer::new()));

/// Lowercase, drop periods and apostrophes ("U.S." → "us"), turn any other
/// punctuation into spaces and collapse runs of whitespace.
pub fn normalize_office(raw: &str) -> String {
    let lowered: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| *c != '.' && *c != '\'' && *c != '\u{2019}')
        .collect();
    NON_ALNUM.replace_all(&lowered, " ").trim().to_string()
}

/// Meaningful tokens of a normalized title.
fn content_tokens(normalized: &str) -> HashSet<String> {
    normalized
        .split_whitespace()
        .filter(|t| !STOPWORDS.contains(t))
        .map(str::to_string)
        .collect()
}

struct AliasEntry {
    category: OfficeCategory,
    normalized: String,
    tokens: HashSet<String>,
}

/// Immutable alias vocabulary, built once and shared.
pub struct OfficeStandardizer {
    exact: HashMap<String, OfficeCategory>,
    entries: Vec<AliasEntry>,
}

impl Default for OfficeStandardizer {
    fn default() -> Self {
        Self::new()
    }
}

impl OfficeStandardizer {
    pub fn new() -> Self {
        let mut exact = HashMap::new();
        let mut entries = Vec::new();

        for (category, aliases) in ALIASES {
            for alias in aliases.iter() {
                let normalized = normalize_office(alias);
                // First category listed wins a shared alias
                exact.entry(normalized.clone()).or_insert(*category);
                entries.push(AliasEntry {
                    category: *category,
                    tokens: content_tokens(&normalized),
                    normalized,
                });
            }
        }

        Self { exact, entries }
    }

    /// Process-wide instance.
    pub fn shared() -> Arc<OfficeStandardizer> {
        Arc::clone(&*SHARED)
    }

    /// Categorize one raw office title.
    pub fn standardize(&self, raw: &str) -> StandardizedOffice {
        let label = WHITESPACE.replace_all(raw.trim(), " ").to_string();
        let normalized = normalize_office(raw);
        if normalized.is_empty() {
            return StandardizedOffice::unknown(OfficeCategory::Unknown.label(), 0.0);
        }

        if let Some(category) = self.exact.get(&normalized) {
            return matched(*category, 1.0);
        }

        let stripped = normalize_office(&strip_qualifiers(raw));
        if !stripped.is_empty() && stripped != normalized {
            if let Some(category) = self.exact.get(&stripped) {
                return matched(*category, STRIPPED_EXACT_CONFIDENCE);
            }
        }

        let basis = if stripped.is_empty() { &normalized } else { &stripped };
        if let Some((category, confidence)) = self.partial_match(basis) {
            return matched(category, confidence);
        }

        let similarity = self
            .entries
            .iter()
            .map(|e| bigram_similarity(&normalized, &e.normalized))
            .fold(0.0_f64, f64::max);
        StandardizedOffice::unknown(label, UNKNOWN_MAX_CONFIDENCE * similarity)
    }

    /// Categorize a batch of titles, preserving order.
    pub fn standardize_all<I, S>(&self, raws: I) -> Vec<StandardizedOffice>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        raws.into_iter().map(|r| self.standardize(r.as_ref())).collect()
    }

    /// Best token-containment match, if any alias overlaps the input.
    fn partial_match(&self, normalized: &str) -> Option<(OfficeCategory, f64)> {
        let input = content_tokens(normalized);
        if input.is_empty() || input.iter().all(|t| QUALIFIERS.contains(&t.as_str())) {
            return None;
        }

        let has_local = input.iter().any(|t| LOCAL_KEYWORDS.contains(&t.as_str()));
        let has_judicial = input.iter().any(|t| JUDICIAL_KEYWORDS.contains(&t.as_str()));

        let mut best: Option<(OfficeCategory, f64)> = None;
        for entry in &self.entries {
            if entry.tokens.is_empty() {
                continue;
            }
            if has_local && entry.category.tier() == Some(OfficeTier::Federal) {
                continue;
            }
            if has_judicial && entry.category.is_executive() {
                continue;
            }
            let contained = input.is_subset(&entry.tokens) || entry.tokens.is_subset(&input);
            if !contained {
                continue;
            }

            let overlap = input.intersection(&entry.tokens).count() as f64;
            let ratio = overlap / input.len().max(entry.tokens.len()) as f64;
            let score = PARTIAL_BASE_CONFIDENCE + PARTIAL_SPAN * ratio;

            best = match best {
                None => Some((entry.category, score)),
                Some((_, s)) if score > s + SCORE_EPSILON => Some((entry.category, score)),
                Some((cat, s)) if (score - s).abs() <= SCORE_EPSILON && entry.category < cat => {
                    Some((entry.category, s))
                }
                keep => keep,
            };
        }
        best
    }
}

fn matched(category: OfficeCategory, confidence: f64) -> StandardizedOffice {
    StandardizedOffice {
        category,
        confidence,
        label: category.label().to_string(),
    }
}

/// Standardize with the shared instance.
pub fn standardize(raw: &str) -> StandardizedOffice {
    SHARED.standardize(raw)
}

/// Sørensen–Dice coefficient over character bigrams (0.0 to 1.0).
pub fn bigram_similarity(a: &str, b: &str) -> f64 {
    fn bigrams(s: &str) -> HashMap<(char, char), usize> {
        let chars: Vec<char> = s.chars().collect();
        let mut counts = HashMap::new();
        for pair in chars.windows(2) {
            *counts.entry((pair[0], pair[1])).or_insert(0) += 1;
        }
        counts
    }

    let left = bigrams(a);
    let right = bigrams(b);
    let total: usize = left.values().sum::<usize>() + right.values().sum::<usize>();
    if total == 0 {
        return if a == b && !a.is_empty() { 1.0 } else { 0.0 };
    }
    let shared: usize = left
        .iter()
        .map(|(k, n)| (*n).min(*right.get(k).unwrap_or(&0)))
        .sum();
    2.0 * shared as f64 / total as f64
}

/// Count of Unknown labels, for the run report.
pub fn unmatched_offices<'a, I>(offices: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a StandardizedOffice>,
{
    let mut counts = BTreeMap::new();
    for office in offices {
        let blank = office.label.is_empty() || office.label == OfficeCategory::Unknown.label();
        if office.category == OfficeCategory::Unknown && !blank {
            *counts.entry(office.label.clone()).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standardizer() -> OfficeStandardizer {
        OfficeStandardizer::new()
    }

    #[test]
    fn test_exact_alias_scores_one() {
        let office = standardizer().standardize("US Senator");
        assert_eq!(office.category, OfficeCategory::UsSenate);
        assert_eq!(office.confidence, 1.0);
        assert_eq!(office.label, "US Senate");

        let dotted = standardizer().standardize("  U.S.  SENATOR ");
        assert_eq!(dotted.category, OfficeCategory::UsSenate);
        assert_eq!(dotted.confidence, 1.0);
    }

    #[test]
    fn test_bare_senator_is_partial_and_prefers_federal() {
        let office = standardizer().standardize("Senator");
        assert!(office.confidence >= 0.8 && office.confidence < 1.0);
        assert!(matches!(
            office.category,
            OfficeCategory::UsSenate | OfficeCategory::StateSenate
        ));
        assert_eq!(office.category, OfficeCategory::UsSenate);
    }

    #[test]
    fn test_blank_is_unknown_with_zero_confidence() {
        let office = standardizer().standardize("   ");
        assert_eq!(office.category, OfficeCategory::Unknown);
        assert_eq!(office.confidence, 0.0);
        assert_eq!(office.label, "Unknown");
    }

    #[test]
    fn test_unrecognised_title_keeps_label() {
        let office = standardizer().standardize("Space  Captain");
        assert_eq!(office.category, OfficeCategory::Unknown);
        assert!(office.confidence <= 0.5);
        assert_eq!(office.label, "Space Captain");
    }

    #[test]
    fn test_qualifiers_are_stripped_before_exact_match() {
        let office = standardizer().standardize("US Representative, 1st District");
        assert_eq!(office.category, OfficeCategory::UsHouse);
        assert_eq!(office.confidence, STRIPPED_EXACT_CONFIDENCE);

        let office = standardizer().standardize("State Senator District 5");
        assert_eq!(office.category, OfficeCategory::StateSenate);
        assert_eq!(office.confidence, STRIPPED_EXACT_CONFIDENCE);

        let office = standardizer().standardize("Harney County Sheriff");
        assert_eq!(office.category, OfficeCategory::Sheriff);
        assert_eq!(office.confidence, STRIPPED_EXACT_CONFIDENCE);
    }

    #[test]
    fn test_joint_governor_ticket_is_governor() {
        for raw in ["Governor and Lt. Governor", "GOVERNOR AND LT GOVERNOR", "Governor and Lieutenant Governor"] {
            let office = standardizer().standardize(raw);
            assert_eq!(office.category, OfficeCategory::Governor, "{}", raw);
            assert_eq!(office.confidence, 1.0, "{}", raw);
        }
    }

    #[test]
    fn test_partial_match_respects_local_keyword_filter() {
        // "county" must not pull a federal category in
        let office = standardizer().standardize("County Representative");
        assert_ne!(office.category, OfficeCategory::UsHouse);
    }

    #[test]
    fn test_judicial_keyword_blocks_executive() {
        let office = standardizer().standardize("Court of Governor Appeals");
        assert_ne!(office.category, OfficeCategory::Governor);
    }

    #[test]
    fn test_qualifier_only_input_is_unknown() {
        let office = standardizer().standardize("County");
        assert_eq!(office.category, OfficeCategory::Unknown);
    }

    #[test]
    fn test_mayor_with_city_name() {
        let office = standardizer().standardize("City of Boise Mayor");
        assert_eq!(office.category, OfficeCategory::Mayor);
        assert!(office.confidence >= PARTIAL_BASE_CONFIDENCE && office.confidence < 1.0);
    }

    #[test]
    fn test_standardize_all_and_unmatched_summary() {
        let results = standardizer().standardize_all(["Governor", "Dog Catcher", "dog  catcher", ""]);
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].category, OfficeCategory::Governor);
        let unmatched = unmatched_offices(&results);
        assert_eq!(unmatched.get("Dog Catcher"), Some(&1));
        assert_eq!(unmatched.get("dog catcher"), Some(&1));
        assert_eq!(unmatched.len(), 2);
    }

    #[test]
    fn test_bigram_similarity_bounds() {
        assert_eq!(bigram_similarity("mayor", "mayor"), 1.0);
        assert_eq!(bigram_similarity("", "mayor"), 0.0);
        let s = bigram_similarity("sherif", "sheriff");
        assert!(s > 0.5 && s < 1.0);
    }
}
