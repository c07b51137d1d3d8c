//! Party name canonicalization.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Lowercase variant → canonical party name.
const PARTY_VARIANTS: &[(&str, &str)] = &[
    ("democrat", "Democratic"),
    ("democratic", "Democratic"),
    ("democrats", "Democratic"),
    ("dem", "Democratic"),
    ("d", "Democratic"),
    ("democratic party", "Democratic"),
    ("democractic", "Democratic"),
    ("democratic farmer labor", "Democratic"),
    ("democratic farmer labor party", "Democratic"),
    ("dfl", "Democratic"),
    ("republican", "Republican"),
    ("republicans", "Republican"),
    ("rep", "Republican"),
    ("r", "Republican"),
    ("gop", "Republican"),
    ("grand old party", "Republican"),
    ("republican party", "Republican"),
    ("independent", "Independent"),
    ("independents", "Independent"),
    ("ind", "Independent"),
    ("i", "Independent"),
    ("no party", "Independent"),
    ("no party preference", "Independent"),
    ("no party affiliation", "Independent"),
    ("unaffiliated", "Independent"),
    ("una", "Independent"),
    ("none", "Independent"),
    ("nonpartisan", "Independent"),
    ("non partisan", "Independent"),
    ("nonpartisan judicial", "Independent"),
    ("npa", "Unaffiliated"),
    ("-", "Unaffiliated"),
    ("non", "Nonpartisan"),
    ("libertarian", "Libertarian"),
    ("libertarians", "Libertarian"),
    ("lib", "Libertarian"),
    ("lbt", "Libertarian"),
    ("l", "Libertarian"),
    ("libertarian party", "Libertarian"),
    ("green", "Green Party"),
    ("greens", "Green Party"),
    ("green party", "Green Party"),
    ("gre", "Green Party"),
    ("grn", "Green Party"),
    ("green party of the united states", "Green Party"),
    ("constitution", "Constitution Party"),
    ("constitution party", "Constitution Party"),
    ("constitutional", "Constitution Party"),
    ("cst", "Constitution Party"),
    ("progressive", "Progressive"),
    ("progressive party", "Progressive"),
    ("working families", "Working Families"),
    ("working families party", "Working Families"),
    ("wfp", "Working Families"),
    ("natural law", "Natural Law Party"),
    ("natural law party", "Natural Law Party"),
    ("socialist", "Socialist Party"),
    ("socialist party", "Socialist Party"),
    ("american independent", "American Independent Party"),
    ("american independent party", "American Independent Party"),
    ("aip", "American Independent Party"),
    ("peace and freedom", "Peace and Freedom Party"),
    ("peace and freedom party", "Peace and Freedom Party"),
    ("independence", "Independence Party"),
    ("independence party", "Independence Party"),
    ("conservative", "Conservative Party"),
    ("conservative party", "Conservative Party"),
];

/// Values that mean "no party recorded".
const EMPTY_MARKERS: &[&str] = &["n a", "na", "null", "unknown", "write in"];

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\-_/]+").expect("separator pattern"));

// Spreadsheet exports occasionally leave a date in the party column.
static DATE_LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d{1,4}[/\-.]\d{1,2}(?:[/\-.]\d{2,4})?)$").expect("date pattern")
});

/// Maps free-text party labels onto a small canonical vocabulary. Labels it
/// does not know are title-cased and kept.
pub struct PartyStandardizer {
    variants: HashMap<&'static str, &'static str>,
}

impl Default for PartyStandardizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PartyStandardizer {
    pub fn new() -> Self {
        Self {
            variants: PARTY_VARIANTS.iter().copied().collect(),
        }
    }

    pub fn standardize(&self, raw: Option<&str>) -> Option<String> {
        let trimmed = raw?.trim();
        if trimmed.is_empty() || DATE_LIKE.is_match(trimmed) {
            return None;
        }
        if trimmed == "-" {
            return self.variants.get("-").map(|p| p.to_string());
        }

        let key = SEPARATORS
            .replace_all(&trimmed.to_lowercase().replace('.', ""), " ")
            .trim()
            .trim_end_matches(" party")
            .to_string();
        if EMPTY_MARKERS.contains(&key.as_str()) {
            return None;
        }

        let with_party = format!("{} party", key);
        self.variants
            .get(key.as_str())
            .or_else(|| self.variants.get(with_party.as_str()))
            .map(|p| p.to_string())
            .or_else(|| Some(title_case(trimmed)))
    }
}

fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn party(raw: &str) -> Option<String> {
        PartyStandardizer::new().standardize(Some(raw))
    }

    #[test]
    fn test_major_party_variants() {
        assert_eq!(party("DEM").as_deref(), Some("Democratic"));
        assert_eq!(party("Democratic-Farmer-Labor").as_deref(), Some("Democratic"));
        assert_eq!(party("D").as_deref(), Some("Democratic"));
        assert_eq!(party("G.O.P.").as_deref(), Some("Republican"));
        assert_eq!(party("Republican Party").as_deref(), Some("Republican"));
        assert_eq!(party("NPA").as_deref(), Some("Unaffiliated"));
        assert_eq!(party("Non-Partisan").as_deref(), Some("Independent"));
        assert_eq!(party("LBT").as_deref(), Some("Libertarian"));
    }

    #[test]
    fn test_blank_and_junk_values_are_dropped() {
        assert_eq!(PartyStandardizer::new().standardize(None), None);
        assert_eq!(party("   "), None);
        assert_eq!(party("N/A"), None);
        assert_eq!(party("11/05/2024"), None);
        assert_eq!(party("Write-In"), None);
    }

    #[test]
    fn test_dash_means_unaffiliated() {
        assert_eq!(party("-").as_deref(), Some("Unaffiliated"));
    }

    #[test]
    fn test_unknown_party_is_title_cased() {
        assert_eq!(party("ALASKAN INDEPENDENCE").as_deref(), Some("Alaskan Independence"));
        assert_eq!(party("forward").as_deref(), Some("Forward"));
    }
}
