//! Election-type flags from free-text contest labels.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::ElectionTypes;

static PRIMARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:primary|pri|prim)\b").expect("primary pattern"));

static GENERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:general|gen|november)\b").expect("general pattern")
});

static SPECIAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:special|spec|by.?election|fill\s+vacancy)\b").expect("special pattern")
});

/// Flags for a label such as "Primary, General" or "Special Election".
///
/// The label is split on commas and semicolons and each part sets the first
/// flag it matches, checked primary, general, special. Blank or unrecognised
/// parts set nothing.
pub fn classify(raw: Option<&str>) -> ElectionTypes {
    let mut types = ElectionTypes::default();
    let Some(raw) = raw else {
        return types;
    };
    for part in raw.split([',', ';']).map(str::trim).filter(|p| !p.is_empty()) {
        if PRIMARY.is_match(part) {
            types.ran_in_primary = true;
        } else if GENERAL.is_match(part) {
            types.ran_in_general = true;
        } else if SPECIAL.is_match(part) {
            types.ran_in_special = true;
        }
    }
    types
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_label_sets_both_flags() {
        let types = classify(Some("Primary, General"));
        assert!(types.ran_in_primary);
        assert!(types.ran_in_general);
        assert!(!types.ran_in_special);
    }

    #[test]
    fn test_abbreviations_and_synonyms() {
        assert!(classify(Some("PRI")).ran_in_primary);
        assert!(classify(Some("State Primary Election")).ran_in_primary);
        assert!(classify(Some("gen")).ran_in_general);
        assert!(classify(Some("November Ballot")).ran_in_general);
        assert!(classify(Some("By-Election")).ran_in_special);
        assert!(classify(Some("to fill vacancy")).ran_in_special);
        assert!(classify(Some("special; general")).ran_in_general);
    }

    #[test]
    fn test_first_matching_type_wins_within_a_part() {
        let types = classify(Some("Special Primary"));
        assert!(types.ran_in_primary);
        assert!(!types.ran_in_special);
    }

    #[test]
    fn test_blank_and_unknown_labels_set_nothing() {
        assert!(classify(None).is_empty());
        assert!(classify(Some("  ")).is_empty());
        assert!(classify(Some("Runoff")).is_empty());
        // "general" must be a whole word
        assert!(classify(Some("Generalist")).is_empty());
    }
}
