//! District extraction and removal of seat/district qualifiers from office titles.

use once_cell::sync::Lazy;
use regex::Regex;

static DISTRICT_EXTRACTORS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\((?:district|dist):\s*(\d+)\)",
        r"(?i)(?:district|dist\.?)\s+no\.?\s*(\d+)",
        r"(?i)(\d+)(?:st|nd|rd|th)?\s+(?:congressional\s+)?(?:district|dist\b\.?)",
        r"(?i)(?:congressional\s+)?(?:district|dist\b\.?)\s*(\d+)",
        r"(?i)(\d+)(?:st|nd|rd|th)?\s+(?:lc|cncl|sen|rep)\s+dis",
        r"(?i)(?:cncl|sen|rep)\s+dis\s*(\d+)",
        r"(?i)\bdist\s+([ivxlcdm]+)\b",
        r"(?i)senate\s+district\s+([a-z])\b",
        r"(?i)(\d+)(?:st|nd|rd|th)?\s+(?:congress|senate)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("district pattern"))
    .collect()
});

static QUALIFIER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\s*-\s*\d+[a-z]*\s*district\s*$",
        r"(?i)\s*,?\s*district\s*(?:no\.?\s*)?\d+[a-z]*\s*$",
        r"(?i)\s*,?\s*\d+[a-z]*\s+district\s*$",
        r"(?i),?\s*dist\s+(?:\d+|[ivxlcdm]+)\s*$",
        r"(?i)\s*\(\d+[a-z]*(?:\s*district)?\)\s*$",
        r"(?i)\s*\((?:district|dist):\s*\d+\)\s*$",
        r"(?i)\s*\([a-z]\d+\)\s*$",
        r"(?i)\s*,?\s*(?:position|seat|place|ward)\s*\d+\s*$",
        r"(?i)\s*,?\s*division\s*(?:[a-z]-)?\d+\s*$",
        r"(?i)\s*,\s*[a-z\s]+county\s*$",
        r"(?i)\s*\([a-z\s]+county\)\s*$",
        r"(?i)\s*\([rd]\)\s*$",
        r"(?i)^(?:city|town)\s+of\s+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("qualifier pattern"))
    .collect()
});

static LEADING_COUNTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:[a-z.']+\s+)+county\s+").expect("county pattern"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// District identifier embedded in an office title, e.g. "US Representative, 3rd District" → "3".
pub fn extract_district(office: &str) -> Option<String> {
    DISTRICT_EXTRACTORS
        .iter()
        .find_map(|re| re.captures(office).map(|c| c[1].to_string()))
        .and_then(|d| clean_district_value(&d))
}

/// Normalize a district value: "12.0" → "12", "007" → "7"; text such as
/// "At-Large" is kept as-is.
pub fn clean_district_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(int_part) = trimmed.strip_suffix(".0") {
        if let Ok(n) = int_part.parse::<u64>() {
            return Some(n.to_string());
        }
    }
    if let Ok(n) = trimmed.parse::<u64>() {
        return Some(n.to_string());
    }
    Some(trimmed.to_string())
}

/// Remove district, seat and locality qualifiers so the remaining title can be
/// matched against the alias vocabulary.
pub fn strip_qualifiers(office: &str) -> String {
    let mut cleaned = office.trim().to_string();
    // Trailing qualifiers can be stacked ("..., Harney County, Position 2").
    loop {
        let before = cleaned.clone();
        for re in QUALIFIER_PATTERNS.iter() {
            cleaned = re.replace(&cleaned, "").to_string();
        }
        // "Harney County Sheriff" keeps the level but drops the place name.
        cleaned = LEADING_COUNTY.replace(&cleaned, "County ").to_string();
        cleaned = cleaned.trim().trim_end_matches(',').trim().to_string();
        if cleaned == before || cleaned.is_empty() {
            break;
        }
    }
    WHITESPACE.replace_all(&cleaned, " ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_district_variants() {
        assert_eq!(extract_district("US Representative, 3rd District").as_deref(), Some("3"));
        assert_eq!(extract_district("State Senate District 12").as_deref(), Some("12"));
        assert_eq!(extract_district("County Commissioner (District: 4)").as_deref(), Some("4"));
        assert_eq!(extract_district("2ND REP DIS").as_deref(), Some("2"));
        assert_eq!(extract_district("State House, DIST VII").as_deref(), Some("VII"));
        assert_eq!(extract_district("Governor"), None);
    }

    #[test]
    fn test_clean_district_value() {
        assert_eq!(clean_district_value("12.0").as_deref(), Some("12"));
        assert_eq!(clean_district_value(" 007 ").as_deref(), Some("7"));
        assert_eq!(clean_district_value("At-Large").as_deref(), Some("At-Large"));
        assert_eq!(clean_district_value("  "), None);
    }

    #[test]
    fn test_strip_qualifiers() {
        assert_eq!(strip_qualifiers("US Representative, 1st District"), "US Representative");
        assert_eq!(strip_qualifiers("State Senator District 5"), "State Senator");
        assert_eq!(strip_qualifiers("City Council Position 2"), "City Council");
        assert_eq!(strip_qualifiers("Harney County Sheriff"), "County Sheriff");
        assert_eq!(strip_qualifiers("Ada County Commissioner"), "County Commissioner");
        assert_eq!(strip_qualifiers("City of Boise Mayor"), "Boise Mayor");
        assert_eq!(strip_qualifiers("School Board, Ada County, Seat 3"), "School Board");
    }
}
