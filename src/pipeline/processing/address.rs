//! Mailing address and phone normalization.
//!
//! Addresses are parsed right to left: postal code, then region, then city,
//! and whatever remains is the street line.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::NormalizedAddress;

/// Two-letter USPS codes for the states, DC and inhabited territories.
pub const REGIONS: &[(&str, &str)] = &[
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
    ("DC", "District of Columbia"),
    ("PR", "Puerto Rico"),
    ("GU", "Guam"),
    ("VI", "U.S. Virgin Islands"),
    ("AS", "American Samoa"),
    ("MP", "Northern Mariana Islands"),
];

/// Street-line abbreviations that look like region codes.
const NON_REGION_ABBREVIATIONS: &[&str] = &[
    "ST", "RD", "DR", "LN", "AV", "CR", "HW", "PL", "SQ", "TR", "WY", "NW", "SW", "SE", "NO", "PO",
    "APT", "STE",
];

static ZIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{5})(?:-\d{4})?(?:\.0)?\b").expect("zip pattern"));

static PO_BOX_TAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bp\.?\s*o\.?\s*box\s*#?\s*$").expect("po box pattern")
});

static TRAILING_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[\s,])([A-Za-z]{2})\.?$").expect("region code pattern"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

static PHONE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:home|cell|phone|work|office|mobile|tel)\b\s*[:#.]?").expect("phone label pattern")
});

/// Full region name for a two-letter code or a full name, case-insensitive.
pub fn expand_region(value: &str) -> Option<&'static str> {
    let trimmed = value.trim().trim_end_matches('.');
    REGIONS
        .iter()
        .find(|(code, name)| code.eq_ignore_ascii_case(trimmed) || name.eq_ignore_ascii_case(trimmed))
        .map(|(_, name)| *name)
}

/// Five-digit postal code from a standalone ZIP value.
///
/// Strips the `.0` left by numeric spreadsheet columns, drops a +4
/// extension and zero-pads four-digit values that lost their leading zero.
pub fn normalize_postal_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();

    let digits: String = compact.chars().filter(|c| c.is_ascii_digit()).collect();
    let is_numeric = compact.chars().all(|c| c.is_ascii_digit() || c == '-');
    if is_numeric {
        match digits.len() {
            4 => return Some(format!("0{}", digits)),
            5 | 9 => return Some(digits[..5].to_string()),
            _ => {}
        }
    }

    ZIP.captures(trimmed).map(|c| c[1].to_string())
}

/// Decompose a one-line mailing address. Never fails; unparseable parts are
/// left as `None` and any leftover text lands in `street`.
pub fn normalize_address(raw: &str) -> NormalizedAddress {
    let mut address = NormalizedAddress::default();
    let mut rest = WHITESPACE.replace_all(raw.trim(), " ").to_string();
    if rest.is_empty() {
        return address;
    }

    if let Some((postal, start, end)) = find_postal(&rest) {
        address.postal_code = Some(postal);
        rest = format!("{} {}", &rest[..start], &rest[end..]);
        rest = tidy(&rest);
    }

    let (region, ambiguous, remaining) = take_region(&rest);
    address.region = region;
    address.region_ambiguous = ambiguous;
    rest = remaining;

    match rest.rsplit_once(',') {
        Some((street, city)) => {
            address.city = non_empty(tidy(city));
            address.street = non_empty(tidy(street));
        }
        None if address.region.is_some() && !rest.chars().any(|c| c.is_ascii_digit()) => {
            address.city = non_empty(tidy(&rest));
        }
        None => address.street = non_empty(tidy(&rest)),
    }

    address
}

/// ZIP-shaped match at the end of the address that is not a PO Box number.
/// Digits earlier in the line are house or box numbers.
fn find_postal(text: &str) -> Option<(String, usize, usize)> {
    let caps = ZIP.captures_iter(text).last()?;
    let whole = caps.get(0)?;
    let tail = text[whole.end()..].trim_matches(|c: char| c == ',' || c == '.' || c.is_whitespace());
    if !tail.is_empty() || PO_BOX_TAIL.is_match(&text[..whole.start()]) {
        return None;
    }
    Some((caps[1].to_string(), whole.start(), whole.end()))
}

/// Split a trailing region code or name off the text.
fn take_region(text: &str) -> (Option<String>, bool, String) {
    // Full names first, longest first, so "West Virginia" beats "Virginia".
    let lowered = text.to_lowercase();
    let mut names: Vec<&(&str, &str)> = REGIONS.iter().collect();
    names.sort_by_key(|(_, name)| std::cmp::Reverse(name.len()));
    for (_, name) in names {
        let needle = name.to_lowercase();
        if let Some(prefix) = lowered.strip_suffix(&needle) {
            if prefix.ends_with(',') || (prefix.ends_with(' ') && prefix.contains(',')) {
                let remaining = tidy(&text[..prefix.len()]);
                return (Some(name.to_string()), false, remaining);
            }
        }
    }

    let Some(caps) = TRAILING_CODE.captures(text) else {
        return (None, false, text.to_string());
    };
    let code = &caps[2];
    let after_comma = text[..caps.get(2).map(|m| m.start()).unwrap_or(0)]
        .trim_end()
        .ends_with(',');
    let uppercase = code.chars().all(|c| c.is_ascii_uppercase());
    let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
    let remaining = tidy(&text[..start]);

    match expand_region(code) {
        Some(name) if uppercase || after_comma => (Some(name.to_string()), false, remaining),
        None if uppercase && after_comma && !NON_REGION_ABBREVIATIONS.contains(&code) => {
            (Some(code.to_string()), true, remaining)
        }
        _ => (None, false, text.to_string()),
    }
}

fn tidy(text: &str) -> String {
    let collapsed = WHITESPACE.replace_all(text, " ");
    collapsed
        .trim_matches(|c: char| c == ',' || c.is_whitespace())
        .replace(" ,", ",")
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// `XXX-XXX-XXXX` for ten-digit numbers (or eleven with a leading 1);
/// other digit counts are returned as bare digits.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let unlabeled = PHONE_LABEL.replace_all(raw.trim(), " ");
    let unlabeled = unlabeled.trim();
    let unlabeled = unlabeled.strip_suffix(".0").unwrap_or(unlabeled);

    let digits: String = unlabeled.chars().filter(|c| c.is_ascii_digit()).collect();
    let national = match digits.len() {
        11 if digits.starts_with('1') => &digits[1..],
        _ => digits.as_str(),
    };

    match national.len() {
        0 => None,
        10 => Some(format!("{}-{}-{}", &national[..3], &national[3..6], &national[6..])),
        _ => Some(digits.clone()),
    }
}
