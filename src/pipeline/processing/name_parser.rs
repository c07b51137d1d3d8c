//! Candidate name decomposition.
//!
//! Handles "First Middle Last" and "Last, First Middle" layouts, a leading
//! honorific, a trailing generational suffix and a quoted nickname. Multi-word
//! surnames ("van der Berg") are not recognised: interior tokens always land
//! in `middle_name`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::ParsedName;

pub const PREFIXES: &[&str] = &[
    "Dr", "Mr", "Mrs", "Ms", "Miss", "Prof", "Rev", "Hon", "Sen", "Rep", "Gov", "Lt", "Col",
    "Gen", "Adm", "Capt", "Maj", "Sgt", "Cpl", "Pvt",
];

pub const SUFFIXES: &[&str] = &[
    "Jr", "Sr", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X",
];

const QUOTES: &str = "\"'\u{201c}\u{201d}\u{2018}\u{2019}";

static NICKNAME: Lazy<Regex> = Lazy::new(|| {
    let q = regex::escape(QUOTES);
    Regex::new(&format!("[{q}]([^{q}]+)[{q}]")).expect("nickname pattern")
});

// Longest alternatives first so "Mrs" is not read as "Mr" + "s".
static PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)^({})\.?\s+", alternation(PREFIXES))).expect("prefix pattern")
});

static SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)[\s,]+({})\.?$", alternation(SUFFIXES))).expect("suffix pattern")
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

fn alternation(words: &[&str]) -> String {
    let mut sorted: Vec<&str> = words.to_vec();
    sorted.sort_by_key(|w| std::cmp::Reverse(w.len()));
    sorted.join("|")
}

/// Trim, strip outer quote marks and collapse internal whitespace.
pub fn clean_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches(|c| QUOTES.contains(c)).trim();
    let collapsed = WHITESPACE.replace_all(trimmed, " ").to_string();
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// A single letter, optionally followed by a period.
pub fn is_initial(part: &str) -> bool {
    let mut chars = part.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(c), None, None) => c.is_alphabetic(),
        (Some(c), Some('.'), None) => c.is_alphabetic(),
        _ => false,
    }
}

/// Decompose a raw name. Never fails; blank input yields an empty name.
pub fn parse(raw: &str) -> ParsedName {
    let Some(mut working) = clean_name(raw) else {
        return ParsedName::default();
    };

    let mut parsed = ParsedName::default();

    if let Some(caps) = NICKNAME.captures(&working) {
        parsed.nickname = non_empty(caps[1].trim());
        let without = NICKNAME.replacen(&working, 1, " ").to_string();
        working = WHITESPACE.replace_all(without.trim(), " ").to_string();
    }

    if let Some(caps) = PREFIX.captures(&working) {
        parsed.prefix = Some(caps[1].to_string());
        let end = caps.get(0).map(|m| m.end()).unwrap_or(0);
        working = working[end..].trim().to_string();
    }

    if let Some(caps) = SUFFIX.captures(&working) {
        parsed.suffix = Some(caps[1].to_string());
        let start = caps.get(0).map(|m| m.start()).unwrap_or(working.len());
        working = working[..start].trim().to_string();
    }

    if let Some((last, rest)) = working.split_once(',') {
        parsed.last_name = non_empty(last.trim());
        let tokens: Vec<&str> = rest.split_whitespace().collect();
        if let Some((first, middle)) = tokens.split_first() {
            parsed.first_name = Some(first.to_string());
            parsed.middle_name = non_empty(&middle.join(" "));
        }
    } else {
        let tokens: Vec<&str> = working.split_whitespace().collect();
        match tokens.as_slice() {
            [] => {}
            [last] => parsed.last_name = Some(last.to_string()),
            [first, last] => {
                parsed.first_name = Some(first.to_string());
                parsed.last_name = Some(last.to_string());
            }
            [first, middle @ .., last] => {
                parsed.first_name = Some(first.to_string());
                parsed.middle_name = non_empty(&middle.join(" "));
                parsed.last_name = Some(last.to_string());
            }
        }
    }

    parsed.display_name = display_name(&parsed);
    parsed
}

/// Space-joined prefix, first, middle, last, suffix and quoted nickname.
pub fn display_name(name: &ParsedName) -> String {
    let nickname = name.nickname.as_ref().map(|n| format!("\"{}\"", n));
    [
        name.prefix.as_ref(),
        name.first_name.as_ref(),
        name.middle_name.as_ref(),
        name.last_name.as_ref(),
        name.suffix.as_ref(),
        nickname.as_ref(),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.is_empty())
    .map(String::as_str)
    .collect::<Vec<_>>()
    .join(" ")
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
