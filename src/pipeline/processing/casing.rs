//! Proper casing for names, cities and districts that arrive in all caps or
//! all lowercase.

use crate::domain::ParsedName;
use crate::pipeline::processing::name_parser;

/// Tokens with a fixed spelling, keyed by their uppercase form.
const FIXED_SPELLINGS: &[(&str, &str)] = &[
    ("JD", "JD"),
    ("MD", "MD"),
    ("PHD", "PhD"),
    ("MBA", "MBA"),
    ("CPA", "CPA"),
    ("ESQ", "Esq"),
    ("JR", "Jr"),
    ("SR", "Sr"),
    ("II", "II"),
    ("III", "III"),
    ("IV", "IV"),
    ("V", "V"),
    ("VI", "VI"),
    ("VII", "VII"),
    ("VIII", "VIII"),
    ("IX", "IX"),
    ("X", "X"),
    ("US", "US"),
];

/// Proper-case every word that is entirely upper or lower case.
///
/// Mixed-case words ("McDonald", "DeShawn") are kept as written, as are
/// words containing a digit. Letters following a hyphen or apostrophe start
/// a new segment, so "O'NEIL-SMITH" becomes "O'Neil-Smith".
pub fn proper_case(text: &str) -> String {
    text.split_whitespace()
        .map(proper_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn proper_case_word(word: &str) -> String {
    let has_upper = word.chars().any(char::is_uppercase);
    let has_lower = word.chars().any(char::is_lowercase);
    if (has_upper && has_lower) || word.chars().any(|c| c.is_ascii_digit()) {
        return word.to_string();
    }

    let core = word.trim_matches(|c: char| !c.is_alphanumeric());
    if let Some((_, fixed)) = FIXED_SPELLINGS
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(core))
    {
        return word.replacen(core, fixed, 1);
    }

    let mut out = String::with_capacity(word.len());
    let mut start_of_segment = true;
    for c in word.chars() {
        if start_of_segment && c.is_alphabetic() {
            out.extend(c.to_uppercase());
            start_of_segment = false;
        } else {
            out.extend(c.to_lowercase());
            if c == '-' || c == '\'' || c == '\u{2019}' {
                start_of_segment = true;
            }
        }
    }
    out
}

/// Proper-case each name part and rebuild the display name.
pub fn proper_case_name(name: &ParsedName) -> ParsedName {
    let fix = |part: &Option<String>| part.as_deref().map(proper_case);
    let mut cased = ParsedName {
        prefix: fix(&name.prefix),
        first_name: fix(&name.first_name),
        middle_name: fix(&name.middle_name),
        last_name: fix(&name.last_name),
        suffix: fix(&name.suffix),
        nickname: fix(&name.nickname),
        display_name: String::new(),
    };
    cased.display_name = name_parser::display_name(&cased);
    cased
}
