use std::sync::LazyLock;

use regex::Regex;

use crate::records::Price;

pub const CURRENCY_PREFIX: &str = "Rp ";
pub const CURRENCY_MARKER: &str = "Rp";
const PRICE_SUFFIX: &str = ",-";
const THOUSANDS_SEPARATOR: &str = ".";

static LEADING_QUALIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:stasiun|station)\s+").unwrap());
static TRAILING_QUALIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(?:stasiun|station)$").unwrap());
static PUNCTUATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());
static NON_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Z0-9]").unwrap());

/// `"Rp 150.000,-"` → `Amount(150000)`. Anything that still isn't an integer
/// once the currency decorations are gone comes back as `Raw(trimmed)`.
pub fn parse_price(text: &str) -> Price {
    let trimmed = text.trim();
    let digits = trimmed
        .replace(CURRENCY_PREFIX, "")
        .replace(PRICE_SUFFIX, "")
        .replace(THOUSANDS_SEPARATOR, "");
    match digits.trim().parse::<i64>() {
        Ok(n) => Price::Amount(n),
        Err(_) => Price::Raw(trimmed.to_string()),
    }
}

pub fn has_currency_marker(text: &str) -> bool {
    text.contains(CURRENCY_MARKER)
}

/// Drop a leading/trailing "Stasiun"/"Station", strip punctuation,
/// collapse whitespace, uppercase.
pub fn clean_station_name(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    let name = LEADING_QUALIFIER_RE.replace(name, "");
    let name = TRAILING_QUALIFIER_RE.replace(&name, "");
    let name = PUNCTUATION_RE.replace_all(&name, "");
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Uppercase, then keep only `A-Z` and `0-9`.
pub fn clean_station_code(code: &str) -> String {
    if code.is_empty() {
        return String::new();
    }
    NON_CODE_RE
        .replace_all(&code.to_uppercase(), "")
        .trim()
        .to_string()
}

/// At least one cased character and none of them lowercase.
pub fn is_all_upper(s: &str) -> bool {
    s.chars().any(char::is_uppercase) && !s.chars().any(char::is_lowercase)
}

/// Every word starts with an uppercase letter followed only by lowercase
/// ones; non-letters separate words. Needs at least one letter.
pub fn is_title_case(s: &str) -> bool {
    let mut cased = false;
    let mut prev_cased = false;
    for c in s.chars() {
        if c.is_uppercase() {
            if prev_cased {
                return false;
            }
            prev_cased = true;
            cased = true;
        } else if c.is_lowercase() {
            if !prev_cased {
                return false;
            }
            prev_cased = true;
            cased = true;
        } else {
            prev_cased = false;
        }
    }
    cased
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_with_separators() {
        assert_eq!(parse_price("Rp 150.000,-"), Price::Amount(150000));
        assert_eq!(parse_price("  Rp 1.250.000,-  "), Price::Amount(1250000));
        assert_eq!(parse_price("Rp 95000"), Price::Amount(95000));
    }

    #[test]
    fn price_unparsable_keeps_raw_text() {
        assert_eq!(parse_price("  Rp Habis  "), Price::Raw("Rp Habis".into()));
        assert_eq!(parse_price("Rp 150.000,- / pax"), Price::Raw("Rp 150.000,- / pax".into()));
    }

    #[test]
    fn currency_marker() {
        assert!(has_currency_marker("Rp 10.000,-"));
        assert!(!has_currency_marker("Sold out"));
    }

    #[test]
    fn station_name() {
        assert_eq!(clean_station_name("Stasiun Gambir"), "GAMBIR");
        assert_eq!(clean_station_name("STASIUN  Pasar   Senen"), "PASAR SENEN");
        assert_eq!(clean_station_name("Jatinegara stasiun"), "JATINEGARA");
        assert_eq!(clean_station_name("Bandung Station"), "BANDUNG");
        assert_eq!(clean_station_name("Jakarta Kota (lama)!"), "JAKARTA KOTA LAMA");
        assert_eq!(clean_station_name(""), "");
    }

    #[test]
    fn qualifier_only_inside_is_kept() {
        assert_eq!(clean_station_name("Stasiunbaru"), "STASIUNBARU");
    }

    #[test]
    fn station_code() {
        assert_eq!(clean_station_code("jr-1a!"), "JR1A");
        assert_eq!(clean_station_code(" GMR "), "GMR");
        assert_eq!(clean_station_code(""), "");
        assert_eq!(clean_station_code("-"), "");
    }

    #[test]
    fn upper_predicate() {
        assert!(is_all_upper("GMR"));
        assert!(is_all_upper("JAKK1"));
        assert!(!is_all_upper("Gmr"));
        assert!(!is_all_upper("123"));
    }

    #[test]
    fn title_predicate() {
        assert!(is_title_case("Pasar Senen"));
        assert!(is_title_case("Stasiun Gambir"));
        assert!(!is_title_case("PASAR SENEN"));
        assert!(!is_title_case("pasar Senen"));
        assert!(!is_title_case("1234"));
    }
}
