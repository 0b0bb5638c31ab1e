//! Text-to-number cleanup for scraped table cells.
//!
//! Display text is inconsistent on purpose: magnitude suffixes ("1.5M"),
//! signed deltas with a parenthesized companion ("+1.23 (+0.25%)"), sentinel
//! dashes for missing data. Every function here is total: unparsable input
//! degrades to [`CellValue::Unavailable`], it never fails the extraction.

use crate::models::CellValue;

/// Display values that mean "no data", as opposed to zero.
const SENTINELS: [&str; 4] = ["-", "\u{2014}", "N/A", ""];

fn is_sentinel(s: &str) -> bool {
    SENTINELS.contains(&s)
}

/// Parse values like "1.23M", "4,567", "2.1B", "0.45T", "12%", "—".
/// Suffixed magnitudes scale by K/M/B/T; a trailing '%' yields the numeric
/// prefix unscaled (a percentage value, not a fraction).
pub fn magnitude(text: &str) -> CellValue {
    let s = text.trim().replace(',', "");
    if is_sentinel(&s) {
        return CellValue::Unavailable;
    }
    if let Some(prefix) = s.strip_suffix('%') {
        return parse_signed(prefix);
    }
    let (prefix, mult) = match s.chars().last() {
        Some('K') => (&s[..s.len() - 1], 1e3),
        Some('M') => (&s[..s.len() - 1], 1e6),
        Some('B') => (&s[..s.len() - 1], 1e9),
        Some('T') => (&s[..s.len() - 1], 1e12),
        _ => (s.as_str(), 1.0),
    };
    match parse_signed(prefix) {
        CellValue::Number(n) => CellValue::Number(n * mult),
        CellValue::Unavailable => CellValue::Unavailable,
    }
}

/// Parse a price cell: direct decimal first, magnitude grammar as fallback
/// for prices rendered with a suffix.
pub fn price(text: &str) -> CellValue {
    let s = text.trim().replace(',', "");
    match s.parse::<f64>() {
        Ok(n) => CellValue::Number(n),
        Err(_) => magnitude(text),
    }
}

/// Parse a change cell like "+1.23", "-0.45" or "+1.23 (+0.25%)": the first
/// whitespace-separated token that parses as a signed decimal wins, so the
/// parenthesized percentage companion is ignored.
pub fn delta(text: &str) -> CellValue {
    for token in text.split_whitespace() {
        let t = token.replace(',', "");
        let t = t.strip_suffix('%').unwrap_or(&t);
        if let CellValue::Number(n) = parse_signed(t) {
            return CellValue::Number(n);
        }
    }
    CellValue::Unavailable
}

/// Parse a ratio cell (PE and friends): sentinel dashes mean unavailable,
/// otherwise a plain decimal with thousands separators stripped.
pub fn ratio(text: &str) -> CellValue {
    let s = text.trim().replace(',', "");
    if is_sentinel(&s) {
        return CellValue::Unavailable;
    }
    parse_signed(&s)
}

/// Decimal parse with a leading '+' stripped ('-' is kept).
fn parse_signed(s: &str) -> CellValue {
    let s = s.trim().trim_start_matches('+');
    match s.parse::<f64>() {
        Ok(n) => CellValue::Number(n),
        Err(_) => CellValue::Unavailable,
    }
}
