//! Locale-agnostic number parsing for budget amounts.
//!
//! Budgets arrive formatted European-style ("1.234,56"), American-style
//! ("1,234.56") or with no thousands separator at all, and nothing in the
//! document says which. The decision tree looks only at which separators are
//! present and how many digits follow the last one:
//!
//! - both `,` and `.`: the one occurring later is the decimal separator;
//! - one kind only, ≤2 trailing digits: decimal separator;
//! - one kind only, exactly 3 trailing digits: thousands separator.
//!
//! The 3-digit rule reads "1.234" as 1234, a bias towards whole-euro values.

/// Currency markers stripped before parsing. Mojibake euro first.
const CURRENCY_MARKERS: &[&str] = &["â‚¬", "€", "EUR", "eur", "R$", "US$", "USD", "$", "£"];

/// Parse a number of unknown locale, `0.0` when unreadable.
///
/// A real zero and an unreadable token are indistinguishable here; use
/// [`try_parse_locale_number`] when that matters.
pub fn parse_locale_number(token: &str) -> f64 {
    try_parse_locale_number(token).unwrap_or(0.0)
}

/// Parse a number of unknown locale, `None` when unreadable.
pub fn try_parse_locale_number(token: &str) -> Option<f64> {
    let mut s: String = CURRENCY_MARKERS
        .iter()
        .fold(token.to_string(), |acc, marker| acc.replace(marker, ""))
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let mut negative = false;
    if s.starts_with('(') && s.ends_with(')') && s.len() > 2 {
        negative = true;
        s = s[1..s.len() - 1].to_string();
    }
    if let Some(rest) = s.strip_prefix('-') {
        negative = !negative;
        s = rest.to_string();
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest.to_string();
    }

    if s.is_empty()
        || !s.chars().any(|c| c.is_ascii_digit())
        || !s.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
    {
        return None;
    }

    let normalized = normalize_separators(&s)?;
    let value: f64 = normalized.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// Rewrite a digits-and-separators string into Rust float syntax.
fn normalize_separators(s: &str) -> Option<String> {
    let last_dot = s.rfind('.');
    let last_comma = s.rfind(',');

    match (last_dot, last_comma) {
        (Some(dot), Some(comma)) => {
            let (thousands, decimal) = if dot > comma { (',', '.') } else { ('.', ',') };
            let without_thousands: String = s.chars().filter(|&c| c != thousands).collect();
            if without_thousands.matches(decimal).count() > 1 {
                return None;
            }
            Some(without_thousands.replace(decimal, "."))
        }
        (Some(_), None) => single_separator(s, '.'),
        (None, Some(_)) => single_separator(s, ','),
        (None, None) => Some(s.to_string()),
    }
}

/// Only one kind of separator present: decide decimal vs thousands from the
/// length of the trailing digit group.
fn single_separator(s: &str, sep: char) -> Option<String> {
    let groups: Vec<&str> = s.split(sep).collect();
    let trailing = groups.last().map(|g| g.len()).unwrap_or(0);

    if trailing == 3 && groups.len() > 1 {
        return Some(groups.concat());
    }
    if trailing <= 2 {
        // Earlier separators, if any, were grouping digits.
        let (head, tail) = groups.split_at(groups.len() - 1);
        return Some(format!("{}.{}", head.concat(), tail.concat()));
    }
    if groups.len() == 2 {
        return Some(format!("{}.{}", groups[0], groups[1]));
    }
    None
}

/// Parse a completion percentage, clamped to 0..=100.
///
/// "45%", "45" and "45,5" are percentages; a bare ratio token like "0,45" is
/// read as 0.45%, callers holding numeric spreadsheet cells decide ratios
/// themselves.
pub fn parse_percent(token: &str) -> Option<u8> {
    let value = try_parse_locale_number(&token.replace('%', ""))?;
    Some(value.round().clamp(0.0, 100.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn european_and_american_agree() {
        assert_eq!(parse_locale_number("1.234,56"), 1234.56);
        assert_eq!(parse_locale_number("1,234.56"), 1234.56);
    }

    #[test]
    fn two_trailing_digits_are_decimals() {
        assert_eq!(parse_locale_number("55.00"), 55.0);
        assert_eq!(parse_locale_number("55,00"), 55.0);
        assert_eq!(parse_locale_number("120,5"), 120.5);
    }

    #[test]
    fn three_trailing_digits_are_thousands() {
        assert_eq!(parse_locale_number("1.234"), 1234.0);
        assert_eq!(parse_locale_number("1,234"), 1234.0);
        assert_eq!(parse_locale_number("1.234.567"), 1_234_567.0);
        assert_eq!(parse_locale_number("12,345,678"), 12_345_678.0);
    }

    #[test]
    fn repeated_grouping_with_decimal_tail() {
        assert_eq!(parse_locale_number("1.234.567,89"), 1_234_567.89);
        assert_eq!(parse_locale_number("1,234,567.89"), 1_234_567.89);
    }

    #[test]
    fn long_fraction_with_single_separator_is_decimal() {
        assert_eq!(parse_locale_number("3.14159"), 3.14159);
    }

    #[test]
    fn plain_digits() {
        assert_eq!(parse_locale_number("10"), 10.0);
        assert_eq!(parse_locale_number("0"), 0.0);
    }

    #[test]
    fn currency_and_spaces_stripped() {
        assert_eq!(parse_locale_number("1 200,00 €"), 1200.0);
        assert_eq!(parse_locale_number("250,00 â‚¬"), 250.0);
        assert_eq!(parse_locale_number("$1,234.56"), 1234.56);
        assert_eq!(parse_locale_number("EUR 99,90"), 99.9);
        assert_eq!(parse_locale_number("1\u{00A0}500,00"), 1500.0);
    }

    #[test]
    fn negative_amounts() {
        assert_eq!(parse_locale_number("-1.234,56"), -1234.56);
        assert_eq!(parse_locale_number("(250,00)"), -250.0);
    }

    #[test]
    fn unreadable_tokens_yield_zero() {
        assert_eq!(parse_locale_number(""), 0.0);
        assert_eq!(parse_locale_number("abc"), 0.0);
        assert_eq!(parse_locale_number("€"), 0.0);
        assert_eq!(parse_locale_number("1,2,3.4.5"), 0.0);
    }

    #[test]
    fn strict_form_distinguishes_zero_from_garbage() {
        assert_eq!(try_parse_locale_number("0,00"), Some(0.0));
        assert_eq!(try_parse_locale_number("n/a"), None);
        assert_eq!(try_parse_locale_number(""), None);
    }

    #[test]
    fn percentages() {
        assert_eq!(parse_percent("45%"), Some(45));
        assert_eq!(parse_percent("100 %"), Some(100));
        assert_eq!(parse_percent("150"), Some(100));
        assert_eq!(parse_percent("12,6"), Some(13));
        assert_eq!(parse_percent("-"), None);
    }
}
