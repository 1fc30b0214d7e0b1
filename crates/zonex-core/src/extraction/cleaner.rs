//! Field cleaning and amount parsing.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::models::FieldKind;

lazy_static! {
    /// Anything that cannot be part of a person's name.
    static ref NAME_DISALLOWED: Regex = Regex::new(r"[^a-zA-ZÀ-ÿ\s\-']").unwrap();

    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();

    /// Anything that cannot be part of a written amount.
    static ref AMOUNT_DISALLOWED: Regex = Regex::new(r"[^0-9,.\-€\s]").unwrap();

    /// First number-looking run in cleaned amount text.
    static ref AMOUNT_RUN: Regex = Regex::new(r"[0-9,.\-]+").unwrap();
}

/// Keep letters (accented Latin included), spaces, hyphens and apostrophes.
pub fn clean_name(text: &str) -> String {
    let kept = NAME_DISALLOWED.replace_all(text.trim(), "");
    WHITESPACE_RUN.replace_all(&kept, " ").trim().to_string()
}

/// Keep digits, separators, minus, euro sign and spaces.
pub fn clean_amount(text: &str) -> String {
    AMOUNT_DISALLOWED.replace_all(text.trim(), "").trim().to_string()
}

/// Clean raw zone text according to the field it belongs to.
pub fn clean_field(kind: FieldKind, text: &str) -> String {
    match kind {
        FieldKind::Name | FieldKind::FirstName => clean_name(text),
        FieldKind::Amount => clean_amount(text),
    }
}

/// Parse an amount such as `12,50 €`.
///
/// The first comma is the decimal separator. Unparseable text gives zero
/// and the sign is dropped: amounts owed are never negative.
pub fn parse_amount(text: &str) -> Decimal {
    let Some(run) = AMOUNT_RUN.find(text) else {
        return Decimal::ZERO;
    };
    let normalized = run.as_str().replacen(',', ".", 1);
    leading_decimal(&normalized)
        .map(|amount| amount.abs())
        .unwrap_or(Decimal::ZERO)
}

/// Longest prefix of `s` that reads as a decimal number, like `-12.5` in `-12.5.3`.
pub(crate) fn leading_decimal(s: &str) -> Option<Decimal> {
    let mut chars = s.trim_start().chars().peekable();
    let mut sign = String::new();
    if let Some(&c) = chars.peek() {
        if c == '-' || c == '+' {
            if c == '-' {
                sign.push('-');
            }
            chars.next();
        }
    }

    let mut integer = String::new();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        integer.push(c);
        chars.next();
    }

    let mut fraction = String::new();
    if chars.peek() == Some(&'.') {
        chars.next();
        while let Some(&c) = chars.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            fraction.push(c);
            chars.next();
        }
    }

    if integer.is_empty() && fraction.is_empty() {
        return None;
    }
    if integer.is_empty() {
        integer.push('0');
    }

    let literal = if fraction.is_empty() {
        format!("{}{}", sign, integer)
    } else {
        format!("{}{}.{}", sign, integer, fraction)
    };
    Decimal::from_str(&literal).ok()
}

/// Format an amount for export (`80.00 €`).
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2} €", amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("12,50 €"), Decimal::new(125, 1));
        assert_eq!(parse_amount("-7"), Decimal::new(7, 0));
        assert_eq!(parse_amount(""), Decimal::ZERO);
        assert_eq!(parse_amount("abc"), Decimal::ZERO);
        assert_eq!(parse_amount("1234.56"), Decimal::new(123456, 2));
        assert_eq!(parse_amount("€ 45"), Decimal::new(45, 0));
    }

    #[test]
    fn test_parse_amount_takes_valid_prefix() {
        // only the first comma becomes a decimal point
        assert_eq!(parse_amount("1,234,5"), Decimal::new(1234, 3));
        assert_eq!(parse_amount("12.5.3"), Decimal::new(125, 1));
        assert_eq!(parse_amount("3-4"), Decimal::new(3, 0));
        assert_eq!(parse_amount("-"), Decimal::ZERO);
        assert_eq!(parse_amount(",50"), Decimal::new(5, 1));
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("MARTIN123"), "MARTIN");
        assert_eq!(clean_name("  Jean-Pierre   D'Arc "), "Jean-Pierre D'Arc");
        assert_eq!(clean_name("Zoé, Hélène!"), "Zoé Hélène");
        assert_eq!(clean_name("42"), "");
    }

    #[test]
    fn test_clean_amount() {
        assert_eq!(clean_amount(" Total: 12,50 € "), "12,50 €");
        assert_eq!(clean_amount("EUR 1.000,00"), "1.000,00");
        assert_eq!(clean_amount("n/a"), "");
    }

    #[test]
    fn test_clean_field_dispatch() {
        assert_eq!(clean_field(FieldKind::Name, "DUPONT 1"), "DUPONT");
        assert_eq!(clean_field(FieldKind::FirstName, "Jean."), "Jean");
        assert_eq!(clean_field(FieldKind::Amount, "30 €."), "30 €.");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Decimal::new(80, 0)), "80.00 €");
        assert_eq!(format_amount(Decimal::new(125, 1)), "12.50 €");
    }
}
