//! Text formatting for invoice fields

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::OnceLock;

/// Symbol printed after an amount
pub fn currency_symbol(currency: &str) -> &str {
    match currency.to_ascii_uppercase().as_str() {
        "EUR" => "€",
        "USD" => "$",
        "GBP" => "£",
        "CHF" => "CHF",
        "PLN" => "zł",
        _ => currency,
    }
}

/// Two-decimal fixed notation followed by the currency symbol
pub fn format_amount(amount: Decimal, currency: &str) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2} {}", rounded, currency_symbol(currency))
}

/// Quantity without trailing zeros
pub fn format_quantity(quantity: Decimal) -> String {
    quantity.normalize().to_string()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Strip whitespace and uppercase
pub fn normalize_iban(iban: &str) -> String {
    iban.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Group an IBAN in blocks of four characters
///
/// Formatting an already grouped IBAN yields the same output.
pub fn format_iban(iban: &str) -> String {
    let chars: Vec<char> = normalize_iban(iban).chars().collect();
    chars
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Country code, check digits and 11 to 30 alphanumerics
pub fn is_valid_iban(iban: &str) -> bool {
    static IBAN_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex =
        IBAN_REGEX.get_or_init(|| Regex::new(r"^[A-Z]{2}[0-9]{2}[A-Z0-9]{11,30}$").unwrap());
    regex.is_match(&normalize_iban(iban))
}

/// Replace characters that are unsafe in an object key
pub fn sanitize_file_component(value: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let regex = UNSAFE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]").unwrap());
    regex.replace_all(value.trim(), "-").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_amount_two_decimals() {
        assert_eq!(format_amount(dec!(2975), "EUR"), "2975.00 €");
        assert_eq!(format_amount(dec!(0.985), "EUR"), "0.99 €");
        assert_eq!(format_amount(dec!(12.5), "CHF"), "12.50 CHF");
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(dec!(3000.00)), "3000");
        assert_eq!(format_quantity(dec!(1500.50)), "1500.5");
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(format_date(date), "07.03.2024");
    }

    #[test]
    fn test_format_iban_groups_of_four() {
        assert_eq!(
            format_iban("DE89370400440532013000"),
            "DE89 3704 0044 0532 0130 00"
        );
    }

    #[test]
    fn test_format_iban_is_idempotent() {
        let once = format_iban("de89 3704 00440532013000");
        assert_eq!(format_iban(&once), once);
        assert_eq!(once, "DE89 3704 0044 0532 0130 00");
    }

    #[test]
    fn test_format_iban_keeps_multibyte_chars_whole() {
        let formatted = format_iban("de89äö3704");
        assert_eq!(formatted, "DE89 ÄÖ37 04");
        assert!(!formatted.contains('\u{FFFD}'));
    }

    #[test]
    fn test_iban_shape() {
        assert!(is_valid_iban("DE89 3704 0044 0532 0130 00"));
        assert!(!is_valid_iban("DE89"));
        assert!(!is_valid_iban("1234567890123456"));
    }

    #[test]
    fn test_sanitize_file_component() {
        assert_eq!(sanitize_file_component("HN/1001 A"), "HN-1001-A");
        assert_eq!(sanitize_file_component("HN-1001"), "HN-1001");
    }
}
