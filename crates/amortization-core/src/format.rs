//! pt-BR currency and percentage formatting for display.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::rounding::round2;
use crate::types::Money;

const CURRENCY_PREFIX: &str = "R$\u{a0}";

/// Group integer digits in threes with `.` separators.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Fixed two-decimal pt-BR number: `1.234,56`.
fn format_number(value: Decimal) -> (bool, String) {
    let rounded = round2(value);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    (negative, format!("{},{}", group_thousands(int_part), frac_part))
}

/// `R$ 1.234,56` with a non-breaking space after the symbol.
pub fn format_currency(value: Money) -> String {
    let (negative, number) = format_number(value);
    let sign = if negative { "-" } else { "" };
    format!("{sign}{CURRENCY_PREFIX}{number}")
}

/// `10,50%` for a value already expressed in percent.
pub fn format_percent(value: Decimal) -> String {
    let (negative, number) = format_number(value);
    let sign = if negative { "-" } else { "" };
    format!("{sign}{number}%")
}

/// Parse a pt-BR currency string.
///
/// The symbol, whitespace and thousands dots are dropped and the first comma
/// becomes the decimal point. The longest numeric prefix of what remains is
/// parsed, so trailing text is ignored; no numeric prefix yields zero.
pub fn parse_currency(input: &str) -> Money {
    let stripped: String = input
        .chars()
        .filter(|c| !matches!(c, 'R' | '$' | '.') && !c.is_whitespace())
        .collect();
    let cleaned = stripped.replacen(',', ".", 1);
    let prefix = numeric_prefix(&cleaned);
    let (sign, unsigned) = match prefix.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", prefix.trim_start_matches('+')),
    };
    let zero = if unsigned.starts_with('.') { "0" } else { "" };
    let normalized = format!("{sign}{zero}{unsigned}");
    let parsed = if normalized.contains(['e', 'E']) {
        Decimal::from_scientific(&normalized)
    } else {
        Decimal::from_str(&normalized)
    };
    parsed.unwrap_or(Decimal::ZERO)
}

/// Longest leading slice shaped like `[+-]digits[.digits][e[+-]digits]`,
/// where either the integer or the fraction digits may be absent.
fn numeric_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut mantissa_end = int_end;
    if bytes.get(int_end) == Some(&b'.') {
        let frac_end = digits_from(int_end + 1);
        if frac_end > int_end + 1 {
            mantissa_end = frac_end;
        }
    }
    if mantissa_end == end {
        return "";
    }
    end = mantissa_end;

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(dec!(1234.56)), "R$\u{a0}1.234,56");
        assert_eq!(format_currency(Decimal::ZERO), "R$\u{a0}0,00");
        assert_eq!(format_currency(dec!(2250000)), "R$\u{a0}2.250.000,00");
        assert_eq!(format_currency(dec!(-15.5)), "-R$\u{a0}15,50");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(dec!(10.5)), "10,50%");
        assert_eq!(format_percent(dec!(12)), "12,00%");
    }

    #[test]
    fn test_parse_currency() {
        assert_eq!(parse_currency("1.234,56"), dec!(1234.56));
        assert_eq!(parse_currency("R$ 1.234,56"), dec!(1234.56));
        assert_eq!(parse_currency("R$\u{a0}1.234,56"), dec!(1234.56));
        assert_eq!(parse_currency("500"), dec!(500));
        assert_eq!(parse_currency("1500,00"), dec!(1500));
        assert_eq!(parse_currency(""), Decimal::ZERO);
        assert_eq!(parse_currency("abc"), Decimal::ZERO);
    }

    #[test]
    fn test_parse_currency_reads_leading_number_only() {
        assert_eq!(parse_currency("12abc"), dec!(12));
        assert_eq!(parse_currency("R$ 99,90 por mês"), dec!(99.90));
        assert_eq!(parse_currency("-15,5"), dec!(-15.5));
        assert_eq!(parse_currency(",5"), dec!(0.5));
        assert_eq!(parse_currency("-"), Decimal::ZERO);
    }

    #[test]
    fn test_parse_currency_converts_first_comma_only() {
        assert_eq!(parse_currency("1,5,7"), dec!(1.5));
        assert_eq!(parse_currency("1.234.567,89"), dec!(1234567.89));
    }
}
