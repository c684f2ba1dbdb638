//! Integer minor-unit amounts. Nothing in the ledger touches floating point.

use crate::errors::{LedgerError, Result};

/// Amount in minor currency units (cents for USD).
pub type MinorUnits = i64;

const MINOR_DIGITS: usize = 2;
const MINOR_SCALE: i64 = 100;

/// Largest magnitude accepted for a single amount (one trillion major units).
/// Millions of events at this size still fit in an `i64` running balance.
pub const MAX_AMOUNT: MinorUnits = 1_000_000_000_000 * MINOR_SCALE;

/// Parses user-entered text (`12`, `12.5`, `1,234.56`, `$5.00`) into minor units.
///
/// Negative values, more than two fractional digits, magnitudes above
/// [`MAX_AMOUNT`], and anything that is not a plain decimal number are rejected
/// with [`LedgerError::InvalidAmount`].
pub fn parse_amount(raw: &str) -> Result<MinorUnits> {
    let invalid = || LedgerError::InvalidAmount(raw.to_string());
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|ch| *ch != ',' && *ch != '_')
        .collect();
    if cleaned.is_empty() {
        return Err(invalid());
    }

    let (whole, fraction) = match cleaned.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (cleaned.as_str(), ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|ch| ch.is_ascii_digit())
        || !fraction.chars().all(|ch| ch.is_ascii_digit())
        || fraction.len() > MINOR_DIGITS
    {
        return Err(invalid());
    }

    let whole_units: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let mut fraction_units: i64 = if fraction.is_empty() {
        0
    } else {
        fraction.parse().map_err(|_| invalid())?
    };
    if fraction.len() == 1 {
        fraction_units *= 10;
    }

    whole_units
        .checked_mul(MINOR_SCALE)
        .and_then(|units| units.checked_add(fraction_units))
        .filter(|units| *units <= MAX_AMOUNT)
        .ok_or_else(invalid)
}

/// Like [`parse_amount`] but allows a leading `-`, for balances that may start
/// overdrawn.
pub fn parse_signed_amount(raw: &str) -> Result<MinorUnits> {
    match raw.trim().strip_prefix('-') {
        Some(magnitude) => parse_amount(magnitude)
            .map(|units| -units)
            .map_err(|_| LedgerError::InvalidAmount(raw.to_string())),
        None => parse_amount(raw),
    }
}

/// Renders minor units as a plain decimal string, e.g. `-1234` -> `-12.34`.
pub fn format_minor_units(amount: MinorUnits) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let magnitude = amount.unsigned_abs();
    let scale = MINOR_SCALE.unsigned_abs();
    format!(
        "{sign}{}.{:0width$}",
        magnitude / scale,
        magnitude % scale,
        width = MINOR_DIGITS
    )
}

/// Prefixes the formatted amount with a currency code, e.g. `USD 3000.00`.
pub fn format_money(amount: MinorUnits, currency: &str) -> String {
    format!("{} {}", currency, format_minor_units(amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_inputs_without_floats() {
        assert_eq!(parse_amount("12").unwrap(), 1200);
        assert_eq!(parse_amount("12.5").unwrap(), 1250);
        assert_eq!(parse_amount("0.07").unwrap(), 7);
        assert_eq!(parse_amount("$1,234.56").unwrap(), 123_456);
        assert_eq!(parse_amount(".99").unwrap(), 99);
    }

    #[test]
    fn rejects_negative_and_malformed_amounts() {
        for raw in ["", "-5", "abc", "1.234", "1.2.3", ".", "12e3"] {
            assert!(
                matches!(parse_amount(raw), Err(LedgerError::InvalidAmount(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn amounts_above_the_cap_are_rejected() {
        assert!(parse_amount("90000000000000000").is_err());
        assert!(parse_amount("1000000000000.01").is_err());
        assert_eq!(parse_amount("1000000000000").unwrap(), MAX_AMOUNT);
    }

    #[test]
    fn signed_amounts_accept_a_leading_minus() {
        assert_eq!(parse_signed_amount("-250").unwrap(), -25_000);
        assert_eq!(parse_signed_amount("-$1,000.50").unwrap(), -100_050);
        assert_eq!(parse_signed_amount("12.34").unwrap(), 1_234);
        assert!(parse_signed_amount("--5").is_err());
        assert!(parse_signed_amount("-").is_err());
    }

    #[test]
    fn formats_signed_minor_units() {
        assert_eq!(format_minor_units(300_000), "3000.00");
        assert_eq!(format_minor_units(-500), "-5.00");
        assert_eq!(format_minor_units(7), "0.07");
        assert_eq!(format_money(219_500, "USD"), "USD 2195.00");
    }
}
