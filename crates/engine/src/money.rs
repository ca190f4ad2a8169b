//! Parsing and formatting of user-facing amounts.
//!
//! Amounts travel as `f64` on the wire. User input goes through integer cents
//! first so `"0.1"` parses to exactly the `f64` closest to one tenth and
//! inputs with sub-cent precision are rejected instead of silently rounded.

use crate::{EngineError, ResultEngine};

/// Parses a decimal string into an amount.
///
/// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
///
/// Validation rules:
/// - max 2 fractional digits (rejects `12.345`)
/// - rejects empty/invalid strings
///
/// ```rust
/// use engine::money::parse_amount;
///
/// assert_eq!(parse_amount("10,5").unwrap(), 10.5);
/// assert!(parse_amount("12.345").is_err());
/// ```
pub fn parse_amount(s: &str) -> ResultEngine<f64> {
    let empty = || EngineError::InvalidAmount("empty amount".to_string());
    let invalid = || EngineError::InvalidAmount(format!("invalid amount: {s}"));
    let overflow = || EngineError::InvalidAmount("amount too large".to_string());

    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(empty());
    }

    let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
        (true, stripped.trim())
    } else if let Some(stripped) = trimmed.strip_prefix('+') {
        (false, stripped.trim())
    } else {
        (false, trimmed)
    };
    if rest.is_empty() {
        return Err(empty());
    }

    let rest = rest.replace(',', ".");
    let (whole, fraction) = match rest.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (rest.as_str(), None),
    };

    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let whole: i64 = whole.parse().map_err(|_| overflow())?;

    let cents: i64 = match fraction {
        None | Some("") => 0,
        Some(frac) if !frac.chars().all(|c| c.is_ascii_digit()) => return Err(invalid()),
        Some(frac) if frac.len() == 1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
        Some(frac) if frac.len() == 2 => frac.parse::<i64>().map_err(|_| invalid())?,
        Some(_) => return Err(EngineError::InvalidAmount("too many decimals".to_string())),
    };

    let total = whole
        .checked_mul(100)
        .and_then(|v| v.checked_add(cents))
        .ok_or_else(overflow)?;
    let signed = if negative { -total } else { total };

    Ok(signed as f64 / 100.0)
}

/// Formats `amount` with `decimals` fraction digits and `,` thousand
/// separators: `1234.5` -> `"1,234.50"`.
pub fn format_amount(amount: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, amount.abs());
    let (whole, fraction) = match fixed.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    // `-0.00` reads as noise.
    let is_zero = fixed.chars().all(|c| c == '0' || c == '.');
    let sign = if amount < 0.0 && !is_zero { "-" } else { "" };
    match fraction {
        Some(fraction) => format!("{sign}{grouped}.{fraction}"),
        None => format!("{sign}{grouped}"),
    }
}

/// `format_amount` with two decimals followed by the currency code.
pub fn format_money(amount: f64, currency: &str) -> String {
    format!("{} {}", format_amount(amount, 2), currency)
}

/// Percentage with one decimal: `66.666` -> `"66.7%"`.
pub fn format_percentage(value: f64) -> String {
    format!("{value:.1}%")
}
