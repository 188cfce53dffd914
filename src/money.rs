// money.rs
// Localized money strings ("1.234,56") to and from decimal amounts.

use num_format::{Locale, ToFormattedString as _};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use std::str::FromStr;

pub const CURRENCY_PREFIX: &str = "R$";

/// Outcome of reading a money string. Callers decide what an unreadable value means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedAmount {
    Amount(Decimal),
    Unparseable,
}

impl ParsedAmount {
    pub fn or_zero(self) -> Decimal {
        match self {
            ParsedAmount::Amount(value) => value,
            ParsedAmount::Unparseable => Decimal::ZERO,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ParsedAmount::Amount(_))
    }
}

/// Reads "R$ 1.234,56" style text. Negative amounts are not valid money here.
pub fn parse(text: Option<&str>) -> ParsedAmount {
    let Some(text) = text else {
        return ParsedAmount::Unparseable;
    };
    let trimmed = text.trim();
    let without_prefix = trimmed
        .strip_prefix(CURRENCY_PREFIX)
        .unwrap_or(trimmed)
        .trim();
    if without_prefix.is_empty() {
        return ParsedAmount::Unparseable;
    }

    let canonical = without_prefix.replace('.', "").replace(',', ".");
    match Decimal::from_str(&canonical) {
        Ok(value) if !value.is_sign_negative() => ParsedAmount::Amount(value),
        _ => ParsedAmount::Unparseable,
    }
}

pub fn parse_or_zero(text: &str) -> Decimal {
    parse(Some(text)).or_zero()
}

/// Renders an amount with two decimals, `,` as decimal mark and `.` between thousands.
pub fn format(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let abs = rounded.abs();
    // de: '.' groups thousands
    let integer = abs
        .trunc()
        .to_u128()
        .unwrap_or_default()
        .to_formatted_string(&Locale::de);
    let cents = (abs.fract() * Decimal::ONE_HUNDRED)
        .trunc()
        .to_u32()
        .unwrap_or_default();
    format!("{sign}{integer},{cents:02}")
}

/// Stores user input in canonical form; unreadable input becomes "0,00".
pub fn normalize(text: &str) -> String {
    format(parse_or_zero(text))
}
