//! Conversions between human readable decimal amounts and integer base units.
//!
//! Parsing and formatting follow the ethers conventions: `to_unit("1.5")`
//! gives `1500000000000000000`, `from_unit` always keeps at least one
//! fractional digit (`"1.0"`) and `to_comma` groups the whole part by
//! thousands without touching the fraction.

use std::{fmt, str::FromStr};

use primitive_types::U256;

use crate::{
    config::{DEFAULT_DECIMALS, MAX_DECIMALS},
    error::UnitError,
};

/// Denomination of an amount, expressed as a number of decimals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    Wei,
    Kwei,
    Mwei,
    Gwei,
    Szabo,
    Finney,
    #[default]
    Ether,
    /// Arbitrary scale, for tokens that do not use 18 decimals
    Decimals(u8),
}

impl Unit {
    pub fn decimals(&self) -> u8 {
        match self {
            Self::Wei => 0,
            Self::Kwei => 3,
            Self::Mwei => 6,
            Self::Gwei => 9,
            Self::Szabo => 12,
            Self::Finney => 15,
            Self::Ether => DEFAULT_DECIMALS,
            Self::Decimals(decimals) => *decimals,
        }
    }

    // Decimals of this unit, rejecting scales that overflow a U256
    fn checked_decimals(&self) -> Result<usize, UnitError> {
        let decimals = self.decimals();
        if decimals > MAX_DECIMALS {
            return Err(UnitError::InvalidUnit(self.to_string()));
        }
        Ok(decimals as usize)
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value {
            "wei" => Self::Wei,
            "kwei" => Self::Kwei,
            "mwei" => Self::Mwei,
            "gwei" => Self::Gwei,
            "szabo" => Self::Szabo,
            "finney" => Self::Finney,
            "ether" => Self::Ether,
            other => {
                let decimals: u8 = other
                    .parse()
                    .map_err(|_| UnitError::InvalidUnit(other.to_string()))?;
                if decimals > MAX_DECIMALS {
                    return Err(UnitError::InvalidUnit(other.to_string()));
                }
                Self::Decimals(decimals)
            }
        })
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wei => write!(f, "wei"),
            Self::Kwei => write!(f, "kwei"),
            Self::Mwei => write!(f, "mwei"),
            Self::Gwei => write!(f, "gwei"),
            Self::Szabo => write!(f, "szabo"),
            Self::Finney => write!(f, "finney"),
            Self::Ether => write!(f, "ether"),
            Self::Decimals(decimals) => write!(f, "{}", decimals),
        }
    }
}

fn is_digits(value: &str) -> bool {
    value.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a decimal amount (`"1.5"`, `"42"`, `".25"`) into base units of `unit`
pub fn to_unit(amount: &str, unit: Unit) -> Result<U256, UnitError> {
    let decimals = unit.checked_decimals()?;
    let invalid = || UnitError::InvalidAmount(amount.to_string());

    if amount.is_empty() || amount == "." {
        return Err(invalid());
    }

    let mut parts = amount.split('.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next().unwrap_or_default();
    if parts.next().is_some() || !is_digits(whole) || !is_digits(fraction) {
        return Err(invalid());
    }

    let whole = if whole.is_empty() { "0" } else { whole };
    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > decimals {
        return Err(UnitError::FractionalOverflow {
            decimals: decimals as u8,
        });
    }

    let whole = U256::from_dec_str(whole).map_err(|_| UnitError::Overflow)?;
    let fraction = if fraction.is_empty() {
        U256::zero()
    } else {
        let padded = format!("{:0<width$}", fraction, width = decimals);
        U256::from_dec_str(&padded).map_err(|_| UnitError::Overflow)?
    };

    whole
        .checked_mul(U256::exp10(decimals))
        .and_then(|value| value.checked_add(fraction))
        .ok_or(UnitError::Overflow)
}

/// Format base units of `unit` as a decimal string
pub fn from_unit<V: Into<U256>>(amount: V, unit: Unit) -> Result<String, UnitError> {
    let decimals = unit.checked_decimals()?;
    Ok(format_fixed(amount.into(), decimals))
}

// `decimals` must be at most MAX_DECIMALS
fn format_fixed(value: U256, decimals: usize) -> String {
    if decimals == 0 {
        return value.to_string();
    }

    let multiplier = U256::exp10(decimals);
    let whole = value / multiplier;
    let fraction = format!("{:0>width$}", (value % multiplier).to_string(), width = decimals);
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        format!("{}.0", whole)
    } else {
        format!("{}.{}", whole, fraction)
    }
}

/// Shorthand for `to_unit(amount, Unit::Ether)`
pub fn parse_ether(amount: &str) -> Result<U256, UnitError> {
    to_unit(amount, Unit::Ether)
}

/// Shorthand for `from_unit(amount, Unit::Ether)`
pub fn format_ether<V: Into<U256>>(amount: V) -> String {
    format_fixed(amount.into(), DEFAULT_DECIMALS as usize)
}

/// Group the whole part of a decimal amount by thousands: `1234567.5` -> `1,234,567.5`
pub fn to_comma<T: ToString + ?Sized>(amount: &T) -> Result<String, UnitError> {
    let value = amount.to_string();
    let invalid = || UnitError::InvalidAmount(value.clone());

    if value == "." || value == "-." {
        return Err(invalid());
    }

    let mut parts = value.split('.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next();
    if parts.next().is_some() {
        return Err(invalid());
    }

    let (negative, whole) = match whole.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", whole),
    };
    if !is_digits(whole) || !fraction.map_or(true, is_digits) {
        return Err(invalid());
    }

    let whole = whole.trim_start_matches('0');
    let whole = if whole.is_empty() { "0" } else { whole };

    // Keep at least one fractional digit when a fraction was given
    let suffix = fraction.map(|fraction| {
        let trimmed = fraction.trim_end_matches('0');
        if trimmed.is_empty() {
            ".0".to_string()
        } else {
            format!(".{}", trimmed)
        }
    });

    let mut groups = Vec::with_capacity(whole.len() / 3 + 1);
    let mut end = whole.len();
    while end > 3 {
        groups.push(&whole[end - 3..end]);
        end -= 3;
    }
    groups.push(&whole[..end]);
    groups.reverse();

    Ok(format!(
        "{}{}{}",
        negative,
        groups.join(","),
        suffix.unwrap_or_default()
    ))
}
