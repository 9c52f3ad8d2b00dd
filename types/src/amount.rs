//! Token unit scaling.
//!
//! External amounts are integers scaled by `10^decimals`. These helpers
//! convert between that raw form and human-readable decimal strings.

use crate::error::TypesError;

/// Largest supported token precision. Credits always run at 1e18, so a token
/// with more decimals than that would lose resolution on conversion.
pub const MAX_DECIMALS: u8 = 18;

/// `10^decimals` as a raw multiplier.
pub fn unit_scale(decimals: u8) -> Result<u128, TypesError> {
    if decimals > MAX_DECIMALS {
        return Err(TypesError::InvalidDecimals {
            got: decimals,
            max: MAX_DECIMALS,
        });
    }
    Ok(10u128.pow(decimals as u32))
}

/// Parse a decimal string such as `"100"` or `"0.25"` into raw units.
pub fn parse_units(s: &str, decimals: u8) -> Result<u128, TypesError> {
    let scale = unit_scale(decimals)?;
    let s = s.trim();
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(TypesError::InvalidAmount(s.to_string()));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(TypesError::InvalidAmount(s.to_string()));
    }
    if frac.len() > decimals as usize {
        return Err(TypesError::InvalidAmount(format!(
            "{s}: more than {decimals} fractional digits"
        )));
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| TypesError::Overflow)?
    };
    let frac_raw: u128 = if frac.is_empty() {
        0
    } else {
        let padding = 10u128.pow((decimals as usize - frac.len()) as u32);
        frac.parse::<u128>().map_err(|_| TypesError::Overflow)? * padding
    };

    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(frac_raw))
        .ok_or(TypesError::Overflow)
}

/// Render raw units as a decimal string, trimming trailing zeros.
pub fn format_units(raw: u128, decimals: u8) -> String {
    let decimals = decimals.min(MAX_DECIMALS);
    let scale = 10u128.pow(decimals as u32);
    let whole = raw / scale;
    let frac = raw % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}
