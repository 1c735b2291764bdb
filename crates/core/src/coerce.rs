//! Input coercion at the edit boundary.
//!
//! Grid cells are free-text inputs. Whatever the user types is normalised
//! here before it reaches a patch, so the store never sees an un-coercible
//! value: blank input becomes zero, garbage becomes zero, negatives clamp to
//! zero.

use chrono::NaiveTime;

use crate::error::CoreError;

/// Display and wire format for rate cutoff times.
pub const CUTOFF_FORMAT: &str = "%H:%M";

/// Coerce a room-count style input into a non-negative integer.
///
/// Fractions are truncated and values beyond `u32::MAX` saturate.
pub fn coerce_count(raw: &str) -> u32 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return n.clamp(0, i64::from(u32::MAX)) as u32;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => v.trunc().clamp(0.0, f64::from(u32::MAX)) as u32,
        _ => 0,
    }
}

/// Coerce a money input into a non-negative amount rounded to cents.
pub fn coerce_amount(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => (v * 100.0).round() / 100.0,
        _ => 0.0,
    }
}

/// Parse a cutoff time typed as `HH:MM`.
pub fn parse_cutoff(raw: &str) -> Result<NaiveTime, CoreError> {
    NaiveTime::parse_from_str(raw.trim(), CUTOFF_FORMAT).map_err(|_| {
        CoreError::Validation(format!("Invalid cutoff time '{raw}', expected HH:MM"))
    })
}
