//! Utility functions for the sales_forecast crate

use crate::error::{ForecastError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Parse a target date given on the command line (`YYYY-MM-DD`)
pub fn parse_target_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| ForecastError::InvalidDate(input.to_string()))
}

/// Parse a transaction timestamp from a store table.
///
/// Accepts a bare date, `YYYY-MM-DD HH:MM:SS` (optionally with fractional
/// seconds or a `T` separator) and RFC 3339. An offset is dropped without
/// converting, so the wall-clock time and calendar day stay as stored.
pub fn parse_timestamp(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_local());
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Convert a continuous estimate to a whole quantity.
///
/// Rounds to the nearest integer with halves away from zero. Negative
/// estimates become zero when `clamp_negative` is set.
pub fn round_quantity(estimate: f64, clamp_negative: bool) -> i64 {
    let rounded = estimate.round() as i64;
    if clamp_negative {
        rounded.max(0)
    } else {
        rounded
    }
}
