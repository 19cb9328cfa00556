//! Shared helpers for coordinate normalisation.
//!
//! Coordinates take two shapes in this crate:
//!
//! - `coord_key`: 6 decimal places, used inside cache keys so that tiny
//!   float noise from config files or the geolocation provider does not
//!   split one location into several cache entries
//! - `format_coords`: 4 decimal places, used for display labels
//!
//! Both map non-finite inputs (NaN, ±Inf) to zero.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// Number of decimal places kept for coordinates in cache keys.
const KEY_DECIMAL_PLACES: u32 = 6;

/// Convert a latitude or longitude into its cache-key representation.
pub(crate) fn coord_key(v: f64) -> Decimal {
    if !v.is_finite() {
        tracing::warn!("coord_key received non-finite value {}, defaulting to 0", v);
        return Decimal::ZERO;
    }
    Decimal::from_f64(v)
        .map(|d| d.round_dp(KEY_DECIMAL_PLACES).normalize())
        .unwrap_or(Decimal::ZERO)
}

/// Render a coordinate pair for display, e.g. `"51.5074, -0.1278"`.
pub(crate) fn format_coords(lat: f64, lon: f64) -> String {
    let lat = if lat.is_finite() { lat } else { 0.0 };
    let lon = if lon.is_finite() { lon } else { 0.0 };
    format!("{:.4}, {:.4}", lat, lon)
}
