//! Location resolution.
//!
//! First match wins:
//!
//! 1. an explicit latitude or longitude (a missing partner defaults to 0)
//! 2. a named place, which requires a country
//! 3. an unexpired cached geolocation
//! 4. IP auto-detection, stored back to the cache best-effort
//!
//! Steps 1 and 2 touch neither disk nor network. Explicit coordinates of
//! exactly `0.0` count as explicit: presence is tracked with `Option`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{CacheStore, LookupParams};
use crate::errors::AppError;
use crate::helpers::format_coords;
use crate::services::aladhan::CalculationSettings;
use crate::services::geo::{DetectedLocation, GeoLocator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationMode {
    Coordinates,
    NamedPlace,
}

/// Location inputs after merging flags and the config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationInput {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// The location every lookup of one invocation uses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLocation {
    pub mode: LocationMode,
    pub latitude: f64,
    pub longitude: f64,
    pub place: String,
    pub country: String,
    /// IANA zone reported by the geolocation provider, if any.
    pub timezone_hint: Option<String>,
    /// Human-readable description for display.
    pub label: String,
}

impl ResolvedLocation {
    pub fn coordinates(latitude: f64, longitude: f64, timezone_hint: Option<String>) -> Self {
        Self {
            mode: LocationMode::Coordinates,
            latitude,
            longitude,
            place: String::new(),
            country: String::new(),
            timezone_hint,
            label: format_coords(latitude, longitude),
        }
    }

    pub fn named_place(place: &str, country: &str) -> Self {
        Self {
            mode: LocationMode::NamedPlace,
            latitude: 0.0,
            longitude: 0.0,
            place: place.to_string(),
            country: country.to_string(),
            timezone_hint: None,
            label: format!("{}, {}", place, country),
        }
    }

    fn detected(loc: DetectedLocation) -> Self {
        let hint = Some(loc.timezone).filter(|tz| !tz.is_empty());
        let mut resolved = Self::coordinates(loc.latitude, loc.longitude, hint);
        if !loc.city.is_empty() {
            resolved.label = if loc.country.is_empty() {
                loc.city
            } else {
                format!("{}, {}", loc.city, loc.country)
            };
        }
        resolved
    }

    /// Cache-key parameters. Only the fields of the active mode take part.
    pub fn lookup_params(&self, calc: CalculationSettings) -> LookupParams {
        match self.mode {
            LocationMode::Coordinates => LookupParams {
                latitude: self.latitude,
                longitude: self.longitude,
                place: String::new(),
                country: String::new(),
                calc,
            },
            LocationMode::NamedPlace => LookupParams {
                latitude: 0.0,
                longitude: 0.0,
                place: self.place.clone(),
                country: self.country.clone(),
                calc,
            },
        }
    }
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

pub async fn resolve_location<G: GeoLocator>(
    input: &LocationInput,
    cache: Option<&CacheStore>,
    geo: &G,
    now: DateTime<Utc>,
) -> Result<ResolvedLocation, AppError> {
    if input.latitude.is_some() || input.longitude.is_some() {
        let lat = input.latitude.unwrap_or(0.0);
        let lon = input.longitude.unwrap_or(0.0);
        tracing::debug!("using explicit coordinates {}, {}", lat, lon);
        return Ok(ResolvedLocation::coordinates(lat, lon, None));
    }

    if let Some(city) = non_empty(&input.city) {
        let country = non_empty(&input.country).ok_or(AppError::MissingCountry)?;
        tracing::debug!("using named place {}, {}", city, country);
        return Ok(ResolvedLocation::named_place(city, country));
    }

    if let Some(cached) = cache.and_then(|c| c.load_geo(now)) {
        tracing::debug!("using cached geolocation {}, {}", cached.latitude, cached.longitude);
        return Ok(ResolvedLocation::detected(cached));
    }

    let detected = geo
        .detect()
        .await
        .map_err(|e| AppError::LocationUnavailable(e.to_string()))?;
    tracing::info!(
        "auto-detected location {}, {} ({})",
        detected.latitude,
        detected.longitude,
        detected.city
    );

    if let Some(cache) = cache {
        if let Err(e) = cache.save_geo(&detected, now) {
            tracing::warn!("failed to cache geolocation: {}", e);
        }
    }

    Ok(ResolvedLocation::detected(detected))
}
