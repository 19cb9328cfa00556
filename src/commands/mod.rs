//! Command handlers. Each returns the exact text to write to stdout.

pub mod cache;
pub mod config;
pub mod list;
pub mod methods;
pub mod next;
pub mod query;
pub mod table;
pub mod today;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::cache::CacheStore;
use crate::config::EffectiveConfig;
use crate::errors::AppError;
use crate::services::aladhan::{DayData, TimetableProvider};
use crate::services::geo::GeoLocator;
use crate::services::location::{resolve_location, LocationMode, ResolvedLocation};
use crate::services::schedule::ScheduleResolver;

/// Inputs shared by every schedule command.
pub struct Context<'a, P, G> {
    pub config: &'a EffectiveConfig,
    pub cache: Option<&'a CacheStore>,
    pub provider: &'a P,
    pub geo: &'a G,
    pub now: DateTime<Utc>,
    pub json: bool,
}

impl<'a, P: TimetableProvider, G: GeoLocator> Context<'a, P, G> {
    pub async fn resolve_location(&self) -> Result<ResolvedLocation, AppError> {
        resolve_location(&self.config.location, self.cache, self.geo, self.now).await
    }

    pub fn resolver<'b>(&'b self, location: &'b ResolvedLocation) -> ScheduleResolver<'b, P> {
        ScheduleResolver::new(self.provider, self.cache, location, self.config.calc)
    }
}

/// Location block of JSON output.
#[derive(Debug, Serialize)]
pub struct LocationJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub label: String,
    pub timezone: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationJson {
    /// Coordinates come from the provider's echo, which is also filled in
    /// for named places.
    pub fn new(location: &ResolvedLocation, tz: Tz, day: &DayData) -> Self {
        let named = location.mode == LocationMode::NamedPlace;
        Self {
            city: named.then(|| location.place.clone()),
            country: named.then(|| location.country.clone()),
            label: location.label.clone(),
            timezone: tz.name().to_string(),
            latitude: day.meta.latitude,
            longitude: day.meta.longitude,
        }
    }
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    let mut out = serde_json::to_string_pretty(value)?;
    out.push('\n');
    Ok(out)
}

/// `"28 Feb 2026"`
pub(crate) fn long_date(date: NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}

/// `"Sat 28 Feb"`
pub(crate) fn short_date(date: NaiveDate) -> String {
    date.format("%a %d %b").to_string()
}

/// Parse a day count: a positive integer, `week` (7) or `month` (30).
pub fn parse_days(raw: &str) -> Result<u32, AppError> {
    match raw.trim() {
        "week" => Ok(7),
        "month" => Ok(30),
        other => other
            .parse::<u32>()
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| {
                AppError::Config(format!(
                    "invalid day count {:?}: must be a positive integer, 'week', or 'month'",
                    raw
                ))
            }),
    }
}
