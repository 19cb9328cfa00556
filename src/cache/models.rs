use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::services::aladhan::{CalculationSettings, DateInfo, DayData, Meta, Timings};
use crate::services::geo::DetectedLocation;

/// Every parameter that shapes a provider payload, apart from the date.
///
/// In coordinates mode `place`/`country` are empty; in named-place mode the
/// coordinates are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupParams {
    pub latitude: f64,
    pub longitude: f64,
    pub place: String,
    pub country: String,
    pub calc: CalculationSettings,
}

/// One cached day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetableCacheEntry {
    /// `YYYY-MM-DD`; must equal the requested date or the entry is stale.
    pub date: String,
    pub method: Option<u8>,
    pub school: Option<u8>,
    pub timings: Timings,
    #[serde(default)]
    pub date_info: DateInfo,
    #[serde(default)]
    pub meta: Meta,
}

impl TimetableCacheEntry {
    pub fn new(date: NaiveDate, calc: CalculationSettings, day: &DayData) -> Self {
        Self {
            date: date_key(date),
            method: calc.method,
            school: calc.school,
            timings: day.timings.clone(),
            date_info: day.date.clone(),
            meta: day.meta.clone(),
        }
    }

    pub fn into_day(self) -> DayData {
        DayData {
            timings: self.timings,
            date: self.date_info,
            meta: self.meta,
        }
    }
}

/// One cached month, one record per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarCacheEntry {
    pub year: i32,
    pub month: u32,
    pub method: Option<u8>,
    pub school: Option<u8>,
    pub days: Vec<DayData>,
}

impl CalendarCacheEntry {
    /// The record for `date`, indexed by day of month.
    ///
    /// An index past the end means the record is corrupt. This is a hard
    /// error, unlike a missing file.
    pub fn day(&self, date: NaiveDate) -> Result<&DayData, AppError> {
        use chrono::Datelike;
        let idx = date.day0() as usize;
        self.days.get(idx).ok_or_else(|| {
            AppError::CacheCorrupt(format!(
                "calendar {}-{:02} has {} days, no entry for day {}",
                self.year,
                self.month,
                self.days.len(),
                date.day()
            ))
        })
    }
}

/// A detected location with the time it was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoCacheEntry {
    pub location: DetectedLocation,
    pub cached_at: DateTime<Utc>,
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
