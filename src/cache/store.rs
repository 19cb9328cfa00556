//! File-backed cache for day timetables, month calendars and geolocation.
//!
//! Layout under the cache root:
//!
//! - `timings_<key>.json`: one day
//! - `calendar_<key>.json`: one month
//! - `geolocation.json`: last detected location, valid for 24h
//!
//! `<key>` is the first 8 bytes of a SHA-256 over every parameter that
//! shapes the payload, hex encoded. Loads never fail: absent, unreadable
//! or unparseable files are misses. Saves go through a temp file and a
//! rename so a concurrent reader sees either the old or the new record.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::models::{
    date_key, CalendarCacheEntry, GeoCacheEntry, LookupParams, TimetableCacheEntry,
};
use crate::errors::AppError;
use crate::helpers::coord_key;
use crate::services::aladhan::{CalculationSettings, DayData};
use crate::services::geo::DetectedLocation;

const TIMINGS_PREFIX: &str = "timings_";
const CALENDAR_PREFIX: &str = "calendar_";
const GEO_CACHE_FILE: &str = "geolocation.json";
const TEMP_SUFFIX: &str = ".tmp";

/// Geolocation entries older than this are misses.
pub const GEO_TTL_HOURS: i64 = 24;

/// Fingerprint of a lookup: `scope` is `YYYY-MM-DD` for a day or `YYYY-MM`
/// for a month. Unset method/school hash as `-1`. Free-text fields are
/// length-prefixed so no two tuples share a pre-image.
pub fn cache_key(scope: &str, params: &LookupParams) -> String {
    let raw = format!(
        "{}|{}|{}|{}|{}|{}|{}",
        scope,
        coord_key(params.latitude),
        coord_key(params.longitude),
        length_prefixed(&params.place),
        length_prefixed(&params.country),
        params.calc.method.map_or(-1, i16::from),
        params.calc.school.map_or(-1, i16::from),
    );
    let digest = Sha256::digest(raw.as_bytes());
    digest[..8].iter().map(|b| format!("{:02x}", b)).collect()
}

fn length_prefixed(s: &str) -> String {
    format!("{}:{}", s.len(), s)
}

fn month_scope(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

/// Default cache root: `<user cache dir>/prayer-times`.
pub fn default_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("prayer-times"))
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Open the cache at `dir` (or the default root), creating it if needed.
    ///
    /// Returns `None` with a warning when no usable directory exists;
    /// callers then run uncached.
    pub fn open(dir: Option<PathBuf>) -> Option<Self> {
        let Some(dir) = dir.or_else(default_cache_dir) else {
            tracing::warn!("cache disabled: cannot determine cache directory");
            return None;
        };
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!("cache disabled: cannot create {}: {}", dir.display(), e);
            return None;
        }
        Some(Self::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn day_path(&self, date: NaiveDate, params: &LookupParams) -> PathBuf {
        let key = cache_key(&date_key(date), params);
        self.dir.join(format!("{}{}.json", TIMINGS_PREFIX, key))
    }

    fn month_path(&self, year: i32, month: u32, params: &LookupParams) -> PathBuf {
        let key = cache_key(&month_scope(year, month), params);
        self.dir.join(format!("{}{}.json", CALENDAR_PREFIX, key))
    }

    fn geo_path(&self) -> PathBuf {
        self.dir.join(GEO_CACHE_FILE)
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!("cache miss {}: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_slice(&data) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!("ignoring corrupt cache file {}: {}", path.display(), e);
                None
            }
        }
    }

    fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec(value)?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path =
            path.with_file_name(format!("{}.{}{}", file_name, std::process::id(), TEMP_SUFFIX));

        fs::write(&temp_path, &data)?;
        if let Err(e) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }

    // --- Day timetables ---

    pub fn load_day(&self, date: NaiveDate, params: &LookupParams) -> Option<TimetableCacheEntry> {
        let path = self.day_path(date, params);
        let entry: TimetableCacheEntry = Self::read_json(&path)?;
        if entry.date != date_key(date) {
            tracing::debug!(
                "stale cache entry {}: holds {}, wanted {}",
                path.display(),
                entry.date,
                date
            );
            return None;
        }
        tracing::debug!("cache hit {}", path.display());
        Some(entry)
    }

    pub fn save_day(
        &self,
        date: NaiveDate,
        params: &LookupParams,
        day: &DayData,
    ) -> Result<(), AppError> {
        let entry = TimetableCacheEntry::new(date, params.calc, day);
        Self::write_json(&self.day_path(date, params), &entry)
    }

    // --- Month calendars ---

    pub fn load_month(
        &self,
        year: i32,
        month: u32,
        params: &LookupParams,
    ) -> Option<CalendarCacheEntry> {
        let path = self.month_path(year, month, params);
        let entry: CalendarCacheEntry = Self::read_json(&path)?;
        if entry.year != year || entry.month != month {
            tracing::debug!(
                "stale calendar entry {}: holds {}, wanted {}",
                path.display(),
                month_scope(entry.year, entry.month),
                month_scope(year, month)
            );
            return None;
        }
        tracing::debug!("cache hit {}", path.display());
        Some(entry)
    }

    pub fn save_month(
        &self,
        year: i32,
        month: u32,
        params: &LookupParams,
        days: &[DayData],
    ) -> Result<(), AppError> {
        let CalculationSettings { method, school } = params.calc;
        let entry = CalendarCacheEntry {
            year,
            month,
            method,
            school,
            days: days.to_vec(),
        };
        Self::write_json(&self.month_path(year, month, params), &entry)
    }

    // --- Geolocation ---

    pub fn load_geo(&self, now: DateTime<Utc>) -> Option<DetectedLocation> {
        let entry: GeoCacheEntry = Self::read_json(&self.geo_path())?;
        if now.signed_duration_since(entry.cached_at) >= TimeDelta::hours(GEO_TTL_HOURS) {
            tracing::debug!("geolocation cache expired (stored {})", entry.cached_at);
            return None;
        }
        Some(entry.location)
    }

    pub fn save_geo(&self, location: &DetectedLocation, now: DateTime<Utc>) -> Result<(), AppError> {
        let entry = GeoCacheEntry {
            location: location.clone(),
            cached_at: now,
        };
        Self::write_json(&self.geo_path(), &entry)
    }

    // --- Maintenance ---

    /// Delete every cache file this store owns, including temp files left
    /// by an interrupted save. Returns how many were removed.
    pub fn clear(&self) -> Result<usize, AppError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if is_owned(&name) && entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        tracing::debug!("removed {} cache files from {}", removed, self.dir.display());
        Ok(removed)
    }
}

/// Cache records and the temp files an interrupted save leaves behind.
fn is_owned(name: &str) -> bool {
    if name == GEO_CACHE_FILE {
        return true;
    }
    if name.starts_with(GEO_CACHE_FILE) {
        return name.ends_with(TEMP_SUFFIX);
    }
    (name.starts_with(TIMINGS_PREFIX) || name.starts_with(CALENDAR_PREFIX))
        && (name.ends_with(".json") || name.ends_with(TEMP_SUFFIX))
}
