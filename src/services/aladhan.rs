//! Al Adhan prayer-times API client.
//!
//! Fetches single-day timetables and whole-month calendars, by coordinates
//! or by city/country. See: https://aladhan.com/prayer-times-api

use chrono::{Datelike, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::AppError;
use crate::services::location::{LocationMode, ResolvedLocation};
use crate::services::prayer::PrayerName;

pub const DEFAULT_API_URL: &str = "https://api.aladhan.com/v1";

/// Calculation parameters forwarded to the provider.
///
/// `None` means "let the provider choose" and is left out of the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalculationSettings {
    pub method: Option<u8>,
    pub school: Option<u8>,
}

/// Source of raw day timetables. Implemented by [`AladhanClient`]; tests
/// substitute in-memory fakes.
pub trait TimetableProvider {
    /// Fetch the timetable for one calendar day.
    async fn fetch_day(
        &self,
        date: NaiveDate,
        location: &ResolvedLocation,
        calc: CalculationSettings,
    ) -> Result<DayData, AppError>;

    /// Fetch every day of a calendar month, ordered by day of month.
    async fn fetch_month(
        &self,
        year: i32,
        month: u32,
        location: &ResolvedLocation,
        calc: CalculationSettings,
    ) -> Result<Vec<DayData>, AppError>;
}

// --- Al Adhan JSON response types ---

/// Prayer and event times as `HH:MM` strings, sometimes suffixed with a
/// timezone abbreviation such as `"15:02 (BST)"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timings {
    #[serde(rename = "Fajr", default)]
    pub fajr: String,
    #[serde(rename = "Sunrise", default)]
    pub sunrise: String,
    #[serde(rename = "Dhuhr", default)]
    pub dhuhr: String,
    #[serde(rename = "Asr", default)]
    pub asr: String,
    #[serde(rename = "Sunset", default)]
    pub sunset: String,
    #[serde(rename = "Maghrib", default)]
    pub maghrib: String,
    #[serde(rename = "Isha", default)]
    pub isha: String,
    #[serde(rename = "Imsak", default)]
    pub imsak: String,
    #[serde(rename = "Midnight", default)]
    pub midnight: String,
    #[serde(rename = "Firstthird", default)]
    pub firstthird: String,
    #[serde(rename = "Lastthird", default)]
    pub lastthird: String,
}

impl Timings {
    /// Raw time string for a named event.
    pub fn get(&self, name: PrayerName) -> &str {
        match name {
            PrayerName::Fajr => &self.fajr,
            PrayerName::Sunrise => &self.sunrise,
            PrayerName::Dhuhr => &self.dhuhr,
            PrayerName::Asr => &self.asr,
            PrayerName::Sunset => &self.sunset,
            PrayerName::Maghrib => &self.maghrib,
            PrayerName::Isha => &self.isha,
            PrayerName::Imsak => &self.imsak,
            PrayerName::Midnight => &self.midnight,
            PrayerName::Firstthird => &self.firstthird,
            PrayerName::Lastthird => &self.lastthird,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateInfo {
    pub readable: String,
    pub timestamp: String,
    pub hijri: HijriDate,
    pub gregorian: GregorianDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HijriDate {
    /// e.g. "10-08-1447"
    pub date: String,
    pub day: String,
    pub month: HijriMonth,
    pub year: String,
    pub designation: Designation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HijriMonth {
    pub number: u32,
    pub en: String,
    pub ar: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Designation {
    pub abbreviated: String,
    pub expanded: String,
}

impl HijriDate {
    /// Render as `"DD MonthName YYYY AH"`, or an empty string when the
    /// provider left any part out.
    pub fn format(&self) -> String {
        if self.day.is_empty() || self.month.en.is_empty() || self.year.is_empty() {
            return String::new();
        }
        let abbr = if self.designation.abbreviated.is_empty() {
            "AH"
        } else {
            &self.designation.abbreviated
        };
        format!("{} {} {} {}", self.day, self.month.en, self.year, abbr)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GregorianDate {
    /// e.g. "28-02-2026"
    pub date: String,
    pub day: String,
    pub weekday: Weekday,
    pub month: GregorianMonth,
    pub year: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weekday {
    pub en: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GregorianMonth {
    pub number: u32,
    pub en: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub method: MethodInfo,
    pub school: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodInfo {
    pub id: i64,
    pub name: String,
}

/// One day of provider data: timings plus date and request metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayData {
    pub timings: Timings,
    #[serde(default)]
    pub date: DateInfo,
    #[serde(default)]
    pub meta: Meta,
}

#[derive(Debug, Deserialize)]
struct DailyResponse {
    code: u16,
    #[serde(default)]
    status: String,
    data: DayData,
}

#[derive(Debug, Deserialize)]
struct CalendarResponse {
    code: u16,
    #[serde(default)]
    status: String,
    data: Vec<DayData>,
}

/// Client for the Al Adhan API.
#[derive(Debug, Clone)]
pub struct AladhanClient {
    client: reqwest::Client,
    base_url: String,
}

impl AladhanClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Endpoint suffix and query parameters for a location.
    fn location_params(
        location: &ResolvedLocation,
        calc: CalculationSettings,
    ) -> (&'static str, Vec<(&'static str, String)>) {
        let (suffix, mut params) = match location.mode {
            LocationMode::NamedPlace => (
                "ByCity",
                vec![
                    ("city", location.place.clone()),
                    ("country", location.country.clone()),
                ],
            ),
            LocationMode::Coordinates => (
                "",
                vec![
                    ("latitude", format!("{:.6}", location.latitude)),
                    ("longitude", format!("{:.6}", location.longitude)),
                ],
            ),
        };
        if let Some(method) = calc.method {
            params.push(("method", method.to_string()));
        }
        if let Some(school) = calc.school {
            params.push(("school", school.to_string()));
        }
        (suffix, params)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, AppError> {
        tracing::debug!("Al Adhan request: {} {:?}", url, params);

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| AppError::FetchFailed(format!("Al Adhan request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::FetchFailed(format!(
                "Al Adhan returned HTTP {}: {}",
                status, body
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::FetchFailed(format!("Al Adhan JSON parse error: {}", e)))
    }
}

impl TimetableProvider for AladhanClient {
    async fn fetch_day(
        &self,
        date: NaiveDate,
        location: &ResolvedLocation,
        calc: CalculationSettings,
    ) -> Result<DayData, AppError> {
        let (suffix, params) = Self::location_params(location, calc);
        let url = format!(
            "{}/timings{}/{}",
            self.base_url,
            suffix,
            date.format("%d-%m-%Y")
        );

        let resp: DailyResponse = self.get_json(&url, &params).await?;
        if resp.code != 200 {
            return Err(AppError::FetchFailed(format!(
                "Al Adhan error: code={} status={}",
                resp.code, resp.status
            )));
        }
        Ok(resp.data)
    }

    async fn fetch_month(
        &self,
        year: i32,
        month: u32,
        location: &ResolvedLocation,
        calc: CalculationSettings,
    ) -> Result<Vec<DayData>, AppError> {
        let (suffix, params) = Self::location_params(location, calc);
        let url = format!("{}/calendar{}/{}/{}", self.base_url, suffix, year, month);

        let resp: CalendarResponse = self.get_json(&url, &params).await?;
        if resp.code != 200 {
            return Err(AppError::FetchFailed(format!(
                "Al Adhan error: code={} status={}",
                resp.code, resp.status
            )));
        }
        Ok(resp.data)
    }
}

/// Number of days in a calendar month, or `None` for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(next.signed_duration_since(first).num_days() as u32)
}

/// `(year, month)` of a date.
pub fn year_month(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}
