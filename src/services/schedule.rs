//! Schedule resolution.
//!
//! Cache-first access to day and month timetables, and the next-prayer
//! state machine:
//!
//! ```text
//! Today ──found──▶ Found
//!   │ none left
//!   ▼
//! Rollover ──fetch ok, non-empty──▶ Found (tomorrow's first)
//!   │       ──fetch ok, empty─────▶ Unresolvable
//!   │ fetch failed
//!   ▼
//! TimeUnknown (today's last)  or the fetch error if today was empty
//! ```
//!
//! Cache writes are best-effort: a failed save logs a warning and the
//! fetched data is still returned.

use chrono::{DateTime, Local, NaiveDate, TimeDelta, Utc};
use chrono_tz::Tz;

use crate::cache::models::CalendarCacheEntry;
use crate::cache::{CacheStore, LookupParams};
use crate::errors::AppError;
use crate::services::aladhan::{days_in_month, year_month, CalculationSettings, DayData, TimetableProvider};
use crate::services::location::ResolvedLocation;
use crate::services::prayer::{next_prayer, parse_timings, parse_tz, Prayer, PrayerName};

/// Outcome of the next-prayer search.
#[derive(Debug, Clone, PartialEq)]
pub enum NextPrayer {
    Found(Prayer),
    /// Tomorrow could not be fetched; carries today's last prayer.
    TimeUnknown(Prayer),
}

/// One day's data in the location's timezone.
#[derive(Debug, Clone)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub tz: Tz,
    pub now: DateTime<Tz>,
    pub day: DayData,
    pub prayers: Vec<Prayer>,
}

#[derive(Debug, Clone)]
pub struct ScheduledDay {
    pub date: NaiveDate,
    pub day: DayData,
    pub prayers: Vec<Prayer>,
}

/// Consecutive days starting from today.
#[derive(Debug, Clone)]
pub struct MultiDaySchedule {
    pub tz: Tz,
    pub today: NaiveDate,
    pub days: Vec<ScheduledDay>,
}

pub struct ScheduleResolver<'a, P> {
    provider: &'a P,
    cache: Option<&'a CacheStore>,
    location: &'a ResolvedLocation,
    calc: CalculationSettings,
    params: LookupParams,
}

impl<'a, P: TimetableProvider> ScheduleResolver<'a, P> {
    pub fn new(
        provider: &'a P,
        cache: Option<&'a CacheStore>,
        location: &'a ResolvedLocation,
        calc: CalculationSettings,
    ) -> Self {
        Self {
            provider,
            cache,
            location,
            calc,
            params: location.lookup_params(calc),
        }
    }

    pub fn location(&self) -> &ResolvedLocation {
        self.location
    }

    // --- Cache-first fetches ---

    /// Raw timetable for one date.
    pub async fn day(&self, date: NaiveDate) -> Result<DayData, AppError> {
        if let Some(entry) = self.cache.and_then(|c| c.load_day(date, &self.params)) {
            return Ok(entry.into_day());
        }

        tracing::debug!("fetching timetable for {} ({})", date, self.location.label);
        let day = self.provider.fetch_day(date, self.location, self.calc).await?;

        if let Some(cache) = self.cache {
            if let Err(e) = cache.save_day(date, &self.params, &day) {
                tracing::warn!("failed to cache timetable for {}: {}", date, e);
            }
        }
        Ok(day)
    }

    /// Whole-month calendar.
    pub async fn month(&self, year: i32, month: u32) -> Result<CalendarCacheEntry, AppError> {
        if let Some(entry) = self.cache.and_then(|c| c.load_month(year, month, &self.params)) {
            return Ok(entry);
        }

        tracing::debug!("fetching calendar for {}-{:02} ({})", year, month, self.location.label);
        let days = self
            .provider
            .fetch_month(year, month, self.location, self.calc)
            .await?;

        if days_in_month(year, month) != Some(days.len() as u32) {
            tracing::warn!(
                "calendar for {}-{:02} returned {} days",
                year,
                month,
                days.len()
            );
        }

        if let Some(cache) = self.cache {
            if let Err(e) = cache.save_month(year, month, &self.params, &days) {
                tracing::warn!("failed to cache calendar for {}-{:02}: {}", year, month, e);
            }
        }

        Ok(CalendarCacheEntry {
            year,
            month,
            method: self.calc.method,
            school: self.calc.school,
            days,
        })
    }

    /// `count` consecutive days from `start`, fetching each month once.
    pub async fn days(&self, start: NaiveDate, count: u32) -> Result<Vec<(NaiveDate, DayData)>, AppError> {
        let dates: Vec<NaiveDate> = start.iter_days().take(count as usize).collect();

        let mut months: Vec<((i32, u32), CalendarCacheEntry)> = Vec::new();
        for date in &dates {
            let ym = year_month(*date);
            if !months.iter().any(|(key, _)| *key == ym) {
                let entry = self.month(ym.0, ym.1).await?;
                months.push((ym, entry));
            }
        }

        dates
            .into_iter()
            .map(|date| {
                let ym = year_month(date);
                let entry = months
                    .iter()
                    .find(|(key, _)| *key == ym)
                    .map(|(_, entry)| entry)
                    .ok_or_else(|| {
                        AppError::CacheCorrupt(format!("no calendar for {}-{:02}", ym.0, ym.1))
                    })?;
                Ok((date, entry.day(date)?.clone()))
            })
            .collect()
    }

    // --- Timezone and dates ---

    /// Today's date before the provider has told us the timezone.
    ///
    /// Without a hint the local zone is only a guess. On a cache miss for
    /// the guessed date, a cached neighbouring day's provider zone corrects
    /// it so the wrong date is never fetched.
    fn date_guess(&self, now: DateTime<Utc>) -> NaiveDate {
        if let Some(tz) = self.hint_tz() {
            return now.with_timezone(&tz).date_naive();
        }
        let guess = now.with_timezone(&Local).date_naive();
        match self.cached_zone_near(guess) {
            Some(tz) => now.with_timezone(&tz).date_naive(),
            None => guess,
        }
    }

    /// Provider zone of a cached day next to `date`, when `date` itself
    /// is not cached.
    fn cached_zone_near(&self, date: NaiveDate) -> Option<Tz> {
        let cache = self.cache?;
        if cache.load_day(date, &self.params).is_some() {
            return None;
        }
        [date.pred_opt(), date.succ_opt()]
            .into_iter()
            .flatten()
            .filter_map(|d| cache.load_day(d, &self.params))
            .find_map(|entry| parse_tz(&entry.meta.timezone).ok())
    }

    fn hint_tz(&self) -> Option<Tz> {
        let hint = self.location.timezone_hint.as_deref()?;
        match parse_tz(hint) {
            Ok(tz) => Some(tz),
            Err(e) => {
                tracing::warn!("ignoring timezone hint: {}", e);
                None
            }
        }
    }

    /// Location hint first, then the provider's reported zone.
    fn timezone(&self, day: &DayData) -> Result<Tz, AppError> {
        match self.hint_tz() {
            Some(tz) => Ok(tz),
            None => parse_tz(&day.meta.timezone),
        }
    }

    // --- Resolution ---

    /// Today's selected prayers in the location's timezone.
    pub async fn today(&self, now: DateTime<Utc>, selected: &[PrayerName]) -> Result<DaySchedule, AppError> {
        let mut date = self.date_guess(now);
        let mut day = self.day(date).await?;
        let tz = self.timezone(&day)?;
        let local_now = now.with_timezone(&tz);

        if local_now.date_naive() != date {
            tracing::debug!(
                "local date in {} is {}, not {}; refetching",
                tz,
                local_now.date_naive(),
                date
            );
            date = local_now.date_naive();
            day = self.day(date).await?;
        }

        let prayers = parse_timings(&day.timings, date, tz, selected)?;
        Ok(DaySchedule {
            date,
            tz,
            now: local_now,
            day,
            prayers,
        })
    }

    /// The next selected prayer after `now`, rolling over to tomorrow.
    pub async fn next(&self, now: DateTime<Utc>, selected: &[PrayerName]) -> Result<NextPrayer, AppError> {
        let today = self.today(now, selected).await?;
        if let Some(p) = next_prayer(&today.prayers, today.now) {
            return Ok(NextPrayer::Found(p.clone()));
        }

        let tomorrow = today
            .date
            .checked_add_signed(TimeDelta::days(1))
            .ok_or_else(|| AppError::Unresolvable(format!("no day after {}", today.date)))?;

        let day = match self.day(tomorrow).await {
            Ok(day) => day,
            Err(e) => {
                return match today.prayers.last() {
                    Some(last) => {
                        tracing::warn!("could not fetch {}: {}; showing last prayer", tomorrow, e);
                        Ok(NextPrayer::TimeUnknown(last.clone()))
                    }
                    None => Err(e),
                };
            }
        };

        parse_timings(&day.timings, tomorrow, today.tz, selected)?
            .into_iter()
            .next()
            .map(NextPrayer::Found)
            .ok_or_else(|| AppError::Unresolvable("no prayers selected".to_string()))
    }

    /// `count` days of selected prayers starting today.
    pub async fn upcoming(
        &self,
        now: DateTime<Utc>,
        count: u32,
        selected: &[PrayerName],
    ) -> Result<MultiDaySchedule, AppError> {
        if count == 0 {
            return Err(AppError::Config("number of days must be at least 1".to_string()));
        }

        let mut start = self.date_guess(now);
        let mut raw = self.days(start, count).await?;
        let tz = match raw.first() {
            Some((_, day)) => self.timezone(day)?,
            None => Tz::UTC,
        };

        let local_today = now.with_timezone(&tz).date_naive();
        if local_today != start {
            start = local_today;
            raw = self.days(start, count).await?;
        }

        let days = raw
            .into_iter()
            .map(|(date, day)| {
                let prayers = parse_timings(&day.timings, date, tz, selected)?;
                Ok(ScheduledDay { date, day, prayers })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(MultiDaySchedule {
            tz,
            today: start,
            days,
        })
    }
}
