//! Prayer names, time parsing and next-prayer selection.
//!
//! Provider times arrive as `"HH:MM"` strings, sometimes with a trailing
//! zone abbreviation (`"15:02 (BST)"`). They are anchored to a calendar date
//! and an IANA timezone to produce absolute instants. Everything here is
//! pure: no clock reads, no I/O.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, TimeZone};
use chrono_tz::Tz;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;
use crate::services::aladhan::Timings;

/// The eleven events the provider reports, in canonical chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PrayerName {
    Fajr,
    Sunrise,
    Dhuhr,
    Asr,
    Sunset,
    Maghrib,
    Isha,
    Imsak,
    Midnight,
    Firstthird,
    Lastthird,
}

impl PrayerName {
    pub const ALL: [PrayerName; 11] = [
        PrayerName::Fajr,
        PrayerName::Sunrise,
        PrayerName::Dhuhr,
        PrayerName::Asr,
        PrayerName::Sunset,
        PrayerName::Maghrib,
        PrayerName::Isha,
        PrayerName::Imsak,
        PrayerName::Midnight,
        PrayerName::Firstthird,
        PrayerName::Lastthird,
    ];

    /// Events tracked when the user selects nothing.
    pub const DEFAULT: [PrayerName; 6] = [
        PrayerName::Fajr,
        PrayerName::Sunrise,
        PrayerName::Dhuhr,
        PrayerName::Asr,
        PrayerName::Maghrib,
        PrayerName::Isha,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PrayerName::Fajr => "Fajr",
            PrayerName::Sunrise => "Sunrise",
            PrayerName::Dhuhr => "Dhuhr",
            PrayerName::Asr => "Asr",
            PrayerName::Sunset => "Sunset",
            PrayerName::Maghrib => "Maghrib",
            PrayerName::Isha => "Isha",
            PrayerName::Imsak => "Imsak",
            PrayerName::Midnight => "Midnight",
            PrayerName::Firstthird => "Firstthird",
            PrayerName::Lastthird => "Lastthird",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            PrayerName::Fajr => "F",
            PrayerName::Sunrise => "S",
            PrayerName::Dhuhr => "D",
            PrayerName::Asr => "A",
            PrayerName::Sunset => "St",
            PrayerName::Maghrib => "M",
            PrayerName::Isha => "I",
            PrayerName::Imsak => "Im",
            PrayerName::Midnight => "Mi",
            PrayerName::Firstthird => "F3",
            PrayerName::Lastthird => "L3",
        }
    }
}

impl fmt::Display for PrayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrayerName {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        PrayerName::ALL
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| AppError::UnknownPrayer(trimmed.to_string()))
    }
}

/// Parse a comma-separated prayer list such as `"Fajr, Asr,isha"`.
/// Empty items are skipped.
pub fn parse_prayer_list(raw: &str) -> Result<Vec<PrayerName>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PrayerName::from_str)
        .collect()
}

/// A named event anchored to an absolute instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prayer {
    pub name: PrayerName,
    pub time: DateTime<Tz>,
}

/// Parse a provider time string onto `date` in `tz`.
///
/// Hour and minute are only required to be integers; out-of-range values
/// roll over onto neighbouring days or hours. A local time falling into a
/// DST gap is shifted forward by one hour.
pub fn parse_time_str(raw: &str, date: NaiveDate, tz: Tz) -> Result<DateTime<Tz>, AppError> {
    let malformed = |reason: &str| AppError::MalformedTime {
        raw: raw.to_string(),
        reason: reason.to_string(),
    };

    let token = raw.split_whitespace().next().unwrap_or("");
    let parts: Vec<&str> = token.split(':').collect();
    if parts.len() != 2 {
        return Err(malformed("expected HH:MM"));
    }

    let hour: i64 = parts[0].parse().map_err(|_| malformed("invalid hour"))?;
    let minute: i64 = parts[1].parse().map_err(|_| malformed("invalid minute"))?;

    let offset = TimeDelta::try_hours(hour)
        .zip(TimeDelta::try_minutes(minute))
        .and_then(|(h, m)| h.checked_add(&m))
        .ok_or_else(|| malformed("out of range"))?;

    let midnight: NaiveDateTime = date.and_hms_opt(0, 0, 0).ok_or_else(|| malformed("invalid date"))?;
    let local = midnight
        .checked_add_signed(offset)
        .ok_or_else(|| malformed("out of range"))?;

    if let Some(t) = tz.from_local_datetime(&local).earliest() {
        return Ok(t);
    }

    // Nonexistent local time (spring-forward gap).
    local
        .checked_add_signed(TimeDelta::hours(1))
        .and_then(|shifted| tz.from_local_datetime(&shifted).earliest())
        .ok_or_else(|| malformed("local time does not exist in timezone"))
}

/// Build the ordered prayer list for one day.
///
/// Output follows canonical order regardless of the order of `selected`;
/// duplicates in `selected` are ignored.
pub fn parse_timings(
    timings: &Timings,
    date: NaiveDate,
    tz: Tz,
    selected: &[PrayerName],
) -> Result<Vec<Prayer>, AppError> {
    PrayerName::ALL
        .into_iter()
        .filter(|name| selected.contains(name))
        .map(|name| {
            let time = parse_time_str(timings.get(name), date, tz)?;
            Ok(Prayer { name, time })
        })
        .collect()
}

/// First prayer strictly after `now`. An event at exactly `now` has passed.
pub fn next_prayer<'a>(prayers: &'a [Prayer], now: DateTime<Tz>) -> Option<&'a Prayer> {
    prayers.iter().find(|p| p.time > now)
}

/// Last prayer at or before `now`.
pub fn current_prayer<'a>(prayers: &'a [Prayer], now: DateTime<Tz>) -> Option<&'a Prayer> {
    prayers.iter().rev().find(|p| p.time <= now)
}

pub fn time_remaining(prayer: &Prayer, now: DateTime<Tz>) -> TimeDelta {
    prayer.time.signed_duration_since(now)
}

/// Resolve an IANA timezone name.
pub fn parse_tz(name: &str) -> Result<Tz, AppError> {
    name.parse::<Tz>()
        .map_err(|_| AppError::InvalidTimezone(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::aladhan::tests::sample_timings;
    use chrono::Timelike;

    fn feb28() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<Tz> {
        Tz::UTC.with_ymd_and_hms(2026, 2, 28, h, m, 0).unwrap()
    }

    #[test]
    fn test_parse_time_str_basic() {
        let t = parse_time_str("15:02", feb28(), Tz::UTC).unwrap();
        assert_eq!(t, at(15, 2));
    }

    #[test]
    fn test_parse_time_str_ignores_zone_suffix() {
        let bare = parse_time_str("15:02", feb28(), Tz::Europe__London).unwrap();
        let suffixed = parse_time_str("  15:02 (BST)  ", feb28(), Tz::Europe__London).unwrap();
        assert_eq!(bare, suffixed);
    }

    #[test]
    fn test_parse_time_str_round_trips_fields() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 4).unwrap();
        let t = parse_time_str("04:37", date, Tz::Asia__Riyadh).unwrap();
        assert_eq!(t.date_naive(), date);
        assert_eq!((t.hour(), t.minute(), t.second()), (4, 37, 0));
        assert_eq!(t.timezone(), Tz::Asia__Riyadh);
    }

    #[test]
    fn test_parse_time_str_rejects_malformed() {
        for raw in ["", "1502", "15:02:00", "ab:cd", "15:xx", "15.02", ":"] {
            let err = parse_time_str(raw, feb28(), Tz::UTC).unwrap_err();
            assert!(
                matches!(err, AppError::MalformedTime { .. }),
                "{:?} gave {:?}",
                raw,
                err
            );
        }
    }

    #[test]
    fn test_parse_time_str_out_of_range_rolls_over() {
        let t = parse_time_str("24:30", feb28(), Tz::UTC).unwrap();
        assert_eq!(t, Tz::UTC.with_ymd_and_hms(2026, 3, 1, 0, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_time_str_dst_gap_shifts_forward() {
        // Europe/London springs forward at 01:00 on 2026-03-29.
        let date = NaiveDate::from_ymd_opt(2026, 3, 29).unwrap();
        let t = parse_time_str("01:30", date, Tz::Europe__London).unwrap();
        assert_eq!((t.hour(), t.minute()), (2, 30));
    }

    #[test]
    fn test_prayer_name_from_str_case_insensitive() {
        assert_eq!("asr".parse::<PrayerName>().unwrap(), PrayerName::Asr);
        assert_eq!(" FIRSTTHIRD ".parse::<PrayerName>().unwrap(), PrayerName::Firstthird);
        assert!(matches!(
            "Zuhr".parse::<PrayerName>(),
            Err(AppError::UnknownPrayer(_))
        ));
    }

    #[test]
    fn test_short_names() {
        let shorts: Vec<&str> = PrayerName::ALL.iter().map(|p| p.short_name()).collect();
        assert_eq!(
            shorts,
            vec!["F", "S", "D", "A", "St", "M", "I", "Im", "Mi", "F3", "L3"]
        );
    }

    #[test]
    fn test_parse_prayer_list() {
        let list = parse_prayer_list("Fajr, asr,,Isha ").unwrap();
        assert_eq!(list, vec![PrayerName::Fajr, PrayerName::Asr, PrayerName::Isha]);
        assert!(parse_prayer_list("Fajr,Bogus").is_err());
    }

    #[test]
    fn test_parse_timings_canonical_order() {
        let selected = [PrayerName::Isha, PrayerName::Fajr, PrayerName::Asr];
        let prayers = parse_timings(&sample_timings(), feb28(), Tz::UTC, &selected).unwrap();
        let names: Vec<PrayerName> = prayers.iter().map(|p| p.name).collect();
        assert_eq!(names, vec![PrayerName::Fajr, PrayerName::Asr, PrayerName::Isha]);
        assert_eq!(prayers[0].time, at(5, 17));
    }

    #[test]
    fn test_parse_timings_default_is_monotonic() {
        let prayers =
            parse_timings(&sample_timings(), feb28(), Tz::UTC, &PrayerName::DEFAULT).unwrap();
        assert_eq!(prayers.len(), 6);
        assert!(prayers.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn test_parse_timings_malformed_propagates() {
        let mut timings = sample_timings();
        timings.asr = "garbage".into();
        let err = parse_timings(&timings, feb28(), Tz::UTC, &PrayerName::DEFAULT).unwrap_err();
        assert!(matches!(err, AppError::MalformedTime { .. }));
    }

    #[test]
    fn test_next_prayer() {
        let prayers =
            parse_timings(&sample_timings(), feb28(), Tz::UTC, &PrayerName::DEFAULT).unwrap();
        assert_eq!(next_prayer(&prayers, at(13, 0)).unwrap().name, PrayerName::Asr);
        assert_eq!(next_prayer(&prayers, at(0, 0)).unwrap().name, PrayerName::Fajr);
        assert!(next_prayer(&prayers, at(22, 0)).is_none());
    }

    #[test]
    fn test_next_prayer_exact_match_is_passed() {
        let prayers =
            parse_timings(&sample_timings(), feb28(), Tz::UTC, &PrayerName::DEFAULT).unwrap();
        assert_eq!(next_prayer(&prayers, at(15, 2)).unwrap().name, PrayerName::Maghrib);
        assert!(next_prayer(&prayers, at(19, 10)).is_none());
    }

    #[test]
    fn test_current_prayer() {
        let prayers =
            parse_timings(&sample_timings(), feb28(), Tz::UTC, &PrayerName::DEFAULT).unwrap();
        assert!(current_prayer(&prayers, at(4, 0)).is_none());
        assert_eq!(current_prayer(&prayers, at(15, 2)).unwrap().name, PrayerName::Asr);
        assert_eq!(current_prayer(&prayers, at(23, 0)).unwrap().name, PrayerName::Isha);
    }

    #[test]
    fn test_time_remaining() {
        let p = Prayer {
            name: PrayerName::Asr,
            time: at(15, 2),
        };
        assert_eq!(time_remaining(&p, at(13, 0)), TimeDelta::minutes(122));
        assert_eq!(time_remaining(&p, at(16, 2)), TimeDelta::minutes(-60));
    }

    #[test]
    fn test_parse_tz() {
        assert_eq!(parse_tz("Europe/London").unwrap(), Tz::Europe__London);
        assert!(matches!(parse_tz("Mars/Olympus"), Err(AppError::InvalidTimezone(_))));
    }
}
