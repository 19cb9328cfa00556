//! `today` (the default command): the day's schedule with current and next.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::commands::{long_date, to_json, Context, LocationJson};
use crate::errors::AppError;
use crate::services::aladhan::{DayData, TimetableProvider};
use crate::services::format::format_remaining;
use crate::services::geo::GeoLocator;
use crate::services::prayer::{current_prayer, next_prayer, time_remaining};

#[derive(Debug, Serialize)]
struct TodayJson {
    location: LocationJson,
    date: DateJson,
    timings: BTreeMap<String, String>,
    current: Option<String>,
    next: Option<NextJson>,
}

#[derive(Debug, Serialize)]
struct DateJson {
    gregorian: String,
    hijri: String,
}

#[derive(Debug, Serialize)]
struct NextJson {
    prayer: String,
    time: String,
    remaining: String,
}

/// Gregorian date as the provider spells it, else from `date`.
fn gregorian_label(date: NaiveDate, day: &DayData) -> String {
    let g = &day.date.gregorian;
    if !g.day.is_empty() && !g.month.en.is_empty() && !g.year.is_empty() {
        format!("{} {} {}", g.day, g.month.en, g.year)
    } else {
        long_date(date)
    }
}

pub async fn run<P: TimetableProvider, G: GeoLocator>(
    ctx: &Context<'_, P, G>,
) -> Result<String, AppError> {
    let location = ctx.resolve_location().await?;
    let schedule = ctx
        .resolver(&location)
        .today(ctx.now, &ctx.config.prayers)
        .await?;

    let tf = ctx.config.time_format;
    let current = current_prayer(&schedule.prayers, schedule.now);
    let next = next_prayer(&schedule.prayers, schedule.now);
    let gregorian = gregorian_label(schedule.date, &schedule.day);
    let hijri = schedule.day.date.hijri.format();

    if ctx.json {
        let out = TodayJson {
            location: LocationJson::new(&location, schedule.tz, &schedule.day),
            date: DateJson { gregorian, hijri },
            timings: schedule
                .prayers
                .iter()
                .map(|p| (p.name.as_str().to_lowercase(), tf.render(&p.time)))
                .collect(),
            current: current.map(|p| p.name.as_str().to_lowercase()),
            next: next.map(|p| NextJson {
                prayer: p.name.as_str().to_lowercase(),
                time: tf.render(&p.time),
                remaining: format_remaining(time_remaining(p, schedule.now)),
            }),
        };
        return to_json(&out);
    }

    let mut out = String::new();
    out.push_str("Prayer Times\n\n");
    out.push_str(&format!("  {}\n", location.label));
    out.push_str(&format!("  {}\n", schedule.tz.name()));
    out.push_str(&format!("  {}\n", gregorian));
    if !hijri.is_empty() {
        out.push_str(&format!("  {}\n", hijri));
    }
    out.push('\n');

    let width = schedule
        .prayers
        .iter()
        .map(|p| p.name.as_str().len())
        .max()
        .unwrap_or(0);

    for p in &schedule.prayers {
        let mut line = format!("  {:<width$}  {}", p.name.as_str(), tf.render(&p.time), width = width);
        if next.is_some_and(|n| n.name == p.name) {
            let remaining = format_remaining(time_remaining(p, schedule.now));
            line.push_str(&format!("  <- next in {}", remaining));
        } else if current.is_some_and(|c| c.name == p.name) {
            line.push_str("  <- now");
        }
        out.push_str(&line);
        out.push('\n');
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{utc_config, utc_geo};
    use crate::services::aladhan::tests::sample_timings;
    use crate::services::aladhan::HijriMonth;
    use crate::services::schedule::tests::FakeProvider;
    use chrono::{TimeZone, Utc};

    fn provider() -> FakeProvider {
        let date = NaiveDate::from_ymd_opt(2026, 2, 28).unwrap();
        let mut p = FakeProvider::default().with_day(date, sample_timings(), "UTC");
        let day = p.days.get_mut(&date).unwrap();
        day.date.hijri.day = "10".into();
        day.date.hijri.month = HijriMonth {
            number: 9,
            en: "Ramadan".into(),
            ar: String::new(),
        };
        day.date.hijri.year = "1447".into();
        day.meta.latitude = 51.4779;
        day.meta.longitude = -0.0015;
        p
    }

    #[tokio::test]
    async fn test_today_text() {
        let cfg = utc_config();
        let provider = provider();
        let geo = utc_geo();
        let ctx = Context {
            config: &cfg,
            cache: None,
            provider: &provider,
            geo: &geo,
            now: Utc.with_ymd_and_hms(2026, 2, 28, 13, 0, 0).unwrap(),
            json: false,
        };

        let out = run(&ctx).await.unwrap();
        assert!(out.contains("  Greenwich, United Kingdom\n"));
        assert!(out.contains("  UTC\n"));
        assert!(out.contains("  28 Feb 2026\n"));
        assert!(out.contains("  10 Ramadan 1447 AH\n"));
        assert!(out.contains("  Dhuhr    12:13  <- now\n"));
        assert!(out.contains("  Asr      15:02  <- next in 2h 2m\n"));
        assert!(out.contains("  Fajr     05:17\n"));
    }

    #[tokio::test]
    async fn test_today_json() {
        let cfg = utc_config();
        let provider = provider();
        let geo = utc_geo();
        let ctx = Context {
            config: &cfg,
            cache: None,
            provider: &provider,
            geo: &geo,
            now: Utc.with_ymd_and_hms(2026, 2, 28, 13, 0, 0).unwrap(),
            json: true,
        };

        let out = run(&ctx).await.unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["location"]["timezone"], "UTC");
        assert_eq!(v["location"]["latitude"], 51.4779);
        assert_eq!(v["date"]["hijri"], "10 Ramadan 1447 AH");
        assert_eq!(v["timings"]["asr"], "15:02");
        assert_eq!(v["timings"].as_object().unwrap().len(), 6);
        assert_eq!(v["current"], "dhuhr");
        assert_eq!(v["next"]["prayer"], "asr");
        assert_eq!(v["next"]["remaining"], "2h 2m");
    }

    #[tokio::test]
    async fn test_today_json_after_last_prayer() {
        let cfg = utc_config();
        let provider = provider();
        let geo = utc_geo();
        let ctx = Context {
            config: &cfg,
            cache: None,
            provider: &provider,
            geo: &geo,
            now: Utc.with_ymd_and_hms(2026, 2, 28, 23, 0, 0).unwrap(),
            json: true,
        };

        let v: serde_json::Value = serde_json::from_str(&run(&ctx).await.unwrap()).unwrap();
        assert_eq!(v["current"], "isha");
        assert!(v["next"].is_null());
    }

    #[test]
    fn test_gregorian_label_prefers_provider() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 28).unwrap();
        let mut day = DayData::default();
        assert_eq!(gregorian_label(date, &day), "28 Feb 2026");
        day.date.gregorian.day = "28".into();
        day.date.gregorian.month.en = "February".into();
        day.date.gregorian.year = "2026".into();
        assert_eq!(gregorian_label(date, &day), "28 February 2026");
    }
}
