//! `list`, `week` and `month`: a table of upcoming days.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::commands::table::Table;
use crate::commands::{long_date, short_date, to_json, Context, LocationJson};
use crate::errors::AppError;
use crate::services::aladhan::TimetableProvider;
use crate::services::geo::GeoLocator;
use crate::services::prayer::PrayerName;

#[derive(Debug, Serialize)]
struct ListJson {
    location: LocationJson,
    days: Vec<ListDayJson>,
}

#[derive(Debug, Serialize)]
struct ListDayJson {
    date: String,
    hijri: String,
    timings: BTreeMap<String, String>,
}

pub async fn run<P: TimetableProvider, G: GeoLocator>(
    ctx: &Context<'_, P, G>,
    days: u32,
) -> Result<String, AppError> {
    let location = ctx.resolve_location().await?;
    let selected = &ctx.config.prayers;
    let schedule = ctx
        .resolver(&location)
        .upcoming(ctx.now, days, selected)
        .await?;
    let tf = ctx.config.time_format;

    if ctx.json {
        let first = schedule
            .days
            .first()
            .map(|d| d.day.clone())
            .unwrap_or_default();
        let out = ListJson {
            location: LocationJson::new(&location, schedule.tz, &first),
            days: schedule
                .days
                .iter()
                .map(|d| ListDayJson {
                    date: long_date(d.date),
                    hijri: d.day.date.hijri.format(),
                    timings: d
                        .prayers
                        .iter()
                        .map(|p| (p.name.as_str().to_lowercase(), tf.render(&p.time)))
                        .collect(),
                })
                .collect(),
        };
        return to_json(&out);
    }

    let mut headers = vec!["Date".to_string()];
    headers.extend(selected_in_order(selected).map(|n| n.to_string()));
    let mut table = Table::new(headers);

    for (i, d) in schedule.days.iter().enumerate() {
        let mut row = vec![short_date(d.date)];
        row.extend(d.prayers.iter().map(|p| tf.render(&p.time)));
        table.add_row(row);
        if d.date == schedule.today {
            table.mark_row(i);
        }
    }

    let mut out = String::new();
    out.push_str(&format!("Prayer Times: {} Days\n\n", days));
    out.push_str(&format!("  {}\n\n", location.label));
    out.push_str(&table.render());
    Ok(out)
}

/// Selected names in canonical order, without duplicates.
pub(crate) fn selected_in_order(
    selected: &[PrayerName],
) -> impl Iterator<Item = PrayerName> + '_ {
    PrayerName::ALL
        .into_iter()
        .filter(move |n| selected.contains(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{utc_config, utc_geo};
    use crate::services::aladhan::Timings;
    use crate::services::schedule::tests::FakeProvider;
    use chrono::{TimeZone, Utc};

    fn timings(fajr: &str) -> Timings {
        Timings {
            fajr: fajr.into(),
            sunrise: "06:48".into(),
            dhuhr: "12:13".into(),
            asr: "15:02".into(),
            maghrib: "17:39".into(),
            isha: "19:10".into(),
            ..Default::default()
        }
    }

    fn provider() -> FakeProvider {
        FakeProvider::default()
            .with_month(2026, 2, timings("05:17"), "UTC")
            .with_month(2026, 3, timings("05:16"), "UTC")
    }

    #[tokio::test]
    async fn test_list_text_marks_today() {
        let mut cfg = utc_config();
        cfg.prayers = vec![PrayerName::Isha, PrayerName::Fajr];
        let provider = provider();
        let geo = utc_geo();
        let ctx = Context {
            config: &cfg,
            cache: None,
            provider: &provider,
            geo: &geo,
            now: Utc.with_ymd_and_hms(2026, 2, 28, 9, 0, 0).unwrap(),
            json: false,
        };

        let out = run(&ctx, 3).await.unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Prayer Times: 3 Days");
        assert_eq!(lines[2], "  Greenwich, United Kingdom");
        assert_eq!(lines[4], "  Date        Fajr   Isha");
        assert_eq!(lines[6], "> Sat 28 Feb  05:17  19:10");
        assert_eq!(lines[7], "  Sun 01 Mar  05:16  19:10");
        assert_eq!(lines.len(), 9);
        assert_eq!(*provider.month_calls.borrow(), vec![(2026, 2), (2026, 3)]);
    }

    #[tokio::test]
    async fn test_list_json() {
        let cfg = utc_config();
        let provider = provider();
        let geo = utc_geo();
        let ctx = Context {
            config: &cfg,
            cache: None,
            provider: &provider,
            geo: &geo,
            now: Utc.with_ymd_and_hms(2026, 2, 28, 9, 0, 0).unwrap(),
            json: true,
        };

        let v: serde_json::Value = serde_json::from_str(&run(&ctx, 2).await.unwrap()).unwrap();
        assert_eq!(v["location"]["timezone"], "UTC");
        let days = v["days"].as_array().unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0]["date"], "28 Feb 2026");
        assert_eq!(days[1]["date"], "01 Mar 2026");
        assert_eq!(days[1]["timings"]["fajr"], "05:16");
        assert_eq!(days[1]["timings"]["sunrise"], "06:48");
    }

    #[tokio::test]
    async fn test_list_fetch_failure() {
        let cfg = utc_config();
        let provider = FakeProvider::default().with_month(2026, 2, timings("05:17"), "UTC");
        let geo = utc_geo();
        let ctx = Context {
            config: &cfg,
            cache: None,
            provider: &provider,
            geo: &geo,
            now: Utc.with_ymd_and_hms(2026, 2, 28, 9, 0, 0).unwrap(),
            json: false,
        };

        assert!(matches!(run(&ctx, 7).await, Err(AppError::FetchFailed(_))));
    }
}
