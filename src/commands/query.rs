//! `query <prayer>`: one prayer's time, today or over several days.

use serde::Serialize;

use crate::commands::table::Table;
use crate::commands::{long_date, short_date, to_json, Context, LocationJson};
use crate::errors::AppError;
use crate::services::aladhan::TimetableProvider;
use crate::services::geo::GeoLocator;
use crate::services::prayer::{Prayer, PrayerName};

#[derive(Debug, Serialize)]
struct QuerySingleJson {
    prayer: String,
    time: String,
    date: String,
    hijri: String,
}

#[derive(Debug, Serialize)]
struct QueryMultiJson {
    location: LocationJson,
    prayer: String,
    days: Vec<QueryDayJson>,
}

#[derive(Debug, Serialize)]
struct QueryDayJson {
    date: String,
    hijri: String,
    time: String,
}

/// A single day reads the day timetable; longer spans read month calendars.
pub async fn run<P: TimetableProvider, G: GeoLocator>(
    ctx: &Context<'_, P, G>,
    prayer: PrayerName,
    days: u32,
) -> Result<String, AppError> {
    if days == 1 {
        single_day(ctx, prayer).await
    } else {
        multi_day(ctx, prayer, days).await
    }
}

async fn single_day<P: TimetableProvider, G: GeoLocator>(
    ctx: &Context<'_, P, G>,
    prayer: PrayerName,
) -> Result<String, AppError> {
    let location = ctx.resolve_location().await?;
    let schedule = ctx.resolver(&location).today(ctx.now, &[prayer]).await?;
    let p = schedule
        .prayers
        .first()
        .ok_or_else(|| AppError::Unresolvable(format!("no timing found for {}", prayer)))?;
    let time = ctx.config.time_format.render(&p.time);

    if ctx.json {
        return to_json(&QuerySingleJson {
            prayer: prayer.as_str().to_lowercase(),
            time,
            date: long_date(schedule.date),
            hijri: schedule.day.date.hijri.format(),
        });
    }
    Ok(format!("{} {}\n", prayer, time))
}

async fn multi_day<P: TimetableProvider, G: GeoLocator>(
    ctx: &Context<'_, P, G>,
    prayer: PrayerName,
    days: u32,
) -> Result<String, AppError> {
    let location = ctx.resolve_location().await?;
    let schedule = ctx
        .resolver(&location)
        .upcoming(ctx.now, days, &[prayer])
        .await?;
    let tf = ctx.config.time_format;
    let time_of = |prayers: &[Prayer]| {
        prayers.first().map(|p| tf.render(&p.time)).unwrap_or_default()
    };

    if ctx.json {
        let first = schedule
            .days
            .first()
            .map(|d| d.day.clone())
            .unwrap_or_default();
        return to_json(&QueryMultiJson {
            location: LocationJson::new(&location, schedule.tz, &first),
            prayer: prayer.as_str().to_lowercase(),
            days: schedule
                .days
                .iter()
                .map(|d| QueryDayJson {
                    date: long_date(d.date),
                    hijri: d.day.date.hijri.format(),
                    time: time_of(&d.prayers),
                })
                .collect(),
        });
    }

    let mut table = Table::new(["Date".to_string(), prayer.to_string()]);
    for (i, d) in schedule.days.iter().enumerate() {
        table.add_row(vec![short_date(d.date), time_of(&d.prayers)]);
        if d.date == schedule.today {
            table.mark_row(i);
        }
    }

    let mut out = String::new();
    out.push_str(&format!("{} Times: {} Days\n\n", prayer, days));
    out.push_str(&format!("  {}\n\n", location.label));
    out.push_str(&table.render());
    Ok(out)
}
