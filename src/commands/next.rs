//! `next`: one status-bar line for the upcoming prayer.

use crate::commands::Context;
use crate::errors::AppError;
use crate::services::aladhan::TimetableProvider;
use crate::services::format::format_output;
use crate::services::geo::GeoLocator;
use crate::services::schedule::NextPrayer;

/// Shown in place of the time when tomorrow's timetable is unavailable.
const UNKNOWN_TIME: &str = "--:--";

/// Render the next prayer with `format`. No trailing newline.
pub async fn run<P: TimetableProvider, G: GeoLocator>(
    ctx: &Context<'_, P, G>,
    format: &str,
) -> Result<String, AppError> {
    let location = ctx.resolve_location().await?;
    let resolver = ctx.resolver(&location);

    match resolver.next(ctx.now, &ctx.config.prayers).await? {
        NextPrayer::Found(prayer) => {
            let now = ctx.now.with_timezone(&prayer.time.timezone());
            Ok(format_output(&prayer, now, format, ctx.config.time_format))
        }
        NextPrayer::TimeUnknown(prayer) => Ok(format!("{} {}", prayer.name, UNKNOWN_TIME)),
    }
}
