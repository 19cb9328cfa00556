//! Output formatting for a resolved prayer.
//!
//! A mode is either one of the canned names below or, when it contains
//! `{{`, a template over six fields:
//!
//! | Tag              | Example   |
//! |------------------|-----------|
//! | `{{.Name}}`      | `Asr`     |
//! | `{{.ShortName}}` | `A`       |
//! | `{{.Time}}`      | `15:02`   |
//! | `{{.Remaining}}` | `2h 2m`   |
//! | `{{.Hours}}`     | `2`       |
//! | `{{.Minutes}}`   | `2`       |
//!
//! Template failures never propagate; they render as `template-err: ...`.

use chrono::{DateTime, TimeDelta};
use chrono_tz::Tz;
use std::str::FromStr;

use crate::errors::AppError;
use crate::services::prayer::{time_remaining, Prayer};

pub const FORMAT_TIME_REMAINING: &str = "time-remaining";
pub const FORMAT_NEXT_PRAYER_TIME: &str = "next-prayer-time";
pub const FORMAT_NAME_AND_TIME: &str = "name-and-time";
pub const FORMAT_NAME_AND_REMAINING: &str = "name-and-remaining";
pub const FORMAT_SHORT_NAME_AND_TIME: &str = "short-name-and-time";
pub const FORMAT_SHORT_NAME_AND_REMAINING: &str = "short-name-and-remaining";
pub const FORMAT_FULL: &str = "full";

/// 12h or 24h clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeFormat {
    #[default]
    H24,
    H12,
}

impl TimeFormat {
    pub fn layout(self) -> &'static str {
        match self {
            TimeFormat::H24 => "%H:%M",
            TimeFormat::H12 => "%-I:%M %p",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeFormat::H24 => "24h",
            TimeFormat::H12 => "12h",
        }
    }

    pub fn render(self, t: &DateTime<Tz>) -> String {
        t.format(self.layout()).to_string()
    }
}

impl FromStr for TimeFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "24h" => Ok(TimeFormat::H24),
            "12h" => Ok(TimeFormat::H12),
            other => Err(AppError::Config(format!(
                "time_format must be \"12h\" or \"24h\", got {:?}",
                other
            ))),
        }
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unclosed action at byte {0}")]
    Unclosed(usize),
    #[error("can't evaluate field {0:?}")]
    UnknownField(String),
    #[error("bad action {0:?}: expected {{{{.Field}}}}")]
    BadAction(String),
}

/// Values available to templates.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatData {
    pub name: String,
    pub short_name: String,
    pub time: String,
    pub remaining: String,
    pub hours: i64,
    pub minutes: i64,
}

impl FormatData {
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "Name" => Some(self.name.clone()),
            "ShortName" => Some(self.short_name.clone()),
            "Time" => Some(self.time.clone()),
            "Remaining" => Some(self.remaining.clone()),
            "Hours" => Some(self.hours.to_string()),
            "Minutes" => Some(self.minutes.to_string()),
            _ => None,
        }
    }
}

/// `"Hh Mm"` for an hour or more, `"Mm"` below that, `"0m"` when negative.
pub fn format_remaining(d: TimeDelta) -> String {
    if d < TimeDelta::zero() {
        return "0m".to_string();
    }
    let hours = d.num_hours();
    let minutes = d.num_minutes() % 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Render `prayer` relative to `now` according to `mode`.
pub fn format_output(prayer: &Prayer, now: DateTime<Tz>, mode: &str, time_format: TimeFormat) -> String {
    let d = time_remaining(prayer, now);
    let remaining = format_remaining(d);
    let time = time_format.render(&prayer.time);
    let name = prayer.name.as_str();
    let short = prayer.name.short_name();

    if mode.contains("{{") {
        let clamped = d.max(TimeDelta::zero());
        let data = FormatData {
            name: name.to_string(),
            short_name: short.to_string(),
            time,
            remaining,
            hours: clamped.num_hours(),
            minutes: clamped.num_minutes() % 60,
        };
        return render_template(mode, &data).unwrap_or_else(|e| format!("template-err: {}", e));
    }

    match mode {
        FORMAT_TIME_REMAINING => remaining,
        FORMAT_NEXT_PRAYER_TIME => time,
        FORMAT_NAME_AND_REMAINING => format!("{} {}", name, remaining),
        FORMAT_SHORT_NAME_AND_TIME => format!("{} {}", short, time),
        FORMAT_SHORT_NAME_AND_REMAINING => format!("{} {}", short, remaining),
        FORMAT_FULL => format!("{} {} ({})", name, time, remaining),
        // name-and-time, and anything unrecognised
        _ => format!("{} {}", name, time),
    }
}

/// Substitute `{{.Field}}` tags. Whitespace inside the braces is allowed.
pub fn render_template(template: &str, data: &FormatData) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let end = after_open
            .find("}}")
            .ok_or(TemplateError::Unclosed(offset + start))?;

        let action = after_open[..end].trim();
        let field = action
            .strip_prefix('.')
            .ok_or_else(|| TemplateError::BadAction(action.to_string()))?;
        let value = data
            .field(field)
            .ok_or_else(|| TemplateError::UnknownField(field.to_string()))?;
        out.push_str(&value);

        let consumed = start + 2 + end + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::prayer::PrayerName;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Tz> {
        Tz::UTC.with_ymd_and_hms(2026, 2, 28, h, m, 0).unwrap()
    }

    fn asr() -> Prayer {
        Prayer {
            name: PrayerName::Asr,
            time: at(15, 2),
        }
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(TimeDelta::zero()), "0m");
        assert_eq!(format_remaining(TimeDelta::minutes(45)), "45m");
        assert_eq!(format_remaining(TimeDelta::minutes(60)), "1h 0m");
        assert_eq!(format_remaining(TimeDelta::minutes(61)), "1h 1m");
        assert_eq!(format_remaining(TimeDelta::minutes(-5)), "0m");
        assert_eq!(format_remaining(TimeDelta::seconds(3599)), "59m");
    }

    #[test]
    fn test_canned_modes() {
        let p = asr();
        let now = at(13, 0);
        let cases = [
            (FORMAT_TIME_REMAINING, "2h 2m"),
            (FORMAT_NEXT_PRAYER_TIME, "15:02"),
            (FORMAT_NAME_AND_TIME, "Asr 15:02"),
            (FORMAT_NAME_AND_REMAINING, "Asr 2h 2m"),
            (FORMAT_SHORT_NAME_AND_TIME, "A 15:02"),
            (FORMAT_SHORT_NAME_AND_REMAINING, "A 2h 2m"),
            (FORMAT_FULL, "Asr 15:02 (2h 2m)"),
        ];
        for (mode, want) in cases {
            assert_eq!(format_output(&p, now, mode, TimeFormat::H24), want, "mode {}", mode);
        }
    }

    #[test]
    fn test_unknown_mode_falls_back_to_name_and_time() {
        assert_eq!(
            format_output(&asr(), at(13, 0), "bogus", TimeFormat::H24),
            "Asr 15:02"
        );
    }

    #[test]
    fn test_twelve_hour_layout() {
        assert_eq!(
            format_output(&asr(), at(13, 0), FORMAT_NEXT_PRAYER_TIME, TimeFormat::H12),
            "3:02 PM"
        );
        let fajr = Prayer {
            name: PrayerName::Fajr,
            time: at(5, 17),
        };
        assert_eq!(TimeFormat::H12.render(&fajr.time), "5:17 AM");
    }

    #[test]
    fn test_custom_template() {
        let out = format_output(
            &asr(),
            at(13, 0),
            "{{.ShortName}} in {{ .Remaining }} ({{.Hours}}h/{{.Minutes}}m) at {{.Time}}",
            TimeFormat::H24,
        );
        assert_eq!(out, "A in 2h 2m (2h/2m) at 15:02");
    }

    #[test]
    fn test_template_unknown_field() {
        let out = format_output(&asr(), at(13, 0), "{{.Bogus}}", TimeFormat::H24);
        assert!(out.starts_with("template-err:"), "got {}", out);
    }

    #[test]
    fn test_template_unclosed() {
        let out = format_output(&asr(), at(13, 0), "{{.Name", TimeFormat::H24);
        assert!(out.starts_with("template-err:"), "got {}", out);
    }

    #[test]
    fn test_template_bad_action() {
        let data = FormatData {
            name: "Asr".into(),
            short_name: "A".into(),
            time: "15:02".into(),
            remaining: "2h 2m".into(),
            hours: 2,
            minutes: 2,
        };
        assert_eq!(
            render_template("{{Name}}", &data),
            Err(TemplateError::BadAction("Name".into()))
        );
        assert_eq!(render_template("plain", &data).unwrap(), "plain");
    }

    #[test]
    fn test_template_past_prayer_clamps_to_zero() {
        let out = format_output(&asr(), at(16, 0), "{{.Hours}}:{{.Minutes}} {{.Remaining}}", TimeFormat::H24);
        assert_eq!(out, "0:0 0m");
    }

    #[test]
    fn test_time_format_from_str() {
        assert_eq!("12h".parse::<TimeFormat>().unwrap(), TimeFormat::H12);
        assert_eq!("24h".parse::<TimeFormat>().unwrap(), TimeFormat::H24);
        assert!("13h".parse::<TimeFormat>().is_err());
    }
}
