//! `config`: show, set and reset the settings file.

use std::path::Path;

use crate::commands::methods::method_name;
use crate::config::{Settings, VALID_KEYS};
use crate::errors::AppError;

const NOT_SET: &str = "(not set)";

fn school_label(raw: &str) -> String {
    match raw {
        "0" => "0 (Shafi)".to_string(),
        "1" => "1 (Hanafi)".to_string(),
        other => other.to_string(),
    }
}

fn method_label(raw: &str) -> String {
    match raw.parse::<u8>().ok().and_then(method_name) {
        Some(name) => format!("{} ({})", raw, name),
        None => raw.to_string(),
    }
}

pub fn show(path: &Path) -> Result<String, AppError> {
    let settings = Settings::load_from(path)?;

    let mut out = format!("  Configuration ({})\n\n", path.display());
    for key in VALID_KEYS {
        let raw = settings.get(key)?;
        let shown = match key {
            _ if raw.is_empty() => NOT_SET.to_string(),
            "method" => method_label(&raw),
            "school" => school_label(&raw),
            _ => raw,
        };
        out.push_str(&format!("  {:<14} {}\n", key, shown));
    }
    Ok(out)
}

pub fn set(path: &Path, key: &str, value: &str) -> Result<String, AppError> {
    let mut settings = Settings::load_from(path)?;
    settings.set(key, value)?;
    settings.save_to(path)?;
    tracing::info!("updated {} in {}", key, path.display());
    Ok(format!("Set {} = {}\n", key, value))
}

pub fn reset(path: &Path) -> Result<String, AppError> {
    Settings::reset_at(path)?;
    Ok("Configuration reset to defaults.\n".to_string())
}

pub fn path(path: &Path) -> String {
    format!("{}\n", path.display())
}
