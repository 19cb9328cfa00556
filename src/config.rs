//! Configuration.
//!
//! Three layers, highest priority first:
//!
//! 1. command-line flags ([`Overrides`])
//! 2. the JSON settings file ([`Settings`])
//! 3. built-in defaults
//!
//! [`EffectiveConfig::merge`] folds them into one value that is passed to
//! command handlers. Process-level settings (endpoints, timeout, config file
//! location) come from the environment via [`AppConfig::from_env`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::AppError;
use crate::services::aladhan::{CalculationSettings, DEFAULT_API_URL};
use crate::services::format::TimeFormat;
use crate::services::geo::DEFAULT_GEO_URL;
use crate::services::location::LocationInput;
use crate::services::prayer::{parse_prayer_list, PrayerName};

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const CONFIG_DIR_NAME: &str = "prayer-times";
const CONFIG_FILE_NAME: &str = "config.json";

/// Keys accepted by `config set`.
pub const VALID_KEYS: [&str; 9] = [
    "city",
    "country",
    "latitude",
    "longitude",
    "method",
    "school",
    "time_format",
    "prayers",
    "cache_dir",
];

/// Process configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub geo_url: String,
    /// Explicit settings file; otherwise the platform config dir is used.
    pub config_path: Option<PathBuf>,
    pub http_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let http_timeout_secs = match std::env::var("PRAYER_TIMES_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    "PRAYER_TIMES_HTTP_TIMEOUT_SECS={:?} is not a number, using {}",
                    raw,
                    DEFAULT_HTTP_TIMEOUT_SECS
                );
                DEFAULT_HTTP_TIMEOUT_SECS
            }),
            Err(_) => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Self {
            api_url: std::env::var("PRAYER_TIMES_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            geo_url: std::env::var("PRAYER_TIMES_GEO_URL")
                .unwrap_or_else(|_| DEFAULT_GEO_URL.to_string()),
            config_path: std::env::var_os("PRAYER_TIMES_CONFIG").map(PathBuf::from),
            http_timeout: Duration::from_secs(http_timeout_secs),
        }
    }

    /// Location of the settings file.
    pub fn settings_path(&self) -> Result<PathBuf, AppError> {
        if let Some(path) = &self.config_path {
            return Ok(path.clone());
        }
        dirs::config_dir()
            .map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or_else(|| AppError::Config("cannot determine config directory".to_string()))
    }
}

// --- Settings file ---

/// Persistent user settings. Every field is optional; unset means "use the
/// default" (or auto-detect, for location).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_format: Option<String>,
    /// Comma-separated prayer names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prayers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,
}

impl Settings {
    /// Read settings. A missing file is an empty config.
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no config file at {}", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&data)
            .map_err(|e| AppError::Config(format!("invalid config file {}: {}", path.display(), e)))
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let mut data = serde_json::to_vec_pretty(self)?;
        data.push(b'\n');
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Delete the settings file. Deleting a missing file succeeds.
    pub fn reset_at(path: &Path) -> Result<(), AppError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Validate and store one key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        let value = value.trim();
        match key {
            "city" => self.city = Some(value.to_string()),
            "country" => self.country = Some(value.to_string()),
            "latitude" => self.latitude = Some(parse_bounded("latitude", value, 90.0)?),
            "longitude" => self.longitude = Some(parse_bounded("longitude", value, 180.0)?),
            "method" => {
                let v: u8 = value.parse().map_err(|_| {
                    AppError::Config(format!("invalid method {:?}: must be an integer", value))
                })?;
                if v > 23 {
                    return Err(AppError::Config(format!(
                        "invalid method {:?}: must be between 0 and 23",
                        value
                    )));
                }
                self.method = Some(v);
            }
            "school" => {
                let v = match value {
                    "0" => 0,
                    "1" => 1,
                    _ => {
                        return Err(AppError::Config(format!(
                            "invalid school {:?}: must be 0 (Shafi) or 1 (Hanafi)",
                            value
                        )))
                    }
                };
                self.school = Some(v);
            }
            "time_format" => {
                let tf: TimeFormat = value.parse()?;
                self.time_format = Some(tf.as_str().to_string());
            }
            "prayers" => {
                let names = parse_prayer_list(value)
                    .map_err(|e| AppError::Config(format!("invalid prayers list: {}", e)))?;
                if names.is_empty() {
                    return Err(AppError::Config("prayers list is empty".to_string()));
                }
                self.prayers = Some(value.to_string());
            }
            "cache_dir" => self.cache_dir = Some(value.to_string()),
            _ => {
                return Err(AppError::Config(format!(
                    "unknown config key {:?}; valid keys: {}",
                    key,
                    VALID_KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }

    /// Display value of one key; empty when unset.
    pub fn get(&self, key: &str) -> Result<String, AppError> {
        fn show<T: ToString>(v: &Option<T>) -> String {
            v.as_ref().map(ToString::to_string).unwrap_or_default()
        }
        Ok(match key {
            "city" => show(&self.city),
            "country" => show(&self.country),
            "latitude" => show(&self.latitude),
            "longitude" => show(&self.longitude),
            "method" => show(&self.method),
            "school" => show(&self.school),
            "time_format" => show(&self.time_format),
            "prayers" => show(&self.prayers),
            "cache_dir" => show(&self.cache_dir),
            _ => return Err(AppError::Config(format!("unknown config key {:?}", key))),
        })
    }
}

fn parse_bounded(name: &str, value: &str, limit: f64) -> Result<f64, AppError> {
    let v: f64 = value
        .parse()
        .map_err(|_| AppError::Config(format!("invalid {} {:?}: must be a number", name, value)))?;
    if !v.is_finite() || v < -limit || v > limit {
        return Err(AppError::Config(format!(
            "invalid {} {:?}: must be between -{} and {}",
            name, value, limit, limit
        )));
    }
    Ok(v)
}

// --- Merge ---

/// Values given on the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub method: Option<u8>,
    pub school: Option<u8>,
    pub time_format: Option<TimeFormat>,
    pub prayers: Option<String>,
    pub cache_dir: Option<PathBuf>,
}

/// Merged configuration for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig {
    pub location: LocationInput,
    pub calc: CalculationSettings,
    pub time_format: TimeFormat,
    pub prayers: Vec<PrayerName>,
    pub cache_dir: Option<PathBuf>,
}

impl EffectiveConfig {
    /// Fold flags over file settings over defaults.
    ///
    /// Location is taken as a unit: a city or coordinate flag replaces the
    /// file's location entirely, except that a file country still backs a
    /// `--city` given without `--country`.
    pub fn merge(settings: &Settings, flags: &Overrides) -> Result<Self, AppError> {
        let flag_location =
            flags.city.is_some() || flags.latitude.is_some() || flags.longitude.is_some();

        let location = if flag_location {
            LocationInput {
                latitude: flags.latitude,
                longitude: flags.longitude,
                city: flags.city.clone(),
                country: flags.country.clone().or_else(|| settings.country.clone()),
            }
        } else {
            LocationInput {
                latitude: settings.latitude,
                longitude: settings.longitude,
                city: settings.city.clone(),
                country: flags.country.clone().or_else(|| settings.country.clone()),
            }
        };

        let time_format = match (flags.time_format, settings.time_format.as_deref()) {
            (Some(tf), _) => tf,
            (None, Some(raw)) => raw.parse()?,
            (None, None) => TimeFormat::default(),
        };

        let prayers = match flags.prayers.as_deref().or(settings.prayers.as_deref()) {
            Some(raw) if !raw.trim().is_empty() => parse_prayer_list(raw)?,
            _ => PrayerName::DEFAULT.to_vec(),
        };

        let cache_dir = flags.cache_dir.clone().or_else(|| {
            settings
                .cache_dir
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
        });

        Ok(Self {
            location,
            calc: CalculationSettings {
                method: flags.method.or(settings.method),
                school: flags.school.or(settings.school),
            },
            time_format,
            prayers,
            cache_dir,
        })
    }
}
