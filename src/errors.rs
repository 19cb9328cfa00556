/// Crate-wide error type.
///
/// Failures on optimisation paths (cache reads and writes, the geolocation
/// cache) are handled where they happen and never reach this type; what
/// arrives here aborts the current resolution.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("malformed time {raw:?}: {reason}")]
    MalformedTime { raw: String, reason: String },

    #[error("--country is required when using --city")]
    MissingCountry,

    #[error("no location specified and auto-detection failed: {0}")]
    LocationUnavailable(String),

    #[error("corrupt cache data: {0}")]
    CacheCorrupt(String),

    #[error("fetch failed: {0}")]
    FetchFailed(String),

    #[error("invalid timezone {0:?}")]
    InvalidTimezone(String),

    #[error("unknown prayer {0:?}; valid names: Fajr, Sunrise, Dhuhr, Asr, Sunset, Maghrib, Isha, Imsak, Midnight, Firstthird, Lastthird")]
    UnknownPrayer(String),

    #[error("could not determine next prayer: {0}")]
    Unresolvable(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Process exit code for this error. Bad user input exits with 2.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::MissingCountry | AppError::UnknownPrayer(_) | AppError::Config(_) => 2,
            _ => 1,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::FetchFailed(err.to_string())
    }
}
