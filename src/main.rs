use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cache;
mod commands;
mod config;
mod errors;
mod helpers;
mod services;

use cache::CacheStore;
use commands::Context;
use config::{AppConfig, EffectiveConfig, Overrides, Settings};
use errors::AppError;
use services::aladhan::AladhanClient;
use services::format::{TimeFormat, FORMAT_FULL};
use services::geo::IpApiClient;
use services::prayer::PrayerName;

#[derive(Debug, Parser)]
#[command(
    name = "prayer-times",
    version,
    about = "Islamic prayer times from the Al Adhan API, cached for status bars"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// City name (requires --country)
    #[arg(long, global = true)]
    city: Option<String>,

    #[arg(long, global = true)]
    country: Option<String>,

    #[arg(long, global = true, allow_negative_numbers = true)]
    latitude: Option<f64>,

    #[arg(long, global = true, allow_negative_numbers = true)]
    longitude: Option<f64>,

    /// Calculation method id (see `methods`)
    #[arg(long, global = true, value_parser = clap::value_parser!(u8).range(0..=23))]
    method: Option<u8>,

    /// Asr school: 0 = Shafi, 1 = Hanafi
    #[arg(long, global = true, value_parser = clap::value_parser!(u8).range(0..=1))]
    school: Option<u8>,

    /// 12h or 24h
    #[arg(long, global = true)]
    time_format: Option<TimeFormat>,

    /// Comma-separated prayer names, e.g. Fajr,Dhuhr,Asr,Maghrib,Isha
    #[arg(long, global = true)]
    prayers: Option<String>,

    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Machine-readable output
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

impl GlobalArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            city: self.city.clone(),
            country: self.country.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            method: self.method,
            school: self.school,
            time_format: self.time_format,
            prayers: self.prayers.clone(),
            cache_dir: self.cache_dir.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Next prayer on one line, for status bars
    Next {
        /// time-remaining, next-prayer-time, name-and-time, name-and-remaining,
        /// short-name-and-time, short-name-and-remaining, full, or a template
        /// such as "{{.Name}} at {{.Time}}"
        #[arg(long, default_value = FORMAT_FULL)]
        format: String,
    },
    /// Today's prayer times (the default)
    Today,
    /// Prayer times for the next DAYS days
    List {
        #[arg(default_value_t = 7, value_parser = clap::value_parser!(u32).range(1..))]
        days: u32,
    },
    /// Prayer times for the next 7 days
    Week,
    /// Prayer times for the next 30 days
    Month,
    /// Time of one prayer
    Query {
        prayer: PrayerName,
        /// Number of days, `week` or `month`
        #[arg(long, value_parser = commands::parse_days)]
        days: Option<u32>,
    },
    /// Show or modify the settings file
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
    /// List calculation methods
    Methods,
    /// Inspect or clear the cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Set a key, e.g. `config set method 4`
    Set { key: String, value: String },
    /// Delete the settings file
    Reset,
    /// Print the settings file path
    Path,
}

#[derive(Debug, Subcommand)]
enum CacheAction {
    Path,
    Clear,
}

/// Commands that resolve a schedule.
enum Job {
    Next(String),
    Today,
    List(u32),
    Query(PrayerName, u32),
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "prayer_times=debug"
    } else {
        "prayer_times=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn effective_config(app: &AppConfig, global: &GlobalArgs) -> Result<EffectiveConfig, AppError> {
    let settings = match app.settings_path() {
        Ok(path) => Settings::load_from(&path)?,
        Err(e) => {
            tracing::warn!("ignoring settings file: {}", e);
            Settings::default()
        }
    };
    EffectiveConfig::merge(&settings, &global.overrides())
}

fn run_config(app: &AppConfig, action: Option<ConfigAction>) -> Result<String, AppError> {
    let path = app.settings_path()?;
    match action {
        None => commands::config::show(&path),
        Some(ConfigAction::Set { key, value }) => commands::config::set(&path, &key, &value),
        Some(ConfigAction::Reset) => commands::config::reset(&path),
        Some(ConfigAction::Path) => Ok(commands::config::path(&path)),
    }
}

async fn run(cli: Cli) -> Result<String, AppError> {
    let app = AppConfig::from_env();

    let job = match cli.command.unwrap_or(Command::Today) {
        Command::Config { action } => return run_config(&app, action),
        Command::Methods => return Ok(commands::methods::run()),
        Command::Cache { action } => {
            let config = effective_config(&app, &cli.global)?;
            let cache = CacheStore::open(config.cache_dir);
            return match action {
                CacheAction::Path => commands::cache::path(cache.as_ref()),
                CacheAction::Clear => commands::cache::clear(cache.as_ref()),
            };
        }
        Command::Next { format } => Job::Next(format),
        Command::Today => Job::Today,
        Command::List { days } => Job::List(days),
        Command::Week => Job::List(7),
        Command::Month => Job::List(30),
        Command::Query { prayer, days } => Job::Query(prayer, days.unwrap_or(1)),
    };

    let config = effective_config(&app, &cli.global)?;
    let cache = CacheStore::open(config.cache_dir.clone());
    let provider = AladhanClient::new(&app.api_url, app.http_timeout);
    let geo = IpApiClient::new(&app.geo_url, app.http_timeout);

    let ctx = Context {
        config: &config,
        cache: cache.as_ref(),
        provider: &provider,
        geo: &geo,
        now: Utc::now(),
        json: cli.global.json,
    };

    match job {
        Job::Next(format) => commands::next::run(&ctx, &format).await,
        Job::Today => commands::today::run(&ctx).await,
        Job::List(days) => commands::list::run(&ctx, days).await,
        Job::Query(prayer, days) => commands::query::run(&ctx, prayer, days).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    match run(cli).await {
        Ok(out) => {
            print!("{}", out);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!("command failed: {:?}", e);
            eprintln!("error: {}", e);
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}
