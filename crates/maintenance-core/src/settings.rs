use clap::Parser;
use std::path::PathBuf;

/// Directory under `$HOME` holding data and logs.
pub const APP_DIR_NAME: &str = ".maintenance-dashboard";

/// Default seconds between snapshot rebuilds.
pub const DEFAULT_REFRESH_RATE_SECS: u64 = 10;

/// Default seconds a loaded snapshot may be reused.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 5;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Maintenance reliability dashboard: merges split maintenance events and
/// reports MTTR, failure share and duration breakdowns
#[derive(Parser, Debug, Clone)]
#[command(
    name = "maintenance-dashboard",
    about = "Reconcile maintenance events and report reliability KPIs",
    version
)]
pub struct Settings {
    /// JSON / JSONL record file, or a directory of them
    #[arg(long, env = "MAINTENANCE_DATA_PATH")]
    pub data_path: Option<PathBuf>,

    /// Refresh interval in seconds (1-3600)
    #[arg(long, default_value_t = DEFAULT_REFRESH_RATE_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub refresh_rate: u64,

    /// Seconds a loaded snapshot may be reused before reloading
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL_SECS)]
    pub cache_ttl: u64,

    /// Output format for each snapshot
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Build a single snapshot and exit instead of refreshing periodically
    #[arg(long)]
    pub once: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse the process arguments and apply derived overrides.
    pub fn load() -> Self {
        Self::resolve(Settings::parse())
    }

    /// Same as [`Settings::load`] but from an explicit argument list.
    pub fn try_load_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Settings::try_parse_from(args).map(Self::resolve)
    }

    /// Record file or directory to read, defaulting to
    /// `~/.maintenance-dashboard/data`.
    pub fn resolved_data_path(&self) -> PathBuf {
        self.data_path.clone().unwrap_or_else(default_data_path)
    }

    fn resolve(mut settings: Settings) -> Settings {
        // --debug overrides log level.
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

/// `~/.maintenance-dashboard`, or `./.maintenance-dashboard` without a home dir.
pub fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Default location of the record files.
pub fn default_data_path() -> PathBuf {
    app_dir().join("data")
}

// ── Tests ──────────────────────────────────────────────────────────────────────
