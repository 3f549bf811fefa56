use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub scan: ScanSettings,
    #[serde(default)]
    pub lunar: LunarSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Deserialize)]
pub struct ScanSettings {
    /// Seconds between progress reports
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
    /// Seconds between cancellation checks
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    /// Sub-ranges scanned in parallel; 1 keeps the scan single-threaded
    #[serde(default = "default_scan_workers")]
    pub workers: usize,
    /// Wall-clock budget per request before the scan is cancelled; 0 cancels
    /// before any second is scanned
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Echo rejected favourite tokens back to the caller
    #[serde(default)]
    pub report_dropped_favorites: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            progress_interval: default_progress_interval(),
            batch_size: default_batch_size(),
            workers: default_scan_workers(),
            timeout_secs: default_timeout_secs(),
            report_dropped_favorites: false,
        }
    }
}

fn default_progress_interval() -> u64 { 600 }
fn default_batch_size() -> u64 { 256 }
fn default_scan_workers() -> usize { 1 }
fn default_timeout_secs() -> u64 { 30 }

/// Lunar new-year dates, `"YYYY" = "YYYY-MM-DD"`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LunarSettings {
    #[serde(default)]
    pub new_year_dates: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

/// Output style of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    Pretty,
    /// Plain single-line text
    Full,
}

impl LogFormat {
    /// Unknown names fall back to plain text
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Full,
        }
    }
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with ELEMENT_SCAN)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., ELEMENT_SCAN__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("ELEMENT_SCAN")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = apply_platform_overrides(settings)?;

        settings.try_deserialize()
    }
}

/// Honour the bare `HOST` / `PORT` variables most hosting platforms inject
fn apply_platform_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(host) = env::var("HOST") {
        builder = builder.set_override("server.host", host)?;
    }
    if let Some(port) = env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
        builder = builder.set_override("server.port", i64::from(port))?;
    }

    builder.build()
}
