use std::path::PathBuf;

pub const DEFAULT_DAYS: usize = 7;
pub const MAX_DAYS: usize = 365;

/// Runtime settings, read from the environment. CLI flags override them.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding `config/` and `logs/` when reading from disk.
    pub root: PathBuf,
    /// When set, files are fetched over HTTP below this URL instead.
    pub base_url: Option<String>,
    pub config_path: String,
    pub log_dir: String,
    pub days: usize,
    pub bind: String,
    pub port: u16,
    pub http_timeout_secs: u64,
    pub history_limit: usize,
    pub logs_limit: usize,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            root: std::env::var("DASH_ROOT").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(".")),
            base_url: std::env::var("DASH_BASE_URL").ok().filter(|v| !v.is_empty()),
            config_path: std::env::var("DASH_CONFIG_PATH").unwrap_or_else(|_| "config/trading_config.py".to_string()),
            log_dir: std::env::var("DASH_LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            days: clamp_days(std::env::var("DASH_DAYS").ok().and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_DAYS)),
            bind: std::env::var("DASH_BIND").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("DASH_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8765),
            http_timeout_secs: std::env::var("DASH_HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(10),
            history_limit: std::env::var("DASH_HISTORY_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(10),
            logs_limit: std::env::var("DASH_LOGS_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(10),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            base_url: None,
            config_path: "config/trading_config.py".to_string(),
            log_dir: "logs".to_string(),
            days: DEFAULT_DAYS,
            bind: "127.0.0.1".to_string(),
            port: 8765,
            http_timeout_secs: 10,
            history_limit: 10,
            logs_limit: 10,
        }
    }
}

/// Period selector values are kept within 1..=365 days.
pub fn clamp_days(days: usize) -> usize {
    days.clamp(1, MAX_DAYS)
}
