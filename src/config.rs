use std::fmt;
use std::path::PathBuf;

use chrono_tz::Tz;

pub const DEFAULT_LOG_FILE: &str = "data/attendance_log.csv";
pub const DEFAULT_WEBHOOK_PATH: &str = "/zoom-webhook";

/// Runtime settings for both binaries. Built once at startup and handed to
/// the server constructors; handlers read it through `web::Data<Config>`.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_file: PathBuf,
    pub host: String,
    pub receiver_port: u16,
    pub viewer_port: u16,
    pub webhook_path: String,
    /// Shared secret for `Authorization: Bearer`. `None` disables the check.
    pub webhook_secret: Option<String>,
    pub display_tz: Tz,
    pub app_name: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort { var: &'static str, value: String },
    InvalidWebhookPath(String),
    UnknownTimeZone(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort { var, value } => {
                write!(f, "{var} must be a port number, got '{value}'")
            }
            ConfigError::InvalidWebhookPath(p) => {
                write!(f, "webhook path must start with '/', got '{p}'")
            }
            ConfigError::UnknownTimeZone(tz) => write!(f, "unknown time zone '{tz}'"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            host: "127.0.0.1".to_string(),
            receiver_port: 5555,
            viewer_port: 8501,
            webhook_path: DEFAULT_WEBHOOK_PATH.to_string(),
            webhook_secret: None,
            display_tz: Tz::UTC,
            app_name: "Attendance".to_string(),
        }
    }
}

impl Config {
    /// Load from the process environment (after `.env`, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset or blank values keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Config::default();

        if let Some(path) = get("ROLLCALL_LOG_FILE") {
            config.log_file = PathBuf::from(path);
        }
        if let Some(host) = get("ROLLCALL_HOST") {
            config.host = host;
        }
        if let Some(port) = get("ROLLCALL_RECEIVER_PORT") {
            config.receiver_port = parse_port("ROLLCALL_RECEIVER_PORT", port)?;
        }
        if let Some(port) = get("ROLLCALL_VIEWER_PORT") {
            config.viewer_port = parse_port("ROLLCALL_VIEWER_PORT", port)?;
        }
        if let Some(path) = get("ROLLCALL_WEBHOOK_PATH") {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidWebhookPath(path));
            }
            config.webhook_path = path;
        }
        config.webhook_secret = get("ROLLCALL_WEBHOOK_SECRET");
        if let Some(tz) = get("ROLLCALL_DISPLAY_TZ") {
            config.display_tz = tz.parse::<Tz>().map_err(|_| ConfigError::UnknownTimeZone(tz))?;
        }
        if let Some(name) = get("ROLLCALL_APP_NAME") {
            config.app_name = name;
        }

        Ok(config)
    }

    pub fn auth_enabled(&self) -> bool {
        self.webhook_secret.is_some()
    }
}

fn parse_port(var: &'static str, value: String) -> Result<u16, ConfigError> {
    value
        .parse::<u16>()
        .map_err(|_| ConfigError::InvalidPort { var, value })
}
