use crate::core::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; MagnetFinder/torznab-only 1.0)";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub torznab: TorznabConfig,
    pub transmission: TransmissionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    pub telegram: Option<TelegramConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TorznabConfig {
    pub url: String,
    pub apikey: String,
    pub categories: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Seconds
    #[serde(default = "default_torznab_timeout")]
    pub request_timeout: f64,
    /// Seconds to wait after every indexer request
    #[serde(default = "default_sleep_between_requests")]
    pub sleep_between_requests: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransmissionConfig {
    pub download_dir: String,
    #[serde(default)]
    pub start: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Seconds
    #[serde(default = "default_transmission_timeout")]
    pub request_timeout: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub console: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<i64>,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Seconds between download monitor cycles
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
    #[serde(default)]
    pub scheduler: SchedulerKind,
    #[serde(default)]
    pub download_dirs: Vec<DownloadDirOption>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerKind {
    #[default]
    Interval,
    Loop,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DownloadDirOption {
    pub label: String,
    pub path: String,
}

/// Per-run values supplied on the command line.
///
/// `None` keeps whatever the config file says.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub download_dir: Option<String>,
    pub start: Option<bool>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub categories: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            console: false,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            max_results: default_max_results(),
            poll_interval: default_poll_interval(),
            scheduler: SchedulerKind::default(),
            download_dirs: Vec::new(),
        }
    }
}

// Default value functions
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_torznab_timeout() -> f64 {
    12.0
}

fn default_sleep_between_requests() -> f64 {
    0.6
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    9091
}

fn default_rpc_path() -> String {
    "/transmission/rpc".to_string()
}

fn default_transmission_timeout() -> f64 {
    10.0
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "console".to_string()
}

fn default_worker_threads() -> usize {
    num_cpus::get()
}

fn default_max_results() -> usize {
    5
}

fn default_poll_interval() -> u64 {
    30
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.torznab.url.trim().is_empty() {
            return Err(invalid("torznab.url must not be empty"));
        }

        if self.torznab.apikey.trim().is_empty() {
            return Err(invalid("torznab.apikey must not be empty"));
        }

        if !is_positive_seconds(self.torznab.request_timeout) {
            return Err(invalid("torznab.request_timeout must be a finite number greater than 0"));
        }

        let sleep = self.torznab.sleep_between_requests;
        if !sleep.is_finite() || sleep < 0.0 {
            return Err(invalid("torznab.sleep_between_requests must be a finite, non-negative number"));
        }

        if self.transmission.download_dir.trim().is_empty() {
            return Err(invalid("transmission.download_dir must not be empty"));
        }

        if self.transmission.port == 0 {
            return Err(invalid("transmission.port must be greater than 0"));
        }

        if !self.transmission.rpc_path.starts_with('/') {
            return Err(invalid("transmission.rpc_path must start with '/'"));
        }

        if !is_positive_seconds(self.transmission.request_timeout) {
            return Err(invalid(
                "transmission.request_timeout must be a finite number greater than 0",
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(invalid(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            )));
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(invalid(format!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            )));
        }

        if self.runtime.worker_threads == 0 {
            return Err(invalid("runtime.worker_threads must be greater than 0"));
        }

        if let Some(telegram) = &self.telegram {
            if telegram.max_results == 0 {
                return Err(invalid("telegram.max_results must be greater than 0"));
            }

            if telegram.poll_interval == 0 {
                return Err(invalid("telegram.poll_interval must be greater than 0"));
            }

            for option in &telegram.download_dirs {
                if option.label.trim().is_empty() || option.path.trim().is_empty() {
                    return Err(invalid("telegram.download_dirs entries need a label and a path"));
                }
            }
        }

        Ok(())
    }

    /// Apply command line overrides in place
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        let tx = &mut self.transmission;

        if let Some(dir) = overrides.download_dir.as_ref().filter(|d| !d.is_empty()) {
            tx.download_dir = dir.clone();
        }
        if let Some(start) = overrides.start {
            tx.start = start;
        }
        if let Some(host) = overrides.host.as_ref().filter(|h| !h.is_empty()) {
            tx.host = host.clone();
        }
        if let Some(port) = overrides.port {
            tx.port = port;
        }
        if let Some(username) = &overrides.username {
            tx.username = Some(username.clone());
        }
        if let Some(password) = &overrides.password {
            tx.password = Some(password.clone());
        }
        if let Some(categories) = &overrides.categories {
            self.torznab.categories = Some(categories.clone());
        }
    }

    /// Telegram settings, falling back to defaults when the section is absent
    pub fn telegram_or_default(&self) -> TelegramConfig {
        self.telegram.clone().unwrap_or_default()
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

/// Usable as `Duration::from_secs_f64` input; TOML admits `nan` and `inf`
fn is_positive_seconds(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
[torznab]
url = "http://localhost:9117/api/v2.0/indexers/all/results/torznab/api"
apikey = "KEY"
categories = "2000"

[transmission]
download_dir = "/downloads"
"#;

    #[test]
    fn test_load_minimal_config_with_defaults() {
        let config = Config::from_toml_str(MINIMAL).expect("minimal config should load");

        assert_eq!(config.torznab.apikey, "KEY");
        assert_eq!(config.torznab.categories.as_deref(), Some("2000"));
        assert_eq!(config.torznab.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.torznab.request_timeout, 12.0);
        assert_eq!(config.transmission.host, "localhost");
        assert_eq!(config.transmission.port, 9091);
        assert_eq!(config.transmission.rpc_path, "/transmission/rpc");
        assert!(!config.transmission.start);
        assert_eq!(config.logging.level, "info");
        assert!(config.telegram.is_none());
        assert_eq!(config.telegram_or_default().poll_interval, 30);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).expect("config file should load");
        assert_eq!(config.transmission.download_dir, "/downloads");
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_missing_section_is_parse_error() {
        let content = r#"
[torznab]
url = "http://example.com"
apikey = "KEY"
"#;
        let result = Config::from_toml_str(content);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_telegram_section() {
        let content = format!(
            "{}\n{}",
            MINIMAL,
            r#"
[telegram]
bot_token = "123:abc"
chat_id = 42
scheduler = "loop"
download_dirs = [
    { label = "Movies", path = "/media/movies" },
    { label = "TV", path = "/media/tv" },
]
"#
        );
        let config = Config::from_toml_str(&content).unwrap();
        let telegram = config.telegram.unwrap();

        assert_eq!(telegram.chat_id, Some(42));
        assert_eq!(telegram.max_results, 5);
        assert_eq!(telegram.scheduler, SchedulerKind::Loop);
        assert_eq!(telegram.download_dirs.len(), 2);
        assert_eq!(telegram.download_dirs[1].path, "/media/tv");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::from_toml_str(MINIMAL).unwrap();
        config.transmission.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::from_toml_str(MINIMAL).unwrap();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::from_toml_str(MINIMAL).unwrap();
        config.torznab.apikey = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::from_toml_str(MINIMAL).unwrap();
        config.telegram = Some(TelegramConfig {
            poll_interval: 0,
            ..TelegramConfig::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_non_finite_seconds() {
        for value in ["nan", "inf", "-inf"] {
            let content = format!("{MINIMAL}request_timeout = {value}\n");
            let err = Config::from_toml_str(&content).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.starts_with("transmission.request_timeout")));
        }

        let mut config = Config::from_toml_str(MINIMAL).unwrap();
        config.torznab.request_timeout = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = Config::from_toml_str(MINIMAL).unwrap();
        config.torznab.sleep_between_requests = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_overrides_respects_none_values() {
        let mut config = Config::from_toml_str(MINIMAL).unwrap();

        let overrides = ConfigOverrides {
            download_dir: None,
            host: Some("192.168.1.2".to_string()),
            port: None,
            start: Some(true),
            ..ConfigOverrides::default()
        };
        config.apply_overrides(&overrides);

        assert_eq!(config.transmission.download_dir, "/downloads");
        assert_eq!(config.transmission.host, "192.168.1.2");
        assert_eq!(config.transmission.port, 9091);
        assert!(config.transmission.start);
        assert_eq!(config.torznab.categories.as_deref(), Some("2000"));
    }

    #[test]
    fn test_apply_overrides_categories() {
        let mut config = Config::from_toml_str(MINIMAL).unwrap();
        config.apply_overrides(&ConfigOverrides {
            categories: Some("5000".to_string()),
            download_dir: Some(String::new()),
            ..ConfigOverrides::default()
        });

        assert_eq!(config.torznab.categories.as_deref(), Some("5000"));
        assert_eq!(config.transmission.download_dir, "/downloads");
    }
}
