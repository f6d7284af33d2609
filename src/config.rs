use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins, comma separated
    pub cors_origins: Option<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds of inactivity after which a presence session is swept
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,

    /// Seconds between two background staleness sweeps
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Upper bound for a single socket write
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,

    /// Capacity of the per-connection outbound queue
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,

    /// Cookie carrying the logical client id
    #[serde(default = "default_session_cookie_name")]
    pub session_cookie_name: String,

    /// Prefix of the install redirects
    #[serde(default = "default_download_base_url")]
    pub download_base_url: String,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        // Load from environment variables using envy. Runs before tracing is
        // initialised, so the caller reports the outcome.
        envy::from_env::<Config>().map_err(ConfigError::EnvError)
    }

    /// Fallback tracing filter when RUST_LOG is not set
    pub fn log_filter(&self) -> String {
        let level = self.log_level.trim().to_lowercase();
        format!("nyanthu_site={0},tower_http={0},axum::rejection=trace,info", level)
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment.to_lowercase() == "dev" || self.environment.to_lowercase() == "development"
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        // A zero period would make tokio's interval panic
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    /// Parsed list of allowed CORS origins, empty when unset
    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .as_deref()
            .map(|origins| {
                origins
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            cors_origins: None,
            session_timeout_secs: default_session_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            send_timeout_ms: default_send_timeout_ms(),
            outbound_buffer: default_outbound_buffer(),
            session_cookie_name: default_session_cookie_name(),
            download_base_url: default_download_base_url(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    EnvError(envy::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EnvError(e) => write!(f, "Environment variable error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_session_timeout_secs() -> u64 {
    10
}

fn default_sweep_interval_secs() -> u64 {
    5
}

fn default_send_timeout_ms() -> u64 {
    2_000
}

fn default_outbound_buffer() -> usize {
    64
}

fn default_session_cookie_name() -> String {
    "nyanthu_sid".to_string()
}

fn default_download_base_url() -> String {
    "https://github.com/nyanthu-okabe".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_timeout() {
        let config = Config::default();
        assert_eq!(config.session_timeout(), Duration::from_secs(10));
        assert_eq!(config.server_address(), "0.0.0.0:3000");
        assert!(config.is_development());
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let config = Config {
            cors_origins: Some("http://a.test, http://b.test,,".to_string()),
            ..Config::default()
        };
        assert_eq!(config.cors_origin_list(), vec!["http://a.test", "http://b.test"]);
        assert!(Config::default().cors_origin_list().is_empty());
    }

    #[test]
    fn log_level_drives_the_fallback_filter() {
        let config = Config {
            log_level: " DEBUG".to_string(),
            ..Config::default()
        };
        assert_eq!(
            config.log_filter(),
            "nyanthu_site=debug,tower_http=debug,axum::rejection=trace,info"
        );
        assert!(Config::default().log_filter().starts_with("nyanthu_site=info,"));
    }

    #[test]
    fn zero_sweep_interval_is_clamped() {
        let config = Config {
            sweep_interval_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
    }
}
