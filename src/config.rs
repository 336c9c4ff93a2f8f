use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

// Default configuration constants
const DEFAULT_SLACK_BASE_URL: &str = "https://slack.com/api";
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 20;
const DEFAULT_CHANNELS: [&str; 2] = ["concept-tech", "today-I-learned"];
const DEFAULT_CHANNEL_RESULT_COUNT: u32 = 20;
const DEFAULT_USER_POSTS_LIMIT: u32 = 200;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_INITIAL_DELAY_MS: u64 = 1000;
const DEFAULT_MAX_DELAY_MS: u64 = 60000;
const DEFAULT_EXPONENTIAL_BASE: f64 = 2.0;
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_MAX_IDLE_PER_HOST: u32 = 10;
const DEFAULT_POOL_IDLE_TIMEOUT_SECONDS: u64 = 90;
const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
const DEFAULT_SERVER_PORT: u16 = 8080;
const DEFAULT_SERVER_PATH: &str = "/mcp";

/// Environment variable holding the Slack token
pub const SLACK_TOKEN_ENV: &str = "SLACK_TOKEN";

/// Prefix for environment overrides, e.g. `INSIGHT_SERVER__PORT=9000`
const ENV_PREFIX: &str = "INSIGHT";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingEnv(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub slack: SlackConfig,
    pub search: SearchConfig,
    pub retry: RetryConfig,
    pub connection: ConnectionConfig,
    pub server: ServerConfig,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct SlackConfig {
    pub token: String,
    pub base_url: String,
    pub requests_per_minute: u32,
}

// Keep the token out of logs
impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("requests_per_minute", &self.requests_per_minute)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Channels searched by `find-technology-posts`
    pub channels: Vec<String>,
    pub channel_result_count: u32,
    pub user_posts_limit: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub exponential_base: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionConfig {
    pub timeout_seconds: u64,
    pub max_idle_per_host: u32,
    pub pool_idle_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub transport: Transport,
    pub host: String,
    pub port: u16,
    pub path: String,
    pub result_format: ResultFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Http,
    Stdio,
}

/// How record-returning tools encode their results in `tools/call`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultFormat {
    /// `content: [[{..}, {..}]]`
    Records,
    /// `content: [{"type": "text", "text": "<pretty json>"}]`
    Text,
}

impl RetryConfig {
    /// Backoff before the given retry (1-based), capped at `max_delay_ms`
    pub fn delay_for_attempt(&self, attempt: u32) -> std::time::Duration {
        let factor = self
            .exponential_base
            .powi(attempt.saturating_sub(1) as i32);
        let delay = (self.initial_delay_ms as f64 * factor).min(self.max_delay_ms as f64);
        std::time::Duration::from_millis(delay as u64)
    }
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment.
    /// Fails when `SLACK_TOKEN` is missing or empty.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let token = std::env::var(SLACK_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty());
        Self::build(config_path, token)
    }

    pub fn build(config_path: Option<&Path>, token: Option<String>) -> Result<Self, ConfigError> {
        let token = token.ok_or(ConfigError::MissingEnv(SLACK_TOKEN_ENV))?;

        let mut settings = config::Config::builder();

        // Default values
        settings = settings
            .set_default("slack.base_url", DEFAULT_SLACK_BASE_URL)?
            .set_default("slack.requests_per_minute", DEFAULT_REQUESTS_PER_MINUTE)?
            .set_default("search.channels", DEFAULT_CHANNELS.to_vec())?
            .set_default("search.channel_result_count", DEFAULT_CHANNEL_RESULT_COUNT)?
            .set_default("search.user_posts_limit", DEFAULT_USER_POSTS_LIMIT)?
            .set_default("retry.max_attempts", DEFAULT_MAX_ATTEMPTS)?
            .set_default("retry.initial_delay_ms", DEFAULT_INITIAL_DELAY_MS)?
            .set_default("retry.max_delay_ms", DEFAULT_MAX_DELAY_MS)?
            .set_default("retry.exponential_base", DEFAULT_EXPONENTIAL_BASE)?
            .set_default("connection.timeout_seconds", DEFAULT_TIMEOUT_SECONDS)?
            .set_default("connection.max_idle_per_host", DEFAULT_MAX_IDLE_PER_HOST)?
            .set_default(
                "connection.pool_idle_timeout_seconds",
                DEFAULT_POOL_IDLE_TIMEOUT_SECONDS,
            )?
            .set_default("server.transport", "http")?
            .set_default("server.host", DEFAULT_SERVER_HOST)?
            .set_default("server.port", DEFAULT_SERVER_PORT)?
            .set_default("server.path", DEFAULT_SERVER_PATH)?
            .set_default("server.result_format", "records")?;

        // Load from config file if provided
        if let Some(path) = config_path
            && path.exists()
        {
            settings = settings.add_source(config::File::from(path));
        }

        // Override with environment variables
        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("search.channels")
                .try_parsing(true),
        );

        settings = settings.set_override("slack.token", token)?;

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use std::time::Duration;

    fn test_config() -> Config {
        Config::build(None, Some("xoxp-test".to_string())).unwrap()
    }

    #[test]
    #[serial]
    fn test_defaults() {
        let config = test_config();

        assert_eq!(config.slack.token, "xoxp-test");
        assert_eq!(config.slack.base_url, DEFAULT_SLACK_BASE_URL);
        assert_eq!(
            config.search.channels,
            vec!["concept-tech".to_string(), "today-I-learned".to_string()]
        );
        assert_eq!(config.search.user_posts_limit, 200);
        assert_eq!(config.server.transport, Transport::Http);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.path, "/mcp");
        assert_eq!(config.server.result_format, ResultFormat::Records);
    }

    #[test]
    fn test_missing_token_fails() {
        let err = Config::build(None, None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(SLACK_TOKEN_ENV)));
        assert_eq!(err.to_string(), "SLACK_TOKEN environment variable is required");
    }

    #[test]
    #[serial]
    fn test_config_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("insight-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "[server]\ntransport = \"stdio\"\nresult_format = \"text\"\n\n[search]\nchannels = [\"rust\"]\n",
        )
        .unwrap();

        let config = Config::build(Some(&path), Some("xoxp-test".to_string())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.server.transport, Transport::Stdio);
        assert_eq!(config.server.result_format, ResultFormat::Text);
        assert_eq!(config.search.channels, vec!["rust".to_string()]);
    }

    #[test]
    #[serial]
    fn test_missing_config_file_is_ignored() {
        let path = std::env::temp_dir().join("insight-does-not-exist.toml");
        let config = Config::build(Some(&path), Some("xoxp-test".to_string())).unwrap();
        assert_eq!(config.server.port, DEFAULT_SERVER_PORT);
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        // SAFETY: serialized with every other test touching the environment
        unsafe {
            std::env::set_var("INSIGHT_SERVER__PORT", "9191");
            std::env::set_var("INSIGHT_SEARCH__CHANNELS", "general,random");
        }

        let config = test_config();

        unsafe {
            std::env::remove_var("INSIGHT_SERVER__PORT");
            std::env::remove_var("INSIGHT_SEARCH__CHANNELS");
        }

        assert_eq!(config.server.port, 9191);
        assert_eq!(
            config.search.channels,
            vec!["general".to_string(), "random".to_string()]
        );
    }

    #[test]
    fn test_token_is_redacted_in_debug() {
        let slack = SlackConfig {
            token: "xoxp-secret".to_string(),
            base_url: DEFAULT_SLACK_BASE_URL.to_string(),
            requests_per_minute: 20,
        };
        let rendered = format!("{:?}", slack);
        assert!(!rendered.contains("xoxp-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_retry_delay_is_exponential_and_capped() {
        let retry = RetryConfig {
            max_attempts: 5,
            initial_delay_ms: 100,
            max_delay_ms: 500,
            exponential_base: 2.0,
        };

        assert_eq!(retry.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(retry.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(retry.delay_for_attempt(3), Duration::from_millis(400));
        assert_eq!(retry.delay_for_attempt(4), Duration::from_millis(500));
    }
}
