//! Configuration management for the CRPT client.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::error::{CrptError, Result};
use crate::ratelimit::TimeWindow;

/// Environment variable prefix for configuration overrides.
const ENV_PREFIX: &str = "CRPT";

/// Main configuration for the CRPT client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Document creation endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Rate limit applied to submissions
    #[serde(default)]
    pub rate_limit: RateLimitRule,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            rate_limit: RateLimitRule::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "https://ismp.crpt.ru/api/v3/lk/documents/create".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// A rate limit rule: at most `limit` submissions per `amount` units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitRule {
    /// Maximum submissions per window
    pub limit: u64,
    /// The time unit
    pub unit: TimeUnit,
    /// Number of units in one window
    #[serde(default = "default_amount")]
    pub amount: u32,
}

impl Default for RateLimitRule {
    fn default() -> Self {
        Self {
            limit: 10,
            unit: TimeUnit::Minute,
            amount: default_amount(),
        }
    }
}

fn default_amount() -> u32 {
    1
}

impl RateLimitRule {
    /// Get the window length described by this rule.
    pub fn window(&self) -> Duration {
        TimeWindow::from(self.unit).times(self.amount)
    }
}

/// Time unit for rate limits as written in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
}

impl From<TimeUnit> for TimeWindow {
    fn from(unit: TimeUnit) -> Self {
        match unit {
            TimeUnit::Second => TimeWindow::Second,
            TimeUnit::Minute => TimeWindow::Minute,
            TimeUnit::Hour => TimeWindow::Hour,
            TimeUnit::Day => TimeWindow::Day,
        }
    }
}

impl ClientConfig {
    /// Create a configuration for `endpoint` allowing `limit` submissions per `unit`.
    pub fn new(endpoint: impl Into<String>, unit: TimeUnit, limit: u64) -> Self {
        Self {
            endpoint: endpoint.into(),
            rate_limit: RateLimitRule {
                limit,
                unit,
                amount: default_amount(),
            },
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading client configuration");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| CrptError::Config(format!("Failed to parse client config: {}", e)))
    }

    /// Load configuration from an optional file, then apply `CRPT_*` overrides.
    ///
    /// Nested keys use a double underscore, e.g. `CRPT_RATE_LIMIT__LIMIT=5`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&ClientConfig::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            info!(path = %path.display(), "Loading client configuration");
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: ClientConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Check that the configuration describes a usable client.
    pub fn validate(&self) -> Result<()> {
        self.endpoint_url()?;

        if self.rate_limit.limit == 0 {
            return Err(CrptError::Config(
                "rate_limit.limit must be greater than zero".to_string(),
            ));
        }
        if self.rate_limit.amount == 0 {
            return Err(CrptError::Config(
                "rate_limit.amount must be greater than zero".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(CrptError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Parse the endpoint.
    pub fn endpoint_url(&self) -> Result<Url> {
        if self.endpoint.trim().is_empty() {
            return Err(CrptError::Config("endpoint is required".to_string()));
        }
        Url::parse(&self.endpoint)
            .map_err(|e| CrptError::Config(format!("invalid endpoint {:?}: {}", self.endpoint, e)))
    }

    /// Get the per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rate_limit.window(), Duration::from_secs(60));
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
endpoint: https://example.test/api/v3/lk/documents/create
rate_limit:
  limit: 3
  unit: minute
  amount: 2
timeout_secs: 5
"#;
        let config = ClientConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.endpoint, "https://example.test/api/v3/lk/documents/create");
        assert_eq!(config.rate_limit.limit, 3);
        assert_eq!(config.rate_limit.unit, TimeUnit::Minute);
        assert_eq!(config.rate_limit.window(), Duration::from_secs(120));
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_config_with_defaults() {
        let yaml = r#"
endpoint: http://localhost:8080/create
rate_limit:
  limit: 100
  unit: second
"#;
        let config = ClientConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.rate_limit.amount, 1);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_unknown_unit_rejected() {
        let yaml = r#"
rate_limit:
  limit: 1
  unit: fortnight
"#;
        assert!(matches!(
            ClientConfig::from_yaml(yaml),
            Err(CrptError::Config(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_limit() {
        let config = ClientConfig::new("http://localhost/create", TimeUnit::Second, 0);
        assert!(matches!(config.validate(), Err(CrptError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_amount() {
        let mut config = ClientConfig::new("http://localhost/create", TimeUnit::Second, 1);
        config.rate_limit.amount = 0;
        assert!(matches!(config.validate(), Err(CrptError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let config = ClientConfig::new("", TimeUnit::Minute, 1);
        assert!(matches!(config.validate(), Err(CrptError::Config(_))));

        let config = ClientConfig::new("not a url", TimeUnit::Minute, 1);
        assert!(matches!(config.validate(), Err(CrptError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "endpoint: http://localhost:9000/create\nrate_limit:\n  limit: 7\n  unit: hour\n"
        )
        .unwrap();

        let config = ClientConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.endpoint, "http://localhost:9000/create");
        assert_eq!(config.rate_limit.limit, 7);
        assert_eq!(config.rate_limit.unit, TimeUnit::Hour);
        assert_eq!(config.timeout_secs, 30);

        let from_file = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(from_file, config);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = ClientConfig::load(None).unwrap();
        assert_eq!(config.rate_limit, RateLimitRule::default());
    }
}
