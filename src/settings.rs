use std::time::Duration;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use crate::dns::hosttech::API_HOST;

/// Environment variables `HOSTTECH_API_TOKEN`, `HOSTTECH_BASE_URL` and
/// `HOSTTECH_TIMEOUT` override the config files.
pub const ENV_PREFIX: &str = "HOSTTECH";

const USER_CONFIG: &str = "~/.config/hosttech-dns/config";

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    pub api_token: Option<String>,
    pub base_url: Option<String>,
    /// Request timeout in humantime format, e.g. `30s`.
    pub timeout: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let user_config = shellexpand::tilde(USER_CONFIG);

        let cfg = Config::builder()
            .add_source(File::with_name(&user_config).required(false))
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        cfg.try_deserialize()
    }

    pub fn api_token(&self) -> Result<&str, ConfigError> {
        self.api_token.as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::NotFound("api_token".to_owned()))
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(API_HOST)
    }

    pub fn timeout(&self) -> Result<Option<Duration>, humantime::DurationError> {
        self.timeout.as_deref()
            .map(humantime::parse_duration)
            .transpose()
    }
}
