//! Configuration module for environment variable parsing.
//!
//! Configuration is read once at startup. A missing app secret is fatal there,
//! never deferred to request time.

use std::env;
use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::error::ConfigError;

/// Default HubSpot API root.
pub const DEFAULT_API_BASE_URL: &str = "https://api.hubapi.com";

/// Default queue for classified events.
pub const DEFAULT_EVENTS_QUEUE: &str = "hubspot_events";

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// HubSpot app secret used to verify webhook signatures
    pub app_secret: String,

    /// Port for the web server to listen on
    pub port: u16,

    /// Private app token for the HubSpot REST helpers
    pub api_key: Option<String>,

    /// HubSpot API root URL
    pub api_base_url: String,

    /// Outbound HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// RabbitMQ URL; when set, classified events are published
    pub cloudamqp_url: Option<String>,

    /// Queue receiving classified events
    pub events_queue: String,
}

impl Config {
    /// Build a configuration with defaults around the given app secret.
    pub fn new(app_secret: impl Into<String>) -> Result<Self, ConfigError> {
        let app_secret = app_secret.into();
        if app_secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }

        Ok(Config {
            app_secret,
            port: 8080,
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_ms: 8000,
            cloudamqp_url: None,
            events_queue: DEFAULT_EVENTS_QUEUE.to_string(),
        })
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let app_secret = non_blank("HUBSPOT_APP_SECRET").ok_or(ConfigError::MissingSecret)?;
        let defaults = Config::new(app_secret)?;

        Ok(Config {
            port: parse_or("PORT", defaults.port),

            api_key: non_blank("HUBSPOT_API_KEY"),

            api_base_url: non_blank("HUBSPOT_API_BASE_URL").unwrap_or(defaults.api_base_url.clone()),

            request_timeout_ms: parse_or("REQUEST_TIMEOUT_MS", defaults.request_timeout_ms),

            cloudamqp_url: non_blank("CLOUDAMQP_URL"),

            events_queue: non_blank("HUBSPOT_EVENTS_QUEUE")
                .unwrap_or(defaults.events_queue.clone()),

            ..defaults
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("app_secret", &"<redacted>")
            .field("port", &self.port)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("cloudamqp_url_set", &self.cloudamqp_url.is_some())
            .field("events_queue", &self.events_queue)
            .finish()
    }
}

/// Read a variable, treating blank values as unset.
fn non_blank(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a variable, falling back to `default` when unset or invalid.
fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}
