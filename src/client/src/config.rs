use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Error, Debug)]
#[error("invalid server address {address}: {detail}")]
pub struct ConfigError {
    pub address: String,
    pub detail: String,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub server_url: Url,
    pub poll_interval: Duration,
}

impl SessionConfig {
    /// Accepts `host:port` or a full URL.
    pub fn new(address: &str) -> Result<Self, ConfigError> {
        let address = address.trim();
        let mut url = if address.contains("://") {
            address.to_owned()
        } else {
            format!("http://{}", address)
        };
        if !url.ends_with('/') {
            url.push('/');
        }
        let server_url = Url::parse(&url).map_err(|e| ConfigError {
            address: address.to_owned(),
            detail: e.to_string(),
        })?;
        if server_url.cannot_be_a_base() {
            return Err(ConfigError {
                address: address.to_owned(),
                detail: "not a base url".to_owned(),
            });
        }
        Ok(SessionConfig {
            server_url,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(self, poll_interval: Duration) -> Self {
        SessionConfig {
            poll_interval,
            ..self
        }
    }
}
