//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Server and resolver configuration

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Environment variable holding the provider API key
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Environment variable overriding the provider endpoint
pub const BASE_URL_ENV: &str = "OPENWEATHER_BASE_URL";

/// Default provider endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Server configuration
///
/// # Example
///
/// ```
/// use skycache_service::ServerConfig;
/// use std::time::Duration;
///
/// let config = ServerConfig::for_port(2017)
///     .with_max_line_length(512)
///     .with_read_timeout(Some(Duration::from_secs(30)));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the listener to
    pub bind_address: SocketAddr,

    /// Longest accepted request line in bytes
    pub max_line_length: usize,

    /// Timeout for each request line read
    ///
    /// `None` waits indefinitely for the client.
    pub read_timeout: Option<Duration>,

    /// How long `stop()` waits for the accept loop to exit
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            max_line_length: 1024,
            read_timeout: None,
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    /// Create a new configuration with the given bind address
    pub fn new(bind_address: SocketAddr) -> Self {
        Self {
            bind_address,
            ..Default::default()
        }
    }

    /// Create a configuration listening on every interface at `port`
    pub fn for_port(port: u16) -> Self {
        Self::new(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
    }

    /// Set the maximum request line length
    pub fn with_max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = max;
        self
    }

    /// Set the per-line read timeout
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the shutdown timeout
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_line_length == 0 {
            return Err("max_line_length must be greater than 0".to_string());
        }

        if matches!(self.read_timeout, Some(timeout) if timeout.is_zero()) {
            return Err("read_timeout must be greater than 0".to_string());
        }

        if self.shutdown_timeout.is_zero() {
            return Err("shutdown_timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Remote provider configuration
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Current-weather endpoint
    pub base_url: String,

    /// Provider API key, sent as `appid`
    pub api_key: String,

    /// Unit system requested from the provider
    pub units: String,

    /// Request timeout (None for no timeout)
    pub timeout: Option<Duration>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            units: "metric".to_string(),
            timeout: None,
        }
    }
}

impl ResolverConfig {
    /// Create a configuration for the default endpoint with the given key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Build a configuration from `OPENWEATHER_API_KEY` and `OPENWEATHER_BASE_URL`
    pub fn from_env() -> Result<Self, String> {
        let api_key =
            std::env::var(API_KEY_ENV).map_err(|_| format!("{} is not set", API_KEY_ENV))?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            config.base_url = base_url;
        }
        Ok(config)
    }

    /// Set the endpoint URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the unit system
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("base_url must not be empty".to_string());
        }

        if self.api_key.is_empty() {
            return Err("api_key must not be empty".to_string());
        }

        Ok(())
    }
}
