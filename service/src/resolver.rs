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

//! Remote weather lookup used on cache misses

use crate::{FetchError, ForecastRecord, ResolverConfig};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// Source of forecast records for cities missing from the cache
///
/// # Example
///
/// ```
/// use skycache_service::{FetchError, ForecastRecord, RemoteResolver};
/// use async_trait::async_trait;
///
/// struct Fixed;
///
/// #[async_trait]
/// impl RemoteResolver for Fixed {
///     async fn fetch(&self, _city: &str) -> Result<ForecastRecord, FetchError> {
///         Ok(ForecastRecord::new("20.0", "3.5", "1012", "55"))
///     }
/// }
/// ```
#[async_trait]
pub trait RemoteResolver: Send + Sync + 'static {
    /// Fetch current conditions for `city`
    async fn fetch(&self, city: &str) -> Result<ForecastRecord, FetchError>;
}

/// Resolver backed by the OpenWeatherMap current-weather endpoint
#[derive(Debug, Clone)]
pub struct OpenWeatherResolver {
    client: Client,
    config: ResolverConfig,
}

impl OpenWeatherResolver {
    /// Create a resolver from configuration
    pub fn new(config: ResolverConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self { client, config })
    }

    /// Get the resolver configuration
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }
}

#[async_trait]
impl RemoteResolver for OpenWeatherResolver {
    #[instrument(skip(self), fields(endpoint = %self.config.base_url))]
    async fn fetch(&self, city: &str) -> Result<ForecastRecord, FetchError> {
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("q", city),
                ("appid", self.config.api_key.as_str()),
                ("units", self.config.units.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Provider rejected lookup");
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let record = parse_current_weather(&body)?;
        debug!(%record, "Provider lookup succeeded");
        Ok(record)
    }
}

/// Extract the four forecast fields from a current-weather payload
///
/// Numeric values keep their JSON spelling; string values are taken as-is.
pub fn parse_current_weather(body: &str) -> Result<ForecastRecord, FetchError> {
    let payload: Value =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    Ok(ForecastRecord::new(
        field(&payload, "main", "temp", "main.temp")?,
        field(&payload, "wind", "speed", "wind.speed")?,
        field(&payload, "main", "pressure", "main.pressure")?,
        field(&payload, "main", "humidity", "main.humidity")?,
    ))
}

fn field(
    payload: &Value,
    section: &str,
    key: &str,
    path: &'static str,
) -> Result<String, FetchError> {
    match payload.get(section).and_then(|s| s.get(key)) {
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(FetchError::MissingField(path)),
    }
}
