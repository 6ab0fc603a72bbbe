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

//! Core types for the weather lookup service

use crate::MetricsSnapshot;
use std::borrow::Borrow;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// Reply sent for a selector the service does not recognize
pub const INVALID_SELECTOR_REPLY: &str = "Invalid information type";

/// Unique identifier for a connection (monotonically increasing, never reused)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Create a new connection ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying u64 value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Cache key for a forecast lookup
///
/// The city name exactly as the client sent it. No case folding or trimming
/// is applied, so `"Paris"` and `"paris"` are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(String);

impl QueryKey {
    /// Create a key from a city name
    pub fn new(city: impl Into<String>) -> Self {
        Self(city.into())
    }

    /// Get the city name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for QueryKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for QueryKey {
    fn from(city: &str) -> Self {
        Self::new(city)
    }
}

impl From<String> for QueryKey {
    fn from(city: String) -> Self {
        Self(city)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cached weather observation for one city
///
/// Every field is kept as the provider sent it; values are never parsed into
/// numbers, so what goes out on the wire is byte-for-byte what came in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastRecord {
    temperature: String,
    wind_speed: String,
    pressure: String,
    humidity: String,
}

impl ForecastRecord {
    /// Create a new record
    pub fn new(
        temperature: impl Into<String>,
        wind_speed: impl Into<String>,
        pressure: impl Into<String>,
        humidity: impl Into<String>,
    ) -> Self {
        Self {
            temperature: temperature.into(),
            wind_speed: wind_speed.into(),
            pressure: pressure.into(),
            humidity: humidity.into(),
        }
    }

    /// Temperature in degrees Celsius
    pub fn temperature(&self) -> &str {
        &self.temperature
    }

    /// Wind speed in metres per second
    pub fn wind_speed(&self) -> &str {
        &self.wind_speed
    }

    /// Pressure in hectopascals
    pub fn pressure(&self) -> &str {
        &self.pressure
    }

    /// Relative humidity in percent
    pub fn humidity(&self) -> &str {
        &self.humidity
    }
}

impl fmt::Display for ForecastRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Temp: {}°C, Wind: {} m/s, Pressure: {} hPa, Humidity: {}%",
            self.temperature, self.wind_speed, self.pressure, self.humidity
        )
    }
}

/// Information type requested by a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `temperature`
    Temperature,
    /// `wind_speed`
    WindSpeed,
    /// `pressure`
    Pressure,
    /// `humidity`
    Humidity,
    /// `all`: every field in one formatted line
    All,
    /// Anything else, kept so it can be logged
    Unknown(String),
}

impl Selector {
    /// Parse a selector token. Never fails; unrecognized tokens become [`Selector::Unknown`].
    pub fn parse(token: &str) -> Self {
        match token {
            "temperature" => Self::Temperature,
            "wind_speed" => Self::WindSpeed,
            "pressure" => Self::Pressure,
            "humidity" => Self::Humidity,
            "all" => Self::All,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Get the wire token for this selector
    pub fn as_str(&self) -> &str {
        match self {
            Self::Temperature => "temperature",
            Self::WindSpeed => "wind_speed",
            Self::Pressure => "pressure",
            Self::Humidity => "humidity",
            Self::All => "all",
            Self::Unknown(token) => token,
        }
    }

    /// Check if the selector is one the service answers
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Produce the reply line (without terminator) for a record
    pub fn render(&self, record: &ForecastRecord) -> String {
        match self {
            Self::Temperature => record.temperature().to_string(),
            Self::WindSpeed => record.wind_speed().to_string(),
            Self::Pressure => record.pressure().to_string(),
            Self::Humidity => record.humidity().to_string(),
            Self::All => record.to_string(),
            Self::Unknown(_) => INVALID_SELECTOR_REPLY.to_string(),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listener snapshot for non-blocking debug information
#[derive(Debug, Clone)]
pub struct ServerSnapshot {
    /// Bound address
    pub bind_address: SocketAddr,
    /// Whether the accept loop is running
    pub running: bool,
    /// Number of cities held in the store
    pub cached_cities: usize,
    /// Time since the listener started
    pub uptime: Duration,
    /// Counters at the time of the snapshot
    pub metrics: MetricsSnapshot,
}
