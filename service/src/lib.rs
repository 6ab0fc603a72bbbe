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

//! Skycache Weather Service
//!
//! A line-oriented TCP service answering weather queries from a shared,
//! write-once forecast cache. Cache misses are resolved through a
//! [`RemoteResolver`], by default the OpenWeatherMap current-weather API.
//!
//! # Protocol
//!
//! ```text
//! client -> "Paris\n"
//! client -> "all\n"
//! server -> "Temp: 20.0°C, Wind: 3.5 m/s, Pressure: 1012 hPa, Humidity: 55%\n"
//! ```
//!
//! The second line is one of `temperature`, `wind_speed`, `pressure`,
//! `humidity` or `all`; anything else is answered with
//! `Invalid information type`. A request with a missing or empty line, or
//! whose lookup fails, is closed without a reply.
//!
//! # Architecture
//!
//! ```text
//! LifecycleController
//!     ↓
//! Listener (accept loop)
//!     ↓ one task per connection
//! ConnectionHandler → RecordStore
//!                   → RemoteResolver (on miss)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use skycache_service::{ConnectionHandler, LifecycleController, OpenWeatherResolver, ResolverConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resolver = OpenWeatherResolver::new(ResolverConfig::from_env()?)?;
//!     let controller = LifecycleController::new(ConnectionHandler::new(Arc::new(resolver)));
//!     controller.ensure_started(2017).await?;
//!     tokio::signal::ctrl_c().await?;
//!     controller.stop().await;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod handler;
mod lifecycle;
mod listener;
mod metrics;
mod resolver;
mod store;
mod types;

pub use config::{API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL, ResolverConfig, ServerConfig};
pub use error::{FetchError, ProtocolError, Result, ServiceError};
pub use handler::{ConnectionHandler, HandlerConfig};
pub use lifecycle::LifecycleController;
pub use listener::Listener;
pub use self::metrics::{MetricsSnapshot, ServerMetrics};
pub use resolver::{OpenWeatherResolver, RemoteResolver, parse_current_weather};
pub use store::RecordStore;
pub use types::{
    ConnectionId, ForecastRecord, INVALID_SELECTOR_REPLY, QueryKey, Selector, ServerSnapshot,
};
