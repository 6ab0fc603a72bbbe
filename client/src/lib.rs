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

//! # Skycache Weather Client
//!
//! Client side of the skycache line protocol: connect, send a city and an
//! information type, read one reply line.
//!
//! ## Quick Start
//!
//! ```no_run
//! use skycache_client::{ClientConfig, WeatherClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WeatherClient::new(ClientConfig::new("127.0.0.1", 2017));
//!     let reply = client.query("Paris", "temperature").await?;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```
//!
//! ## Background Queries
//!
//! ```no_run
//! # use skycache_client::{ClientConfig, WeatherClient};
//! # async fn example() {
//! let client = WeatherClient::new(ClientConfig::new("127.0.0.1", 2017));
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//!
//! client.spawn_query_to("Paris", "all", tx);
//!
//! // Drained wherever the caller's loop runs
//! if let Some(reply) = rx.recv().await {
//!     match reply.result {
//!         Ok(line) => println!("{}: {}", reply.city, line),
//!         Err(e) => eprintln!("Error communicating with server: {}", e),
//!     }
//! }
//! # }
//! ```

mod client;
mod config;
mod error;

pub use client::{QueryReply, WeatherClient, resolve};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
