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

//! Weather Client Example
//!
//! Sends one query to a running weather server and prints the reply.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --example weather_client -- 127.0.0.1 2017 Bucharest all
//! ```
//!
//! The information type is one of `temperature`, `wind_speed`, `pressure`,
//! `humidity` or `all`.

use skycache_client::{ClientConfig, WeatherClient};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let (Some(address), Some(port), Some(city)) = (args.next(), args.next(), args.next()) else {
        eprintln!("usage: weather_client <address> <port> <city> [information-type]");
        return Ok(());
    };
    let selector = args.next().unwrap_or_else(|| "all".to_string());

    let client = WeatherClient::new(ClientConfig::new(address, port.parse()?));

    // Replies come back over a channel and are printed from this task
    let (tx, mut rx) = mpsc::unbounded_channel();
    client.spawn_query_to(city, selector, tx);

    if let Some(reply) = rx.recv().await {
        match reply.result {
            Ok(line) => println!("{} ({}): {}", reply.city, reply.selector, line),
            Err(e) if e.is_connect_error() => eprintln!("Error communicating with server: {}", e),
            Err(e) => eprintln!("No answer for {}: {}", reply.city, e),
        }
    }

    Ok(())
}
