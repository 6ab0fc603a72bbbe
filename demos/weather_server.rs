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

//! Weather Server Example
//!
//! Starts the weather service on the given port and serves until Ctrl+C.
//!
//! ## Usage
//!
//! ```bash
//! OPENWEATHER_API_KEY=... cargo run --example weather_server -- 2017
//! ```
//!
//! Then query it with:
//! ```bash
//! printf 'Bucharest\nall\n' | nc localhost 2017
//! ```

use skycache_service::{
    ConnectionHandler, LifecycleController, OpenWeatherResolver, ResolverConfig, ServiceError,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let port: u16 = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => 2017,
    };

    let resolver = OpenWeatherResolver::new(ResolverConfig::from_env()?)?;
    let controller = LifecycleController::new(ConnectionHandler::new(Arc::new(resolver)));

    match controller.ensure_started(port).await {
        Ok(addr) => println!("Weather server running on {}", addr),
        Err(ServiceError::Bind { addr, source }) => {
            eprintln!("Could not start server on {}: {}. Port might be in use.", addr, source);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }
    println!("Press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;

    controller.stop().await;
    let snapshot = controller.handler().metrics().snapshot();
    println!(
        "Served {} connections, {} cities cached, hit ratio {:.2}",
        snapshot.total_connections,
        controller.handler().store().len(),
        snapshot.hit_ratio()
    );

    Ok(())
}
