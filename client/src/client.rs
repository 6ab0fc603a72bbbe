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

//! One-shot weather query client

use crate::{ClientConfig, ClientError, Result};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, error, info, instrument};

/// Outcome of a background query, delivered over a channel
#[derive(Debug, Clone)]
pub struct QueryReply {
    /// City that was queried
    pub city: String,
    /// Information type that was requested
    pub selector: String,
    /// Reply line, or why there was none
    pub result: Result<String>,
}

/// Weather lookup client
///
/// Each query opens its own connection, sends the city and information type
/// as two lines, reads a single reply line and closes.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    config: ClientConfig,
}

impl WeatherClient {
    /// Create a client for the configured server
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Query the server and wait for the reply line
    ///
    /// `selector` is sent as given; the server answers unrecognized values
    /// with `Invalid information type`.
    #[instrument(skip(self), fields(server = %self.config.address()))]
    pub async fn query(&self, city: &str, selector: &str) -> Result<String> {
        let stream = self.connect().await?;
        let mut framed = Framed::new(
            stream,
            LinesCodec::new_with_max_length(self.config.max_line_length),
        );

        framed.send(city).await?;
        framed.send(selector).await?;

        let next = match self.config.read_timeout {
            Some(limit) => timeout(limit, framed.next())
                .await
                .map_err(|_| ClientError::ReadTimeout)?,
            None => framed.next().await,
        };

        match next {
            Some(Ok(line)) => {
                debug!(reply = %line, "Received reply");
                Ok(line)
            }
            Some(Err(e)) => Err(e.into()),
            None => {
                info!("Server closed connection without a reply");
                Err(ClientError::NoResponse)
            }
        }
    }

    /// Run a query in the background and hand the result to `on_complete`
    ///
    /// Returns immediately. The callback runs on a runtime worker, so callers
    /// that need the result on their own loop should use
    /// [`spawn_query_to`](Self::spawn_query_to) instead.
    pub fn spawn_query<F>(
        &self,
        city: impl Into<String>,
        selector: impl Into<String>,
        on_complete: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(Result<String>) + Send + 'static,
    {
        let client = self.clone();
        let city = city.into();
        let selector = selector.into();

        tokio::spawn(async move {
            let result = client.query(&city, &selector).await;
            on_complete(result);
        })
    }

    /// Run a query in the background and send the reply to `replies`
    ///
    /// The receiving end is typically drained by the caller's own event loop.
    pub fn spawn_query_to(
        &self,
        city: impl Into<String>,
        selector: impl Into<String>,
        replies: mpsc::UnboundedSender<QueryReply>,
    ) -> JoinHandle<()> {
        let city = city.into();
        let selector = selector.into();
        let reply_city = city.clone();
        let reply_selector = selector.clone();

        self.spawn_query(city, selector, move |result| {
            let reply = QueryReply {
                city: reply_city,
                selector: reply_selector,
                result,
            };
            if replies.send(reply).is_err() {
                debug!("Reply receiver dropped before query completed");
            }
        })
    }

    async fn connect(&self) -> Result<TcpStream> {
        let addr = self.config.address();
        debug!("Connecting to {}...", addr);

        let connect = TcpStream::connect(&addr);
        let result = match self.config.connect_timeout {
            Some(limit) => timeout(limit, connect)
                .await
                .map_err(|_| ClientError::ConnectionTimeout)?,
            None => connect.await,
        };

        result.map_err(|e| {
            error!("Could not connect to {}: {}", addr, e);
            ClientError::Connect(e.to_string())
        })
    }
}

/// Query `address:port` once with default settings
///
/// # Example
///
/// ```no_run
/// # async fn example() -> Result<(), skycache_client::ClientError> {
/// let reply = skycache_client::resolve("127.0.0.1", 2017, "Paris", "all").await?;
/// println!("{}", reply);
/// # Ok(())
/// # }
/// ```
pub async fn resolve(address: &str, port: u16, city: &str, selector: &str) -> Result<String> {
    WeatherClient::new(ClientConfig::new(address, port))
        .query(city, selector)
        .await
}
