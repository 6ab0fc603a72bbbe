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

//! TCP listener and accept loop
//!
//! The listener binds a socket and runs an accept loop in its own task. Every
//! accepted connection is served by a separate task, so a slow client or a
//! slow provider lookup never holds up the next accept.

use crate::{
    ConnectionHandler, ConnectionId, HandlerConfig, Result, ServerConfig, ServerSnapshot,
    ServiceError,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Delay before retrying after a failed accept
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// A bound, accepting listener
///
/// # Example
///
/// ```no_run
/// use skycache_service::{ConnectionHandler, Listener, OpenWeatherResolver, ResolverConfig, ServerConfig};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let resolver = OpenWeatherResolver::new(ResolverConfig::from_env()?)?;
///     let handler = Arc::new(ConnectionHandler::new(Arc::new(resolver)));
///
///     let listener = Listener::start(ServerConfig::for_port(2017), handler).await?;
///     tokio::signal::ctrl_c().await?;
///     listener.stop().await;
///     Ok(())
/// }
/// ```
pub struct Listener {
    /// Actual bound address
    local_addr: SocketAddr,
    /// Shared request logic
    handler: Arc<ConnectionHandler>,
    /// Cleared by the accept loop when it exits
    running: Arc<AtomicBool>,
    /// Cancels the accept loop
    shutdown: CancellationToken,
    /// Accept loop task handle
    accept_handle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    /// How long `stop()` waits for the accept loop
    shutdown_timeout: Duration,
    /// Listener start time
    started_at: Instant,
}

impl Listener {
    /// Bind `config.bind_address` and start accepting connections
    ///
    /// Fails with [`ServiceError::Bind`] when the address cannot be claimed,
    /// for example because another listener already holds the port.
    pub async fn start(config: ServerConfig, handler: Arc<ConnectionHandler>) -> Result<Self> {
        config.validate().map_err(ServiceError::InvalidConfig)?;

        let listener = TcpListener::bind(config.bind_address)
            .await
            .map_err(|source| ServiceError::Bind {
                addr: config.bind_address,
                source,
            })?;
        let local_addr = listener.local_addr()?;

        info!("Weather server bound to {}", local_addr);

        let running = Arc::new(AtomicBool::new(true));
        let shutdown = CancellationToken::new();
        let accept_handle = tokio::spawn(accept_loop(
            listener,
            handler.clone(),
            HandlerConfig::from(&config),
            running.clone(),
            shutdown.clone(),
        ));

        Ok(Self {
            local_addr,
            handler,
            running,
            shutdown,
            accept_handle: tokio::sync::Mutex::new(Some(accept_handle)),
            shutdown_timeout: config.shutdown_timeout,
            started_at: Instant::now(),
        })
    }

    /// Stop accepting and release the listening socket
    ///
    /// Connections already accepted keep running until they finish. Calling
    /// this more than once is harmless.
    pub async fn stop(&self) {
        self.shutdown.cancel();

        let Some(handle) = self.accept_handle.lock().await.take() else {
            return;
        };

        info!("Stopping weather server on {}", self.local_addr);
        let abort = handle.abort_handle();
        if tokio::time::timeout(self.shutdown_timeout, handle).await.is_err() {
            warn!("Accept loop did not stop within {:?}, aborting", self.shutdown_timeout);
            abort.abort();
        }
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the accept loop is still running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the bound address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Get the shared handler
    pub fn handler(&self) -> Arc<ConnectionHandler> {
        self.handler.clone()
    }

    /// Get a snapshot of the listener state
    pub fn snapshot(&self) -> ServerSnapshot {
        ServerSnapshot {
            bind_address: self.local_addr,
            running: self.is_running(),
            cached_cities: self.handler.store().len(),
            uptime: self.started_at.elapsed(),
            metrics: self.handler.metrics().snapshot(),
        }
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("local_addr", &self.local_addr)
            .field("running", &self.is_running())
            .field("uptime", &self.started_at.elapsed())
            .finish()
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("Listener on {} dropped while still running", self.local_addr);
            self.shutdown.cancel();
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    handler: Arc<ConnectionHandler>,
    config: HandlerConfig,
    running: Arc<AtomicBool>,
    shutdown: CancellationToken,
) {
    let mut next_id: u64 = 1;

    loop {
        let accepted = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            result = listener.accept() => result,
        };

        match accepted {
            Ok((socket, peer_addr)) => {
                let id = ConnectionId::new(next_id);
                next_id += 1;
                debug!(connection_id = %id, %peer_addr, "Accepted connection");

                let handler = handler.clone();
                tokio::spawn(async move {
                    let metrics = handler.metrics();
                    metrics.connection_opened();
                    if let Err(e) = handler.handle(socket, id, config).await {
                        debug!(connection_id = %id, error = %e, "Connection ended without reply");
                    }
                    metrics.connection_closed();
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                handler.metrics().accept_error();

                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(ACCEPT_BACKOFF) => {}
                }
            }
        }
    }

    // Dropping the listener here closes the socket.
    drop(listener);
    running.store(false, Ordering::SeqCst);
    info!("Accept loop terminated");
}
