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

//! Start/stop control for a single listener
//!
//! The controller owns the connection handler, so the forecast cache survives
//! a stop followed by a new start. State changes happen under one lock, which
//! removes any gap between checking for a running listener and starting one.

use crate::{ConnectionHandler, Listener, Result, ServerConfig, ServiceError};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Listener state tracked by the controller
#[derive(Debug, Default)]
enum LifecycleState {
    /// No listener
    #[default]
    Stopped,
    /// A listener was started and not yet stopped
    Running(Listener),
}

/// Owns at most one running [`Listener`]
///
/// # Example
///
/// ```no_run
/// use skycache_service::{ConnectionHandler, LifecycleController, OpenWeatherResolver, ResolverConfig};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let resolver = OpenWeatherResolver::new(ResolverConfig::from_env()?)?;
///     let controller = LifecycleController::new(ConnectionHandler::new(Arc::new(resolver)));
///
///     let addr = controller.ensure_started(2017).await?;
///     println!("listening on {}", addr);
///
///     controller.stop().await;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct LifecycleController {
    handler: Arc<ConnectionHandler>,
    state: Mutex<LifecycleState>,
}

impl LifecycleController {
    /// Create a stopped controller around `handler`
    pub fn new(handler: ConnectionHandler) -> Self {
        Self {
            handler: Arc::new(handler),
            state: Mutex::new(LifecycleState::Stopped),
        }
    }

    /// Start a listener on every interface at `port` unless one is running
    pub async fn ensure_started(&self, port: u16) -> Result<SocketAddr> {
        self.ensure_started_with(ServerConfig::for_port(port)).await
    }

    /// Start a listener with `config` unless one is running
    ///
    /// Returns [`ServiceError::AlreadyRunning`] with the existing address when
    /// a listener is active, and [`ServiceError::Bind`] when the port cannot
    /// be claimed. A listener whose accept loop has exited is replaced.
    pub async fn ensure_started_with(&self, config: ServerConfig) -> Result<SocketAddr> {
        let mut state = self.state.lock().await;

        if let LifecycleState::Running(listener) = &*state {
            if listener.is_running() {
                return Err(ServiceError::AlreadyRunning(listener.local_addr()));
            }
            warn!(
                "Listener on {} exited on its own, starting a new one",
                listener.local_addr()
            );
            listener.stop().await;
        }

        let listener = Listener::start(config, self.handler.clone()).await?;
        let addr = listener.local_addr();
        info!("Weather server started on {}", addr);
        *state = LifecycleState::Running(listener);

        Ok(addr)
    }

    /// Stop the running listener, if any
    pub async fn stop(&self) {
        let previous = std::mem::take(&mut *self.state.lock().await);
        if let LifecycleState::Running(listener) = previous {
            listener.stop().await;
            info!("Weather server on {} stopped", listener.local_addr());
        }
    }

    /// Check if a listener is running
    pub async fn is_running(&self) -> bool {
        matches!(&*self.state.lock().await, LifecycleState::Running(l) if l.is_running())
    }

    /// Get the address of the running listener
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        match &*self.state.lock().await {
            LifecycleState::Running(listener) if listener.is_running() => {
                Some(listener.local_addr())
            }
            _ => None,
        }
    }

    /// Get the shared handler
    pub fn handler(&self) -> Arc<ConnectionHandler> {
        self.handler.clone()
    }
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        // Dropping the listener cancels its accept loop.
        if let LifecycleState::Running(listener) = std::mem::take(self.state.get_mut()) {
            info!("Controller dropped, stopping listener on {}", listener.local_addr());
        }
    }
}
