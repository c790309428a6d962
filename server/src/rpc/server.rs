// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Lifecycle of the RPC server.

use crate::endpoint::Endpoints;
use crate::rpc::{app, health_app};
use axum::Router;
use log::info;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Errors that prevent the server from starting or that stop it abruptly.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A required configuration value was not provided.
    #[error("Required configuration variable {0} not present")]
    ConfigMissing(&'static str),

    /// A configuration value could not be interpreted.
    #[error("Invalid value for {name}: {message}")]
    ConfigInvalid {
        /// Name of the configuration variable.
        name: &'static str,

        /// Why the value is invalid.
        message: String,
    },

    /// The listener could not be bound to its address.
    #[error("Failed to bind to {address}")]
    BindFailed {
        /// Address we tried to listen on.
        address: String,

        /// Underlying cause.
        #[source]
        source: io::Error,
    },

    /// The server failed while serving requests.
    #[error("Server failed while serving requests")]
    Serve(#[source] io::Error),
}

/// Liveness and readiness flags of the server.
#[derive(Debug, Default)]
pub struct Status {
    /// Whether the server is running.
    live: AtomicBool,

    /// Whether the server can take requests.
    ready: AtomicBool,
}

impl Status {
    /// Returns true if the server is running.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Returns true if the server can take requests.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Updates both flags.
    pub fn set(&self, live: bool, ready: bool) {
        self.live.store(live, Ordering::SeqCst);
        self.ready.store(ready, Ordering::SeqCst);
    }
}

/// Raw listening configuration of the server.
///
/// Values are kept as given by the user so that problems with them surface when the server
/// starts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServerOptions {
    /// Host to bind the RPC listener to.
    pub host: Option<String>,

    /// Port to bind the RPC listener to.
    pub port: Option<String>,

    /// Host to bind the optional health-only listener to.
    ///
    /// The listener is configured through `HTTPS_HOST` for compatibility with existing
    /// deployments but serves plain HTTP.  TLS, if needed, must be terminated in front of it.
    pub health_host: Option<String>,

    /// Port to bind the optional health-only listener to.  Plain HTTP, like `health_host`.
    pub health_port: Option<String>,
}

/// Validates a host configuration value.
fn parse_host<'a>(name: &'static str, value: Option<&'a str>) -> Result<&'a str, ServerError> {
    match value {
        Some(host) if !host.is_empty() => Ok(host),
        _ => Err(ServerError::ConfigMissing(name)),
    }
}

/// Validates a port configuration value.
fn parse_port(name: &'static str, value: Option<&str>) -> Result<u16, ServerError> {
    match value {
        Some(port) if !port.is_empty() => port
            .parse::<u16>()
            .map_err(|e| ServerError::ConfigInvalid { name, message: e.to_string() }),
        _ => Err(ServerError::ConfigMissing(name)),
    }
}

impl ServerOptions {
    /// Returns the host and port of the RPC listener.
    fn address(&self) -> Result<(&str, u16), ServerError> {
        let host = parse_host("HOST", self.host.as_deref())?;
        let port = parse_port("PORT", self.port.as_deref())?;
        Ok((host, port))
    }

    /// Returns the host and port of the health listener, if one was requested.
    fn health_address(&self) -> Result<Option<(&str, u16)>, ServerError> {
        if self.health_host.is_none() && self.health_port.is_none() {
            return Ok(None);
        }
        let host = parse_host("HTTPS_HOST", self.health_host.as_deref())?;
        let port = parse_port("HTTPS_PORT", self.health_port.as_deref())?;
        Ok(Some((host, port)))
    }
}

/// Binds a listener to `host` and `port` and returns it along with its actual address.
async fn listen(host: &str, port: u16) -> Result<(TcpListener, SocketAddr), ServerError> {
    let bind_failed =
        |source| ServerError::BindFailed { address: format!("{}:{}", host, port), source };
    let listener = TcpListener::bind((host, port)).await.map_err(bind_failed)?;
    let local_addr = listener.local_addr().map_err(bind_failed)?;
    Ok((listener, local_addr))
}

/// Resolves once a stop has been requested through `rx`.
async fn stopped(mut rx: watch::Receiver<bool>) {
    // An error means that the sender is gone, which also means that nobody can ask us to
    // keep running.
    let _ = rx.wait_for(|stop| *stop).await.map(|_| ());
}

/// Handle to request a running server to stop.
#[derive(Clone)]
pub struct StopHandle(Arc<watch::Sender<bool>>);

impl StopHandle {
    /// Asks the server to stop.  Calling this more than once has no further effect.
    pub fn stop(&self) {
        self.0.send_replace(true);
    }
}

/// The RPC server before it starts listening.
pub struct Server {
    /// Listening configuration.
    options: ServerOptions,

    /// Endpoints to expose.
    endpoints: Endpoints,

    /// Health flags, shared with the health routes.
    status: Arc<Status>,

    /// Channel to request the server to stop.
    stop: Arc<watch::Sender<bool>>,
}

impl Server {
    /// Creates a new server that will expose `endpoints` as configured in `options`.
    pub fn new(options: ServerOptions, endpoints: Endpoints) -> Self {
        let (stop, _) = watch::channel(false);
        Self { options, endpoints, status: Arc::new(Status::default()), stop: Arc::new(stop) }
    }

    /// Returns the health flags of this server.
    pub fn status(&self) -> Arc<Status> {
        self.status.clone()
    }

    /// Returns a handle to stop this server once it is running.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.stop.clone())
    }

    /// Binds the listeners without serving any requests yet.
    pub async fn bind(self) -> Result<BoundServer, ServerError> {
        let (host, port) = self.options.address()?;
        let health_address = self.options.health_address()?;

        let (listener, local_addr) = listen(host, port).await?;
        info!("Listening for RPC requests on {}", local_addr);

        let health = match health_address {
            Some((host, port)) => {
                let (listener, local_addr) = listen(host, port).await?;
                info!("Listening for health checks on {}", local_addr);
                Some((listener, local_addr))
            }
            None => None,
        };

        Ok(BoundServer {
            app: app(self.endpoints, self.status.clone()),
            listener,
            local_addr,
            health,
            status: self.status,
            stop: self.stop,
        })
    }

    /// Binds the listeners and serves requests until the server is stopped.
    pub async fn start(self) -> Result<(), ServerError> {
        self.bind().await?.serve().await
    }
}

/// The RPC server after binding its listeners.
pub struct BoundServer {
    /// Router for the RPC listener.
    app: Router,

    /// The RPC listener.
    listener: TcpListener,

    /// Address of `listener`.
    local_addr: SocketAddr,

    /// The health-only listener and its address, if requested.
    health: Option<(TcpListener, SocketAddr)>,

    /// Health flags, shared with the health routes.
    status: Arc<Status>,

    /// Channel to request the server to stop.
    stop: Arc<watch::Sender<bool>>,
}

impl BoundServer {
    /// Returns the address the RPC listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the address the health listener is bound to, if any.
    pub fn health_addr(&self) -> Option<SocketAddr> {
        self.health.as_ref().map(|(_, addr)| *addr)
    }

    /// Serves requests until the server is stopped.
    pub async fn serve(self) -> Result<(), ServerError> {
        let rpc = axum::serve(self.listener, self.app)
            .with_graceful_shutdown(stopped(self.stop.subscribe()))
            .into_future();

        self.status.set(true, true);
        info!("Serving requests");
        let result = match self.health {
            Some((listener, _)) => {
                let health = axum::serve(listener, health_app(self.status.clone()))
                    .with_graceful_shutdown(stopped(self.stop.subscribe()))
                    .into_future();
                tokio::try_join!(rpc, health).map(|_| ())
            }
            None => rpc.await,
        };
        self.status.set(false, false);
        info!("Server stopped");

        result.map_err(ServerError::Serve)
    }
}
