//! Async TCP server using Tokio.
//!
//! Accepts TCP connections and hands each one to its own worker task. Every
//! connection carries exactly one request and one response, then closes.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::http::ResponseWriter;
use crate::router::Router;

pub mod static_files;
mod worker;

pub use worker::WorkerError;

use worker::{App, Worker};

/// Errors produced by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{addr} did not resolve to any socket address")]
    Resolve { addr: String },
}

/// The stoa HTTP server.
///
/// # Examples
///
/// ```rust,no_run
/// use stoa::{Config, Response, Router, Server};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut router = Router::new();
///     router.route("/hello", |_req| async { Ok(Response::ok().body("Hello!")) })?;
///
///     let server = Server::bind(Config::from_env()).await?;
///     server.run(router).await;
///     Ok(())
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: Config,
}

impl Server {
    /// Binds a listening socket for `config.listen_addr` with `SO_REUSEADDR`
    /// set and a backlog of `config.backlog`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Resolve`] if the address resolves to nothing and
    /// [`ServerError::Bind`] if the socket cannot be created, bound, or put
    /// into listening mode.
    pub async fn bind(config: Config) -> Result<Self, ServerError> {
        let addr_str = config.listen_addr.clone();
        let bind_err = |source| ServerError::Bind {
            addr: addr_str.clone(),
            source,
        };

        let addr = tokio::net::lookup_host(&config.listen_addr)
            .await
            .map_err(bind_err)?
            .next()
            .ok_or_else(|| ServerError::Resolve {
                addr: addr_str.clone(),
            })?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(bind_err)?;
        socket.set_reuseaddr(true).map_err(bind_err)?;
        socket.bind(addr).map_err(bind_err)?;
        let listener = socket.listen(config.backlog).map_err(bind_err)?;

        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
            config,
        })
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts connections forever, spawning one worker task per connection.
    ///
    /// `router` is frozen here and shared read-only by all workers. Failed
    /// accepts are logged and the loop carries on; there is no shutdown
    /// signal, so the future only ends when it is dropped.
    pub async fn run(self, router: Router) {
        let app = Arc::new(App {
            router,
            writer: ResponseWriter::new(self.config.mime_types, self.config.server_name),
            static_root: self.config.static_root,
            read_buffer_size: self.config.read_buffer_size,
        });
        info!(
            address = %self.local_addr,
            static_root = %app.static_root.display(),
            routes = app.router.len(),
            "stoa listening"
        );

        loop {
            let (stream, peer_addr) = match self.listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            debug!(peer = %peer_addr, "connection accepted");
            let worker = Worker::new(stream, peer_addr, Arc::clone(&app));
            tokio::spawn(worker.run());
        }
    }
}

/// Binds according to `config` and serves `router` until the process exits.
///
/// # Errors
///
/// Only binding can fail; see [`Server::bind`].
pub async fn serve(config: Config, router: Router) -> Result<(), ServerError> {
    Server::bind(config).await?.run(router).await;
    Ok(())
}
