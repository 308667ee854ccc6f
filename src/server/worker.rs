//! Per-connection request lifecycle.
//!
//! A [`Worker`] owns one accepted socket and moves it through
//!
//! ```text
//! Reading → Parsing → Routing → Handling → Responding → Closed
//! ```
//!
//! Unmatched paths skip `Handling` and go to `Responding` with the
//! static-file fallback. Every stage returns a `Result`; an `Err` is the
//! terminal failed state. The socket is shut down in every case and a failed
//! connection gets no response at all.

use std::error::Error as StdError;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinError;
use tracing::{debug, error, warn};

use super::static_files;
use crate::http::{MalformedRequest, Request, Response, ResponseWriter};
use crate::router::{Handler, HandlerError, Router};

/// Read-only state shared by every worker.
pub(crate) struct App {
    pub(crate) router: Router,
    pub(crate) writer: ResponseWriter,
    pub(crate) static_root: PathBuf,
    pub(crate) read_buffer_size: usize,
}

/// Why a connection ended without a response.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to read request")]
    Read(#[source] io::Error),

    #[error(transparent)]
    Malformed(#[from] MalformedRequest),

    #[error("handler for {path} failed")]
    Handler {
        path: String,
        #[source]
        source: HandlerError,
    },

    #[error("handler for {path} did not complete")]
    HandlerAborted {
        path: String,
        #[source]
        source: JoinError,
    },

    #[error("failed to write response")]
    Write(#[source] io::Error),
}

enum Stage {
    Reading,
    Parsing(Bytes),
    Routing(Request),
    Handling { handler: Handler, request: Request },
    Responding { path: String, response: Response },
    Closed,
}

pub(crate) struct Worker {
    stream: TcpStream,
    peer: SocketAddr,
    app: Arc<App>,
}

impl Worker {
    pub(crate) fn new(stream: TcpStream, peer: SocketAddr, app: Arc<App>) -> Self {
        Self { stream, peer, app }
    }

    /// Serves one request and closes the connection. Never fails: errors are
    /// logged here and go no further.
    pub(crate) async fn run(mut self) {
        if let Err(e) = self.drive().await {
            match &e {
                WorkerError::Handler { .. } | WorkerError::HandlerAborted { .. } => {
                    error!(peer = %self.peer, error = &e as &dyn StdError, "handler failed, closing without response");
                }
                _ => {
                    warn!(peer = %self.peer, error = &e as &dyn StdError, "request failed, closing without response");
                }
            }
        }

        if let Err(e) = self.stream.shutdown().await {
            debug!(peer = %self.peer, error = %e, "shutdown failed");
        }
        debug!(peer = %self.peer, "connection closed");
    }

    async fn drive(&mut self) -> Result<(), WorkerError> {
        let mut stage = Stage::Reading;
        loop {
            stage = match stage {
                Stage::Reading => Stage::Parsing(self.read().await?),
                Stage::Parsing(raw) => Stage::Routing(Request::parse(&raw)?),
                Stage::Routing(request) => self.route(request).await,
                Stage::Handling { handler, request } => {
                    let path = request.path().to_owned();
                    let response = invoke(handler, request, &path).await?;
                    Stage::Responding { path, response }
                }
                Stage::Responding { path, response } => {
                    self.respond(&path, &response).await?;
                    Stage::Closed
                }
                Stage::Closed => return Ok(()),
            };
        }
    }

    // One bounded read; whatever arrived is the whole request.
    async fn read(&mut self) -> Result<Bytes, WorkerError> {
        let mut buf = vec![0u8; self.app.read_buffer_size];
        let n = self.stream.read(&mut buf).await.map_err(WorkerError::Read)?;
        buf.truncate(n);
        Ok(Bytes::from(buf))
    }

    async fn route(&self, mut request: Request) -> Stage {
        match self.app.router.resolve(request.path()) {
            Some(hit) => {
                debug!(
                    peer = %self.peer,
                    method = %request.method(),
                    path = %request.path(),
                    pattern = hit.pattern,
                    "dispatching to route"
                );
                let handler = Arc::clone(hit.handler);
                request.set_params(hit.params);
                Stage::Handling { handler, request }
            }
            None => {
                debug!(
                    peer = %self.peer,
                    method = %request.method(),
                    path = %request.path(),
                    "no route, serving static file"
                );
                let path = request.path().to_owned();
                let response = static_files::serve(&self.app.static_root, &path).await;
                Stage::Responding { path, response }
            }
        }
    }

    async fn respond(&mut self, path: &str, response: &Response) -> Result<(), WorkerError> {
        let bytes = self.app.writer.write(path, response);
        self.stream.write_all(&bytes).await.map_err(WorkerError::Write)?;
        self.stream.flush().await.map_err(WorkerError::Write)?;
        debug!(peer = %self.peer, status = response.status().as_u16(), "response sent");
        Ok(())
    }
}

// Runs the handler on its own task so a panic stays inside this connection.
async fn invoke(handler: Handler, request: Request, path: &str) -> Result<Response, WorkerError> {
    match tokio::spawn(handler(request)).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(source)) => Err(WorkerError::Handler {
            path: path.to_owned(),
            source,
        }),
        Err(source) => Err(WorkerError::HandlerAborted {
            path: path.to_owned(),
            source,
        }),
    }
}
