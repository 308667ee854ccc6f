//! # stoa
//!
//! A minimal from-scratch HTTP/1.1 server. Each accepted connection carries
//! one request: it is read once, parsed, routed to a handler (or to the
//! static-file fallback), answered, and closed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stoa::{Config, Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut router = Router::new();
//!     router.route("/user/<user_id>/profile", |req: Request| async move {
//!         let id = req.param("user_id").unwrap_or_default().to_owned();
//!         Ok(Response::ok().body(format!("<h1>user {id}</h1>")))
//!     })?;
//!
//!     let server = Server::bind(Config::default().static_root("public")).await?;
//!     println!("Listening on http://{}", server.local_addr());
//!     server.run(router).await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod http;
pub mod router;
pub mod server;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use config::{Config, ConfigError};
pub use http::{Cookie, Headers, Method, Request, Response, StatusCode};
pub use router::{HandlerError, HandlerResult, RouteError, Router};
pub use server::{Server, ServerError, serve};
