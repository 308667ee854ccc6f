//! Server configuration.
//!
//! A [`Config`] is assembled once at startup, from defaults, a JSON file, or
//! the environment, and then shared read-only with every connection.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::MimeTypes;

/// Environment variable overriding [`Config::listen_addr`].
pub const LISTEN_ENV: &str = "STOA_LISTEN";

/// Environment variable overriding [`Config::static_root`].
pub const STATIC_ROOT_ENV: &str = "STOA_STATIC_ROOT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read-only server settings.
///
/// Every field has a default, so a JSON file only needs the keys it changes:
///
/// ```
/// use stoa::Config;
///
/// let cfg: Config = serde_json::from_str(r#"{ "listen_addr": "0.0.0.0:5050" }"#).unwrap();
/// assert_eq!(cfg.listen_addr, "0.0.0.0:5050");
/// assert_eq!(cfg.backlog, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `host:port` to listen on.
    pub listen_addr: String,
    /// Directory static files are served from.
    pub static_root: PathBuf,
    /// Value of the `Server` response header.
    pub server_name: String,
    /// Pending-connection queue length passed to `listen`.
    pub backlog: u32,
    /// Bytes pulled from a connection in its one read.
    pub read_buffer_size: usize,
    /// Extension → content type table.
    pub mime_types: MimeTypes,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_owned(),
            static_root: PathBuf::from("static"),
            server_name: concat!("Stoa/", env!("CARGO_PKG_VERSION")).to_owned(),
            backlog: 10,
            read_buffer_size: 4096,
            mime_types: MimeTypes::default(),
        }
    }
}

impl Config {
    /// Defaults, overridden by [`LISTEN_ENV`] and [`STATIC_ROOT_ENV`] when set.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Loads a JSON config file. Keys that are absent keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Decode {
            path: path.to_owned(),
            source,
        })
    }

    /// Applies [`LISTEN_ENV`] and [`STATIC_ROOT_ENV`] on top of `self`.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(addr) = std::env::var(LISTEN_ENV) {
            self.listen_addr = addr;
        }
        if let Some(root) = std::env::var_os(STATIC_ROOT_ENV) {
            self.static_root = PathBuf::from(root);
        }
        self
    }

    #[must_use]
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = addr.into();
        self
    }

    #[must_use]
    pub fn static_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.static_root = root.into();
        self
    }

    #[must_use]
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = name.into();
        self
    }

    #[must_use]
    pub fn mime_type(mut self, extension: &str, content_type: impl Into<String>) -> Self {
        self.mime_types.insert(extension, content_type);
        self
    }
}
