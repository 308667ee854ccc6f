//! File extension → `Content-Type` table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Content type for responses whose path has an extension missing from the table.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Content type for responses whose path has no extension at all.
pub const TEXT_HTML: &str = "text/html; charset=UTF-8";

/// Maps lowercase extensions (without the dot) to content types.
///
/// Lookups lowercase the extension first, so `/LOGO.PNG` resolves like
/// `/logo.png`. The table is read-only once the server starts.
///
/// # Examples
///
/// ```
/// use stoa::http::MimeTypes;
///
/// let mime = MimeTypes::default();
/// assert_eq!(mime.for_path("/style.css"), "text/css");
/// assert_eq!(mime.for_path("/archive.tar.zst"), "application/octet-stream");
/// assert_eq!(mime.for_path("/now"), "text/html; charset=UTF-8");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MimeTypes {
    by_extension: HashMap<String, String>,
}

impl MimeTypes {
    /// Creates an empty table: every extension maps to [`OCTET_STREAM`].
    pub fn empty() -> Self {
        Self {
            by_extension: HashMap::new(),
        }
    }

    /// Adds or replaces a mapping. The extension is stored lowercased.
    pub fn insert(&mut self, extension: &str, content_type: impl Into<String>) {
        self.by_extension
            .insert(extension.to_ascii_lowercase(), content_type.into());
    }

    /// Returns the content type registered for `extension`, if any.
    pub fn get(&self, extension: &str) -> Option<&str> {
        self.by_extension
            .get(&extension.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Resolves the content type for a request path.
    ///
    /// The extension is everything after the last `.` in the path. A path
    /// with no `.` is treated as a page and gets [`TEXT_HTML`]; an extension
    /// not in the table gets [`OCTET_STREAM`].
    pub fn for_path(&self, path: &str) -> &str {
        match extension(path) {
            None => TEXT_HTML,
            Some(ext) => self.get(ext).unwrap_or(OCTET_STREAM),
        }
    }
}

impl Default for MimeTypes {
    fn default() -> Self {
        let mut table = Self::empty();
        for (ext, content_type) in [
            ("html", TEXT_HTML),
            ("css", "text/css"),
            ("js", "text/javascript"),
            ("json", "application/json"),
            ("txt", "text/plain"),
            ("csv", "text/csv"),
            ("png", "image/png"),
            ("jpg", "image/jpg"),
            ("gif", "image/gif"),
            ("svg", "image/svg+xml"),
            ("ico", "image/x-icon"),
        ] {
            table.insert(ext, content_type);
        }
        table
    }
}

// Substring after the last `.`, which may still contain `/` (e.g. `/a.b/c`).
fn extension(path: &str) -> Option<&str> {
    path.rsplit_once('.').map(|(_, ext)| ext)
}
