//! Static-file fallback for paths no route claims.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::http::{Response, StatusCode, mime::TEXT_HTML};

/// Body of the `404 Not Found` page.
pub const NOT_FOUND_BODY: &str = "<html><body><h1>404 Not Found</h1></body></html>";

/// Maps a request path onto the static root by dropping leading slashes.
///
/// The path is not normalized: `..` segments are joined as-is and can point
/// outside `root`.
pub fn resolve(root: &Path, path: &str) -> PathBuf {
    root.join(path.trim_start_matches('/'))
}

/// Reads the file behind `path` into a `200` response with no explicit
/// content type, so the writer infers it from the extension.
///
/// Any file-system failure (missing, unreadable, a directory) becomes the
/// fixed `404` page.
pub async fn serve(root: &Path, path: &str) -> Response {
    let file = resolve(root, path);
    match tokio::fs::read(&file).await {
        Ok(contents) => Response::ok().body_bytes(contents),
        Err(e) => {
            debug!(file = %file.display(), error = %e, "static file unavailable");
            not_found()
        }
    }
}

/// The fixed `404 Not Found` HTML page.
pub fn not_found() -> Response {
    Response::new(StatusCode::NotFound)
        .body(NOT_FOUND_BODY)
        .content_type(TEXT_HTML)
}
