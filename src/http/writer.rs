//! Response serialization.
//!
//! Wire layout, in order:
//!
//! 1. `HTTP/1.1 <code> <reason>`
//! 2. `Date`, `Server`, `Content-Length`, `Connection: Close`, `Content-Type`
//! 3. one `Set-Cookie` per cookie, in the order they were added
//! 4. the response's extra headers, in insertion order
//! 5. a blank line, then the body bytes

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::{BufMut, BytesMut};

use super::{Headers, MimeTypes, Response, StatusCode};

/// Serializes [`Response`]s into HTTP/1.1 wire bytes.
///
/// Holds the read-only pieces of configuration the serializer needs: the MIME
/// table used when a response carries no explicit content type, and the
/// value of the `Server` header.
///
/// # Examples
///
/// ```
/// use stoa::http::{MimeTypes, Response, ResponseWriter};
///
/// let writer = ResponseWriter::new(MimeTypes::default(), "Stoa/0.1");
/// let bytes = writer.write("/style.css", &Response::ok().body("p {}"));
/// let text = std::str::from_utf8(&bytes).unwrap();
///
/// assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
/// assert!(text.contains("Content-Type: text/css\r\n"));
/// assert!(text.ends_with("\r\n\r\np {}"));
/// ```
#[derive(Debug, Clone)]
pub struct ResponseWriter {
    mime_types: MimeTypes,
    server_name: String,
}

impl ResponseWriter {
    pub fn new(mime_types: MimeTypes, server_name: impl Into<String>) -> Self {
        Self {
            mime_types,
            server_name: server_name.into(),
        }
    }

    /// Serializes `response` for a request to `path`, stamped with the current time.
    pub fn write(&self, path: &str, response: &Response) -> BytesMut {
        self.write_at(path, response, SystemTime::now())
    }

    /// Serializes `response` with an explicit `Date`. The response is only
    /// borrowed, so writing it twice at the same instant yields identical bytes.
    pub fn write_at(&self, path: &str, response: &Response, now: SystemTime) -> BytesMut {
        let status_line = status_line(response.status());
        let headers = self.header_lines(path, response, now);
        let head = format!("{status_line}{headers}\r\n");

        let body = response.payload();
        let mut buf = BytesMut::with_capacity(head.len() + body.len());
        buf.put(head.as_bytes());
        buf.put(&body[..]);
        buf
    }

    /// Returns the response's explicit content type, or the one inferred from
    /// the extension of `path`.
    pub fn resolve_content_type<'a>(&'a self, path: &str, response: &'a Response) -> &'a str {
        match response.declared_content_type() {
            Some(content_type) => content_type,
            None => self.mime_types.for_path(path),
        }
    }

    /// Builds every header line of the response in wire order.
    ///
    /// All lines are appended, so an extra header named like a standard one
    /// is written a second time rather than replacing it. `now` is clamped to
    /// the dates RFC 1123 can express.
    pub fn header_lines(&self, path: &str, response: &Response, now: SystemTime) -> Headers {
        let mut lines = Headers::with_capacity(5 + response.cookies().len() + response.headers().len());

        let latest = UNIX_EPOCH + Duration::from_secs(super::cookie::EXPIRES_LIMIT_SECS - 1);
        lines.append("Date", httpdate::fmt_http_date(now.clamp(UNIX_EPOCH, latest)));
        lines.append("Server", self.server_name.as_str());
        lines.append("Content-Length", response.payload().len().to_string());
        lines.append("Connection", "Close");
        lines.append("Content-Type", self.resolve_content_type(path, response));

        for cookie in response.cookies() {
            lines.append("Set-Cookie", cookie.to_string());
        }
        for (name, value) in response.headers().iter() {
            lines.append(name, value);
        }
        lines
    }
}

/// Renders the status line, including its trailing CRLF.
pub fn status_line(status: StatusCode) -> String {
    format!("HTTP/1.1 {status}\r\n")
}
