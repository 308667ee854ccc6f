//! HTTP/1.1 request parsing.
//!
//! The parser works on a single buffer pulled from the socket. It splits the
//! buffer on the first CRLF (request line), then on the first blank line
//! (header block / body). The body is whatever follows the blank line;
//! `Content-Length` is not consulted.

use std::collections::HashMap;
use std::str;

use bytes::Bytes;
use thiserror::Error;

use super::{Headers, Method};

const CRLF: &[u8] = b"\r\n";
const BLANK_LINE: &[u8] = b"\r\n\r\n";

/// The framing of a raw request was violated.
#[derive(Debug, Error)]
pub enum MalformedRequest {
    #[error("malformed request: no CRLF after the request line")]
    MissingRequestLine,

    #[error("malformed request: no blank line after the header block")]
    MissingHeaderTerminator,

    #[error("malformed request: request line has {found} space-separated tokens, expected 3")]
    InvalidRequestLine { found: usize },

    #[error("malformed request: header line without a colon: {line:?}")]
    InvalidHeader { line: String },

    #[error("malformed request: request head is not valid UTF-8: {0}")]
    Encoding(#[from] str::Utf8Error),
}

/// Values captured by route placeholders, keyed by placeholder name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    map: HashMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.map.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// A parsed HTTP request.
///
/// Created by [`Request::parse`]; the router fills [`params`](Self::params)
/// once a pattern matches. Read-only after that.
///
/// # Examples
///
/// ```
/// use stoa::http::Request;
///
/// let raw = b"POST /parameters HTTP/1.1\r\nHost: localhost\r\nCookie: username=Naoki; email=a@b.com\r\n\r\nfoo=bar";
/// let request = Request::parse(raw).unwrap();
///
/// assert_eq!(request.method().as_str(), "POST");
/// assert_eq!(request.path(), "/parameters");
/// assert_eq!(request.version(), "HTTP/1.1");
/// assert_eq!(request.headers().get("Host"), Some("localhost"));
/// assert_eq!(request.cookie("email"), Some("a@b.com"));
/// assert_eq!(&request.body()[..], b"foo=bar");
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    version: String,
    headers: Headers,
    cookies: HashMap<String, String>,
    body: Bytes,
    params: Params,
}

impl Request {
    /// Parses a raw request buffer.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedRequest`] when there is no CRLF after the request
    /// line, no blank line after the headers, the request line is not exactly
    /// three tokens separated by single spaces, a header line has no colon, or
    /// the request line or header block is not UTF-8.
    pub fn parse(raw: &[u8]) -> Result<Self, MalformedRequest> {
        let (request_line, rest) =
            split_once(raw, CRLF).ok_or(MalformedRequest::MissingRequestLine)?;
        let (header_block, body) =
            split_once(rest, BLANK_LINE).ok_or(MalformedRequest::MissingHeaderTerminator)?;

        let tokens: Vec<&str> = str::from_utf8(request_line)?.split(' ').collect();
        let [method, path, version] = tokens[..] else {
            return Err(MalformedRequest::InvalidRequestLine {
                found: tokens.len(),
            });
        };

        let headers = parse_headers(str::from_utf8(header_block)?)?;
        let cookies = headers.get("Cookie").map(parse_cookies).unwrap_or_default();

        Ok(Self {
            method: Method::from(method),
            path: path.to_owned(),
            version: version.to_owned(),
            headers,
            cookies,
            body: Bytes::copy_from_slice(body),
            params: Params::new(),
        })
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request target exactly as sent. No query splitting or
    /// percent-decoding is applied.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the protocol version token, e.g. `HTTP/1.1`.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns all cookies from the `Cookie` header.
    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    /// Returns a single cookie value by name.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Returns the bytes following the blank line.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the route parameters captured for this request.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Returns a single route parameter by placeholder name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub(crate) fn set_params(&mut self, params: Params) {
        self.params = params;
    }
}

fn split_once<'a>(haystack: &'a [u8], needle: &[u8]) -> Option<(&'a [u8], &'a [u8])> {
    let pos = haystack
        .windows(needle.len())
        .position(|window| window == needle)?;
    Some((&haystack[..pos], &haystack[pos + needle.len()..]))
}

// Each non-empty line splits on its first colon; spaces after the colon are
// dropped. A repeated name overwrites the earlier value.
fn parse_headers(block: &str) -> Result<Headers, MalformedRequest> {
    let mut headers = Headers::new();
    for line in block.split("\r\n").filter(|line| !line.is_empty()) {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| MalformedRequest::InvalidHeader {
                line: line.to_owned(),
            })?;
        headers.insert(name, value.trim_start_matches(' '));
    }
    Ok(headers)
}

// Segments without `=` carry no name/value pair and are skipped.
fn parse_cookies(header: &str) -> HashMap<String, String> {
    header
        .split("; ")
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| (name.to_owned(), value.to_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let raw = b"GET /index.html HTTP/1.1\r\nHost: localhost:8080\r\nAccept: */*\r\n\r\n";
        let req = Request::parse(raw).unwrap();
        assert_eq!(req.method(), &Method::Get);
        assert_eq!(req.path(), "/index.html");
        assert_eq!(req.version(), "HTTP/1.1");
        assert_eq!(req.headers().get("Host"), Some("localhost:8080"));
        assert_eq!(req.headers().len(), 2);
        assert!(req.body().is_empty());
        assert!(req.cookies().is_empty());
        assert!(req.params().is_empty());
    }

    #[test]
    fn header_names_keep_case_and_last_write_wins() {
        let raw = b"GET / HTTP/1.1\r\nx-token: a\r\nX-Token: b\r\nx-token: c\r\n\r\n";
        let req = Request::parse(raw).unwrap();
        assert_eq!(req.headers().get("x-token"), Some("c"));
        assert_eq!(req.headers().get("X-Token"), Some("b"));
    }

    #[test]
    fn header_value_spacing() {
        let raw = b"GET / HTTP/1.1\r\nA:no-space\r\nB:    padded \r\nC: x: y\r\n\r\n";
        let req = Request::parse(raw).unwrap();
        assert_eq!(req.headers().get("A"), Some("no-space"));
        // Only leading spaces are consumed by the separator.
        assert_eq!(req.headers().get("B"), Some("padded "));
        assert_eq!(req.headers().get("C"), Some("x: y"));
    }

    #[test]
    fn cookies_are_parsed() {
        let raw = b"GET / HTTP/1.1\r\nCookie: username=Naoki; email=a@b.com\r\n\r\n";
        let req = Request::parse(raw).unwrap();
        let expected: HashMap<String, String> = [("username", "Naoki"), ("email", "a@b.com")]
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        assert_eq!(req.cookies(), &expected);
    }

    #[test]
    fn cookie_value_may_contain_equals() {
        let raw = b"GET / HTTP/1.1\r\nCookie: token=a=b; flag\r\n\r\n";
        let req = Request::parse(raw).unwrap();
        assert_eq!(req.cookie("token"), Some("a=b"));
        assert_eq!(req.cookies().len(), 1);
    }

    #[test]
    fn body_is_taken_verbatim() {
        let raw = b"POST /upload HTTP/1.1\r\nContent-Length: 2\r\n\r\nabc\r\n\r\n\xff";
        let req = Request::parse(raw).unwrap();
        assert_eq!(&req.body()[..], b"abc\r\n\r\n\xff");
    }

    #[test]
    fn method_is_not_validated() {
        let raw = b"brew /pot HTTP/1.1\r\nHost: x\r\n\r\n";
        let req = Request::parse(raw).unwrap();
        assert_eq!(req.method().as_str(), "brew");
    }

    #[test]
    fn missing_crlf() {
        let err = Request::parse(b"GET / HTTP/1.1").unwrap_err();
        assert!(matches!(err, MalformedRequest::MissingRequestLine));
        assert!(matches!(
            Request::parse(b"").unwrap_err(),
            MalformedRequest::MissingRequestLine
        ));
    }

    #[test]
    fn missing_blank_line() {
        let err = Request::parse(b"GET / HTTP/1.1\r\nHost: x\r\n").unwrap_err();
        assert!(matches!(err, MalformedRequest::MissingHeaderTerminator));
    }

    #[test]
    fn headerless_request_has_no_blank_line() {
        // The remainder after the request line is a lone CRLF.
        let err = Request::parse(b"GET / HTTP/1.1\r\n\r\n").unwrap_err();
        assert!(matches!(err, MalformedRequest::MissingHeaderTerminator));
    }

    #[test]
    fn request_line_token_count() {
        let err = Request::parse(b"GET /\r\nHost: x\r\n\r\n").unwrap_err();
        assert!(matches!(err, MalformedRequest::InvalidRequestLine { found: 2 }));

        // Double space yields an empty fourth token.
        let err = Request::parse(b"GET  / HTTP/1.1\r\nHost: x\r\n\r\n").unwrap_err();
        assert!(matches!(err, MalformedRequest::InvalidRequestLine { found: 4 }));
    }

    #[test]
    fn header_without_colon() {
        let err = Request::parse(b"GET / HTTP/1.1\r\nHost x\r\n\r\n").unwrap_err();
        match err {
            MalformedRequest::InvalidHeader { line } => assert_eq!(line, "Host x"),
            other => panic!("expected InvalidHeader, got {other:?}"),
        }
    }

    #[test]
    fn non_utf8_request_line() {
        let err = Request::parse(b"GET /\xff HTTP/1.1\r\nHost: x\r\n\r\n").unwrap_err();
        assert!(matches!(err, MalformedRequest::Encoding(_)));
    }

    #[test]
    fn params_from_iter() {
        let params: Params = [("user_id", "42")].into_iter().collect();
        assert_eq!(params.get("user_id"), Some("42"));
        assert_eq!(params.len(), 1);
    }
}
