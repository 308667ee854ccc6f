//! HTTP/1.1 response model.
//!
//! A [`Response`] is built by a handler (or by the static-file fallback) with
//! the fluent methods below and handed to the
//! [`ResponseWriter`](super::ResponseWriter) exactly once.

use bytes::Bytes;

use super::{Cookie, Headers, StatusCode};

/// An HTTP response, before serialization.
///
/// # Examples
///
/// ```
/// use stoa::http::{Cookie, Response, StatusCode};
///
/// let response = Response::new(StatusCode::Ok)
///     .body("<h1>hello</h1>")
///     .header("X-Request-Id", "abc-123")
///     .cookie(Cookie::new("username", "Naoki").http_only(true));
///
/// assert_eq!(response.status(), StatusCode::Ok);
/// assert_eq!(response.declared_content_type(), None);
/// assert_eq!(response.cookies().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    body: Bytes,
    content_type: Option<String>,
    headers: Headers,
    cookies: Vec<Cookie>,
}

impl Response {
    /// Creates a new response with the given status and an empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            body: Bytes::new(),
            content_type: None,
            headers: Headers::new(),
            cookies: Vec::new(),
        }
    }

    /// `200 OK` with an empty body.
    pub fn ok() -> Self {
        Self::new(StatusCode::Ok)
    }

    /// `302 Found` pointing at `location`.
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::new(StatusCode::Found).header("Location", location)
    }

    /// Sets the body from text, encoded as UTF-8.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Bytes::from(body.into());
        self
    }

    /// Sets the body from raw bytes.
    #[must_use]
    pub fn body_bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets an explicit `Content-Type`. When unset, the writer infers one
    /// from the request path.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Sets an extra header, written after the standard ones. Setting the same
    /// name twice keeps the last value.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Adds a cookie; each one becomes its own `Set-Cookie` line, in order.
    #[must_use]
    pub fn cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Returns the status code of this response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn payload(&self) -> &Bytes {
        &self.body
    }

    /// Returns the explicit content type, if one was set.
    pub fn declared_content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let r = Response::default();
        assert_eq!(r.status(), StatusCode::Ok);
        assert!(r.payload().is_empty());
        assert!(r.declared_content_type().is_none());
        assert!(r.headers().is_empty());
        assert!(r.cookies().is_empty());
    }

    #[test]
    fn text_body_is_utf8() {
        let r = Response::ok().body("日本語");
        assert_eq!(&r.payload()[..], "日本語".as_bytes());
        assert_eq!(r.payload().len(), 9);
    }

    #[test]
    fn redirect_sets_location() {
        let r = Response::redirect("/welcome");
        assert_eq!(r.status(), StatusCode::Found);
        assert_eq!(r.headers().get("Location"), Some("/welcome"));
    }

    #[test]
    fn extra_headers_keep_insertion_order() {
        let r = Response::ok()
            .header("X-B", "1")
            .header("X-A", "2")
            .header("X-B", "3");
        let pairs: Vec<_> = r.headers().iter().collect();
        assert_eq!(pairs, vec![("X-B", "3"), ("X-A", "2")]);
    }

    #[test]
    fn cookies_keep_order() {
        let r = Response::ok()
            .cookie(Cookie::new("b", "2"))
            .cookie(Cookie::new("a", "1"));
        let names: Vec<_> = r.cookies().iter().map(Cookie::name).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
