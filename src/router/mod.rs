//! Request routing: map URL patterns to handler functions.
//!
//! A pattern is a path template where `<name>` stands for one path segment:
//!
//! | Pattern                  | Example match                 | Captured params      |
//! |--------------------------|-------------------------------|----------------------|
//! | `/now`                   | `/now`, `/nowhere`            | *(none)*             |
//! | `/user/<user_id>/profile`| `/user/42/profile`            | `user_id → "42"`     |
//! | `/files/<name>.txt`      | `/files/notes.txt`            | `name → "notes"`     |
//!
//! Matching is anchored at the start of the path only: the pattern has to
//! match a prefix of the path, not all of it. Routes are tried in
//! registration order and the first match wins; there is no specificity
//! ranking. When nothing matches, [`Router::resolve`] returns `None` and the
//! caller decides what to serve instead.

use std::fmt::Write as _;
use std::pin::Pin;
use std::sync::Arc;

use regex::Regex;
use thiserror::Error;

use crate::http::{Params, Request, Response};

/// Error type handlers may return. Any error converts into it with `?`.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// What a handler's future resolves to.
pub type HandlerResult = Result<Response, HandlerError>;

/// Boxed future returned by an erased [`Handler`].
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send + 'static>>;

/// Type-erased, heap-allocated async handler that turns a [`Request`] into a
/// [`Response`].
///
/// Handlers are stored behind `Arc<dyn Fn(…)>` so they can be cloned into
/// each connection task without copying the underlying closure. Register them
/// with [`Router::route`] rather than building this type by hand.
pub type Handler = Arc<dyn Fn(Request) -> HandlerFuture + Send + Sync + 'static>;

/// Conversion trait for async handler functions.
///
/// Any `Fn(Request) -> impl Future<Output = HandlerResult> + Send` that is
/// also `Send + Sync + 'static` implements this trait through the blanket
/// impl below.
pub trait IntoHandler: Send + Sync + 'static {
    /// Call the handler with the given request, boxing the returned future.
    fn call(&self, request: Request) -> HandlerFuture;
}

impl<T, F> IntoHandler for T
where
    T: Fn(Request) -> F + Send + Sync + 'static,
    F: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, request: Request) -> HandlerFuture {
        Box::pin((self)(request))
    }
}

/// Errors raised while registering a route.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid placeholder <{name}> in pattern {pattern:?}: names must be identifiers")]
    InvalidPlaceholder { pattern: String, name: String },

    #[error("pattern {pattern:?} does not compile: {source}")]
    Compile {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    template: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles a template such as `/user/<user_id>/profile`.
    ///
    /// Literal text is matched as-is. Each `<name>` becomes a capture of one
    /// or more characters other than `/`. A `<` with no closing `>` is
    /// literal text.
    ///
    /// # Errors
    ///
    /// [`RouteError::InvalidPlaceholder`] if a name is not an identifier,
    /// [`RouteError::Compile`] if the template cannot be compiled (for
    /// example when the same name is used twice).
    pub fn parse(template: &str) -> Result<Self, RouteError> {
        let mut expr = String::from("^");
        let mut rest = template;

        while let Some(open) = rest.find('<') {
            let Some(len) = rest[open + 1..].find('>') else {
                break;
            };
            let name = &rest[open + 1..open + 1 + len];
            if !is_identifier(name) {
                return Err(RouteError::InvalidPlaceholder {
                    pattern: template.to_owned(),
                    name: name.to_owned(),
                });
            }
            expr.push_str(&regex::escape(&rest[..open]));
            let _ = write!(expr, "(?P<{name}>[^/]+)");
            rest = &rest[open + len + 2..];
        }
        expr.push_str(&regex::escape(rest));

        let regex = Regex::new(&expr).map_err(|source| RouteError::Compile {
            pattern: template.to_owned(),
            source,
        })?;

        Ok(Self {
            template: template.to_owned(),
            regex,
        })
    }

    /// The template this pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Matches a prefix of `path`, returning the captured parameters.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let captures = self.regex.captures(path)?;
        Some(
            self.regex
                .capture_names()
                .flatten()
                .filter_map(|name| captures.name(name).map(|m| (name, m.as_str())))
                .collect(),
        )
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// A single registered route binding a pattern to a handler.
struct Route {
    pattern: Pattern,
    handler: Handler,
}

/// The outcome of a successful [`Router::resolve`].
pub struct Match<'r> {
    pub pattern: &'r str,
    pub handler: &'r Handler,
    pub params: Params,
}

/// Ordered list of `(pattern, handler)` pairs.
///
/// Built once at startup and shared read-only by every connection.
///
/// # Examples
///
/// ```rust
/// use stoa::{Response, Router};
///
/// let mut router = Router::new();
/// router
///     .route("/now", |_req| async { Ok(Response::ok().body("now")) })?
///     .route("/user/<user_id>/profile", |req: stoa::Request| async move {
///         let id = req.param("user_id").unwrap_or_default().to_owned();
///         Ok(Response::ok().body(id))
///     })?;
///
/// let hit = router.resolve("/user/42/profile").unwrap();
/// assert_eq!(hit.params.get("user_id"), Some("42"));
/// assert!(router.resolve("/user/42").is_none());
/// # Ok::<(), stoa::router::RouteError>(())
/// ```
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Create a new, empty `Router` with no registered routes.
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register `handler` for paths starting with `pattern`.
    ///
    /// Routes registered earlier take precedence.
    ///
    /// # Errors
    ///
    /// Returns a [`RouteError`] if the pattern does not compile.
    pub fn route(&mut self, pattern: &str, handler: impl IntoHandler) -> Result<&mut Self, RouteError> {
        let pattern = Pattern::parse(pattern)?;
        let handler: Handler = Arc::new(move |request| handler.call(request));
        self.routes.push(Route { pattern, handler });
        Ok(self)
    }

    /// Return the number of routes registered in this router.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Return `true` if no routes have been registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find the first route whose pattern matches `path`.
    pub fn resolve(&self, path: &str) -> Option<Match<'_>> {
        self.routes.iter().find_map(|route| {
            route.pattern.matches(path).map(|params| Match {
                pattern: route.pattern.as_str(),
                handler: &route.handler,
                params,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::StatusCode;

    fn make_request(path: &str) -> Request {
        let raw = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n");
        Request::parse(raw.as_bytes()).unwrap()
    }

    async fn status_of(router: &Router, path: &str) -> Option<StatusCode> {
        let hit = router.resolve(path)?;
        let response = (hit.handler)(make_request(path)).await.unwrap();
        Some(response.status())
    }

    // ── Pattern ───────────────────────────────────────────────────────────────

    #[test]
    fn literal_pattern_is_prefix_anchored() {
        let pat = Pattern::parse("/now").unwrap();
        assert!(pat.matches("/now").is_some());
        assert!(pat.matches("/nowhere").is_some());
        assert!(pat.matches("/now/later").is_some());
        assert!(pat.matches("/a/now").is_none());
    }

    #[test]
    fn root_pattern_matches_everything() {
        let pat = Pattern::parse("/").unwrap();
        assert!(pat.matches("/").is_some());
        assert!(pat.matches("/style.css").is_some());
    }

    #[test]
    fn placeholder_captures_one_segment() {
        let pat = Pattern::parse("/user/<user_id>/profile").unwrap();
        let params = pat.matches("/user/42/profile").unwrap();
        assert_eq!(params.get("user_id"), Some("42"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn placeholder_requires_the_rest_of_the_pattern() {
        let pat = Pattern::parse("/user/<user_id>/profile").unwrap();
        assert!(pat.matches("/user/42").is_none());
        assert!(pat.matches("/user//profile").is_none());
        assert!(pat.matches("/user/4/2/profile").is_none());
    }

    #[test]
    fn trailing_path_after_pattern_still_matches() {
        let pat = Pattern::parse("/user/<user_id>/profile").unwrap();
        let params = pat.matches("/user/7/profile/edit").unwrap();
        assert_eq!(params.get("user_id"), Some("7"));
    }

    #[test]
    fn trailing_placeholder_is_greedy_within_segment() {
        let pat = Pattern::parse("/user/<user_id>").unwrap();
        let params = pat.matches("/user/42/profile").unwrap();
        assert_eq!(params.get("user_id"), Some("42"));
    }

    #[test]
    fn multiple_placeholders() {
        let pat = Pattern::parse("/blog/<year>/<slug>").unwrap();
        let params = pat.matches("/blog/2024/hello-world").unwrap();
        assert_eq!(params.get("year"), Some("2024"));
        assert_eq!(params.get("slug"), Some("hello-world"));
    }

    #[test]
    fn placeholder_followed_by_literal_in_same_segment() {
        let pat = Pattern::parse("/files/<name>.txt").unwrap();
        let params = pat.matches("/files/notes.v2.txt").unwrap();
        assert_eq!(params.get("name"), Some("notes.v2"));
        assert!(pat.matches("/files/notes.csv").is_none());
    }

    #[test]
    fn literal_text_is_not_a_regex() {
        let pat = Pattern::parse("/a.b").unwrap();
        assert!(pat.matches("/a.b").is_some());
        assert!(pat.matches("/axb").is_none());
        let pat = Pattern::parse("/c++/<x>").unwrap();
        assert!(pat.matches("/c++/1").is_some());
    }

    #[test]
    fn unclosed_bracket_is_literal() {
        let pat = Pattern::parse("/a<b").unwrap();
        assert!(pat.matches("/a<b").is_some());
    }

    #[test]
    fn invalid_placeholder_names() {
        assert!(matches!(
            Pattern::parse("/user/<user-id>"),
            Err(RouteError::InvalidPlaceholder { name, .. }) if name == "user-id"
        ));
        assert!(matches!(
            Pattern::parse("/x/<>"),
            Err(RouteError::InvalidPlaceholder { .. })
        ));
        assert!(matches!(
            Pattern::parse("/x/<1st>"),
            Err(RouteError::InvalidPlaceholder { .. })
        ));
    }

    #[test]
    fn duplicate_placeholder_fails_to_compile() {
        assert!(matches!(
            Pattern::parse("/<id>/<id>"),
            Err(RouteError::Compile { .. })
        ));
    }

    // ── Router ────────────────────────────────────────────────────────────────

    #[test]
    fn router_starts_empty() {
        let router = Router::default();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
        assert!(router.resolve("/").is_none());
    }

    #[test]
    fn router_rejects_bad_pattern_without_registering() {
        let mut router = Router::new();
        assert!(router.route("/<bad name>", |_req| async { Ok(Response::ok()) }).is_err());
        assert!(router.is_empty());
    }

    #[tokio::test]
    async fn first_registered_route_wins() {
        let mut router = Router::new();
        router
            .route("/user", |_req| async { Ok(Response::ok()) })
            .unwrap()
            .route("/user/<user_id>/profile", |_req| async {
                Ok(Response::new(StatusCode::Created))
            })
            .unwrap();

        // The shorter, earlier pattern shadows the more specific one.
        assert_eq!(status_of(&router, "/user/42/profile").await, Some(StatusCode::Ok));
        assert_eq!(router.resolve("/user/42/profile").unwrap().pattern, "/user");
    }

    #[tokio::test]
    async fn later_route_reached_when_earlier_ones_miss() {
        let mut router = Router::new();
        router
            .route("/now", |_req| async { Ok(Response::ok()) })
            .unwrap()
            .route("/parameters", |_req| async {
                Ok(Response::new(StatusCode::MethodNotAllowed))
            })
            .unwrap();
        assert_eq!(
            status_of(&router, "/parameters").await,
            Some(StatusCode::MethodNotAllowed)
        );
        assert_eq!(status_of(&router, "/style.css").await, None);
    }

    #[tokio::test]
    async fn handler_receives_request() {
        let mut router = Router::new();
        router
            .route("/echo", |req: Request| async move {
                Ok(Response::ok().body(req.path().to_owned()))
            })
            .unwrap();
        let hit = router.resolve("/echo/me").unwrap();
        let response = (hit.handler)(make_request("/echo/me")).await.unwrap();
        assert_eq!(&response.payload()[..], b"/echo/me");
    }

    #[tokio::test]
    async fn handler_errors_are_returned() {
        let mut router = Router::new();
        router
            .route("/boom", |_req| async {
                let n: u32 = "nope".parse()?;
                Ok::<_, HandlerError>(Response::ok().body(n.to_string()))
            })
            .unwrap();
        let hit = router.resolve("/boom").unwrap();
        assert!((hit.handler)(make_request("/boom")).await.is_err());
    }
}
