//! `Set-Cookie` descriptors.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use httpdate::HttpDate;
use thiserror::Error;

// 10000-01-01T00:00:00Z; RFC 1123 dates have a four-digit year.
pub(crate) const EXPIRES_LIMIT_SECS: u64 = 253_402_300_800;

/// A cookie attribute that cannot be rendered.
#[derive(Debug, Error)]
pub enum CookieError {
    #[error("cookie expiry {at:?} is outside 1970..=9999")]
    ExpiresOutOfRange { at: SystemTime },
}

/// A cookie to be sent to the client in a `Set-Cookie` header.
///
/// Built once with the consuming builder methods and not mutated afterwards.
/// The [`Display`](fmt::Display) impl renders the header value: `name=value`
/// followed by each attribute that is set, in the fixed order `Expires`,
/// `Max-Age`, `Domain`, `Path`, `Secure`, `HttpOnly`.
///
/// # Examples
///
/// ```
/// use stoa::http::Cookie;
///
/// let cookie = Cookie::new("username", "Naoki").http_only(true);
/// assert_eq!(cookie.to_string(), "username=Naoki; HttpOnly");
///
/// let session = Cookie::new("sid", "abc").max_age(3600).path("/").secure(true);
/// assert_eq!(session.to_string(), "sid=abc; Max-Age=3600; Path=/; Secure");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
    expires: Option<HttpDate>,
    max_age: Option<i64>,
    domain: Option<String>,
    path: Option<String>,
    secure: bool,
    http_only: bool,
}

impl Cookie {
    /// Creates a session cookie with no attributes.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires: None,
            max_age: None,
            domain: None,
            path: None,
            secure: false,
            http_only: false,
        }
    }

    /// Absolute expiry time, rendered as an RFC 1123 date.
    ///
    /// # Errors
    ///
    /// Returns [`CookieError::ExpiresOutOfRange`] for times before the Unix
    /// epoch or from year 10000 on.
    pub fn expires(mut self, at: SystemTime) -> Result<Self, CookieError> {
        let in_range = at
            .duration_since(UNIX_EPOCH)
            .is_ok_and(|since| since.as_secs() < EXPIRES_LIMIT_SECS);
        if !in_range {
            return Err(CookieError::ExpiresOutOfRange { at });
        }
        self.expires = Some(HttpDate::from(at));
        Ok(self)
    }

    /// Lifetime in seconds. Zero or negative asks the client to drop the cookie.
    #[must_use]
    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some(at) = self.expires {
            write!(f, "; Expires={at}")?;
        }
        if let Some(seconds) = self.max_age {
            write!(f, "; Max-Age={seconds}")?;
        }
        if let Some(domain) = &self.domain {
            write!(f, "; Domain={domain}")?;
        }
        if let Some(path) = &self.path {
            write!(f, "; Path={path}")?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn bare_cookie() {
        assert_eq!(Cookie::new("email", "a@b.com").to_string(), "email=a@b.com");
    }

    #[test]
    fn all_attributes_in_fixed_order() {
        let at = UNIX_EPOCH + Duration::from_secs(784_111_777);
        let cookie = Cookie::new("id", "7")
            .http_only(true)
            .secure(true)
            .path("/app")
            .domain("example.com")
            .max_age(60)
            .expires(at)
            .unwrap();
        assert_eq!(
            cookie.to_string(),
            "id=7; Expires=Sun, 06 Nov 1994 08:49:37 GMT; Max-Age=60; \
             Domain=example.com; Path=/app; Secure; HttpOnly"
        );
    }

    #[test]
    fn false_flags_are_omitted() {
        let cookie = Cookie::new("a", "b").secure(false).http_only(false);
        assert_eq!(cookie.to_string(), "a=b");
    }

    #[test]
    fn negative_max_age_is_rendered() {
        assert_eq!(Cookie::new("a", "").max_age(-1).to_string(), "a=; Max-Age=-1");
    }

    #[test]
    fn expires_before_epoch_is_rejected() {
        let at = UNIX_EPOCH - Duration::from_secs(1);
        let err = Cookie::new("a", "b").expires(at).unwrap_err();
        assert!(matches!(err, CookieError::ExpiresOutOfRange { .. }));
    }

    #[test]
    fn expires_past_year_9999_is_rejected() {
        let last = UNIX_EPOCH + Duration::from_secs(EXPIRES_LIMIT_SECS - 1);
        assert_eq!(
            Cookie::new("a", "b").expires(last).unwrap().to_string(),
            "a=b; Expires=Fri, 31 Dec 9999 23:59:59 GMT"
        );

        let at = UNIX_EPOCH + Duration::from_secs(EXPIRES_LIMIT_SECS);
        assert!(Cookie::new("a", "b").expires(at).is_err());
    }

    #[test]
    fn epoch_itself_is_accepted() {
        let cookie = Cookie::new("a", "b").expires(UNIX_EPOCH).unwrap();
        assert_eq!(cookie.to_string(), "a=b; Expires=Thu, 01 Jan 1970 00:00:00 GMT");
    }
}
