//! Ordered HTTP header list.
//!
//! Names are kept exactly as sent or set; lookup is case-sensitive. The
//! duplicate-key policy is chosen per call: [`Headers::insert`] overwrites an
//! existing entry in place, [`Headers::append`] always adds a new line.

use std::fmt;

/// An insertion-ordered list of `(name, value)` header pairs.
///
/// # Examples
///
/// ```
/// use stoa::http::Headers;
///
/// let mut headers = Headers::new();
/// headers.insert("Host", "localhost");
/// headers.insert("Accept", "*/*");
/// headers.insert("Host", "example.com");
///
/// // Overwritten in place, position kept.
/// let names: Vec<_> = headers.iter().map(|(name, _)| name).collect();
/// assert_eq!(names, ["Host", "Accept"]);
/// assert_eq!(headers.get("Host"), Some("example.com"));
/// assert_eq!(headers.get("host"), None);
///
/// headers.append("Set-Cookie", "a=1");
/// headers.append("Set-Cookie", "b=2");
/// assert_eq!(headers.to_string(), "Host: example.com\r\nAccept: */*\r\nSet-Cookie: a=1\r\nSet-Cookie: b=2\r\n");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    inner: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty header list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a header list with pre-allocated capacity for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
        }
    }

    /// Sets `name` to `value`. An existing entry with the same name is
    /// overwritten where it stands; otherwise the pair is appended.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.inner.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = value,
            None => self.inner.push((name, value)),
        }
    }

    /// Appends a header line, even if the name is already present.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value for `name`, or `None`. The name must match exactly.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if an entry with exactly this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.iter().any(|(k, _)| k == name)
    }

    /// Returns the number of header lines.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if there are no header lines.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns an iterator over all `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Renders each pair as a `name: value` line terminated by CRLF.
impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.inner {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}
