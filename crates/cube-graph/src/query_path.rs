use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use path_clean::PathClean;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Canonical logical path identifying a module in a build.
///
/// Local modules are addressed root-relative with forward slashes and a leading
/// `/` (`/src/app.js`, `/node_modules/lodash/index.js`). Paths carrying a scheme
/// prefix (`pkg:/lodash.js`, `https://cdn/x.js`) are kept verbatim; they name
/// modules that are never resolved from the local tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryPath(String);

impl QueryPath {
    /// Create a query path, normalising local paths.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, QueryPathError> {
        let raw = raw.as_ref().trim();
        if raw.is_empty() {
            return Err(QueryPathError::Empty);
        }

        if scheme_of(raw).is_some() {
            return Ok(Self(raw.to_string()));
        }

        Ok(Self(normalize_local(raw)))
    }

    /// The scheme prefix (without the colon), if any.
    pub fn scheme(&self) -> Option<&str> {
        scheme_of(&self.0)
    }

    /// Returns `true` for scheme-prefixed references, which are never resolved
    /// locally.
    pub fn is_remote(&self) -> bool {
        self.scheme().is_some()
    }

    /// The path with any scheme prefix removed, used to derive output locations.
    pub fn without_scheme(&self) -> &str {
        match self.scheme() {
            Some(scheme) => &self.0[scheme.len() + 1..],
            None => &self.0,
        }
    }

    /// Whether this path lives under the given root-relative directory
    /// (e.g. `node_modules`).
    pub fn is_within(&self, dir: &str) -> bool {
        is_within(self.without_scheme(), dir)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for QueryPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for QueryPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for QueryPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        QueryPath::new(value).map_err(serde::de::Error::custom)
    }
}

/// Error type for `QueryPath` construction failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryPathError {
    /// The provided path was empty.
    #[error("query path is empty")]
    Empty,
}

/// Returns the `\w+` scheme of `raw` when it starts with `scheme:`.
pub fn scheme_of(raw: &str) -> Option<&str> {
    let (scheme, _) = raw.split_once(':')?;
    if !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some(scheme)
    } else {
        None
    }
}

/// Whether a root-relative path lies under `dir` (given with or without slashes).
pub fn is_within(path: &str, dir: &str) -> bool {
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        return false;
    }
    path.trim_start_matches('/')
        .strip_prefix(dir)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Normalise a local path: forward slashes, leading `/`, `.`/`..` resolved.
pub fn normalize_local(raw: &str) -> String {
    let slashed = raw.replace('\\', "/");
    let rooted = if slashed.starts_with('/') {
        slashed
    } else {
        format!("/{slashed}")
    };

    let cleaned = Path::new(&rooted).clean();
    let text: Cow<'_, str> = cleaned.to_string_lossy();
    text.replace('\\', "/")
}
