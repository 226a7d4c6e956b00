//! Qualified field paths.
//!
//! Every cell in a form is addressed by a dot-joined sequence of segments such
//! as `"address.street"` or `"tags.3f2a9c"`. [`FieldPath`] is the owned,
//! normalized representation of such a name.
//!
//! # Usage
//!
//! ```rust
//! use formwork::FieldPath;
//!
//! let path = FieldPath::parse("address.street.line1")?;
//! assert_eq!(path.first(), "address");
//! assert_eq!(path.last(), "line1");
//! assert_eq!(path.parent().unwrap().as_str(), "address.street");
//!
//! // Joining is infallible and normalizes its input
//! let child = path.join("..extra");
//! assert_eq!(child.as_str(), "address.street.line1.extra");
//! # Ok::<(), formwork::path::PathError>(())
//! ```

use std::{borrow::Borrow, fmt, str::FromStr};

use thiserror::Error;

use crate::constants::{SEPARATOR, SEPARATOR_STR};

/// Error type for path validation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// The name was empty once normalized (e.g. `""` or `"..."`).
    #[error("Field name '{input}' is empty after normalization")]
    Empty { input: String },

    /// A single segment was expected but the input contains the separator.
    #[error("Invalid segment '{segment}': segments cannot contain '.'")]
    InvalidSegment { segment: String },
}

impl PathError {
    /// Check if this error was caused by an empty name
    pub fn is_empty_error(&self) -> bool {
        matches!(self, PathError::Empty { .. })
    }
}

impl From<PathError> for crate::Error {
    fn from(err: PathError) -> Self {
        crate::Error::Path(err)
    }
}

/// Normalizes a dotted name by dropping empty segments.
///
/// - `".user"` → `"user"`
/// - `"user."` → `"user"`
/// - `"user..profile"` → `"user.profile"`
/// - `"..."` → `""`
///
/// ```rust
/// # use formwork::path::normalize_path;
/// assert_eq!(normalize_path("user..profile."), "user.profile");
/// assert_eq!(normalize_path("..."), "");
/// ```
pub fn normalize_path(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    input
        .split(SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(SEPARATOR_STR)
}

/// Validates that `segment` can be used as a single path segment.
pub fn validate_segment(segment: &str) -> Result<(), PathError> {
    if segment.is_empty() {
        return Err(PathError::Empty {
            input: segment.to_string(),
        });
    }
    if segment.contains(SEPARATOR) {
        return Err(PathError::InvalidSegment {
            segment: segment.to_string(),
        });
    }
    Ok(())
}

/// An owned, normalized, non-empty qualified field path.
///
/// A `FieldPath` always has at least one segment. The top-level segment is
/// the form-level field id the path belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    inner: String,
}

impl FieldPath {
    /// Parses and normalizes a dotted name.
    ///
    /// # Errors
    /// Returns [`PathError::Empty`] if nothing is left after normalization.
    pub fn parse(name: impl AsRef<str>) -> Result<Self, PathError> {
        let input = name.as_ref();
        let inner = normalize_path(input);
        if inner.is_empty() {
            return Err(PathError::Empty {
                input: input.to_string(),
            });
        }
        Ok(Self { inner })
    }

    /// Builds a path from individual segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut inner = String::new();
        for segment in segments {
            let segment = segment.as_ref();
            validate_segment(segment)?;
            if !inner.is_empty() {
                inner.push(SEPARATOR);
            }
            inner.push_str(segment);
        }
        Self::parse(inner)
    }

    /// Appends `suffix` (normalized, possibly several segments) to this path.
    pub fn join(&self, suffix: impl AsRef<str>) -> Self {
        let normalized = normalize_path(suffix.as_ref());
        if normalized.is_empty() {
            return self.clone();
        }
        let mut inner = String::with_capacity(self.inner.len() + 1 + normalized.len());
        inner.push_str(&self.inner);
        inner.push(SEPARATOR);
        inner.push_str(&normalized);
        Self { inner }
    }

    /// Returns an iterator over the segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.inner.split(SEPARATOR)
    }

    /// Number of segments (always at least one).
    pub fn len(&self) -> usize {
        self.segments().count()
    }

    /// Always `false`; a `FieldPath` cannot be empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns `true` for a single-segment (form-level) path.
    pub fn is_top_level(&self) -> bool {
        !self.inner.contains(SEPARATOR)
    }

    /// The top-level segment.
    pub fn first(&self) -> &str {
        match self.inner.find(SEPARATOR) {
            Some(idx) => &self.inner[..idx],
            None => &self.inner,
        }
    }

    /// The last segment.
    pub fn last(&self) -> &str {
        match self.inner.rfind(SEPARATOR) {
            Some(idx) => &self.inner[idx + 1..],
            None => &self.inner,
        }
    }

    /// The immediate parent, or `None` for a top-level path.
    pub fn parent(&self) -> Option<FieldPath> {
        self.inner.rfind(SEPARATOR).map(|idx| FieldPath {
            inner: self.inner[..idx].to_string(),
        })
    }

    /// All proper prefixes, shortest first.
    ///
    /// `"a.b.c"` yields `"a"` then `"a.b"`.
    pub fn ancestors(&self) -> Vec<FieldPath> {
        self.inner
            .match_indices(SEPARATOR)
            .map(|(idx, _)| FieldPath {
                inner: self.inner[..idx].to_string(),
            })
            .collect()
    }

    /// Returns `true` if `self` is a strict descendant of `other`.
    pub fn starts_with(&self, other: &FieldPath) -> bool {
        self.inner.len() > other.inner.len()
            && self.inner.starts_with(other.as_str())
            && self.inner[other.inner.len()..].starts_with(SEPARATOR)
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = PathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for FieldPath {
    type Error = PathError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.inner
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl Borrow<str> for FieldPath {
    fn borrow(&self) -> &str {
        &self.inner
    }
}

impl PartialEq<str> for FieldPath {
    fn eq(&self, other: &str) -> bool {
        self.inner == other
    }
}

impl PartialEq<&str> for FieldPath {
    fn eq(&self, other: &&str) -> bool {
        self.inner == *other
    }
}
