//! Key paths: ordered key segments addressing a value inside a tree.

use std::fmt;
use std::ops::{Add, AddAssign};

use itertools::Itertools;
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::error::{KeyTreeError, KeyTreeResult};

/// Segment separator of the textual form, `"a.b.c"`.
pub const SEPARATOR: char = '.';

/// Ordered sequence of key segments.
///
/// Built from a dot separated string, a single key, or a sequence of keys.
/// Segments are always copied into the path, never shared.
///
/// ```
/// use keytree::Path;
///
/// let path = Path::from("a.b.c");
/// assert!(path.has_prefix(&Path::from("a.b")));
/// assert_eq!(path.drop_prefix(&Path::from("a.b")).unwrap(), Path::from("c"));
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(Vec<String>);

impl Path {
    /// The empty path, identity of concatenation and prefix of every path.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Path without its last segment, `None` for the empty path.
    pub fn parent(&self) -> Option<Path> {
        self.0
            .split_last()
            .map(|(_, init)| Path(init.to_vec()))
    }

    /// Dotted textual form.
    pub fn join(&self) -> String {
        self.0.iter().join(&SEPARATOR.to_string())
    }

    /// New path with the segments of `other` appended.
    pub fn concat(&self, other: impl Into<Path>) -> Path {
        let mut result = self.clone();
        result.push(other);
        result
    }

    /// New path with a single raw segment appended, dots included verbatim.
    pub fn child(&self, segment: &str) -> Path {
        let mut result = self.clone();
        result.0.push(segment.to_string());
        result
    }

    /// Append the segments of `other` in place.
    pub fn push(&mut self, other: impl Into<Path>) {
        self.0.extend(other.into().0);
    }

    /// Is `prefix` a leading run of this path's segments?
    ///
    /// A longer `prefix` is never a prefix, and the empty path is a prefix
    /// of every path, itself included.
    pub fn has_prefix(&self, prefix: &Path) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// True when one of the two paths is a strict ancestor of the other.
    ///
    /// Equal paths never conflict.
    pub fn conflicts_with(&self, other: &Path) -> bool {
        self != other && (self.has_prefix(other) || other.has_prefix(self))
    }

    /// Suffix left after removing the leading `prefix`.
    pub fn drop_prefix(&self, prefix: &Path) -> KeyTreeResult<Path> {
        if !self.has_prefix(prefix) {
            return Err(KeyTreeError::KeyNotFound(prefix.clone()));
        }
        Ok(Path(self.0[prefix.len()..].to_vec()))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.join())
    }
}

impl From<&str> for Path {
    fn from(key_path: &str) -> Self {
        if key_path.is_empty() {
            return Path::new();
        }
        Path(key_path.split(SEPARATOR).map(str::to_string).collect())
    }
}

impl From<String> for Path {
    fn from(key_path: String) -> Self {
        Path::from(key_path.as_str())
    }
}

impl From<&String> for Path {
    fn from(key_path: &String) -> Self {
        Path::from(key_path.as_str())
    }
}

impl From<&Path> for Path {
    fn from(path: &Path) -> Self {
        path.clone()
    }
}

impl From<Vec<String>> for Path {
    fn from(segments: Vec<String>) -> Self {
        Path(segments)
    }
}

impl From<&[&str]> for Path {
    fn from(segments: &[&str]) -> Self {
        segments.iter().copied().collect()
    }
}

impl<const N: usize> From<[&str; N]> for Path {
    fn from(segments: [&str; N]) -> Self {
        segments.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Path(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<P: Into<Path>> Add<P> for Path {
    type Output = Path;

    fn add(mut self, other: P) -> Path {
        self.push(other);
        self
    }
}

impl<P: Into<Path>> Add<P> for &Path {
    type Output = Path;

    fn add(self, other: P) -> Path {
        self.concat(other)
    }
}

impl<P: Into<Path>> AddAssign<P> for Path {
    fn add_assign(&mut self, other: P) {
        self.push(other);
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.join())
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PathVisitor;

        impl<'de> Visitor<'de> for PathVisitor {
            type Value = Path;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a dotted key path or a sequence of keys")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Path, E> {
                Ok(Path::from(v))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Path, A::Error> {
                let mut segments = Vec::new();
                while let Some(segment) = seq.next_element::<String>()? {
                    segments.push(segment);
                }
                Ok(Path(segments))
            }
        }

        deserializer.deserialize_any(PathVisitor)
    }
}
