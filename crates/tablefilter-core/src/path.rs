//! Normalized, hierarchical filesystem paths.
//!
//! [`TablePath`] is the single path representation used across the crate. It
//! is always absolute, optionally qualified with a `scheme://authority`
//! prefix (for example `hdfs://namenode:8020/warehouse/t1`), and stored as an
//! ordered list of segments so that `parent` and `ancestor` are cheap and
//! never depend on string slicing.
//!
//! Parsing normalizes the input:
//!
//! - repeated separators collapse (`/a//b` == `/a/b`);
//! - trailing separators and `.` segments are dropped;
//! - `..` removes the previous segment (climbing above the root is an error);
//! - the scheme is lowercased, and `file://` with an empty authority is the
//!   same as an unqualified local path.
//!
//! Two semantically equal paths therefore always compare equal, hash equally
//! and render to the same string, which is what the directory cache keys on.

use std::fmt;
use std::str::FromStr;

use snafu::{Backtrace, prelude::*};

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Errors raised while parsing or extending a [`TablePath`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PathError {
    /// The input is not an absolute path.
    #[snafu(display("Path is not absolute: {path:?}"))]
    Relative {
        /// The offending input.
        path: String,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },

    /// A `..` segment climbs above the filesystem root.
    #[snafu(display("Path escapes the filesystem root: {path:?}"))]
    EscapesRoot {
        /// The offending input.
        path: String,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },

    /// A child name is empty, special (`.`/`..`) or contains a separator.
    #[snafu(display("Invalid path segment {segment:?}"))]
    InvalidSegment {
        /// The rejected segment.
        segment: String,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },
}

/// An absolute, normalized path inside a (possibly remote) filesystem.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TablePath {
    /// `scheme://authority`, or empty for unqualified paths.
    prefix: String,
    segments: Vec<String>,
}

impl TablePath {
    /// The root of the unqualified filesystem (`/`).
    pub fn root() -> Self {
        Self {
            prefix: String::new(),
            segments: Vec::new(),
        }
    }

    /// Parse and normalize an absolute path string.
    pub fn parse(input: &str) -> Result<Self, PathError> {
        let (prefix, rest) = split_prefix(input);

        ensure!(
            rest.starts_with(SEPARATOR),
            RelativeSnafu {
                path: input.to_string()
            }
        );

        let mut segments: Vec<String> = Vec::new();
        for seg in rest.split(SEPARATOR) {
            match seg {
                "" | "." => {}
                ".." => {
                    ensure!(
                        segments.pop().is_some(),
                        EscapesRootSnafu {
                            path: input.to_string()
                        }
                    );
                }
                other => segments.push(other.to_string()),
            }
        }

        Ok(Self { prefix, segments })
    }

    /// `scheme://authority` prefix, if the path is qualified.
    pub fn prefix(&self) -> Option<&str> {
        if self.prefix.is_empty() {
            None
        } else {
            Some(&self.prefix)
        }
    }

    /// Ordered path segments, root first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments below the root (`/` is 0, `/a/b` is 2).
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Whether this is the filesystem root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Final segment, or `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The containing directory, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        self.ancestor(1)
    }

    /// The `n`-th ancestor: `ancestor(0)` is `self`, `ancestor(1)` the parent.
    ///
    /// Returns `None` when the path has fewer than `n` ancestors.
    pub fn ancestor(&self, n: usize) -> Option<Self> {
        let keep = self.segments.len().checked_sub(n)?;
        Some(Self {
            prefix: self.prefix.clone(),
            segments: self.segments[..keep].to_vec(),
        })
    }

    /// Append a single validated segment.
    pub fn child(&self, name: &str) -> Result<Self, PathError> {
        ensure!(
            !name.is_empty() && name != "." && name != ".." && !name.contains(SEPARATOR),
            InvalidSegmentSnafu {
                segment: name.to_string()
            }
        );
        Ok(self.child_unchecked(name))
    }

    /// Append a segment known to be valid (crate constants, listing entries).
    pub(crate) fn child_unchecked(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self {
            prefix: self.prefix.clone(),
            segments,
        }
    }

    /// Whether any segment equals `name` exactly.
    pub fn contains_segment(&self, name: &str) -> bool {
        self.segments.iter().any(|s| s == name)
    }

    /// Whether `self` is `other` or lies underneath it.
    pub fn starts_with(&self, other: &TablePath) -> bool {
        self.prefix == other.prefix && self.segments.starts_with(&other.segments)
    }
}

/// Split an optional `scheme://authority` prefix off `input`.
///
/// The returned prefix is normalized; the remainder starts at the path part.
fn split_prefix(input: &str) -> (String, &str) {
    let Some(idx) = input.find("://") else {
        return (String::new(), input);
    };

    let scheme = &input[..idx];
    let valid_scheme = scheme
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !valid_scheme {
        return (String::new(), input);
    }

    let after = &input[idx + 3..];
    let (authority, path) = match after.find(SEPARATOR) {
        Some(slash) => (&after[..slash], &after[slash..]),
        None => (after, "/"),
    };

    let scheme = scheme.to_ascii_lowercase();
    if scheme == "file" && authority.is_empty() {
        return (String::new(), path);
    }
    (format!("{scheme}://{authority}"), path)
}

impl fmt::Display for TablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix)?;
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for seg in &self.segments {
            write!(f, "/{seg}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TablePath({self})")
    }
}

impl FromStr for TablePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
