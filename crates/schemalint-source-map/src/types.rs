//! Core position types

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in a named source file (0-indexed).
///
/// `index` counts characters from the start of the file, matching the
/// markers produced by the YAML scanner. `line` and `column` are 0-based
/// internally and rendered 1-based for humans.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mark {
    /// File name the mark points into
    pub name: String,
    /// Character offset from start of source
    pub index: usize,
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed, in characters)
    pub column: usize,
}

impl Mark {
    pub fn new(name: impl Into<String>, index: usize, line: usize, column: usize) -> Self {
        Self {
            name: name.into(),
            index,
            line,
            column,
        }
    }

    /// The first position of a file.
    pub fn start_of(name: impl Into<String>) -> Self {
        Self::new(name, 0, 0, 0)
    }

    /// Render as `line@column`, both 1-based.
    pub fn position(&self) -> String {
        format!("{}@{}", self.line + 1, self.column + 1)
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.name, self.line + 1, self.column + 1)
    }
}

/// A range in source text from start to end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Start mark (inclusive)
    pub start: Mark,
    /// End mark (exclusive)
    pub end: Mark,
}

impl Span {
    pub fn new(start: Mark, end: Mark) -> Self {
        Self { start, end }
    }

    /// Name of the file the span starts in.
    pub fn file(&self) -> &str {
        &self.start.name
    }
}
