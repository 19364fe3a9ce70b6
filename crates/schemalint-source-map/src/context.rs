//! Source context for managing files

use crate::file_info::FileInformation;
use crate::types::Mark;
use serde::{Deserialize, Serialize};

use std::collections::HashMap;

/// Registry of the source files read during one run.
///
/// Only the line index of each file is kept, keyed by the same name that
/// appears in [`Mark::name`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceContext {
    files: HashMap<String, FileInformation>,
}

impl SourceContext {
    /// Create a new empty source context
    pub fn new() -> Self {
        SourceContext {
            files: HashMap::new(),
        }
    }

    /// Index `content` under `name`, replacing any previous entry.
    pub fn add_file(&mut self, name: impl Into<String>, content: &str) {
        self.files.insert(name.into(), FileInformation::new(content));
    }

    /// Line index for a file, if it was registered.
    pub fn get_file(&self, name: &str) -> Option<&FileInformation> {
        self.files.get(name)
    }

    /// Number of registered files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The mark just past the last character of a 0-based line.
    ///
    /// Returns None when the file or line is unknown.
    pub fn line_end(&self, name: &str, line: usize) -> Option<Mark> {
        let info = self.files.get(name)?;
        let length = info.line_length(line)?;
        let offset = info.line_col_to_offset(line, length)?;
        Some(Mark::new(name, offset, line, length))
    }
}
