//! Line index for location lookups

use serde::{Deserialize, Serialize};

/// Line index of a source file.
///
/// Stores the character offset at which each line starts and the length of
/// each line (in characters, without the line terminator), so positions can
/// be converted without keeping the file content around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInformation {
    /// Character offset of the first character of each line
    line_starts: Vec<usize>,

    /// Length of each line in characters, excluding `\n` and a trailing `\r`
    line_lengths: Vec<usize>,

    /// Total length of the file in characters
    total_length: usize,
}

impl FileInformation {
    /// Create file information by analyzing content
    ///
    /// Scans the content once. Offset lookups are O(log n) via binary search.
    ///
    /// # Example
    ///
    /// ```
    /// use schemalint_source_map::FileInformation;
    ///
    /// let info = FileInformation::new("line 1\nline 2\nline 3");
    /// assert_eq!(info.line_count(), 3);
    /// ```
    pub fn new(content: &str) -> Self {
        let mut line_starts = vec![0];
        let mut line_lengths = Vec::new();
        let mut current = 0;
        let mut previous = None;
        let mut total_length = 0;

        for (idx, ch) in content.chars().enumerate() {
            total_length = idx + 1;
            if ch == '\n' {
                let trimmed = if previous == Some('\r') { current - 1 } else { current };
                line_lengths.push(trimmed);
                line_starts.push(idx + 1);
                current = 0;
            } else {
                current += 1;
            }
            previous = Some(ch);
        }
        let trimmed = if previous == Some('\r') { current - 1 } else { current };
        line_lengths.push(trimmed);

        FileInformation {
            line_starts,
            line_lengths,
            total_length,
        }
    }

    /// Convert a character offset to a 0-based `(line, column)` pair
    ///
    /// Returns None if the offset is out of bounds.
    ///
    /// # Example
    ///
    /// ```
    /// use schemalint_source_map::FileInformation;
    ///
    /// let info = FileInformation::new("hello\nworld");
    /// assert_eq!(info.offset_to_line_col(6), Some((1, 0)));
    /// ```
    pub fn offset_to_line_col(&self, offset: usize) -> Option<(usize, usize)> {
        if offset > self.total_length {
            return None;
        }

        let line = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };

        Some((line, offset - self.line_starts[line]))
    }

    /// Character offset of a 0-based `(line, column)` pair.
    pub fn line_col_to_offset(&self, line: usize, column: usize) -> Option<usize> {
        self.line_starts.get(line).map(|start| start + column)
    }

    /// Length of a 0-based line in characters, without its terminator.
    pub fn line_length(&self, line: usize) -> Option<usize> {
        self.line_lengths.get(line).copied()
    }

    /// Get the total length of the file in characters
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    /// Get the number of lines in the file
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
