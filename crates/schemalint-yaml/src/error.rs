//! Error types for YAML parsing with source locations.

use crate::Mark;
use thiserror::Error;

/// A malformed-document error, located in the source text.
///
/// Mirrors the shape of a marked YAML error: the `problem` happened at
/// `problem_mark`, optionally while the parser was inside a construct that
/// started at `context_mark`. The scanner only reports a problem mark; the
/// context fields are filled by the builder for structural problems.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{problem}")]
pub struct ParseFailure {
    pub problem: String,
    pub context: Option<String>,
    pub problem_mark: Option<Mark>,
    pub context_mark: Option<Mark>,
}

impl ParseFailure {
    pub fn new(problem: impl Into<String>) -> Self {
        Self {
            problem: problem.into(),
            context: None,
            problem_mark: None,
            context_mark: None,
        }
    }

    pub fn at(mut self, mark: Mark) -> Self {
        self.problem_mark = Some(mark);
        self
    }

    pub fn within(mut self, context: impl Into<String>, mark: Mark) -> Self {
        self.context = Some(context.into());
        self.context_mark = Some(mark);
        self
    }

    /// `problem (context)` when a context is known, else just the problem.
    pub fn message(&self) -> String {
        match &self.context {
            Some(context) => format!("{} ({})", self.problem, context),
            None => self.problem.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_with_context() {
        let failure = ParseFailure::new("did not find expected key")
            .at(Mark::new("a.yaml", 20, 3, 2))
            .within("while parsing a block mapping", Mark::new("a.yaml", 0, 0, 0));
        assert_eq!(
            failure.message(),
            "did not find expected key (while parsing a block mapping)"
        );
        assert_eq!(failure.to_string(), "did not find expected key");
    }

    #[test]
    fn test_message_without_context() {
        let failure = ParseFailure::new("unexpected end of stream");
        assert_eq!(failure.message(), "unexpected end of stream");
        assert!(failure.problem_mark.is_none());
    }
}
