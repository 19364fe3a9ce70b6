//! Error records carried by the event stream.
//!
//! Three families travel through one stream:
//!
//! - [`LintError`]: a malformed file or an unresolvable `$ref`, produced
//!   while loading. Its class (`ParseError` or `ResolutionError`) follows
//!   from its [`Cause`].
//! - [`ValidationError`]: a schema violation on the resolved document.
//! - [`MessageError`]: an informational note, always soft.

use schemalint_yaml::{Mark, NodeId, ParseFailure};
use serde::Serialize;
use std::fmt;
use thiserror::Error as ThisError;

/// Severity shown in output records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Error,
    Warning,
    Info,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Error => "ERROR",
            Status::Warning => "WARNING",
            Status::Info => "INFO",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a file could not be loaded or a reference could not be followed.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Cause {
    #[error("{}", .0.message())]
    Parse(ParseFailure),

    #[error("file not found: {path}")]
    FileNotFound { path: String },

    #[error("cannot read {path}: {message}")]
    Io { path: String, message: String },

    #[error("key not found: '{key}' (in {pointer})")]
    KeyNotFound { pointer: String, key: String },
}

impl Cause {
    pub fn problem_mark(&self) -> Option<&Mark> {
        match self {
            Cause::Parse(failure) => failure.problem_mark.as_ref(),
            _ => None,
        }
    }

    pub fn context_mark(&self) -> Option<&Mark> {
        match self {
            Cause::Parse(failure) => failure.context_mark.as_ref(),
            _ => None,
        }
    }

    /// True for causes that mean the target file itself is unavailable.
    pub fn is_missing_file(&self) -> bool {
        matches!(self, Cause::FileNotFound { .. } | Cause::Io { .. })
    }
}

/// Class of a [`LintError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintKind {
    ParseError,
    ResolutionError,
}

impl LintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LintKind::ParseError => "ParseError",
            LintKind::ResolutionError => "ResolutionError",
        }
    }
}

/// A loading failure.
///
/// `history` is the chain of files being loaded when the failure happened,
/// root first. `path` is the key path from the top of the fragment being
/// walked down to the failing `$ref` key, and `data` is the reference
/// mapping holding it. Both are absent for failures of the root file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintError {
    pub cause: Cause,
    pub history: Vec<String>,
    pub path: Option<Vec<String>>,
    pub data: Option<NodeId>,
}

impl LintError {
    /// A failure with no reference mapping to point at.
    pub fn unlocated(cause: Cause, history: Vec<String>) -> Self {
        Self {
            cause,
            history,
            path: None,
            data: None,
        }
    }

    pub fn kind(&self) -> LintKind {
        match self.cause {
            Cause::Parse(_) => LintKind::ParseError,
            _ => LintKind::ResolutionError,
        }
    }

    /// The file the failure is attributed to.
    pub fn origin(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }

    pub fn message(&self) -> String {
        self.cause.to_string()
    }
}

/// A schema violation found on the resolved document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
    /// The schema keyword that failed (`type`, `required`, ...)
    pub validator: String,
    /// Segments leading from the document root to the failing instance
    pub path: Vec<String>,
    /// The failing instance, when it was read from a file
    pub instance: Option<NodeId>,
}

/// A note attached to the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageError {
    pub message: String,
    pub status: Status,
}

impl MessageError {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Status::Info,
        }
    }

    /// An unexpected failure of the tool itself.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Status::Error,
        }
    }
}

/// Any record in the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Lint(LintError),
    Validation(ValidationError),
    Message(MessageError),
}

impl Error {
    pub fn class_name(&self) -> &'static str {
        match self {
            Error::Lint(err) => err.kind().as_str(),
            Error::Validation(_) => "ValidationError",
            Error::Message(_) => "MessageError",
        }
    }

    /// Soft errors never make the run fail.
    pub fn is_soft(&self) -> bool {
        matches!(self, Error::Message(_))
    }
}

impl From<LintError> for Error {
    fn from(err: LintError) -> Self {
        Error::Lint(err)
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation(err)
    }
}

impl From<MessageError> for Error {
    fn from(err: MessageError) -> Self {
        Error::Message(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_follows_cause() {
        let parse = LintError::unlocated(
            Cause::Parse(ParseFailure::new("mapping values are not allowed here")),
            vec!["a.yaml".into()],
        );
        assert_eq!(parse.kind(), LintKind::ParseError);

        let missing = LintError::unlocated(
            Cause::FileNotFound {
                path: "b.yaml".into(),
            },
            vec!["a.yaml".into()],
        );
        assert_eq!(Error::from(missing).class_name(), "ResolutionError");
    }

    #[test]
    fn test_cause_messages() {
        let cause = Cause::KeyNotFound {
            pointer: "/definitions/name".into(),
            key: "name".into(),
        };
        assert_eq!(
            cause.to_string(),
            "key not found: 'name' (in /definitions/name)"
        );
        assert!(!cause.is_missing_file());

        let failure = ParseFailure::new("did not find expected node content")
            .within("while parsing a flow node", Mark::new("a.yaml", 3, 0, 3));
        assert_eq!(
            Cause::Parse(failure).to_string(),
            "did not find expected node content (while parsing a flow node)"
        );
    }

    #[test]
    fn test_only_messages_are_soft() {
        assert!(Error::from(MessageError::info("schema discovered")).is_soft());
        assert!(Error::from(MessageError::internal("boom")).is_soft());
        let violation = ValidationError {
            message: "\"ten\" is not of type \"integer\"".into(),
            validator: "type".into(),
            path: vec!["count".into()],
            instance: None,
        };
        assert!(!Error::from(violation).is_soft());
    }

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&Status::Warning).unwrap(),
            "\"WARNING\""
        );
        assert_eq!(Status::Info.to_string(), "INFO");
    }
}
