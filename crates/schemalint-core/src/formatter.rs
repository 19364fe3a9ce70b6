//! Output records and their text layouts.

use crate::errors::{Error, LintError, MessageError, Status, ValidationError};
use crate::locator::Detector;
use crate::stream::{Context, ErrorEvent};
use schemalint_yaml::{LookupError, Mark};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum FormatError {
    #[error("cannot locate error: {0}")]
    Lookup(#[from] LookupError),

    #[error("cannot serialize record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Text layout of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Tab-separated `key:value` fields
    #[default]
    Ltsv,
    /// One JSON object per line
    Json,
}

impl Layout {
    pub fn render(&self, record: &OutputRecord) -> Result<String, FormatError> {
        match self {
            Layout::Ltsv => record.to_ltsv(),
            Layout::Json => Ok(serde_json::to_string(record)?),
        }
    }
}

/// A located, display-ready error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRecord {
    pub status: Status,
    pub cls: String,
    pub filename: String,
    /// `line@column`, 1-based
    pub start: String,
    pub end: String,
    pub msg: String,
    /// Files from the root to the fault, some annotated with `:line`
    #[serde(rename = "where")]
    pub where_: Vec<String>,
}

impl OutputRecord {
    fn to_ltsv(&self) -> Result<String, FormatError> {
        let fields = [
            ("status", self.status.as_str().to_string()),
            ("cls", self.cls.clone()),
            ("filename", self.filename.clone()),
            ("start", self.start.clone()),
            ("end", self.end.clone()),
            ("msg", self.msg.clone()),
            ("where", serde_json::to_string(&self.where_)?),
        ];
        Ok(fields
            .iter()
            .map(|(label, value)| format!("{label}:{}", escape_ltsv(value)))
            .collect::<Vec<_>>()
            .join("\t"))
    }
}

fn escape_ltsv(value: &str) -> String {
    value.replace('\t', "\\t").replace('\n', "\\n")
}

/// Turns events into output lines.
#[derive(Debug, Clone)]
pub struct Formatter {
    detector: Detector,
    layout: Layout,
    base_dir: Option<PathBuf>,
}

impl Formatter {
    /// File names under the current directory are shown relative to it.
    pub fn new(detector: Detector, layout: Layout) -> Self {
        Self {
            detector,
            layout,
            base_dir: std::env::current_dir().ok(),
        }
    }

    pub fn with_base_dir(mut self, base_dir: Option<PathBuf>) -> Self {
        self.base_dir = base_dir;
        self
    }

    pub fn format(&self, event: &ErrorEvent<'_>) -> Result<String, FormatError> {
        self.layout.render(&self.record(event)?)
    }

    /// Render a message that has no event, such as an internal failure.
    pub fn format_message(&self, message: &MessageError) -> Result<String, FormatError> {
        self.layout.render(&self.message_record(message))
    }

    pub fn record(&self, event: &ErrorEvent<'_>) -> Result<OutputRecord, FormatError> {
        match &event.error {
            Error::Lint(err) => self.lint_record(err, event.context),
            Error::Validation(err) => self.validation_record(err, event.context),
            Error::Message(message) => Ok(self.message_record(message)),
        }
    }

    fn lint_record(&self, err: &LintError, context: &Context) -> Result<OutputRecord, FormatError> {
        let (start, end) = self.detector.locate(err, context)?;
        let origin = err.origin().unwrap_or(self.detector.filename());

        let mut where_: Vec<String> = err.history.iter().map(|f| self.display_name(f)).collect();
        if let Some(first) = where_.first_mut() {
            *first = format!("{first}:{}", start.line + 1);
        }
        // A single entry carries both the span line and the fault line.
        if let (Some(mark), Some(last)) = (err.cause.problem_mark(), where_.last_mut()) {
            *last = format!("{last}:{}", mark.line + 1);
        }

        Ok(OutputRecord {
            status: self.detector.detect_status(origin),
            cls: err.kind().as_str().to_string(),
            filename: self.display_name(&start.name),
            start: start.position(),
            end: end.position(),
            msg: err.message(),
            where_,
        })
    }

    fn validation_record(
        &self,
        err: &ValidationError,
        context: &Context,
    ) -> Result<OutputRecord, FormatError> {
        let (start, end) = self.detector.locate_instance(err, context)?;
        let filename = self.display_name(&start.name);
        Ok(OutputRecord {
            status: Status::Error,
            cls: "ValidationError".to_string(),
            where_: vec![format!("{filename}:{}", start.line + 1)],
            filename,
            start: start.position(),
            end: end.position(),
            msg: format!("{} (validator={})", err.message, err.validator),
        })
    }

    fn message_record(&self, message: &MessageError) -> OutputRecord {
        let filename = self.display_name(self.detector.filename());
        let start = Mark::start_of(self.detector.filename());
        OutputRecord {
            status: message.status,
            cls: "MessageError".to_string(),
            where_: vec![filename.clone()],
            filename,
            start: start.position(),
            end: start.position(),
            msg: message.message.clone(),
        }
    }

    fn display_name(&self, name: &str) -> String {
        self.base_dir
            .as_deref()
            .and_then(|base| Path::new(name).strip_prefix(base).ok())
            .map(|relative| relative.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string())
    }
}
