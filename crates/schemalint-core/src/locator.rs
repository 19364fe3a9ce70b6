//! Source spans and severities for errors.

use crate::errors::{LintError, Status, ValidationError};
use crate::stream::Context;
use schemalint_yaml::{LookupError, Mark};

/// Decides where an error points and how severe it is, relative to the
/// root file of a run.
#[derive(Debug, Clone)]
pub struct Detector {
    filename: String,
}

impl Detector {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Faults in the root file are errors; faults in included files are
    /// warnings.
    pub fn detect_status(&self, origin: &str) -> Status {
        if origin == self.filename {
            Status::Error
        } else {
            Status::Warning
        }
    }

    /// Span of a loading failure.
    ///
    /// With a reference mapping to point at, the span covers the failing
    /// key and its value. Otherwise it is the line where the parser got
    /// into trouble.
    pub fn locate(&self, err: &LintError, context: &Context) -> Result<(Mark, Mark), LookupError> {
        let Some(data) = err.data else {
            return Ok(self.locate_error_point(err, context));
        };
        if let Some(key) = err.path.as_ref().and_then(|path| path.last()) {
            if let Some((key_node, value_node)) = context.store.lookup_pair(data, key)? {
                return Ok((key_node.start_mark.clone(), value_node.end_mark.clone()));
            }
            tracing::debug!(key = %key, node = %data, "key not among mapping pairs, using mapping span");
        }
        let node = context.lookup_node(data)?;
        Ok((node.start_mark.clone(), node.end_mark.clone()))
    }

    /// Whole-line span derived from the parser's marks.
    ///
    /// Prefers the mark of the construct being parsed. The problem mark
    /// tends to land on the line after the real fault, so it is moved one
    /// line up.
    pub fn locate_error_point(&self, err: &LintError, context: &Context) -> (Mark, Mark) {
        let cause = &err.cause;
        let (name, line) = match (cause.context_mark(), cause.problem_mark()) {
            (Some(mark), _) => (mark.name.as_str(), mark.line),
            (None, Some(mark)) => (mark.name.as_str(), mark.line.saturating_sub(1)),
            (None, None) => {
                let origin = err.origin().unwrap_or(&self.filename);
                let start = Mark::start_of(origin);
                return (start.clone(), start);
            }
        };

        let start = context
            .sources
            .get_file(name)
            .and_then(|info| info.line_col_to_offset(line, 0))
            .map(|offset| Mark::new(name, offset, line, 0))
            .unwrap_or_else(|| Mark::new(name, 0, line, 0));
        let end = context
            .sources
            .line_end(name, line)
            .unwrap_or_else(|| start.clone());
        (start, end)
    }

    /// Span of the instance a schema violation is about.
    ///
    /// A violation on a value that has no source position (such as the
    /// empty document used after a fatal parse error) points at the start of
    /// the root file.
    pub fn locate_instance(
        &self,
        err: &ValidationError,
        context: &Context,
    ) -> Result<(Mark, Mark), LookupError> {
        match err.instance {
            Some(id) => {
                let node = context.lookup_node(id)?;
                Ok((node.start_mark.clone(), node.end_mark.clone()))
            }
            None => {
                let start = Mark::start_of(&self.filename);
                Ok((start.clone(), start))
            }
        }
    }
}
