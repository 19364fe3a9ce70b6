//! The event stream: resolution errors, then messages, then violations.
//!
//! A stream is built from stages:
//!
//! - [`LoaderStream`] resolves the root document on first use and yields
//!   one event per resolution failure.
//! - [`WithMessages`] appends informational notes.
//! - [`WithValidator`] appends one event per schema violation found in the
//!   resolved document. It goes last.
//!
//! Events are produced on demand, and iterating a stream again replays the
//! same events without resolving anything a second time.
//!
//! ```no_run
//! use schemalint_core::{Loader, LoaderStream, MessageError, Stream, WithMessages};
//!
//! let stream = WithMessages::new(
//!     LoaderStream::new(Loader::new("config.yaml")),
//!     vec![MessageError::info("no schema configured")],
//! );
//! for event in stream.events() {
//!     println!("{} soft={}", event.error.class_name(), event.is_soft());
//! }
//! ```

use crate::errors::{Error, LintError, MessageError, ValidationError};
use crate::loader::{Loader, Resolution};
use crate::pointer::JsonPointer;
use crate::validator::SchemaValidator;
use schemalint_source_map::SourceContext;
use schemalint_yaml::{LookupError, Node, NodeId, PositionStore, Value};
use std::cell::OnceCell;

/// State shared by every event of one run.
#[derive(Debug)]
pub struct Context {
    /// The root file
    pub filename: String,
    /// The resolved root document
    pub doc: Value,
    pub store: PositionStore,
    pub sources: SourceContext,
}

impl Context {
    /// The node `value` was built from.
    pub fn lookup(&self, value: &Value) -> Result<&Node, LookupError> {
        self.store.lookup_value(value)
    }

    pub fn lookup_node(&self, id: NodeId) -> Result<&Node, LookupError> {
        self.store.lookup(id)
    }

    /// The value of the resolved document at `path`.
    pub fn instance_at(&self, path: &[String]) -> Option<&Value> {
        path.iter()
            .try_fold(&self.doc, |value, segment| value.child(segment))
    }
}

/// One record of the stream, with the context it belongs to.
#[derive(Debug, Clone)]
pub struct ErrorEvent<'a> {
    pub error: Error,
    pub context: &'a Context,
}

impl ErrorEvent<'_> {
    pub fn is_soft(&self) -> bool {
        self.error.is_soft()
    }
}

/// A replayable source of events.
pub trait Stream {
    /// The run's context. The first call resolves the document.
    fn context(&self) -> &Context;

    /// Iterate the events; nothing is computed until the first `next`.
    fn events(&self) -> Box<dyn Iterator<Item = ErrorEvent<'_>> + '_>;
}

impl<S: Stream + ?Sized> Stream for Box<S> {
    fn context(&self) -> &Context {
        (**self).context()
    }

    fn events(&self) -> Box<dyn Iterator<Item = ErrorEvent<'_>> + '_> {
        (**self).events()
    }
}

#[derive(Debug)]
struct Loaded {
    context: Context,
    errors: Vec<LintError>,
}

/// Base stage over a [`Loader`].
#[derive(Debug)]
pub struct LoaderStream {
    loader: Loader,
    loaded: OnceCell<Loaded>,
}

impl LoaderStream {
    pub fn new(loader: Loader) -> Self {
        Self {
            loader,
            loaded: OnceCell::new(),
        }
    }

    fn loaded(&self) -> &Loaded {
        self.loaded.get_or_init(|| {
            let Resolution {
                document,
                errors,
                store,
                sources,
            } = self.loader.resolve();
            Loaded {
                context: Context {
                    filename: self.loader.filename().to_string(),
                    doc: document,
                    store,
                    sources,
                },
                errors,
            }
        })
    }
}

impl Stream for LoaderStream {
    fn context(&self) -> &Context {
        &self.loaded().context
    }

    fn events(&self) -> Box<dyn Iterator<Item = ErrorEvent<'_>> + '_> {
        Box::new(std::iter::once(()).flat_map(move |()| {
            let loaded = self.loaded();
            loaded.errors.iter().map(move |err| ErrorEvent {
                error: Error::Lint(err.clone()),
                context: &loaded.context,
            })
        }))
    }
}

/// Stage appending informational notes.
#[derive(Debug)]
pub struct WithMessages<S> {
    inner: S,
    messages: Vec<MessageError>,
}

impl<S: Stream> WithMessages<S> {
    pub fn new(inner: S, messages: Vec<MessageError>) -> Self {
        Self { inner, messages }
    }
}

impl<S: Stream> Stream for WithMessages<S> {
    fn context(&self) -> &Context {
        self.inner.context()
    }

    fn events(&self) -> Box<dyn Iterator<Item = ErrorEvent<'_>> + '_> {
        let messages = self.messages.iter().map(move |message| ErrorEvent {
            error: Error::Message(message.clone()),
            context: self.inner.context(),
        });
        Box::new(self.inner.events().chain(messages))
    }
}

/// Stage appending schema violations of the resolved document.
pub struct WithValidator<S> {
    inner: S,
    validator: SchemaValidator,
    instance: OnceCell<serde_json::Value>,
}

impl<S: Stream> WithValidator<S> {
    pub fn new(inner: S, validator: SchemaValidator) -> Self {
        Self {
            inner,
            validator,
            instance: OnceCell::new(),
        }
    }
}

impl<S: Stream> Stream for WithValidator<S> {
    fn context(&self) -> &Context {
        self.inner.context()
    }

    fn events(&self) -> Box<dyn Iterator<Item = ErrorEvent<'_>> + '_> {
        let violations = std::iter::once(()).flat_map(move |()| {
            let context = self.inner.context();
            let instance = self.instance.get_or_init(|| context.doc.to_json());
            self.validator.iter_errors(instance).map(move |violation| {
                let path = JsonPointer::parse(&violation.instance_path).into_segments();
                let instance = context.instance_at(&path).and_then(|value| value.id);
                ErrorEvent {
                    error: Error::Validation(ValidationError {
                        message: violation.message,
                        validator: violation.validator,
                        path,
                        instance,
                    }),
                    context,
                }
            })
        });
        Box::new(self.inner.events().chain(violations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use serde_json::json;

    fn loader(files: &[(&str, &str)]) -> Loader {
        let mut source = MemorySource::new();
        for (name, content) in files {
            source.insert(*name, *content);
        }
        Loader::with_source(files[0].0, Box::new(source))
    }

    fn classes(stream: &dyn Stream) -> Vec<&'static str> {
        stream.events().map(|event| event.error.class_name()).collect()
    }

    #[test]
    fn test_stage_order() {
        let schema = json!({"properties": {"count": {"type": "integer"}}});
        let stream = WithValidator::new(
            WithMessages::new(
                LoaderStream::new(loader(&[(
                    "a.yaml",
                    "count: ten\nx: {$ref: missing.yaml}\n",
                )])),
                vec![MessageError::info("schema given on the command line")],
            ),
            SchemaValidator::new(&schema, true).unwrap(),
        );
        assert_eq!(
            classes(&stream),
            ["ResolutionError", "MessageError", "ValidationError"]
        );
    }

    #[test]
    fn test_replay_is_identical() {
        let stream = LoaderStream::new(loader(&[(
            "a.yaml",
            "x: {$ref: '#/nope'}\ny: {$ref: other.yaml}\n",
        )]));
        let first: Vec<Error> = stream.events().map(|event| event.error).collect();
        let second: Vec<Error> = stream.events().map(|event| event.error).collect();
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        // one resolution, so the node ids match as well
        assert!(std::ptr::eq(stream.context(), stream.context()));
    }

    #[test]
    fn test_events_are_lazy() {
        let stream = LoaderStream::new(loader(&[("a.yaml", "x: 1\n")]));
        let events = stream.events();
        assert!(stream.loaded.get().is_none());
        assert_eq!(events.count(), 0);
        assert!(stream.loaded.get().is_some());
    }

    #[test]
    fn test_violation_points_at_instance() {
        let schema = json!({"properties": {"items": {"items": {"type": "integer"}}}});
        let stream = WithValidator::new(
            LoaderStream::new(loader(&[("a.yaml", "items: [1, two, 3]\n")])),
            SchemaValidator::new(&schema, true).unwrap(),
        );
        let events: Vec<_> = stream.events().collect();
        assert_eq!(events.len(), 1);
        let Error::Validation(violation) = &events[0].error else {
            panic!("expected a validation error");
        };
        assert_eq!(violation.path, ["items", "1"]);
        assert_eq!(violation.validator, "type");
        let node = events[0]
            .context
            .lookup_node(violation.instance.unwrap())
            .unwrap();
        assert_eq!((node.start_mark.line, node.start_mark.column), (0, 11));
    }

    #[test]
    fn test_instance_at() {
        let stream = LoaderStream::new(loader(&[("a.yaml", "a: {b: [x, y]}\n")]));
        let context = stream.context();
        let path = ["a".to_string(), "b".to_string(), "1".to_string()];
        assert_eq!(context.instance_at(&path).and_then(Value::as_str), Some("y"));
        assert!(context.instance_at(&["z".to_string()]).is_none());
        assert!(context.lookup(&context.doc).is_ok());
    }
}
