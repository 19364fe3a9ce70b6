//! Linting of YAML and JSON documents that use `$ref`.
//!
//! A run goes through these steps:
//!
//! 1. [`Loader`] parses the root document and substitutes every `$ref`,
//!    loading other files as needed. Failures are collected, not raised.
//! 2. A [`Stream`] turns those failures, informational messages and
//!    schema violations from a [`SchemaValidator`] into one ordered,
//!    lazily computed sequence of [`ErrorEvent`]s.
//! 3. A [`Formatter`] locates each event in the source text with a
//!    [`Detector`] and renders it as LTSV or JSON.
//!
//! ```no_run
//! use schemalint_core::{
//!     Detector, Formatter, Layout, Loader, LoaderStream, SchemaSource, SchemaValidator,
//!     Stream, WithValidator,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = SchemaSource::parse("schema.json").load()?;
//! let stream = WithValidator::new(
//!     LoaderStream::new(Loader::new("config.yaml")),
//!     SchemaValidator::new(&schema, true)?,
//! );
//! let formatter = Formatter::new(Detector::new("config.yaml"), Layout::Ltsv);
//! for event in stream.events() {
//!     println!("{}", formatter.format(&event)?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod discovery;
pub mod errors;
pub mod formatter;
pub mod loader;
pub mod locator;
pub mod pointer;
pub mod schema;
pub mod source;
pub mod stream;
pub mod validator;

pub use discovery::{
    CONFIG_FILE_NAME, ConfigFileDiscovery, DiscoveryError, DiscoveryRegistry, SchemaDiscovery,
};
pub use errors::{Cause, Error, LintError, LintKind, MessageError, Status, ValidationError};
pub use formatter::{FormatError, Formatter, Layout, OutputRecord};
pub use loader::{Loader, Resolution};
pub use locator::Detector;
pub use pointer::{JsonPointer, Reference};
pub use schema::SchemaSource;
pub use source::{DiskSource, FileSource, MemorySource};
pub use stream::{Context, ErrorEvent, LoaderStream, Stream, WithMessages, WithValidator};
pub use validator::{SchemaError, SchemaValidator, Violation};
