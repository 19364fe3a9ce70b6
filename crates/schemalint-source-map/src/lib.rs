//! Source positions for schemalint
//!
//! This crate provides the location vocabulary shared by the parser adapter,
//! the reference resolver and the error locator.
//!
//! # Overview
//!
//! The core types are:
//! - [`Mark`]: A position (file, character offset, line, column) in a source file
//! - [`Span`]: A start/end pair of marks
//! - [`FileInformation`]: A line index for fast offset → (line, column) conversion
//! - [`SourceContext`]: Registry of the files seen during one run
//!
//! # Example
//!
//! ```rust
//! use schemalint_source_map::*;
//!
//! let mut ctx = SourceContext::new();
//! ctx.add_file("config.yaml", "name: demo\ncount: 3\n");
//!
//! let end = ctx.line_end("config.yaml", 1).unwrap();
//! assert_eq!(end.index, 19);
//! assert_eq!(end.column, 8);
//! assert_eq!(end.to_string(), "config.yaml:2:9");
//! ```

pub mod context;
pub mod file_info;
pub mod types;

pub use context::SourceContext;
pub use file_info::FileInformation;
pub use types::{Mark, Span};
