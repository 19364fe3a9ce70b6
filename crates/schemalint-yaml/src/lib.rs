//! # schemalint-yaml
//!
//! YAML and JSON parsing with source location tracking.
//!
//! Every value the parser constructs (scalars, sequences, mappings and
//! mapping keys) is registered in a [`PositionStore`] and receives a
//! [`NodeId`]. The id travels with the [`Value`], so the node a value was
//! built from (and hence its exact source span) can be recovered after the
//! value has been copied, moved into another document, or converted for a
//! schema validator.
//!
//! ## Example
//!
//! ```rust,no_run
//! use schemalint_yaml::{PositionStore, parse_file};
//!
//! let mut store = PositionStore::new();
//! let doc = parse_file("title: My Document\ncount: 3\n", "config.yaml", &mut store).unwrap();
//!
//! let count = doc.get("count").unwrap();
//! let node = store.lookup_value(count).unwrap();
//! assert_eq!(node.start_mark.line, 1);
//! assert_eq!(node.start_mark.column, 7);
//! ```

mod error;
mod parser;
mod store;
mod value;

pub use error::ParseFailure;
pub use parser::{parse, parse_file};
pub use schemalint_source_map::{Mark, Span};
pub use store::{LookupError, Node, NodeId, NodeKind, NodePair, PositionStore};
pub use value::{Mapping, Value, ValueKind};
