//! Position store: value ids to the parser nodes they were built from.

use crate::{Mark, Value};
use std::fmt;
use thiserror::Error;

/// Identity of a constructed value.
///
/// Ids are handed out by [`PositionStore::record`] in increasing order and
/// are unique across every file parsed into the same store. Two values that
/// are structurally equal but were built from different source text always
/// carry different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A key/value pair of a mapping node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePair {
    /// The key as it appears in the constructed mapping
    pub key: String,
    pub key_node: NodeId,
    pub value_node: NodeId,
}

/// Shape of a parser node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Scalar with its raw text
    Scalar(String),
    Sequence(Vec<NodeId>),
    /// Mapping pairs in source order, duplicates included
    Mapping(Vec<NodePair>),
}

/// A parser node: the source span a value was constructed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub start_mark: Mark,
    pub end_mark: Mark,
    pub kind: NodeKind,
}

impl Node {
    pub fn file(&self) -> &str {
        &self.start_mark.name
    }
}

/// Failure to find a node. Always an implementation bug, never a user error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("value was never recorded in the position store")]
    Unrecorded,

    #[error("node {0} is not in the position store")]
    UnknownId(NodeId),

    #[error("node {0} is not a mapping")]
    NotAMapping(NodeId),
}

/// Side table from [`NodeId`] to [`Node`].
///
/// Nodes are only ever added while a file is being constructed, before the
/// resolver copies or merges anything, so every id a value carries points at
/// the text that value originally came from.
#[derive(Debug, Clone, Default)]
pub struct PositionStore {
    nodes: Vec<Node>,
}

impl PositionStore {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Record a node and return the id for the value built from it.
    pub fn record(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn lookup(&self, id: NodeId) -> Result<&Node, LookupError> {
        self.nodes
            .get(id.0 as usize)
            .ok_or(LookupError::UnknownId(id))
    }

    /// The node a value was constructed from.
    pub fn lookup_value(&self, value: &Value) -> Result<&Node, LookupError> {
        let id = value.id.ok_or(LookupError::Unrecorded)?;
        self.lookup(id)
    }

    /// Find the key and value nodes of `key` inside the mapping node `id`.
    ///
    /// When a key is duplicated the last occurrence is returned, matching
    /// the constructed mapping.
    pub fn lookup_pair(&self, id: NodeId, key: &str) -> Result<Option<(&Node, &Node)>, LookupError> {
        let NodeKind::Mapping(pairs) = &self.lookup(id)?.kind else {
            return Err(LookupError::NotAMapping(id));
        };
        match pairs.iter().rev().find(|pair| pair.key == key) {
            Some(pair) => Ok(Some((
                self.lookup(pair.key_node)?,
                self.lookup(pair.value_node)?,
            ))),
            None => Ok(None),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
