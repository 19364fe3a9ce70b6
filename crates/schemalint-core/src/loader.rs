//! `$ref` resolution across files.
//!
//! [`Loader::resolve`] parses the root file, walks it depth first and
//! replaces every reference mapping with the value it points at, loading
//! other files on demand. Failures never stop the walk: each one is
//! recorded as a [`LintError`] and the reference is left in place.
//!
//! Every file is parsed into one shared [`PositionStore`], so each value of
//! the resolved document can still be traced back to the text it came from,
//! whichever file that was.

use crate::errors::{Cause, LintError};
use crate::pointer::{JsonPointer, Reference, normalize, reference_of};
use crate::source::{DiskSource, FileSource};
use schemalint_source_map::SourceContext;
use schemalint_yaml::{NodeId, PositionStore, Value, ValueKind, parse_file};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::Path;

/// Everything produced by one resolution pass.
#[derive(Debug)]
pub struct Resolution {
    /// The root document with every resolvable reference substituted
    pub document: Value,
    /// Failures in depth-first order
    pub errors: Vec<LintError>,
    /// Nodes of every file that was parsed
    pub store: PositionStore,
    /// Line index of every file that was read
    pub sources: SourceContext,
}

/// Resolves the references of one root document.
pub struct Loader {
    filename: String,
    source: Box<dyn FileSource>,
}

impl Loader {
    /// A loader reading from disk.
    pub fn new(filename: impl AsRef<Path>) -> Self {
        Self::with_source(filename, Box::new(DiskSource))
    }

    pub fn with_source(filename: impl AsRef<Path>, source: Box<dyn FileSource>) -> Self {
        Self {
            filename: normalize(filename.as_ref()).to_string_lossy().into_owned(),
            source,
        }
    }

    /// The root file name, normalized as it appears in error histories.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Run a full resolution pass.
    ///
    /// Each call starts from scratch: files are read and parsed again and
    /// node ids restart at zero.
    pub fn resolve(&self) -> Resolution {
        let mut resolver = Resolver::new(self.source.as_ref());
        let document = resolver.resolve_root(&self.filename);
        tracing::debug!(
            file = %self.filename,
            errors = resolver.errors.len(),
            nodes = resolver.store.len(),
            "resolution finished"
        );
        Resolution {
            document,
            errors: resolver.errors,
            store: resolver.store,
            sources: resolver.sources,
        }
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("filename", &self.filename)
            .finish_non_exhaustive()
    }
}

struct Resolver<'s> {
    source: &'s dyn FileSource,
    store: PositionStore,
    sources: SourceContext,
    /// Parsed files, including the ones that failed to load
    documents: HashMap<String, Result<Value, Cause>>,
    errors: Vec<LintError>,
    /// Files being resolved, root first
    stack: Vec<String>,
    /// Reference mappings whose resolution has started
    seen: HashSet<NodeId>,
    /// Finished substitutions, by reference mapping
    resolved: HashMap<NodeId, Value>,
    /// References a pointer is currently being followed through
    passing: HashSet<NodeId>,
}

impl<'s> Resolver<'s> {
    fn new(source: &'s dyn FileSource) -> Self {
        Self {
            source,
            store: PositionStore::new(),
            sources: SourceContext::new(),
            documents: HashMap::new(),
            errors: Vec::new(),
            stack: Vec::new(),
            seen: HashSet::new(),
            resolved: HashMap::new(),
            passing: HashSet::new(),
        }
    }

    fn resolve_root(&mut self, root: &str) -> Value {
        self.stack.push(root.to_string());
        let document = match self.document(root) {
            Ok(document) => Some(document.clone()),
            Err(cause) => {
                self.errors
                    .push(LintError::unlocated(cause, self.stack.clone()));
                None
            }
        };
        let document = match document {
            Some(mut document) => {
                self.walk(&mut document, root, &mut Vec::new());
                document
            }
            None => Value::empty_mapping(),
        };
        self.stack.pop();
        document
    }

    /// The parsed form of `file`, loading it on first use.
    fn document(&mut self, file: &str) -> Result<&Value, Cause> {
        if !self.documents.contains_key(file) {
            let loaded = self.load(file);
            self.documents.insert(file.to_string(), loaded);
        }
        match self.documents.get(file) {
            Some(Ok(document)) => Ok(document),
            Some(Err(cause)) => Err(cause.clone()),
            None => Err(Cause::FileNotFound {
                path: file.to_string(),
            }),
        }
    }

    fn load(&mut self, file: &str) -> Result<Value, Cause> {
        tracing::debug!(file, "loading document");
        let text = self
            .source
            .read_to_string(file)
            .map_err(|err| match err.kind() {
                io::ErrorKind::NotFound => Cause::FileNotFound {
                    path: file.to_string(),
                },
                _ => Cause::Io {
                    path: file.to_string(),
                    message: err.to_string(),
                },
            })?;
        self.sources.add_file(file, &text);
        parse_file(&text, file, &mut self.store).map_err(Cause::Parse)
    }

    /// Substitute references below `value`, in place.
    ///
    /// `file` is the file `value` was read from; `path` holds the keys
    /// leading to `value` from the top of the fragment being walked.
    fn walk(&mut self, value: &mut Value, file: &str, path: &mut Vec<String>) {
        let reference = reference_of(value).map(str::to_string);
        match &mut value.kind {
            ValueKind::Mapping(entries) => {
                for (key, child) in entries.iter_mut() {
                    if reference.is_some() && key == "$ref" {
                        continue;
                    }
                    path.push(key.clone());
                    self.walk(child, file, path);
                    path.pop();
                }
            }
            ValueKind::Sequence(items) => {
                for (index, child) in items.iter_mut().enumerate() {
                    path.push(index.to_string());
                    self.walk(child, file, path);
                    path.pop();
                }
            }
            _ => {}
        }

        if let Some(reference) = reference {
            path.push("$ref".to_string());
            self.substitute(value, file, &reference, path);
            path.pop();
        }
    }

    fn substitute(&mut self, value: &mut Value, file: &str, raw: &str, path: &[String]) {
        if let Some(id) = value.id {
            if let Some(done) = self.resolved.get(&id) {
                let done = done.clone();
                *value = with_siblings(value, done);
                return;
            }
            if !self.seen.insert(id) {
                tracing::debug!(reference = raw, file, "reference already visited");
                return;
            }
        }

        let target = Reference::parse(raw, file);
        tracing::debug!(reference = raw, from = file, to = %target.file, "following reference");
        let entered = self.enter(&target.file);

        match self.fetch(&target.file, target.pointer.segments()) {
            Ok((mut resolved, origin)) => {
                let through = self.enter(&origin);
                self.walk(&mut resolved, &origin, &mut Vec::new());
                if through {
                    self.stack.pop();
                }
                if origin != file {
                    if let Some(overlay) = resolved.overlay() {
                        tracing::trace!(from = %origin, into = file, "overlay for cross-file value");
                        resolved = overlay;
                    }
                }
                if let Some(id) = value.id {
                    self.resolved.insert(id, resolved.clone());
                }
                *value = with_siblings(value, resolved);
            }
            Err(Fault { cause, history }) => {
                self.errors.push(LintError {
                    cause,
                    history,
                    path: Some(path.to_vec()),
                    data: value.id,
                });
            }
        }

        if entered {
            self.stack.pop();
        }
    }

    /// Follow `segments` inside `file`, the file on top of the stack.
    ///
    /// Returns a copy of the target and the file it was found in, which
    /// differs from `file` when the pointer passed through a reference into
    /// another file.
    fn fetch(&mut self, file: &str, segments: &[String]) -> Result<(Value, String), Fault> {
        let mut current = match self.document(file) {
            Ok(document) => document,
            Err(cause) => return Err(self.fault(cause)),
        };
        for (depth, segment) in segments.iter().enumerate() {
            if let Some(child) = current.child(segment) {
                current = child;
                continue;
            }
            if let Some(raw) = reference_of(current) {
                let raw = raw.to_string();
                let id = current.id;
                return self.fetch_through(file, id, &raw, segments, depth);
            }
            let cause = Cause::KeyNotFound {
                pointer: JsonPointer::from_segments(segments.to_vec()).to_string(),
                key: segment.clone(),
            };
            return Err(self.fault(cause));
        }
        Ok((current.clone(), file.to_string()))
    }

    /// Continue a pointer walk through the reference `raw` met at `depth`.
    ///
    /// The file the reference leads to is on the stack while it is searched.
    fn fetch_through(
        &mut self,
        file: &str,
        id: Option<NodeId>,
        raw: &str,
        segments: &[String],
        depth: usize,
    ) -> Result<(Value, String), Fault> {
        if let Some(id) = id {
            if !self.passing.insert(id) {
                let cause = Cause::KeyNotFound {
                    pointer: JsonPointer::from_segments(segments.to_vec()).to_string(),
                    key: segments[depth].clone(),
                };
                return Err(self.fault(cause));
            }
        }

        let target = Reference::parse(raw, file);
        tracing::debug!(reference = raw, file, "pointer passes through reference");
        let mut rest = target.pointer.into_segments();
        rest.extend_from_slice(&segments[depth..]);
        let entered = self.enter(&target.file);
        let result = self.fetch(&target.file, &rest);
        if entered {
            self.stack.pop();
        }

        if let Some(id) = id {
            self.passing.remove(&id);
        }
        result
    }

    /// Make `target` the top of the stack unless it already is.
    ///
    /// Returns whether it was pushed.
    fn enter(&mut self, target: &str) -> bool {
        if self.stack.last().is_some_and(|top| top == target) {
            return false;
        }
        self.stack.push(target.to_string());
        true
    }

    /// Attach the current history to `cause`.
    ///
    /// A missing file never became part of the chain, so it is left out.
    fn fault(&self, cause: Cause) -> Fault {
        let history = if cause.is_missing_file() {
            self.stack[..self.stack.len().saturating_sub(1)].to_vec()
        } else {
            self.stack.clone()
        };
        Fault { cause, history }
    }
}

/// A failure together with the files that led to it.
struct Fault {
    cause: Cause,
    history: Vec<String>,
}

/// Apply the keys written next to `$ref` on top of the resolved value.
///
/// Local keys win over keys of the same name in the target. A target that
/// is not a mapping has nowhere to hold them, so they are dropped.
fn with_siblings(reference: &Value, resolved: Value) -> Value {
    let siblings: Vec<(String, Value)> = reference
        .as_mapping()
        .map(|entries| {
            entries
                .iter()
                .filter(|(key, _)| key.as_str() != "$ref")
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        })
        .unwrap_or_default();
    if siblings.is_empty() {
        return resolved;
    }

    let Value { id, kind } = resolved;
    match kind {
        ValueKind::Mapping(mut entries) => {
            for (key, value) in siblings {
                entries.insert(key, value);
            }
            Value {
                id,
                kind: ValueKind::Mapping(entries),
            }
        }
        kind => {
            tracing::debug!(
                dropped = siblings.len(),
                "keys next to $ref dropped, target is not a mapping"
            );
            Value { id, kind }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn resolve(files: &[(&str, &str)]) -> Resolution {
        let mut source = MemorySource::new();
        for (name, content) in files {
            source.insert(*name, *content);
        }
        Loader::with_source(files[0].0, Box::new(source)).resolve()
    }

    fn json(resolution: &Resolution) -> serde_json::Value {
        resolution.document.to_json()
    }

    #[test]
    fn test_local_reference() {
        let resolution = resolve(&[(
            "a.yaml",
            "definitions:\n  name: {type: string}\nproperties:\n  name: {$ref: '#/definitions/name'}\n",
        )]);
        assert!(resolution.errors.is_empty());
        assert_eq!(
            json(&resolution)["properties"]["name"],
            serde_json::json!({"type": "string"})
        );
    }

    #[test]
    fn test_whole_file_reference() {
        let resolution = resolve(&[
            ("a.yaml", "x: {$ref: b.yaml}\n"),
            ("b.yaml", "y: 1\nz: [1, 2]\n"),
        ]);
        assert!(resolution.errors.is_empty());
        assert_eq!(json(&resolution), serde_json::json!({"x": {"y": 1, "z": [1, 2]}}));
    }

    #[test]
    fn test_reference_in_sequence_and_to_index() {
        let resolution = resolve(&[(
            "a.yaml",
            "items: [10, 20]\npicked:\n  - {$ref: '#/items/1'}\n",
        )]);
        assert!(resolution.errors.is_empty());
        assert_eq!(json(&resolution)["picked"], serde_json::json!([20]));
    }

    #[test]
    fn test_relative_file_in_subdirectory() {
        let resolution = resolve(&[
            ("root/a.yaml", "x: {$ref: 'defs/b.yaml#/y'}\n"),
            ("root/defs/b.yaml", "y: {$ref: '../c.yaml#/z'}\n"),
            ("root/c.yaml", "z: deep\n"),
        ]);
        assert!(resolution.errors.is_empty(), "{:?}", resolution.errors);
        assert_eq!(json(&resolution), serde_json::json!({"x": "deep"}));
    }

    #[test]
    fn test_siblings_override_target_keys() {
        let resolution = resolve(&[(
            "a.yaml",
            "base: {type: string, title: Base}\nchild: {$ref: '#/base', title: Child}\nscalar: 3\nodd: {$ref: '#/scalar', title: Lost}\n",
        )]);
        assert!(resolution.errors.is_empty());
        let doc = json(&resolution);
        assert_eq!(doc["child"], serde_json::json!({"type": "string", "title": "Child"}));
        assert_eq!(doc["odd"], serde_json::json!(3));
    }

    #[test]
    fn test_pointer_through_nested_reference() {
        let resolution = resolve(&[
            ("a.yaml", "x: {$ref: 'b.yaml#/alias/y'}\n"),
            ("b.yaml", "alias: {$ref: 'c.yaml#/target'}\n"),
            ("c.yaml", "target: {y: found}\n"),
        ]);
        assert!(resolution.errors.is_empty(), "{:?}", resolution.errors);
        assert_eq!(json(&resolution), serde_json::json!({"x": "found"}));
    }

    #[test]
    fn test_pointer_through_self_reference_terminates() {
        let resolution = resolve(&[("a.yaml", "loop: {$ref: '#/loop'}\nx: {$ref: '#/loop/y'}\n")]);
        assert_eq!(resolution.errors.len(), 1);
        assert!(matches!(
            &resolution.errors[0].cause,
            Cause::KeyNotFound { key, .. } if key == "y"
        ));
    }

    #[test]
    fn test_missing_file_behind_passed_reference() {
        let resolution = resolve(&[
            ("a.yaml", "x: {$ref: 'b.yaml#/alias/y'}\n"),
            ("b.yaml", "alias: {$ref: 'missing.yaml'}\n"),
        ]);
        assert_eq!(resolution.errors.len(), 1);
        let error = &resolution.errors[0];
        assert!(error.cause.is_missing_file());
        assert_eq!(error.history, ["a.yaml", "b.yaml"]);
    }

    #[test]
    fn test_missing_key_behind_passed_reference_names_its_file() {
        let resolution = resolve(&[
            ("a.yaml", "t: {z: 1}\nx: {$ref: 'b.yaml#/back/k'}\n"),
            ("b.yaml", "back: {$ref: 'a.yaml#/t'}\n"),
        ]);
        assert_eq!(resolution.errors.len(), 1);
        let error = &resolution.errors[0];
        assert_eq!(error.history, ["a.yaml", "b.yaml", "a.yaml"]);
        assert_eq!(
            error.cause,
            Cause::KeyNotFound {
                pointer: "/t/k".into(),
                key: "k".into()
            }
        );
    }

    #[test]
    fn test_nested_reference_in_passed_file_extends_history() {
        let resolution = resolve(&[
            ("a.yaml", "x: {$ref: 'b.yaml#/alias/y'}\n"),
            ("b.yaml", "alias: {$ref: 'c.yaml#/target'}\n"),
            ("c.yaml", "target: {y: {$ref: 'd.yaml'}}\n"),
        ]);
        assert_eq!(resolution.errors.len(), 1);
        assert_eq!(resolution.errors[0].history, ["a.yaml", "b.yaml", "c.yaml"]);
    }

    #[test]
    fn test_local_reference_does_not_repeat_file() {
        let resolution = resolve(&[("a.yaml", "x: {$ref: '#/nope'}\n")]);
        assert_eq!(resolution.errors.len(), 1);
        assert_eq!(resolution.errors[0].history, ["a.yaml"]);
    }

    #[test]
    fn test_missing_key_history_includes_target() {
        let resolution = resolve(&[
            ("a.yaml", "x: {$ref: 'b.yaml#/missing_key'}\n"),
            ("b.yaml", "y: 1\n"),
        ]);
        assert_eq!(resolution.errors.len(), 1);
        let error = &resolution.errors[0];
        assert_eq!(error.history, ["a.yaml", "b.yaml"]);
        assert_eq!(error.path.as_deref(), Some(&["x".to_string(), "$ref".to_string()][..]));
        assert!(error.data.is_some());
        assert_eq!(
            error.cause,
            Cause::KeyNotFound {
                pointer: "/missing_key".into(),
                key: "missing_key".into()
            }
        );
    }

    #[test]
    fn test_broken_target_is_parsed_once() {
        let resolution = resolve(&[
            ("a.yaml", "x: {$ref: 'b.yaml#/y'}\nz: {$ref: 'b.yaml#/w'}\n"),
            ("b.yaml", "y: [1, 2\n"),
        ]);
        assert_eq!(resolution.errors.len(), 2);
        for error in &resolution.errors {
            assert!(matches!(error.cause, Cause::Parse(_)));
            assert_eq!(error.history, ["a.yaml", "b.yaml"]);
        }
        assert_eq!(resolution.sources.len(), 2);
        // the failed reference stays in place
        assert_eq!(json(&resolution)["x"], serde_json::json!({"$ref": "b.yaml#/y"}));
    }

    #[test]
    fn test_root_missing() {
        let resolution = Loader::with_source("a.yaml", Box::new(MemorySource::new())).resolve();
        assert_eq!(resolution.errors.len(), 1);
        let error = &resolution.errors[0];
        assert_eq!(error.history, ["a.yaml"]);
        assert!(error.data.is_none());
        assert!(error.path.is_none());
        assert_eq!(resolution.document, Value::empty_mapping());
    }

    #[test]
    fn test_root_parse_failure() {
        let resolution = resolve(&[("a.yaml", "a: [1, 2\nb: 3\n")]);
        assert_eq!(resolution.errors.len(), 1);
        assert!(matches!(resolution.errors[0].cause, Cause::Parse(_)));
        assert_eq!(resolution.errors[0].history, ["a.yaml"]);
        assert_eq!(resolution.document, Value::empty_mapping());
    }

    #[test]
    fn test_non_string_ref_is_data() {
        let resolution = resolve(&[("a.yaml", "x: {$ref: 5}\n")]);
        assert!(resolution.errors.is_empty());
        assert_eq!(json(&resolution), serde_json::json!({"x": {"$ref": 5}}));
    }

    #[test]
    fn test_resolved_value_keeps_target_position() {
        let resolution = resolve(&[
            ("a.yaml", "x: {$ref: 'b.yaml#/y'}\n"),
            ("b.yaml", "y:\n  count: 3\n"),
        ]);
        let count = resolution.document.get("x").and_then(|x| x.get("count")).unwrap();
        let node = resolution.store.lookup_value(count).unwrap();
        assert_eq!(node.file(), "b.yaml");
        assert_eq!((node.start_mark.line, node.start_mark.column), (1, 9));
    }

    #[test]
    fn test_normalized_root_name() {
        let loader = Loader::with_source("./dir/../a.yaml", Box::new(MemorySource::new()));
        assert_eq!(loader.filename(), "a.yaml");
    }
}
