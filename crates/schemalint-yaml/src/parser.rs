//! YAML parser that builds id-carrying value trees.

use crate::{Mapping, Mark, Node, NodeKind, NodePair, ParseFailure, PositionStore, Value, ValueKind};
use schemalint_source_map::FileInformation;
use std::collections::HashMap;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// Parse YAML (or JSON) from a string without a file name.
///
/// # Example
///
/// ```rust
/// use schemalint_yaml::{PositionStore, parse};
///
/// let mut store = PositionStore::new();
/// let doc = parse("title: My Document", &mut store).unwrap();
/// assert_eq!(doc.get("title").and_then(|v| v.as_str()), Some("My Document"));
/// ```
///
/// # Errors
///
/// Returns a [`ParseFailure`] if the document is malformed.
pub fn parse(content: &str, store: &mut PositionStore) -> Result<Value, ParseFailure> {
    parse_impl(content, "<anonymous>", store)
}

/// Parse YAML (or JSON) from a string with an associated file name.
///
/// Every constructed value, including mapping keys, is recorded in `store`
/// with marks naming `filename`. Only the first document of a stream is
/// read. An empty document yields null.
///
/// # Errors
///
/// Returns a [`ParseFailure`] located at the scanner's problem mark if the
/// document is malformed. Nodes recorded before the failure stay in the
/// store but are unreachable.
pub fn parse_file(
    content: &str,
    filename: &str,
    store: &mut PositionStore,
) -> Result<Value, ParseFailure> {
    parse_impl(content, filename, store)
}

fn parse_impl(
    content: &str,
    filename: &str,
    store: &mut PositionStore,
) -> Result<Value, ParseFailure> {
    let mut parser = Parser::new_from_str(content);
    let mut builder = YamlBuilder::new(content, filename, store);

    if let Err(err) = parser.load(&mut builder, false) {
        return Err(ParseFailure::new(err.info()).at(builder.mark(err.marker().index())));
    }

    builder.result()
}

/// A finished value and the character offsets of its source text.
#[derive(Debug, Clone)]
struct Built {
    value: Value,
    start: usize,
    end: usize,
}

/// A collection being constructed during parsing.
enum BuildNode {
    Sequence {
        start: usize,
        anchor: usize,
        items: Vec<Built>,
    },

    Mapping {
        start: usize,
        anchor: usize,
        entries: Vec<(Built, Option<Built>)>,
    },
}

/// Event receiver that constructs values and records their nodes.
struct YamlBuilder<'a> {
    chars: Vec<char>,
    info: FileInformation,
    filename: String,
    store: &'a mut PositionStore,
    stack: Vec<BuildNode>,
    anchors: HashMap<usize, Built>,
    root: Option<Built>,
    failure: Option<ParseFailure>,
}

impl<'a> YamlBuilder<'a> {
    fn new(source: &str, filename: &str, store: &'a mut PositionStore) -> Self {
        Self {
            chars: source.chars().collect(),
            info: FileInformation::new(source),
            filename: filename.to_string(),
            store,
            stack: Vec::new(),
            anchors: HashMap::new(),
            root: None,
            failure: None,
        }
    }

    fn result(mut self) -> Result<Value, ParseFailure> {
        if let Some(failure) = self.failure.take() {
            return Err(failure);
        }
        match self.root.take() {
            Some(built) => Ok(built.value),
            None => {
                let start = self.mark(0);
                let id = self.store.record(Node {
                    start_mark: start.clone(),
                    end_mark: start,
                    kind: NodeKind::Scalar(String::new()),
                });
                Ok(Value::with_id(ValueKind::Null, id))
            }
        }
    }

    fn mark(&self, offset: usize) -> Mark {
        match self.info.offset_to_line_col(offset) {
            Some((line, column)) => Mark::new(self.filename.as_str(), offset, line, column),
            None => {
                let line = self.info.line_count().saturating_sub(1);
                let column = self.info.line_length(line).unwrap_or(0);
                Mark::new(self.filename.as_str(), self.info.total_length(), line, column)
            }
        }
    }

    fn record(&mut self, start: usize, end: usize, kind: NodeKind, value: ValueKind, anchor: usize) -> Built {
        let start_mark = self.mark(start);
        let end_mark = self.mark(end);
        let id = self.store.record(Node {
            start_mark,
            end_mark,
            kind,
        });
        let built = Built {
            value: Value::with_id(value, id),
            start,
            end,
        };
        if anchor > 0 {
            self.anchors.insert(anchor, built.clone());
        }
        built
    }

    fn push_complete(&mut self, node: Built) {
        match self.stack.last_mut() {
            None => self.root = Some(node),
            Some(BuildNode::Sequence { items, .. }) => items.push(node),
            Some(BuildNode::Mapping { entries, .. }) => match entries.last_mut() {
                Some((_, value @ None)) => *value = Some(node),
                _ => entries.push((node, None)),
            },
        }
    }

    fn fail(&mut self, problem: &str, offset: usize) {
        if self.failure.is_none() {
            self.failure = Some(ParseFailure::new(problem).at(self.mark(offset)));
        }
    }

    fn on_scalar(&mut self, value: String, style: TScalarStyle, anchor: usize, is_str_tag: bool, marker: &Marker) {
        let (start, end) = match style {
            TScalarStyle::DoubleQuoted => self.quoted_span(marker.index(), '"'),
            TScalarStyle::SingleQuoted => self.quoted_span(marker.index(), '\''),
            TScalarStyle::Literal | TScalarStyle::Folded => self.block_scalar_span(marker.index(), &value),
            _ => (marker.index(), self.plain_end(marker.index(), &value)),
        };

        let kind = if is_str_tag || !matches!(style, TScalarStyle::Plain) {
            ValueKind::String(value.clone())
        } else {
            plain_scalar(&value)
        };

        let built = self.record(start, end, NodeKind::Scalar(value), kind, anchor);
        self.push_complete(built);
    }

    fn on_sequence_end(&mut self, marker: &Marker) {
        let Some(BuildNode::Sequence { start, anchor, items }) = self.stack.pop() else {
            self.fail("sequence end without a matching start", marker.index());
            return;
        };

        let end = self.collection_end(marker.index(), ']', items.last().map(|b| b.end), start);
        let ids = items.iter().filter_map(|b| b.value.id).collect();
        let values = items.into_iter().map(|b| b.value).collect();

        let built = self.record(start, end, NodeKind::Sequence(ids), ValueKind::Sequence(values), anchor);
        self.push_complete(built);
    }

    fn on_mapping_end(&mut self, marker: &Marker) {
        let Some(BuildNode::Mapping { start, anchor, entries }) = self.stack.pop() else {
            self.fail("mapping end without a matching start", marker.index());
            return;
        };

        // A block mapping's start event is reported past its first key.
        let start = match entries.first() {
            Some((key, _)) if self.chars.get(start) != Some(&'{') => key.start,
            _ => start,
        };
        let last_end = entries
            .last()
            .map(|(k, v)| v.as_ref().map_or(k.end, |v| v.end));
        let end = self.collection_end(marker.index(), '}', last_end, start);

        let mut pairs = Vec::with_capacity(entries.len());
        let mut mapping = Mapping::with_capacity(entries.len());
        for (key, value) in entries {
            let Some(value) = value else {
                tracing::debug!(file = %self.filename, "mapping key without a value");
                continue;
            };
            let name = key.value.key_string();
            if let (Some(key_node), Some(value_node)) = (key.value.id, value.value.id) {
                pairs.push(NodePair {
                    key: name.clone(),
                    key_node,
                    value_node,
                });
            }
            if mapping.insert(name.clone(), value.value).is_some() {
                tracing::debug!(file = %self.filename, key = %name, "duplicate mapping key, last one wins");
            }
        }

        let built = self.record(start, end, NodeKind::Mapping(pairs), ValueKind::Mapping(mapping), anchor);
        self.push_complete(built);
    }

    fn on_alias(&mut self, anchor: usize, marker: &Marker) {
        let start = marker.index();
        let mut end = start + 1;
        while let Some(ch) = self.chars.get(end) {
            if ch.is_whitespace() || matches!(ch, ',' | ']' | '}') {
                break;
            }
            end += 1;
        }

        let built = match self.anchors.get(&anchor) {
            Some(anchored) => Built {
                value: anchored.value.clone(),
                start,
                end,
            },
            None => {
                tracing::debug!(file = %self.filename, "alias to an unknown anchor");
                self.record(start, end, NodeKind::Scalar(String::new()), ValueKind::Null, 0)
            }
        };
        self.push_complete(built);
    }

    /// Flow collections end after their closing bracket; block collections
    /// end where their last child ends.
    fn collection_end(&self, marker: usize, closing: char, last_child: Option<usize>, start: usize) -> usize {
        if self.chars.get(marker) == Some(&closing) {
            marker + 1
        } else {
            last_child.unwrap_or(start)
        }
    }

    fn quoted_span(&self, marker: usize, quote: char) -> (usize, usize) {
        let open = (marker..self.chars.len())
            .find(|&i| self.chars[i] == quote)
            .unwrap_or(marker);

        let mut i = open + 1;
        while i < self.chars.len() {
            match self.chars[i] {
                '\\' if quote == '"' => i += 2,
                '\'' if quote == '\'' && self.chars.get(i + 1) == Some(&'\'') => i += 2,
                ch if ch == quote => return (open, i + 1),
                _ => i += 1,
            }
        }
        (open, self.chars.len())
    }

    /// Walk the source matching the scalar's non-blank characters, so plain
    /// scalars folded over several lines still end at their last character.
    fn plain_end(&self, start: usize, value: &str) -> usize {
        let mut pos = start;
        let mut end = start;
        for expected in value.chars().filter(|c| !c.is_whitespace()) {
            while pos < self.chars.len() && self.chars[pos] != expected {
                pos += 1;
            }
            if pos >= self.chars.len() {
                return end.max(start + value.chars().count()).min(self.chars.len());
            }
            pos += 1;
            end = pos;
        }
        end
    }

    /// A block scalar runs from its `|` or `>` indicator to the end of
    /// its last non-blank content line.
    ///
    /// The scanner marks the first content line, whose column is the
    /// content indentation.
    fn block_scalar_span(&self, marker: usize, value: &str) -> (usize, usize) {
        let Some((marker_line, marker_column)) = self.info.offset_to_line_col(marker) else {
            return (marker, marker);
        };
        let (indicator, content_indent) = if matches!(self.chars.get(marker), Some('|' | '>')) {
            (marker, None)
        } else {
            let indicator = self.block_indicator_before(marker_line).unwrap_or(marker);
            (indicator, Some(marker_column))
        };
        let Some((header, _)) = self.info.offset_to_line_col(indicator) else {
            return (indicator, marker);
        };

        let mut end = self.line_end_offset(header).unwrap_or(indicator);
        if value.is_empty() {
            return (indicator, end);
        }
        let indent = content_indent.unwrap_or_else(|| self.indent_of(header) + 1);
        for next in header + 1..self.info.line_count() {
            let Some((offset, length)) = self.line_range(next) else {
                break;
            };
            if self.chars[offset..offset + length].iter().all(|c| c.is_whitespace()) {
                continue;
            }
            if self.indent_of(next) < indent {
                break;
            }
            end = offset + length;
        }
        (indicator, end)
    }

    /// Offset of the block scalar indicator on the last non-blank line
    /// above `line`, ignoring a trailing comment.
    fn block_indicator_before(&self, line: usize) -> Option<usize> {
        for candidate in (0..line).rev() {
            let (offset, length) = self.line_range(candidate)?;
            let text = &self.chars[offset..offset + length];
            if text.iter().all(|c| c.is_whitespace()) {
                continue;
            }
            let comment = (0..text.len())
                .find(|&i| text[i] == '#' && (i == 0 || text[i - 1].is_whitespace()))
                .unwrap_or(text.len());
            return text[..comment]
                .iter()
                .rposition(|&c| matches!(c, '|' | '>'))
                .map(|i| offset + i);
        }
        None
    }

    fn line_range(&self, line: usize) -> Option<(usize, usize)> {
        self.info
            .line_col_to_offset(line, 0)
            .zip(self.info.line_length(line))
    }

    fn indent_of(&self, line: usize) -> usize {
        let Some(offset) = self.info.line_col_to_offset(line, 0) else {
            return 0;
        };
        self.chars[offset..]
            .iter()
            .take_while(|&&c| c == ' ')
            .count()
    }

    fn line_end_offset(&self, line: usize) -> Option<usize> {
        let length = self.info.line_length(line)?;
        self.info.line_col_to_offset(line, length)
    }
}

impl MarkedEventReceiver for YamlBuilder<'_> {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        match ev {
            Event::Scalar(value, style, anchor, tag) => {
                let is_str_tag = tag.as_ref().is_some_and(|t| t.suffix == "str");
                self.on_scalar(value, style, anchor, is_str_tag, &marker);
            }

            Event::SequenceStart(anchor, _tag) => {
                self.stack.push(BuildNode::Sequence {
                    start: marker.index(),
                    anchor,
                    items: Vec::new(),
                });
            }

            Event::SequenceEnd => self.on_sequence_end(&marker),

            Event::MappingStart(anchor, _tag) => {
                self.stack.push(BuildNode::Mapping {
                    start: marker.index(),
                    anchor,
                    entries: Vec::new(),
                });
            }

            Event::MappingEnd => self.on_mapping_end(&marker),

            Event::Alias(anchor) => self.on_alias(anchor, &marker),

            _ => {}
        }
    }
}

/// Resolve a plain scalar with the YAML 1.2 core schema.
fn plain_scalar(value: &str) -> ValueKind {
    match value {
        "" | "~" | "null" | "Null" | "NULL" => return ValueKind::Null,
        "true" | "True" | "TRUE" => return ValueKind::Bool(true),
        "false" | "False" | "FALSE" => return ValueKind::Bool(false),
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => {
            return ValueKind::Real(f64::INFINITY);
        }
        "-.inf" | "-.Inf" | "-.INF" => return ValueKind::Real(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return ValueKind::Real(f64::NAN),
        _ => {}
    }

    if let Some(i) = parse_integer(value) {
        return ValueKind::Integer(i);
    }

    let float_like = value.chars().any(|c| c.is_ascii_digit())
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
    if float_like {
        if let Ok(f) = value.parse::<f64>() {
            return ValueKind::Real(f);
        }
    }

    ValueKind::String(value.to_string())
}

fn parse_integer(value: &str) -> Option<i64> {
    if let Some(hex) = value.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok();
    }
    if let Some(octal) = value.strip_prefix("0o") {
        return i64::from_str_radix(octal, 8).ok();
    }
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        return value.parse::<i64>().ok();
    }
    None
}
