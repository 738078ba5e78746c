//! Line-tracking YAML document model.
//!
//! `serde_yml` (used elsewhere in this workspace for config deserialization)
//! discards node positions once decoded into a `Value`. The section parser
//! needs the opposite: a document tree that remembers which source line each
//! mapping key and value came from. `yaml-rust`'s low-level `Parser` +
//! `MarkedEventReceiver` API streams SAX-style events each carrying a
//! `Marker { line, col }`, which is exactly what a position-aware YAML linter
//! needs — the same reason `yamllint-rs` reaches for it. We build our own
//! minimal node tree from that event stream rather than using `YamlLoader`,
//! which throws the markers away.

use yaml_rust::parser::{Event, MarkedEventReceiver, Parser};

use crate::api::types::{CoreError, FieldValue};
use std::collections::BTreeMap;

/// A YAML node tagged with the 1-based source line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub enum YamlNode {
    Scalar { value: String, line: u32 },
    Sequence { items: Vec<YamlNode>, line: u32 },
    Mapping { entries: Vec<(String, u32, YamlNode)>, line: u32 },
    Null { line: u32 },
}

impl YamlNode {
    pub fn line(&self) -> u32 {
        match self {
            YamlNode::Scalar { line, .. }
            | YamlNode::Sequence { line, .. }
            | YamlNode::Mapping { line, .. }
            | YamlNode::Null { line } => *line,
        }
    }

    /// The maximum line number reachable by recursive descent into this
    /// node's children — for sequences, the last element's deepest line;
    /// for scalars, the node's own line.
    pub fn max_line(&self) -> u32 {
        match self {
            YamlNode::Scalar { line, .. } | YamlNode::Null { line } => *line,
            YamlNode::Sequence { items, line } => {
                items.iter().map(YamlNode::max_line).fold(*line, u32::max)
            }
            YamlNode::Mapping { entries, line } => entries
                .iter()
                .map(|(_, key_line, value)| (*key_line).max(value.max_line()))
                .fold(*line, u32::max),
        }
    }

    pub fn as_mapping(&self) -> Option<&[(String, u32, YamlNode)]> {
        match self {
            YamlNode::Mapping { entries, .. } => Some(entries),
            _ => None,
        }
    }

    /// Look up `key` in a mapping node, returning the key's own line and the
    /// associated value node.
    pub fn get<'a>(&'a self, key: &str) -> Option<(u32, &'a YamlNode)> {
        self.as_mapping()?
            .iter()
            .find(|(k, _, _)| k == key)
            .map(|(_, line, value)| (*line, value))
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, YamlNode::Mapping { .. })
    }

    /// Lift this node into a `FieldValue` for exposure via `Section.fields`.
    pub fn to_field_value(&self) -> FieldValue {
        match self {
            YamlNode::Scalar { value, .. } => scalar_to_field_value(value),
            YamlNode::Null { .. } => FieldValue::Null,
            YamlNode::Sequence { items, .. } => {
                FieldValue::Sequence(items.iter().map(YamlNode::to_field_value).collect())
            }
            YamlNode::Mapping { entries, .. } => {
                let mut map = BTreeMap::new();
                for (key, _, value) in entries {
                    map.insert(key.clone(), value.to_field_value());
                }
                FieldValue::Mapping(map)
            }
        }
    }
}

fn scalar_to_field_value(raw: &str) -> FieldValue {
    match raw {
        "~" | "null" | "Null" | "NULL" | "" => FieldValue::Null,
        "true" | "True" | "TRUE" => FieldValue::Bool(true),
        "false" | "False" | "FALSE" => FieldValue::Bool(false),
        _ => {
            if let Ok(i) = raw.parse::<i64>() {
                FieldValue::Int(i)
            } else if let Ok(f) = raw.parse::<f64>() {
                FieldValue::Float(f)
            } else {
                FieldValue::String(raw.to_string())
            }
        }
    }
}

enum Frame {
    Mapping {
        line: u32,
        pending_key: Option<(String, u32)>,
        entries: Vec<(String, u32, YamlNode)>,
    },
    Sequence {
        line: u32,
        items: Vec<YamlNode>,
    },
}

#[derive(Default)]
struct Builder {
    stack: Vec<Frame>,
    root: Option<YamlNode>,
}

impl Builder {
    fn push_value(&mut self, node: YamlNode, node_line: u32) {
        match self.stack.last_mut() {
            Some(Frame::Sequence { items, .. }) => items.push(node),
            Some(Frame::Mapping { pending_key, entries, .. }) => {
                if let Some((key, key_line)) = pending_key.take() {
                    entries.push((key, key_line, node));
                } else if let YamlNode::Scalar { value, .. } = &node {
                    *pending_key = Some((value.clone(), node_line));
                } else {
                    // A non-scalar used as a mapping key: keep a stable
                    // placeholder key so the entry isn't silently dropped.
                    *pending_key = Some((format!("<key@{node_line}>"), node_line));
                }
            }
            None => self.root = Some(node),
        }
    }
}

impl MarkedEventReceiver for Builder {
    fn on_event(&mut self, ev: Event, mark: yaml_rust::scanner::Marker) {
        let line = mark.line() as u32 + 1;
        match ev {
            Event::MappingStart(_) => self.stack.push(Frame::Mapping {
                line,
                pending_key: None,
                entries: Vec::new(),
            }),
            Event::MappingEnd => {
                if let Some(Frame::Mapping { line, entries, .. }) = self.stack.pop() {
                    self.push_value(YamlNode::Mapping { entries, line }, line);
                }
            }
            Event::SequenceStart(_) => self.stack.push(Frame::Sequence { line, items: Vec::new() }),
            Event::SequenceEnd => {
                if let Some(Frame::Sequence { line, items }) = self.stack.pop() {
                    self.push_value(YamlNode::Sequence { items, line }, line);
                }
            }
            Event::Scalar(value, _, _, _) => self.push_value(YamlNode::Scalar { value, line }, line),
            Event::Alias(_) => self.push_value(YamlNode::Null { line }, line),
            Event::Nothing | Event::StreamStart | Event::StreamEnd | Event::DocumentStart | Event::DocumentEnd => {}
        }
    }
}

/// Parse `content` into a line-tracking document tree, unwrapped to the root
/// mapping (or scalar/sequence, for non-mapping documents).
pub fn parse(content: &str) -> Result<YamlNode, CoreError> {
    let mut parser = Parser::new(content.chars());
    let mut builder = Builder::default();
    parser
        .load(&mut builder, false)
        .map_err(|e| CoreError::Parse(format!("YAML parse error: {e}")))?;

    builder
        .root
        .ok_or_else(|| CoreError::Parse("YAML document is empty".to_string()))
}
