//! Slices a file into named sections via a dotted, path-addressed YAML
//! navigation, producing precise line spans per `SectionDefinition`.

use std::collections::BTreeMap;

use crate::api::types::{CoreError, FieldValue, Section, SectionDefinition};
use crate::yaml_doc::{self, YamlNode};

/// Parse `content` into the sections named by `defs`. Missing non-required
/// sections are skipped silently; a missing required section, malformed
/// YAML, or navigation through a non-mapping node is a `CoreError::Parse`.
pub fn parse_sections(
    file_path: &str,
    content: &str,
    defs: &[SectionDefinition],
) -> Result<Vec<Section>, CoreError> {
    let doc = yaml_doc::parse(content)?;
    let lines: Vec<&str> = content.lines().collect();
    let total = lines.len() as u32;

    let mut sections = Vec::with_capacity(defs.len());
    for def in defs {
        if let Some(section) = resolve_section(&doc, file_path, &lines, total, def)? {
            sections.push(section);
        }
    }
    Ok(sections)
}

fn resolve_section(
    doc: &YamlNode,
    file_path: &str,
    lines: &[&str],
    total: u32,
    def: &SectionDefinition,
) -> Result<Option<Section>, CoreError> {
    let path = def.yaml_path.trim();

    let (start_line, end_line, fields) = if path.is_empty() || path == "." {
        (1u32, total.max(1), to_field_map(doc))
    } else {
        match navigate(doc, path)? {
            Some(hits) => {
                let start = hits.iter().map(|(line, _)| *line).min().unwrap_or(1);
                let end = hits.iter().map(|(_, node)| node.max_line()).max().unwrap_or(start);
                let fields = if hits.len() == 1 {
                    to_field_map(hits[0].1)
                } else {
                    BTreeMap::new()
                };
                (start, end, fields)
            }
            None => {
                return if def.required {
                    Err(CoreError::Parse(format!(
                        "required section '{}' not found at path '{}' in {}",
                        def.name, path, file_path
                    )))
                } else {
                    Ok(None)
                };
            }
        }
    };

    let start_line = start_line.max(1);
    let end_line = end_line.max(start_line).min(total.max(start_line));

    Ok(Some(Section {
        name: def.name.clone(),
        start_line,
        end_line,
        content: slice_lines(lines, start_line, end_line),
        file_path: file_path.to_string(),
        yaml_path: def.yaml_path.clone(),
        required: def.required,
        rule_configs: def.rule_configs.clone(),
        auto_approve: def.auto_approve,
        fields,
    }))
}

/// Parse a non-YAML (plain text) file into sections. Text-mode files have
/// no addressable path structure, so every section simply spans the whole
/// document; a `SectionDefinition` with a non-trivial `yamlPath` in text
/// mode is a configuration error.
pub fn parse_text_sections(
    file_path: &str,
    content: &str,
    defs: &[SectionDefinition],
) -> Result<Vec<Section>, CoreError> {
    let total = content.lines().count() as u32;
    let mut sections = Vec::with_capacity(defs.len());

    for def in defs {
        let path = def.yaml_path.trim();
        if !path.is_empty() && path != "." {
            return Err(CoreError::Config(format!(
                "section '{}' declares yaml_path '{}' but '{}' is parsed as plain text",
                def.name, def.yaml_path, file_path
            )));
        }
        sections.push(Section {
            name: def.name.clone(),
            start_line: 1,
            end_line: total.max(1),
            content: content.to_string(),
            file_path: file_path.to_string(),
            yaml_path: def.yaml_path.clone(),
            required: def.required,
            rule_configs: def.rule_configs.clone(),
            auto_approve: def.auto_approve,
            fields: BTreeMap::new(),
        });
    }
    Ok(sections)
}

fn to_field_map(node: &YamlNode) -> BTreeMap<String, FieldValue> {
    match node.to_field_value() {
        FieldValue::Mapping(map) => map,
        other => BTreeMap::from([("value".to_string(), other)]),
    }
}

fn slice_lines(lines: &[&str], start_line: u32, end_line: u32) -> String {
    let start_idx = start_line.saturating_sub(1) as usize;
    let end_idx = (end_line as usize).min(lines.len());
    if start_idx >= end_idx {
        return String::new();
    }
    lines[start_idx..end_idx].join("\n")
}

/// One dotted-path segment: a plain key, a wildcard `key[]` (iterate every
/// sequence element), or an indexed `key[N]`.
fn parse_segment(segment: &str) -> (&str, bool, Option<usize>) {
    if let Some(key) = segment.strip_suffix("[]") {
        return (key, true, None);
    }
    if let Some(open) = segment.find('[') {
        if segment.ends_with(']') {
            let key = &segment[..open];
            let idx_str = &segment[open + 1..segment.len() - 1];
            if let Ok(idx) = idx_str.parse::<usize>() {
                return (key, false, Some(idx));
            }
        }
    }
    (segment, false, None)
}

/// Navigate `path` from the document root, returning every `(key_line,
/// value_node)` hit. `[]` wildcard segments fan out across sequence
/// elements; plain segments narrow to a single mapping value. Returns
/// `Ok(None)` when the path resolves to nothing, `Err` when a segment
/// expects a mapping (or sequence, for `[]`/`[N]`) but finds neither.
fn navigate<'a>(
    doc: &'a YamlNode,
    path: &str,
) -> Result<Option<Vec<(u32, &'a YamlNode)>>, CoreError> {
    let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    let mut frontier: Vec<(u32, &'a YamlNode)> = vec![(doc.line(), doc)];

    for segment in segments {
        let (key, wildcard, index) = parse_segment(segment);
        let mut next: Vec<(u32, &'a YamlNode)> = Vec::new();

        for (_, node) in &frontier {
            if !node.is_mapping() {
                return Err(CoreError::Parse(format!(
                    "expected a mapping while navigating '{segment}' but found a non-mapping node"
                )));
            }

            let Some((key_line, value)) = node.get(key) else {
                continue;
            };

            if wildcard {
                match value {
                    YamlNode::Sequence { items, .. } => {
                        next.extend(items.iter().map(|item| (key_line, item)));
                    }
                    _ => {
                        return Err(CoreError::Parse(format!(
                            "expected a sequence for '{key}[]' but found a non-sequence node"
                        )));
                    }
                }
            } else if let Some(idx) = index {
                match value {
                    YamlNode::Sequence { items, .. } => {
                        if let Some(item) = items.get(idx) {
                            next.push((key_line, item));
                        }
                    }
                    _ => {
                        return Err(CoreError::Parse(format!(
                            "expected a sequence for '{key}[{idx}]' but found a non-sequence node"
                        )));
                    }
                }
            } else {
                next.push((key_line, value));
            }
        }

        if next.is_empty() {
            return Ok(None);
        }
        frontier = next;
    }

    Ok(Some(frontier))
}
