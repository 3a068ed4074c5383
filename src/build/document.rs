// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Node documents: what a file looks like once parsed.
//!
//! A file holds one root [`Node`] that may nest children to any depth. Every
//! field is optional. Files in the wild are hand-edited, so a tag list that
//! turns out to be a number, or an `attributes` block written as a map rather
//! than a list, is read as well as it can be and never fails the file. Only
//! text that isn't JSON/YAML at all is a parse error.
//!
//! ```yaml
//! id: aya
//! type: character
//! name: Aya
//! tags: [hero, pilot]
//! attributes:
//!   - { key: age, value: 19 }
//! body: Aya surfs time.
//! children:
//!   - { id: aya-ship, name: The Tern, type: item }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// How a file's text is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    /// Markdown with optional `---` fenced YAML frontmatter.
    Markdown,
}

impl DocumentFormat {
    /// Classify by extension (case-insensitive). Unknown extensions are `None`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(DocumentFormat::Json),
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            "md" | "markdown" => Some(DocumentFormat::Markdown),
            _ => None,
        }
    }
}

/// One node of a parsed document tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub id: Option<String>,
    pub name: Option<String>,
    pub node_type: Option<String>,
    pub tags: Vec<String>,
    /// `(key, value)` pairs in document order.
    pub attributes: Vec<(String, String)>,
    /// Every other string-valued field, prose candidates included.
    pub fields: BTreeMap<String, String>,
    pub children: Vec<Node>,
}

impl Node {
    /// Read a node from a loosely-typed value. Non-objects are not nodes.
    pub fn from_value(value: &Value) -> Option<Node> {
        let object = value.as_object()?;
        Some(Node::from_object(object))
    }

    fn from_object(object: &Map<String, Value>) -> Node {
        let mut node = Node::default();
        for (key, value) in object {
            match key.as_str() {
                "id" => node.id = scalar_string(value),
                "name" => node.name = scalar_string(value),
                "type" => node.node_type = scalar_string(value),
                "tags" => node.tags = read_tags(value),
                "attributes" => node.attributes = read_attributes(value),
                "children" => {
                    if let Some(children) = value.as_array() {
                        node.children = children.iter().filter_map(Node::from_value).collect();
                    }
                }
                _ => {
                    if let Value::String(text) = value {
                        node.fields.insert(key.clone(), text.clone());
                    }
                }
            }
        }
        // Markdown frontmatter often says `title` where structured files say `name`.
        if node.name.is_none() {
            node.name = node.fields.get("title").cloned();
        }
        node
    }

    /// A prose field, if present and non-blank.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|text| !text.trim().is_empty())
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// A list, or one comma-separated string (`tags: hero, pilot`).
fn read_tags(value: &Value) -> Vec<String> {
    let mut tags: Vec<String> = match value {
        Value::Array(items) => items.iter().filter_map(scalar_string).collect(),
        Value::String(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect(),
        other => scalar_string(other).into_iter().collect(),
    };
    // Ordered set: first occurrence wins.
    let mut seen = std::collections::HashSet::new();
    tags.retain(|tag| seen.insert(tag.clone()));
    tags
}

fn read_attributes(value: &Value) -> Vec<(String, String)> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                let object = item.as_object()?;
                let key = scalar_string(object.get("key")?)?;
                let value = object.get("value").and_then(scalar_string)?;
                Some((key, value))
            })
            .collect(),
        Value::Object(map) => map
            .iter()
            .filter_map(|(key, value)| Some((key.clone(), scalar_string(value)?)))
            .collect(),
        _ => Vec::new(),
    }
}

/// Turns file text into a node tree.
///
/// The builder calls this from worker threads, hence `Send + Sync`.
pub trait DocumentModel: Send + Sync {
    fn parse(&self, path: &str, text: &str, format: DocumentFormat) -> Result<Node>;
}

/// JSON, YAML, and Markdown-with-frontmatter.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDocumentModel;

impl DocumentModel for DefaultDocumentModel {
    fn parse(&self, path: &str, text: &str, format: DocumentFormat) -> Result<Node> {
        match format {
            DocumentFormat::Json => {
                let value: Value =
                    serde_json::from_str(text).map_err(|e| Error::parse(path, e))?;
                root_node(path, &value)
            }
            DocumentFormat::Yaml => {
                let value = parse_yaml(path, text)?;
                root_node(path, &value)
            }
            DocumentFormat::Markdown => parse_markdown(path, text),
        }
    }
}

fn parse_yaml(path: &str, text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_yaml::from_str(text).map_err(|e| Error::parse(path, e))
}

fn root_node(path: &str, value: &Value) -> Result<Node> {
    Node::from_value(value)
        .ok_or_else(|| Error::parse(path, "top-level value is not a mapping"))
}

fn parse_markdown(path: &str, text: &str) -> Result<Node> {
    let (frontmatter, body) = split_frontmatter(text);

    let mut node = match frontmatter {
        Some(yaml) => root_node(path, &parse_yaml(path, yaml)?)?,
        None => Node::default(),
    };

    let body = body.trim();
    if !body.is_empty() {
        node.fields.insert("body".to_string(), body.to_string());
    }
    Ok(node)
}

/// Split `---\n<yaml>\n---\n<body>`. Without a closing fence the whole text is body.
pub fn split_frontmatter(text: &str) -> (Option<&str>, &str) {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let Some(rest) = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    else {
        return (None, text);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }
    (None, text)
}
