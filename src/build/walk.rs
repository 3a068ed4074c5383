// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Per-node indexing: turn one document tree into tiered entries.
//!
//! Every node yields one [`TitleEntry`] and one [`MetadataEntry`], plus one
//! [`ContentEntry`] per non-blank prose field. Children are walked depth-first
//! in document order.
//!
//! A node without an `id` gets a composite one, `path + ":" + nodePath`, so
//! two anonymous sections in different files never collide. Ids that *are*
//! given are trusted as-is, even when another file reuses them.

use std::collections::BTreeMap;
use std::path::Path;

use crate::scoring::depth_boost;
use crate::tokenizer::tokenize;
use crate::types::{ContentEntry, MetadataEntry, TitleEntry};

use super::document::Node;

/// Type given to nodes that don't declare one.
pub const DEFAULT_NODE_TYPE: &str = "node";

/// Name given to nodes with nothing better to show.
pub const UNTITLED: &str = "Untitled";

/// Entries produced from one or more documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntrySet {
    pub titles: Vec<TitleEntry>,
    pub metadata: Vec<MetadataEntry>,
    pub content: Vec<ContentEntry>,
}

impl EntrySet {
    pub fn extend(&mut self, other: EntrySet) {
        self.titles.extend(other.titles);
        self.metadata.extend(other.metadata);
        self.content.extend(other.content);
    }

    pub fn node_count(&self) -> usize {
        self.titles.len()
    }
}

/// Walk a document tree rooted at `root` from the file at `path`.
pub fn index_document(path: &str, root: &Node, prose_fields: &[String]) -> EntrySet {
    let mut entries = EntrySet::default();
    let stem = Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    let walk = Walk {
        path,
        stem: &stem,
        prose_fields,
    };
    let mut ancestors = Vec::new();
    walk.visit(root, 0, &mut ancestors, &mut entries);
    entries
}

struct Walk<'a> {
    path: &'a str,
    stem: &'a str,
    prose_fields: &'a [String],
}

impl Walk<'_> {
    fn visit(&self, node: &Node, position: usize, ancestors: &mut Vec<String>, out: &mut EntrySet) {
        let id = match &node.id {
            Some(id) => id.clone(),
            None => format!("{}:{}", self.path, ancestors.join("/")),
        };
        let node_type = node
            .node_type
            .clone()
            .unwrap_or_else(|| DEFAULT_NODE_TYPE.to_string());
        let node_path = ancestors.clone();

        out.titles.push(TitleEntry {
            id: id.clone(),
            node_type: node_type.clone(),
            path: self.path.to_string(),
            node_path: node_path.clone(),
            name: self.display_name(node),
            boost: depth_boost(&node_path),
        });

        let mut attributes = BTreeMap::new();
        for (key, value) in &node.attributes {
            attributes.entry(key.clone()).or_insert_with(|| value.clone());
        }
        out.metadata.push(MetadataEntry {
            id: id.clone(),
            node_type: node_type.clone(),
            path: self.path.to_string(),
            node_path: node_path.clone(),
            tags: node.tags.clone(),
            attributes,
        });

        for field in self.prose_fields {
            if let Some(text) = node.field(field) {
                let tokens = tokenize(text);
                out.content.push(ContentEntry {
                    id: id.clone(),
                    node_type: node_type.clone(),
                    path: self.path.to_string(),
                    node_path: node_path.clone(),
                    field: field.clone(),
                    text: text.to_string(),
                    length: tokens.len(),
                    tokens,
                });
            }
        }

        ancestors.push(path_segment(node, position));
        for (i, child) in node.children.iter().enumerate() {
            self.visit(child, i, ancestors, out);
        }
        ancestors.pop();
    }

    fn display_name(&self, node: &Node) -> String {
        node.name
            .clone()
            .or_else(|| node.id.clone())
            .or_else(|| (!self.stem.is_empty()).then(|| self.stem.to_string()))
            .unwrap_or_else(|| UNTITLED.to_string())
    }
}

/// How a node appears in its descendants' `node_path`.
fn path_segment(node: &Node, position: usize) -> String {
    node.id
        .clone()
        .or_else(|| node.name.clone())
        .unwrap_or_else(|| format!("#{position}"))
}
