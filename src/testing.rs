//! Test utilities shared across unit and integration tests.
//!
//! This module is always compiled but hidden from documentation.
//! It provides canonical node and corpus builders to avoid duplication.

#![doc(hidden)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::build::{assemble_index, index_document, EntrySet, Node};
use crate::config::EngineConfig;
use crate::types::SearchIndex;

/// Create a node with an id, a type and a display name.
pub fn make_node(id: &str, node_type: &str, name: &str) -> Node {
    Node {
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        node_type: Some(node_type.to_string()),
        ..Node::default()
    }
}

/// Same as [`make_node`], with a `body` field.
pub fn make_node_with_body(id: &str, node_type: &str, name: &str, body: &str) -> Node {
    let mut node = make_node(id, node_type, name);
    node.fields.insert("body".to_string(), body.to_string());
    node
}

/// The three-node corpus: Aya, Maya and Dune City, one file each.
pub fn sample_nodes() -> Vec<(String, Node)> {
    let mut aya = make_node_with_body("aya", "character", "Aya", "Aya surfs time.");
    aya.tags = vec!["hero".to_string()];
    let maya = make_node_with_body("maya", "character", "Maya", "Maya studies dragons.");
    let dune = make_node("dune", "location", "Dune City");

    vec![
        ("characters/aya.yaml".to_string(), aya),
        ("characters/maya.json".to_string(), maya),
        ("places/dune.md".to_string(), dune),
    ]
}

/// Index documents in memory, without touching disk.
pub fn index_from_nodes(scope_id: &str, documents: &[(String, Node)]) -> SearchIndex {
    let prose = EngineConfig::default().prose_fields;
    let mut entries = EntrySet::default();
    for (path, node) in documents {
        entries.extend(index_document(path, node, &prose));
    }
    assemble_index(scope_id, BTreeMap::new(), entries)
}

/// [`sample_nodes`] indexed in memory.
pub fn sample_index() -> SearchIndex {
    index_from_nodes("sample", &sample_nodes())
}

/// Files equivalent to [`sample_nodes`], one per supported format.
pub const SAMPLE_FILES: &[(&str, &str)] = &[
    (
        "characters/aya.yaml",
        "id: aya\ntype: character\nname: Aya\ntags: [hero]\nbody: Aya surfs time.\n",
    ),
    (
        "characters/maya.json",
        r#"{"id": "maya", "type": "character", "name": "Maya", "body": "Maya studies dragons."}"#,
    ),
    (
        "places/dune.md",
        "---\nid: dune\ntype: location\nname: Dune City\n---\n",
    ),
];

/// Write a file under `root`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directories");
    }
    fs::write(&path, text).expect("write test file");
}

/// Write [`SAMPLE_FILES`] under `root`.
pub fn write_sample_corpus(root: &Path) {
    for (relative, text) in SAMPLE_FILES {
        write_file(root, relative, text);
    }
}

/// A corpus of `n` generated character files, for scale tests and benchmarks.
pub fn write_generated_corpus(root: &Path, n: usize) {
    for i in 0..n {
        let text = format!(
            "id: c{i}\ntype: character\nname: Character {i}\ntags: [cast, group{}]\nbody: Character {i} walks through chapter {} of the story.\n",
            i % 7,
            i % 13
        );
        write_file(root, &format!("cast/c{i:04}.yaml"), &text);
    }
}

/// `n` generated nodes, in memory.
pub fn generated_nodes(n: usize) -> Vec<(String, Node)> {
    (0..n)
        .map(|i| {
            let mut node = make_node_with_body(
                &format!("c{i}"),
                "character",
                &format!("Character {i}"),
                &format!("Character {i} walks through chapter {} of the story.", i % 13),
            );
            node.tags = vec!["cast".to_string(), format!("group{}", i % 7)];
            (format!("cast/c{i:04}.yaml"), node)
        })
        .collect()
}
