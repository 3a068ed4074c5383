//! Tests for the default document model.

use loresift::build::document::split_frontmatter;
use loresift::{DefaultDocumentModel, DocumentFormat, DocumentModel, Error};

fn parse(text: &str, format: DocumentFormat) -> loresift::build::Node {
    DefaultDocumentModel
        .parse("doc", text, format)
        .expect("document should parse")
}

#[test]
fn test_format_from_extension() {
    use std::path::Path;
    assert_eq!(DocumentFormat::from_path(Path::new("a.json")), Some(DocumentFormat::Json));
    assert_eq!(DocumentFormat::from_path(Path::new("a.YML")), Some(DocumentFormat::Yaml));
    assert_eq!(DocumentFormat::from_path(Path::new("a.yaml")), Some(DocumentFormat::Yaml));
    assert_eq!(DocumentFormat::from_path(Path::new("a.md")), Some(DocumentFormat::Markdown));
    assert_eq!(DocumentFormat::from_path(Path::new("a.markdown")), Some(DocumentFormat::Markdown));
    assert_eq!(DocumentFormat::from_path(Path::new("a.txt")), None);
}

#[test]
fn test_yaml_node_with_children() {
    let node = parse(
        "id: book\nname: The Book\ntype: book\nchildren:\n  - id: ch1\n    name: One\n  - name: Two\n",
        DocumentFormat::Yaml,
    );
    assert_eq!(node.id.as_deref(), Some("book"));
    assert_eq!(node.node_type.as_deref(), Some("book"));
    assert_eq!(node.children.len(), 2);
    assert_eq!(node.children[1].id, None);
    assert_eq!(node.children[1].name.as_deref(), Some("Two"));
}

#[test]
fn test_json_attributes_as_list_or_map() {
    let list = parse(
        r#"{"id": "a", "attributes": [{"key": "age", "value": 31}, {"key": "home"}]}"#,
        DocumentFormat::Json,
    );
    assert_eq!(list.attributes, vec![("age".to_string(), "31".to_string())]);

    let map = parse(r#"{"id": "a", "attributes": {"age": 31, "alive": true}}"#, DocumentFormat::Json);
    assert!(map.attributes.contains(&("age".to_string(), "31".to_string())));
    assert!(map.attributes.contains(&("alive".to_string(), "true".to_string())));
}

#[test]
fn test_tags_deduplicated_in_order() {
    let node = parse("tags: [hero, exile, hero, 7]\n", DocumentFormat::Yaml);
    assert_eq!(node.tags, vec!["hero", "exile", "7"]);
}

#[test]
fn test_unknown_and_mistyped_fields_are_skipped() {
    let node = parse(
        r#"{"id": "a", "tags": {"not": "a list"}, "extra": [1, 2], "body": "Text."}"#,
        DocumentFormat::Json,
    );
    assert!(node.tags.is_empty());
    assert!(!node.fields.contains_key("extra"));
    assert_eq!(node.field("body"), Some("Text."));
}

#[test]
fn test_markdown_frontmatter_and_body() {
    let node = parse(
        "---\nid: dune\ntitle: Dune City\n---\n\nSand and brass.\n",
        DocumentFormat::Markdown,
    );
    assert_eq!(node.id.as_deref(), Some("dune"));
    assert_eq!(node.name.as_deref(), Some("Dune City"), "title stands in for name");
    assert_eq!(node.field("body"), Some("Sand and brass."));
}

#[test]
fn test_markdown_without_frontmatter_is_all_body() {
    let node = parse("# Heading\n\nJust prose.", DocumentFormat::Markdown);
    assert_eq!(node.id, None);
    assert_eq!(node.field("body"), Some("# Heading\n\nJust prose."));
}

#[test]
fn test_blank_fields_are_not_prose() {
    let node = parse("id: a\nbody: \"   \"\n", DocumentFormat::Yaml);
    assert_eq!(node.field("body"), None);
}

#[test]
fn test_empty_yaml_is_an_empty_node() {
    let node = parse("", DocumentFormat::Yaml);
    assert_eq!(node.id, None);
    assert!(node.children.is_empty());
}

#[test]
fn test_non_mapping_root_is_a_parse_error() {
    let err = DefaultDocumentModel
        .parse("list.yaml", "- a\n- b\n", DocumentFormat::Yaml)
        .unwrap_err();
    assert!(matches!(err, Error::Parse { ref path, .. } if path == "list.yaml"));

    let err = DefaultDocumentModel
        .parse("bad.json", "{not json", DocumentFormat::Json)
        .unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
}

#[test]
fn test_split_frontmatter() {
    assert_eq!(split_frontmatter("---\na: 1\n---\nbody"), (Some("a: 1\n"), "body"));
    assert_eq!(split_frontmatter("no fence"), (None, "no fence"));
    assert_eq!(split_frontmatter("---\nunclosed"), (None, "---\nunclosed"));
}
