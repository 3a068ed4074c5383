// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for document parsing and tree walking.
//!
//! Notes files are hand-edited, so the parser sees everything from truncated
//! YAML to binary junk. Parsing may fail, but it must fail with an error,
//! and whatever does parse must walk into entries the index can use.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use loresift::build::index_document;
use loresift::{DefaultDocumentModel, DocumentFormat, DocumentModel, EngineConfig};
use std::collections::HashSet;

#[derive(Debug, Arbitrary)]
enum Format {
    Json,
    Yaml,
    Markdown,
}

#[derive(Debug, Arbitrary)]
struct DocumentInput {
    format: Format,
    text: String,
}

fuzz_target!(|input: DocumentInput| {
    let text: String = input.text.chars().take(8192).collect();
    let (format, path) = match input.format {
        Format::Json => (DocumentFormat::Json, "fuzz.json"),
        Format::Yaml => (DocumentFormat::Yaml, "fuzz.yaml"),
        Format::Markdown => (DocumentFormat::Markdown, "fuzz.md"),
    };

    let Ok(node) = DefaultDocumentModel.parse(path, &text, format) else {
        return;
    };

    let prose = EngineConfig::default().prose_fields;
    let entries = index_document(path, &node, &prose);

    // The root always yields a title entry
    assert!(!entries.titles.is_empty());

    let ids: HashSet<&str> = entries.titles.iter().map(|t| t.id.as_str()).collect();
    for entry in &entries.content {
        assert!(ids.contains(entry.id.as_str()), "orphan content {}", entry.id);
        assert_eq!(entry.length, entry.tokens.len());
    }
    for entry in &entries.metadata {
        assert!(ids.contains(entry.id.as_str()), "orphan metadata {}", entry.id);
    }
});
