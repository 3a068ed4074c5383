// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Query parsing: raw search box text in, structured query out.
//!
//! ```text
//! dragon "ice queen" type:character -type:location body:fire -draft
//! ──┬─── ────┬────── ──────┬─────── ──────┬─────── ────┬──── ──┬───
//!   term   phrase      type filter   type exclusion  field   excluded
//!                                                   filter    term
//! ```
//!
//! Parsing never fails. Garbage in gives an empty (or partially filled)
//! query out, and an empty query short-circuits the executor. Everything is
//! lowercased here so the executor can compare without thinking about case.

use serde::Serialize;

/// Fields a `field:value` filter may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterField {
    Body,
    Summary,
    Description,
    Attributes,
    Tags,
}

impl FilterField {
    /// Parse a filter prefix (case-insensitive). Unknown names are not filters.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "body" => Some(FilterField::Body),
            "summary" => Some(FilterField::Summary),
            "description" => Some(FilterField::Description),
            "attributes" => Some(FilterField::Attributes),
            "tags" => Some(FilterField::Tags),
            _ => None,
        }
    }

    /// The field name as written in queries and content entries.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterField::Body => "body",
            FilterField::Summary => "summary",
            FilterField::Description => "description",
            FilterField::Attributes => "attributes",
            FilterField::Tags => "tags",
        }
    }

    /// Does this filter target prose (tier 3) rather than metadata (tier 2)?
    pub fn is_prose(&self) -> bool {
        matches!(
            self,
            FilterField::Body | FilterField::Summary | FilterField::Description
        )
    }
}

/// A `field:value` substring filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFilter {
    pub field: FilterField,
    pub value: String,
}

/// Things the query asks to leave out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Exclusions {
    pub types: Vec<String>,
    pub terms: Vec<String>,
}

/// Type and field restrictions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryFilters {
    pub types: Vec<String>,
    pub fields: Vec<FieldFilter>,
    pub exclude: Exclusions,
}

/// A parsed search query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedQuery {
    /// Free-text terms, fuzzy-matched.
    pub terms: Vec<String>,
    /// Quoted substrings, matched verbatim (case-insensitive).
    pub phrases: Vec<String>,
    pub filters: QueryFilters,
}

impl ParsedQuery {
    /// Nothing to search for: no terms, phrases, type or field filters.
    ///
    /// Exclusions alone don't count, since excluding from nothing is nothing.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
            && self.phrases.is_empty()
            && self.filters.types.is_empty()
            && self.filters.fields.is_empty()
    }

    /// Short lookups that tier 1 can satisfy alone: ≤ 2 terms, no phrases.
    pub fn is_simple(&self) -> bool {
        self.terms.len() <= 2 && self.phrases.is_empty()
    }

    /// Type allow/deny check for an entry's type.
    pub fn allows_type(&self, node_type: &str) -> bool {
        let node_type = node_type.to_lowercase();
        if self.filters.exclude.types.iter().any(|t| *t == node_type) {
            return false;
        }
        self.filters.types.is_empty() || self.filters.types.iter().any(|t| *t == node_type)
    }

    /// Does any token hit the term denylist?
    pub fn excludes_any<'a>(&self, mut tokens: impl Iterator<Item = &'a str>) -> bool {
        !self.filters.exclude.terms.is_empty()
            && tokens.any(|token| self.filters.exclude.terms.iter().any(|t| t == token))
    }
}

/// Parse a raw search string.
pub fn parse_query(input: &str) -> ParsedQuery {
    let mut query = ParsedQuery::default();
    if input.trim().is_empty() {
        return query;
    }

    let (phrases, remainder) = extract_phrases(input);
    query.phrases = phrases;

    for token in remainder.split_whitespace() {
        classify_token(&token.to_lowercase(), &mut query);
    }

    query
}

/// Pull out every closed `"..."` span. An unmatched quote is dropped and the
/// text after it is parsed as plain tokens.
fn extract_phrases(input: &str) -> (Vec<String>, String) {
    let mut phrases = Vec::new();
    let mut remainder = String::with_capacity(input.len());

    let mut rest = input;
    while let Some(open) = rest.find('"') {
        remainder.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        match after_open.find('"') {
            Some(close) => {
                let phrase = after_open[..close].trim().to_lowercase();
                if !phrase.is_empty() {
                    phrases.push(phrase);
                }
                // Keep the phrase from gluing its neighbours into one token.
                remainder.push(' ');
                rest = &after_open[close + 1..];
            }
            None => {
                remainder.push(' ');
                rest = after_open;
                break;
            }
        }
    }
    remainder.push_str(rest);

    (phrases, remainder)
}

fn classify_token(token: &str, query: &mut ParsedQuery) {
    if let Some(value) = token.strip_prefix("-type:") {
        if !value.is_empty() {
            query.filters.exclude.types.push(value.to_string());
        }
        return;
    }
    if let Some(value) = token.strip_prefix("type:") {
        if !value.is_empty() {
            query.filters.types.push(value.to_string());
        }
        return;
    }
    if let Some((name, value)) = token.split_once(':') {
        if let Some(field) = FilterField::parse(name) {
            if !value.is_empty() {
                query.filters.fields.push(FieldFilter {
                    field,
                    value: value.to_string(),
                });
            }
            return;
        }
    }
    if let Some(term) = token.strip_prefix('-') {
        if !term.is_empty() {
            query.filters.exclude.terms.push(term.to_string());
        }
        return;
    }
    if token.chars().count() >= 2 {
        query.terms.push(token.to_string());
    }
}
