// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The three-tier search core: names → tags/attributes → prose.
//!
//! Tiers run cheapest first. Tier 1 is a linear scan of names, a few
//! hundred to a few thousand short strings. Tier 2 scans tags and attributes.
//! Tier 3 walks every prose token and scores it with BM25, which is where the
//! time goes on a large corpus.
//!
//! Two exits keep search-as-you-type responsive:
//!
//! - **Early exit after tier 1.** A short lookup ("aya", "dune city") that
//!   already filled the page with name matches skips tiers 2 and 3.
//! - **Timeout before tier 3.** If tiers 1 and 2 alone took longer than the
//!   budget, the results so far are returned, ranked. The check runs once,
//!   between tiers, so a single tier is never cut off halfway.
//!
//! Nothing here returns an error. An empty query or an empty index gives an
//! empty result list.

use std::collections::HashMap;
use std::time::Instant;

use tracing::debug;

use crate::config::SearchOptions;
use crate::fuzzy::fuzzy_match;
use crate::query::{FieldFilter, FilterField, ParsedQuery};
use crate::scoring::{
    bm25, field_boost, ATTRIBUTE_MATCH_BOOST, FIELD_FILTER_MATCH_SCORE, PHRASE_MATCH_BOOST,
    TAG_MATCH_BOOST, TITLE_MATCH_BOOST, TYPE_BROWSE_SCORE,
};
use crate::tokenizer::tokenize;
use crate::types::{
    ContentEntry, MatchType, MetadataEntry, SearchIndex, SearchResult, Tier, TitleEntry,
};

use super::dedup::ResultSet;
use super::snippet::{find_substring, find_token, make_snippet};

/// Run a parsed query against an index snapshot.
///
/// Deterministic: the same query on the same index always returns the same
/// list, unless the timeout fires.
pub fn execute_search(
    query: &ParsedQuery,
    index: &SearchIndex,
    options: &SearchOptions,
) -> Vec<SearchResult> {
    if query.is_empty() || options.limit == 0 || index.is_empty() {
        return Vec::new();
    }

    let start = Instant::now();
    let lookup = index.title_lookup();
    let mut results = ResultSet::new();

    // Tier 1: names
    for title in &index.titles {
        if let Some(result) = score_title(query, title) {
            results.push(result);
        }
    }

    if results.len() >= options.limit && query.is_simple() {
        debug!(results = results.len(), "tier 1 filled the page, skipping tiers 2 and 3");
        return results.into_ranked(options.limit);
    }

    // Tier 2: tags and attributes
    for meta in &index.metadata {
        if results.is_claimed(&meta.id) {
            continue;
        }
        if let Some(result) = score_metadata(query, meta, &lookup) {
            results.push(result);
        }
    }

    if start.elapsed() > options.timeout {
        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            results = results.len(),
            "search budget spent before tier 3, returning partial results"
        );
        return results.into_ranked(options.limit);
    }

    // Tier 3: prose
    let content_filters: Vec<&FieldFilter> = query
        .filters
        .fields
        .iter()
        .filter(|f| f.field.is_prose())
        .collect();
    let has_field_filters = !query.filters.fields.is_empty();

    for entry in &index.content {
        if results.is_claimed(&entry.id) {
            continue;
        }
        if has_field_filters && !content_filters.iter().any(|f| f.field.as_str() == entry.field) {
            continue;
        }
        if let Some(result) = score_content(query, entry, &content_filters, index, &lookup) {
            results.push(result);
        }
    }

    results.into_ranked(options.limit)
}

fn score_title(query: &ParsedQuery, title: &TitleEntry) -> Option<SearchResult> {
    if !query.allows_type(&title.node_type) {
        return None;
    }

    let (score, match_type) = if query.terms.is_empty() && query.phrases.is_empty() {
        // Pure filter browsing: `type:character` lists every character.
        if query.filters.types.is_empty() || !query.filters.fields.is_empty() {
            return None;
        }
        (TYPE_BROWSE_SCORE, MatchType::TypeFilter)
    } else {
        let mut score = 0.0;
        let mut phrase_hit = false;
        for term in &query.terms {
            if fuzzy_match(term, &title.name) || fuzzy_match(term, &title.id) {
                score += TITLE_MATCH_BOOST;
            }
        }
        let name = title.name.to_lowercase();
        for phrase in &query.phrases {
            if name.contains(phrase.as_str()) {
                score += TITLE_MATCH_BOOST * PHRASE_MATCH_BOOST;
                phrase_hit = true;
            }
        }
        if score <= 0.0 {
            return None;
        }
        let match_type = if phrase_hit {
            MatchType::Phrase
        } else {
            MatchType::Title
        };
        (score, match_type)
    };

    let name_tokens = tokenize(&title.name);
    if query.excludes_any(name_tokens.iter().map(String::as_str)) {
        return None;
    }

    Some(SearchResult {
        id: title.id.clone(),
        name: title.name.clone(),
        node_type: title.node_type.clone(),
        path: title.path.clone(),
        node_path: title.node_path.clone(),
        field: None,
        snippet: None,
        score: score * title.boost,
        tier: Tier::Title,
        match_type,
    })
}

fn score_metadata(
    query: &ParsedQuery,
    meta: &MetadataEntry,
    lookup: &HashMap<&str, &TitleEntry>,
) -> Option<SearchResult> {
    if !query.allows_type(&meta.node_type) {
        return None;
    }
    if meta.tags.is_empty() && meta.attributes.is_empty() {
        return None;
    }

    let mut score = 0.0;
    let mut tag_hit = false;

    for term in &query.terms {
        if meta.tags.iter().any(|tag| fuzzy_match(term, tag)) {
            score += TAG_MATCH_BOOST;
            tag_hit = true;
        }
        if meta
            .attributes
            .iter()
            .any(|(key, value)| fuzzy_match(term, key) || fuzzy_match(term, value))
        {
            score += ATTRIBUTE_MATCH_BOOST;
        }
    }

    for filter in &query.filters.fields {
        match filter.field {
            FilterField::Tags => {
                if meta
                    .tags
                    .iter()
                    .any(|tag| tag.to_lowercase().contains(filter.value.as_str()))
                {
                    score += FIELD_FILTER_MATCH_SCORE;
                    tag_hit = true;
                }
            }
            FilterField::Attributes => {
                if meta.attributes.iter().any(|(key, value)| {
                    format!("{key} {value}")
                        .to_lowercase()
                        .contains(filter.value.as_str())
                }) {
                    score += FIELD_FILTER_MATCH_SCORE;
                }
            }
            _ => {}
        }
    }

    if score <= 0.0 {
        return None;
    }

    let meta_tokens: Vec<String> = meta
        .tags
        .iter()
        .map(String::as_str)
        .chain(meta.attributes.iter().flat_map(|(k, v)| [k.as_str(), v.as_str()]))
        .flat_map(tokenize)
        .collect();
    if query.excludes_any(meta_tokens.iter().map(String::as_str)) {
        return None;
    }

    Some(SearchResult {
        id: meta.id.clone(),
        name: display_name(lookup, &meta.id),
        node_type: meta.node_type.clone(),
        path: meta.path.clone(),
        node_path: meta.node_path.clone(),
        field: None,
        snippet: None,
        score,
        tier: Tier::Metadata,
        match_type: if tag_hit {
            MatchType::Tag
        } else {
            MatchType::Attribute
        },
    })
}

fn score_content(
    query: &ParsedQuery,
    entry: &ContentEntry,
    content_filters: &[&FieldFilter],
    index: &SearchIndex,
    lookup: &HashMap<&str, &TitleEntry>,
) -> Option<SearchResult> {
    if !query.allows_type(&entry.node_type) {
        return None;
    }
    if query.excludes_any(entry.tokens.iter().map(String::as_str)) {
        return None;
    }

    let mut score = 0.0;
    let mut first_match: Option<usize> = None;
    let mut note = |offset: Option<usize>| {
        if let Some(offset) = offset {
            first_match = Some(first_match.map_or(offset, |seen| seen.min(offset)));
        }
    };

    let mut term_hit = false;
    for term in &query.terms {
        // First matching token only, so one term can't score twice.
        let Some(token) = entry.tokens.iter().find(|token| fuzzy_match(term, token)) else {
            continue;
        };
        let tf = entry.tokens.iter().filter(|t| *t == token).count();
        let df = index
            .postings(token)
            .map(|list| list.doc_freq(Tier::Content))
            .unwrap_or(0)
            .max(1);
        score += bm25(tf, entry.length, index.avg_doc_length, df, index.total_docs);
        term_hit = true;
        note(find_token(&entry.text, token));
    }

    let text = entry.text.to_lowercase();
    let mut filter_hit = false;
    for filter in content_filters {
        if filter.field.as_str() == entry.field && text.contains(filter.value.as_str()) {
            score += FIELD_FILTER_MATCH_SCORE;
            filter_hit = true;
            note(find_substring(&entry.text, &filter.value));
        }
    }

    let mut phrase_hit = false;
    for phrase in &query.phrases {
        if text.contains(phrase.as_str()) {
            score += PHRASE_MATCH_BOOST;
            phrase_hit = true;
            note(find_substring(&entry.text, phrase));
        }
    }

    if !(term_hit || filter_hit || phrase_hit) {
        return None;
    }

    let match_type = if phrase_hit {
        MatchType::Phrase
    } else if term_hit {
        MatchType::Content
    } else {
        MatchType::Field
    };

    Some(SearchResult {
        id: entry.id.clone(),
        name: display_name(lookup, &entry.id),
        node_type: entry.node_type.clone(),
        path: entry.path.clone(),
        node_path: entry.node_path.clone(),
        field: Some(entry.field.clone()),
        snippet: Some(make_snippet(&entry.text, first_match.unwrap_or(0))),
        score: score * field_boost(&entry.field),
        tier: Tier::Content,
        match_type,
    })
}

fn display_name(lookup: &HashMap<&str, &TitleEntry>, id: &str) -> String {
    lookup
        .get(id)
        .map(|title| title.name.clone())
        .unwrap_or_else(|| id.to_string())
}
