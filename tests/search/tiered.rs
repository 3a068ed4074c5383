//! Tiered execution: T1 names, then T2 tags and attributes, then T3 prose.

use std::time::Duration;

use loresift::testing::{generated_nodes, index_from_nodes, make_node, make_node_with_body};
use loresift::{search, MatchType, SearchOptions, Tier};

use super::common::{assert_ranked, ids, in_tier, options, sample_index};

// ============================================================================
// THE THREE-NODE SCENARIO
// ============================================================================

#[test]
fn test_name_query_yields_single_title_hit() {
    let results = search(&sample_index(), "aya", &SearchOptions::default());

    assert_eq!(ids(&results), vec!["aya"], "Maya must not match 'aya'");
    assert_eq!(results[0].tier, Tier::Title);
    assert_eq!(results[0].match_type, MatchType::Title);
    // Root node: 3.0 title boost × 1.5 depth boost
    assert!((results[0].score - 4.5).abs() < 1e-9);
}

#[test]
fn test_type_filter_with_prose_term() {
    let results = search(&sample_index(), "type:character dragon", &SearchOptions::default());

    assert_eq!(ids(&results), vec!["maya"]);
    assert_eq!(results[0].tier, Tier::Content);
    assert_eq!(results[0].field.as_deref(), Some("body"));
    assert_eq!(results[0].match_type, MatchType::Content);
    assert!(results[0].score > 0.0);
}

#[test]
fn test_phrase_query_reaches_prose() {
    let results = search(&sample_index(), "\"time\"", &SearchOptions::default());

    assert_eq!(ids(&results), vec!["aya"]);
    assert_eq!(results[0].tier, Tier::Content);
    assert_eq!(results[0].match_type, MatchType::Phrase);
    assert!(results[0].snippet.as_deref().unwrap().contains("time"));
}

#[test]
fn test_multi_word_name_matches_any_word() {
    let results = search(&sample_index(), "city", &SearchOptions::default());
    assert_eq!(ids(&results), vec!["dune"]);
    assert_eq!(results[0].name, "Dune City");
}

#[test]
fn test_typo_tolerance_in_names() {
    let docs = [("a.yaml".to_string(), make_node("k", "character", "Kestrel"))];
    let index = index_from_nodes("typos", &docs);

    // 7 letters: two edits allowed
    let results = search(&index, "ketsrel", &SearchOptions::default());
    assert_eq!(ids(&results), vec!["k"]);

    // 3 letters: exact only
    assert!(search(&index, "kes", &SearchOptions::default()).len() == 1, "prefix still matches");
    assert!(search(&index, "kas", &SearchOptions::default()).is_empty());
}

// ============================================================================
// TIER 2
// ============================================================================

#[test]
fn test_tag_match_is_tier_two() {
    let results = search(&sample_index(), "hero", &SearchOptions::default());

    assert_eq!(ids(&results), vec!["aya"]);
    assert_eq!(results[0].tier, Tier::Metadata);
    assert_eq!(results[0].match_type, MatchType::Tag);
    assert_eq!(results[0].name, "Aya", "display name comes from the title entry");
    assert!((results[0].score - 1.3).abs() < 1e-9);
}

#[test]
fn test_attribute_match_is_tier_two() {
    let mut node = make_node("ember", "character", "Ember");
    node.attributes = vec![("element".into(), "fire".into())];
    let index = index_from_nodes("attrs", &[("ember.yaml".into(), node)]);

    let by_value = search(&index, "fire", &SearchOptions::default());
    assert_eq!(ids(&by_value), vec!["ember"]);
    assert_eq!(by_value[0].match_type, MatchType::Attribute);
    assert!((by_value[0].score - 1.0).abs() < 1e-9);

    let by_key = search(&index, "element", &SearchOptions::default());
    assert_eq!(ids(&by_key), vec!["ember"]);
}

// ============================================================================
// DEDUPLICATION
// ============================================================================

#[test]
fn test_node_claimed_by_title_is_not_repeated() {
    // Aya matches by name, by body ("Aya surfs time.") and not by tag.
    let results = search(&sample_index(), "aya surfs", &SearchOptions::default());

    let aya: Vec<_> = results.iter().filter(|r| r.id == "aya").collect();
    assert_eq!(aya.len(), 1, "aya listed once");
    assert_eq!(aya[0].tier, Tier::Title);
}

#[test]
fn test_node_claimed_by_tag_is_not_repeated_in_prose() {
    let mut node = make_node_with_body("rook", "character", "Rook", "A mercenary for hire.");
    node.tags = vec!["mercenary".into()];
    let index = index_from_nodes("dedup", &[("rook.yaml".into(), node)]);

    let results = search(&index, "mercenary", &SearchOptions::default());
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].tier, Tier::Metadata);
}

#[test]
fn test_prose_fields_of_one_node_listed_separately() {
    let mut node = make_node_with_body("vale", "location", "Vale", "Rivers of glass.");
    node.fields.insert("summary".into(), "Glass valley.".into());
    let index = index_from_nodes("fields", &[("vale.yaml".into(), node)]);

    let results = search(&index, "glass", &SearchOptions::default());
    assert_eq!(results.len(), 2);
    let mut fields: Vec<_> = results.iter().filter_map(|r| r.field.as_deref()).collect();
    fields.sort_unstable();
    assert_eq!(fields, vec!["body", "summary"]);
}

// ============================================================================
// SHORT-CIRCUIT AND LIMITS
// ============================================================================

#[test]
fn test_title_hits_filling_the_page_skip_prose() {
    // Every generated node has "Character" in its name and its body.
    let index = index_from_nodes("many", &generated_nodes(30));

    let results = search(&index, "character", &options(10));
    assert_eq!(results.len(), 10);
    assert!(in_tier(&results, Tier::Content).is_empty());
    assert!(results.iter().all(|r| r.tier == Tier::Title));
}

#[test]
fn test_limit_is_respected_across_tiers() {
    let index = index_from_nodes("many", &generated_nodes(40));

    for limit in [1, 5, 25] {
        let results = search(&index, "story", &options(limit));
        assert_eq!(results.len(), limit);
        assert_ranked(&results);
    }
}

#[test]
fn test_degenerate_inputs_return_nothing() {
    let index = sample_index();
    assert!(search(&index, "", &SearchOptions::default()).is_empty());
    assert!(search(&index, "   ", &SearchOptions::default()).is_empty());
    assert!(search(&index, "-aya", &SearchOptions::default()).is_empty());
    assert!(search(&index, "aya", &options(0)).is_empty());
    assert!(search(&index, "zzzz", &SearchOptions::default()).is_empty());
}

#[test]
fn test_spent_budget_returns_partial_results() {
    let index = sample_index();
    let opts = SearchOptions::default().with_timeout(Duration::ZERO);

    // Tier 1 still runs
    assert_eq!(ids(&search(&index, "aya", &opts)), vec!["aya"]);
    // Tier 3 does not
    assert!(in_tier(&search(&index, "dragons", &opts), Tier::Content).is_empty());
}

#[test]
fn test_search_is_deterministic() {
    let index = index_from_nodes("many", &generated_nodes(50));
    let first = search(&index, "character chapter", &options(20));
    for _ in 0..5 {
        assert_eq!(search(&index, "character chapter", &options(20)), first);
    }
}
