//! Type filters, field filters and exclusions.

use loresift::testing::{index_from_nodes, make_node, make_node_with_body};
use loresift::{search, MatchType, SearchIndex, SearchOptions, Tier};

use super::common::{ids, sample_index};

fn with_attributes() -> SearchIndex {
    let mut ember = make_node("ember", "character", "Ember");
    ember.attributes = vec![("element".into(), "fire".into()), ("rank".into(), "captain".into())];
    let mut frost = make_node_with_body("frost", "character", "Frost", "Cold hands.");
    frost.fields.insert("summary".into(), "A quiet captain.".into());
    index_from_nodes(
        "attrs",
        &[("ember.yaml".into(), ember), ("frost.yaml".into(), frost)],
    )
}

// ============================================================================
// TYPE FILTERS
// ============================================================================

#[test]
fn test_type_filter_alone_browses_that_type() {
    let results = search(&sample_index(), "type:character", &SearchOptions::default());

    assert_eq!(ids(&results), vec!["aya", "maya"]);
    for r in &results {
        assert_eq!(r.match_type, MatchType::TypeFilter);
        assert_eq!(r.tier, Tier::Title);
        // browse score 1.0 × root depth boost 1.5
        assert!((r.score - 1.5).abs() < 1e-9);
    }
}

#[test]
fn test_type_filter_is_case_insensitive() {
    let results = search(&sample_index(), "TYPE:Location", &SearchOptions::default());
    assert_eq!(ids(&results), vec!["dune"]);
}

#[test]
fn test_type_exclusion_applies_to_every_tier() {
    let index = sample_index();
    assert!(search(&index, "dune -type:location", &SearchOptions::default()).is_empty());
    assert!(search(&index, "hero -type:character", &SearchOptions::default()).is_empty());
    assert!(search(&index, "dragons -type:character", &SearchOptions::default()).is_empty());
}

#[test]
fn test_type_filter_restricts_term_matches() {
    let index = sample_index();
    assert!(search(&index, "dune type:character", &SearchOptions::default()).is_empty());
    assert_eq!(
        ids(&search(&index, "dune type:location", &SearchOptions::default())),
        vec!["dune"]
    );
}

// ============================================================================
// FIELD FILTERS
// ============================================================================

#[test]
fn test_body_filter_matches_by_substring() {
    let results = search(&sample_index(), "body:dragons", &SearchOptions::default());

    assert_eq!(ids(&results), vec!["maya"]);
    assert_eq!(results[0].tier, Tier::Content);
    assert_eq!(results[0].match_type, MatchType::Field);
    assert!((results[0].score - 2.0).abs() < 1e-9);
}

#[test]
fn test_body_filter_substring_inside_words() {
    // "rag" is no token, but it is a substring of "dragons"
    let results = search(&sample_index(), "body:rag", &SearchOptions::default());
    assert_eq!(ids(&results), vec!["maya"]);
}

#[test]
fn test_summary_filter_ignores_body() {
    let index = with_attributes();
    assert!(search(&index, "summary:cold", &SearchOptions::default()).is_empty());

    let results = search(&index, "summary:captain", &SearchOptions::default());
    assert_eq!(ids(&results), vec!["frost"]);
    assert_eq!(results[0].field.as_deref(), Some("summary"));
}

#[test]
fn test_tags_filter_matches_in_tier_two() {
    let results = search(&sample_index(), "tags:her", &SearchOptions::default());

    assert_eq!(ids(&results), vec!["aya"]);
    assert_eq!(results[0].tier, Tier::Metadata);
    assert_eq!(results[0].match_type, MatchType::Tag);
    assert!((results[0].score - 2.0).abs() < 1e-9);
}

#[test]
fn test_attributes_filter_matches_key_and_value() {
    let index = with_attributes();

    let results = search(&index, "attributes:element", &SearchOptions::default());
    assert_eq!(ids(&results), vec!["ember"]);
    assert_eq!(results[0].match_type, MatchType::Attribute);

    let results = search(&index, "attributes:rank captain", &SearchOptions::default());
    assert_eq!(ids(&results), vec!["ember"], "filter on the key, free term on the value");
}

#[test]
fn test_field_filter_disables_type_browsing() {
    let results = search(&sample_index(), "type:character body:dragons", &SearchOptions::default());
    assert_eq!(ids(&results), vec!["maya"]);
    assert_eq!(results[0].tier, Tier::Content);
}

// ============================================================================
// EXCLUSIONS
// ============================================================================

#[test]
fn test_excluded_word_in_prose_drops_the_entry() {
    let index = sample_index();
    assert_eq!(ids(&search(&index, "surfs", &SearchOptions::default())), vec!["aya"]);
    assert!(search(&index, "surfs -time", &SearchOptions::default()).is_empty());
}

#[test]
fn test_excluded_word_in_name_drops_title_hit() {
    let index = index_from_nodes(
        "names",
        &[
            ("a.yaml".into(), make_node("a", "location", "Black Tower")),
            ("b.yaml".into(), make_node("b", "location", "Black Gate")),
        ],
    );

    let results = search(&index, "black -tower", &SearchOptions::default());
    assert_eq!(ids(&results), vec!["b"]);
}

#[test]
fn test_excluded_tag_drops_metadata_hit() {
    let mut a = make_node("a", "character", "Ash");
    a.tags = vec!["rogue".into(), "exile".into()];
    let mut b = make_node("b", "character", "Birch");
    b.tags = vec!["rogue".into()];
    let index = index_from_nodes("tags", &[("a.yaml".into(), a), ("b.yaml".into(), b)]);

    let results = search(&index, "rogue -exile", &SearchOptions::default());
    assert_eq!(ids(&results), vec!["b"]);
}
