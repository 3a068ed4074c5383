//! Properties of built indexes and of search over them.

use std::collections::HashSet;

use proptest::prelude::*;

use loresift::build::Node;
use loresift::testing::{index_from_nodes, make_node_with_body};
use loresift::{search, SearchOptions, Tier};

use super::common::{assert_index_well_formed, assert_ranked};

fn word() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "aya", "maya", "dune", "city", "dragon", "dragons", "time", "surf", "ice", "queen",
        "fire", "storm", "vale", "glass", "hero", "exile",
    ])
    .prop_map(str::to_string)
}

fn sentence() -> impl Strategy<Value = String> {
    prop::collection::vec(word(), 0..8).prop_map(|w| w.join(" "))
}

fn node(i: usize) -> impl Strategy<Value = Node> {
    (
        sentence(),
        sentence(),
        prop::collection::vec(word(), 0..3),
        prop::sample::select(vec!["character", "location", "item"]),
        prop::collection::vec((sentence(), sentence()), 0..3),
    )
        .prop_map(move |(name, body, tags, ty, kids)| {
            let mut node = make_node_with_body(&format!("n{i}"), ty, &name, &body);
            node.tags = tags;
            node.children = kids
                .into_iter()
                .enumerate()
                .map(|(k, (child_name, child_body))| {
                    make_node_with_body(&format!("n{i}c{k}"), ty, &child_name, &child_body)
                })
                .collect();
            node
        })
}

fn corpus() -> impl Strategy<Value = Vec<(String, Node)>> {
    (1usize..6).prop_flat_map(|n| {
        (0..n)
            .map(|i| node(i).prop_map(move |node| (format!("doc{i}.yaml"), node)))
            .collect::<Vec<_>>()
    })
}

fn query() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(word(), 0..3),
        prop::option::of(word()),
        prop::option::of(prop::sample::select(vec![
            "type:character",
            "-type:item",
            "body:dra",
            "tags:he",
        ])),
        prop::option::of(word()),
    )
        .prop_map(|(terms, phrase, filter, excluded)| {
            let mut parts = terms;
            if let Some(p) = phrase {
                parts.push(format!("\"{p}\""));
            }
            if let Some(f) = filter {
                parts.push(f.to_string());
            }
            if let Some(x) = excluded {
                parts.push(format!("-{x}"));
            }
            parts.join(" ")
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Coverage, posting uniqueness and corpus stats hold for any corpus.
    #[test]
    fn prop_built_index_well_formed(docs in corpus()) {
        let index = index_from_nodes("prop", &docs);
        assert_index_well_formed(&index);
        prop_assert_eq!(index.total_docs, index.titles.len().max(1));
    }

    /// Results are ranked, bounded, deduplicated and resolvable.
    #[test]
    fn prop_search_results_well_formed(docs in corpus(), q in query(), limit in 1usize..20) {
        let index = index_from_nodes("prop", &docs);
        let results = search(&index, &q, &SearchOptions::default().with_limit(limit));

        prop_assert!(results.len() <= limit);
        assert_ranked(&results);

        let titles: HashSet<&str> = index.titles.iter().map(|t| t.id.as_str()).collect();
        let mut owned = HashSet::new();
        let mut prose = HashSet::new();
        for r in &results {
            prop_assert!(titles.contains(r.id.as_str()));
            prop_assert!(r.score > 0.0);
            match r.tier {
                Tier::Title | Tier::Metadata => prop_assert!(owned.insert(r.id.clone())),
                Tier::Content => {
                    prop_assert!(r.snippet.is_some());
                    prop_assert!(prose.insert((r.id.clone(), r.field.clone())));
                }
            }
        }
        for (id, _) in &prose {
            prop_assert!(!owned.contains(id), "{} listed by an earlier tier and by prose", id);
        }
    }

    /// Same index, same query, same answer.
    #[test]
    fn prop_search_deterministic(docs in corpus(), q in query()) {
        let index = index_from_nodes("prop", &docs);
        let opts = SearchOptions::default();
        prop_assert_eq!(search(&index, &q, &opts), search(&index, &q, &opts));
    }

    /// Excluded types never come back.
    #[test]
    fn prop_type_exclusion_holds(docs in corpus(), term in word()) {
        let index = index_from_nodes("prop", &docs);
        let results = search(&index, &format!("{term} -type:item"), &SearchOptions::default());
        prop_assert!(results.iter().all(|r| r.node_type != "item"));
    }
}
