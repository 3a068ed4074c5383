//! BM25, boost and ranking properties.

use proptest::prelude::*;

use loresift::scoring::ranking::compare_results;
use loresift::scoring::{depth_boost, field_boost, DEEP_NODE_BOOST, ROOT_NODE_BOOST};
use loresift::{bm25, MatchType, SearchResult, Tier};

fn tier() -> impl Strategy<Value = Tier> {
    prop::sample::select(vec![Tier::Title, Tier::Metadata, Tier::Content])
}

fn result() -> impl Strategy<Value = SearchResult> {
    ("[a-d]{1,2}", 0u32..20, tier()).prop_map(|(id, score, tier)| SearchResult {
        id,
        name: String::new(),
        node_type: "node".into(),
        path: String::new(),
        node_path: Vec::new(),
        field: None,
        snippet: None,
        score: f64::from(score) / 4.0,
        tier,
        match_type: MatchType::Title,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// More occurrences never lower the score.
    #[test]
    fn prop_bm25_monotone_in_tf(
        tf in 1usize..50,
        len in 1usize..500,
        avg in 1.0f64..300.0,
        total in 1usize..1000,
        df_seed in 0usize..1000,
    ) {
        let df = 1 + df_seed % total;
        prop_assert!(bm25(tf + 1, len, avg, df, total) >= bm25(tf, len, avg, df, total));
    }

    /// Commoner terms never score higher.
    #[test]
    fn prop_bm25_antitone_in_df(
        tf in 1usize..50,
        len in 1usize..500,
        avg in 1.0f64..300.0,
        total in 2usize..1000,
        df_seed in 0usize..1000,
    ) {
        let df = 1 + df_seed % (total - 1);
        prop_assert!(bm25(tf, len, avg, df + 1, total) <= bm25(tf, len, avg, df, total));
    }

    /// Scores are finite and non-negative, including the degenerate corners.
    #[test]
    fn prop_bm25_finite(
        tf in 0usize..50,
        len in 0usize..500,
        avg in -10.0f64..300.0,
        df_seed in 0usize..100,
        total in 0usize..100,
    ) {
        let df = df_seed % (total + 1);
        let score = bm25(tf, len, avg, df, total);
        prop_assert!(score.is_finite());
        prop_assert!(score >= 0.0);
    }

    /// Deeper nodes never get a larger boost than shallower ones.
    #[test]
    fn prop_depth_boost_non_increasing(depth in 0usize..10) {
        let path = |n: usize| vec!["x".to_string(); n];
        let here = depth_boost(&path(depth));
        prop_assert!(depth_boost(&path(depth + 1)) <= here);
        prop_assert!((DEEP_NODE_BOOST..=ROOT_NODE_BOOST).contains(&here));
    }

    /// Ranking is a total order: antisymmetric and consistent with sorting.
    #[test]
    fn prop_compare_results_total(a in result(), b in result()) {
        prop_assert_eq!(compare_results(&a, &b), compare_results(&b, &a).reverse());
    }

    #[test]
    fn prop_sorted_results_descend(mut results in prop::collection::vec(result(), 0..30)) {
        results.sort_by(compare_results);
        for pair in results.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
            if pair[0].score == pair[1].score {
                prop_assert!(pair[0].tier <= pair[1].tier);
            }
        }
    }
}

#[test]
fn test_bm25_undefined_idf_is_zero() {
    assert_eq!(bm25(3, 10, 10.0, 0, 10), 0.0);
    assert_eq!(bm25(3, 10, 10.0, 1, 0), 0.0);
}

#[test]
fn test_field_boosts() {
    assert!((field_boost("summary") - 1.2).abs() < 1e-12);
    assert!((field_boost("body") - 1.0).abs() < 1e-12);
    assert!((field_boost("anything") - 1.0).abs() < 1e-12);
}
