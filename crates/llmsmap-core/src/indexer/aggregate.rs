//! Post-order rollup of token counts and freshness dates.

use super::TreeNode;

/// Aggregate a raw tree, returning the rolled-up tree.
///
/// Children are visited first, then for every node:
///
/// 1. children are sorted by ascending path (byte order)
/// 2. `token_count = own_tokens + Σ child.token_count`
/// 3. `last_updated = max(own_updated, child.last_updated…)` ignoring empty
///    dates; ISO dates compare chronologically as strings
///
/// Rollups are derived from the untouched `own_*` fields, so aggregating an
/// already-aggregated tree yields the same tree.
///
/// ```rust
/// use llmsmap_core::indexer::{aggregate, build_tree};
/// use llmsmap_core::page::PageRecord;
///
/// let page = |path: &str, tokens, date: &str| PageRecord {
///     url: String::new(),
///     path: path.into(),
///     title: path.into(),
///     description: String::new(),
///     markdown: String::new(),
///     token_count: tokens,
///     last_updated: date.into(),
/// };
///
/// let root = aggregate(build_tree(&[
///     page("/", 50, "2023-12-01"),
///     page("/docs/intro", 100, "2024-01-01"),
///     page("/docs/setup", 80, "2024-02-01"),
/// ]));
///
/// assert_eq!(root.token_count, 230);
/// let docs = root.find("/docs").unwrap();
/// assert_eq!(docs.token_count, 180);
/// assert_eq!(docs.last_updated, "2024-02-01");
/// ```
#[must_use]
pub fn aggregate(mut node: TreeNode) -> TreeNode {
    node.children = node.children.into_iter().map(aggregate).collect();
    node.children.sort_by(|a, b| a.path.cmp(&b.path));

    node.token_count = node.own_tokens + node.child_tokens();

    let latest = std::iter::once(node.own_updated.as_str())
        .chain(node.children.iter().map(|c| c.last_updated.as_str()))
        .filter(|date| !date.is_empty())
        .max()
        .unwrap_or_default()
        .to_string();
    node.last_updated = latest;

    node
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::indexer::build_tree;
    use crate::page::PageRecord;
    use proptest::prelude::*;

    fn record(path: &str, tokens: u64, date: &str) -> PageRecord {
        PageRecord {
            url: String::new(),
            path: path.to_string(),
            title: path.to_string(),
            description: String::new(),
            markdown: String::new(),
            token_count: tokens,
            last_updated: date.to_string(),
        }
    }

    fn scenario() -> TreeNode {
        aggregate(build_tree(&[
            record("/", 50, "2023-06-01"),
            record("/docs/intro", 100, "2024-01-01"),
            record("/docs/setup", 80, "2024-02-01"),
        ]))
    }

    #[test]
    fn test_scenario_rollups() {
        let root = scenario();

        assert_eq!(root.token_count, 230);
        let docs = root.find("/docs").expect("synthesized docs");
        assert_eq!(docs.token_count, 180);
        assert_eq!(docs.last_updated, "2024-02-01");
        assert_eq!(root.last_updated, "2024-02-01");
    }

    #[test]
    fn test_children_sorted_by_path() {
        let root = aggregate(build_tree(&[
            record("/zeta", 1, "2024-01-01"),
            record("/alpha", 1, "2024-01-01"),
            record("/Mid", 1, "2024-01-01"),
        ]));

        let paths: Vec<&str> = root.children.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["/Mid", "/alpha", "/zeta"]);
    }

    #[test]
    fn test_own_date_newer_than_children_wins() {
        let root = aggregate(build_tree(&[
            record("/docs", 5, "2024-05-01"),
            record("/docs/old", 5, "2023-01-01"),
        ]));

        assert_eq!(root.find("/docs").unwrap().last_updated, "2024-05-01");
    }

    #[test]
    fn test_empty_tree() {
        let root = aggregate(build_tree(&[]));
        assert_eq!(root.token_count, 0);
        assert!(root.last_updated.is_empty());
    }

    #[test]
    fn test_aggregation_is_rerunnable() {
        let once = scenario();
        let twice = aggregate(once.clone());
        assert_eq!(once, twice);
    }

    fn arb_records() -> impl Strategy<Value = Vec<PageRecord>> {
        let segment = prop::sample::select(vec!["a", "b", "c", "docs", "api"]);
        let path = prop::collection::vec(segment, 0..4)
            .prop_map(|segs| format!("/{}", segs.join("/")));
        let date = (1u32..=12, 1u32..=28).prop_map(|(m, d)| format!("2024-{m:02}-{d:02}"));
        prop::collection::vec(
            (path, 0u64..10_000, date).prop_map(|(p, t, d)| record(&p, t, &d)),
            0..24,
        )
    }

    proptest! {
        #[test]
        fn prop_rollup_and_ordering_invariants(records in arb_records()) {
            let root = aggregate(build_tree(&records));

            for node in root.iter() {
                let children_sum = node.child_tokens();
                prop_assert!(node.token_count >= children_sum);
                prop_assert_eq!(node.token_count == children_sum, node.own_tokens == 0);
                prop_assert_eq!(node.token_count, node.own_tokens + children_sum);

                for pair in node.children.windows(2) {
                    prop_assert!(pair[0].path < pair[1].path);
                }
                for child in &node.children {
                    prop_assert!(node.last_updated >= child.last_updated);
                }
            }

            let mut paths: Vec<&str> = root.iter().map(|n| n.path.as_str()).collect();
            let total = paths.len();
            paths.sort_unstable();
            paths.dedup();
            prop_assert_eq!(paths.len(), total);
        }
    }
}
