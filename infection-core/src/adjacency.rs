//! Undirected view over a directed user graph.
//!
//! Connectivity and ranking treat every edge as bi-directional, so both
//! operations start from the same symmetrized adjacency. Identifiers are
//! borrowed from the source graph rather than cloned.

use std::collections::{BTreeMap, BTreeSet};

use crate::UserGraph;

/// Deduplicated, symmetric neighbour sets derived from a [`UserGraph`].
///
/// For every edge `user -> other` both `other ∈ adj[user]` and
/// `user ∈ adj[other]` hold. Self-loops are discarded, although the user still
/// appears as a key. Keys and neighbour sets iterate in identifier order.
///
/// # Examples
/// ```
/// use infection_core::{Adjacency, UserGraph};
///
/// let graph = UserGraph::from([
///     ("A".to_owned(), vec!["B".to_owned(), "B".to_owned()]),
///     ("C".to_owned(), vec!["C".to_owned()]),
/// ]);
/// let adjacency = Adjacency::from_graph(&graph);
/// assert_eq!(adjacency.len(), 3);
/// assert_eq!(adjacency.neighbours("B").map(|set| set.len()), Some(1));
/// assert_eq!(adjacency.neighbours("C").map(|set| set.is_empty()), Some(true));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Adjacency<'a> {
    neighbours: BTreeMap<&'a str, BTreeSet<&'a str>>,
}

impl<'a> Adjacency<'a> {
    /// Symmetrizes `graph`, registering every key and every edge target.
    #[must_use]
    pub fn from_graph(graph: &'a UserGraph) -> Self {
        let mut adjacency = Self::default();
        for (user, edges) in graph {
            adjacency.insert_user(user);
            for other in edges {
                adjacency.link(user, other);
            }
        }
        adjacency
    }

    /// Symmetrizes a flat list of directed `(from, to)` pairs.
    ///
    /// # Examples
    /// ```
    /// use infection_core::Adjacency;
    ///
    /// let adjacency = Adjacency::from_edges([("A", "B"), ("B", "A"), ("C", "A")]);
    /// let neighbours: Vec<_> = adjacency
    ///     .neighbours("A")
    ///     .map(|set| set.iter().copied().collect())
    ///     .unwrap_or_default();
    /// assert_eq!(neighbours, ["B", "C"]);
    /// ```
    #[must_use]
    pub fn from_edges(edges: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut adjacency = Self::default();
        for (user, other) in edges {
            adjacency.link(user, other);
        }
        adjacency
    }

    fn insert_user(&mut self, user: &'a str) {
        self.neighbours.entry(user).or_default();
    }

    fn link(&mut self, user: &'a str, other: &'a str) {
        self.insert_user(user);
        self.insert_user(other);
        if user == other {
            return;
        }
        self.neighbours.entry(user).or_default().insert(other);
        self.neighbours.entry(other).or_default().insert(user);
    }

    /// Returns the neighbour set of `user`, or `None` when the user never
    /// appeared in the source graph.
    #[must_use]
    pub fn neighbours(&self, user: &str) -> Option<&BTreeSet<&'a str>> {
        self.neighbours.get(user)
    }

    /// Resolves `user` to the identifier borrowed from the source graph.
    #[must_use]
    pub fn resolve(&self, user: &str) -> Option<&'a str> {
        self.neighbours.get_key_value(user).map(|(key, _)| *key)
    }

    /// Returns whether `user` appears in the adjacency.
    #[must_use]
    pub fn contains(&self, user: &str) -> bool {
        self.neighbours.contains_key(user)
    }

    /// Iterates users in identifier order.
    pub fn users(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.neighbours.keys().copied()
    }

    /// Iterates `(user, neighbours)` entries in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &BTreeSet<&'a str>)> + '_ {
        self.neighbours.iter().map(|(user, set)| (*user, set))
    }

    /// Number of distinct users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.neighbours.len()
    }

    /// Returns whether the adjacency has no users.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.neighbours.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use infection_test_support::fixtures::{cycle_graph, graph_from};
    use proptest::prelude::*;
    use rstest::rstest;

    fn sorted_neighbours<'a>(adjacency: &Adjacency<'a>, user: &str) -> Vec<&'a str> {
        adjacency
            .neighbours(user)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    #[rstest]
    fn cycle_gives_every_user_two_neighbours() {
        let graph = cycle_graph();
        let adjacency = Adjacency::from_graph(&graph);
        assert_eq!(adjacency.len(), 3);
        for (user, neighbours) in adjacency.iter() {
            assert_eq!(neighbours.len(), 2);
            assert!(!neighbours.contains(user));
        }
    }

    #[rstest]
    #[case::duplicates(&[("A", "B"), ("A", "B"), ("A", "B")], "A", &["B"])]
    #[case::reverse_edge(&[("A", "B"), ("B", "A")], "B", &["A"])]
    #[case::self_loop(&[("A", "A"), ("A", "B")], "A", &["B"])]
    #[case::incoming_only(&[("A", "C"), ("B", "C")], "C", &["A", "B"])]
    fn neighbour_sets_are_deduplicated_and_loop_free(
        #[case] edges: &[(&str, &str)],
        #[case] user: &str,
        #[case] expected: &[&str],
    ) {
        let graph = graph_from(&[], edges);
        let adjacency = Adjacency::from_graph(&graph);
        assert_eq!(sorted_neighbours(&adjacency, user), expected);
    }

    #[test]
    fn targets_without_keys_are_registered() {
        let graph = graph_from(&["A"], &[("A", "Z")]);
        let adjacency = Adjacency::from_graph(&graph);
        assert!(adjacency.contains("Z"));
        assert_eq!(adjacency.resolve("Z"), Some("Z"));
        assert_eq!(adjacency.resolve("missing"), None);
    }

    #[test]
    fn isolated_keys_have_empty_sets() {
        let graph = graph_from(&["A", "B"], &[("B", "B")]);
        let adjacency = Adjacency::from_graph(&graph);
        assert_eq!(adjacency.users().collect::<Vec<_>>(), ["A", "B"]);
        assert!(sorted_neighbours(&adjacency, "A").is_empty());
        assert!(sorted_neighbours(&adjacency, "B").is_empty());
    }

    #[test]
    fn empty_graph_gives_empty_adjacency() {
        let graph = UserGraph::new();
        assert!(Adjacency::from_graph(&graph).is_empty());
    }

    fn edge_list() -> impl Strategy<Value = Vec<(u8, u8)>> {
        prop::collection::vec((0_u8..12, 0_u8..12), 0..48)
    }

    proptest! {
        #[test]
        fn symmetrized_relation_is_symmetric_and_irreflexive(edges in edge_list()) {
            let names: Vec<(String, String)> = edges
                .iter()
                .map(|(from, to)| (format!("u{from}"), format!("u{to}")))
                .collect();
            let adjacency =
                Adjacency::from_edges(names.iter().map(|(from, to)| (from.as_str(), to.as_str())));

            for (user, neighbours) in adjacency.iter() {
                prop_assert!(!neighbours.contains(user));
                for other in neighbours {
                    let back = adjacency.neighbours(other);
                    prop_assert!(back.is_some_and(|set| set.contains(user)));
                }
            }
            for (from, to) in &names {
                prop_assert!(adjacency.contains(from));
                prop_assert!(adjacency.contains(to));
            }
        }
    }
}
