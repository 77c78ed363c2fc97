//! Limited-infection selection assembled from whole connected components.
//!
//! Users are explored in ascending `(score, identifier)` order. Each newly
//! reached component is traced against a shared claimed set; an exact match
//! (either a single component or everything claimed so far) ends the search.
//! The first component larger than the request stops exploration outright, so
//! a smaller exact match later in the order may be missed. That is accepted
//! best-effort behaviour. Whatever was found is then combined greedily,
//! newest component first, without exceeding the request.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};
use std::fmt;

use tracing::{Span, debug, field, instrument};

use crate::{
    UserGraph,
    adjacency::Adjacency,
    rank::{RankConfig, rank_adjacency},
    trace::trace_component,
};

/// How a [`Selection`] was assembled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// A single component matched the requested count exactly.
    ExactComponent,
    /// All components claimed so far summed to the requested count.
    ExactUnion,
    /// Components were combined greedily; the total may fall short.
    Fallback,
}

impl SelectionOutcome {
    /// Stable label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExactComponent => "exact_component",
            Self::ExactUnion => "exact_union",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for SelectionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Users chosen by [`select_limited`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection<'a> {
    users: Vec<&'a str>,
    outcome: SelectionOutcome,
}

impl<'a> Selection<'a> {
    /// Selected users, never more than requested and free of duplicates.
    #[must_use]
    pub fn users(&self) -> &[&'a str] {
        &self.users
    }

    /// Consumes the selection, returning the selected users.
    #[must_use]
    pub fn into_users(self) -> Vec<&'a str> {
        self.users
    }

    /// How the selection was assembled.
    #[must_use]
    pub const fn outcome(&self) -> SelectionOutcome {
        self.outcome
    }

    /// Number of selected users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns whether nothing was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Queue entry ordered by score, then identifier.
#[derive(Clone, Copy, Debug)]
struct Candidate<'a> {
    score: f64,
    user: &'a str,
}

impl Ord for Candidate<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| self.user.cmp(other.user))
    }
}

impl PartialOrd for Candidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate<'_> {}

/// Chooses up to `count` users of `graph` made of whole connected components.
///
/// Returns exactly `count` users when the exploration finds a single
/// component or a run of components of that total size, otherwise the
/// largest greedy combination of discovered components that fits.
///
/// # Examples
/// ```
/// use infection_core::{RankConfig, SelectionOutcome, UserGraph, select_limited};
///
/// let graph = UserGraph::from([
///     ("A".to_owned(), vec!["B".to_owned()]),
///     ("B".to_owned(), vec!["C".to_owned()]),
///     ("C".to_owned(), vec!["A".to_owned()]),
///     ("D".to_owned(), vec![]),
///     ("E".to_owned(), vec![]),
/// ]);
/// let selection = select_limited(&graph, 3, &RankConfig::default());
/// let mut users = selection.users().to_vec();
/// users.sort_unstable();
/// assert_eq!(users, ["A", "B", "C"]);
///
/// let pair = select_limited(&graph, 2, &RankConfig::default());
/// assert_eq!(pair.len(), 2);
/// assert_eq!(pair.outcome(), SelectionOutcome::ExactUnion);
/// ```
#[instrument(
    name = "core.select",
    skip(graph, config),
    fields(users = graph.len(), selected = field::Empty, outcome = field::Empty),
)]
#[must_use]
pub fn select_limited<'a>(
    graph: &'a UserGraph,
    count: usize,
    config: &RankConfig,
) -> Selection<'a> {
    let adjacency = Adjacency::from_graph(graph);
    let ranks = rank_adjacency(&adjacency, config);

    let mut queue: BinaryHeap<Reverse<Candidate<'a>>> = ranks
        .iter()
        .map(|(user, score)| Reverse(Candidate { score, user }))
        .collect();

    let mut claimed: HashSet<&'a str> = HashSet::new();
    let mut claimed_order: Vec<&'a str> = Vec::new();
    // Discovery order; the fallback walks it newest first.
    let mut components: Vec<Vec<&'a str>> = Vec::new();

    let selection = loop {
        let Some(Reverse(candidate)) = queue.pop() else {
            break None;
        };
        let component = trace_component(&adjacency, candidate.user, &mut claimed);
        let size = component.len();
        if size == count {
            break Some(Selection {
                users: component,
                outcome: SelectionOutcome::ExactComponent,
            });
        }
        if size > count {
            debug!(
                user = candidate.user,
                size, "component exceeds request; stopping exploration"
            );
            break None;
        }
        if size == 0 {
            continue;
        }

        claimed_order.extend_from_slice(&component);
        components.push(component);
        if claimed_order.len() == count {
            break Some(Selection {
                users: std::mem::take(&mut claimed_order),
                outcome: SelectionOutcome::ExactUnion,
            });
        }
    };

    let selection = selection.unwrap_or_else(|| combine_greedily(&components, count));
    let span = Span::current();
    span.record("selected", selection.len());
    span.record("outcome", field::display(selection.outcome()));
    selection
}

/// Combines `components` (in discovery order) newest first, skipping any that
/// would overshoot `count`.
fn combine_greedily<'a>(components: &[Vec<&'a str>], count: usize) -> Selection<'a> {
    let mut users = Vec::new();
    for component in components.iter().rev() {
        let total = users.len() + component.len();
        if total > count {
            continue;
        }
        users.extend_from_slice(component);
        if total == count {
            break;
        }
    }
    Selection {
        users,
        outcome: SelectionOutcome::Fallback,
    }
}
