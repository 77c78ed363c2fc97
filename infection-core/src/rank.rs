//! Damped influence ranking over the symmetrized graph.
//!
//! Scores approximate a random-walk stationary distribution. Each sweep
//! updates scores in place, so users later in identifier order already see
//! their neighbours' refreshed values within the same sweep. A sweep counts as
//! converged only when every user's new score stays within the tolerance of
//! the score it held when that sweep started. Results are heuristic priorities
//! for selection, not an exact PageRank: nothing is normalised afterwards.

use std::collections::{BTreeMap, HashMap};

use tracing::{Span, debug, field, instrument, warn};

use crate::{
    UserGraph,
    adjacency::Adjacency,
    error::{InfectionError, Result},
};

/// Default damping factor applied to neighbour contributions.
pub(crate) const DEFAULT_DAMPING: f64 = 0.85;
/// Default convergence band for per-user score changes.
pub(crate) const DEFAULT_TOLERANCE: f64 = 0.0001;
/// Default upper bound on sweeps before giving up on convergence.
pub(crate) const DEFAULT_MAX_SWEEPS: usize = 10_000;

/// Parameters controlling [`rank`] and [`rank_adjacency`].
///
/// # Examples
/// ```
/// use infection_core::RankConfig;
///
/// let config = RankConfig::default();
/// assert_eq!(config.damping(), 0.85);
/// assert_eq!(config.tolerance(), 0.0001);
///
/// let custom = RankConfig::new(0.5, 1e-6, 200).expect("parameters are valid");
/// assert_eq!(custom.max_sweeps(), 200);
/// assert!(RankConfig::new(1.0, 1e-6, 200).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RankConfig {
    damping: f64,
    tolerance: f64,
    max_sweeps: usize,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            damping: DEFAULT_DAMPING,
            tolerance: DEFAULT_TOLERANCE,
            max_sweeps: DEFAULT_MAX_SWEEPS,
        }
    }
}

impl RankConfig {
    /// Validates and builds a configuration.
    ///
    /// # Errors
    /// Returns [`InfectionError::InvalidDamping`] unless `0 <= damping < 1`,
    /// [`InfectionError::InvalidTolerance`] unless `tolerance` is finite and
    /// positive, and [`InfectionError::InvalidMaxSweeps`] when `max_sweeps` is
    /// zero.
    pub fn new(damping: f64, tolerance: f64, max_sweeps: usize) -> Result<Self> {
        if !(0.0..1.0).contains(&damping) {
            return Err(InfectionError::InvalidDamping { got: damping });
        }
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(InfectionError::InvalidTolerance { got: tolerance });
        }
        if max_sweeps == 0 {
            return Err(InfectionError::InvalidMaxSweeps { got: max_sweeps });
        }
        Ok(Self {
            damping,
            tolerance,
            max_sweeps,
        })
    }

    /// Fraction of a score propagated through edges.
    #[must_use]
    pub const fn damping(&self) -> f64 {
        self.damping
    }

    /// Maximum per-user change tolerated in a converged sweep.
    #[must_use]
    pub const fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Sweep bound after which the latest scores are returned unconverged.
    #[must_use]
    pub const fn max_sweeps(&self) -> usize {
        self.max_sweeps
    }
}

/// Per-user scores produced by [`rank`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ranks<'a> {
    scores: BTreeMap<&'a str, f64>,
    sweeps: usize,
    converged: bool,
}

impl<'a> Ranks<'a> {
    /// Score for `user`, if ranked.
    #[must_use]
    pub fn get(&self, user: &str) -> Option<f64> {
        self.scores.get(user).copied()
    }

    /// Iterates `(user, score)` in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, f64)> + '_ {
        self.scores.iter().map(|(user, score)| (*user, *score))
    }

    /// Number of ranked users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Returns whether no users were ranked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Number of sweeps performed.
    #[must_use]
    pub const fn sweeps(&self) -> usize {
        self.sweeps
    }

    /// Whether the final sweep met the tolerance for every user.
    ///
    /// An empty graph is trivially converged.
    #[must_use]
    pub const fn converged(&self) -> bool {
        self.converged
    }
}

/// Ranks every user referenced by `graph`.
///
/// # Examples
/// ```
/// use infection_core::{RankConfig, UserGraph, rank};
///
/// let graph = UserGraph::from([
///     ("A".to_owned(), vec!["B".to_owned()]),
///     ("B".to_owned(), vec!["C".to_owned()]),
///     ("C".to_owned(), vec!["A".to_owned()]),
/// ]);
/// let ranks = rank(&graph, &RankConfig::default());
/// assert!(ranks.converged());
/// let a = ranks.get("A").unwrap_or_default();
/// let c = ranks.get("C").unwrap_or_default();
/// assert!((a - c).abs() < 1e-3);
/// ```
#[must_use]
pub fn rank<'a>(graph: &'a UserGraph, config: &RankConfig) -> Ranks<'a> {
    rank_adjacency(&Adjacency::from_graph(graph), config)
}

/// Ranks every user of an already symmetrized `adjacency`.
#[instrument(
    name = "core.rank",
    skip_all,
    fields(users = adjacency.len(), sweeps = field::Empty, converged = field::Empty),
)]
#[must_use]
pub fn rank_adjacency<'a>(adjacency: &Adjacency<'a>, config: &RankConfig) -> Ranks<'a> {
    let users: Vec<&'a str> = adjacency.users().collect();
    if users.is_empty() {
        return Ranks {
            converged: true,
            ..Ranks::default()
        };
    }

    let linked = neighbour_positions(adjacency, &users);
    let population = users.len() as f64;
    let sweep = Sweep {
        baseline: (1.0 - config.damping) / population,
        damping: config.damping,
        tolerance: config.tolerance,
        population,
    };

    let mut scores = vec![1.0 / population; users.len()];
    let mut sweeps = 0;
    let mut converged = false;
    while !converged && sweeps < config.max_sweeps {
        sweeps += 1;
        converged = sweep.apply(&mut scores, &linked);
    }

    let span = Span::current();
    span.record("sweeps", sweeps);
    span.record("converged", converged);
    if converged {
        debug!(sweeps, "rank converged");
    } else {
        warn!(
            sweeps,
            tolerance = config.tolerance,
            "rank did not converge; using latest scores"
        );
    }

    Ranks {
        scores: users.into_iter().zip(scores).collect(),
        sweeps,
        converged,
    }
}

fn neighbour_positions(adjacency: &Adjacency<'_>, users: &[&str]) -> Vec<Vec<usize>> {
    let position: HashMap<&str, usize> = users
        .iter()
        .enumerate()
        .map(|(index, user)| (*user, index))
        .collect();
    users
        .iter()
        .map(|user| {
            adjacency
                .neighbours(user)
                .into_iter()
                .flatten()
                .filter_map(|other| position.get(other).copied())
                .collect()
        })
        .collect()
}

struct Sweep {
    baseline: f64,
    damping: f64,
    tolerance: f64,
    population: f64,
}

impl Sweep {
    /// Updates `scores` in place and reports whether every change stayed
    /// within the tolerance.
    fn apply(&self, scores: &mut [f64], linked: &[Vec<usize>]) -> bool {
        let mut settled = true;
        for (index, neighbours) in linked.iter().enumerate() {
            let total: f64 = neighbours
                .iter()
                .filter_map(|&other| scores.get(other))
                .map(|score| score / self.population)
                .sum();
            let next = self.baseline + self.damping * total;
            if let Some(score) = scores.get_mut(index) {
                settled &= (next - *score).abs() <= self.tolerance;
                *score = next;
            }
        }
        settled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use infection_test_support::{
        fixtures::{cycle_graph, graph_from},
        tracing::RecordingLayer,
    };
    use rstest::rstest;
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;

    fn score(ranks: &Ranks<'_>, user: &str) -> f64 {
        ranks
            .get(user)
            .unwrap_or_else(|| panic!("user {user} must be ranked"))
    }

    #[rstest]
    fn cycle_converges_to_equal_scores() {
        let graph = cycle_graph();
        let ranks = rank(&graph, &RankConfig::default());
        assert!(ranks.converged());
        assert_eq!(ranks.len(), 3);

        // s = (1 - d)/3 + d * 2s/3
        let expected = 0.05 / (1.0 - 0.85 * 2.0 / 3.0);
        for (user, value) in ranks.iter() {
            assert!(
                (value - expected).abs() < 1e-3,
                "{user} scored {value}, expected ~{expected}"
            );
        }
    }

    #[test]
    fn empty_graph_has_no_scores() {
        let graph = UserGraph::new();
        let ranks = rank(&graph, &RankConfig::default());
        assert!(ranks.is_empty());
        assert!(ranks.converged());
        assert_eq!(ranks.sweeps(), 0);
    }

    #[test]
    fn isolated_users_keep_only_the_baseline() {
        let graph = graph_from(&["A", "B", "C", "D"], &[("A", "B")]);
        let ranks = rank(&graph, &RankConfig::default());
        let baseline = 0.15 / 4.0;
        assert!((score(&ranks, "C") - baseline).abs() < 1e-12);
        assert!((score(&ranks, "D") - baseline).abs() < 1e-12);
        assert!(score(&ranks, "A") > score(&ranks, "C"));
    }

    #[test]
    fn hub_outranks_its_leaves() {
        let graph = graph_from(
            &["hub", "l1", "l2", "l3", "l4"],
            &[("hub", "l1"), ("hub", "l2"), ("l3", "hub"), ("l4", "hub")],
        );
        let ranks = rank(&graph, &RankConfig::default());
        for leaf in ["l1", "l2", "l3", "l4"] {
            assert!(score(&ranks, "hub") > score(&ranks, leaf));
        }
    }

    #[test]
    fn edge_targets_are_ranked() {
        let graph = graph_from(&[], &[("A", "B")]);
        let ranks = rank(&graph, &RankConfig::default());
        assert_eq!(ranks.iter().map(|(user, _)| user).collect::<Vec<_>>(), ["A", "B"]);
    }

    #[test]
    fn scores_stay_within_unit_interval() {
        let graph = graph_from(
            &[],
            &[("A", "B"), ("B", "C"), ("C", "D"), ("D", "A"), ("A", "C")],
        );
        let ranks = rank(&graph, &RankConfig::default());
        assert!(ranks.iter().all(|(_, value)| value > 0.0 && value < 1.0));
    }

    #[rstest]
    #[case::damping_one(1.0, 1e-4, 10)]
    #[case::damping_negative(-0.1, 1e-4, 10)]
    #[case::damping_nan(f64::NAN, 1e-4, 10)]
    #[case::tolerance_zero(0.85, 0.0, 10)]
    #[case::tolerance_infinite(0.85, f64::INFINITY, 10)]
    #[case::no_sweeps(0.85, 1e-4, 0)]
    fn rejects_invalid_configuration(
        #[case] damping: f64,
        #[case] tolerance: f64,
        #[case] max_sweeps: usize,
    ) {
        assert!(RankConfig::new(damping, tolerance, max_sweeps).is_err());
    }

    #[test]
    fn sweep_bound_stops_early_and_warns() {
        let graph = cycle_graph();
        let config = RankConfig::new(0.85, 1e-4, 1).expect("configuration is valid");
        let layer = RecordingLayer::default();
        let subscriber = tracing_subscriber::registry().with(layer.clone());

        let ranks = tracing::subscriber::with_default(subscriber, || rank(&graph, &config));
        assert_eq!(ranks.sweeps(), 1);
        assert!(!ranks.converged());

        let span = layer.span("core.rank").expect("core.rank span must exist");
        assert_eq!(span.fields.get("users"), Some(&"3".to_owned()));
        assert_eq!(span.fields.get("converged"), Some(&"false".to_owned()));
        assert!(
            layer
                .events()
                .iter()
                .any(|event| event.level == Level::WARN)
        );
    }

    #[test]
    fn later_users_see_updated_scores_within_a_sweep() {
        // With in-place updates B reads A's refreshed score in the first sweep,
        // so after one sweep the two differ even though the graph is symmetric.
        let graph = graph_from(&[], &[("A", "B")]);
        let config = RankConfig::new(0.85, 1e-4, 1).expect("configuration is valid");
        let ranks = rank(&graph, &config);
        let a = 0.075 + 0.85 * (0.5 / 2.0);
        let b = 0.075 + 0.85 * (a / 2.0);
        assert!((score(&ranks, "A") - a).abs() < 1e-12);
        assert!((score(&ranks, "B") - b).abs() < 1e-12);
    }
}
