//! Population state and the infection primitives that mutate it.

use std::collections::{HashMap, HashSet};

use tracing::{Span, field, info, instrument, warn};

use crate::{
    UserGraph, UserVersions,
    adjacency::Adjacency,
    builder::PopulationBuilder,
    error::{InfectionError, Result},
    rank::RankConfig,
    selector::select_limited,
    trace::trace_component,
};

/// Users, their versions and their directed connections.
///
/// Users are held in identifier order with a parallel version list. Every
/// user has a (possibly empty) edge list and every edge target is a known
/// user. Infection only ever raises versions.
///
/// # Examples
/// ```
/// use infection_core::{Population, UserGraph, UserVersions};
///
/// let versions = UserVersions::from([
///     ("A".to_owned(), 0),
///     ("B".to_owned(), 0),
///     ("C".to_owned(), 0),
/// ]);
/// let graph = UserGraph::from([("A".to_owned(), vec!["B".to_owned()])]);
/// let mut population = Population::load(versions, graph)?;
///
/// assert_eq!(population.full_infection("B"), 2);
/// assert_eq!(population.version_of("A"), Some(1));
/// assert_eq!(population.version_of("C"), Some(0));
/// # Ok::<(), infection_core::InfectionError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Population {
    users: Vec<String>,
    versions: Vec<u64>,
    index: HashMap<String, usize>,
    graph: UserGraph,
    rank_config: RankConfig,
}

impl Population {
    /// Loads a population with the default rank configuration.
    ///
    /// # Errors
    /// Returns [`InfectionError::UnknownUser`] when `graph` mentions a user,
    /// as a key or an edge target, that is absent from `versions`.
    pub fn load(versions: UserVersions, graph: UserGraph) -> Result<Self> {
        PopulationBuilder::new().load(versions, graph)
    }

    pub(crate) fn from_parts(
        versions: UserVersions,
        graph: UserGraph,
        rank_config: RankConfig,
    ) -> Result<Self> {
        let (users, versions): (Vec<String>, Vec<u64>) = versions.into_iter().unzip();
        let index: HashMap<String, usize> = users
            .iter()
            .enumerate()
            .map(|(position, user)| (user.clone(), position))
            .collect();

        let mut edges: UserGraph = users
            .iter()
            .map(|user| (user.clone(), Vec::new()))
            .collect();
        for (from, targets) in graph {
            let Some(list) = edges.get_mut(&from) else {
                return Err(InfectionError::UnknownUser { user: from });
            };
            let mut seen = HashSet::new();
            for target in targets {
                if !index.contains_key(&target) {
                    return Err(InfectionError::UnknownUser { user: target });
                }
                if seen.insert(target.clone()) {
                    list.push(target);
                }
            }
        }

        Ok(Self {
            users,
            versions,
            index,
            graph: edges,
            rank_config,
        })
    }

    /// Users in identifier order.
    #[must_use]
    pub fn users(&self) -> &[String] {
        &self.users
    }

    /// Versions parallel to [`Self::users`].
    #[must_use]
    pub fn versions(&self) -> &[u64] {
        &self.versions
    }

    /// Directed edge lists for every user.
    #[must_use]
    pub fn graph(&self) -> &UserGraph {
        &self.graph
    }

    /// Rank parameters used by [`Self::limited_infection`].
    #[must_use]
    pub const fn rank_config(&self) -> &RankConfig {
        &self.rank_config
    }

    /// Number of users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns whether the population has no users.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Current version of `user`, if known.
    #[must_use]
    pub fn version_of(&self, user: &str) -> Option<u64> {
        self.index
            .get(user)
            .and_then(|&position| self.versions.get(position))
            .copied()
    }

    /// Highest version across the population.
    #[must_use]
    pub fn max_version(&self) -> Option<u64> {
        self.versions.iter().copied().max()
    }

    /// `(user, version)` pairs in identifier order.
    #[must_use]
    pub fn user_versions(&self) -> Vec<(&str, u64)> {
        self.users
            .iter()
            .map(String::as_str)
            .zip(self.versions.iter().copied())
            .collect()
    }

    /// Flattened `(from, to)` edge pairs; each stored edge appears once.
    #[must_use]
    pub fn user_edges(&self) -> Vec<(&str, &str)> {
        self.graph
            .iter()
            .flat_map(|(from, targets)| {
                targets
                    .iter()
                    .map(move |to| (from.as_str(), to.as_str()))
            })
            .collect()
    }

    /// Owned copy of the version mapping.
    #[must_use]
    pub fn to_user_versions(&self) -> UserVersions {
        self.users
            .iter()
            .cloned()
            .zip(self.versions.iter().copied())
            .collect()
    }

    /// Owned copy of the edge mapping.
    #[must_use]
    pub fn to_user_graph(&self) -> UserGraph {
        self.graph.clone()
    }

    /// Moves every named user to one version above the current maximum.
    ///
    /// Duplicate names count once and unknown names are ignored. Returns the
    /// number of users whose version was set.
    ///
    /// # Examples
    /// ```
    /// use infection_core::{Population, UserGraph, UserVersions};
    ///
    /// let versions = UserVersions::from([("A".to_owned(), 4), ("B".to_owned(), 1)]);
    /// let mut population = Population::load(versions, UserGraph::new())?;
    /// assert_eq!(population.infect(["B"]), 1);
    /// assert_eq!(population.version_of("B"), Some(5));
    /// assert_eq!(population.infect(Vec::<&str>::new()), 0);
    /// # Ok::<(), infection_core::InfectionError>(())
    /// ```
    pub fn infect<I, S>(&mut self, users: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut positions = Vec::new();
        let mut seen = HashSet::new();
        for user in users {
            let user = user.as_ref();
            match self.index.get(user) {
                Some(&position) => {
                    if seen.insert(position) {
                        positions.push(position);
                    }
                }
                None => warn!(user, "ignoring unknown user"),
            }
        }
        self.infect_positions(&positions)
    }

    /// Infects the whole connected component containing `user`.
    ///
    /// Edges are followed in both directions. Unknown users infect nobody.
    #[instrument(
        name = "core.full_infection",
        skip(self),
        fields(infected = field::Empty),
    )]
    pub fn full_infection(&mut self, user: &str) -> usize {
        let positions = {
            let adjacency = Adjacency::from_graph(&self.graph);
            let component = trace_component(&adjacency, user, &mut HashSet::new());
            self.positions_of(&component)
        };
        let infected = self.infect_positions(&positions);
        Span::current().record("infected", infected);
        infected
    }

    /// Infects up to `count` users made of whole connected components.
    ///
    /// See [`crate::select_limited`] for how the users are chosen. The result
    /// never exceeds `count`.
    #[instrument(
        name = "core.limited_infection",
        skip(self),
        fields(infected = field::Empty),
    )]
    pub fn limited_infection(&mut self, count: usize) -> usize {
        let positions = {
            let selection = select_limited(&self.graph, count, &self.rank_config);
            self.positions_of(selection.users())
        };
        let infected = self.infect_positions(&positions);
        Span::current().record("infected", infected);
        if infected < count {
            info!(requested = count, infected, "limited infection fell short");
        }
        infected
    }

    fn positions_of(&self, users: &[&str]) -> Vec<usize> {
        users
            .iter()
            .filter_map(|user| self.index.get(*user).copied())
            .collect()
    }

    #[instrument(
        name = "core.infect",
        skip_all,
        fields(requested = positions.len(), version = field::Empty),
    )]
    fn infect_positions(&mut self, positions: &[usize]) -> usize {
        if positions.is_empty() {
            return 0;
        }
        let next = self.max_version().unwrap_or_default().saturating_add(1);
        let mut infected = 0;
        for &position in positions {
            if let Some(version) = self.versions.get_mut(position) {
                *version = next;
                infected += 1;
            }
        }
        Span::current().record("version", next);
        infected
    }
}
