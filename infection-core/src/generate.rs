//! Random population generation.
//!
//! Users are named with [`user_name`] and start at version 0. Each user then
//! draws outgoing edges: the `k`-th draw succeeds while a uniform sample stays
//! at or below `edge_probability / sqrt(k)`, so out-degree shrinks quickly as
//! it grows. A successful draw picks a uniformly random target; self-links and
//! repeated targets are discarded but still consume the draw.

use rand::Rng;
use tracing::{debug, instrument};

use crate::{
    UserGraph, UserVersions,
    error::{InfectionError, Result},
};

/// Default probability scale for outgoing edges.
const DEFAULT_EDGE_PROBABILITY: f64 = 0.5;

const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Parameters for [`crate::PopulationBuilder::generate`].
///
/// # Examples
/// ```
/// use infection_core::GenerationConfig;
///
/// let config = GenerationConfig::new(10, 0.25).expect("probability is valid");
/// assert_eq!(config.size(), 10);
/// assert!(GenerationConfig::new(10, 1.5).is_err());
/// assert_eq!(GenerationConfig::with_size(4).edge_probability(), 0.5);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationConfig {
    size: usize,
    edge_probability: f64,
}

impl GenerationConfig {
    /// Validates and builds a configuration.
    ///
    /// # Errors
    /// Returns [`InfectionError::InvalidEdgeProbability`] unless
    /// `edge_probability` lies within `[0, 1]`.
    pub fn new(size: usize, edge_probability: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&edge_probability) {
            return Err(InfectionError::InvalidEdgeProbability {
                got: edge_probability,
            });
        }
        Ok(Self {
            size,
            edge_probability,
        })
    }

    /// Configuration for `size` users with the default edge probability.
    #[must_use]
    pub const fn with_size(size: usize) -> Self {
        Self {
            size,
            edge_probability: DEFAULT_EDGE_PROBABILITY,
        }
    }

    /// Number of users to generate.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Probability scale for outgoing edges.
    #[must_use]
    pub const fn edge_probability(&self) -> f64 {
        self.edge_probability
    }
}

/// Name of the `index`-th generated user.
///
/// The name has `index / 26 + 1` letters, starting at `A + index % 26` and
/// stepping through the alphabet with wrap-around.
///
/// # Examples
/// ```
/// use infection_core::user_name;
///
/// assert_eq!(user_name(0), "A");
/// assert_eq!(user_name(25), "Z");
/// assert_eq!(user_name(26), "AB");
/// assert_eq!(user_name(27), "BC");
/// assert_eq!(user_name(51), "ZA");
/// ```
#[must_use]
pub fn user_name(index: usize) -> String {
    let letters = index / ALPHABET.len() + 1;
    (0..letters)
        .filter_map(|offset| {
            ALPHABET
                .get((index + offset) % ALPHABET.len())
                .map(|&letter| char::from(letter))
        })
        .collect()
}

#[instrument(
    name = "core.generate",
    skip_all,
    fields(size = config.size(), edge_probability = config.edge_probability()),
)]
pub(crate) fn generate_parts<R>(config: &GenerationConfig, rng: &mut R) -> (UserVersions, UserGraph)
where
    R: Rng + ?Sized,
{
    let names: Vec<String> = (0..config.size()).map(user_name).collect();
    let mut graph = UserGraph::new();
    let mut edge_count = 0_usize;

    for (position, name) in names.iter().enumerate() {
        let mut targets: Vec<String> = Vec::new();
        let mut draws = 1_u32;
        while rng.gen_range(0.0..1.0) <= config.edge_probability() / f64::from(draws).sqrt() {
            let other = rng.gen_range(0..names.len());
            if other != position
                && let Some(target) = names.get(other)
                && !targets.contains(target)
            {
                targets.push(target.clone());
            }
            draws = draws.saturating_add(1);
        }
        edge_count += targets.len();
        graph.insert(name.clone(), targets);
    }

    debug!(users = names.len(), edges = edge_count, "generated population");
    let versions = names.into_iter().map(|name| (name, 0)).collect();
    (versions, graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    use infection_test_support::proptest_profile;
    use proptest::prelude::*;
    use rand::{SeedableRng, rngs::SmallRng};
    use rstest::rstest;

    #[rstest]
    #[case(0, "A")]
    #[case(2, "C")]
    #[case(26, "AB")]
    #[case(52, "ABC")]
    #[case(53, "BCD")]
    fn names_follow_the_alphabet_walk(#[case] index: usize, #[case] expected: &str) {
        assert_eq!(user_name(index), expected);
    }

    #[rstest]
    #[case(-0.1)]
    #[case(1.01)]
    #[case(f64::NAN)]
    fn rejects_probabilities_outside_unit_interval(#[case] probability: f64) {
        let err = GenerationConfig::new(3, probability).expect_err("must be rejected");
        assert_eq!(err.code(), crate::InfectionErrorCode::InvalidEdgeProbability);
    }

    #[test]
    fn zero_probability_generates_no_edges() {
        let config = GenerationConfig::new(20, 0.0).expect("probability is valid");
        let (versions, graph) = generate_parts(&config, &mut SmallRng::seed_from_u64(3));
        assert_eq!(versions.len(), 20);
        assert!(graph.values().all(Vec::is_empty));
    }

    #[test]
    fn same_seed_generates_the_same_population() {
        let config = GenerationConfig::with_size(40);
        let first = generate_parts(&config, &mut SmallRng::seed_from_u64(11));
        let second = generate_parts(&config, &mut SmallRng::seed_from_u64(11));
        assert_eq!(first, second);
    }

    #[test]
    fn single_user_never_links_to_itself() {
        let config = GenerationConfig::new(1, 1.0).expect("probability is valid");
        let (_, graph) = generate_parts(&config, &mut SmallRng::seed_from_u64(5));
        assert_eq!(graph["A"], Vec::<String>::new());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(proptest_profile::cases(48)))]

        #[test]
        fn generated_graphs_are_well_formed(
            seed in any::<u64>(),
            size in 0_usize..80,
            probability in 0.0_f64..=1.0,
        ) {
            let config = GenerationConfig::new(size, probability).expect("probability is valid");
            let (versions, graph) = generate_parts(&config, &mut SmallRng::seed_from_u64(seed));

            prop_assert_eq!(versions.len(), size);
            prop_assert!(versions.values().all(|&version| version == 0));
            prop_assert_eq!(graph.len(), size);
            for (from, targets) in &graph {
                prop_assert!(!targets.contains(from));
                let mut unique = targets.clone();
                unique.sort_unstable();
                unique.dedup();
                prop_assert_eq!(unique.len(), targets.len());
                prop_assert!(targets.iter().all(|target| versions.contains_key(target)));
            }
        }
    }
}
