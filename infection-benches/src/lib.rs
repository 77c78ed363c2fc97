//! Benchmark support crate for infection.
//!
//! Provides seeded synthetic populations and parameter labels used by the
//! Criterion benchmarks for ranking and both infection strategies.

use std::fmt;

use infection_core::{GenerationConfig, InfectionError, Population, PopulationBuilder};
use rand::{SeedableRng, rngs::SmallRng};

/// Seed shared by every benchmark population.
pub const SEED: u64 = 42;

/// Parameters for a population benchmark run.
#[derive(Clone, Debug)]
pub struct PopulationBenchParams {
    /// Number of users in the population.
    pub users: usize,
    /// Probability scale for outgoing edges.
    pub edge_probability: f64,
}

impl fmt::Display for PopulationBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n={},p={}", self.users, self.edge_probability)
    }
}

/// Generates the population described by `params` from [`SEED`].
///
/// # Errors
/// Returns [`InfectionError::InvalidEdgeProbability`] for probabilities
/// outside `[0, 1]`.
///
/// # Examples
/// ```
/// use infection_benches::{PopulationBenchParams, synthetic_population};
///
/// let params = PopulationBenchParams { users: 50, edge_probability: 0.5 };
/// let population = synthetic_population(&params)?;
/// assert_eq!(population.len(), 50);
/// # Ok::<(), infection_core::InfectionError>(())
/// ```
pub fn synthetic_population(params: &PopulationBenchParams) -> Result<Population, InfectionError> {
    let config = GenerationConfig::new(params.users, params.edge_probability)?;
    let mut rng = SmallRng::seed_from_u64(SEED);
    PopulationBuilder::new().generate(&config, &mut rng)
}
