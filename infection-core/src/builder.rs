//! Builder utilities for configuring [`Population`] construction.
//!
//! Collects rank parameters and validates them once, before a population is
//! loaded from caller data or generated at random.

use crate::{
    Result, UserGraph, UserVersions,
    population::Population,
    rank::{DEFAULT_DAMPING, DEFAULT_MAX_SWEEPS, DEFAULT_TOLERANCE, RankConfig},
};

#[cfg(feature = "generate")]
use crate::generate::{GenerationConfig, generate_parts};

/// Configures and constructs [`Population`] instances.
///
/// # Examples
/// ```
/// use infection_core::{PopulationBuilder, UserGraph, UserVersions};
///
/// let population = PopulationBuilder::new()
///     .with_damping(0.5)
///     .with_max_sweeps(64)
///     .load(UserVersions::from([("A".to_owned(), 2)]), UserGraph::new())
///     .expect("builder configuration is valid");
/// assert_eq!(population.rank_config().damping(), 0.5);
/// assert_eq!(population.version_of("A"), Some(2));
/// ```
#[derive(Debug, Clone)]
pub struct PopulationBuilder {
    damping: f64,
    tolerance: f64,
    max_sweeps: usize,
}

impl Default for PopulationBuilder {
    fn default() -> Self {
        Self {
            damping: DEFAULT_DAMPING,
            tolerance: DEFAULT_TOLERANCE,
            max_sweeps: DEFAULT_MAX_SWEEPS,
        }
    }
}

impl PopulationBuilder {
    /// Creates a builder populated with default rank parameters.
    ///
    /// # Examples
    /// ```
    /// use infection_core::PopulationBuilder;
    ///
    /// let builder = PopulationBuilder::new();
    /// assert_eq!(builder.damping(), 0.85);
    /// assert_eq!(builder.tolerance(), 0.0001);
    /// assert_eq!(builder.max_sweeps(), 10_000);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the damping factor.
    #[must_use]
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    /// Returns the configured damping factor.
    #[must_use]
    pub fn damping(&self) -> f64 {
        self.damping
    }

    /// Overrides the convergence tolerance.
    ///
    /// # Examples
    /// ```
    /// use infection_core::PopulationBuilder;
    ///
    /// let builder = PopulationBuilder::new().with_tolerance(1e-6);
    /// assert_eq!(builder.tolerance(), 1e-6);
    /// ```
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Returns the configured convergence tolerance.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Overrides the sweep bound.
    #[must_use]
    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    /// Returns the configured sweep bound.
    #[must_use]
    pub fn max_sweeps(&self) -> usize {
        self.max_sweeps
    }

    /// Validates the rank parameters.
    ///
    /// # Errors
    /// Returns the validation errors of [`RankConfig::new`].
    ///
    /// # Examples
    /// ```
    /// use infection_core::{InfectionError, PopulationBuilder};
    ///
    /// let err = PopulationBuilder::new()
    ///     .with_damping(1.5)
    ///     .rank_config()
    ///     .expect_err("damping must stay below one");
    /// assert!(matches!(err, InfectionError::InvalidDamping { .. }));
    /// ```
    pub fn rank_config(&self) -> Result<RankConfig> {
        RankConfig::new(self.damping, self.tolerance, self.max_sweeps)
    }

    /// Validates the configuration and loads a population from caller data.
    ///
    /// Edge lists are de-duplicated, keeping the first occurrence, and users
    /// without an entry in `graph` receive an empty one.
    ///
    /// # Errors
    /// Returns rank-parameter errors from [`Self::rank_config`], or
    /// [`crate::InfectionError::UnknownUser`] when `graph` references a user
    /// missing from `versions`.
    pub fn load(self, versions: UserVersions, graph: UserGraph) -> Result<Population> {
        let rank_config = self.rank_config()?;
        Population::from_parts(versions, graph, rank_config)
    }

    /// Validates the configuration and generates a random population.
    ///
    /// Every generated user starts at version 0.
    ///
    /// # Errors
    /// Returns rank-parameter errors from [`Self::rank_config`].
    ///
    /// # Examples
    /// ```
    /// use infection_core::{GenerationConfig, PopulationBuilder};
    /// use rand::{SeedableRng, rngs::SmallRng};
    ///
    /// let config = GenerationConfig::new(30, 0.5).expect("probability is valid");
    /// let mut rng = SmallRng::seed_from_u64(7);
    /// let population = PopulationBuilder::new()
    ///     .generate(&config, &mut rng)
    ///     .expect("builder configuration is valid");
    /// assert_eq!(population.len(), 30);
    /// assert_eq!(population.max_version(), Some(0));
    /// ```
    #[cfg(feature = "generate")]
    #[cfg_attr(docsrs, doc(cfg(feature = "generate")))]
    pub fn generate<R>(self, config: &GenerationConfig, rng: &mut R) -> Result<Population>
    where
        R: rand::Rng + ?Sized,
    {
        let rank_config = self.rank_config()?;
        let (versions, graph) = generate_parts(config, rng);
        Population::from_parts(versions, graph, rank_config)
    }
}
