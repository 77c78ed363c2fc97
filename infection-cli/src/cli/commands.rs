//! Command implementations and argument parsing for the infection CLI.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use infection_core::{GenerationConfig, InfectionError, PopulationBuilder};
use infection_providers_csv::{
    CsvProviderError, load_population, load_population_with, save_population,
};
use rand::{SeedableRng, rngs::SmallRng};
use thiserror::Error;
use tracing::{Span, field, info, instrument};

use crate::visualize::{VisualizeError, render_html};

const DEFAULT_EDGE_PROBABILITY: f64 = 0.5;
const FULL_SUFFIX: &str = "full";
const LIMITED_SUFFIX: &str = "limited";

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "infection",
    about = "Propagate versions through a graph of connected users."
)]
pub struct Cli {
    /// Directory holding `{name}_user_versions.csv` and `{name}_user_graph.csv`.
    #[arg(long, global = true, default_value = ".")]
    pub dir: PathBuf,

    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Generate a random population and save it.
    Generate(GenerateCommand),
    /// Render a population as a self-contained HTML page.
    Visualize(VisualizeCommand),
    /// Infect a user and everyone connected to them.
    Full(FullCommand),
    /// Infect as close as possible to a number of users.
    Limited(LimitedCommand),
}

/// Options accepted by the `generate` command.
#[derive(Debug, Args, Clone)]
pub struct GenerateCommand {
    /// Population name.
    pub name: String,

    /// Number of users to generate.
    #[arg(long)]
    pub size: usize,

    /// Probability scale for each user's outgoing edges.
    #[arg(long = "edge-probability", default_value_t = DEFAULT_EDGE_PROBABILITY)]
    pub edge_probability: f64,

    /// Seed for reproducible output (random when omitted).
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Options accepted by the `visualize` command.
#[derive(Debug, Args, Clone)]
pub struct VisualizeCommand {
    /// Population name.
    pub name: String,
}

/// Options accepted by the `full` command.
#[derive(Debug, Args, Clone)]
pub struct FullCommand {
    /// Population name.
    pub name: String,

    /// User whose component is infected.
    pub user: String,
}

/// Options accepted by the `limited` command.
#[derive(Debug, Args, Clone)]
pub struct LimitedCommand {
    /// Population name.
    pub name: String,

    /// Number of users to infect.
    pub count: usize,

    /// Ranking overrides.
    #[command(flatten)]
    pub rank: RankArgs,
}

/// Overrides for the parameters of the rank used to order exploration.
#[derive(Debug, Args, Clone, Default)]
pub struct RankArgs {
    /// Damping factor in `[0, 1)`.
    #[arg(long)]
    pub damping: Option<f64>,

    /// Per-user convergence tolerance.
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Upper bound on rank sweeps.
    #[arg(long = "max-sweeps")]
    pub max_sweeps: Option<usize>,
}

impl RankArgs {
    fn builder(&self) -> PopulationBuilder {
        let mut builder = PopulationBuilder::new();
        if let Some(damping) = self.damping {
            builder = builder.with_damping(damping);
        }
        if let Some(tolerance) = self.tolerance {
            builder = builder.with_tolerance(tolerance);
        }
        if let Some(max_sweeps) = self.max_sweeps {
            builder = builder.with_max_sweeps(max_sweeps);
        }
        builder
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// File I/O failed while writing an output file.
    #[error("failed to write `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Loading or saving population files failed.
    #[error(transparent)]
    Csv(#[from] CsvProviderError),
    /// Core configuration was rejected.
    #[error(transparent)]
    Core(#[from] InfectionError),
    /// Rendering the visualisation failed.
    #[error(transparent)]
    Visualize(#[from] VisualizeError),
}

impl CliError {
    /// Core error behind this failure, if any.
    #[must_use]
    pub fn core(&self) -> Option<&InfectionError> {
        match self {
            Self::Core(core) | Self::Csv(CsvProviderError::Core(core)) => Some(core),
            _ => None,
        }
    }
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionSummary {
    /// A population was generated and saved.
    Generated {
        /// Population name.
        name: String,
        /// Number of users.
        users: usize,
        /// Number of directed edges.
        edges: usize,
        /// Seed that reproduces the population.
        seed: u64,
    },
    /// A visualisation page was written.
    Visualized {
        /// Location of the page.
        path: PathBuf,
    },
    /// A full infection ran.
    Full {
        /// Number of infected users.
        infected: usize,
    },
    /// A limited infection ran.
    Limited {
        /// Number of infected users.
        infected: usize,
        /// Number of users requested.
        requested: usize,
    },
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when loading, infecting or saving fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use infection_cli::cli::{Cli, Command, ExecutionSummary, FullCommand, GenerateCommand, run_cli};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let dir = tempfile::tempdir()?;
/// run_cli(Cli {
///     dir: dir.path().to_path_buf(),
///     command: Command::Generate(GenerateCommand {
///         name: "demo".into(),
///         size: 10,
///         edge_probability: 0.0,
///         seed: Some(1),
///     }),
/// })?;
/// let summary = run_cli(Cli {
///     dir: dir.path().to_path_buf(),
///     command: Command::Full(FullCommand {
///         name: "demo".into(),
///         user: "A".into(),
///     }),
/// })?;
/// assert_eq!(summary, ExecutionSummary::Full { infected: 1 });
/// # Ok(())
/// # }
/// ```
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(command = field::Empty, dir = field::Empty),
)]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    let Cli { dir, command } = cli;
    let span = Span::current();
    span.record("dir", field::display(dir.display()));
    let label = match &command {
        Command::Generate(_) => "generate",
        Command::Visualize(_) => "visualize",
        Command::Full(_) => "full",
        Command::Limited(_) => "limited",
    };
    span.record("command", field::display(label));

    match command {
        Command::Generate(command) => run_generate(&dir, command),
        Command::Visualize(command) => run_visualize(&dir, &command),
        Command::Full(command) => run_full(&dir, &command),
        Command::Limited(command) => run_limited(&dir, &command),
    }
}

#[instrument(
    name = "cli.generate",
    err,
    skip(dir, command),
    fields(name = %command.name, size = command.size, seed = field::Empty),
)]
pub(super) fn run_generate(
    dir: &Path,
    command: GenerateCommand,
) -> Result<ExecutionSummary, CliError> {
    let GenerateCommand {
        name,
        size,
        edge_probability,
        seed,
    } = command;
    let config = GenerationConfig::new(size, edge_probability)?;
    let seed = seed.unwrap_or_else(rand::random);
    Span::current().record("seed", seed);

    let mut rng = SmallRng::seed_from_u64(seed);
    let population = PopulationBuilder::new().generate(&config, &mut rng)?;
    save_population(dir, &name, &population)?;

    let edges = population.user_edges().len();
    info!(users = population.len(), edges, "population generated");
    Ok(ExecutionSummary::Generated {
        name,
        users: population.len(),
        edges,
        seed,
    })
}

#[instrument(name = "cli.visualize", err, skip(dir, command), fields(name = %command.name))]
pub(super) fn run_visualize(
    dir: &Path,
    command: &VisualizeCommand,
) -> Result<ExecutionSummary, CliError> {
    let population = load_population(dir, &command.name)?;
    let path = dir.join(format!("{}.html", command.name));

    let io_error = |source| CliError::Io {
        path: path.clone(),
        source,
    };
    let file = File::create(&path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    render_html(&population, &mut writer)?;
    writer.flush().map_err(io_error)?;

    info!(path = %path.display(), users = population.len(), "visualisation written");
    Ok(ExecutionSummary::Visualized { path })
}

#[instrument(
    name = "cli.full",
    err,
    skip(dir, command),
    fields(name = %command.name, user = %command.user),
)]
pub(super) fn run_full(dir: &Path, command: &FullCommand) -> Result<ExecutionSummary, CliError> {
    let mut population = load_population(dir, &command.name)?;
    let infected = population.full_infection(&command.user);
    save_population(dir, &suffixed(&command.name, FULL_SUFFIX), &population)?;
    Ok(ExecutionSummary::Full { infected })
}

#[instrument(
    name = "cli.limited",
    err,
    skip(dir, command),
    fields(name = %command.name, count = command.count),
)]
pub(super) fn run_limited(
    dir: &Path,
    command: &LimitedCommand,
) -> Result<ExecutionSummary, CliError> {
    let mut population = load_population_with(command.rank.builder(), dir, &command.name)?;
    let infected = population.limited_infection(command.count);
    save_population(dir, &suffixed(&command.name, LIMITED_SUFFIX), &population)?;
    Ok(ExecutionSummary::Limited {
        infected,
        requested: command.count,
    })
}

pub(super) fn suffixed(name: &str, suffix: &str) -> String {
    format!("{name}_{suffix}")
}

/// Renders `summary` to `writer` in a human-readable text format.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use infection_cli::cli::{ExecutionSummary, render_summary};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let summary = ExecutionSummary::Limited { infected: 3, requested: 4 };
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// assert_eq!(String::from_utf8(buffer)?, "Infected 3 users of the 4 requested\n");
/// # Ok(())
/// # }
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    match summary {
        ExecutionSummary::Generated {
            name,
            users,
            edges,
            seed,
        } => writeln!(
            writer,
            "Generated {users} users with {edges} edges as `{name}` (seed {seed})"
        ),
        ExecutionSummary::Visualized { path } => writeln!(writer, "Wrote {}", path.display()),
        ExecutionSummary::Full { infected } => writeln!(writer, "Infected {infected} users"),
        ExecutionSummary::Limited {
            infected,
            requested,
        } => writeln!(writer, "Infected {infected} users of the {requested} requested"),
    }
}
