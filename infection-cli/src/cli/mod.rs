//! Command-line interface orchestration for the infection tool.
//!
//! Populations live in a directory as a pair of CSV files. Commands generate
//! a population, render it, or run a full or limited infection and save the
//! result under a suffixed name.

mod commands;

pub use commands::{
    Cli, CliError, Command, ExecutionSummary, FullCommand, GenerateCommand, LimitedCommand,
    RankArgs, VisualizeCommand, render_summary, run_cli,
};

#[cfg(test)]
mod test_helpers;
#[cfg(test)]
mod tests;
