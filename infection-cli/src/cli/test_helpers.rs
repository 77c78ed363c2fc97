//! Small helpers shared across CLI tests.
//!
//! The CLI unit tests seed a temporary directory with population files and
//! assert on the files each command leaves behind.

use std::path::Path;

use infection_core::Population;
use infection_providers_csv::{load_population, save_population};
use infection_test_support::fixtures::cycle_with_isolated_pair;
use tempfile::TempDir;

use super::{Cli, CliError, Command, run_cli};

pub(super) fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

/// Saves the three-cycle plus isolated pair as population `name`.
pub(super) fn seed_population(dir: &TempDir, name: &str) {
    let (versions, graph) = cycle_with_isolated_pair();
    let population = Population::load(versions, graph).expect("fixture must load");
    save_population(dir.path(), name, &population).expect("fixture must save");
}

pub(super) fn reload(dir: &Path, name: &str) -> Population {
    match load_population(dir, name) {
        Ok(population) => population,
        Err(err) => panic!("failed to reload `{name}`: {err}"),
    }
}

pub(super) fn cli(dir: &TempDir, command: Command) -> Cli {
    Cli {
        dir: dir.path().to_path_buf(),
        command,
    }
}

pub(super) fn run_cli_expecting_error(cli: Cli, panic_msg: &str) -> CliError {
    match run_cli(cli) {
        Ok(_) => panic!("{panic_msg}"),
        Err(err) => err,
    }
}
