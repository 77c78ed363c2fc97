//! Unit tests for the CLI commands and their file outputs.

use super::commands::suffixed;
use super::test_helpers::{cli, reload, run_cli_expecting_error, seed_population, temp_dir};
use super::{
    Cli, CliError, Command, ExecutionSummary, FullCommand, GenerateCommand, LimitedCommand,
    RankArgs, VisualizeCommand, render_summary, run_cli,
};

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use infection_core::{InfectionError, InfectionErrorCode};
use infection_providers_csv::{CsvProviderError, graph_path, versions_path};
use rstest::rstest;
use tracing_subscriber::layer::SubscriberExt;

use infection_test_support::tracing::RecordingLayer;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn generate(name: &str, size: usize, seed: u64) -> Command {
    Command::Generate(GenerateCommand {
        name: name.into(),
        size,
        edge_probability: 0.5,
        seed: Some(seed),
    })
}

fn limited(name: &str, count: usize, rank: RankArgs) -> Command {
    Command::Limited(LimitedCommand {
        name: name.into(),
        count,
        rank,
    })
}

#[rstest]
fn generate_writes_both_files() -> TestResult {
    let dir = temp_dir();
    let summary = run_cli(cli(&dir, generate("demo", 25, 9)))?;

    let ExecutionSummary::Generated {
        users, edges, seed, ..
    } = summary
    else {
        panic!("unexpected summary: {summary:?}");
    };
    assert_eq!((users, seed), (25, 9));

    let population = reload(dir.path(), "demo");
    assert_eq!(population.len(), 25);
    assert_eq!(population.user_edges().len(), edges);
    assert_eq!(population.max_version(), Some(0));
    Ok(())
}

#[rstest]
fn generate_is_reproducible_with_a_seed() -> TestResult {
    let dir = temp_dir();
    run_cli(cli(&dir, generate("first", 40, 77)))?;
    run_cli(cli(&dir, generate("second", 40, 77)))?;

    assert_eq!(
        fs::read_to_string(graph_path(dir.path(), "first"))?,
        fs::read_to_string(graph_path(dir.path(), "second"))?
    );
    Ok(())
}

#[rstest]
#[case(-0.5)]
#[case(2.0)]
fn generate_rejects_invalid_edge_probability(#[case] edge_probability: f64) {
    let dir = temp_dir();
    let command = Command::Generate(GenerateCommand {
        name: "demo".into(),
        size: 3,
        edge_probability,
        seed: Some(1),
    });
    let err = run_cli_expecting_error(cli(&dir, command), "probability must be rejected");
    assert!(matches!(
        err,
        CliError::Core(InfectionError::InvalidEdgeProbability { .. })
    ));
    assert!(!versions_path(dir.path(), "demo").exists());
}

#[rstest]
fn full_saves_a_suffixed_population() -> TestResult {
    let dir = temp_dir();
    seed_population(&dir, "demo");
    let command = Command::Full(FullCommand {
        name: "demo".into(),
        user: "B".into(),
    });

    let summary = run_cli(cli(&dir, command))?;
    assert_eq!(summary, ExecutionSummary::Full { infected: 3 });

    let infected = reload(dir.path(), "demo_full");
    assert_eq!(
        infected.user_versions(),
        [("A", 1), ("B", 1), ("C", 1), ("D", 0), ("E", 0)]
    );
    let untouched = reload(dir.path(), "demo");
    assert_eq!(untouched.max_version(), Some(0));
    Ok(())
}

#[rstest]
fn full_with_unknown_user_infects_nobody() -> TestResult {
    let dir = temp_dir();
    seed_population(&dir, "demo");
    let command = Command::Full(FullCommand {
        name: "demo".into(),
        user: "nobody".into(),
    });

    let summary = run_cli(cli(&dir, command))?;
    assert_eq!(summary, ExecutionSummary::Full { infected: 0 });
    assert_eq!(reload(dir.path(), "demo_full").max_version(), Some(0));
    Ok(())
}

#[rstest]
#[case(3, 3)]
#[case(2, 2)]
#[case(0, 0)]
#[case(8, 5)]
fn limited_saves_a_suffixed_population(
    #[case] count: usize,
    #[case] expected: usize,
) -> TestResult {
    let dir = temp_dir();
    seed_population(&dir, "demo");

    let summary = run_cli(cli(&dir, limited("demo", count, RankArgs::default())))?;
    assert_eq!(
        summary,
        ExecutionSummary::Limited {
            infected: expected,
            requested: count,
        }
    );
    let infected = reload(dir.path(), "demo_limited");
    let upgraded = infected.versions().iter().filter(|&&v| v > 0).count();
    assert_eq!(upgraded, expected);
    Ok(())
}

#[rstest]
fn limited_rejects_invalid_rank_overrides() {
    let dir = temp_dir();
    seed_population(&dir, "demo");
    let rank = RankArgs {
        damping: Some(1.0),
        ..RankArgs::default()
    };

    let err = run_cli_expecting_error(cli(&dir, limited("demo", 2, rank)), "damping must fail");
    assert!(matches!(
        err,
        CliError::Csv(CsvProviderError::Core(InfectionError::InvalidDamping { .. }))
    ));
    assert_eq!(
        err.core().map(InfectionError::code),
        Some(InfectionErrorCode::InvalidDamping)
    );
}

#[rstest]
fn missing_population_reports_the_file() {
    let dir = temp_dir();
    let err = run_cli_expecting_error(
        cli(&dir, limited("absent", 1, RankArgs::default())),
        "missing files must fail",
    );
    match err {
        CliError::Csv(CsvProviderError::File { path, .. }) => {
            assert_eq!(path, versions_path(dir.path(), "absent"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[rstest]
fn visualize_writes_an_html_page() -> TestResult {
    let dir = temp_dir();
    seed_population(&dir, "demo");
    let command = Command::Visualize(VisualizeCommand {
        name: "demo".into(),
    });

    let summary = run_cli(cli(&dir, command))?;
    let path = dir.path().join("demo.html");
    assert_eq!(summary, ExecutionSummary::Visualized { path: path.clone() });

    let page = fs::read_to_string(path)?;
    assert!(page.contains(r#"{"name":"E","version":0}"#));
    assert!(page.contains(r#"{"source":2,"target":0}"#));
    Ok(())
}

#[rstest]
#[case::full(ExecutionSummary::Full { infected: 4 }, "Infected 4 users\n")]
#[case::limited(
    ExecutionSummary::Limited { infected: 2, requested: 3 },
    "Infected 2 users of the 3 requested\n"
)]
#[case::visualized(
    ExecutionSummary::Visualized { path: PathBuf::from("out/demo.html") },
    "Wrote out/demo.html\n"
)]
#[case::generated(
    ExecutionSummary::Generated { name: "demo".into(), users: 5, edges: 4, seed: 3 },
    "Generated 5 users with 4 edges as `demo` (seed 3)\n"
)]
fn render_summary_prints_one_line(
    #[case] summary: ExecutionSummary,
    #[case] expected: &str,
) -> TestResult {
    let mut buffer = Vec::new();
    render_summary(&summary, &mut buffer)?;
    assert_eq!(String::from_utf8(buffer)?, expected);
    Ok(())
}

#[rstest]
fn clap_parses_global_dir_and_rank_overrides() -> TestResult {
    let parsed = Cli::try_parse_from([
        "infection",
        "limited",
        "demo",
        "4",
        "--damping",
        "0.5",
        "--max-sweeps",
        "20",
        "--dir",
        "data",
    ])?;
    assert_eq!(parsed.dir, PathBuf::from("data"));
    let Command::Limited(command) = parsed.command else {
        panic!("expected the limited command");
    };
    assert_eq!(command.count, 4);
    assert_eq!(command.rank.damping, Some(0.5));
    assert_eq!(command.rank.max_sweeps, Some(20));
    assert_eq!(command.rank.tolerance, None);
    Ok(())
}

#[rstest]
fn clap_applies_generate_defaults() -> TestResult {
    let parsed = Cli::try_parse_from(["infection", "generate", "demo", "--size", "10"])?;
    assert_eq!(parsed.dir, PathBuf::from("."));
    let Command::Generate(command) = parsed.command else {
        panic!("expected the generate command");
    };
    assert!((command.edge_probability - 0.5).abs() < f64::EPSILON);
    assert_eq!(command.seed, None);
    Ok(())
}

#[rstest]
#[case::missing_size(&["infection", "generate", "demo"])]
#[case::negative_count(&["infection", "limited", "demo", "-1"])]
#[case::missing_user(&["infection", "full", "demo"])]
fn clap_rejects_invalid_arguments(#[case] args: &[&str]) {
    assert!(Cli::try_parse_from(args).is_err());
}

#[rstest]
fn run_records_command_span() -> TestResult {
    let dir = temp_dir();
    seed_population(&dir, "demo");
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());

    let summary = tracing::subscriber::with_default(subscriber, || {
        run_cli(cli(&dir, limited("demo", 3, RankArgs::default())))
    })?;
    assert_eq!(
        summary,
        ExecutionSummary::Limited {
            infected: 3,
            requested: 3
        }
    );

    let run = layer.span("cli.run").expect("cli.run span must close");
    assert_eq!(run.fields.get("command").map(String::as_str), Some("limited"));
    let limited = layer.span("cli.limited").expect("cli.limited span must close");
    assert_eq!(limited.fields.get("name").map(String::as_str), Some("demo"));
    assert!(layer.span("core.limited_infection").is_some());
    Ok(())
}

#[test]
fn suffixed_names_follow_the_saved_layout() {
    assert_eq!(suffixed("demo", "full"), "demo_full");
}
