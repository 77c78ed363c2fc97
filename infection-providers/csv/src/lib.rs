//! CSV persistence for infection populations.
//!
//! A population named `demo` is stored as two files in one directory:
//! `demo_user_versions.csv` (`user,version`) and `demo_user_graph.csv`
//! (`user_from,user_to`, one row per directed edge).

mod errors;
mod record;

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use infection_core::{Population, PopulationBuilder, UserGraph, UserVersions};

pub use errors::CsvProviderError;
use record::{Record, parse_records, write_record};

/// Header of the versions file.
pub const VERSIONS_HEADER: [&str; 2] = ["user", "version"];

/// Header of the graph file.
pub const GRAPH_HEADER: [&str; 2] = ["user_from", "user_to"];

const VERSIONS_HEADER_LINE: &str = "user,version";
const GRAPH_HEADER_LINE: &str = "user_from,user_to";

/// Location of the versions file for population `name` under `dir`.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use infection_providers_csv::versions_path;
///
/// let path = versions_path(Path::new("data"), "demo");
/// assert_eq!(path, Path::new("data/demo_user_versions.csv"));
/// ```
#[must_use]
pub fn versions_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}_user_versions.csv"))
}

/// Location of the graph file for population `name` under `dir`.
#[must_use]
pub fn graph_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}_user_graph.csv"))
}

/// Reads `user,version` rows.
///
/// # Errors
/// Returns [`CsvProviderError`] when the header is absent or wrong, a row does
/// not have two fields, a user repeats, a version is not an unsigned integer,
/// or reading fails.
///
/// # Examples
/// ```
/// use infection_providers_csv::read_user_versions;
///
/// let versions = read_user_versions("user,version\nA,1\nB,0\n".as_bytes())?;
/// assert_eq!(versions["A"], 1);
/// assert_eq!(versions.len(), 2);
/// # Ok::<(), infection_providers_csv::CsvProviderError>(())
/// ```
pub fn read_user_versions(reader: impl BufRead) -> Result<UserVersions, CsvProviderError> {
    let rows = read_rows(reader, VERSIONS_HEADER, VERSIONS_HEADER_LINE)?;
    let mut versions = UserVersions::new();
    for Record { line, fields } in rows {
        let [user, raw] = into_pair(line, fields)?;
        let version = raw
            .trim()
            .parse::<u64>()
            .map_err(|_| CsvProviderError::InvalidVersion {
                line,
                value: raw,
            })?;
        if versions.contains_key(&user) {
            return Err(CsvProviderError::MalformedRow {
                line,
                reason: format!("duplicate user `{user}`"),
            });
        }
        versions.insert(user, version);
    }
    Ok(versions)
}

/// Reads `user_from,user_to` rows into edge lists, keeping row order.
///
/// # Errors
/// Returns [`CsvProviderError`] when the header is absent or wrong, a row does
/// not have two fields, or reading fails.
pub fn read_user_graph(reader: impl BufRead) -> Result<UserGraph, CsvProviderError> {
    let rows = read_rows(reader, GRAPH_HEADER, GRAPH_HEADER_LINE)?;
    let mut graph = UserGraph::new();
    for Record { line, fields } in rows {
        let [from, to] = into_pair(line, fields)?;
        graph.entry(from).or_default().push(to);
    }
    Ok(graph)
}

/// Writes every `(user, version)` pair of `population`.
///
/// # Errors
/// Returns [`std::io::Error`] if writing fails.
pub fn write_user_versions(
    mut writer: impl Write,
    population: &Population,
) -> std::io::Result<()> {
    write_record(&mut writer, &VERSIONS_HEADER)?;
    for (user, version) in population.user_versions() {
        write_record(&mut writer, &[user, &version.to_string()])?;
    }
    Ok(())
}

/// Writes every directed edge of `population`.
///
/// # Errors
/// Returns [`std::io::Error`] if writing fails.
pub fn write_user_graph(mut writer: impl Write, population: &Population) -> std::io::Result<()> {
    write_record(&mut writer, &GRAPH_HEADER)?;
    for (from, to) in population.user_edges() {
        write_record(&mut writer, &[from, to])?;
    }
    Ok(())
}

/// Loads population `name` from `dir` with default rank parameters.
///
/// # Errors
/// Returns [`CsvProviderError`] if either file is missing or malformed, or the
/// graph references users without a version row.
pub fn load_population(dir: &Path, name: &str) -> Result<Population, CsvProviderError> {
    load_population_with(PopulationBuilder::new(), dir, name)
}

/// Loads population `name` from `dir` using `builder` for rank parameters.
///
/// # Errors
/// See [`load_population`]; invalid builder parameters are also reported.
pub fn load_population_with(
    builder: PopulationBuilder,
    dir: &Path,
    name: &str,
) -> Result<Population, CsvProviderError> {
    let versions = read_user_versions(open(&versions_path(dir, name))?)?;
    let graph = read_user_graph(open(&graph_path(dir, name))?)?;
    Ok(builder.load(versions, graph)?)
}

/// Saves `population` as population `name` in `dir`, replacing existing files.
///
/// # Errors
/// Returns [`CsvProviderError::File`] if a file cannot be created or written.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// use infection_core::{Population, UserGraph, UserVersions};
/// use infection_providers_csv::{load_population, save_population};
///
/// let dir = tempfile::tempdir()?;
/// let versions = UserVersions::from([("A".to_owned(), 3), ("B".to_owned(), 0)]);
/// let graph = UserGraph::from([("A".to_owned(), vec!["B".to_owned()])]);
/// let population = Population::load(versions, graph)?;
///
/// save_population(dir.path(), "demo", &population)?;
/// let reloaded = load_population(dir.path(), "demo")?;
/// assert_eq!(reloaded.user_edges(), [("A", "B")]);
/// assert_eq!(reloaded.version_of("A"), Some(3));
/// # Ok(())
/// # }
/// ```
pub fn save_population(
    dir: &Path,
    name: &str,
    population: &Population,
) -> Result<(), CsvProviderError> {
    let path = versions_path(dir, name);
    write_file(&path, |writer| write_user_versions(writer, population))?;
    let path = graph_path(dir, name);
    write_file(&path, |writer| write_user_graph(writer, population))
}

fn read_rows(
    mut reader: impl BufRead,
    header: [&str; 2],
    header_line: &'static str,
) -> Result<Vec<Record>, CsvProviderError> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    let mut records = parse_records(&input)?.into_iter();
    let first = records.next().ok_or(CsvProviderError::MissingHeader {
        expected: header_line,
    })?;
    let matches = first.fields.len() == header.len()
        && first
            .fields
            .iter()
            .zip(header)
            .all(|(found, expected)| found.trim() == expected);
    if !matches {
        return Err(CsvProviderError::UnexpectedHeader {
            expected: header_line,
            found: first.fields.join(","),
        });
    }
    Ok(records.collect())
}

fn into_pair(line: usize, fields: Vec<String>) -> Result<[String; 2], CsvProviderError> {
    let found = fields.len();
    <[String; 2]>::try_from(fields).map_err(|_| CsvProviderError::MalformedRow {
        line,
        reason: format!("expected 2 fields, found {found}"),
    })
}

fn open(path: &Path) -> Result<BufReader<File>, CsvProviderError> {
    let file = File::open(path).map_err(|source| CsvProviderError::File {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

fn write_file(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
) -> Result<(), CsvProviderError> {
    let file_error = |source| CsvProviderError::File {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(file_error)?;
    let mut writer = BufWriter::new(file);
    write(&mut writer).map_err(file_error)?;
    writer.flush().map_err(file_error)
}
