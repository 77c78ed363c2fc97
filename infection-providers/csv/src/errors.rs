use std::io;
use std::path::PathBuf;

use infection_core::InfectionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CsvProviderError {
    #[error("input is empty; expected header `{expected}`")]
    MissingHeader { expected: &'static str },
    #[error("unexpected header `{found}`; expected `{expected}`")]
    UnexpectedHeader {
        expected: &'static str,
        found: String,
    },
    #[error("line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },
    #[error("line {line}: invalid version `{value}`")]
    InvalidVersion { line: usize, value: String },
    #[error("failed to access `{path}`: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Core(#[from] InfectionError),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}
