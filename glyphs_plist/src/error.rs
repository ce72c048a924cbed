use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("plist syntax error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("expected {expected} for {context}")]
    UnexpectedType {
        expected: &'static str,
        context: &'static str,
    },

    #[error("missing required key '{0}'")]
    MissingField(&'static str),

    #[error("invalid {context} value '{value}'")]
    InvalidValue {
        context: &'static str,
        value: String,
    },

    #[error("Glyphs file format version {0} is not supported, only Glyphs 2 sources are")]
    UnsupportedFormatVersion(i64),
}
