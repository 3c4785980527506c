use std::path::PathBuf;
use thiserror::Error;

/// A grammar violation in `config.cat`, tagged with a 1-based location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}, column {column}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("expected {expected}, found {found}")]
    Expected { expected: String, found: String },

    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unknown key `{0}`")]
    UnknownKey(String),

    #[error("unknown target type `{0}` (expected executable, debug, test, static_lib or shared_lib)")]
    UnknownTargetKind(String),

    #[error("invalid output path `{0}` (expected <dir>/<name>)")]
    InvalidOutputPath(String),

    #[error("invalid value `{0}` for auto_discovery (expected true or false)")]
    InvalidBool(String),

    #[error("missing `{field}` in {block}")]
    MissingField { field: &'static str, block: String },

    #[error("duplicate target name `{0}`")]
    DuplicateTarget(String),

    #[error("at least one target is required")]
    NoTargets,

    #[error("too many {what} (limit is {limit})")]
    LimitExceeded { what: &'static str, limit: usize },

    #[error("cannot expand sources from `{entry}`: {message}")]
    Discovery { entry: String, message: String },
}

/// Failure to locate, read, or parse the project description.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{file} not found in {} or any of its parent directories", start.display())]
    NotFound { file: &'static str, start: PathBuf },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8 (byte offset {offset})", path.display())]
    Utf8 { path: PathBuf, offset: usize },

    #[error("error in {} at {error}", path.display())]
    Parse { path: PathBuf, error: ParseError },
}
