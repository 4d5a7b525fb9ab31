//! Error types for yelp-explorer

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for loader and explorer operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Feed file not found: {0:?}")]
    MissingFeed(PathBuf),

    #[error("{file}:{line}: {source}")]
    Feed {
        file: String,
        line: usize,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attach the feed file and 1-based line number to an error
    pub fn at_line(self, file: impl Into<String>, line: usize) -> Self {
        Error::Feed {
            file: file.into(),
            line,
            source: Box::new(self),
        }
    }
}

/// Result type alias for yelp-explorer
pub type Result<T> = std::result::Result<T, Error>;
