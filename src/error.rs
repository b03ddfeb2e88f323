//! Error types for the sales pipeline

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A column the current stage needs is missing, duplicated or misshapen.
    #[error("schema error: {0}")]
    Schema(String),

    /// Malformed input: a ragged or empty file, or text where a number is required.
    #[error("parse error at {location}: {message}")]
    Parse { location: String, message: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A categorical value with no ordinal or one-hot mapping.
    #[error("value error in column `{column}`, row {row}: unmapped value `{value}`")]
    Value {
        column: String,
        row: usize,
        value: String,
    },

    #[error("model error: {0}")]
    Model(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn missing_column(column: &str) -> Self {
        Error::Schema(format!("required column `{column}` is missing"))
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn parse(location: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Parse {
            location: location.into(),
            message: message.into(),
        }
    }
}

impl From<linfa::Error> for Error {
    fn from(err: linfa::Error) -> Self {
        Error::Model(err.to_string())
    }
}
