//! Error types for photokeep

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type alias for photokeep operations
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can stop a run.
///
/// Per-file problems (unreadable EXIF, low rating, unparsable numbers) never
/// show up here; they are skipped where they happen.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem operation failed on a specific path
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV serialization failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Figure encoding failed
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    /// Config file exists but could not be parsed
    #[error("Invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Lens database has a malformed row
    #[error("Invalid lens database {path}: {message}")]
    LensTable { path: PathBuf, message: String },

    /// Library root is missing or not a directory
    #[error("Library root is not a directory: {0}")]
    LibraryRoot(PathBuf),

    /// Nothing survived extraction and filtering
    #[error("No valid images with rating >= {min_rating} and lens {lens:?} found")]
    NoData {
        min_rating: f64,
        lens: Option<String>,
    },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidArgument { parameter: String, value: String },

    /// Backup source folder does not exist
    #[error("Source directory '{0}' does not exist")]
    SourceMissing(PathBuf),

    /// Backup destination is not a mounted/existing directory
    #[error("Destination '{0}' does not exist or is not a directory")]
    DestinationMissing(PathBuf),

    /// Required external tool is not installed
    #[error("{0} is not installed. Please install it and try again.")]
    CommandMissing(String),

    /// External tool ran but reported failure
    #[error("{command} failed with {status}")]
    CommandFailed { command: String, status: ExitStatus },

    /// Background task could not be joined
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    /// Attach a path to an I/O error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Shorthand for an invalid parameter error
    pub fn invalid(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidArgument {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    /// Check if this error ends the run cleanly rather than as a failure
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::NoData { .. })
    }
}
