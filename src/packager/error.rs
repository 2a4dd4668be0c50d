//! Error types for packaging operations.
//!
//! All packaging failures funnel through [`Error`]. I/O errors are annotated
//! with the operation and the failing path via [`ErrorExt::fs_context`] so a
//! failed run names exactly what it was touching.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for packaging operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all packaging operations
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error with a preformatted message
    #[error("{0}")]
    GenericError(String),

    /// IO errors without path context
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// IO errors annotated with the operation and the failing path
    #[error("{operation} failed for {path}: {source}")]
    FsError {
        /// What the packager was doing
        operation: String,
        /// Path that failed
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A manifest file exists but does not parse as JSON
    #[error("malformed manifest {path}: {source}")]
    ManifestParse {
        /// Manifest file that failed to parse
        path: PathBuf,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// Template registration, validation, or rendering errors
    #[error("template error: {0}")]
    Template(String),

    /// A module specifier could not be resolved during closure computation
    #[error("cannot resolve module \"{specifier}\" from {referrer}")]
    ModuleResolve {
        /// The unresolved import/require specifier
        specifier: String,
        /// File containing the reference
        referrer: PathBuf,
    },

    /// A pipeline stage was invoked out of order or twice
    #[error("stage `{attempted}` cannot run while the pipeline is {current}")]
    StageOrder {
        /// Stage method that was called
        attempted: &'static str,
        /// Current pipeline state name
        current: &'static str,
    },

    /// Directory traversal errors
    #[error("walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Path prefix errors during tree copies
    #[error("path prefix error: {0}")]
    StripPrefix(#[from] std::path::StripPrefixError),
}

/// Extension trait adding message context to `Option` and `Result`.
pub trait Context<T> {
    /// Converts to [`Result`], attaching `msg` on the error path.
    fn context(self, msg: &str) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(msg.to_string()))
    }
}

impl<T, E: std::fmt::Display> Context<T> for std::result::Result<T, E> {
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{msg}: {e}")))
    }
}

/// Extension trait attaching operation + path context to IO results.
pub trait ErrorExt<T> {
    /// Wraps an IO error with the operation description and the path involved.
    fn fs_context(self, operation: &str, path: &Path) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, operation: &str, path: &Path) -> Result<T> {
        self.map_err(|source| Error::FsError {
            operation: operation.to_string(),
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Returns early with a [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::packager::Error::GenericError(format!($($arg)*)).into())
    };
}
