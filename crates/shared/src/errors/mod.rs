use std::collections::TryReserveError;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Centralized error type for the shared crate
#[derive(Error, Debug)]
pub enum SharedError {
    /// A path could not be opened, read, created or written
    #[error("cannot access {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The dBase header or a record could not be decoded
    #[error("malformed dBase file {}: {message}", .path.display())]
    Format { path: PathBuf, message: String },

    /// An export backend was compiled out of this build
    #[error("export backend `{0}` is not available in this build")]
    DependencyMissing(&'static str),

    #[error("not enough memory to materialize {rows} records: {source}")]
    OutOfMemory {
        rows: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[cfg(feature = "xlsx")]
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    /// The report stream could not be written
    #[error("output stream error: {0}")]
    Output(#[from] io::Error),
}

impl SharedError {
    pub fn file_access<P: AsRef<Path>>(path: P, source: io::Error) -> Self {
        Self::FileAccess {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn format<P: AsRef<Path>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Format {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }
}

/// Alias for fallible operations in the shared crate
pub type SharedResult<T> = Result<T, SharedError>;
