//! Tagged error type for the patch store core.
//!
//! Arithmetic and logic errors inside the core abort the operation; I/O
//! errors from external readers are wrapped with the path and variable name
//! that triggered them. `OutOfBounds` has no variant here — spec behavior is
//! to degrade to `None`, not to fail.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatchStoreError {
    #[error("timestep {0} already exists")]
    AlreadyExists(i64),

    #[error("cannot query the current timestep ({0}); query only applies to saved timesteps")]
    QueryOnCurrent(i64),

    #[error("getPatchByKey only applies to the current timestep; use query() for past steps")]
    QueryOnPast,

    #[error("unknown timestep {0}")]
    UnknownStep(i64),

    #[error("spatial index grid too large: {dim} cells exceeds the 10,000 limit ({axis} axis)")]
    GridTooLarge { axis: &'static str, dim: usize },

    #[error("unsupported file format for {path:?}")]
    UnsupportedFormat { path: PathBuf },

    #[error("reader I/O error for {path:?} (variable {variable:?}): {source}")]
    ReaderIo {
        path: PathBuf,
        variable: Option<String>,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid coordinate in {path:?} at {context}: {value:?}")]
    InvalidCoordinate {
        path: PathBuf,
        context: String,
        value: String,
    },

    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, PatchStoreError>;
