//! Error types returned by the linking engine.
//!
//! Runtime calls return [`anyhow::Error`]; the engine wraps them into a
//! [`GslkError`] variant carrying the offending path. The CLI boundary turns
//! any variant into a non-zero exit via the standard `?` operator.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Boxed underlying cause kept as the error source.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = GslkError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum GslkError {
    /// The source root cannot be read.
    #[error("source directory {path:?} is not readable")]
    SourceNotFound { path: PathBuf, source: BoxError },

    /// A requested package is not a subdirectory of the source root.
    #[error("package '{name}' not found in source directory {source_dir:?}")]
    PackageNotFound { name: String, source_dir: PathBuf },

    /// The source root contains no package directories.
    #[error("no packages found in source directory {path:?}")]
    EmptyCatalog { path: PathBuf },

    /// Reading or mutating a path failed.
    #[error("{action} {path:?} failed")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: BoxError,
    },

    /// Walking a package tree failed.
    #[error("error accessing {path:?} while walking package")]
    Walk { path: PathBuf, source: BoxError },

    /// The target path is occupied by something other than the expected symlink.
    #[error("conflict: target {path:?} already exists and is not the expected symlink")]
    Conflict { path: PathBuf },

    /// Links that should have been removed are still present after unlink.
    #[error("verification failed: {} link(s) still present after unlink: {paths:?}", .paths.len())]
    Verification { paths: Vec<PathBuf> },
}

impl GslkError {
    pub(crate) fn io(action: &'static str, path: &Path, err: anyhow::Error) -> Self {
        GslkError::Io {
            action,
            path: path.to_path_buf(),
            source: err.into(),
        }
    }

    pub(crate) fn walk(path: &Path, err: anyhow::Error) -> Self {
        GslkError::Walk {
            path: path.to_path_buf(),
            source: err.into(),
        }
    }
}
