//! Runtime abstraction for system operations.
//!
//! Every filesystem and environment call the engine makes goes through the
//! [`Runtime`] trait, so the catalog, planner and link engines can be driven
//! by a mock in unit tests.
//!
//! # Structure
//!
//! - `path` - Path utility functions (normalize, is_path_under, resolve_relative_path)
//! - `env` - Home and working directory lookup
//! - `fs` - File system operations (read, directory, entry kind)
//! - `symlink` - Symlink operations (create, read, resolve, remove)

mod env;
mod fs;
pub mod path;
mod symlink;

use anyhow::Result;
use std::path::{Path, PathBuf};

pub use path::{is_path_under, normalize_path, resolve_relative_path};

/// Kind of a filesystem entry as seen without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Dir,
    Symlink,
}

#[cfg_attr(test, mockall::automock)]
pub trait Runtime {
    // File System
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Inspect `path` without following a final symlink.
    /// Returns `Ok(None)` when nothing exists at the path.
    fn file_kind(&self, path: &Path) -> Result<Option<FileKind>>;

    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_dir(&self, path: &Path) -> Result<()>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;

    // Symlinks
    fn symlink(&self, original: &Path, link: &Path) -> Result<()>;
    fn read_link(&self, path: &Path) -> Result<PathBuf>;

    /// Resolve a symlink to an absolute path (without recursively resolving symlinks).
    /// If the link target is relative, it is resolved relative to the link's parent directory.
    fn resolve_link(&self, path: &Path) -> Result<PathBuf>;

    /// Canonicalize a path by resolving all symlinks and returning the canonical absolute path.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;

    fn remove_symlink(&self, path: &Path) -> Result<()>;

    // Directories
    fn home_dir(&self) -> Option<PathBuf>;
    fn current_dir(&self) -> Result<PathBuf>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.is_dir_impl(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.read_dir_impl(path)
    }

    fn file_kind(&self, path: &Path) -> Result<Option<FileKind>> {
        self.file_kind_impl(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.create_dir_all_impl(path)
    }

    fn remove_dir(&self, path: &Path) -> Result<()> {
        self.remove_dir_impl(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.remove_dir_all_impl(path)
    }

    fn symlink(&self, original: &Path, link: &Path) -> Result<()> {
        self.symlink_impl(original, link)
    }

    fn read_link(&self, path: &Path) -> Result<PathBuf> {
        self.read_link_impl(path)
    }

    fn resolve_link(&self, path: &Path) -> Result<PathBuf> {
        self.resolve_link_impl(path)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        self.canonicalize_impl(path)
    }

    fn remove_symlink(&self, path: &Path) -> Result<()> {
        self.remove_symlink_impl(path)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir_impl()
    }

    fn current_dir(&self) -> Result<PathBuf> {
        self.current_dir_impl()
    }
}
