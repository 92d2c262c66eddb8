//! Path utility functions for normalization and comparison.

use std::path::{Component, Path, PathBuf};

/// Normalize a path by processing `.` and `..` components lexically.
/// This does not access the filesystem and does not follow symlinks.
///
/// `..` at the filesystem root is dropped; `..` at the start of a relative
/// path is kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match result.components().next_back() {
                Some(Component::Normal(_)) => {
                    result.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => result.push(component),
            },
            _ => result.push(component),
        }
    }
    result
}

/// Check if a path is under a given directory by comparing normalized path components.
/// Returns true if `path` is under `dir` or equal to it.
///
/// `/home/user/../../etc/passwd` is NOT under `/home/user`.
pub fn is_path_under(path: &Path, dir: &Path) -> bool {
    let normalized_path = normalize_path(path);
    let normalized_dir = normalize_path(dir);

    let path_components: Vec<_> = normalized_path.components().collect();
    let dir_components: Vec<_> = normalized_dir.components().collect();

    if path_components.len() < dir_components.len() {
        return false;
    }

    dir_components
        .iter()
        .zip(path_components.iter())
        .all(|(d, p)| d == p)
}

/// Resolve a relative path against a base directory to get an absolute path.
///
/// For example, if base_dir is `/home/user` and relative_path is
/// `../shared/dotfiles`, this returns `/home/shared/dotfiles`.
pub fn resolve_relative_path(base_dir: &Path, relative_path: &Path) -> PathBuf {
    if relative_path.is_absolute() {
        normalize_path(relative_path)
    } else {
        normalize_path(&base_dir.join(relative_path))
    }
}
