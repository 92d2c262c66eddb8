//! Whether a target path already holds the link to a source path.

use log::debug;
use std::path::{Path, PathBuf};

use crate::error::{GslkError, Result};
use crate::runtime::{FileKind, Runtime, normalize_path};

/// What occupies a target path, relative to the source it should link to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetState {
    /// Nothing exists at the target.
    Missing,
    /// A symlink pointing to the expected source.
    Linked,
    /// A symlink pointing somewhere else.
    ForeignLink(PathBuf),
    /// A file or directory that is not a symlink.
    Occupied(FileKind),
}

/// Inspect `target` without following it and classify it against `source`.
pub fn inspect_target<R: Runtime>(
    runtime: &R,
    target: &Path,
    source: &Path,
) -> Result<TargetState> {
    let kind = runtime
        .file_kind(target)
        .map_err(|e| GslkError::io("inspect", target, e))?;

    match kind {
        None => Ok(TargetState::Missing),
        Some(FileKind::Symlink) => {
            if points_to(runtime, target, source)? {
                Ok(TargetState::Linked)
            } else {
                let dest = runtime
                    .read_link(target)
                    .map_err(|e| GslkError::io("read symlink", target, e))?;
                Ok(TargetState::ForeignLink(dest))
            }
        }
        Some(other) => Ok(TargetState::Occupied(other)),
    }
}

/// Whether the symlink at `link` resolves to `source`.
///
/// The stored destination may be relative or absolute. It matches when it is
/// literally `source`, when it resolves lexically to `source`, or when both
/// resolve to the same location once their parent directories are
/// canonicalized. The final component is never followed, so a link to
/// another link to `source` does not match.
pub fn points_to<R: Runtime>(runtime: &R, link: &Path, source: &Path) -> Result<bool> {
    let raw = runtime
        .read_link(link)
        .map_err(|e| GslkError::io("read symlink", link, e))?;
    if raw == source {
        return Ok(true);
    }

    let resolved = runtime
        .resolve_link(link)
        .map_err(|e| GslkError::io("resolve symlink", link, e))?;
    let source = normalize_path(source);
    if normalize_path(&resolved) == source {
        return Ok(true);
    }

    let matches = match (
        canonical_location(runtime, &resolved),
        canonical_location(runtime, &source),
    ) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    };
    debug!(
        "Link {:?} -> {:?} (resolved {:?}) matches {:?}: {}",
        link, raw, resolved, source, matches
    );
    Ok(matches)
}

/// Canonical parent directory joined with the unchanged final component.
fn canonical_location<R: Runtime>(runtime: &R, path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?;
    let parent = runtime.canonicalize(path.parent()?).ok()?;
    Some(parent.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use crate::test_utils::{test_home, test_source_root};
    use mockall::predicate::eq;

    #[test]
    fn test_inspect_missing() {
        let mut runtime = MockRuntime::new();
        let target = test_home().join(".zshrc");
        runtime
            .expect_file_kind()
            .with(eq(target.clone()))
            .returning(|_| Ok(None));

        let state = inspect_target(&runtime, &target, &test_source_root().join("zsh/.zshrc"));
        assert_eq!(state.unwrap(), TargetState::Missing);
    }

    #[test]
    fn test_inspect_regular_file() {
        let mut runtime = MockRuntime::new();
        let target = test_home().join(".zshrc");
        runtime
            .expect_file_kind()
            .returning(|_| Ok(Some(FileKind::File)));

        let state = inspect_target(&runtime, &target, &test_source_root().join("zsh/.zshrc"));
        assert_eq!(state.unwrap(), TargetState::Occupied(FileKind::File));
    }

    #[test]
    fn test_inspect_absolute_link_to_source() {
        // Test that a literal absolute link is recognised without further lookups

        let mut runtime = MockRuntime::new();
        let target = test_home().join(".zshrc");
        let source = test_source_root().join("zsh/.zshrc");

        runtime
            .expect_file_kind()
            .returning(|_| Ok(Some(FileKind::Symlink)));
        let dest = source.clone();
        runtime
            .expect_read_link()
            .with(eq(target.clone()))
            .returning(move |_| Ok(dest.clone()));
        runtime.expect_resolve_link().never();

        assert_eq!(
            inspect_target(&runtime, &target, &source).unwrap(),
            TargetState::Linked
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_points_to_relative_link() {
        // Test that a relative stored destination resolving to the source matches

        let mut runtime = MockRuntime::new();
        let link = PathBuf::from("/home/user/.zshrc");
        let source = PathBuf::from("/home/user/dotfiles/zsh/.zshrc");

        runtime
            .expect_read_link()
            .returning(|_| Ok(PathBuf::from("dotfiles/zsh/.zshrc")));
        runtime
            .expect_resolve_link()
            .returning(|_| Ok(PathBuf::from("/home/user/dotfiles/zsh/.zshrc")));

        assert!(points_to(&runtime, &link, &source).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_points_to_canonical_parent() {
        // Test that /tmp vs /private/tmp style aliases still match

        let mut runtime = MockRuntime::new();
        let link = PathBuf::from("/tmp/target/.zshrc");
        let source = PathBuf::from("/tmp/src/zsh/.zshrc");

        runtime
            .expect_read_link()
            .returning(|_| Ok(PathBuf::from("/private/tmp/src/zsh/.zshrc")));
        runtime
            .expect_resolve_link()
            .returning(|_| Ok(PathBuf::from("/private/tmp/src/zsh/.zshrc")));
        runtime
            .expect_canonicalize()
            .with(eq(PathBuf::from("/private/tmp/src/zsh")))
            .returning(|p| Ok(p.to_path_buf()));
        runtime
            .expect_canonicalize()
            .with(eq(PathBuf::from("/tmp/src/zsh")))
            .returning(|_| Ok(PathBuf::from("/private/tmp/src/zsh")));

        assert!(points_to(&runtime, &link, &source).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_inspect_foreign_link() {
        let mut runtime = MockRuntime::new();
        let target = PathBuf::from("/home/user/.zshrc");
        let source = PathBuf::from("/home/user/dotfiles/zsh/.zshrc");

        runtime
            .expect_file_kind()
            .returning(|_| Ok(Some(FileKind::Symlink)));
        runtime
            .expect_read_link()
            .returning(|_| Ok(PathBuf::from("/etc/zshrc")));
        runtime
            .expect_resolve_link()
            .returning(|_| Ok(PathBuf::from("/etc/zshrc")));
        runtime
            .expect_canonicalize()
            .returning(|p| Ok(p.to_path_buf()));

        assert_eq!(
            inspect_target(&runtime, &target, &source).unwrap(),
            TargetState::ForeignLink(PathBuf::from("/etc/zshrc"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_points_to_tolerates_separator_artifacts() {
        // Test that `./`, doubled and trailing separators in stored targets still match

        use crate::runtime::RealRuntime;
        use std::os::unix::fs::symlink;

        // --- Setup Paths ---
        let dir = tempfile::tempdir().unwrap();
        let package = dir.path().join("source/zsh");
        let home = dir.path().join("home");
        std::fs::create_dir_all(&package).unwrap();
        std::fs::create_dir_all(&home).unwrap();
        let source = package.join(".zshrc");
        std::fs::write(&source, "export ZSH=1").unwrap();

        let stored = [
            format!("{}/./.zshrc", package.display()),
            format!("{}/", source.display()),
            format!("{}//.zshrc", package.display()),
            "../source/./zsh/.zshrc/".to_string(),
        ];

        // --- Execute & Verify ---
        for (i, dest) in stored.iter().enumerate() {
            let link = home.join(format!("link{}", i));
            symlink(dest, &link).unwrap();
            assert!(
                points_to(&RealRuntime, &link, &source).unwrap(),
                "stored target {:?} should match",
                dest
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_points_to_unreadable_link_is_error() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_link()
            .returning(|_| Err(anyhow::anyhow!("Permission denied")));

        let result = points_to(
            &runtime,
            Path::new("/home/user/.zshrc"),
            Path::new("/home/user/dotfiles/zsh/.zshrc"),
        );
        assert!(matches!(result, Err(GslkError::Io { .. })));
    }
}
