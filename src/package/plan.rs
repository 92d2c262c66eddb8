//! Path planning: the ordered list of entries a package contributes.

use log::debug;
use std::path::{Path, PathBuf};

use super::{IGNORE_FILE_NAME, IgnoreRules, Package};
use crate::error::{GslkError, Result};
use crate::runtime::{FileKind, Runtime};

/// One node of a package tree after ignore filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    /// Absolute path inside the package.
    pub source: PathBuf,
    /// Where the entry lands in the target tree.
    pub target: PathBuf,
    /// Path relative to the package root (and to the target root).
    pub relative: PathBuf,
    pub is_dir: bool,
}

/// What the planner does with a visited node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    /// Emit the entry; descend into it if it is a directory.
    Emit,
    /// Skip a single file.
    Skip,
    /// Skip a directory and everything below it.
    Prune,
}

fn decide(relative: &Path, is_dir: bool, rules: &IgnoreRules) -> Visit {
    if relative.file_name().is_some_and(|n| n == IGNORE_FILE_NAME) {
        return Visit::Skip;
    }
    if !rules.is_ignored(relative) {
        Visit::Emit
    } else if is_dir {
        Visit::Prune
    } else {
        Visit::Skip
    }
}

/// Walk `package` depth-first and return its entries in pre-order: every
/// directory comes before the entries inside it. Children are visited in
/// name order. Symlinks inside the package are treated as files.
#[tracing::instrument(skip(runtime, package, rules), fields(package = %package.name))]
pub fn plan<R: Runtime>(
    runtime: &R,
    package: &Package,
    target_dir: &Path,
    rules: &IgnoreRules,
) -> Result<Vec<PathEntry>> {
    let mut entries = Vec::new();
    let mut stack = children(runtime, &package.path)?;

    while let Some(source) = stack.pop() {
        let kind = runtime
            .file_kind(&source)
            .map_err(|e| GslkError::walk(&source, e))?;
        let Some(kind) = kind else {
            // Vanished between listing and inspection
            debug!("Skipping {:?}: no longer exists", source);
            continue;
        };
        let is_dir = kind == FileKind::Dir;

        let relative = match source.strip_prefix(&package.path) {
            Ok(rel) => rel.to_path_buf(),
            Err(e) => return Err(GslkError::walk(&source, e.into())),
        };

        match decide(&relative, is_dir, rules) {
            Visit::Skip | Visit::Prune => continue,
            Visit::Emit => {}
        }

        if is_dir {
            stack.extend(children(runtime, &source)?);
        }

        entries.push(PathEntry {
            target: target_dir.join(&relative),
            source,
            relative,
            is_dir,
        });
    }

    debug!("Planned {} entries", entries.len());
    Ok(entries)
}

/// Children of `dir`, ordered so that popping from the end yields name order.
fn children<R: Runtime>(runtime: &R, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut children = runtime
        .read_dir(dir)
        .map_err(|e| GslkError::walk(dir, e))?;
    children.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
    Ok(children)
}
