use anyhow::{Context, Result};
use log::debug;
use std::path::{Component, Path, PathBuf};

use crate::runtime::{Runtime, resolve_relative_path};

/// Behaviour toggles for a single engine invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Perform every check but skip filesystem mutations.
    pub dry_run: bool,
    /// Report skipped entries as well as mutations.
    pub verbose: bool,
    /// Remove emptied ancestor directories together with their contents.
    pub force: bool,
}

/// Resolved configuration handed to [`crate::engine::Engine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Absolute directory whose subdirectories are packages.
    pub source_dir: PathBuf,
    /// Absolute directory receiving the links.
    pub target_dir: PathBuf,
    pub options: Options,
}

impl Config {
    /// Build a configuration from directories that are already absolute.
    pub fn new(source_dir: PathBuf, target_dir: PathBuf, options: Options) -> Self {
        Self {
            source_dir,
            target_dir,
            options,
        }
    }

    /// Build a configuration from user-supplied directories, expanding `~`
    /// and resolving relative paths against the current directory.
    pub fn resolve<R: Runtime>(
        runtime: &R,
        source_dir: &Path,
        target_dir: &Path,
        options: Options,
    ) -> Result<Self> {
        let cwd = runtime.current_dir()?;
        let source_dir = absolutize(runtime, &cwd, source_dir)
            .with_context(|| format!("Invalid source directory {:?}", source_dir))?;
        let target_dir = absolutize(runtime, &cwd, target_dir)
            .with_context(|| format!("Invalid target directory {:?}", target_dir))?;
        debug!(
            "Resolved source {:?} and target {:?} (options: {:?})",
            source_dir, target_dir, options
        );
        Ok(Self::new(source_dir, target_dir, options))
    }
}

fn absolutize<R: Runtime>(runtime: &R, cwd: &Path, path: &Path) -> Result<PathBuf> {
    let expanded = expand_tilde(runtime, path)?;
    Ok(resolve_relative_path(cwd, &expanded))
}

/// Replace a leading `~` component with the home directory.
fn expand_tilde<R: Runtime>(runtime: &R, path: &Path) -> Result<PathBuf> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => {
            let home = runtime
                .home_dir()
                .context("Cannot expand '~': home directory is unknown")?;
            Ok(home.join(components.as_path()))
        }
        _ => Ok(path.to_path_buf()),
    }
}
