use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use super::{Engine, TargetState, inspect_target};
use crate::error::{GslkError, Result};
use crate::package::{Catalog, PathEntry};
use crate::runtime::{FileKind, Runtime, is_path_under, normalize_path};

/// Outcome of an unlink operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnlinkReport {
    /// Symlinks removed.
    pub removed: Vec<PathBuf>,
    /// Ancestor directories removed after their last link went away.
    pub pruned_dirs: Vec<PathBuf>,
    /// Symlinks left alone because they point elsewhere.
    pub skipped_foreign: Vec<PathBuf>,
    /// Regular files or directories left alone.
    pub skipped_not_symlink: Vec<PathBuf>,
}

impl<R: Runtime> Engine<'_, R> {
    /// Remove the links of every package in `names`, in order.
    ///
    /// Only symlinks pointing back to the package are removed. After the
    /// last package, every package is planned again and any link still
    /// present is reported as a [`GslkError::Verification`].
    pub fn unlink<S: AsRef<str>>(&self, names: &[S]) -> Result<UnlinkReport> {
        let catalog = self.catalog()?;
        let mut report = UnlinkReport::default();

        for name in names {
            let (package, rules, entries) = self.prepare(&catalog, name.as_ref())?;
            println!(
                "Loaded {} ignore pattern(s) for package {} for unlinking",
                rules.patterns().len(),
                package.name
            );
            info!("Unlinking package {} from {:?}", package.name, package.path);

            for entry in entries.iter().filter(|e| !e.is_dir) {
                self.unlink_file(entry, &mut report)?;
            }
        }

        if self.config.options.dry_run {
            debug!("Dry run, skipping verification");
        } else {
            self.verify(&catalog, names)?;
        }

        Ok(report)
    }

    fn unlink_file(&self, entry: &PathEntry, report: &mut UnlinkReport) -> Result<()> {
        let target = &entry.target;
        let source = normalize_path(&entry.source);

        match inspect_target(self.runtime, target, &source)? {
            TargetState::Missing => {
                debug!("Nothing to unlink at {:?}", target);
            }
            TargetState::Occupied(kind) => {
                warn!(
                    "{} exists but is a {:?}, not a symlink; leaving it in place",
                    target.display(),
                    kind
                );
                report.skipped_not_symlink.push(target.clone());
            }
            TargetState::ForeignLink(dest) => {
                self.detail(format_args!(
                    "Skipping {}: links to {}, not {}",
                    target.display(),
                    dest.display(),
                    source.display()
                ));
                report.skipped_foreign.push(target.clone());
            }
            TargetState::Linked => {
                self.announce(format_args!(
                    "Unlinking {} (link to {})",
                    target.display(),
                    source.display()
                ));
                report.removed.push(target.clone());
                if self.config.options.dry_run {
                    return Ok(());
                }

                self.remove_link(target)?;
                if let Some(parent) = target.parent() {
                    self.prune(parent, report)?;
                }
            }
        }
        Ok(())
    }

    /// Remove the symlink at `target`; a link that vanished meanwhile is fine.
    fn remove_link(&self, target: &Path) -> Result<()> {
        if let Err(e) = self.runtime.remove_symlink(target) {
            let still_there = self
                .runtime
                .file_kind(target)
                .map_err(|e| GslkError::io("inspect", target, e))?
                .is_some();
            if still_there {
                return Err(GslkError::io("remove symlink", target, e));
            }
            debug!("{:?} disappeared before removal: {}", target, e);
        }
        Ok(())
    }

    /// Remove emptied directories from `start` upwards.
    ///
    /// The climb stops at the target root, at the filesystem root, outside
    /// the target root, at a symlinked directory, and (without `force`) at
    /// the first directory that still has entries.
    fn prune(&self, start: &Path, report: &mut UnlinkReport) -> Result<()> {
        let target_dir = &self.config.target_dir;
        let root = self
            .runtime
            .canonicalize(target_dir)
            .map_err(|e| GslkError::io("canonicalize", target_dir, e))?;
        let force = self.config.options.force;

        let mut current = start.to_path_buf();
        loop {
            let kind = self
                .runtime
                .file_kind(&current)
                .map_err(|e| GslkError::io("inspect", &current, e))?;
            if kind != Some(FileKind::Dir) {
                debug!("Stopping prune at {:?}: not a plain directory", current);
                break;
            }

            let canonical = self
                .runtime
                .canonicalize(&current)
                .map_err(|e| GslkError::io("canonicalize", &current, e))?;
            if canonical == root
                || canonical.parent().is_none()
                || !is_path_under(&canonical, &root)
            {
                debug!("Stopping prune at {:?}: boundary reached", current);
                break;
            }

            if force {
                self.announce(format_args!(
                    "Removing directory {} and its contents",
                    current.display()
                ));
                self.runtime
                    .remove_dir_all(&current)
                    .map_err(|e| GslkError::io("remove directory", &current, e))?;
            } else {
                let has_entries = !self
                    .runtime
                    .read_dir(&current)
                    .map_err(|e| GslkError::io("read directory", &current, e))?
                    .is_empty();
                if has_entries {
                    debug!("Keeping non-empty directory {:?}", current);
                    break;
                }
                self.announce(format_args!("Removing empty directory {}", current.display()));
                self.runtime
                    .remove_dir(&current)
                    .map_err(|e| GslkError::io("remove directory", &current, e))?;
            }
            report.pruned_dirs.push(current.clone());

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }
        Ok(())
    }

    /// Plan `names` again and fail if any of our links is still present.
    fn verify<S: AsRef<str>>(&self, catalog: &Catalog, names: &[S]) -> Result<()> {
        let mut residue = Vec::new();
        for name in names {
            let (_, _, entries) = self.prepare(catalog, name.as_ref())?;
            for entry in entries.iter().filter(|e| !e.is_dir) {
                let source = normalize_path(&entry.source);
                if inspect_target(self.runtime, &entry.target, &source)? == TargetState::Linked {
                    residue.push(entry.target.clone());
                }
            }
        }

        if residue.is_empty() {
            debug!("Verified no links remain for {} package(s)", names.len());
            Ok(())
        } else {
            Err(GslkError::Verification { paths: residue })
        }
    }
}
