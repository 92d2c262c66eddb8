use log::{debug, info};
use std::path::PathBuf;

use super::{Engine, TargetState, inspect_target};
use crate::error::{GslkError, Result};
use crate::package::PathEntry;
use crate::runtime::{FileKind, Runtime, normalize_path};

/// Outcome of a link operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// Target directories that did not exist before.
    pub created_dirs: Vec<PathBuf>,
    /// Symlinks created.
    pub linked: Vec<PathBuf>,
    /// Targets that already held the expected symlink.
    pub already_linked: Vec<PathBuf>,
}

impl<R: Runtime> Engine<'_, R> {
    /// Link every package in `names`, in order.
    ///
    /// Directories are materialised as real directories; only files become
    /// symlinks, each pointing to the absolute source path. An existing
    /// correct link is left alone. Anything else at a target path is a
    /// conflict that stops the whole operation.
    pub fn link<S: AsRef<str>>(&self, names: &[S]) -> Result<LinkReport> {
        let catalog = self.catalog()?;
        let mut report = LinkReport::default();

        for name in names {
            let (package, rules, entries) = self.prepare(&catalog, name.as_ref())?;
            println!(
                "Loaded {} ignore pattern(s) for package {}",
                rules.patterns().len(),
                package.name
            );
            info!("Linking package {} from {:?}", package.name, package.path);

            for entry in &entries {
                if entry.is_dir {
                    self.link_dir(entry, &mut report)?;
                } else {
                    self.link_file(entry, &mut report)?;
                }
            }
        }

        Ok(report)
    }

    fn link_dir(&self, entry: &PathEntry, report: &mut LinkReport) -> Result<()> {
        let target = &entry.target;
        let kind = self
            .runtime
            .file_kind(target)
            .map_err(|e| GslkError::io("inspect", target, e))?;

        match kind {
            Some(FileKind::Dir) => {
                debug!("Directory {:?} already exists", target);
            }
            Some(FileKind::Symlink) if self.runtime.is_dir(target) => {
                debug!("Directory {:?} is a symlink to a directory, using it", target);
            }
            Some(_) => {
                return Err(GslkError::Conflict {
                    path: target.clone(),
                });
            }
            None => {
                self.announce(format_args!("Creating directory {}", target.display()));
                if !self.config.options.dry_run {
                    self.runtime
                        .create_dir_all(target)
                        .map_err(|e| GslkError::io("create directory", target, e))?;
                }
                report.created_dirs.push(target.clone());
            }
        }
        Ok(())
    }

    fn link_file(&self, entry: &PathEntry, report: &mut LinkReport) -> Result<()> {
        let target = &entry.target;
        let source = normalize_path(&entry.source);

        match inspect_target(self.runtime, target, &source)? {
            TargetState::Linked => {
                self.detail(format_args!(
                    "Skipping already linked: {} -> {}",
                    target.display(),
                    source.display()
                ));
                report.already_linked.push(target.clone());
            }
            TargetState::ForeignLink(dest) => {
                debug!("{:?} links to {:?}, expected {:?}", target, dest, source);
                return Err(GslkError::Conflict {
                    path: target.clone(),
                });
            }
            TargetState::Occupied(kind) => {
                debug!("{:?} is occupied by a {:?}", target, kind);
                return Err(GslkError::Conflict {
                    path: target.clone(),
                });
            }
            TargetState::Missing => {
                self.announce(format_args!(
                    "Linking {} -> {}",
                    target.display(),
                    source.display()
                ));
                if !self.config.options.dry_run {
                    if let Some(parent) = target.parent() {
                        self.runtime
                            .create_dir_all(parent)
                            .map_err(|e| GslkError::io("create directory", parent, e))?;
                    }
                    self.runtime
                        .symlink(&source, target)
                        .map_err(|e| GslkError::io("create symlink", target, e))?;
                }
                report.linked.push(target.clone());
            }
        }
        Ok(())
    }
}
