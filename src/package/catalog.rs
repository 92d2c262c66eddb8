use log::debug;
use std::path::{Path, PathBuf};

use super::Package;
use crate::error::{GslkError, Result};
use crate::runtime::{FileKind, Runtime};

/// Packages available under a source root, sorted by name.
#[derive(Debug, Clone)]
pub struct Catalog {
    source_dir: PathBuf,
    packages: Vec<Package>,
}

impl Catalog {
    /// Scan `source_dir` for packages.
    ///
    /// Directory structure: `<source_dir>/<package>/...`. Only real
    /// directories count; files and symlinks at the top level are ignored.
    #[tracing::instrument(skip(runtime))]
    pub fn discover<R: Runtime>(runtime: &R, source_dir: &Path) -> Result<Self> {
        let entries = runtime
            .read_dir(source_dir)
            .map_err(|e| GslkError::SourceNotFound {
                path: source_dir.to_path_buf(),
                source: e.into(),
            })?;

        let mut packages = Vec::new();
        for entry in entries {
            let kind = runtime
                .file_kind(&entry)
                .map_err(|e| GslkError::io("inspect", &entry, e))?;
            if kind != Some(FileKind::Dir) {
                continue;
            }
            match entry.file_name().and_then(|n| n.to_str()) {
                Some(name) => packages.push(Package::new(name, entry.clone())),
                None => debug!("Skipping package directory with non UTF-8 name {:?}", entry),
            }
        }

        if packages.is_empty() {
            return Err(GslkError::EmptyCatalog {
                path: source_dir.to_path_buf(),
            });
        }

        packages.sort_by(|a, b| a.name.cmp(&b.name));
        debug!("Found {} package(s) in {:?}", packages.len(), source_dir);

        Ok(Self {
            source_dir: source_dir.to_path_buf(),
            packages,
        })
    }

    /// Look up a package by name.
    pub fn get(&self, name: &str) -> Result<&Package> {
        self.packages
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| GslkError::PackageNotFound {
                name: name.to_string(),
                source_dir: self.source_dir.clone(),
            })
    }
}
