//! Packages: discovery, ignore rules and path planning.
//!
//! A package is an immediate subdirectory of the source root. Linking a
//! package mirrors its tree into the target directory, so this module answers
//! two questions: which packages exist ([`Catalog`]) and which paths of a
//! package take part ([`IgnoreRules`] + [`plan`]).

mod catalog;
mod ignore;
mod plan;

use std::path::PathBuf;

pub use catalog::Catalog;
pub use ignore::{IGNORE_FILE_NAME, IgnoreRules};
pub use plan::{PathEntry, plan};

/// A directory of files to be linked, identified by its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    /// Absolute path of the package directory.
    pub path: PathBuf,
}

impl Package {
    pub fn new(name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            path,
        }
    }
}
