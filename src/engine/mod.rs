//! Link and unlink engine.
//!
//! [`Engine`] resolves requested packages through the [`Catalog`], loads their
//! ignore rules, plans their paths and then applies the plan to the target
//! tree. Packages are processed strictly in the order given; the first error
//! aborts the remaining work and already-applied changes stay in place.
//!
//! - `status` - whether a target path already holds our link
//! - `link` - creates directories and symlinks
//! - `unlink` - removes our symlinks, prunes emptied directories, verifies

mod link;
mod status;
mod unlink;

use log::debug;
use std::fmt;

pub use link::LinkReport;
pub use status::{TargetState, inspect_target, points_to};
pub use unlink::UnlinkReport;

use crate::config::Config;
use crate::error::Result;
use crate::package::{Catalog, IgnoreRules, Package, PathEntry, plan};
use crate::runtime::Runtime;

/// Runs link operations against one source and target directory.
pub struct Engine<'a, R: Runtime> {
    runtime: &'a R,
    config: &'a Config,
}

impl<'a, R: Runtime> Engine<'a, R> {
    pub fn new(runtime: &'a R, config: &'a Config) -> Self {
        Self { runtime, config }
    }

    /// Unlink then link `names`. Linking is not attempted if unlinking fails.
    pub fn relink<S: AsRef<str>>(&self, names: &[S]) -> Result<(UnlinkReport, LinkReport)> {
        let unlinked = self.unlink(names)?;
        let linked = self.link(names)?;
        Ok((unlinked, linked))
    }

    fn catalog(&self) -> Result<Catalog> {
        Catalog::discover(self.runtime, &self.config.source_dir)
    }

    /// Resolve `name` and plan its entries against the target directory.
    fn prepare(
        &self,
        catalog: &Catalog,
        name: &str,
    ) -> Result<(Package, IgnoreRules, Vec<PathEntry>)> {
        let package = catalog.get(name)?.clone();
        let rules = IgnoreRules::load(self.runtime, &package)?;
        let entries = plan(self.runtime, &package, &self.config.target_dir, &rules)?;
        debug!(
            "Package {} has {} ignore pattern(s) and {} planned entries",
            package.name,
            rules.patterns().len(),
            entries.len()
        );
        Ok((package, rules, entries))
    }

    /// Report a filesystem mutation (or what would happen in dry-run).
    fn announce(&self, message: fmt::Arguments<'_>) {
        if self.config.options.dry_run {
            println!("[dry-run] {}", message);
        } else {
            println!("{}", message);
        }
    }

    /// Report a non-mutating decision, only in verbose mode.
    fn detail(&self, message: fmt::Arguments<'_>) {
        if self.config.options.verbose {
            println!("{}", message);
        }
    }
}
