use anyhow::Result;
use log::info;

use crate::{
    config::Config,
    engine::{Engine, LinkReport, UnlinkReport},
    runtime::Runtime,
};

/// The operation selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Link,
    Unlink,
    /// Unlink then link; linking is skipped when unlinking fails.
    Relink,
}

impl Action {
    fn verb(self) -> &'static str {
        match self {
            Action::Link => "Linking",
            Action::Unlink => "Unlinking",
            Action::Relink => "Relinking",
        }
    }
}

/// Run `action` for `packages` and print a summary.
#[tracing::instrument(skip(runtime, config))]
pub fn run<R: Runtime>(
    runtime: &R,
    action: Action,
    config: &Config,
    packages: &[String],
) -> Result<()> {
    info!(
        "{} {} from {:?} into {:?}",
        action.verb(),
        packages.join(", "),
        config.source_dir,
        config.target_dir
    );
    if config.options.dry_run {
        println!("Dry run: no changes will be made");
    }

    let engine = Engine::new(runtime, config);
    match action {
        Action::Link => {
            let report = engine.link(packages)?;
            print_link_summary(&report);
        }
        Action::Unlink => {
            let report = engine.unlink(packages)?;
            print_unlink_summary(&report);
        }
        Action::Relink => {
            let (unlinked, linked) = engine.relink(packages)?;
            print_unlink_summary(&unlinked);
            print_link_summary(&linked);
        }
    }
    Ok(())
}

fn print_link_summary(report: &LinkReport) {
    println!(
        "Linked {} file(s), {} already linked, {} dir(s) created",
        report.linked.len(),
        report.already_linked.len(),
        report.created_dirs.len()
    );
}

fn print_unlink_summary(report: &UnlinkReport) {
    println!(
        "Unlinked {} file(s), pruned {} dir(s)",
        report.removed.len(),
        report.pruned_dirs.len()
    );
    let skipped = report.skipped_foreign.len() + report.skipped_not_symlink.len();
    if skipped > 0 {
        println!("Left {} path(s) not linked by gslk untouched", skipped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::error::GslkError;
    use crate::runtime::{MockRuntime, RealRuntime};
    use crate::test_utils::{Fixture, test_home, test_source_root};
    use std::fs;

    #[test]
    fn test_run_propagates_missing_source() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_dir()
            .returning(|_| Err(anyhow::anyhow!("No such file or directory")));
        let config = Config::new(test_source_root(), test_home(), Options::default());

        let err = run(&runtime, Action::Link, &config, &["zsh".to_string()]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GslkError>(),
            Some(GslkError::SourceNotFound { .. })
        ));
    }

    #[cfg_attr(
        gslk_skip_cross_windows_tests,
        ignore = "cross windows tests disabled; set GSLK_RUN_CROSS_WINDOWS_TESTS=1 to enable"
    )]
    #[test]
    fn test_run_relink_restores_links() {
        let fx = Fixture::new(Options::default());
        fx.file("zsh", ".zshrc", "export ZSH=1");
        let packages = vec!["zsh".to_string()];

        run(&RealRuntime, Action::Link, &fx.config, &packages).unwrap();
        run(&RealRuntime, Action::Relink, &fx.config, &packages).unwrap();

        assert_eq!(
            fs::read_link(fx.target(".zshrc")).unwrap(),
            fx.source("zsh", ".zshrc")
        );
    }

    #[test]
    fn test_run_relink_reports_conflict_on_regular_file() {
        // Test that unlink skips a regular file and link then refuses to replace it
        let fx = Fixture::new(Options::default());
        fx.file("git", ".gitconfig", "[user]\n");
        fs::write(fx.target(".gitconfig"), "mine").unwrap();

        let err = run(
            &RealRuntime,
            Action::Relink,
            &fx.config,
            &["git".to_string()],
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GslkError>(),
            Some(GslkError::Conflict { .. })
        ));
        assert_eq!(fs::read_to_string(fx.target(".gitconfig")).unwrap(), "mine");
    }
}
