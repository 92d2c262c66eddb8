use anyhow::Result;
use clap::Parser;
use gslk::commands::{Action, run};
use gslk::config::{Config, Options};
use gslk::runtime::RealRuntime;
use std::path::PathBuf;

/// gslk - symlink package linker
///
/// Every subdirectory of the source directory is a package. Linking a package
/// mirrors its directory tree into the target directory and symlinks each file
/// back to the package. Paths matching a pattern in the package's
/// `.gslk-ignore` file are left out.
///
/// Examples:
///   gslk link -s ~/dotfiles -t ~ zsh git     # Link two packages into $HOME
///   gslk unlink -s ~/dotfiles -t ~ zsh       # Remove the links again
#[derive(Parser, Debug)]
#[command(author, version = env!("GSLK_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Create symlinks for the given packages
    Link(PackageArgs),

    /// Remove symlinks created for the given packages
    Unlink(PackageArgs),

    /// Unlink then link the given packages
    Relink(PackageArgs),
}

#[derive(clap::Args, Debug)]
pub struct PackageArgs {
    /// Directory containing the packages (also via GSLK_SOURCE)
    #[arg(long = "source", short = 's', env = "GSLK_SOURCE", value_name = "DIR")]
    pub source: PathBuf,

    /// Directory receiving the links (also via GSLK_TARGET)
    #[arg(long = "target", short = 't', env = "GSLK_TARGET", value_name = "DIR")]
    pub target: PathBuf,

    /// Report what would change without touching the filesystem
    #[arg(long = "dry-run", short = 'n')]
    pub dry_run: bool,

    /// Also report skipped entries
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// When unlinking, remove emptied parent directories with all their contents
    #[arg(long, short = 'f')]
    pub force: bool,

    /// Package names, processed in the given order
    #[arg(value_name = "PACKAGE", required = true, num_args = 1..)]
    pub packages: Vec<String>,
}

impl PackageArgs {
    fn options(&self) -> Options {
        Options {
            dry_run: self.dry_run,
            verbose: self.verbose,
            force: self.force,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (action, args) = match cli.command {
        Commands::Link(args) => (Action::Link, args),
        Commands::Unlink(args) => (Action::Unlink, args),
        Commands::Relink(args) => (Action::Relink, args),
    };

    let default_filter = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let runtime = RealRuntime;
    let config = Config::resolve(&runtime, &args.source, &args.target, args.options())?;
    run(&runtime, action, &config, &args.packages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_link_parsing() {
        let cli = Cli::try_parse_from([
            "gslk", "link", "-s", "/src", "-t", "/dst", "zsh", "git",
        ])
        .unwrap();
        match cli.command {
            Commands::Link(args) => {
                assert_eq!(args.source, PathBuf::from("/src"));
                assert_eq!(args.target, PathBuf::from("/dst"));
                assert_eq!(args.packages, vec!["zsh", "git"]);
                assert_eq!(args.options(), Options::default());
            }
            _ => panic!("Expected Link command"),
        }
    }

    #[test]
    fn test_cli_unlink_flags_parsing() {
        let cli = Cli::try_parse_from([
            "gslk",
            "unlink",
            "--source",
            "/src",
            "--target",
            "/dst",
            "--dry-run",
            "-v",
            "--force",
            "zsh",
        ])
        .unwrap();
        match cli.command {
            Commands::Unlink(args) => {
                let options = args.options();
                assert!(options.dry_run);
                assert!(options.verbose);
                assert!(options.force);
            }
            _ => panic!("Expected Unlink command"),
        }
    }

    #[test]
    fn test_cli_relink_parsing() {
        let cli =
            Cli::try_parse_from(["gslk", "relink", "-s", "/src", "-t", "/dst", "nvim"]).unwrap();
        assert!(matches!(cli.command, Commands::Relink(_)));
    }

    #[test]
    fn test_cli_requires_package() {
        let result = Cli::try_parse_from(["gslk", "link", "-s", "/src", "-t", "/dst"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        let result = Cli::try_parse_from(["gslk", "zsh"]);
        assert!(result.is_err());
    }
}
