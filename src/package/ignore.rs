//! Per-package ignore rules.
//!
//! Each package may carry a `.gslk-ignore` file at its root: one glob pattern
//! per line, blank lines and `#` comments skipped. A relative path is ignored
//! when any pattern matches the whole path, or, for patterns without a `/`,
//! its final component.
//!
//! Patterns use the classic shell dialect: `[^...]` negates a class like
//! `[!...]`, and a run of `*` is a single `*` that never crosses a `/`.

use glob::{MatchOptions, Pattern};
use log::{debug, warn};
use std::path::{Component, Path};

use super::Package;
use crate::error::{GslkError, Result};
use crate::runtime::Runtime;

/// Name of the ignore file inside a package.
pub const IGNORE_FILE_NAME: &str = ".gslk-ignore";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct Rule {
    raw: String,
    pattern: Pattern,
    basename_fallback: bool,
}

/// Compiled ignore patterns of one package.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    patterns: Vec<String>,
    rules: Vec<Rule>,
}

impl IgnoreRules {
    /// Load the ignore file of `package`. A missing file yields no rules.
    #[tracing::instrument(skip(runtime, package), fields(package = %package.name))]
    pub fn load<R: Runtime>(runtime: &R, package: &Package) -> Result<Self> {
        let path = package.path.join(IGNORE_FILE_NAME);
        if !runtime.exists(&path) {
            debug!("No ignore file for package {}", package.name);
            return Ok(Self::default());
        }

        let content = runtime
            .read_to_string(&path)
            .map_err(|e| GslkError::io("read ignore file", &path, e))?;
        Ok(Self::parse(&content))
    }

    /// Build rules from ignore file content.
    pub fn parse(content: &str) -> Self {
        let patterns: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        Self::from_patterns(patterns)
    }

    /// Compile `patterns`; malformed ones are reported and never match.
    pub fn from_patterns(patterns: Vec<String>) -> Self {
        let rules = patterns
            .iter()
            .filter_map(|raw| match Pattern::new(&shell_dialect(raw)) {
                Ok(pattern) => Some(Rule {
                    raw: raw.clone(),
                    pattern,
                    basename_fallback: !raw.contains('/'),
                }),
                Err(e) => {
                    warn!("Invalid pattern '{}' in {}: {}", raw, IGNORE_FILE_NAME, e);
                    None
                }
            })
            .collect();
        Self { patterns, rules }
    }

    /// Patterns in file order, including malformed ones.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether `relative` (a path inside the package) is excluded.
    pub fn is_ignored(&self, relative: &Path) -> bool {
        match self.matching_pattern(relative) {
            Some(pattern) => {
                debug!("Ignoring {:?} (matches pattern '{}')", relative, pattern);
                true
            }
            None => false,
        }
    }

    /// The first pattern that excludes `relative`, if any.
    fn matching_pattern(&self, relative: &Path) -> Option<&str> {
        let full = slash_path(relative);
        let basename = relative.file_name().and_then(|n| n.to_str());

        self.rules
            .iter()
            .find(|rule| {
                rule.pattern.matches_with(&full, MATCH_OPTIONS)
                    || (rule.basename_fallback
                        && basename.is_some_and(|b| rule.pattern.matches_with(b, MATCH_OPTIONS)))
            })
            .map(|rule| rule.raw.as_str())
    }
}

/// Rewrite `raw` into the dialect understood by [`glob::Pattern`].
///
/// `[^` opens a negated class and `**` collapses to `*`. Class contents are
/// copied untouched; a `]` right after the opener is a member, not the end.
fn shell_dialect(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '[' => {
                out.push('[');
                if matches!(chars.peek(), Some(&'^') | Some(&'!')) {
                    chars.next();
                    out.push('!');
                }
                if chars.peek() == Some(&']') {
                    chars.next();
                    out.push(']');
                }
                for member in chars.by_ref() {
                    out.push(member);
                    if member == ']' {
                        break;
                    }
                }
            }
            '*' => {
                out.push('*');
                while chars.peek() == Some(&'*') {
                    chars.next();
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Render a relative path with `/` separators regardless of platform.
fn slash_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use crate::test_utils::test_source_root;
    use mockall::predicate::eq;

    fn rules(patterns: &[&str]) -> IgnoreRules {
        IgnoreRules::from_patterns(patterns.iter().map(|p| p.to_string()).collect())
    }

    #[test]
    fn test_parse_skips_blank_and_comments() {
        let content = "# editor files\n\n*.swp\n   \n  logs  \n#tmp\n";
        let rules = IgnoreRules::parse(content);
        assert_eq!(rules.patterns(), &["*.swp".to_string(), "logs".to_string()]);
    }

    #[test]
    fn test_full_path_match() {
        let rules = rules(&["pattern/specific_file.dat"]);
        assert!(rules.is_ignored(Path::new("pattern/specific_file.dat")));
        assert!(!rules.is_ignored(Path::new("pattern/another_file.txt")));
        // Patterns with a separator never fall back to the basename
        assert!(!rules.is_ignored(Path::new("other/pattern/specific_file.dat")));
    }

    #[test]
    fn test_basename_fallback() {
        let rules = rules(&["secrets.yml"]);
        assert!(rules.is_ignored(Path::new("secrets.yml")));
        assert!(rules.is_ignored(Path::new("config/secrets.yml")));
        assert!(rules.is_ignored(Path::new("a/b/c/secrets.yml")));
        assert!(!rules.is_ignored(Path::new("config/secrets.yml.bak")));
    }

    #[test]
    fn test_wildcard_does_not_cross_separator() {
        let rules = rules(&["config/*.yml"]);
        assert!(rules.is_ignored(Path::new("config/app.yml")));
        assert!(!rules.is_ignored(Path::new("config/nested/app.yml")));
    }

    #[test]
    fn test_extension_pattern_matches_anywhere() {
        let rules = rules(&["*.tmp"]);
        assert!(rules.is_ignored(Path::new("a.tmp")));
        assert!(rules.is_ignored(Path::new("deep/dir/b.tmp")));
        assert!(!rules.is_ignored(Path::new("a.txt")));
    }

    #[test]
    fn test_star_matches_leading_dot() {
        let rules = rules(&["*rc"]);
        assert!(rules.is_ignored(Path::new(".zshrc")));
    }

    #[test]
    fn test_malformed_pattern_is_skipped() {
        let rules = rules(&["[unclosed", "*.log"]);
        assert_eq!(rules.patterns().len(), 2);
        assert!(!rules.is_ignored(Path::new("[unclosed")));
        assert!(rules.is_ignored(Path::new("debug.log")));
    }

    #[test]
    fn test_matching_pattern_reports_first_match() {
        let rules = rules(&["*.md", "README.md"]);
        assert_eq!(rules.matching_pattern(Path::new("README.md")), Some("*.md"));
        assert_eq!(rules.matching_pattern(Path::new("main.rs")), None);
    }

    #[test]
    fn test_caret_negates_class() {
        let rules = rules(&["[^.]*.md"]);
        assert!(rules.is_ignored(Path::new("readme.md")));
        assert!(rules.is_ignored(Path::new("docs/guide.md")));
        assert!(!rules.is_ignored(Path::new(".hidden.md")));
        assert!(!rules.is_ignored(Path::new("^readme.txt")));
    }

    #[test]
    fn test_double_star_is_single_star() {
        let rules = rules(&["a**", "cache/**"]);
        assert!(rules.is_ignored(Path::new("abc")));
        assert!(rules.is_ignored(Path::new("lib/abc")));
        assert!(rules.is_ignored(Path::new("cache/index")));
        // Still one path component only
        assert!(!rules.is_ignored(Path::new("cache/deep/index")));
    }

    #[test]
    fn test_shell_dialect_rewrites() {
        assert_eq!(shell_dialect("[^x]*.md"), "[!x]*.md");
        assert_eq!(shell_dialect("a**b"), "a*b");
        assert_eq!(shell_dialect("[]^*]"), "[]^*]");
        assert_eq!(shell_dialect("[^]]x"), "[!]]x");
        assert_eq!(shell_dialect("plain.txt"), "plain.txt");
    }

    #[test]
    fn test_matching_pattern_reports_original_text() {
        let rules = rules(&["[^x]*.log"]);
        assert_eq!(rules.matching_pattern(Path::new("debug.log")), Some("[^x]*.log"));
    }

    #[test]
    fn test_load_missing_file() {
        let mut runtime = MockRuntime::new();
        let package = Package::new("zsh", test_source_root().join("zsh"));

        runtime
            .expect_exists()
            .with(eq(package.path.join(IGNORE_FILE_NAME)))
            .returning(|_| false);

        let rules = IgnoreRules::load(&runtime, &package).unwrap();
        assert!(rules.patterns().is_empty());
    }

    #[test]
    fn test_load_reads_patterns() {
        let mut runtime = MockRuntime::new();
        let package = Package::new("zsh", test_source_root().join("zsh"));
        let ignore_path = package.path.join(IGNORE_FILE_NAME);

        runtime
            .expect_exists()
            .with(eq(ignore_path.clone()))
            .returning(|_| true);
        runtime
            .expect_read_to_string()
            .with(eq(ignore_path))
            .returning(|_| Ok("*.tmp\n# comment\nlogs\n".to_string()));

        let rules = IgnoreRules::load(&runtime, &package).unwrap();
        assert_eq!(rules.patterns(), &["*.tmp".to_string(), "logs".to_string()]);
    }

    #[test]
    fn test_load_read_failure() {
        let mut runtime = MockRuntime::new();
        let package = Package::new("zsh", test_source_root().join("zsh"));

        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_read_to_string()
            .returning(|_| Err(anyhow::anyhow!("Permission denied")));

        let err = IgnoreRules::load(&runtime, &package).unwrap_err();
        assert!(matches!(err, GslkError::Io { .. }));
    }
}
