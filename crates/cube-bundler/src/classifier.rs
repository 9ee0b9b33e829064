//! Ignore/skip routing for files found by the walker.
//!
//! Rules come from the `ignore` and `skip` lists of the config and from an
//! optional `.cubeignore` file at the project root:
//!
//! ```text
//! # lines before any section are ignore rules
//! *.log
//!
//! [ignore]
//! /tmp
//!
//! [skip]
//! /static/**/*.min.js
//! ```
//!
//! Patterns use gitignore syntax and are matched against root-relative paths.

use std::path::{Path, PathBuf};

use cube_config::CubeConfig;
use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::{BuildError, Runtime};

pub const IGNORE_FILE: &str = ".cubeignore";

/// Always ignored, whatever the project rules say.
const DEFAULT_IGNORE: &[&str] = &[".git", ".svn", ".DS_Store"];

/// Routing decision for one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    /// Leave the file out of the build entirely.
    pub ignore: bool,
    /// Copy the file byte for byte instead of transforming it.
    pub skip: bool,
}

pub trait FileClassifier: Send + Sync {
    /// Classify a root-relative path such as `/src/app.js`.
    fn classify(&self, rel_path: &str) -> Classification;
}

/// Gitignore-backed classifier.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    ignore: Gitignore,
    skip: Gitignore,
}

impl IgnoreRules {
    /// Build rules rooted at `root` from explicit pattern lists.
    pub fn new<I, S>(root: &Path, ignore: I, skip: S) -> Result<Self, BuildError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        let mut ignore_builder = GitignoreBuilder::new(root);
        for pattern in DEFAULT_IGNORE {
            add_rule(&mut ignore_builder, pattern)?;
        }
        for pattern in ignore {
            add_rule(&mut ignore_builder, pattern.as_ref())?;
        }

        let mut skip_builder = GitignoreBuilder::new(root);
        for pattern in skip {
            add_rule(&mut skip_builder, pattern.as_ref())?;
        }

        Ok(Self {
            ignore: build(ignore_builder)?,
            skip: build(skip_builder)?,
        })
    }

    /// Load rules for a project: config lists plus `.cubeignore`, if present.
    pub async fn load(config: &CubeConfig, runtime: &dyn Runtime) -> Result<Self, BuildError> {
        let mut ignore = config.ignore.clone();
        let mut skip = config.skip.clone();

        let path: PathBuf = config.root.join(IGNORE_FILE);
        if runtime.exists(&path) {
            let bytes = runtime
                .read_file(&path)
                .await
                .map_err(|source| BuildError::Walk {
                    path: path.clone(),
                    source,
                })?;
            let (file_ignore, file_skip) = parse_ignore_file(&String::from_utf8_lossy(&bytes));
            tracing::debug!(
                "{}: {} ignore rules, {} skip rules",
                IGNORE_FILE,
                file_ignore.len(),
                file_skip.len()
            );
            ignore.extend(file_ignore);
            skip.extend(file_skip);
        }

        Self::new(&config.root, ignore, skip)
    }
}

impl FileClassifier for IgnoreRules {
    fn classify(&self, rel_path: &str) -> Classification {
        let path = rel_path.trim_start_matches('/');
        let ignore = self
            .ignore
            .matched_path_or_any_parents(path, false)
            .is_ignore();
        let skip = !ignore && self.skip.matched_path_or_any_parents(path, false).is_ignore();
        Classification { ignore, skip }
    }
}

/// Split a `.cubeignore` file into (ignore, skip) pattern lists.
pub fn parse_ignore_file(content: &str) -> (Vec<String>, Vec<String>) {
    let mut ignore = Vec::new();
    let mut skip = Vec::new();
    let mut in_skip = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line {
            "[ignore]" => in_skip = false,
            "[skip]" => in_skip = true,
            pattern if in_skip => skip.push(pattern.to_string()),
            pattern => ignore.push(pattern.to_string()),
        }
    }

    (ignore, skip)
}

fn add_rule(builder: &mut GitignoreBuilder, pattern: &str) -> Result<(), BuildError> {
    builder
        .add_line(None, pattern)
        .map(|_| ())
        .map_err(|e| BuildError::InvalidRule {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

fn build(builder: GitignoreBuilder) -> Result<Gitignore, BuildError> {
    builder.build().map_err(|e| BuildError::InvalidRule {
        pattern: String::new(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(ignore: &[&str], skip: &[&str]) -> IgnoreRules {
        IgnoreRules::new(Path::new("/project"), ignore, skip).unwrap()
    }

    #[test]
    fn vcs_metadata_is_always_ignored() {
        let rules = rules(&[], &[]);
        assert!(rules.classify("/.git/HEAD").ignore);
        assert!(rules.classify("/src/.DS_Store").ignore);
        assert_eq!(rules.classify("/src/app.js"), Classification::default());
    }

    #[test]
    fn ignore_wins_over_skip() {
        let rules = rules(&["*.log"], &["*.log", "/static/"]);

        assert_eq!(
            rules.classify("/debug.log"),
            Classification {
                ignore: true,
                skip: false
            }
        );
        assert_eq!(
            rules.classify("/static/lib/jquery.js"),
            Classification {
                ignore: false,
                skip: true
            }
        );
    }

    #[test]
    fn ignore_file_sections_are_split() {
        let (ignore, skip) = parse_ignore_file(
            "# comment\n*.log\n\n[skip]\n/static/\n[ignore]\n/tmp\n",
        );
        assert_eq!(ignore, vec!["*.log", "/tmp"]);
        assert_eq!(skip, vec!["/static/"]);
    }
}
