//! `.gitignore`-style filtering for the search helpers.

use std::fs;
use std::path::{Component, Path, PathBuf};

use glob::Pattern;

const MAX_ANCESTORS: usize = 20;
const ALWAYS_IGNORED: [&str; 2] = [".git", "node_modules"];

#[derive(Debug)]
pub(crate) struct IgnoreRules {
    base: PathBuf,
    canonical_base: PathBuf,
    /// `/x` lines, anchored to the directory holding the `.gitignore`.
    anchored: Vec<(PathBuf, Pattern)>,
    anywhere: Vec<Pattern>,
}

impl IgnoreRules {
    /// Collects rules from `base` and up to 20 of its ancestors.
    pub(crate) fn load(base: &Path) -> Self {
        let canonical_base = fs::canonicalize(base).unwrap_or_else(|_| base.to_path_buf());
        let mut rules = Self {
            base: base.to_path_buf(),
            canonical_base: canonical_base.clone(),
            anchored: Vec::new(),
            anywhere: ALWAYS_IGNORED
                .iter()
                .filter_map(|p| Pattern::new(p).ok())
                .collect(),
        };

        let mut current = Some(canonical_base.as_path());
        for _ in 0..MAX_ANCESTORS {
            let Some(dir) = current else { break };
            if let Ok(body) = fs::read_to_string(dir.join(".gitignore")) {
                rules.add_file(dir, &body);
            }
            current = dir.parent();
        }
        rules
    }

    fn add_file(&mut self, dir: &Path, body: &str) {
        for raw in body.lines() {
            let line = raw.trim();
            // Negations are not supported.
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let line = line.trim_end_matches('/');
            let (anchored, text) = match line.strip_prefix('/') {
                Some(rest) => (true, rest),
                None => (false, line.strip_prefix("**/").unwrap_or(line)),
            };
            let pattern = match Pattern::new(text) {
                Ok(p) => p,
                Err(e) => {
                    tracing::debug!(pattern = %line, error = %e, "skipping gitignore line");
                    continue;
                }
            };
            if anchored {
                self.anchored.push((dir.to_path_buf(), pattern));
            } else {
                self.anywhere.push(pattern);
            }
        }
    }

    /// Path relative to the search base, or the path itself when outside it.
    pub(crate) fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.base).unwrap_or(path)
    }

    pub(crate) fn is_ignored(&self, path: &Path) -> bool {
        let rel = self.relative(path);
        for pat in &self.anywhere {
            if pat.matches_path(rel) || names(rel).any(|n| pat.matches(n)) {
                return true;
            }
        }
        let abs = self.canonical_base.join(rel);
        self.anchored.iter().any(|(dir, pat)| {
            abs.strip_prefix(dir)
                .map(|r| {
                    r.ancestors()
                        .filter(|a| !a.as_os_str().is_empty())
                        .any(|a| pat.matches_path(a))
                })
                .unwrap_or(false)
        })
    }

    /// True when any component below the base starts with `.`.
    pub(crate) fn is_hidden(&self, path: &Path) -> bool {
        names(self.relative(path)).any(|n| n.starts_with('.'))
    }
}

fn names(path: &Path) -> impl Iterator<Item = &str> {
    path.components().filter_map(|c| match c {
        Component::Normal(s) => s.to_str(),
        _ => None,
    })
}
