//! Search helpers: recursive find, single-file grep, recursive grep and glob.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use glob::Pattern;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use serde_json::json;

use crate::error::{PreludeError, Result};
use crate::handle::Prelude;
use crate::ignore::IgnoreRules;
use crate::text::preview;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FindKind {
    #[default]
    File,
    Dir,
    Any,
}

#[derive(Debug, Clone)]
pub struct FindOptions {
    pub kind: FindKind,
    pub limit: usize,
    pub hidden: bool,
    /// Newest first instead of path order.
    pub sort_by_mtime: bool,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            kind: FindKind::File,
            limit: 1000,
            hidden: false,
            sort_by_mtime: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GrepOptions {
    pub ignore_case: bool,
    /// Treat the pattern as plain text.
    pub literal: bool,
    /// Lines of context around each match.
    pub context: usize,
}

#[derive(Debug, Clone)]
pub struct RgrepOptions {
    /// Filename pattern applied at every depth.
    pub glob: String,
    pub ignore_case: bool,
    pub literal: bool,
    pub limit: usize,
    pub hidden: bool,
}

impl Default for RgrepOptions {
    fn default() -> Self {
        Self {
            glob: "*".to_string(),
            ignore_case: false,
            literal: false,
            limit: 100,
            hidden: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrepHit {
    pub path: PathBuf,
    pub line: usize,
    pub text: String,
}

impl Prelude {
    /// Recursive glob below `path`, honouring `.gitignore`.
    pub fn find(&self, pattern: &str, path: impl AsRef<Path>, opts: &FindOptions) -> Result<Vec<PathBuf>> {
        let base = self.resolve(path);
        let rules = IgnoreRules::load(&base);
        let mut matches = Vec::new();
        for m in expand(&base, &format!("**/{pattern}"))? {
            if matches.len() >= opts.limit {
                break;
            }
            if !opts.hidden && rules.is_hidden(&m) {
                continue;
            }
            if rules.is_ignored(&m) {
                continue;
            }
            let keep = match opts.kind {
                FindKind::File => !m.is_dir(),
                FindKind::Dir => m.is_dir(),
                FindKind::Any => true,
            };
            if keep {
                matches.push(m);
            }
        }
        if opts.sort_by_mtime {
            matches.sort_by_cached_key(|m| std::cmp::Reverse(mtime(m)));
        } else {
            matches.sort();
        }
        self.emit(
            "find",
            json!({
                "pattern": pattern,
                "path": base.display().to_string(),
                "count": matches.len(),
                "matches": shown(&matches),
            }),
        );
        Ok(matches)
    }

    /// Greps one file; returns `(line_no, text)` for matches and their context.
    pub fn grep(&self, pattern: &str, path: impl AsRef<Path>, opts: &GrepOptions) -> Result<Vec<(usize, String)>> {
        let p = self.resolve(path);
        let rx = line_matcher(pattern, opts.literal, opts.ignore_case)?;
        let data = fs::read_to_string(&p).map_err(PreludeError::io("grep", &p))?;
        let lines: Vec<&str> = data.lines().collect();

        let matched: Vec<usize> = (0..lines.len()).filter(|&i| rx.is_match(lines[i])).collect();
        let mut keep = vec![false; lines.len()];
        for &i in &matched {
            let lo = i.saturating_sub(opts.context);
            let hi = (i + opts.context).min(lines.len() - 1);
            keep[lo..=hi].iter_mut().for_each(|k| *k = true);
        }
        let hits: Vec<(usize, String)> = keep
            .iter()
            .enumerate()
            .filter(|(_, k)| **k)
            .map(|(i, _)| (i + 1, lines[i].to_string()))
            .collect();

        let shown: Vec<_> = hits
            .iter()
            .take(10)
            .map(|(n, t)| json!({ "line": n, "text": preview(t, 100) }))
            .collect();
        self.emit(
            "grep",
            json!({
                "pattern": pattern,
                "path": p.display().to_string(),
                "count": matched.len(),
                "hits": shown,
            }),
        );
        Ok(hits)
    }

    /// Greps every file below `path` whose name matches `opts.glob`.
    pub fn rgrep(&self, pattern: &str, path: impl AsRef<Path>, opts: &RgrepOptions) -> Result<Vec<GrepHit>> {
        let base = self.resolve(path);
        let rx = line_matcher(pattern, opts.literal, opts.ignore_case)?;
        let mut hits = Vec::new();
        'files: for file in walk_files(&base, &opts.glob, opts.hidden)? {
            if hits.len() >= opts.limit {
                break;
            }
            let Ok(data) = fs::read_to_string(&file) else {
                continue;
            };
            for (i, line) in data.lines().enumerate() {
                if hits.len() >= opts.limit {
                    break 'files;
                }
                if rx.is_match(line) {
                    hits.push(GrepHit {
                        path: file.clone(),
                        line: i + 1,
                        text: line.to_string(),
                    });
                }
            }
        }

        let shown: Vec<_> = hits
            .iter()
            .take(10)
            .map(|h| json!({ "file": h.path.display().to_string(), "line": h.line, "text": preview(&h.text, 80) }))
            .collect();
        self.emit(
            "rgrep",
            json!({
                "pattern": pattern,
                "path": base.display().to_string(),
                "count": hits.len(),
                "hits": shown,
            }),
        );
        Ok(hits)
    }

    /// Non-recursive glob; see [`Prelude::find`] for the recursive form.
    pub fn glob_files(&self, pattern: &str, path: impl AsRef<Path>, hidden: bool) -> Result<Vec<PathBuf>> {
        let base = self.resolve(path);
        let rules = IgnoreRules::load(&base);
        let mut matches: Vec<PathBuf> = expand(&base, pattern)?
            .into_iter()
            .filter(|m| hidden || !crate::fs_ops::is_hidden_name(m))
            .filter(|m| !rules.is_ignored(m))
            .collect();
        matches.sort();
        self.emit(
            "glob",
            json!({
                "pattern": pattern,
                "path": base.display().to_string(),
                "count": matches.len(),
                "matches": shown(&matches),
            }),
        );
        Ok(matches)
    }
}

/// Regular files below `base` matching `name_glob`, filtered by hidden and ignore rules.
pub(crate) fn walk_files(base: &Path, name_glob: &str, hidden: bool) -> Result<Vec<PathBuf>> {
    let rules = IgnoreRules::load(base);
    Ok(expand(base, &format!("**/{name_glob}"))?
        .into_iter()
        .filter(|f| !f.is_dir())
        .filter(|f| hidden || !rules.is_hidden(f))
        .filter(|f| !rules.is_ignored(f))
        .collect())
}

pub(crate) fn line_matcher(pattern: &str, literal: bool, ignore_case: bool) -> Result<Regex> {
    let source = if literal {
        regex::escape(pattern)
    } else {
        pattern.to_string()
    };
    Ok(RegexBuilder::new(&source)
        .case_insensitive(ignore_case)
        .build()?)
}

fn expand(base: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = format!("{}/{}", Pattern::escape(&base.to_string_lossy()), pattern);
    let mut out = Vec::new();
    for entry in glob::glob(&full)? {
        match entry {
            Ok(path) => out.push(path),
            Err(e) => tracing::debug!(error = %e, "glob entry skipped"),
        }
    }
    Ok(out)
}

fn mtime(p: &Path) -> SystemTime {
    fs::metadata(p)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

fn shown(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().take(20).map(|p| p.display().to_string()).collect()
}
