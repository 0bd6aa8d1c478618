//! In-place find/replace, line operations, diff and batch.
//!
//! Regex replacements use the `regex` crate's template syntax (`$1`, `${name}`).

use std::fs;
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde_json::json;
use similar::TextDiff;

use crate::error::{PreludeError, Result};
use crate::handle::Prelude;
use crate::search::walk_files;
use crate::text::preview;

#[derive(Debug, Clone, Copy, Default)]
pub struct RegexFlags {
    pub ignore_case: bool,
    /// `^`/`$` match at line boundaries.
    pub multi_line: bool,
    /// `.` also matches `\n`.
    pub dot_all: bool,
}

impl RegexFlags {
    fn compile(self, pattern: &str) -> Result<Regex> {
        Ok(RegexBuilder::new(pattern)
            .case_insensitive(self.ignore_case)
            .multi_line(self.multi_line)
            .dot_matches_new_line(self.dot_all)
            .build()?)
    }
}

#[derive(Debug, Clone)]
pub struct RsedOptions {
    pub glob: String,
    pub flags: RegexFlags,
    pub hidden: bool,
}

impl Default for RsedOptions {
    fn default() -> Self {
        Self {
            glob: "*".to_string(),
            flags: RegexFlags::default(),
            hidden: false,
        }
    }
}

impl Prelude {
    /// Replaces every occurrence in a file, as plain text unless `regex` is set.
    pub fn replace(&self, path: impl AsRef<Path>, pattern: &str, repl: &str, regex: bool) -> Result<usize> {
        let p = self.resolve(path);
        let count = if regex {
            let rx = Regex::new(pattern)?;
            rewrite(&p, "replace", |data| substitute(&rx, data, repl))?
        } else {
            if pattern.is_empty() {
                return Err(PreludeError::InvalidArgument("empty pattern".into()));
            }
            rewrite(&p, "replace", |data| {
                let n = data.matches(pattern).count();
                (data.replace(pattern, repl), n)
            })?
        };
        self.emit("replace", json!({ "path": p.display().to_string(), "count": count }));
        Ok(count)
    }

    /// Regex replace in place, like `sed -i`.
    pub fn sed(&self, path: impl AsRef<Path>, pattern: &str, repl: &str, flags: RegexFlags) -> Result<usize> {
        let p = self.resolve(path);
        let rx = flags.compile(pattern)?;
        let count = rewrite(&p, "sed", |data| substitute(&rx, data, repl))?;
        self.emit("sed", json!({ "path": p.display().to_string(), "count": count }));
        Ok(count)
    }

    /// [`Prelude::sed`] over every file below `path` matching `opts.glob`.
    /// Files that cannot be read as UTF-8 are skipped.
    pub fn rsed(&self, pattern: &str, repl: &str, path: impl AsRef<Path>, opts: &RsedOptions) -> Result<usize> {
        let base = self.resolve(path);
        let rx = opts.flags.compile(pattern)?;
        let mut total = 0;
        let mut files = 0;
        let mut changed = Vec::new();
        for file in walk_files(&base, &opts.glob, opts.hidden)? {
            let count = match rewrite(&file, "rsed", |data| substitute(&rx, data, repl)) {
                Ok(n) => n,
                Err(e) => {
                    tracing::debug!(file = %file.display(), error = %e, "rsed skipped file");
                    continue;
                }
            };
            if count > 0 {
                total += count;
                files += 1;
                if changed.len() < 10 {
                    changed.push(json!({ "file": file.display().to_string(), "count": count }));
                }
            }
        }
        self.emit(
            "rsed",
            json!({
                "path": base.display().to_string(),
                "count": total,
                "files": files,
                "changed": changed,
            }),
        );
        Ok(total)
    }

    /// Inclusive 1-indexed line range; `end = None` reads to the last line.
    pub fn lines(&self, path: impl AsRef<Path>, start: usize, end: Option<usize>) -> Result<String> {
        let p = self.resolve(path);
        let data = fs::read_to_string(&p).map_err(PreludeError::io("lines", &p))?;
        let all: Vec<&str> = data.lines().collect();
        let start = start.max(1);
        let end = end.unwrap_or(all.len()).min(all.len());
        let selected = all.get(start - 1..end).unwrap_or_default();
        let out = selected.join("\n");
        self.emit(
            "lines",
            json!({
                "path": p.display().to_string(),
                "start": start,
                "end": end,
                "count": selected.len(),
                "preview": preview(&out, 500),
            }),
        );
        Ok(out)
    }

    /// Deletes an inclusive 1-indexed range; a range past the end or with
    /// `start > end` deletes nothing.
    pub fn delete_lines(&self, path: impl AsRef<Path>, start: usize, end: Option<usize>) -> Result<usize> {
        let p = self.resolve(path);
        let mut all = read_lines(&p, "delete_lines")?;
        let start = start.max(1);
        let end = end.unwrap_or(start).min(all.len());
        let count = if start <= end {
            all.drain(start - 1..end).count()
        } else {
            0
        };
        if count > 0 {
            write_lines(&p, "delete_lines", &all)?;
        }
        self.emit(
            "delete_lines",
            json!({ "path": p.display().to_string(), "start": start, "end": end, "count": count }),
        );
        Ok(count)
    }

    /// Deletes lines matching `pattern` (regex, or substring when `regex` is false).
    pub fn delete_matching(&self, path: impl AsRef<Path>, pattern: &str, regex: bool) -> Result<usize> {
        let p = self.resolve(path);
        let all = read_lines(&p, "delete_matching")?;
        let kept: Vec<String> = if regex {
            let rx = Regex::new(pattern)?;
            all.iter().filter(|l| !rx.is_match(l)).cloned().collect()
        } else {
            all.iter().filter(|l| !l.contains(pattern)).cloned().collect()
        };
        let count = all.len() - kept.len();
        if count > 0 {
            write_lines(&p, "delete_matching", &kept)?;
        }
        self.emit(
            "delete_matching",
            json!({ "path": p.display().to_string(), "pattern": pattern, "count": count }),
        );
        Ok(count)
    }

    /// Inserts `text` after (or before) 1-indexed `line`, clamped to the file.
    pub fn insert_at(&self, path: impl AsRef<Path>, line: usize, text: &str, after: bool) -> Result<PathBuf> {
        let p = self.resolve(path);
        let mut all = read_lines(&p, "insert_at")?;
        let new_lines: Vec<String> = text.lines().map(str::to_string).collect();
        let line = line.clamp(1, all.len() + 1);
        let idx = if after { line.min(all.len()) } else { line - 1 };
        let inserted = new_lines.len();
        all.splice(idx..idx, new_lines);
        write_lines(&p, "insert_at", &all)?;
        let position = if after { "after" } else { "before" };
        self.emit(
            "insert_at",
            json!({
                "path": p.display().to_string(),
                "line": line,
                "lines_inserted": inserted,
                "position": position,
            }),
        );
        Ok(p)
    }

    /// Unified diff of two files; empty when they are identical.
    pub fn diff(&self, a: impl AsRef<Path>, b: impl AsRef<Path>) -> Result<String> {
        let path_a = self.resolve(a);
        let path_b = self.resolve(b);
        let before = fs::read_to_string(&path_a).map_err(PreludeError::io("diff", &path_a))?;
        let after = fs::read_to_string(&path_b).map_err(PreludeError::io("diff", &path_b))?;
        let name_a = path_a.display().to_string();
        let name_b = path_b.display().to_string();
        let out = if before == after {
            String::new()
        } else {
            TextDiff::from_lines(&before, &after)
                .unified_diff()
                .header(&name_a, &name_b)
                .to_string()
        };
        self.emit(
            "diff",
            json!({
                "file_a": name_a,
                "file_b": name_b,
                "identical": out.is_empty(),
                "preview": preview(&out, 500),
            }),
        );
        Ok(out)
    }

    /// Applies `f` to each resolved path, in order.
    pub fn batch<P, T, F>(&self, paths: &[P], mut f: F) -> Vec<T>
    where
        P: AsRef<Path>,
        F: FnMut(&Path) -> T,
    {
        let results: Vec<T> = paths.iter().map(|p| f(&self.resolve(p))).collect();
        self.emit("batch", json!({ "files": paths.len() }));
        results
    }
}

fn substitute(rx: &Regex, data: &str, repl: &str) -> (String, usize) {
    let count = rx.find_iter(data).count();
    if count == 0 {
        return (data.to_string(), 0);
    }
    (rx.replace_all(data, repl).into_owned(), count)
}

/// Reads `path`, applies `edit`, writes back when anything matched.
fn rewrite<F>(path: &Path, op: &'static str, edit: F) -> Result<usize>
where
    F: FnOnce(&str) -> (String, usize),
{
    let data = fs::read_to_string(path).map_err(PreludeError::io(op, path))?;
    let (new, count) = edit(&data);
    if count > 0 {
        fs::write(path, new).map_err(PreludeError::io(op, path))?;
    }
    Ok(count)
}

fn read_lines(path: &Path, op: &'static str) -> Result<Vec<String>> {
    let data = fs::read_to_string(path).map_err(PreludeError::io(op, path))?;
    Ok(data.lines().map(str::to_string).collect())
}

/// Writes lines back with a trailing newline (none for an empty file).
fn write_lines(path: &Path, op: &'static str, lines: &[String]) -> Result<()> {
    let mut body = lines.join("\n");
    if !lines.is_empty() {
        body.push('\n');
    }
    fs::write(path, body).map_err(PreludeError::io(op, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::MemorySink;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn session() -> (tempfile::TempDir, Prelude, Arc<MemorySink>) {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(MemorySink::new());
        let p = Prelude::with_cwd(dir.path(), sink.clone());
        (dir, p, sink)
    }

    #[test]
    fn replace_literal_and_regex() {
        let (_d, p, _s) = session();
        p.write("f", "a.b a.b axb\n").unwrap();
        assert_eq!(p.replace("f", "a.b", "X", false).unwrap(), 2);
        assert_eq!(p.read("f", 1, None).unwrap(), "X X axb\n");
        assert_eq!(p.replace("f", r"a(x)b", "[$1]", true).unwrap(), 1);
        assert_eq!(p.read("f", 1, None).unwrap(), "X X [x]\n");
        assert!(p.replace("f", "", "y", false).is_err());
    }

    #[test]
    fn sed_flags() {
        let (_d, p, _s) = session();
        p.write("f", "Foo\nfoo\n").unwrap();
        let flags = RegexFlags { ignore_case: true, multi_line: true, ..Default::default() };
        assert_eq!(p.sed("f", "^foo$", "bar", flags).unwrap(), 2);
        assert_eq!(p.read("f", 1, None).unwrap(), "bar\nbar\n");
    }

    #[test]
    fn rsed_reports_changed_files() {
        let (_d, p, sink) = session();
        p.write("a.rs", "old old\n").unwrap();
        p.write("sub/b.rs", "old\n").unwrap();
        p.write("c.txt", "old\n").unwrap();
        let opts = RsedOptions { glob: "*.rs".into(), ..Default::default() };
        assert_eq!(p.rsed("old", "new", ".", &opts).unwrap(), 3);
        assert_eq!(sink.last().unwrap().get("files"), Some(&json!(2)));
        assert_eq!(p.read("c.txt", 1, None).unwrap(), "old\n");
    }

    #[test]
    fn line_range_ops() {
        let (_d, p, _s) = session();
        p.write("f", "1\n2\n3\n4\n5\n").unwrap();
        assert_eq!(p.lines("f", 2, Some(3)).unwrap(), "2\n3");
        assert_eq!(p.lines("f", 4, None).unwrap(), "4\n5");
        assert_eq!(p.lines("f", 9, None).unwrap(), "");
        assert_eq!(p.delete_lines("f", 2, Some(3)).unwrap(), 2);
        assert_eq!(p.read("f", 1, None).unwrap(), "1\n4\n5\n");
        assert_eq!(p.delete_lines("f", 3, Some(1)).unwrap(), 0);
        assert_eq!(p.delete_lines("f", 3, None).unwrap(), 1);
        assert_eq!(p.read("f", 1, None).unwrap(), "1\n4\n");
    }

    #[test]
    fn delete_matching_modes() {
        let (_d, p, _s) = session();
        p.write("f", "keep\ndrop 1\nkeep\n[x]\n").unwrap();
        assert_eq!(p.delete_matching("f", r"^drop \d", true).unwrap(), 1);
        assert_eq!(p.delete_matching("f", "[x]", false).unwrap(), 1);
        assert_eq!(p.read("f", 1, None).unwrap(), "keep\nkeep\n");
    }

    #[test]
    fn insert_before_and_after() {
        let (_d, p, sink) = session();
        p.write("f", "a\nc\n").unwrap();
        p.insert_at("f", 1, "b", true).unwrap();
        p.insert_at("f", 1, "top", false).unwrap();
        p.insert_at("f", 99, "end", true).unwrap();
        assert_eq!(p.read("f", 1, None).unwrap(), "top\na\nb\nc\nend\n");
        assert_eq!(sink.last().unwrap().get("line"), Some(&json!(5)));
    }

    #[test]
    fn diff_is_empty_for_identical_files() {
        let (_d, p, _s) = session();
        p.write("a", "x\ny\n").unwrap();
        p.write("b", "x\ny\n").unwrap();
        p.write("c", "x\nz\n").unwrap();
        assert_eq!(p.diff("a", "b").unwrap(), "");
        let d = p.diff("a", "c").unwrap();
        assert!(d.starts_with("--- "));
        assert!(d.contains("-y\n"));
        assert!(d.contains("+z\n"));
    }

    #[test]
    fn batch_applies_in_order() {
        let (_d, p, _s) = session();
        let names = p.batch(&["x", "y"], |path| {
            path.file_name().unwrap().to_string_lossy().into_owned()
        });
        assert_eq!(names, vec!["x", "y"]);
    }
}
