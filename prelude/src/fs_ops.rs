//! Navigation, file I/O and file management helpers.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::json;

use crate::error::{PreludeError, Result};
use crate::handle::Prelude;
use crate::text::preview;

const LIST_PREVIEW: usize = 20;
const TEXT_PREVIEW: usize = 500;
const TREE_PREVIEW: usize = 1000;

/// Result of [`Prelude::rm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    RemovedTree,
    /// Path is a directory and `recursive` was not set; nothing was removed.
    IsDirectory,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStat {
    pub path: String,
    pub size: u64,
    pub is_file: bool,
    pub is_dir: bool,
    /// Local time, ISO 8601.
    pub mtime: String,
    /// Permission bits in octal, e.g. `0o100644`.
    pub mode: String,
}

impl Prelude {
    /// Reads a file. `offset` is a 1-based line number; `limit` caps the number of lines.
    pub fn read(&self, path: impl AsRef<Path>, offset: usize, limit: Option<usize>) -> Result<String> {
        let p = self.resolve(path);
        let mut data = fs::read_to_string(&p).map_err(PreludeError::io("read", &p))?;
        let limit = limit.filter(|&n| n > 0);
        if offset > 1 || limit.is_some() {
            let start = offset.saturating_sub(1);
            let lines = data.split_inclusive('\n').skip(start);
            data = match limit {
                Some(n) => lines.take(n).collect(),
                None => lines.collect(),
            };
        }
        self.emit(
            "read",
            json!({
                "path": p.display().to_string(),
                "chars": data.chars().count(),
                "preview": preview(&data, TEXT_PREVIEW),
            }),
        );
        Ok(data)
    }

    /// Writes `content`, creating parent directories.
    pub fn write(&self, path: impl AsRef<Path>, content: &str) -> Result<PathBuf> {
        let p = self.resolve(path);
        create_parent(&p, "write")?;
        fs::write(&p, content).map_err(PreludeError::io("write", &p))?;
        self.emit(
            "write",
            json!({ "path": p.display().to_string(), "chars": content.chars().count() }),
        );
        Ok(p)
    }

    pub fn append(&self, path: impl AsRef<Path>, content: &str) -> Result<PathBuf> {
        use std::io::Write;

        let p = self.resolve(path);
        create_parent(&p, "append")?;
        let mut f = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&p)
            .map_err(PreludeError::io("append", &p))?;
        f.write_all(content.as_bytes())
            .map_err(PreludeError::io("append", &p))?;
        self.emit(
            "append",
            json!({ "path": p.display().to_string(), "chars": content.chars().count() }),
        );
        Ok(p)
    }

    /// Concatenates files with `separator` between them.
    pub fn cat<P: AsRef<Path>>(&self, paths: &[P], separator: &str) -> Result<String> {
        let mut parts = Vec::with_capacity(paths.len());
        for path in paths {
            let p = self.resolve(path);
            parts.push(fs::read_to_string(&p).map_err(PreludeError::io("cat", &p))?);
        }
        let out = parts.join(separator);
        self.emit(
            "cat",
            json!({
                "files": paths.len(),
                "chars": out.chars().count(),
                "preview": preview(&out, TEXT_PREVIEW),
            }),
        );
        Ok(out)
    }

    /// Creates an empty file or bumps its modification time.
    pub fn touch(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let p = self.resolve(path);
        create_parent(&p, "touch")?;
        let f = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&p)
            .map_err(PreludeError::io("touch", &p))?;
        f.set_modified(SystemTime::now())
            .map_err(PreludeError::io("touch", &p))?;
        self.emit("touch", json!({ "path": p.display().to_string() }));
        Ok(p)
    }

    pub fn mkdir(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let p = self.resolve(path);
        fs::create_dir_all(&p).map_err(PreludeError::io("mkdir", &p))?;
        self.emit("mkdir", json!({ "path": p.display().to_string() }));
        Ok(p)
    }

    /// Deletes a file, or a directory tree when `recursive` is set.
    pub fn rm(&self, path: impl AsRef<Path>, recursive: bool) -> Result<RemoveOutcome> {
        let p = self.resolve(path);
        let shown = p.display().to_string();
        if p.is_dir() {
            if !recursive {
                self.emit(
                    "rm",
                    json!({ "path": shown, "error": "directory, use recursive=True" }),
                );
                return Ok(RemoveOutcome::IsDirectory);
            }
            fs::remove_dir_all(&p).map_err(PreludeError::io("rm", &p))?;
            self.emit("rm", json!({ "path": shown, "recursive": true }));
            return Ok(RemoveOutcome::RemovedTree);
        }
        if p.symlink_metadata().is_err() {
            self.emit("rm", json!({ "path": shown, "error": "missing" }));
            return Ok(RemoveOutcome::Missing);
        }
        fs::remove_file(&p).map_err(PreludeError::io("rm", &p))?;
        self.emit("rm", json!({ "path": shown }));
        Ok(RemoveOutcome::Removed)
    }

    /// Moves or renames, creating the destination's parent.
    pub fn mv(&self, src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<PathBuf> {
        let src = self.resolve(src);
        let dst = self.resolve(dst);
        create_parent(&dst, "mv")?;
        if let Err(e) = fs::rename(&src, &dst) {
            // Renames across filesystems fail; fall back to copy + delete.
            tracing::debug!(error = %e, "rename failed, copying instead");
            copy_any(&src, &dst)?;
            if src.is_dir() {
                fs::remove_dir_all(&src).map_err(PreludeError::io("mv", &src))?;
            } else {
                fs::remove_file(&src).map_err(PreludeError::io("mv", &src))?;
            }
        }
        self.emit(
            "mv",
            json!({ "src": src.display().to_string(), "dst": dst.display().to_string() }),
        );
        Ok(dst)
    }

    /// Copies a file, or a directory tree into `dst` (merging with existing content).
    pub fn cp(&self, src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<PathBuf> {
        let src = self.resolve(src);
        let dst = self.resolve(dst);
        create_parent(&dst, "cp")?;
        copy_any(&src, &dst)?;
        self.emit(
            "cp",
            json!({ "src": src.display().to_string(), "dst": dst.display().to_string() }),
        );
        Ok(dst)
    }

    /// Sorted directory listing.
    pub fn ls(&self, path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let p = self.resolve(path);
        let mut items = read_dir_paths(&p, "ls")?;
        items.sort();
        let names: Vec<String> = items
            .iter()
            .take(LIST_PREVIEW)
            .map(|i| display_name(i))
            .collect();
        self.emit(
            "ls",
            json!({ "path": p.display().to_string(), "count": items.len(), "items": names }),
        );
        Ok(items)
    }

    /// Box-drawing directory tree, directories first.
    pub fn tree(&self, path: impl AsRef<Path>, max_depth: usize, show_hidden: bool) -> Result<String> {
        let base = self.resolve(path);
        let mut lines = vec![format!("{}/", base.display())];
        walk_tree(&base, "", 1, max_depth, show_hidden, &mut lines)?;
        let out = lines.join("\n");
        self.emit(
            "tree",
            json!({
                "path": base.display().to_string(),
                "entries": lines.len() - 1,
                "preview": preview(&out, TREE_PREVIEW),
            }),
        );
        Ok(out)
    }

    pub fn stat(&self, path: impl AsRef<Path>) -> Result<FileStat> {
        let p = self.resolve(path);
        let meta = fs::metadata(&p).map_err(PreludeError::io("stat", &p))?;
        let mtime = meta
            .modified()
            .map(|t| DateTime::<Local>::from(t).to_rfc3339())
            .unwrap_or_default();
        let info = FileStat {
            path: p.display().to_string(),
            size: meta.len(),
            is_file: meta.is_file(),
            is_dir: meta.is_dir(),
            mtime,
            mode: mode_string(&meta),
        };
        self.emit(
            "stat",
            json!({
                "path": info.path,
                "size": info.size,
                "is_dir": info.is_dir,
                "mtime": info.mtime,
            }),
        );
        Ok(info)
    }
}

fn create_parent(p: &Path, op: &'static str) -> Result<()> {
    match p.parent().filter(|d| !d.as_os_str().is_empty()) {
        Some(dir) => fs::create_dir_all(dir).map_err(PreludeError::io(op, dir)),
        None => Ok(()),
    }
}

fn copy_any(src: &Path, dst: &Path) -> Result<()> {
    if src.is_dir() {
        fs::create_dir_all(dst).map_err(PreludeError::io("cp", dst))?;
        for entry in read_dir_paths(src, "cp")? {
            let Some(name) = entry.file_name() else {
                continue;
            };
            copy_any(&entry, &dst.join(name))?;
        }
        Ok(())
    } else {
        fs::copy(src, dst).map_err(PreludeError::io("cp", src))?;
        Ok(())
    }
}

pub(crate) fn read_dir_paths(dir: &Path, op: &'static str) -> Result<Vec<PathBuf>> {
    let rd = fs::read_dir(dir).map_err(PreludeError::io(op, dir))?;
    let mut out = Vec::new();
    for entry in rd {
        let entry = entry.map_err(PreludeError::io(op, dir))?;
        out.push(entry.path());
    }
    Ok(out)
}

fn display_name(p: &Path) -> String {
    let name = p
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if p.is_dir() {
        format!("{name}/")
    } else {
        name
    }
}

fn walk_tree(
    dir: &Path,
    prefix: &str,
    depth: usize,
    max_depth: usize,
    show_hidden: bool,
    lines: &mut Vec<String>,
) -> Result<()> {
    if depth > max_depth {
        return Ok(());
    }
    let mut items: Vec<PathBuf> = read_dir_paths(dir, "tree")?
        .into_iter()
        .filter(|p| show_hidden || !is_hidden_name(p))
        .collect();
    items.sort_by_key(|p| {
        (
            !p.is_dir(),
            p.file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .unwrap_or_default(),
        )
    });

    let count = items.len();
    for (i, item) in items.iter().enumerate() {
        let is_last = i + 1 == count;
        let connector = if is_last { "└── " } else { "├── " };
        lines.push(format!("{prefix}{connector}{}", display_name(item)));
        if item.is_dir() {
            let ext = if is_last { "    " } else { "│   " };
            walk_tree(item, &format!("{prefix}{ext}"), depth + 1, max_depth, show_hidden, lines)?;
        }
    }
    Ok(())
}

pub(crate) fn is_hidden_name(p: &Path) -> bool {
    p.file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

#[cfg(unix)]
fn mode_string(meta: &fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("0o{:o}", meta.permissions().mode())
}

#[cfg(not(unix))]
fn mode_string(meta: &fs::Metadata) -> String {
    if meta.permissions().readonly() {
        "0o444".to_string()
    } else {
        "0o666".to_string()
    }
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
    fn read_window_keeps_line_endings() {
        let (_d, p, sink) = session();
        p.write("a.txt", "one\ntwo\nthree\nfour\n").unwrap();
        assert_eq!(p.read("a.txt", 2, Some(2)).unwrap(), "two\nthree\n");
        assert_eq!(p.read("a.txt", 4, None).unwrap(), "four\n");
        assert_eq!(p.read("a.txt", 1, Some(0)).unwrap(), "one\ntwo\nthree\nfour\n");
        assert_eq!(sink.last().unwrap().get("chars"), Some(&json!(19)));
    }

    #[test]
    fn write_creates_parents_and_append_extends() {
        let (dir, p, _sink) = session();
        p.write("deep/nested/f.txt", "a").unwrap();
        p.append("deep/nested/f.txt", "b").unwrap();
        p.append("fresh/g.txt", "c").unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("deep/nested/f.txt")).unwrap(), "ab");
        assert_eq!(fs::read_to_string(dir.path().join("fresh/g.txt")).unwrap(), "c");
    }

    #[test]
    fn rm_outcomes() {
        let (_d, p, sink) = session();
        p.mkdir("d/e").unwrap();
        p.touch("d/f").unwrap();
        assert_eq!(p.rm("d", false).unwrap(), RemoveOutcome::IsDirectory);
        assert!(sink.last().unwrap().is_error());
        assert_eq!(p.rm("d/f", false).unwrap(), RemoveOutcome::Removed);
        assert_eq!(p.rm("d/f", false).unwrap(), RemoveOutcome::Missing);
        assert_eq!(p.rm("d", true).unwrap(), RemoveOutcome::RemovedTree);
        assert!(!p.resolve("d").exists());
    }

    #[test]
    fn cp_tree_and_mv() {
        let (_d, p, _sink) = session();
        p.write("src/a.txt", "A").unwrap();
        p.write("src/inner/b.txt", "B").unwrap();
        p.cp("src", "copy").unwrap();
        assert_eq!(p.read("copy/inner/b.txt", 1, None).unwrap(), "B");
        p.mv("copy/a.txt", "moved/a.txt").unwrap();
        assert!(!p.resolve("copy/a.txt").exists());
        assert_eq!(p.read("moved/a.txt", 1, None).unwrap(), "A");
    }

    #[test]
    fn ls_marks_directories() {
        let (_d, p, sink) = session();
        p.mkdir("zdir").unwrap();
        p.touch("afile").unwrap();
        let items = p.ls(".").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(sink.last().unwrap().get("items"), Some(&json!(["afile", "zdir/"])));
    }

    #[test]
    fn tree_lists_dirs_first() {
        let (_d, p, _sink) = session();
        p.touch("b.txt").unwrap();
        p.touch("A.txt").unwrap();
        p.touch("src/main.rs").unwrap();
        p.touch(".hidden").unwrap();
        let out = p.tree(".", 3, false).unwrap();
        let body: Vec<&str> = out.lines().skip(1).collect();
        assert_eq!(
            body,
            vec!["├── src/", "│   └── main.rs", "├── A.txt", "└── b.txt"]
        );
    }

    #[test]
    fn stat_reports_kind_and_size() {
        let (_d, p, _sink) = session();
        p.write("s.txt", "12345").unwrap();
        let st = p.stat("s.txt").unwrap();
        assert_eq!(st.size, 5);
        assert!(st.is_file);
        assert!(!st.is_dir);
        assert!(st.mode.starts_with("0o"));
        assert!(p.stat("nope").is_err());
    }

    #[test]
    fn cat_joins_with_separator() {
        let (_d, p, _sink) = session();
        p.write("x", "1").unwrap();
        p.write("y", "2").unwrap();
        assert_eq!(p.cat(&["x", "y"], "|").unwrap(), "1|2");
    }
}
