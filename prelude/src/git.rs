//! Git helpers built on the `git` CLI.
//!
//! A failing git command emits a status event carrying `error` and returns
//! [`PreludeError::Git`].

use std::path::Path;
use std::process::Stdio;

use serde::Serialize;
use serde_json::{json, Value};
use tokio::process::Command;

use crate::error::{PreludeError, Result};
use crate::handle::Prelude;
use crate::text::preview;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GitStatus {
    pub branch: Option<String>,
    pub staged: Vec<String>,
    pub modified: Vec<String>,
    pub untracked: Vec<String>,
    pub ahead: u32,
    pub behind: u32,
}

impl GitStatus {
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.modified.is_empty() && self.untracked.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DiffQuery {
    pub paths: Vec<String>,
    /// Compare the index instead of the worktree (`--cached`).
    pub staged: bool,
    pub reference: Option<String>,
    pub stat: bool,
}

#[derive(Debug, Clone)]
pub struct LogQuery {
    pub n: usize,
    /// Abbreviated hashes.
    pub oneline: bool,
    pub ref_range: Option<String>,
    pub paths: Vec<String>,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            n: 10,
            oneline: true,
            ref_range: None,
            paths: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub sha: String,
    pub subject: String,
    pub author: String,
    /// Strict ISO 8601 author date.
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitDetail {
    pub sha: String,
    pub subject: String,
    pub author: String,
    pub date: String,
    pub body: String,
    /// `--stat` lines, including the summary line.
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Branches {
    pub current: Option<String>,
    pub local: Vec<String>,
    pub remote: Vec<String>,
}

impl Prelude {
    pub async fn git_status(&self, cwd: Option<&Path>) -> Result<GitStatus> {
        let out = self
            .git_or_report("git_status", json!({}), &["status", "--porcelain=v2", "--branch"], cwd)
            .await?;
        let status = parse_status(&out);
        let files: Vec<&String> = status
            .staged
            .iter()
            .take(5)
            .chain(status.modified.iter().take(5))
            .collect();
        self.emit(
            "git_status",
            json!({
                "branch": status.branch,
                "staged": status.staged.len(),
                "modified": status.modified.len(),
                "untracked": status.untracked.len(),
                "clean": status.is_clean(),
                "files": files,
            }),
        );
        Ok(status)
    }

    pub async fn git_diff(&self, query: &DiffQuery, cwd: Option<&Path>) -> Result<String> {
        let mut args = vec!["diff"];
        if query.stat {
            args.push("--stat");
        }
        if query.staged {
            args.push("--cached");
        }
        if let Some(r) = &query.reference {
            args.push(r);
        }
        if !query.paths.is_empty() {
            args.push("--");
            args.extend(query.paths.iter().map(String::as_str));
        }
        let out = self.git_or_report("git_diff", json!({}), &args, cwd).await?;
        self.emit(
            "git_diff",
            json!({
                "staged": query.staged,
                "ref": query.reference,
                "lines": out.lines().count(),
                "preview": preview(&out, 500),
            }),
        );
        Ok(out)
    }

    pub async fn git_log(&self, query: &LogQuery, cwd: Option<&Path>) -> Result<Vec<Commit>> {
        let count = format!("-{}", query.n);
        let hash = if query.oneline { "%h" } else { "%H" };
        let format = format!("--format={hash}%x00%s%x00%an%x00%aI");
        let mut args = vec!["log", count.as_str(), format.as_str()];
        if let Some(range) = &query.ref_range {
            args.push(range);
        }
        if !query.paths.is_empty() {
            args.push("--");
            args.extend(query.paths.iter().map(String::as_str));
        }
        let out = self.git_or_report("git_log", json!({}), &args, cwd).await?;
        let commits = parse_log(&out);
        let entries: Vec<Value> = commits
            .iter()
            .take(5)
            .map(|c| json!({ "sha": preview(&c.sha, 8), "subject": preview(&c.subject, 50) }))
            .collect();
        self.emit("git_log", json!({ "commits": commits.len(), "entries": entries }));
        Ok(commits)
    }

    pub async fn git_show(&self, reference: &str, stat: bool, cwd: Option<&Path>) -> Result<CommitDetail> {
        let out = self
            .git_or_report(
                "git_show",
                json!({ "ref": reference }),
                &["show", reference, "--format=%H%x00%s%x00%an%x00%aI%x00%b", "--no-patch"],
                cwd,
            )
            .await?;
        let mut detail = parse_show(&out);
        if stat {
            match self.git(&["show", reference, "--stat", "--format="], cwd).await {
                Ok(stat_out) => {
                    detail.files = stat_out
                        .lines()
                        .map(str::trim)
                        .filter(|l| !l.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                Err(e) => tracing::debug!(error = %e, "git show --stat failed"),
            }
        }
        self.emit(
            "git_show",
            json!({
                "ref": reference,
                "sha": preview(&detail.sha, 12),
                "subject": preview(&detail.subject, 60),
                "files": detail.files.len(),
            }),
        );
        Ok(detail)
    }

    /// File content at `reference`; `lines` is an inclusive 1-indexed range.
    pub async fn git_file_at(
        &self,
        reference: &str,
        path: &str,
        lines: Option<(usize, usize)>,
        cwd: Option<&Path>,
    ) -> Result<String> {
        let object = format!("{reference}:{path}");
        let out = self
            .git_or_report(
                "git_file_at",
                json!({ "ref": reference, "path": path }),
                &["show", &object],
                cwd,
            )
            .await?;

        let Some((start, end)) = lines else {
            self.emit(
                "git_file_at",
                json!({ "ref": reference, "path": path, "chars": out.chars().count() }),
            );
            return Ok(out);
        };
        let all: Vec<&str> = out.lines().collect();
        let start = start.max(1);
        let end = end.min(all.len());
        let selected = all.get(start - 1..end).unwrap_or_default();
        self.emit(
            "git_file_at",
            json!({
                "ref": reference,
                "path": path,
                "start": start,
                "end": end,
                "lines": selected.len(),
            }),
        );
        Ok(selected.join("\n"))
    }

    pub async fn git_branch(&self, cwd: Option<&Path>) -> Result<Branches> {
        let out = self
            .git_or_report(
                "git_branch",
                json!({}),
                &["branch", "-a", "--format=%(refname)%00%(HEAD)"],
                cwd,
            )
            .await?;
        let branches = parse_branches(&out);
        let shown: Vec<&String> = branches.local.iter().take(10).collect();
        self.emit(
            "git_branch",
            json!({
                "current": branches.current,
                "local": branches.local.len(),
                "remote": branches.remote.len(),
                "branches": shown,
            }),
        );
        Ok(branches)
    }

    /// True when the worktree or index differs from HEAD, or untracked files exist.
    pub async fn git_has_changes(&self, cwd: Option<&Path>) -> Result<bool> {
        let out = self
            .git_or_report("git_has_changes", json!({}), &["status", "--porcelain"], cwd)
            .await?;
        let has_changes = !out.trim().is_empty();
        self.emit("git_has_changes", json!({ "has_changes": has_changes }));
        Ok(has_changes)
    }

    async fn git(&self, args: &[&str], cwd: Option<&Path>) -> Result<String> {
        let dir = match cwd {
            Some(d) => self.resolve(d),
            None => self.cwd().to_path_buf(),
        };
        tracing::debug!(?args, dir = %dir.display(), "git");
        let output = Command::new("git")
            .args(args)
            .envs(self.env_overlay())
            .current_dir(&dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| PreludeError::Spawn {
                program: "git".to_string(),
                source,
            })?;
        if !output.status.success() {
            return Err(PreludeError::Git {
                args: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Runs git; on failure emits `op` with `fields` plus `error`.
    async fn git_or_report(&self, op: &str, fields: Value, args: &[&str], cwd: Option<&Path>) -> Result<String> {
        match self.git(args, cwd).await {
            Ok(out) => Ok(out),
            Err(e) => {
                let message = match &e {
                    PreludeError::Git { stderr, .. } => stderr.clone(),
                    other => other.to_string(),
                };
                let mut fields = match fields {
                    Value::Object(map) => map,
                    _ => serde_json::Map::new(),
                };
                fields.insert("error".to_string(), Value::String(message));
                self.emit(op, Value::Object(fields));
                Err(e)
            }
        }
    }
}

/// Parses `git status --porcelain=v2 --branch`.
pub(crate) fn parse_status(out: &str) -> GitStatus {
    let mut status = GitStatus::default();
    for line in out.lines() {
        if let Some(head) = line.strip_prefix("# branch.head ") {
            status.branch = Some(head.to_string());
        } else if let Some(ab) = line.strip_prefix("# branch.ab ") {
            for part in ab.split_whitespace() {
                if let Some(n) = part.strip_prefix('+') {
                    status.ahead = n.parse().unwrap_or(0);
                } else if let Some(n) = part.strip_prefix('-') {
                    status.behind = n.parse().unwrap_or(0);
                }
            }
        } else if let Some(rest) = line.strip_prefix("? ") {
            status.untracked.push(rest.to_string());
        } else if line.starts_with("1 ") || line.starts_with("2 ") {
            // Ordinary entries carry 9 fields, renames 10 with `path\torig`.
            let fields = if line.starts_with('1') { 9 } else { 10 };
            let parts: Vec<&str> = line.splitn(fields, ' ').collect();
            let (Some(xy), Some(last)) = (parts.get(1), parts.last()) else {
                continue;
            };
            if parts.len() < fields {
                continue;
            }
            let path = last.split('\t').next().unwrap_or(last).to_string();
            let mut flags = xy.chars();
            if flags.next().is_some_and(|c| c != '.') {
                status.staged.push(path.clone());
            }
            if flags.next().is_some_and(|c| c != '.') {
                status.modified.push(path);
            }
        }
    }
    status
}

pub(crate) fn parse_log(out: &str) -> Vec<Commit> {
    out.trim()
        .lines()
        .filter_map(|line| {
            let mut parts = line.split('\0');
            Some(Commit {
                sha: parts.next()?.to_string(),
                subject: parts.next()?.to_string(),
                author: parts.next()?.to_string(),
                date: parts.next()?.to_string(),
            })
        })
        .collect()
}

pub(crate) fn parse_show(out: &str) -> CommitDetail {
    let mut parts = out.trim().split('\0');
    let mut next = || parts.next().unwrap_or_default().to_string();
    CommitDetail {
        sha: next(),
        subject: next(),
        author: next(),
        date: next(),
        body: next().trim().to_string(),
        files: Vec::new(),
    }
}

/// Parses `git branch -a --format=%(refname)%00%(HEAD)`.
pub(crate) fn parse_branches(out: &str) -> Branches {
    let mut branches = Branches::default();
    for line in out.lines().filter(|l| !l.trim().is_empty()) {
        let mut parts = line.split('\0');
        let refname = parts.next().unwrap_or_default();
        let is_current = parts.next() == Some("*");
        let name = if let Some(local) = refname.strip_prefix("refs/heads/") {
            branches.local.push(local.to_string());
            local
        } else if let Some(remote) = refname.strip_prefix("refs/remotes/") {
            branches.remote.push(remote.to_string());
            remote
        } else {
            // Detached HEAD shows up as "(HEAD detached at ...)".
            refname
        };
        if is_current {
            branches.current = Some(name.to_string());
        }
    }
    branches
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn status_porcelain_v2() {
        let out = "\
# branch.oid 0123456789abcdef
# branch.head main
# branch.upstream origin/main
# branch.ab +2 -1
1 M. N... 100644 100644 100644 aaaa bbbb src/lib.rs
1 .M N... 100644 100644 100644 aaaa bbbb README with space.md
2 R. N... 100644 100644 100644 aaaa bbbb R100 new name.rs\told.rs
? notes.txt
";
        let st = parse_status(out);
        assert_eq!(st.branch.as_deref(), Some("main"));
        assert_eq!((st.ahead, st.behind), (2, 1));
        assert_eq!(st.staged, vec!["src/lib.rs", "new name.rs"]);
        assert_eq!(st.modified, vec!["README with space.md"]);
        assert_eq!(st.untracked, vec!["notes.txt"]);
        assert!(!st.is_clean());
        assert!(parse_status("# branch.head main\n").is_clean());
    }

    #[test]
    fn log_lines_need_four_fields() {
        let out = "abc123\0Fix bug\0Ada\02024-01-02T03:04:05+00:00\nbroken\0line\n";
        let commits = parse_log(out);
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].subject, "Fix bug");
        assert_eq!(commits[0].author, "Ada");
    }

    #[test]
    fn show_fills_missing_parts() {
        let d = parse_show("deadbeef\0Subject\0Ann\02024-01-01T00:00:00Z\0\nBody text\n\n");
        assert_eq!(d.sha, "deadbeef");
        assert_eq!(d.body, "Body text");
        let partial = parse_show("only-sha");
        assert_eq!(partial.sha, "only-sha");
        assert_eq!(partial.subject, "");
    }

    #[test]
    fn branches_split_by_refname() {
        let out = "refs/heads/feature/login\0 \nrefs/heads/main\0*\nrefs/remotes/origin/main\0 \n";
        let b = parse_branches(out);
        assert_eq!(b.current.as_deref(), Some("main"));
        assert_eq!(b.local, vec!["feature/login", "main"]);
        assert_eq!(b.remote, vec!["origin/main"]);
    }
}
