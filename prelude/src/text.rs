//! Pure text helpers. Inputs are treated as lines split on `\n` / `\r\n`;
//! outputs are joined with `\n` and carry no trailing newline.

use serde::Serialize;
use serde_json::json;

use crate::handle::Prelude;

/// First `max` characters of `s`, owned.
pub(crate) fn preview(s: &str, max: usize) -> String {
    head_chars(s, max).to_string()
}

fn head_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WordCount {
    pub lines: usize,
    pub words: usize,
    pub chars: usize,
}

impl Prelude {
    pub fn head(&self, text: &str, n: usize) -> String {
        let lines: Vec<&str> = text.lines().take(n).collect();
        let out = lines.join("\n");
        self.emit(
            "head",
            json!({ "lines": lines.len(), "preview": preview(&out, 500) }),
        );
        out
    }

    pub fn tail(&self, text: &str, n: usize) -> String {
        let all: Vec<&str> = text.lines().collect();
        let lines = &all[all.len().saturating_sub(n)..];
        let out = lines.join("\n");
        self.emit(
            "tail",
            json!({ "lines": lines.len(), "preview": preview(&out, 500) }),
        );
        out
    }

    pub fn wc(&self, text: &str) -> WordCount {
        let counts = WordCount {
            lines: text.lines().count(),
            words: text.split_whitespace().count(),
            chars: text.chars().count(),
        };
        self.emit(
            "wc",
            json!({ "lines": counts.lines, "words": counts.words, "chars": counts.chars }),
        );
        counts
    }

    /// Sorts lines; `unique` drops repeats anywhere in the input before sorting.
    pub fn sort_lines(&self, text: &str, reverse: bool, unique: bool) -> String {
        let mut lines: Vec<&str> = text.lines().collect();
        if unique {
            let mut seen = std::collections::HashSet::new();
            lines.retain(|l| seen.insert(*l));
        }
        lines.sort_unstable();
        if reverse {
            lines.reverse();
        }
        self.emit(
            "sort_lines",
            json!({ "lines": lines.len(), "unique": unique, "reverse": reverse }),
        );
        lines.join("\n")
    }

    /// Collapses adjacent duplicate lines.
    pub fn uniq(&self, text: &str) -> String {
        let groups = adjacent_groups(text);
        self.emit("uniq", json!({ "groups": groups.len(), "count_mode": false }));
        groups
            .into_iter()
            .map(|(_, line)| line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Adjacent duplicate runs as `(count, line)`.
    pub fn uniq_counts(&self, text: &str) -> Vec<(usize, String)> {
        let groups = adjacent_groups(text);
        self.emit("uniq", json!({ "groups": groups.len(), "count_mode": true }));
        groups
            .into_iter()
            .map(|(n, line)| (n, line.to_string()))
            .collect()
    }

    /// Selects 0-indexed columns from each line, joined by a space.
    /// Splits on whitespace when `sep` is `None`; out-of-range indices are skipped.
    pub fn cols(&self, text: &str, indices: &[usize], sep: Option<&str>) -> String {
        let rows: Vec<String> = text
            .lines()
            .map(|line| {
                let parts: Vec<&str> = match sep {
                    Some(s) if !s.is_empty() => line.split(s).collect(),
                    _ => line.split_whitespace().collect(),
                };
                indices
                    .iter()
                    .filter_map(|&i| parts.get(i).copied())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        self.emit("cols", json!({ "lines": rows.len(), "columns": indices }));
        rows.join("\n")
    }
}

fn adjacent_groups(text: &str) -> Vec<(usize, &str)> {
    let mut groups: Vec<(usize, &str)> = Vec::new();
    for line in text.lines() {
        if let Some((n, prev)) = groups.last_mut() {
            if *prev == line {
                *n += 1;
                continue;
            }
        }
        groups.push((1, line));
    }
    groups
}
