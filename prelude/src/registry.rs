//! Static catalogue of the helpers, used to template the helper reference
//! shown to notebook users.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HelperDoc {
    pub name: &'static str,
    pub signature: &'static str,
    /// First line of the helper's documentation.
    pub doc: &'static str,
    pub category: &'static str,
}

const fn helper(
    category: &'static str,
    name: &'static str,
    signature: &'static str,
    doc: &'static str,
) -> HelperDoc {
    HelperDoc {
        name,
        signature,
        doc,
        category,
    }
}

const HELPERS: &[HelperDoc] = &[
    helper("Navigation", "pwd", "()", "Return the session working directory."),
    helper("Navigation", "cd", "(path)", "Change the session working directory."),
    helper("Navigation", "ls", "(path)", "List directory contents, sorted."),
    helper("Navigation", "tree", "(path, max_depth=3, show_hidden=false)", "Return a directory tree."),
    helper("Navigation", "stat", "(path)", "Get file or directory info."),
    helper("Shell", "env", "()", "List environment variables visible to commands."),
    helper("Shell", "env_get", "(key)", "Get an environment variable."),
    helper("Shell", "env_set", "(key, value)", "Set an environment variable for spawned commands."),
    helper("Shell", "run", "(cmd, cwd=None, timeout=None)", "Run a shell command."),
    helper("Shell", "sh", "(cmd, cwd=None, timeout=None)", "Run a command via the login shell with the environment snapshot."),
    helper("File I/O", "read", "(path, offset=1, limit=None)", "Read file contents, optionally a line window."),
    helper("File I/O", "write", "(path, content)", "Write file contents, creating parents."),
    helper("File I/O", "append", "(path, content)", "Append to a file, creating parents."),
    helper("File I/O", "cat", "(paths, separator=\"\\n\")", "Concatenate multiple files."),
    helper("File I/O", "touch", "(path)", "Create an empty file or update its mtime."),
    helper("File ops", "mkdir", "(path)", "Create a directory and its parents."),
    helper("File ops", "rm", "(path, recursive=false)", "Delete a file, or a directory tree when recursive."),
    helper("File ops", "mv", "(src, dst)", "Move or rename a file or directory."),
    helper("File ops", "cp", "(src, dst)", "Copy a file or directory tree."),
    helper("Search", "find", "(pattern, path=\".\", kind=file, limit=1000, hidden=false, sort_by_mtime=false)", "Recursive glob find. Respects .gitignore."),
    helper("Search", "grep", "(pattern, path, ignore_case=false, literal=false, context=0)", "Grep a single file. Returns (line_number, text) pairs."),
    helper("Search", "rgrep", "(pattern, path=\".\", glob=\"*\", ignore_case=false, literal=false, limit=100, hidden=false)", "Recursive grep across matching files. Respects .gitignore."),
    helper("Search", "glob_files", "(pattern, path=\".\", hidden=false)", "Non-recursive glob. Respects .gitignore."),
    helper("Text", "head", "(text, n=10)", "Return the first n lines of text."),
    helper("Text", "tail", "(text, n=10)", "Return the last n lines of text."),
    helper("Text", "wc", "(text)", "Line, word and char count."),
    helper("Text", "sort_lines", "(text, reverse=false, unique=false)", "Sort lines of text."),
    helper("Text", "uniq", "(text)", "Remove adjacent duplicate lines."),
    helper("Text", "uniq_counts", "(text)", "Count adjacent duplicate lines."),
    helper("Text", "cols", "(text, indices, sep=None)", "Extract 0-indexed columns from text."),
    helper("Find/Replace", "replace", "(path, pattern, repl, regex=false)", "Replace text in a file."),
    helper("Find/Replace", "sed", "(path, pattern, repl, flags)", "Regex replace in a file. Returns the count."),
    helper("Find/Replace", "rsed", "(pattern, repl, path=\".\", glob=\"*\", flags, hidden=false)", "Recursive regex replace. Respects .gitignore."),
    helper("Line ops", "lines", "(path, start=1, end=None)", "Extract an inclusive 1-indexed line range."),
    helper("Line ops", "delete_lines", "(path, start, end=None)", "Delete an inclusive 1-indexed line range."),
    helper("Line ops", "delete_matching", "(path, pattern, regex=true)", "Delete lines matching a pattern."),
    helper("Line ops", "insert_at", "(path, line, text, after=true)", "Insert text after or before a line."),
    helper("Batch", "diff", "(a, b)", "Compare two files as a unified diff."),
    helper("Batch", "batch", "(paths, f)", "Apply a function to multiple files."),
    helper("Git", "git_status", "(cwd=None)", "Structured git status."),
    helper("Git", "git_diff", "(paths, staged=false, ref=None, stat=false, cwd=None)", "Show git diff."),
    helper("Git", "git_log", "(n=10, oneline=true, ref_range=None, paths=[], cwd=None)", "Git log as {sha, subject, author, date} entries."),
    helper("Git", "git_show", "(ref=\"HEAD\", stat=true, cwd=None)", "Commit details with changed files."),
    helper("Git", "git_file_at", "(ref, path, lines=None, cwd=None)", "File content at a ref, optionally a line range."),
    helper("Git", "git_branch", "(cwd=None)", "Current, local and remote branches."),
    helper("Git", "git_has_changes", "(cwd=None)", "Whether there are uncommitted changes."),
];

/// Every helper, sorted by `(category, name)`.
pub fn helper_docs() -> Vec<HelperDoc> {
    let mut docs = HELPERS.to_vec();
    docs.sort_by(|a, b| (a.category, a.name).cmp(&(b.category, b.name)));
    docs
}
