/// First `max` characters of `s`, never splitting a character.
pub fn head_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Caps `s` at `max` characters, appending `...` when anything was cut.
pub fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    let head = head_chars(s, max);
    if head.len() == s.len() {
        return s.to_string();
    }
    format!("{head}...")
}

/// Replaces embedded newlines with a literal `\n`.
pub fn escape_newlines(s: &str) -> String {
    s.replace('\n', "\\n")
}
