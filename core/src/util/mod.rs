mod text;

pub use text::{escape_newlines, head_chars, truncate_with_ellipsis};
