//! Offset conversion and small string helpers.
//!
//! The editor deals with three offset systems:
//! 1. **Blocks and flat offsets**: Unicode scalar values (Rust `char` count)
//! 2. **markdown-weaver and Rust strings**: UTF-8 byte offsets
//! 3. **JavaScript DOM**: UTF-16 code units
//!
//! Everything in the core speaks chars; conversions happen at the edges.

use crate::types::PLACEHOLDER;

/// Number of chars in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Convert a char offset to a UTF-8 byte offset, clamping to the end.
///
/// # Example
/// ```
/// use twinline_editor_core::text::char_to_byte;
/// let text = "שלום abc";
/// assert_eq!(char_to_byte(text, 4), 8);
/// assert_eq!(char_to_byte(text, 100), text.len());
/// ```
pub fn char_to_byte(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(byte_idx, _)| byte_idx)
        .unwrap_or(text.len())
}

/// Convert a UTF-8 byte offset to a char offset.
pub fn byte_to_char(text: &str, byte_offset: usize) -> usize {
    text.char_indices()
        .take_while(|(idx, _)| *idx < byte_offset)
        .count()
}

/// Convert a char offset to UTF-16 code units (for the DOM Selection API).
pub fn char_to_utf16(text: &str, char_offset: usize) -> usize {
    text.chars().take(char_offset).map(char::len_utf16).sum()
}

/// Convert UTF-16 code units (from the DOM) to a char offset.
///
/// An offset landing inside a surrogate pair rounds down to the pair's start.
pub fn utf16_to_char(text: &str, utf16_offset: usize) -> usize {
    let mut units = 0;
    for (idx, c) in text.chars().enumerate() {
        units += c.len_utf16();
        if units > utf16_offset {
            return idx;
        }
    }
    char_len(text)
}

/// Split at a char offset, clamping to the end.
pub fn split_at_char(text: &str, char_offset: usize) -> (&str, &str) {
    text.split_at(char_to_byte(text, char_offset))
}

/// Slice by char range, clamping both ends.
pub fn slice_chars(text: &str, start: usize, end: usize) -> &str {
    let start_byte = char_to_byte(text, start);
    let end_byte = char_to_byte(text, end.max(start));
    &text[start_byte..end_byte]
}

/// True when the text has nothing visible: empty, whitespace, or only placeholder glyphs.
pub fn is_blank(text: &str) -> bool {
    text.chars().all(|c| c.is_whitespace() || c == PLACEHOLDER)
}

/// Drop placeholder glyphs the surface may have materialized in empty blocks.
pub fn strip_placeholder(text: &str) -> String {
    text.chars().filter(|c| *c != PLACEHOLDER).collect()
}

/// Split on `\r\n`, `\r` or `\n`. Always yields at least one (possibly empty) line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    loop {
        match rest.find(['\r', '\n']) {
            Some(idx) => {
                lines.push(&rest[..idx]);
                let skip = if rest[idx..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[idx + skip..];
            }
            None => {
                lines.push(rest);
                return lines;
            }
        }
    }
}
