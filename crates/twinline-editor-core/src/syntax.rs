//! Recognition of the markdown constructs that span several physical lines.
//!
//! A block whose source opens one of these constructs keeps growing on Enter
//! instead of splitting, and pasted lines belonging to one are coalesced into
//! a single block.

/// A multi-line construct that must not be split by Enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Construct {
    /// ```` ``` ```` or `...` fence opener
    Fence,
    /// `1. item`, including Extended Arabic-Indic digits
    OrderedItem,
    /// `| cell | cell |`
    TableRow,
}

fn is_list_digit(c: char) -> bool {
    c.is_ascii_digit() || ('\u{06F0}'..='\u{06F9}').contains(&c)
}

/// Text opens with a code fence, ignoring surrounding whitespace.
pub fn is_fence(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.starts_with("```") || trimmed.starts_with("...")
}

/// Text opens with an ordered-list marker: digits, a dot, then whitespace.
pub fn is_ordered_item(text: &str) -> bool {
    let rest = text.trim_start_matches(is_list_digit);
    if rest.len() == text.len() {
        return false;
    }
    let mut after = rest.chars();
    after.next() == Some('.') && after.next().is_some_and(char::is_whitespace)
}

/// Text opens with a table row: a pipe, at least one cell character, and another pipe.
pub fn is_table_row(text: &str) -> bool {
    text.trim_start()
        .strip_prefix('|')
        .and_then(|rest| rest.find('|'))
        .is_some_and(|next_pipe| next_pipe > 0)
}

/// Which continuing construct, if any, the block source opens.
pub fn continuing_construct(raw: &str) -> Option<Construct> {
    if is_fence(raw) {
        Some(Construct::Fence)
    } else if is_ordered_item(raw) {
        Some(Construct::OrderedItem)
    } else if is_table_row(raw) {
        Some(Construct::TableRow)
    } else {
        None
    }
}

/// ATX heading level of the source, if it starts with `#`.
pub fn heading_level(raw: &str) -> Option<u8> {
    let hashes = raw.chars().take_while(|c| *c == '#').count();
    if hashes == 0 {
        return None;
    }
    Some(hashes.min(6) as u8)
}

/// Counts of the inline marker characters that vanish when a line is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkerCounts {
    pub star: usize,
    pub tilde: usize,
    pub backtick: usize,
}

impl MarkerCounts {
    pub fn count(text: &str) -> Self {
        let mut counts = Self::default();
        for c in text.chars() {
            match c {
                '*' => counts.star += 1,
                '~' => counts.tilde += 1,
                '`' => counts.backtick += 1,
                _ => {}
            }
        }
        counts
    }

    /// Every marker kind appears an even number of times.
    pub fn is_balanced(&self) -> bool {
        self.star % 2 == 0 && self.tilde % 2 == 0 && self.backtick % 2 == 0
    }

    pub fn total(&self) -> usize {
        self.star + self.tilde + self.backtick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fence() {
        assert!(is_fence("```rust"));
        assert!(is_fence("  ```"));
        assert!(is_fence("..."));
        assert!(!is_fence("``not"));
        assert!(!is_fence("text ```"));
    }

    #[test]
    fn test_ordered_item() {
        assert!(is_ordered_item("1. first"));
        assert!(is_ordered_item("12.\tsecond"));
        assert!(is_ordered_item("۱. اول"));
        assert!(!is_ordered_item("1.first"));
        assert!(!is_ordered_item(" 1. indented"));
        assert!(!is_ordered_item("a. letter"));
        assert!(!is_ordered_item("1 no dot"));
    }

    #[test]
    fn test_table_row() {
        assert!(is_table_row("|a|b|"));
        assert!(is_table_row("  | a |"));
        assert!(is_table_row("| |"));
        assert!(!is_table_row("||"));
        assert!(!is_table_row("|a"));
        assert!(!is_table_row("a|b|"));
    }

    #[test]
    fn test_continuing_construct() {
        assert_eq!(continuing_construct("```code"), Some(Construct::Fence));
        assert_eq!(continuing_construct("3. x"), Some(Construct::OrderedItem));
        assert_eq!(continuing_construct("|a|b|"), Some(Construct::TableRow));
        assert_eq!(continuing_construct("hello world"), None);
        assert_eq!(continuing_construct(""), None);
    }

    #[test]
    fn test_heading_level() {
        assert_eq!(heading_level("# title"), Some(1));
        assert_eq!(heading_level("### title"), Some(3));
        assert_eq!(heading_level("######## deep"), Some(6));
        assert_eq!(heading_level("title #"), None);
    }

    #[test]
    fn test_marker_counts() {
        let counts = MarkerCounts::count("**bold** ~~x~~ `c`");
        assert_eq!(counts.star, 4);
        assert_eq!(counts.tilde, 4);
        assert_eq!(counts.backtick, 2);
        assert!(counts.is_balanced());
        assert_eq!(counts.total(), 10);

        assert!(!MarkerCounts::count("*open").is_balanced());
        assert_eq!(MarkerCounts::count("plain"), MarkerCounts::default());
    }
}
