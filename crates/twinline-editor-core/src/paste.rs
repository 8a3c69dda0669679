//! Multi-line paste.
//!
//! Pasted text is cut into lines and grouped so multi-line constructs land in
//! a single block: consecutive ordered-list items stay together, consecutive
//! table rows stay together, and a code fence captures everything up to and
//! including its closing fence.
//!
//! ```text
//! "intro\n```\nlet x;\n```\n1. a\n2. b\n"
//!   -> ["intro", "```\nlet x;\n```", "1. a\n2. b\n"]
//! ```

use crate::edit::{Boundaries, EditOutcome, boundaries};
use crate::store::BlockStore;
use crate::syntax::{Construct, is_fence, is_ordered_item, is_table_row};
use crate::text::{char_len, split_lines};
use crate::types::Selection;

/// One block's worth of pasted source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteGroup {
    pub construct: Option<Construct>,
    pub text: String,
}

fn line_construct(line: &str) -> Option<Construct> {
    let trimmed = line.trim();
    if is_fence(trimmed) {
        Some(Construct::Fence)
    } else if is_ordered_item(trimmed) {
        Some(Construct::OrderedItem)
    } else if is_table_row(trimmed) {
        Some(Construct::TableRow)
    } else {
        None
    }
}

/// Group pasted lines into blocks.
///
/// A trailing line break is kept inside a trailing construct group rather
/// than producing an extra empty block.
pub fn group_lines(text: &str) -> Vec<PasteGroup> {
    let mut lines = split_lines(text);
    let trailing_break = lines.len() > 1 && lines.last().is_some_and(|l| l.is_empty());
    if trailing_break {
        lines.pop();
    }

    let mut groups: Vec<PasteGroup> = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let construct = line_construct(lines[i]);
        let mut text = lines[i].to_string();
        i += 1;
        match construct {
            Some(Construct::Fence) => {
                while i < lines.len() {
                    let line = lines[i];
                    text.push('\n');
                    text.push_str(line);
                    i += 1;
                    if is_fence(line.trim()) {
                        break;
                    }
                }
            }
            Some(kind) => {
                while i < lines.len() && line_construct(lines[i]) == Some(kind) {
                    text.push('\n');
                    text.push_str(lines[i]);
                    i += 1;
                }
            }
            None => {}
        }
        groups.push(PasteGroup { construct, text });
    }

    if trailing_break {
        match groups.last_mut() {
            Some(last) if last.construct.is_some() => last.text.push('\n'),
            _ => groups.push(PasteGroup {
                construct: None,
                text: String::new(),
            }),
        }
    }
    groups
}

/// Replace the selection with pasted text.
///
/// The start block's source before the selection is prepended to the first
/// group, the end block's source after it is appended to the last, and the
/// boundary blocks are replaced by one block per group. The caret lands
/// between the pasted text and what followed it. `None` for an empty paste.
pub fn paste(store: &mut BlockStore, selection: Selection, text: &str) -> Option<EditOutcome> {
    if text.is_empty() {
        return None;
    }
    let Boundaries {
        start,
        end,
        before,
        after,
    } = boundaries(store, selection);

    let mut raws: Vec<String> = group_lines(text).into_iter().map(|g| g.text).collect();
    let first = raws.first_mut()?;
    first.insert_str(0, &before);
    let last = raws.last_mut()?;
    let caret_offset = char_len(last);
    last.push_str(&after);

    let count = raws.len();
    let range = store.replace_range(start.block..=end.block, raws);
    tracing::debug!(
        start = start.block,
        end = end.block,
        inserted = count,
        blocks = store.len(),
        "pasted"
    );
    Some(EditOutcome::at(range.end.saturating_sub(1), caret_offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    fn texts(text: &str) -> Vec<String> {
        group_lines(text).into_iter().map(|g| g.text).collect()
    }

    fn raws(store: &BlockStore) -> Vec<&str> {
        store.blocks().iter().map(|b| b.raw()).collect()
    }

    #[test]
    fn test_plain_lines_become_blocks() {
        assert_eq!(texts("a\nb\nc"), vec!["a", "b", "c"]);
        assert_eq!(texts("a\r\nb"), vec!["a", "b"]);
        assert_eq!(texts("a\n"), vec!["a", ""]);
    }

    #[test]
    fn test_table_is_one_group() {
        assert_eq!(texts("|a|b|\n|c|d|\n"), vec!["|a|b|\n|c|d|\n"]);
    }

    #[test]
    fn test_ordered_list_is_one_group() {
        assert_eq!(texts("1. a\n2. b\nafter"), vec!["1. a\n2. b", "after"]);
        assert_eq!(texts("۱. اول\n۲. دوم"), vec!["۱. اول\n۲. دوم"]);
    }

    #[test]
    fn test_fence_captures_to_closing_fence() {
        assert_eq!(
            texts("intro\n```\n1. not a list\n| no |\n```\nafter"),
            vec!["intro", "```\n1. not a list\n| no |\n```", "after"]
        );
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        assert_eq!(texts("```rust\nfn x() {}\n"), vec!["```rust\nfn x() {}\n"]);
    }

    #[test]
    fn test_mixed_constructs_do_not_merge() {
        assert_eq!(texts("1. a\n|x|y|"), vec!["1. a", "|x|y|"]);
    }

    #[test]
    fn test_paste_table_into_empty_block() {
        let mut store = BlockStore::new(Direction::Ltr);
        let out = paste(&mut store, Selection::collapsed(0), "|a|b|\n|c|d|\n").expect("pasted");
        assert_eq!(raws(&store), vec!["|a|b|\n|c|d|\n"]);
        assert_eq!(out, EditOutcome::at(0, 12));
    }

    #[test]
    fn test_paste_wraps_before_and_after() {
        let mut store = BlockStore::from_text("start END\nnext", Direction::Ltr);
        let out = paste(&mut store, Selection::new(6, 9), "one\ntwo").expect("pasted");
        assert_eq!(raws(&store), vec!["start one", "two", "next"]);
        assert_eq!(out, EditOutcome::at(1, 3));
        assert_eq!(store.content(), "start one\ntwo\nnext");
    }

    #[test]
    fn test_paste_across_blocks() {
        let mut store = BlockStore::from_text("ab\ncd\nef", Direction::Ltr);
        let out = paste(&mut store, Selection::new(1, 7), "X").expect("pasted");
        assert_eq!(raws(&store), vec!["aXf"]);
        assert_eq!(out, EditOutcome::at(0, 2));
    }

    #[test]
    fn test_empty_paste_is_noop() {
        let mut store = BlockStore::from_text("ab", Direction::Ltr);
        assert_eq!(paste(&mut store, Selection::collapsed(1), ""), None);
        assert_eq!(store.content(), "ab");
    }
}
