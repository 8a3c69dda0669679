//! Edit operations over the block store.
//!
//! Every operation reads the affected blocks' raw source, computes the new
//! source and topology, and commits it through the store. They return where
//! the caret should land; presentation refresh, caret restoration and change
//! notification are left to the session.

use crate::offset::{BlockPosition, to_block_position};
use crate::store::BlockStore;
use crate::syntax::continuing_construct;
use crate::text::{char_len, is_blank, slice_chars};
use crate::types::Selection;

/// Where the caret lands after a committed edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditOutcome {
    pub caret: BlockPosition,
}

impl EditOutcome {
    pub fn at(block: usize, offset: usize) -> Self {
        Self {
            caret: BlockPosition::new(block, offset),
        }
    }
}

/// The raw source on either side of a selection: the start block up to the
/// start, and the end block from the end onward.
pub(crate) struct Boundaries {
    pub start: BlockPosition,
    pub end: BlockPosition,
    pub before: String,
    pub after: String,
}

pub(crate) fn boundaries(store: &BlockStore, selection: Selection) -> Boundaries {
    let start = to_block_position(store, selection.start());
    let end = to_block_position(store, selection.end());
    let raw_of = |index: usize| store.get(index).map(|b| b.raw()).unwrap_or_default();
    let before = slice_chars(raw_of(start.block), 0, start.offset).to_string();
    let end_raw = raw_of(end.block);
    let after = slice_chars(end_raw, end.offset, char_len(end_raw)).to_string();
    Boundaries {
        start,
        end,
        before,
        after,
    }
}

/// Enter.
///
/// A block opening a continuing construct grows a blank line instead of
/// splitting, unless it already ends with one. Anything else splits at the
/// caret and the caret moves to the start of the new block.
pub fn enter(store: &mut BlockStore, selection: Selection) -> EditOutcome {
    let caret = if selection.is_collapsed() {
        to_block_position(store, selection.head)
    } else {
        delete_range(store, selection).caret
    };

    let Some(raw) = store.get(caret.block).map(|b| b.raw().to_string()) else {
        return EditOutcome { caret };
    };

    if continuing_construct(raw.trim()).is_some() && !raw.ends_with("\n\n") {
        let grown = format!("{raw}\n\n");
        let len = char_len(&grown);
        store.set_raw(caret.block, grown);
        tracing::debug!(block = caret.block, "construct continued");
        return EditOutcome::at(caret.block, len);
    }

    match store.split(caret.block, caret.offset) {
        Some((_, right)) => {
            tracing::debug!(block = caret.block, at = caret.offset, "block split");
            EditOutcome::at(right, 0)
        }
        None => EditOutcome { caret },
    }
}

/// Backspace. `None` when there is nothing to delete.
pub fn delete_backward(store: &mut BlockStore, selection: Selection) -> Option<EditOutcome> {
    if !selection.is_collapsed() {
        return Some(delete_range(store, selection));
    }
    let pos = to_block_position(store, selection.head);
    if pos.offset == 0 {
        let (index, join) = store.merge_backward(pos.block)?;
        return Some(EditOutcome::at(index, join));
    }
    let raw = store.get(pos.block)?.raw();
    let edited = format!(
        "{}{}",
        slice_chars(raw, 0, pos.offset - 1),
        slice_chars(raw, pos.offset, char_len(raw))
    );
    store.set_raw(pos.block, edited);
    Some(EditOutcome::at(pos.block, pos.offset - 1))
}

/// Delete. `None` when there is nothing to delete.
pub fn delete_forward(store: &mut BlockStore, selection: Selection) -> Option<EditOutcome> {
    if !selection.is_collapsed() {
        return Some(delete_range(store, selection));
    }
    let pos = to_block_position(store, selection.head);
    let raw = store.get(pos.block)?.raw();
    let len = char_len(raw);
    if pos.offset >= len {
        let join = store.merge_forward(pos.block)?;
        return Some(EditOutcome::at(pos.block, join));
    }
    let edited = format!(
        "{}{}",
        slice_chars(raw, 0, pos.offset),
        slice_chars(raw, pos.offset + 1, len)
    );
    store.set_raw(pos.block, edited);
    Some(EditOutcome::at(pos.block, pos.offset))
}

/// Remove the selected range.
///
/// The start and end blocks are merged around the deletion. The merged block
/// is dropped when nothing visible is left in it, and the caret moves to the
/// end of the block before it.
pub fn delete_range(store: &mut BlockStore, selection: Selection) -> EditOutcome {
    let Boundaries {
        start,
        end,
        before,
        after,
    } = boundaries(store, selection);
    let merged = format!("{before}{after}");

    if is_blank(&merged) {
        store.replace_range(start.block..=end.block, Vec::new());
        tracing::debug!(start = start.block, end = end.block, "range deleted, block dropped");
        return match start.block.checked_sub(1) {
            Some(prev) => EditOutcome::at(prev, store.get(prev).map_or(0, |b| b.len_chars())),
            None => EditOutcome::at(0, 0),
        };
    }

    store.replace_range(start.block..=end.block, vec![merged]);
    tracing::debug!(start = start.block, end = end.block, "range deleted");
    EditOutcome::at(start.block, start.offset)
}

/// Raw source of the selected range. `None` for a collapsed selection.
pub fn copy_text(store: &BlockStore, selection: Selection) -> Option<String> {
    if selection.is_collapsed() {
        return None;
    }
    let content = store.content();
    Some(slice_chars(&content, selection.start(), selection.end()).to_string())
}

/// Copy, then delete the range.
pub fn cut(store: &mut BlockStore, selection: Selection) -> Option<(String, EditOutcome)> {
    let text = copy_text(store, selection)?;
    let outcome = delete_range(store, selection);
    Some((text, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    fn store(text: &str) -> BlockStore {
        BlockStore::from_text(text, Direction::Ltr)
    }

    fn raws(store: &BlockStore) -> Vec<&str> {
        store.blocks().iter().map(|b| b.raw()).collect()
    }

    #[test]
    fn test_enter_splits_plain_text() {
        let mut s = store("hello world");
        let out = enter(&mut s, Selection::collapsed(5));
        assert_eq!(raws(&s), vec!["hello", " world"]);
        assert_eq!(out, EditOutcome::at(1, 0));
    }

    #[test]
    fn test_enter_continues_fence() {
        let mut s = store("```code");
        let out = enter(&mut s, Selection::collapsed(3));
        assert_eq!(s.len(), 1);
        assert_eq!(raws(&s), vec!["```code\n\n"]);
        assert_eq!(out, EditOutcome::at(0, 9));
    }

    #[test]
    fn test_enter_on_terminated_construct_splits() {
        let mut s = store("| a |\n\n");
        // from_text splits on every newline, rebuild as one block
        s.replace_range(0..=2, vec!["| a |\n\n".to_string()]);
        let out = enter(&mut s, Selection::collapsed(7));
        assert_eq!(raws(&s), vec!["| a |\n\n", ""]);
        assert_eq!(out, EditOutcome::at(1, 0));
    }

    #[test]
    fn test_enter_at_edges() {
        let mut s = store("ab");
        enter(&mut s, Selection::collapsed(0));
        assert_eq!(raws(&s), vec!["", "ab"]);
        let out = enter(&mut s, Selection::collapsed(3));
        assert_eq!(raws(&s), vec!["", "ab", ""]);
        assert_eq!(out, EditOutcome::at(2, 0));
    }

    #[test]
    fn test_enter_replaces_selection() {
        let mut s = store("abcdef");
        let out = enter(&mut s, Selection::new(2, 4));
        assert_eq!(raws(&s), vec!["ab", "ef"]);
        assert_eq!(out, EditOutcome::at(1, 0));
    }

    #[test]
    fn test_backspace_merges_at_block_start() {
        let mut s = store("ab\ncd");
        let out = delete_backward(&mut s, Selection::collapsed(3)).expect("merged");
        assert_eq!(raws(&s), vec!["abcd"]);
        assert_eq!(out, EditOutcome::at(0, 2));
    }

    #[test]
    fn test_backspace_at_document_start_is_noop() {
        let mut s = store("ab");
        assert_eq!(delete_backward(&mut s, Selection::collapsed(0)), None);
        assert_eq!(raws(&s), vec!["ab"]);
    }

    #[test]
    fn test_backspace_mid_block() {
        let mut s = store("héllo");
        let out = delete_backward(&mut s, Selection::collapsed(2)).expect("deleted");
        assert_eq!(raws(&s), vec!["hllo"]);
        assert_eq!(out, EditOutcome::at(0, 1));
    }

    #[test]
    fn test_delete_merges_at_block_end() {
        let mut s = store("ab\ncd");
        let out = delete_forward(&mut s, Selection::collapsed(2)).expect("merged");
        assert_eq!(raws(&s), vec!["abcd"]);
        assert_eq!(out, EditOutcome::at(0, 2));
        assert_eq!(delete_forward(&mut s, Selection::collapsed(4)), None);
    }

    #[test]
    fn test_delete_mid_block() {
        let mut s = store("abc");
        let out = delete_forward(&mut s, Selection::collapsed(1)).expect("deleted");
        assert_eq!(raws(&s), vec!["ac"]);
        assert_eq!(out, EditOutcome::at(0, 1));
    }

    #[test]
    fn test_delete_range_across_blocks() {
        let mut s = store("abc\ndef\nghi");
        let out = delete_range(&mut s, Selection::new(9, 1));
        assert_eq!(raws(&s), vec!["ahi"]);
        assert_eq!(out, EditOutcome::at(0, 1));
    }

    #[test]
    fn test_delete_range_drops_blank_block() {
        let mut s = store("ab\ncd\nef");
        let out = delete_range(&mut s, Selection::new(3, 5));
        assert_eq!(raws(&s), vec!["ab", "ef"]);
        assert_eq!(out, EditOutcome::at(0, 2));
    }

    #[test]
    fn test_delete_everything_reseeds() {
        let mut s = store("ab\ncd");
        let out = delete_range(&mut s, Selection::new(0, 5));
        assert_eq!(raws(&s), vec![""]);
        assert_eq!(out, EditOutcome::at(0, 0));
    }

    #[test]
    fn test_copy_is_raw_source() {
        let s = store("a **b**\n`c`");
        assert_eq!(copy_text(&s, Selection::new(2, 10)).as_deref(), Some("**b**\n`c"));
        assert_eq!(copy_text(&s, Selection::collapsed(3)), None);
    }

    #[test]
    fn test_cut() {
        let mut s = store("hello world");
        let (text, out) = cut(&mut s, Selection::new(5, 11)).expect("cut");
        assert_eq!(text, " world");
        assert_eq!(raws(&s), vec!["hello"]);
        assert_eq!(out, EditOutcome::at(0, 5));
        assert!(cut(&mut s, Selection::collapsed(2)).is_none());
    }
}
