//! The document: an ordered, never-empty sequence of blocks.
//!
//! Blocks are addressed by index. Any topology change (split, merge, insert,
//! remove, replace) invalidates indices held by callers; re-resolve through
//! [`BlockStore::index_of`] if a block must be tracked across a mutation.

use std::ops::RangeInclusive;

use smol_str::SmolStr;

use crate::block::{Block, make_block_id};
use crate::render::RenderAdapter;
use crate::text::split_at_char;
use crate::types::Direction;

#[derive(Debug, Clone)]
pub struct BlockStore {
    blocks: Vec<Block>,
    next_id: usize,
    default_direction: Direction,
}

impl Default for BlockStore {
    fn default() -> Self {
        Self::new(Direction::default())
    }
}

impl BlockStore {
    /// A store holding one empty block.
    pub fn new(default_direction: Direction) -> Self {
        Self::from_text("", default_direction)
    }

    /// One block per `\n`-separated line.
    pub fn from_text(text: &str, default_direction: Direction) -> Self {
        let mut store = Self {
            blocks: Vec::new(),
            next_id: 0,
            default_direction,
        };
        store.set_text(text);
        store
    }

    /// Replace the whole document.
    pub fn set_text(&mut self, text: &str) {
        let blocks: Vec<Block> = text.split('\n').map(|line| self.make_block(line)).collect();
        self.blocks = blocks;
        tracing::debug!(blocks = self.blocks.len(), "document replaced");
    }

    fn make_block(&mut self, raw: &str) -> Block {
        let id = make_block_id(self.next_id);
        self.next_id += 1;
        Block::new(id, raw, self.default_direction)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: the store never holds zero blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Block> {
        self.blocks.get_mut(index)
    }

    pub fn last_index(&self) -> usize {
        self.blocks.len().saturating_sub(1)
    }

    pub fn index_of(&self, id: &SmolStr) -> Option<usize> {
        self.blocks.iter().position(|b| b.id() == id)
    }

    /// Raw text of every block joined by `\n`.
    pub fn content(&self) -> String {
        self.blocks
            .iter()
            .map(Block::raw)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Length of [`content`](Self::content) in chars.
    pub fn len_chars(&self) -> usize {
        let text: usize = self.blocks.iter().map(Block::len_chars).sum();
        text + self.blocks.len().saturating_sub(1)
    }

    pub fn default_direction(&self) -> Direction {
        self.default_direction
    }

    /// Change the fallback direction and re-tag every block.
    pub fn set_default_direction(&mut self, direction: Direction) {
        self.default_direction = direction;
        for block in &mut self.blocks {
            block.redetect(direction);
        }
    }

    /// Replace a block's source. Out-of-range indices are ignored.
    pub fn set_raw(&mut self, index: usize, raw: impl Into<String>) {
        let direction = self.default_direction;
        if let Some(block) = self.blocks.get_mut(index) {
            block.set_raw(raw, direction);
        }
    }

    /// Insert a new block after `index` and return the new block's index.
    pub fn insert_after(&mut self, index: usize, raw: &str) -> usize {
        let at = (index + 1).min(self.blocks.len());
        let block = self.make_block(raw);
        self.blocks.insert(at, block);
        tracing::debug!(index = at, blocks = self.blocks.len(), "block inserted");
        at
    }

    /// Split a block at a char offset into `(left, right)` indices.
    ///
    /// The left block keeps the original identity.
    pub fn split(&mut self, index: usize, at: usize) -> Option<(usize, usize)> {
        let raw = self.blocks.get(index)?.raw().to_string();
        let (before, after) = split_at_char(&raw, at);
        self.set_raw(index, before);
        let right = self.insert_after(index, after);
        Some((index, right))
    }

    /// Append the next block's source onto this one and remove the next block.
    ///
    /// Returns the join offset (this block's previous length), or `None` when
    /// there is no next block.
    pub fn merge_forward(&mut self, index: usize) -> Option<usize> {
        if index + 1 >= self.blocks.len() {
            return None;
        }
        let next = self.blocks.remove(index + 1);
        let block = &self.blocks[index];
        let join = block.len_chars();
        let merged = format!("{}{}", block.raw(), next.raw());
        self.set_raw(index, merged);
        tracing::debug!(index, blocks = self.blocks.len(), "merged forward");
        Some(join)
    }

    /// Prepend the previous block's source onto this one and remove the
    /// previous block.
    ///
    /// Returns the merged block's new index and the join offset, or `None`
    /// when there is no previous block.
    pub fn merge_backward(&mut self, index: usize) -> Option<(usize, usize)> {
        if index == 0 || index >= self.blocks.len() {
            return None;
        }
        let prev = self.blocks.remove(index - 1);
        let index = index - 1;
        let join = prev.len_chars();
        let merged = format!("{}{}", prev.raw(), self.blocks[index].raw());
        self.set_raw(index, merged);
        tracing::debug!(index, blocks = self.blocks.len(), "merged backward");
        Some((index, join))
    }

    /// Remove a block. Removing the last remaining block re-seeds an empty one.
    pub fn remove(&mut self, index: usize) -> Option<Block> {
        if index >= self.blocks.len() {
            return None;
        }
        let removed = self.blocks.remove(index);
        self.ensure_not_empty();
        tracing::debug!(index, blocks = self.blocks.len(), "block removed");
        Some(removed)
    }

    /// Replace the blocks in `range` with one new block per source string.
    ///
    /// Returns the index range of the new blocks. An empty `raws` removes the
    /// range (re-seeding a placeholder block if nothing is left).
    pub fn replace_range(
        &mut self,
        range: RangeInclusive<usize>,
        raws: Vec<String>,
    ) -> std::ops::Range<usize> {
        let last = self.last_index();
        let start = (*range.start()).min(last);
        let end = (*range.end()).clamp(start, last);
        let new_blocks: Vec<Block> = raws.iter().map(|raw| self.make_block(raw)).collect();
        let count = new_blocks.len();
        self.blocks.splice(start..=end, new_blocks);
        self.ensure_not_empty();
        tracing::debug!(start, end, inserted = count, blocks = self.blocks.len(), "blocks replaced");
        start..start + count
    }

    fn ensure_not_empty(&mut self) {
        if self.blocks.is_empty() {
            let block = self.make_block("");
            self.blocks.push(block);
        }
    }

    /// Flat offset of the first char of a block.
    pub fn block_start(&self, index: usize) -> usize {
        self.blocks
            .iter()
            .take(index)
            .map(|b| b.len_chars() + 1)
            .sum()
    }

    /// Render every stale presentation.
    pub fn refresh<R: RenderAdapter + ?Sized>(&mut self, renderer: &R) {
        for block in &mut self.blocks {
            block.refresh(renderer);
        }
    }

    pub fn enter_raw(&mut self, index: usize) -> bool {
        self.blocks
            .get_mut(index)
            .is_some_and(|block| block.enter_raw())
    }

    pub fn leave_raw<R: RenderAdapter + ?Sized>(&mut self, index: usize, renderer: &R) -> bool {
        self.blocks
            .get_mut(index)
            .is_some_and(|block| block.leave_raw(renderer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::MarkdownRenderer;
    use crate::types::BlockMode;

    fn store(text: &str) -> BlockStore {
        BlockStore::from_text(text, Direction::Rtl)
    }

    fn raws(store: &BlockStore) -> Vec<&str> {
        store.blocks().iter().map(Block::raw).collect()
    }

    #[test]
    fn test_from_text_splits_lines() {
        let s = store("one\ntwo\n\nfour");
        assert_eq!(raws(&s), vec!["one", "two", "", "four"]);
        assert_eq!(s.content(), "one\ntwo\n\nfour");
        assert_eq!(s.len_chars(), 13);
    }

    #[test]
    fn test_empty_text_has_one_block() {
        let s = store("");
        assert_eq!(s.len(), 1);
        assert_eq!(s.content(), "");
        assert_eq!(s.len_chars(), 0);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut s = store("a\nb");
        let new = s.insert_after(0, "c");
        assert_eq!(new, 1);
        let ids: Vec<_> = s.blocks().iter().map(|b| b.id().to_string()).collect();
        assert_eq!(ids, vec!["b-0", "b-2", "b-1"]);
        assert_eq!(s.index_of(&SmolStr::new("b-1")), Some(2));
    }

    #[test]
    fn test_split_then_merge_is_identity() {
        for k in 0..=5 {
            let mut s = store("héllo");
            let (left, right) = s.split(0, k).expect("split");
            let (merged, join) = s.merge_backward(right).expect("merge");
            assert_eq!(merged, left);
            assert_eq!(join, k);
            assert_eq!(raws(&s), vec!["héllo"]);
        }
    }

    #[test]
    fn test_merge_forward() {
        let mut s = store("ab\ncd\nef");
        assert_eq!(s.merge_forward(0), Some(2));
        assert_eq!(raws(&s), vec!["abcd", "ef"]);
        assert_eq!(s.merge_forward(1), None);
    }

    #[test]
    fn test_merge_backward_at_start_is_none() {
        let mut s = store("ab\ncd");
        assert_eq!(s.merge_backward(0), None);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_remove_last_block_reseeds() {
        let mut s = store("only");
        let removed = s.remove(0).expect("removed");
        assert_eq!(removed.raw(), "only");
        assert_eq!(s.len(), 1);
        assert_eq!(s.content(), "");
    }

    #[test]
    fn test_replace_range() {
        let mut s = store("a\nb\nc\nd");
        let range = s.replace_range(1..=2, vec!["x".into(), "y".into(), "z".into()]);
        assert_eq!(range, 1..4);
        assert_eq!(raws(&s), vec!["a", "x", "y", "z", "d"]);

        let range = s.replace_range(0..=4, vec![]);
        assert_eq!(range, 0..0);
        assert_eq!(s.len(), 1);
        assert_eq!(s.content(), "");
    }

    #[test]
    fn test_block_start() {
        let s = store("ab\n\ncde");
        assert_eq!(s.block_start(0), 0);
        assert_eq!(s.block_start(1), 3);
        assert_eq!(s.block_start(2), 4);
    }

    #[test]
    fn test_set_default_direction_retags() {
        let mut s = store("«x»\nabc");
        assert_eq!(s.get(0).map(Block::direction), Some(Direction::Rtl));
        s.set_default_direction(Direction::Ltr);
        assert_eq!(s.get(0).map(Block::direction), Some(Direction::Ltr));
        assert_eq!(s.get(1).map(Block::direction), Some(Direction::Ltr));
    }

    #[test]
    fn test_mutation_marks_stale_but_keeps_mode() {
        let renderer = MarkdownRenderer::default();
        let mut s = store("*a*");
        s.refresh(&renderer);
        assert!(s.enter_raw(0));
        s.set_raw(0, "*ab*");
        let block = s.get(0).expect("block");
        assert!(block.is_stale());
        assert_eq!(block.mode(), BlockMode::Raw);
        assert!(s.leave_raw(0, &renderer));
        assert!(!s.get(0).expect("block").is_stale());
    }
}
