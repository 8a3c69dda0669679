//! In-memory surface and clipboard.
//!
//! `HeadlessSurface` materializes blocks the way the DOM surface does (one
//! element per block, holding either the rendered markup or the raw source)
//! but keeps everything in plain structs. It backs the CLI and the test
//! suites, and can simulate native typing so the input path can be exercised
//! without a browser.

use std::cell::RefCell;

use serde::Serialize;
use smol_str::SmolStr;

use crate::block::Block;
use crate::error::PlatformError;
use crate::platform::{ClipboardPlatform, SelectionState, Surface, SurfacePoint, SurfaceRange};
use crate::text::{char_len, slice_chars};
use crate::types::{BlockMode, Direction};

/// One block as the surface currently shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterializedBlock {
    pub id: SmolStr,
    pub direction: Direction,
    pub mode: BlockMode,
    pub markup: String,
    pub runs: Vec<String>,
    #[serde(skip)]
    fingerprint: u64,
}

impl MaterializedBlock {
    fn from_block(block: &Block) -> Self {
        Self {
            id: block.id().clone(),
            direction: block.direction(),
            mode: block.mode(),
            markup: block.content_markup(),
            runs: block.runs(),
            fingerprint: block.fingerprint(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    blocks: Vec<MaterializedBlock>,
    selection: SelectionState,
    placeholder: String,
    placeholder_visible: bool,
    reject_selections: bool,
    last_sync_touched: usize,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            selection: SelectionState::None,
            placeholder: String::new(),
            placeholder_visible: false,
            reject_selections: false,
            last_sync_touched: 0,
        }
    }

    pub fn blocks(&self) -> &[MaterializedBlock] {
        &self.blocks
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn is_placeholder_shown(&self) -> bool {
        self.placeholder_visible
    }

    /// Number of blocks re-materialized by the most recent sync.
    pub fn last_sync_touched(&self) -> usize {
        self.last_sync_touched
    }

    /// Make every subsequent `set_selection` fail, like a detached DOM range.
    pub fn reject_selections(&mut self, reject: bool) {
        self.reject_selections = reject;
    }

    /// Move the selection as the user would, without going through the editor.
    pub fn select(&mut self, range: SurfaceRange) {
        self.selection = SelectionState::Inside(range);
    }

    /// Focus moved to something outside the editor.
    pub fn select_outside(&mut self) {
        self.selection = SelectionState::Outside;
    }

    pub fn clear_selection(&mut self) {
        self.selection = SelectionState::None;
    }

    /// Simulate native typing: replace the selection with `text` inside the
    /// run holding it and collapse the caret after the insertion.
    ///
    /// Only selections within a single run are supported, as with a browser
    /// inserting into one text node. Returns the block that changed.
    pub fn type_text(&mut self, text: &str) -> Option<usize> {
        let SelectionState::Inside(range) = self.selection else {
            return None;
        };
        if range.start.block != range.end.block || range.start.run != range.end.run {
            return None;
        }
        let run = self
            .blocks
            .get_mut(range.start.block)?
            .runs
            .get_mut(range.start.run)?;
        let (from, to) = (range.start.offset, range.end.offset.max(range.start.offset));
        let len = char_len(run);
        let edited = format!(
            "{}{}{}",
            slice_chars(run, 0, from),
            text,
            slice_chars(run, to, len)
        );
        *run = edited;
        let caret = SurfacePoint {
            offset: from + char_len(text),
            ..range.start
        };
        self.selection = SelectionState::Inside(SurfaceRange::caret(caret));
        Some(range.start.block)
    }
}

impl Surface for HeadlessSurface {
    fn selection(&self) -> SelectionState {
        self.selection
    }

    fn set_selection(&mut self, range: SurfaceRange) -> Result<(), PlatformError> {
        if self.reject_selections {
            return Err(PlatformError::from("selection rejected"));
        }
        self.selection = SelectionState::Inside(range);
        Ok(())
    }

    fn block_count(&self) -> usize {
        self.blocks.len()
    }

    fn runs(&self, block: usize) -> Vec<String> {
        self.blocks
            .get(block)
            .map(|b| b.runs.clone())
            .unwrap_or_default()
    }

    fn sync(&mut self, blocks: &[Block]) -> Result<(), PlatformError> {
        let mut touched = 0;
        for (index, block) in blocks.iter().enumerate() {
            let fresh = match self.blocks.get(index) {
                Some(current) => current.id == *block.id() && current.fingerprint == block.fingerprint(),
                None => false,
            };
            if fresh {
                continue;
            }
            let materialized = MaterializedBlock::from_block(block);
            if index < self.blocks.len() {
                self.blocks[index] = materialized;
            } else {
                self.blocks.push(materialized);
            }
            touched += 1;
        }
        self.blocks.truncate(blocks.len());
        self.last_sync_touched = touched;
        Ok(())
    }

    fn update_placeholder(&mut self, text: &str, visible: bool) {
        self.placeholder = text.to_string();
        self.placeholder_visible = visible;
    }
}

/// Clipboard held in memory.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    text: RefCell<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: RefCell::new(Some(text.into())),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.text.borrow().clone()
    }
}

impl ClipboardPlatform for MemoryClipboard {
    fn write_text(&self, text: &str) {
        *self.text.borrow_mut() = Some(text.to_string());
    }

    fn read_text(&self) -> Option<String> {
        self.contents()
    }
}
