//! Surface abstraction traits.
//!
//! These traits define the interface between the editor logic and whatever
//! materializes the blocks (browser DOM, terminal, in-memory test double).
//! The core never walks a presentation tree itself: a surface reports
//! selections as `(block, run, offset)` points and hands back the text runs it
//! materialized for a block.

use crate::block::Block;
use crate::error::PlatformError;

/// A position on the surface: a char offset inside one text run of one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfacePoint {
    pub block: usize,
    pub run: usize,
    /// Char offset within the run.
    pub offset: usize,
}

impl SurfacePoint {
    pub fn new(block: usize, run: usize, offset: usize) -> Self {
        Self { block, run, offset }
    }
}

/// A live selection, `start` before `end` in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceRange {
    pub start: SurfacePoint,
    pub end: SurfacePoint,
}

impl SurfaceRange {
    pub fn new(start: SurfacePoint, end: SurfacePoint) -> Self {
        Self { start, end }
    }

    pub fn caret(point: SurfacePoint) -> Self {
        Self {
            start: point,
            end: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// What the surface reports about the live selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    /// No selection at all.
    None,
    /// The selection lives somewhere outside the editor.
    Outside,
    Inside(SurfaceRange),
}

/// Platform-specific materialization of the block sequence.
pub trait Surface {
    /// Read the live selection.
    fn selection(&self) -> SelectionState;

    /// Apply a selection.
    fn set_selection(&mut self, range: SurfaceRange) -> Result<(), PlatformError>;

    /// Number of blocks currently materialized.
    fn block_count(&self) -> usize;

    /// Text runs currently materialized for a block, in document order.
    ///
    /// An empty block reports a single empty run.
    fn runs(&self, block: usize) -> Vec<String>;

    /// Re-materialize the surface from the model. Implementations should
    /// touch only blocks whose fingerprint changed.
    fn sync(&mut self, blocks: &[Block]) -> Result<(), PlatformError>;

    /// Update placeholder text and whether it is shown.
    fn update_placeholder(&mut self, text: &str, visible: bool);
}

/// Platform-specific clipboard operations.
pub trait ClipboardPlatform {
    /// Write plain text to the clipboard.
    fn write_text(&self, text: &str);

    /// Read plain text from the clipboard, `None` when there is no text payload.
    fn read_text(&self) -> Option<String>;
}

impl<T: ClipboardPlatform + ?Sized> ClipboardPlatform for &T {
    fn write_text(&self, text: &str) {
        (**self).write_text(text)
    }

    fn read_text(&self) -> Option<String> {
        (**self).read_text()
    }
}
