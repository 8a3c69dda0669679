//! Mapping between flat document offsets and positions on the surface.
//!
//! The flat document is every block's raw source joined by `\n`, so each
//! preceding block contributes its raw length plus one. Within a block, the
//! surface may materialize something else entirely (rendered text split over
//! several runs), so the second half of the mapping walks the block's runs.
//!
//! ```text
//! blocks:  "ab"      "*c*" (rendered as ["c"])
//! flat:     0 1 2 | 3 4 5 6
//!                 ^ joiner
//! ```

use crate::platform::SurfacePoint;
use crate::store::BlockStore;
use crate::text::char_len;

/// A position inside one block's raw source, in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockPosition {
    pub block: usize,
    pub offset: usize,
}

impl BlockPosition {
    pub fn new(block: usize, offset: usize) -> Self {
        Self { block, offset }
    }
}

/// Which side wins when an offset sits exactly between two runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    /// Start of the following run. Used for selection starts.
    Forward,
    /// End of the preceding run. Used for selection ends and carets.
    Backward,
}

fn flat_from_lens(lens: impl Iterator<Item = usize>, pos: BlockPosition) -> usize {
    let mut flat = 0;
    for (idx, len) in lens.enumerate() {
        if idx == pos.block {
            return flat + pos.offset.min(len);
        }
        flat += len + 1;
    }
    flat.saturating_sub(1)
}

fn position_from_lens(lens: impl Iterator<Item = usize>, flat: usize) -> BlockPosition {
    let mut remaining = flat;
    let mut last = BlockPosition::default();
    for (idx, len) in lens.enumerate() {
        if remaining <= len {
            return BlockPosition::new(idx, remaining);
        }
        remaining -= len + 1;
        last = BlockPosition::new(idx, len);
    }
    last
}

/// Flat offset of a block position. The intra-block offset is clamped to the
/// block's raw length; a block index past the end maps to the document end.
pub fn to_flat_offset(store: &BlockStore, pos: BlockPosition) -> usize {
    flat_from_lens(store.blocks().iter().map(|b| b.len_chars()), pos)
}

/// Block position of a flat offset, clamped to the document end.
///
/// The offset right before a joiner is the end of the preceding block; the
/// offset right after it is the start of the following block.
pub fn to_block_position(store: &BlockStore, flat: usize) -> BlockPosition {
    position_from_lens(store.blocks().iter().map(|b| b.len_chars()), flat)
}

/// Raw length and materialized runs of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLayout {
    pub raw_len: usize,
    pub runs: Vec<String>,
}

impl BlockLayout {
    pub fn new(raw_len: usize, runs: Vec<String>) -> Self {
        Self { raw_len, runs }
    }

    fn run_len(&self, run: usize) -> usize {
        self.runs.get(run).map(|r| char_len(r)).unwrap_or(0)
    }

    /// Materialized length across all runs.
    pub fn text_len(&self) -> usize {
        self.runs.iter().map(|r| char_len(r)).sum()
    }

    /// Offset inside the concatenated runs of a point in this block.
    fn intra_offset(&self, run: usize, offset: usize) -> usize {
        let before: usize = self.runs.iter().take(run).map(|r| char_len(r)).sum();
        before + offset.min(self.run_len(run))
    }

    /// Locate an intra-block offset among the runs.
    fn locate(&self, block: usize, intra: usize, bias: Bias) -> SurfacePoint {
        let mut acc = 0;
        let last = self.runs.len().saturating_sub(1);
        for (idx, run) in self.runs.iter().enumerate() {
            let len = char_len(run);
            let fits = match bias {
                Bias::Forward => intra < acc + len,
                Bias::Backward => intra <= acc + len,
            };
            if fits || idx == last {
                return SurfacePoint::new(block, idx, intra.saturating_sub(acc).min(len));
            }
            acc += len;
        }
        SurfacePoint::new(block, 0, 0)
    }
}

/// The surface as the mapper sees it: one layout per block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurfaceLayout {
    blocks: Vec<BlockLayout>,
}

impl SurfaceLayout {
    pub fn new(blocks: Vec<BlockLayout>) -> Self {
        Self { blocks }
    }

    /// Layout of the runs the store's blocks expect to be materialized.
    pub fn from_store(store: &BlockStore) -> Self {
        Self::new(
            store
                .blocks()
                .iter()
                .map(|b| BlockLayout::new(b.len_chars(), b.runs()))
                .collect(),
        )
    }

    pub fn blocks(&self) -> &[BlockLayout] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn to_flat(&self, pos: BlockPosition) -> usize {
        flat_from_lens(self.blocks.iter().map(|b| b.raw_len), pos)
    }

    pub fn to_block_position(&self, flat: usize) -> BlockPosition {
        position_from_lens(self.blocks.iter().map(|b| b.raw_len), flat)
    }

    /// Flat offset of a surface point.
    ///
    /// The point's offset inside the block's runs is clamped to the block's
    /// raw length, so a rendered block never bleeds into its neighbour.
    pub fn point_to_flat(&self, point: SurfacePoint) -> Option<usize> {
        let layout = self.blocks.get(point.block)?;
        let intra = layout.intra_offset(point.run, point.offset);
        Some(self.to_flat(BlockPosition::new(point.block, intra.min(layout.raw_len))))
    }

    /// Surface point for a block position.
    pub fn position_to_point(&self, pos: BlockPosition, bias: Bias) -> Option<SurfacePoint> {
        let layout = self.blocks.get(pos.block)?;
        Some(layout.locate(pos.block, pos.offset, bias))
    }

    /// Surface point for a flat offset.
    pub fn flat_to_point(&self, flat: usize, bias: Bias) -> Option<SurfacePoint> {
        if self.blocks.is_empty() {
            return None;
        }
        self.position_to_point(self.to_block_position(flat), bias)
    }

    /// Text of one run, if it exists.
    pub fn run_text(&self, point: SurfacePoint) -> Option<&str> {
        self.blocks
            .get(point.block)?
            .runs
            .get(point.run)
            .map(String::as_str)
    }

    pub fn run_len(&self, point: SurfacePoint) -> usize {
        self.blocks
            .get(point.block)
            .map(|b| b.run_len(point.run))
            .unwrap_or(0)
    }

    /// Caret position at the very end of the last block.
    pub fn end_point(&self) -> Option<SurfacePoint> {
        let block = self.blocks.len().checked_sub(1)?;
        let layout = &self.blocks[block];
        let run = layout.runs.len().saturating_sub(1);
        Some(SurfacePoint::new(block, run, layout.run_len(run)))
    }
}
