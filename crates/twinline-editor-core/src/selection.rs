//! Capture and restoration of the live selection as flat offsets.
//!
//! Restoring after a block switches from rendered to raw mode has to account
//! for inline markers that were invisible a moment ago. The controller applies
//! a one-shot correction on the first restore into a newly visited row: if the
//! raw text before the caret holds balanced `*`, `~` and `` ` `` markers, both
//! boundaries move forward by the marker count. It is an approximation; links
//! and heading prefixes are not accounted for.

use crate::error::PlatformError;
use crate::offset::{Bias, SurfaceLayout};
use crate::platform::{Surface, SurfacePoint, SurfaceRange};
use crate::syntax::MarkerCounts;
use crate::text::slice_chars;
use crate::types::Selection;

#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    last_row: Option<usize>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flat selection of a live surface range.
    pub fn save(&self, range: SurfaceRange, layout: &SurfaceLayout) -> Option<Selection> {
        let anchor = layout.point_to_flat(range.start)?;
        let head = layout.point_to_flat(range.end)?;
        tracing::trace!(target: "twinline::cursor", anchor, head, "selection saved");
        Some(Selection::new(anchor, head))
    }

    pub fn last_row(&self) -> Option<usize> {
        self.last_row
    }

    /// Whether a caret in `block` would be the first restore into that row.
    pub fn is_first_visit(&self, block: usize) -> bool {
        self.last_row != Some(block)
    }

    pub fn visit(&mut self, block: usize) {
        self.last_row = Some(block);
    }

    pub fn forget(&mut self) {
        self.last_row = None;
    }

    /// Apply a flat selection to the surface, with the markup-growth shift
    /// when `first_visit` is set.
    ///
    /// Falls back to a caret at the end of the last block when the offsets
    /// cannot be mapped or the surface rejects the range.
    pub fn restore<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        layout: &SurfaceLayout,
        selection: Selection,
        first_visit: bool,
    ) -> Option<SurfaceRange> {
        let range = match map_range(layout, selection) {
            Some(range) if first_visit => Some(shift_for_markers(layout, range)),
            other => other,
        };
        let applied = apply_or_fallback(surface, layout, range)?;
        self.visit(applied.end.block);
        Some(applied)
    }

    /// Apply a flat selection without any marker correction.
    pub fn place<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        layout: &SurfaceLayout,
        selection: Selection,
    ) -> Option<SurfaceRange> {
        let applied = apply_or_fallback(surface, layout, map_range(layout, selection))?;
        self.visit(applied.end.block);
        Some(applied)
    }
}

/// Start resolves to the following run at boundaries, end to the preceding one.
fn map_range(layout: &SurfaceLayout, selection: Selection) -> Option<SurfaceRange> {
    let end = layout.flat_to_point(selection.end(), Bias::Backward)?;
    let start = if selection.is_collapsed() {
        end
    } else {
        layout.flat_to_point(selection.start(), Bias::Forward)?
    };
    Some(SurfaceRange::new(start, end))
}

fn shift_for_markers(layout: &SurfaceLayout, range: SurfaceRange) -> SurfaceRange {
    let Some(text) = layout.run_text(range.end) else {
        return range;
    };
    let counts = MarkerCounts::count(slice_chars(text, 0, range.end.offset));
    let shift = if counts.is_balanced() { counts.total() } else { 0 };
    tracing::trace!(target: "twinline::cursor", ?counts, shift, "markup-growth shift");
    if shift == 0 {
        return range;
    }
    let bump = |point: SurfacePoint| SurfacePoint {
        offset: (point.offset + shift).min(layout.run_len(point)),
        ..point
    };
    SurfaceRange::new(bump(range.start), bump(range.end))
}

fn apply_or_fallback<S: Surface + ?Sized>(
    surface: &mut S,
    layout: &SurfaceLayout,
    range: Option<SurfaceRange>,
) -> Option<SurfaceRange> {
    let attempt = match range {
        Some(range) => surface
            .set_selection(range)
            .map(|()| range)
            .map_err(|e| e.to_string()),
        None => Err("offset outside the document".to_string()),
    };
    match attempt {
        Ok(range) => {
            tracing::trace!(target: "twinline::cursor", ?range, "selection restored");
            Some(range)
        }
        Err(reason) => {
            tracing::warn!(%reason, "could not restore selection, placing caret at end");
            let caret = SurfaceRange::caret(layout.end_point()?);
            match surface.set_selection(caret) {
                Ok(()) => Some(caret),
                Err(PlatformError(e)) => {
                    tracing::warn!(error = %e, "fallback caret rejected");
                    None
                }
            }
        }
    }
}
