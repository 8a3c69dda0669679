//! Which blocks show their raw source.
//!
//! Blocks touched by the selection are in raw mode, everything else is
//! rendered. The scope is tracked by block id so it survives index shifts
//! from edits. Retargeting diffs the old and new sets and reports whether any
//! block actually changed mode; callers skip re-materialization and caret
//! restoration when it did not, which is what keeps a selection change caused
//! by the restore itself from toggling anything again.

use std::ops::RangeInclusive;

use smol_str::SmolStr;

use crate::render::RenderAdapter;
use crate::store::BlockStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusScope {
    active: Vec<SmolStr>,
}

impl FocusScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of the blocks currently held in raw mode by the scope.
    pub fn active(&self) -> &[SmolStr] {
        &self.active
    }

    pub fn contains(&self, id: &SmolStr) -> bool {
        self.active.contains(id)
    }

    /// Move the scope to the blocks in `targets`.
    ///
    /// Blocks leaving the scope are rendered again (blank ones stay raw),
    /// blocks entering it switch to raw. Returns whether any block changed
    /// mode.
    pub fn retarget<R: RenderAdapter + ?Sized>(
        &mut self,
        store: &mut BlockStore,
        targets: RangeInclusive<usize>,
        renderer: &R,
    ) -> bool {
        let wanted: Vec<SmolStr> = targets
            .filter_map(|index| store.get(index).map(|b| b.id().clone()))
            .collect();
        if wanted == self.active {
            return false;
        }

        let mut changed = false;
        for id in &self.active {
            if wanted.contains(id) {
                continue;
            }
            if let Some(index) = store.index_of(id) {
                changed |= store.leave_raw(index, renderer);
            }
        }
        for id in &wanted {
            if let Some(index) = store.index_of(id) {
                changed |= store.enter_raw(index);
            }
        }
        tracing::debug!(blocks = wanted.len(), changed, "focus scope retargeted");
        self.active = wanted;
        changed
    }

    /// Render every block in the scope and empty it.
    pub fn release_all<R: RenderAdapter + ?Sized>(
        &mut self,
        store: &mut BlockStore,
        renderer: &R,
    ) -> bool {
        let mut changed = false;
        for id in self.active.drain(..) {
            if let Some(index) = store.index_of(&id) {
                changed |= store.leave_raw(index, renderer);
            }
        }
        changed
    }

    /// Forget the scope without touching any block, e.g. after the whole
    /// document was replaced.
    pub fn clear(&mut self) {
        self.active.clear();
    }
}
