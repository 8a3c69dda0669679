//! A single document line with its raw source and cached presentation.
//!
//! `raw` is authoritative. `direction` and `presentation` are derived from it
//! and only ever recomputed, never edited. `mode` is a two-state machine
//! (`Rendered` / `Raw`) driven through [`Block::enter_raw`] and
//! [`Block::leave_raw`].

use smol_str::{SmolStr, format_smolstr};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use markdown_weaver_escape::{FmtWriter, escape_html_body_text};

use crate::direction;
use crate::render::{Presentation, RenderAdapter};
use crate::syntax::heading_level;
use crate::text::{char_len, is_blank};
use crate::types::{BlockMode, Direction, PLACEHOLDER};

/// Generate a block ID from a monotonic counter.
///
/// IDs are stable across content changes and never reused within a store.
pub fn make_block_id(index: usize) -> SmolStr {
    format_smolstr!("b-{}", index)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    id: SmolStr,
    raw: String,
    direction: Direction,
    mode: BlockMode,
    /// `None` when stale.
    presentation: Option<Presentation>,
}

impl Block {
    pub fn new(id: SmolStr, raw: impl Into<String>, default_direction: Direction) -> Self {
        let raw = raw.into();
        Self {
            id,
            direction: direction::detect(&raw, default_direction),
            raw,
            mode: BlockMode::Rendered,
            presentation: None,
        }
    }

    pub fn id(&self) -> &SmolStr {
        &self.id
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn mode(&self) -> BlockMode {
        self.mode
    }

    pub fn presentation(&self) -> Option<&Presentation> {
        self.presentation.as_ref()
    }

    /// Length of the raw source in chars.
    pub fn len_chars(&self) -> usize {
        char_len(&self.raw)
    }

    /// Nothing visible in the source.
    pub fn is_blank(&self) -> bool {
        is_blank(&self.raw)
    }

    pub fn is_stale(&self) -> bool {
        self.presentation.is_none()
    }

    /// Replace the source; direction is re-derived and the presentation goes stale.
    pub fn set_raw(&mut self, raw: impl Into<String>, default_direction: Direction) {
        self.raw = raw.into();
        self.redetect(default_direction);
        self.presentation = None;
    }

    pub(crate) fn redetect(&mut self, default_direction: Direction) {
        self.direction = direction::detect(&self.raw, default_direction);
    }

    /// Render the presentation if it is stale.
    ///
    /// Blank blocks present as the placeholder paragraph. A renderer failure
    /// falls back to escaped source so the block stays visible.
    pub fn refresh<R: RenderAdapter + ?Sized>(&mut self, renderer: &R) {
        if self.presentation.is_some() {
            return;
        }
        let presentation = if self.is_blank() {
            Presentation::placeholder()
        } else {
            match renderer.render(&self.raw) {
                Ok(presentation) => presentation,
                Err(e) => {
                    tracing::warn!(block = %self.id, error = %e, "render failed, showing source");
                    Presentation::plain(&self.raw)
                }
            }
        };
        self.presentation = Some(presentation);
    }

    /// Rendered -> Raw. Returns whether the mode changed.
    pub fn enter_raw(&mut self) -> bool {
        if self.mode == BlockMode::Raw {
            return false;
        }
        self.mode = BlockMode::Raw;
        true
    }

    /// Raw -> Rendered. Blank blocks stay raw so the caret keeps its anchor.
    /// Returns whether the mode changed.
    pub fn leave_raw<R: RenderAdapter + ?Sized>(&mut self, renderer: &R) -> bool {
        if self.mode == BlockMode::Rendered || self.is_blank() {
            return false;
        }
        self.refresh(renderer);
        self.mode = BlockMode::Rendered;
        true
    }

    /// Text runs currently materialized for this block.
    ///
    /// Raw mode materializes the source as one run. A rendered block whose
    /// presentation is stale falls back to the source as well.
    pub fn runs(&self) -> Vec<String> {
        match (self.mode, &self.presentation) {
            (BlockMode::Rendered, Some(presentation)) => presentation.runs.clone(),
            _ => vec![self.raw.clone()],
        }
    }

    /// Inner markup the surface shows for this block.
    ///
    /// In raw mode a heading keeps its heading element around the source, so
    /// the line keeps its size while being edited.
    pub fn content_markup(&self) -> String {
        match (self.mode, &self.presentation) {
            (BlockMode::Rendered, Some(presentation)) => presentation.markup.clone(),
            _ if self.raw.is_empty() => PLACEHOLDER.to_string(),
            _ => {
                let mut escaped = String::with_capacity(self.raw.len());
                let _ = escape_html_body_text(FmtWriter(&mut escaped), &self.raw);
                match heading_level(&self.raw) {
                    Some(level) if self.mode == BlockMode::Raw => {
                        format!("<h{level}>{escaped}</h{level}>")
                    }
                    _ => escaped,
                }
            }
        }
    }

    /// Fingerprint of what the surface should show for this block, for cheap
    /// change detection when syncing.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.mode.hash(&mut hasher);
        self.direction.hash(&mut hasher);
        self.content_markup().hash(&mut hasher);
        hasher.finish()
    }
}
