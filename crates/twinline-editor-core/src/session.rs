//! The editor session: one document, one surface, and the per-instance state
//! that ties them together.
//!
//! Every handler runs to completion synchronously. Selection changes go
//! through a fixed pipeline (read the selection, compute the focus scope,
//! apply mode changes, re-materialize, restore the caret) and stop right
//! after the scope step when no block changed mode. The caret restore raises
//! another selection change on a live surface; that one finds the scope
//! already in place and stops there.

use markdown_weaver_escape::{FmtWriter, escape_html};

use crate::actions::{EditorAction, Key, KeydownResult, Modifiers};
use crate::block::Block;
use crate::config::{Attribute, EditorConfig};
use crate::edit::{self, EditOutcome};
use crate::focus::FocusScope;
use crate::offset::{BlockLayout, SurfaceLayout, to_flat_offset};
use crate::paste;
use crate::platform::{ClipboardPlatform, SelectionState, Surface};
use crate::render::{MarkdownRenderer, RenderAdapter};
use crate::selection::SelectionController;
use crate::store::BlockStore;
use crate::text::{is_blank, strip_placeholder};
use crate::types::{BlockMode, ChangeEvent, Direction, EditKind, Selection};

type ChangeListener = Box<dyn FnMut(&ChangeEvent)>;

pub struct EditorSession<S: Surface, R: RenderAdapter = MarkdownRenderer> {
    store: BlockStore,
    renderer: R,
    config: EditorConfig,
    surface: Option<S>,
    /// Content set before a surface was attached.
    pending: Option<String>,
    scope: FocusScope,
    selection: SelectionController,
    listeners: Vec<ChangeListener>,
    mac_keybindings: bool,
}

impl<S: Surface> EditorSession<S> {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_renderer(config, MarkdownRenderer::default())
    }
}

impl<S: Surface, R: RenderAdapter> EditorSession<S, R> {
    pub fn with_renderer(config: EditorConfig, renderer: R) -> Self {
        Self {
            store: BlockStore::new(config.default_direction),
            renderer,
            config,
            surface: None,
            pending: None,
            scope: FocusScope::new(),
            selection: SelectionController::new(),
            listeners: Vec::new(),
            mac_keybindings: false,
        }
    }

    /// Use Cmd instead of Ctrl as the primary modifier.
    pub fn set_mac_keybindings(&mut self, mac: bool) {
        self.mac_keybindings = mac;
    }

    // === Lifecycle ===

    /// Attach a surface and materialize the document on it.
    ///
    /// Content set while detached is applied here, once.
    pub fn attach(&mut self, surface: S) {
        self.surface = Some(surface);
        if let Some(text) = self.pending.take() {
            tracing::debug!("applying pending value");
            self.load(&text);
        }
        self.store.refresh(&self.renderer);
        self.sync_surface();
        self.push_placeholder();
    }

    /// Hand the surface back. Later content changes are buffered until the
    /// next [`attach`](Self::attach).
    pub fn detach(&mut self) -> Option<S> {
        self.selection.forget();
        self.surface.take()
    }

    pub fn is_attached(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    // === Content and configuration ===

    /// Replace the document, one block per line.
    pub fn set_content(&mut self, text: &str) {
        if self.surface.is_none() {
            self.pending = Some(text.to_string());
            return;
        }
        self.load(text);
        self.store.refresh(&self.renderer);
        self.sync_surface();
        self.push_placeholder();
    }

    /// Raw source of every block joined by `\n`.
    pub fn content(&self) -> String {
        match &self.pending {
            Some(text) => text.clone(),
            None => self.store.content(),
        }
    }

    fn load(&mut self, text: &str) {
        self.store.set_text(text);
        self.scope.clear();
        self.selection.forget();
    }

    pub fn blocks(&self) -> &[Block] {
        self.store.blocks()
    }

    pub fn store(&self) -> &BlockStore {
        &self.store
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn set_placeholder(&mut self, placeholder: impl Into<String>) {
        self.config.placeholder = placeholder.into();
        self.push_placeholder();
    }

    /// Change the direction fallback and re-tag every block.
    pub fn set_default_direction(&mut self, direction: Direction) {
        self.config.default_direction = direction;
        self.apply_default_direction();
    }

    fn apply_default_direction(&mut self) {
        self.store.set_default_direction(self.config.default_direction);
        self.sync_surface();
    }

    /// Apply a host attribute (`value`, `placeholder`, `default-direction`).
    /// Returns whether the attribute is recognized and changed something.
    pub fn apply_attribute(&mut self, name: &str, value: Option<&str>) -> bool {
        if name == "value" {
            self.set_content(value.unwrap_or_default());
            return true;
        }
        match self.config.apply_attribute(name, value) {
            Some(Attribute::Placeholder) => self.push_placeholder(),
            Some(Attribute::DefaultDirection) => self.apply_default_direction(),
            None => return false,
        }
        true
    }

    /// Whether the placeholder should show: nothing visible in the document.
    pub fn placeholder_visible(&self) -> bool {
        is_blank(&self.content())
    }

    /// Register a listener called after every committed mutation.
    pub fn on_change(&mut self, listener: impl FnMut(&ChangeEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// The surface as serialized markup: one `span` per block carrying its
    /// direction and raw source, wrapping what the surface shows.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for block in self.store.blocks() {
            let mut original = String::with_capacity(block.raw().len());
            let _ = escape_html(FmtWriter(&mut original), block.raw());
            out.push_str(&format!(
                "<span dir=\"{}\" data-original=\"{}\">{}</span>",
                block.direction(),
                original,
                block.content_markup()
            ));
        }
        out
    }

    // === Selection ===

    fn layout(&self) -> SurfaceLayout {
        match &self.surface {
            Some(surface) => SurfaceLayout::new(
                self.store
                    .blocks()
                    .iter()
                    .enumerate()
                    .map(|(index, block)| BlockLayout::new(block.len_chars(), surface.runs(index)))
                    .collect(),
            ),
            None => SurfaceLayout::from_store(&self.store),
        }
    }

    /// The live selection as flat offsets, `None` when there is none inside
    /// the editor.
    pub fn selection(&self) -> Option<Selection> {
        let SelectionState::Inside(range) = self.surface.as_ref()?.selection() else {
            return None;
        };
        self.selection.save(range, &self.layout())
    }

    /// Select a flat range. No markup-growth shift is applied since no block
    /// changes mode.
    pub fn set_selection_range(&mut self, start: usize, end: usize) -> bool {
        let layout = self.layout();
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };
        self.selection
            .place(surface, &layout, Selection::new(start, end))
            .is_some()
    }

    /// Run the selection-change pipeline. Returns whether any block changed mode.
    pub fn on_selection_change(&mut self) -> bool {
        let Some(state) = self.surface.as_ref().map(|s| s.selection()) else {
            return false;
        };
        match state {
            SelectionState::None => false,
            SelectionState::Outside => {
                self.selection.forget();
                let changed = self.scope.release_all(&mut self.store, &self.renderer);
                if changed {
                    tracing::debug!("focus left, blocks rendered");
                    self.sync_surface();
                }
                changed
            }
            SelectionState::Inside(range) => {
                let Some(selection) = self.selection.save(range, &self.layout()) else {
                    return false;
                };
                let first = range.start.block.min(range.end.block);
                let last = range.start.block.max(range.end.block);
                let caret_block = range.end.block;
                // A block already showing source reports raw offsets.
                let caret_was_raw = self
                    .store
                    .get(caret_block)
                    .is_some_and(|block| block.mode() == BlockMode::Raw);
                if !self
                    .scope
                    .retarget(&mut self.store, first..=last, &self.renderer)
                {
                    return false;
                }
                self.sync_surface();

                let first_visit =
                    !caret_was_raw && self.selection.is_first_visit(caret_block);
                let layout = self.layout();
                if let Some(surface) = self.surface.as_mut() {
                    self.selection
                        .restore(surface, &layout, selection, first_visit);
                }
                true
            }
        }
    }

    /// Pull natively typed text from raw-mode blocks into the model.
    ///
    /// Rendered blocks are skipped: their text is presentation.
    pub fn on_input(&mut self) -> bool {
        let Some(surface) = self.surface.as_ref() else {
            return false;
        };
        if surface.block_count() != self.store.len() {
            tracing::warn!(
                surface = surface.block_count(),
                blocks = self.store.len(),
                "surface diverged from document, resyncing"
            );
            self.sync_surface();
            return false;
        }

        let mut edits = Vec::new();
        for (index, block) in self.store.blocks().iter().enumerate() {
            if block.mode() != BlockMode::Raw {
                continue;
            }
            let typed = strip_placeholder(&surface.runs(index).concat());
            if typed != block.raw() {
                edits.push((index, typed));
            }
        }
        if edits.is_empty() {
            return false;
        }

        for (index, typed) in edits {
            tracing::debug!(block = index, "input synced");
            self.store.set_raw(index, typed);
        }
        // read while the surface still holds the typed text
        let caret = self.selection();
        self.store.refresh(&self.renderer);
        self.sync_surface();
        if let Some(caret) = caret {
            self.set_selection_range(caret.anchor, caret.head);
        }
        self.push_placeholder();
        self.notify(EditKind::Input);
        true
    }

    // === Keyboard and actions ===

    /// Dispatch a keystroke. Anything not bound to an editor action is left
    /// to the host.
    pub fn handle_key(&mut self, key: &Key, modifiers: Modifiers) -> KeydownResult {
        match EditorAction::from_key(key, modifiers, self.mac_keybindings) {
            Some(EditorAction::SelectAll) => {
                self.select_all();
                KeydownResult::Handled
            }
            Some(EditorAction::InsertParagraph) => {
                self.enter();
                KeydownResult::Handled
            }
            Some(EditorAction::DeleteBackward) => {
                self.backspace();
                KeydownResult::Handled
            }
            Some(EditorAction::DeleteForward) => {
                self.delete();
                KeydownResult::Handled
            }
            _ if key.is_navigation() || key.is_modifier() => KeydownResult::PassThrough,
            _ => KeydownResult::NotHandled,
        }
    }

    /// Perform an action. Returns whether it did anything.
    pub fn execute<C: ClipboardPlatform + ?Sized>(
        &mut self,
        action: EditorAction,
        clipboard: &C,
    ) -> bool {
        match action {
            EditorAction::InsertParagraph => self.enter(),
            EditorAction::DeleteBackward => self.backspace(),
            EditorAction::DeleteForward => self.delete(),
            EditorAction::SelectAll => self.select_all(),
            EditorAction::Copy => self.copy(clipboard),
            EditorAction::Cut => self.cut(clipboard),
            EditorAction::Paste { text } => self.paste_text(&text),
            EditorAction::Insert { text } => self.insert_text(&text),
        }
    }

    // === Edit operations ===

    pub fn enter(&mut self) -> bool {
        let Some(selection) = self.selection() else {
            return false;
        };
        let outcome = edit::enter(&mut self.store, selection);
        self.commit(outcome, EditKind::Enter);
        true
    }

    pub fn backspace(&mut self) -> bool {
        let Some(selection) = self.selection() else {
            return false;
        };
        match edit::delete_backward(&mut self.store, selection) {
            Some(outcome) => {
                self.commit(outcome, EditKind::Backspace);
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self) -> bool {
        let Some(selection) = self.selection() else {
            return false;
        };
        match edit::delete_forward(&mut self.store, selection) {
            Some(outcome) => {
                self.commit(outcome, EditKind::Delete);
                true
            }
            None => false,
        }
    }

    /// Write the selected raw source to the clipboard.
    pub fn copy<C: ClipboardPlatform + ?Sized>(&self, clipboard: &C) -> bool {
        let Some(text) = self
            .selection()
            .and_then(|selection| edit::copy_text(&self.store, selection))
        else {
            return false;
        };
        clipboard.write_text(&text);
        true
    }

    pub fn cut<C: ClipboardPlatform + ?Sized>(&mut self, clipboard: &C) -> bool {
        let Some(selection) = self.selection() else {
            return false;
        };
        let Some((text, outcome)) = edit::cut(&mut self.store, selection) else {
            return false;
        };
        clipboard.write_text(&text);
        self.commit(outcome, EditKind::Cut);
        true
    }

    pub fn paste<C: ClipboardPlatform + ?Sized>(&mut self, clipboard: &C) -> bool {
        match clipboard.read_text() {
            Some(text) => self.paste_text(&text),
            None => false,
        }
    }

    pub fn paste_text(&mut self, text: &str) -> bool {
        let Some(selection) = self.selection() else {
            return false;
        };
        match paste::paste(&mut self.store, selection, text) {
            Some(outcome) => {
                self.commit(outcome, EditKind::Paste);
                true
            }
            None => false,
        }
    }

    /// Replace the selection with `text`. Empty text deletes the selection.
    pub fn insert_text(&mut self, text: &str) -> bool {
        if !text.is_empty() {
            return self.paste_text(text);
        }
        let Some(selection) = self.selection().filter(|s| !s.is_collapsed()) else {
            return false;
        };
        let outcome = edit::delete_range(&mut self.store, selection);
        self.commit(outcome, EditKind::Delete);
        true
    }

    /// Put every block in raw mode and select the whole document.
    pub fn select_all(&mut self) -> bool {
        if self.surface.is_none() {
            return false;
        }
        let last = self.store.last_index();
        self.scope.retarget(&mut self.store, 0..=last, &self.renderer);
        self.sync_surface();
        self.set_selection_range(0, self.store.len_chars())
    }

    /// Refresh presentations, move the focus scope to the caret's block, put
    /// the caret there and notify listeners.
    fn commit(&mut self, outcome: EditOutcome, kind: EditKind) {
        let caret = outcome.caret;
        self.scope
            .retarget(&mut self.store, caret.block..=caret.block, &self.renderer);
        self.store.refresh(&self.renderer);
        self.sync_surface();

        let flat = to_flat_offset(&self.store, caret);
        self.set_selection_range(flat, flat);
        self.selection.visit(caret.block);
        self.push_placeholder();
        tracing::debug!(?kind, blocks = self.store.len(), caret = flat, "edit committed");
        self.notify(kind);
    }

    fn notify(&mut self, kind: EditKind) {
        let event = ChangeEvent {
            kind,
            len_chars: self.store.len_chars(),
        };
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    fn sync_surface(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        if let Err(e) = surface.sync(self.store.blocks()) {
            tracing::warn!(error = %e, "surface sync failed");
        }
    }

    fn push_placeholder(&mut self) {
        let visible = self.placeholder_visible();
        if let Some(surface) = self.surface.as_mut() {
            surface.update_placeholder(&self.config.placeholder, visible);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::headless::{HeadlessSurface, MemoryClipboard};
    use crate::platform::{SurfacePoint, SurfaceRange};

    fn session(text: &str) -> EditorSession<HeadlessSurface> {
        let mut session =
            EditorSession::new(EditorConfig::new().with_default_direction(Direction::Ltr));
        session.attach(HeadlessSurface::new());
        session.set_content(text);
        session
    }

    fn caret(session: &mut EditorSession<HeadlessSurface>, flat: usize) {
        assert!(session.set_selection_range(flat, flat));
        session.on_selection_change();
    }

    #[test]
    fn test_pending_value_applied_on_attach() {
        let mut session: EditorSession<HeadlessSurface> = EditorSession::new(EditorConfig::new());
        session.set_content("early\nvalue");
        assert_eq!(session.content(), "early\nvalue");
        assert_eq!(session.blocks().len(), 1);

        session.attach(HeadlessSurface::new());
        assert_eq!(session.blocks().len(), 2);
        assert_eq!(session.surface().map(|s| s.block_count()), Some(2));
        assert_eq!(session.content(), "early\nvalue");
    }

    #[test]
    fn test_detached_edits_are_noops() {
        let mut session: EditorSession<HeadlessSurface> = EditorSession::new(EditorConfig::new());
        assert!(!session.enter());
        assert!(!session.select_all());
        assert!(!session.on_selection_change());
    }

    #[test]
    fn test_selection_change_toggles_raw_mode() {
        let mut s = session("a *b* c\nplain");
        assert_eq!(s.blocks()[0].mode(), BlockMode::Rendered);

        let surface = s.surface_mut().expect("attached");
        surface.select(SurfaceRange::caret(SurfacePoint::new(0, 2, 2)));
        assert!(s.on_selection_change());
        assert_eq!(s.blocks()[0].mode(), BlockMode::Raw);
        // balanced markers before the caret push it past the closing marker
        assert_eq!(s.selection(), Some(Selection::collapsed(7)));

        // the restore does not toggle anything again
        assert!(!s.on_selection_change());
    }

    #[test]
    fn test_focus_leave_renders_scope() {
        let mut s = session("**x**");
        caret(&mut s, 1);
        assert_eq!(s.blocks()[0].mode(), BlockMode::Raw);
        s.surface_mut().expect("attached").select_outside();
        assert!(s.on_selection_change());
        assert_eq!(s.blocks()[0].mode(), BlockMode::Rendered);
    }

    #[test]
    fn test_enter_notifies_and_places_caret() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut s = session("hello world");
        let sink = events.clone();
        s.on_change(move |event| sink.borrow_mut().push(event.clone()));

        caret(&mut s, 5);
        assert!(s.enter());
        assert_eq!(s.content(), "hello\n world");
        assert_eq!(s.selection(), Some(Selection::collapsed(6)));
        assert_eq!(s.blocks()[1].mode(), BlockMode::Raw);
        assert_eq!(
            events.borrow().as_slice(),
            &[ChangeEvent {
                kind: EditKind::Enter,
                len_chars: 12
            }]
        );
    }

    #[test]
    fn test_backspace_at_start_is_silent_noop() {
        let events = Rc::new(RefCell::new(0));
        let mut s = session("ab");
        let sink = events.clone();
        s.on_change(move |_| *sink.borrow_mut() += 1);
        caret(&mut s, 0);
        assert!(!s.backspace());
        assert_eq!(*events.borrow(), 0);
    }

    #[test]
    fn test_input_syncs_raw_blocks() {
        let mut s = session("ab");
        caret(&mut s, 2);
        let surface = s.surface_mut().expect("attached");
        surface.type_text("c");
        assert!(s.on_input());
        assert_eq!(s.content(), "abc");
        assert_eq!(s.selection(), Some(Selection::collapsed(3)));
        assert!(!s.on_input());
    }

    #[test]
    fn test_copy_cut_paste_through_clipboard() {
        let clipboard = MemoryClipboard::new();
        let mut s = session("a **b**\nc");
        s.select_all();
        assert!(s.copy(&clipboard));
        assert_eq!(clipboard.contents().as_deref(), Some("a **b**\nc"));

        assert!(s.set_selection_range(2, 7));
        assert!(s.cut(&clipboard));
        assert_eq!(clipboard.contents().as_deref(), Some("**b**"));
        assert_eq!(s.content(), "a \nc");

        caret(&mut s, 4);
        assert!(s.paste(&clipboard));
        assert_eq!(s.content(), "a \nc**b**");
    }

    #[test]
    fn test_handle_key() {
        let mut s = session("ab");
        caret(&mut s, 1);
        assert_eq!(s.handle_key(&Key::Enter, Modifiers::NONE), KeydownResult::Handled);
        assert_eq!(s.content(), "a\nb");
        assert_eq!(
            s.handle_key(&Key::character("x"), Modifiers::NONE),
            KeydownResult::NotHandled
        );
        assert_eq!(
            s.handle_key(&Key::ArrowLeft, Modifiers::NONE),
            KeydownResult::PassThrough
        );
        assert_eq!(
            s.handle_key(&Key::character("a"), Modifiers::CTRL),
            KeydownResult::Handled
        );
        assert!(s.blocks().iter().all(|b| b.mode() == BlockMode::Raw));
        assert_eq!(s.selection(), Some(Selection::new(0, 3)));
    }

    #[test]
    fn test_modified_line_keys_are_handled() {
        let mut s = session("ab");
        caret(&mut s, 1);
        assert_eq!(s.handle_key(&Key::Enter, Modifiers::SHIFT), KeydownResult::Handled);
        assert_eq!(s.content(), "a\nb");
        assert_eq!(s.blocks().len(), 2);

        assert_eq!(s.handle_key(&Key::Backspace, Modifiers::CTRL), KeydownResult::Handled);
        assert_eq!(s.content(), "ab");
        let alt = Modifiers {
            alt: true,
            ..Modifiers::NONE
        };
        assert_eq!(s.handle_key(&Key::Delete, alt), KeydownResult::Handled);
        assert_eq!(s.content(), "a");
    }

    #[test]
    fn test_no_marker_shift_in_block_already_raw() {
        let mut s = session("**ab** cd\nxy");
        assert!(s.select_all());
        // caret placed right after the closing markers of the raw source
        if let Some(surface) = s.surface_mut() {
            surface.select(SurfaceRange::caret(SurfacePoint::new(0, 0, 6)));
        }
        assert!(s.on_selection_change());
        assert_eq!(s.blocks()[0].mode(), BlockMode::Raw);
        assert_eq!(s.blocks()[1].mode(), BlockMode::Rendered);
        assert_eq!(s.selection(), Some(Selection::collapsed(6)));
    }

    #[test]
    fn test_placeholder_follows_content() {
        let mut s = session("");
        s.set_placeholder("Write here");
        let surface = s.surface().expect("attached");
        assert_eq!(surface.placeholder(), "Write here");
        assert!(surface.is_placeholder_shown());

        caret(&mut s, 0);
        assert!(s.insert_text("x"));
        assert!(!s.surface().expect("attached").is_placeholder_shown());
    }

    #[test]
    fn test_apply_attribute() {
        let mut s = session("«x»");
        assert_eq!(s.blocks()[0].direction(), Direction::Ltr);
        assert!(s.apply_attribute("default-direction", Some("rtl")));
        assert_eq!(s.blocks()[0].direction(), Direction::Rtl);
        assert!(s.apply_attribute("value", Some("new\ntext")));
        assert_eq!(s.content(), "new\ntext");
        assert!(!s.apply_attribute("unknown", Some("1")));
    }

    #[test]
    fn test_to_markup() {
        let mut s = session("**a** \"q\"");
        s.set_default_direction(Direction::Ltr);
        assert_eq!(
            s.to_markup(),
            "<span dir=\"ltr\" data-original=\"**a** &quot;q&quot;\"><p><strong>a</strong> \"q\"</p></span>"
        );
    }
}
