//! TwinlineEditor - the editor as seen from JavaScript.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::EventListener;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use twinline_editor_core::{Direction, EditorConfig, EditorSession};

use crate::events::{self, ChangeSink, DomSession, SharedSession};
use crate::platform::platform;
use crate::surface::DomSurface;

/// Class added to the root while mounted.
const CONTENT_CLASS: &str = "twinline-editor-content";

/// One editing surface bound to a host element.
#[wasm_bindgen]
pub struct TwinlineEditor {
    session: SharedSession,
    sink: Rc<RefCell<ChangeSink>>,
    listeners: Vec<EventListener>,
}

impl Default for TwinlineEditor {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl TwinlineEditor {
    /// Create an unmounted editor with default configuration.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        let sink = Rc::new(RefCell::new(ChangeSink::default()));
        let mut session: DomSession = EditorSession::new(EditorConfig::new());
        let queue = sink.clone();
        session.on_change(move |event| queue.borrow_mut().queue(event));
        Self {
            session: Rc::new(RefCell::new(session)),
            sink,
            listeners: Vec::new(),
        }
    }

    // === Mounting ===

    /// Mount the editor on an element.
    ///
    /// The element becomes contenteditable and its children are replaced by
    /// the document's blocks. `on_change` is called after every committed
    /// edit, right after a bubbling `input` event is raised on the element.
    #[wasm_bindgen]
    pub fn mount(
        &mut self,
        root: &HtmlElement,
        on_change: Option<js_sys::Function>,
    ) -> Result<(), JsError> {
        if self.is_mounted() {
            self.unmount();
        }

        root.set_attribute("contenteditable", "true")
            .map_err(|e| JsError::new(&format!("Failed to set contenteditable: {:?}", e)))?;
        root.class_list()
            .add_1(CONTENT_CLASS)
            .map_err(|e| JsError::new(&format!("Failed to set class: {:?}", e)))?;

        let listeners = events::install(root, &self.session, &self.sink)
            .map_err(|e| JsError::new(&e.to_string()))?;

        {
            let mut sink = self.sink.borrow_mut();
            sink.target = Some(root.clone());
            sink.callback = on_change;
        }
        self.with_session(|s| {
            s.set_mac_keybindings(platform().primary_is_meta());
            s.attach(DomSurface::new(root.clone()));
        })?;
        self.listeners = listeners;
        tracing::debug!("editor mounted");
        Ok(())
    }

    #[wasm_bindgen(js_name = isMounted)]
    pub fn is_mounted(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// Detach listeners and release the element. The document is kept and
    /// shown again on the next mount.
    #[wasm_bindgen]
    pub fn unmount(&mut self) {
        self.listeners.clear();
        let surface = self
            .session
            .try_borrow_mut()
            .ok()
            .and_then(|mut s| s.detach());
        if let Some(surface) = surface {
            let _ = surface.root().class_list().remove_1(CONTENT_CLASS);
        }
        let mut sink = self.sink.borrow_mut();
        sink.target = None;
        sink.callback = None;
    }

    // === Content ===

    /// Raw source of the document, one line per block.
    #[wasm_bindgen(getter)]
    pub fn value(&self) -> Result<String, JsError> {
        self.with_session(|s| s.content())
    }

    /// Replace the document. Buffered until mounted.
    #[wasm_bindgen(setter)]
    pub fn set_value(&self, value: &str) {
        if let Err(e) = events::run(&self.session, &self.sink, |s| s.set_content(value)) {
            tracing::warn!(error = %e, "value not applied");
        }
    }

    /// Select a flat character range.
    #[wasm_bindgen(js_name = setSelectionRange)]
    pub fn set_selection_range(&self, start: usize, end: usize) -> Result<bool, JsError> {
        self.with_session(|s| s.set_selection_range(start, end))
    }

    /// Mirror a host attribute (`value`, `placeholder`, `default-direction`).
    /// `None` means the attribute was removed.
    #[wasm_bindgen(js_name = setAttribute)]
    pub fn set_attribute(&self, name: &str, value: Option<String>) -> Result<bool, JsError> {
        self.with_session(|s| s.apply_attribute(name, value.as_deref()))
    }

    #[wasm_bindgen(js_name = setPlaceholder)]
    pub fn set_placeholder(&self, placeholder: &str) -> Result<(), JsError> {
        self.with_session(|s| s.set_placeholder(placeholder))
    }

    /// Set the direction fallback from an attribute value: `ltr` or anything
    /// else for right-to-left.
    #[wasm_bindgen(js_name = setDefaultDirection)]
    pub fn set_default_direction(&self, direction: &str) -> Result<(), JsError> {
        let direction = Direction::from_attribute(direction);
        self.with_session(|s| s.set_default_direction(direction))
    }

    #[wasm_bindgen(js_name = placeholderVisible)]
    pub fn placeholder_visible(&self) -> Result<bool, JsError> {
        self.with_session(|s| s.placeholder_visible())
    }

    /// Serialized blocks: one `span` per block with its direction and source.
    #[wasm_bindgen(js_name = toMarkup)]
    pub fn to_markup(&self) -> Result<String, JsError> {
        self.with_session(|s| s.to_markup())
    }

    /// Select every block as raw source.
    #[wasm_bindgen(js_name = selectAll)]
    pub fn select_all(&self) -> Result<bool, JsError> {
        self.with_session(|s| s.select_all())
    }

    /// Replace the selection with text, as if pasted.
    #[wasm_bindgen(js_name = insertText)]
    pub fn insert_text(&self, text: &str) -> Result<bool, JsError> {
        self.with_session(|s| s.insert_text(text))
    }
}

impl TwinlineEditor {
    fn with_session<T>(&self, f: impl FnOnce(&mut DomSession) -> T) -> Result<T, JsError> {
        events::run(&self.session, &self.sink, f).map_err(|e| JsError::new(&e.to_string()))
    }
}
