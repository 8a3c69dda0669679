//! DOM event wiring.
//!
//! Each listener borrows the shared session for the duration of one handler.
//! A handler that finds the session already borrowed skips the event: that
//! only happens when the editor's own DOM work raises an event synchronously,
//! and the handler that caused it is already taking care of the state.
//!
//! Change notifications are queued while a handler runs and delivered after
//! the borrow is released, so host callbacks can read the editor freely.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::{EventListener, EventListenerOptions};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{ClipboardEvent, Event, EventInit, HtmlElement, KeyboardEvent};

use twinline_editor_core::{
    ChangeEvent, EditorSession, Key, KeydownResult, Modifiers, PlatformError,
};

use crate::clipboard::BrowserClipboard;
use crate::surface::DomSurface;

pub type DomSession = EditorSession<DomSurface>;
pub type SharedSession = Rc<RefCell<DomSession>>;

/// Where change notifications go: an `input` event on the root and an
/// optional host callback.
#[derive(Default)]
pub struct ChangeSink {
    pub target: Option<HtmlElement>,
    pub callback: Option<js_sys::Function>,
    pending: Vec<ChangeEvent>,
}

impl ChangeSink {
    pub fn queue(&mut self, event: &ChangeEvent) {
        self.pending.push(event.clone());
    }

    /// Deliver queued notifications.
    pub fn flush(sink: &Rc<RefCell<ChangeSink>>) {
        let (pending, target, callback) = {
            let mut sink = sink.borrow_mut();
            if sink.pending.is_empty() {
                return;
            }
            (
                std::mem::take(&mut sink.pending),
                sink.target.clone(),
                sink.callback.clone(),
            )
        };
        for event in pending {
            tracing::trace!(kind = ?event.kind, len = event.len_chars, "change dispatched");
            if let Some(target) = &target {
                dispatch_input(target);
            }
            if let Some(callback) = &callback {
                if let Err(e) = callback.call0(&JsValue::NULL) {
                    tracing::warn!("change callback threw: {:?}", e);
                }
            }
        }
    }
}

/// Raise a bubbling, untrusted `input` event for form bindings.
fn dispatch_input(target: &HtmlElement) {
    let init = EventInit::new();
    init.set_bubbles(true);
    match Event::new_with_event_init_dict("input", &init) {
        Ok(event) => {
            if let Err(e) = target.dispatch_event(&event) {
                tracing::warn!("input dispatch failed: {:?}", e);
            }
        }
        Err(e) => tracing::warn!("input event creation failed: {:?}", e),
    }
}

/// Run `f` against the session if it is free, then deliver notifications.
fn with_session<T>(
    session: &SharedSession,
    sink: &Rc<RefCell<ChangeSink>>,
    event: &'static str,
    f: impl FnOnce(&mut DomSession) -> T,
) -> Option<T> {
    let result = match session.try_borrow_mut() {
        Ok(mut session) => Some(f(&mut session)),
        Err(_) => {
            tracing::debug!(event, "session busy, event skipped");
            None
        }
    };
    ChangeSink::flush(sink);
    result
}

/// Attach every listener the editor needs. Dropping the returned listeners
/// detaches them.
pub fn install(
    root: &HtmlElement,
    session: &SharedSession,
    sink: &Rc<RefCell<ChangeSink>>,
) -> Result<Vec<EventListener>, PlatformError> {
    let document = root.owner_document().ok_or("root is not in a document")?;

    let keydown = {
        let (session, sink) = (session.clone(), sink.clone());
        EventListener::new_with_options(root, "keydown", EventListenerOptions::enable_prevent_default(), move |event| {
            let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            // leave IME composition to the browser
            if event.is_composing() {
                return;
            }
            let key = Key::from_dom_key(&event.key());
            let modifiers = Modifiers {
                ctrl: event.ctrl_key(),
                alt: event.alt_key(),
                shift: event.shift_key(),
                meta: event.meta_key(),
            };
            let result = with_session(&session, &sink, "keydown", |s| {
                s.handle_key(&key, modifiers)
            });
            if result == Some(KeydownResult::Handled) {
                event.prevent_default();
            }
        })
    };

    let selection = {
        let (session, sink) = (session.clone(), sink.clone());
        EventListener::new(&document, "selectionchange", move |_| {
            with_session(&session, &sink, "selectionchange", |s| {
                s.on_selection_change()
            });
        })
    };

    let input = {
        let (session, sink) = (session.clone(), sink.clone());
        EventListener::new(root, "input", move |event| {
            // our own change notifications come back through here
            if !event.is_trusted() {
                return;
            }
            with_session(&session, &sink, "input", |s| s.on_input());
        })
    };

    let copy = {
        let (session, sink) = (session.clone(), sink.clone());
        EventListener::new_with_options(root, "copy", EventListenerOptions::enable_prevent_default(), move |event| {
            let Some(event) = event.dyn_ref::<ClipboardEvent>() else {
                return;
            };
            let clipboard = BrowserClipboard::from_event(event);
            if with_session(&session, &sink, "copy", |s| s.copy(&clipboard)) == Some(true) {
                event.prevent_default();
            }
        })
    };

    let cut = {
        let (session, sink) = (session.clone(), sink.clone());
        EventListener::new_with_options(root, "cut", EventListenerOptions::enable_prevent_default(), move |event| {
            let Some(event) = event.dyn_ref::<ClipboardEvent>() else {
                return;
            };
            let clipboard = BrowserClipboard::from_event(event);
            if with_session(&session, &sink, "cut", |s| s.cut(&clipboard)) == Some(true) {
                event.prevent_default();
            }
        })
    };

    let paste = {
        let (session, sink) = (session.clone(), sink.clone());
        EventListener::new_with_options(root, "paste", EventListenerOptions::enable_prevent_default(), move |event| {
            let Some(event) = event.dyn_ref::<ClipboardEvent>() else {
                return;
            };
            // never let rich content in
            event.prevent_default();
            let clipboard = BrowserClipboard::from_event(event);
            with_session(&session, &sink, "paste", |s| s.paste(&clipboard));
        })
    };

    Ok(vec![keydown, selection, input, copy, cut, paste])
}

/// Shortcut used by the wasm bindings: run `f` with the session and deliver
/// notifications, failing when the session is busy.
pub fn run<T>(
    session: &SharedSession,
    sink: &Rc<RefCell<ChangeSink>>,
    f: impl FnOnce(&mut DomSession) -> T,
) -> Result<T, PlatformError> {
    with_session(session, sink, "host call", f).ok_or_else(|| "editor is busy".into())
}
