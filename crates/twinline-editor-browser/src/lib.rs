//! Browser DOM layer for the twinline editor.
//!
//! This crate implements the core's `Surface` and `ClipboardPlatform` seams
//! over web-sys and wires browser events into an `EditorSession`. It assumes
//! a `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `surface`: one `<span>` per block under a contenteditable root, Selection API handling
//! - `clipboard`: DataTransfer-backed clipboard for copy, cut and paste events
//! - `events`: keydown, selectionchange, input and clipboard listeners
//! - `editor`: `TwinlineEditor`, the wasm-bindgen entry point for JavaScript hosts
//! - `platform`: Browser/OS detection for keybindings
//!
//! # Re-exports
//!
//! This crate re-exports `twinline-editor-core` for convenience, so consumers
//! only need to depend on `twinline-editor-browser`.

pub use twinline_editor_core;
pub use twinline_editor_core::*;

pub mod clipboard;
pub mod editor;
pub mod events;
pub mod platform;
pub mod surface;

pub use clipboard::BrowserClipboard;
pub use editor::TwinlineEditor;
pub use events::{ChangeSink, DomSession, SharedSession};
pub use platform::{Platform, platform};
pub use surface::DomSurface;

use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Route `tracing` output to the browser console.
///
/// Debug builds log at `DEBUG`, release builds at `INFO`. Calling this more
/// than once keeps the first subscriber.
#[wasm_bindgen(js_name = installTracing)]
pub fn install_tracing() {
    use tracing::subscriber::set_global_default;
    use tracing_subscriber::Registry;
    use tracing_subscriber::layer::SubscriberExt;

    let console_level = if cfg!(debug_assertions) {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let wasm_layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(console_level)
            .build(),
    );

    let reg = Registry::default().with(wasm_layer);

    let _ = set_global_default(reg);
}
