//! Browser clipboard implementation.
//!
//! Implements `ClipboardPlatform` over a ClipboardEvent's DataTransfer, which
//! gives sync access inside copy, cut and paste handlers. Only `text/plain`
//! is exchanged: the editor copies raw source, never rendered markup.

use twinline_editor_core::ClipboardPlatform;

/// Browser clipboard context wrapping a ClipboardEvent's DataTransfer.
pub struct BrowserClipboard {
    data_transfer: Option<web_sys::DataTransfer>,
}

impl BrowserClipboard {
    /// Create from a ClipboardEvent.
    ///
    /// Call this in your copy/cut/paste event handler.
    pub fn from_event(evt: &web_sys::ClipboardEvent) -> Self {
        Self {
            data_transfer: evt.clipboard_data(),
        }
    }

    /// Create an empty clipboard context (for testing or non-event contexts).
    pub fn empty() -> Self {
        Self {
            data_transfer: None,
        }
    }
}

impl ClipboardPlatform for BrowserClipboard {
    fn write_text(&self, text: &str) {
        let Some(dt) = &self.data_transfer else {
            tracing::debug!("no clipboard payload to write to");
            return;
        };
        if let Err(e) = dt.set_data("text/plain", text) {
            tracing::warn!("Clipboard write failed: {:?}", e);
        }
    }

    fn read_text(&self) -> Option<String> {
        let dt = self.data_transfer.as_ref()?;
        dt.get_data("text/plain").ok().filter(|s| !s.is_empty())
    }
}
