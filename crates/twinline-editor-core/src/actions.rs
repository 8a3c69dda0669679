//! Editor actions and keyboard input.
//!
//! `EditorAction` names the operations the session can perform, decoupled
//! from what triggered them. Platform code converts native key events into
//! `Key` + `Modifiers` and lets [`EditorAction::from_key`] decide whether the
//! editor takes the keystroke or the host keeps its default behaviour.

use smol_str::SmolStr;

/// All operations the editor performs on request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    /// Enter: split the block, or continue a multi-line construct.
    InsertParagraph,
    /// Backspace.
    DeleteBackward,
    /// Delete.
    DeleteForward,
    /// Put every block in raw mode and select the whole document.
    SelectAll,
    Copy,
    Cut,
    /// Replace the selection with pasted text, grouping multi-line constructs.
    Paste { text: String },
    /// Replace the selection with text.
    Insert { text: String },
}

impl EditorAction {
    /// The action bound to a keystroke, if any.
    pub fn from_key(key: &Key, modifiers: Modifiers, is_mac: bool) -> Option<Self> {
        let primary = Modifiers::primary(is_mac);
        match key {
            Key::Character(c) if modifiers == primary && c.eq_ignore_ascii_case("a") => {
                Some(Self::SelectAll)
            }
            // Bound under any modifier: a native line break or word delete
            // would edit the surface behind the block store's back.
            Key::Enter => Some(Self::InsertParagraph),
            Key::Backspace => Some(Self::DeleteBackward),
            Key::Delete => Some(Self::DeleteForward),
            _ => None,
        }
    }
}

/// Key values for keyboard input.
///
/// Platform-agnostic key representation. Platform-specific code converts
/// from native key events to this enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),

    /// Unknown/unidentified key.
    Unidentified,

    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,

    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,

    Alt,
    Control,
    Meta,
    Shift,
}

impl Key {
    /// Create a character key.
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    /// Parse a DOM `KeyboardEvent.key` value.
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "Backspace" => Self::Backspace,
            "Delete" => Self::Delete,
            "Enter" => Self::Enter,
            "Tab" => Self::Tab,
            "Escape" => Self::Escape,
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            "Home" => Self::Home,
            "End" => Self::End,
            "PageUp" => Self::PageUp,
            "PageDown" => Self::PageDown,
            "Alt" => Self::Alt,
            "Control" => Self::Control,
            "Meta" => Self::Meta,
            "Shift" => Self::Shift,
            "Unidentified" | "" => Self::Unidentified,
            other if other.chars().count() == 1 => Self::character(other),
            _ => Self::Unidentified,
        }
    }

    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::ArrowLeft
                | Self::ArrowRight
                | Self::ArrowUp
                | Self::ArrowDown
                | Self::Home
                | Self::End
                | Self::PageUp
                | Self::PageDown
        )
    }

    pub fn is_modifier(&self) -> bool {
        matches!(self, Self::Alt | Self::Control | Self::Meta | Self::Shift)
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    pub const META: Self = Self {
        meta: true,
        ..Self::NONE
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    /// Get the primary modifier for the platform (Cmd on Mac, Ctrl elsewhere).
    pub fn primary(is_mac: bool) -> Self {
        if is_mac { Self::META } else { Self::CTRL }
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not a keybinding, let platform handle it.
    NotHandled,
    /// Navigation and modifier keys; the platform moves the caret and the
    /// selection-change path takes over.
    PassThrough,
}
