//! Core editor types: selection, direction, block mode, and change tracking.
//!
//! These types are surface-agnostic and shared by the block store, the
//! offset mapper and the editor session.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Zero-width glyph materialized in blocks that have no text, so the surface
/// always has somewhere to put the caret.
pub const PLACEHOLDER: char = '\u{200B}';

/// Text selection with anchor and head positions, in flat offsets.
///
/// The anchor is where the selection started, the head is where the caret is now.
/// They may be in any order - use `start()` and `end()` for ordered bounds.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Where selection started
    pub anchor: usize,
    /// Where the caret is now
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Create a collapsed selection (caret position).
    pub fn collapsed(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
        }
    }

    /// Lower bound of the selection.
    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// Upper bound of the selection.
    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }

    /// Convert to an ordered `Range<usize>`.
    pub fn to_range(&self) -> Range<usize> {
        self.start()..self.end()
    }

    /// Check if the selection is backwards (head before anchor).
    pub fn is_backwards(&self) -> bool {
        self.head < self.anchor
    }

    /// Shift both ends forward by `delta`, keeping orientation.
    pub fn shifted(&self, delta: usize) -> Self {
        Self {
            anchor: self.anchor + delta,
            head: self.head + delta,
        }
    }
}

/// Writing direction of a block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    #[default]
    Rtl,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }

    /// Lenient parse used for host attributes: only the exact value `ltr`
    /// selects left-to-right, anything else falls back to right-to-left.
    pub fn from_attribute(value: &str) -> Self {
        if value == "ltr" {
            Direction::Ltr
        } else {
            Direction::Rtl
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ltr" => Ok(Direction::Ltr),
            "rtl" => Ok(Direction::Rtl),
            _ => Err(ConfigError::InvalidDirection(s.to_string())),
        }
    }
}

/// Which representation of a block is materialized on the surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockMode {
    #[default]
    Rendered,
    Raw,
}

/// The kind of committed mutation reported to change listeners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditKind {
    Enter,
    Backspace,
    Delete,
    Cut,
    Paste,
    Input,
}

/// Payload handed to change listeners after each committed mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: EditKind,
    /// Document length (in chars) after the edit.
    pub len_chars: usize,
}
