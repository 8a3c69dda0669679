//! Editor configuration.
//!
//! Hosts configure the editor through two attributes, `placeholder` and
//! `default-direction`. The same names are used for serialized config.

use serde::{Deserialize, Serialize};

use crate::types::Direction;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EditorConfig {
    /// Shown while the document is empty.
    pub placeholder: String,
    /// Fallback for the direction detector.
    pub default_direction: Direction,
}

/// A configuration attribute the editor recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Placeholder,
    DefaultDirection,
}

impl Attribute {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "placeholder" => Some(Attribute::Placeholder),
            "default-direction" => Some(Attribute::DefaultDirection),
            _ => None,
        }
    }
}

impl EditorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_default_direction(mut self, direction: Direction) -> Self {
        self.default_direction = direction;
        self
    }

    /// Apply a host attribute change. A removed attribute (`None`) resets the
    /// value to its default.
    ///
    /// Returns the attribute that changed, or `None` for unknown names and
    /// unchanged values.
    pub fn apply_attribute(&mut self, name: &str, value: Option<&str>) -> Option<Attribute> {
        let attribute = Attribute::from_name(name)?;
        let changed = match attribute {
            Attribute::Placeholder => {
                let placeholder = value.unwrap_or_default();
                let changed = self.placeholder != placeholder;
                self.placeholder = placeholder.to_string();
                changed
            }
            Attribute::DefaultDirection => {
                let direction = value.map(Direction::from_attribute).unwrap_or_default();
                let changed = self.default_direction != direction;
                self.default_direction = direction;
                changed
            }
        };
        changed.then_some(attribute)
    }
}
