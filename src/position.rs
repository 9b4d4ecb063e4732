//! Signed-offset placement along one axis.
//!
//! Offsets are measured from the anchor edge: a positive offset moves inward
//! from a leading or trailing edge, a negative offset is measured from the
//! opposite edge. Centered placement treats the offset as a shift away from
//! the middle of the field.

use serde::{Deserialize, Serialize};

/// Reference point on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Leading,
    Center,
    Trailing,
}

/// Horizontal alignment of a placed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical alignment of a placed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum VAlign {
    #[default]
    Top,
    Center,
    Bottom,
}

impl From<Align> for Anchor {
    fn from(align: Align) -> Self {
        match align {
            Align::Left => Anchor::Leading,
            Align::Center => Anchor::Center,
            Align::Right => Anchor::Trailing,
        }
    }
}

impl From<VAlign> for Anchor {
    fn from(valign: VAlign) -> Self {
        match valign {
            VAlign::Top => Anchor::Leading,
            VAlign::Center => Anchor::Center,
            VAlign::Bottom => Anchor::Trailing,
        }
    }
}

impl Align {
    pub fn parse(word: &str) -> Option<Self> {
        match word.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

impl VAlign {
    pub fn parse(word: &str) -> Option<Self> {
        match word.trim().to_ascii_lowercase().as_str() {
            "top" => Some(Self::Top),
            "center" => Some(Self::Center),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }
}

/// Computes the start coordinate of an item of `item` pixels inside a field
/// of `field` pixels.
pub fn resolve_axis(field: i32, item: i32, offset: i32, anchor: Anchor) -> i32 {
    match anchor {
        Anchor::Leading if offset >= 0 => offset,
        Anchor::Leading => field + offset,
        Anchor::Trailing if offset >= 0 => field - offset - item,
        Anchor::Trailing => -offset - item,
        Anchor::Center if offset == 0 => (field - item) / 2,
        Anchor::Center if offset > 0 => field / 2 + offset,
        Anchor::Center => field / 2 + offset - item,
    }
}
