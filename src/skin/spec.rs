//! Immutable overlay declarations produced by the skin loader.
//!
//! All vectors here are fixed-arity: rule and condition vectors have one
//! entry per layer attribute, checked when the skin is loaded.

use std::collections::HashMap;

use crate::attribute::{AttributeKind, AttributeName};
use crate::position::{Align, VAlign};

// ============================================================================
// Extent
// ============================================================================

/// Width or height token of a layer: reuse the first image's size, use each
/// image's own size, or a fixed pixel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extent {
    #[default]
    Equal,
    Auto,
    Fixed(u32),
}

impl Extent {
    pub fn parse(word: &str) -> Option<Self> {
        let word = word.trim();
        if word.eq_ignore_ascii_case("equal") {
            Some(Self::Equal)
        } else if word.eq_ignore_ascii_case("auto") {
            Some(Self::Auto)
        } else if !word.is_empty() && word.bytes().all(|b| b.is_ascii_digit()) {
            word.parse().ok().map(Self::Fixed)
        } else {
            None
        }
    }

    pub fn fixed(self) -> Option<u32> {
        match self {
            Self::Fixed(px) => Some(px),
            _ => None,
        }
    }

    /// Size to draw an image of `native` pixels with.
    pub fn drawn(self, native: u32) -> u32 {
        self.fixed().unwrap_or(native)
    }
}

// ============================================================================
// PositionSpec
// ============================================================================

/// Placement of one layer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PositionSpec {
    pub left: i32,
    pub top: i32,
    pub align: Align,
    pub valign: VAlign,
    pub width: Extent,
    pub height: Extent,
}

// ============================================================================
// Rules
// ============================================================================

/// Match values of an image rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleValues {
    /// Compared against each sub-value of the rule's own attribute.
    Single(String),
    /// One value per layer attribute, all of which must match.
    Joint(Vec<String>),
}

/// Overlay image chosen when its values match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRule {
    /// Index of the rule's attribute in [`LayerSpec::names`].
    pub slot: usize,
    pub values: RuleValues,
    pub filename: String,
}

/// Alternative placement applied when every slot value matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalPosition {
    pub values: Vec<String>,
    pub positions: Vec<PositionSpec>,
}

/// One configured overlay layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSpec {
    pub names: Vec<AttributeName>,
    /// Drawn before the watermark overlay when true, after it otherwise.
    pub before: bool,
    pub position: PositionSpec,
    pub images: Vec<ImageRule>,
    pub positions: Vec<ConditionalPosition>,
}

impl LayerSpec {
    pub fn arity(&self) -> usize {
        self.names.len()
    }

    /// Joined attribute tokens, used in log messages.
    pub fn label(&self) -> String {
        self.names
            .iter()
            .map(|n| n.token.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }
}

// ============================================================================
// BlockSpec
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Fill a row before moving to the next one (`horizontal`).
    #[default]
    RowMajor,
    /// Fill a column before moving to the next one (`vertical`).
    ColumnMajor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sizing {
    /// Cells share the first image's extent divided by the grid size.
    Static,
    /// Images keep their native extent.
    #[default]
    Auto,
}

/// Grid layout for an attribute drawn as a block of badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockSpec {
    pub direction: Direction,
    pub sizing: Sizing,
    /// 0 derives the count from the number of images.
    pub cols: u32,
    pub rows: u32,
    pub hmargin: i32,
    pub vmargin: i32,
    /// Repeated filenames are drawn again when true.
    pub clones: bool,
}

/// Declarative overlay configuration shared by every profile using it.
#[derive(Debug, Clone, Default)]
pub struct OverlaySpec {
    pub layers: Vec<LayerSpec>,
    pub blocks: HashMap<AttributeKind, BlockSpec>,
}

impl OverlaySpec {
    pub fn block(&self, kind: AttributeKind) -> Option<&BlockSpec> {
        self.blocks.get(&kind)
    }

    /// Layers drawn in the given pass, in declaration order.
    pub fn pass(&self, before: bool) -> impl Iterator<Item = &LayerSpec> {
        self.layers.iter().filter(move |layer| layer.before == before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_words() {
        assert_eq!(Extent::parse("Equal"), Some(Extent::Equal));
        assert_eq!(Extent::parse("auto"), Some(Extent::Auto));
        assert_eq!(Extent::parse("48"), Some(Extent::Fixed(48)));
        assert_eq!(Extent::parse("-4"), None);
        assert_eq!(Extent::parse("wide"), None);
    }

    #[test]
    fn drawn_size_prefers_fixed() {
        assert_eq!(Extent::Fixed(10).drawn(64), 10);
        assert_eq!(Extent::Equal.drawn(64), 64);
        assert_eq!(Extent::Auto.drawn(64), 64);
    }

    #[test]
    fn pass_filters_by_before_flag() {
        let layer = |before| LayerSpec {
            names: vec![AttributeName::parse("HD")],
            before,
            position: PositionSpec::default(),
            images: Vec::new(),
            positions: Vec::new(),
        };
        let spec = OverlaySpec {
            layers: vec![layer(true), layer(false), layer(true)],
            blocks: HashMap::new(),
        };
        assert_eq!(spec.pass(true).count(), 2);
        assert_eq!(spec.pass(false).count(), 1);
    }
}
