//! Rule matching: which overlay images a layer draws and where.
//!
//! A [`ResolvedState`] is built fresh for every layer of every render. It
//! holds the resolved value of each layer slot, the filenames selected for
//! it and its working position, which a [`ConditionalPosition`] may replace.

use crate::artwork::ArtworkTarget;
use crate::attribute::{self, AttributeKind, ResolveContext, SEPARATOR};
use crate::keywords::KeywordTables;
use crate::media::MediaMetadataView;
use crate::profile::RenderProfile;
use crate::skin::{ConditionalPosition, LayerSpec, PositionSpec, RuleValues};

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// Compares a rule condition against a resolved value.
///
/// Matches when the condition equals the value ignoring case, when it is the
/// `default` wildcard, when (for `keywords`) the value contains it, or when
/// the value is one of the condition's synonyms in the attribute's keyword
/// table. An `UNKNOWN` value never matches.
pub fn cmp_overlay_value(
    kind: Option<AttributeKind>,
    condition: &str,
    value: &str,
    keywords: &KeywordTables,
) -> bool {
    if !attribute::is_known(value) {
        return false;
    }
    let substring = kind == Some(AttributeKind::Keywords);
    let lowered = value.to_lowercase();

    if (substring && lowered.contains(&condition.to_lowercase()))
        || eq_ignore_case(condition, value)
        || condition.eq_ignore_ascii_case("default")
    {
        return true;
    }

    let Some(synonyms) = kind
        .and_then(|k| keywords.get(k))
        .and_then(|table| table.synonyms(condition))
    else {
        return false;
    };
    synonyms.iter().any(|synonym| {
        if substring {
            lowered.contains(&synonym.to_lowercase())
        } else {
            eq_ignore_case(synonym, value)
        }
    })
}

// ============================================================================
// ResolvedState
// ============================================================================

/// Per-slot render state of one layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotState {
    pub value: String,
    /// Selected overlay files, one per matching sub-value.
    pub filenames: Vec<String>,
    pub position: PositionSpec,
}

/// Render state of one layer for one render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedState {
    pub slots: Vec<SlotState>,
}

impl ResolvedState {
    /// Resolves every slot of `layer`. Slots whose attribute is disabled in
    /// the profile resolve to `UNKNOWN`.
    pub fn resolve(
        layer: &LayerSpec,
        media: &dyn MediaMetadataView,
        profile: &RenderProfile,
        target: ArtworkTarget,
        highdef_differentiate: bool,
    ) -> Self {
        let slots = layer
            .names
            .iter()
            .map(|name| {
                let mode = name.kind.map(|k| profile.mode(k)).unwrap_or_default();
                let ctx = ResolveContext {
                    target,
                    mode,
                    highdef_differentiate,
                };
                SlotState {
                    value: attribute::resolve_name(name, media, &ctx),
                    filenames: Vec::new(),
                    position: layer.position,
                }
            })
            .collect();
        Self { slots }
    }

    /// Builds a state from already resolved values.
    pub fn from_values(layer: &LayerSpec, values: &[&str]) -> Self {
        let slots = values
            .iter()
            .map(|value| SlotState {
                value: value.to_string(),
                filenames: Vec::new(),
                position: layer.position,
            })
            .collect();
        Self { slots }
    }

    pub fn values(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.value.as_str()).collect()
    }

    /// True when any slot selected at least one file.
    pub fn has_files(&self) -> bool {
        self.slots.iter().any(|s| !s.filenames.is_empty())
    }

    /// Selected files of a slot, joined with the value separator.
    pub fn joined_files(&self, slot: usize) -> String {
        self.slots
            .get(slot)
            .map(|s| s.filenames.join(SEPARATOR))
            .unwrap_or_default()
    }
}

// ============================================================================
// ImageSelector
// ============================================================================

/// Selects overlay files for the slots of a layer.
///
/// `enabled` tells which slots take part; others keep no files. Each slot
/// value is split on the separator and every sub-value takes the file of the
/// first rule of that slot that matches it. Joint rules match only when every
/// slot's full value matches the rule's value for that slot.
pub fn select_images(
    layer: &LayerSpec,
    state: &mut ResolvedState,
    enabled: &[bool],
    keywords: &KeywordTables,
) {
    let values: Vec<String> = state.slots.iter().map(|s| s.value.clone()).collect();

    for (slot, value) in values.iter().enumerate() {
        if !enabled.get(slot).copied().unwrap_or(false) {
            continue;
        }
        let kind = layer.names[slot].kind;
        let mut files = Vec::new();
        for sub in value.split(SEPARATOR) {
            let chosen = layer
                .images
                .iter()
                .filter(|rule| rule.slot == slot)
                .find(|rule| match &rule.values {
                    RuleValues::Single(condition) => {
                        cmp_overlay_value(kind, condition, sub, keywords)
                    }
                    RuleValues::Joint(conditions) => {
                        conditions.iter().zip(&values).zip(&layer.names).all(
                            |((condition, full), name)| {
                                cmp_overlay_value(name.kind, condition, full, keywords)
                            },
                        )
                    }
                });
            if let Some(rule) = chosen {
                files.push(rule.filename.clone());
            }
        }
        state.slots[slot].filenames = files;
    }
}

/// Applies the first conditional position whose values all match.
///
/// Returns the condition that fired, if any. At most one fires per call.
pub fn apply_conditional_positions<'a>(
    layer: &'a LayerSpec,
    state: &mut ResolvedState,
    keywords: &KeywordTables,
) -> Option<&'a ConditionalPosition> {
    let fired = layer.positions.iter().find(|cond| {
        cond.values
            .iter()
            .zip(&state.slots)
            .zip(&layer.names)
            .all(|((condition, slot), name)| {
                cmp_overlay_value(name.kind, condition, &slot.value, keywords)
            })
    })?;
    for (slot, position) in state.slots.iter_mut().zip(&fired.positions) {
        slot.position = *position;
    }
    Some(fired)
}
