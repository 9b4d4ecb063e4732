//! Skin documents and their compilation into an immutable [`Skin`].
//!
//! A skin is a JSON document holding keyword tables, named layer sets
//! (layers plus block layouts) and one profile per artwork kind. The
//! [`SkinLoader`] validates everything once; the resulting [`Skin`] is
//! read-only and meant to be shared behind an `Arc` by concurrent renders.
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "highdefDifferentiate": true,
//!   "keywords": { "videosource": "bluray / BDRip / BRRip" },
//!   "layerSets": {
//!     "default": {
//!       "layers": [{
//!         "name": "HD/TV",
//!         "valign": "bottom",
//!         "images": [
//!           { "name": "HD", "value": "hd720", "filename": "hd-720.png" },
//!           { "name": "TV", "value": "TRUE", "filename": "tv.png" }
//!         ],
//!         "positions": [{ "value": "hd720/TRUE", "left": "5/-5", "align": "left/right" }]
//!       }],
//!       "blocks": [{ "name": "audiocodec", "dir": "horizontal", "cols": 2 }]
//!     }
//!   },
//!   "profiles": { "posters": { "layerSet": "default", "attributes": { "HD": true } } }
//! }
//! ```

pub mod spec;

pub use spec::{
    BlockSpec, ConditionalPosition, Direction, Extent, ImageRule, LayerSpec, OverlaySpec,
    PositionSpec, RuleValues, Sizing,
};

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::artwork::ArtworkKind;
use crate::attribute::{AttributeKind, AttributeName, UNKNOWN};
use crate::error::{ConfigError, ConfigResult};
use crate::keywords::{KeywordTable, KeywordTables};
use crate::position::{Align, VAlign};
use crate::profile::{ProfileSettings, RenderProfile};

// ============================================================================
// Serializable skin schema
// ============================================================================

/// A number or a word, as found in fields like `cols` (`2` or `"auto"`) or
/// per-slot overrides (`"5/-5"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Text(String),
}

impl Scalar {
    pub fn text(&self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct ImageSettings {
    /// Attribute the rule belongs to; defaults to the layer's first attribute.
    pub name: Option<String>,
    /// Match value, `/`-joined across attributes for joint rules.
    pub value: Option<Scalar>,
    pub filename: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct PositionSettings {
    /// `/`-joined match vector, one value per layer attribute.
    pub value: String,
    pub left: Option<Scalar>,
    pub top: Option<Scalar>,
    pub align: Option<String>,
    pub valign: Option<String>,
    pub width: Option<Scalar>,
    pub height: Option<Scalar>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct LayerSettings {
    /// `/`-joined attribute tokens.
    pub name: String,
    /// Draw after the watermark overlay.
    pub after: bool,
    pub left: i32,
    pub top: i32,
    pub align: Option<String>,
    pub valign: Option<String>,
    pub width: Option<Scalar>,
    pub height: Option<Scalar>,
    pub images: Vec<ImageSettings>,
    pub positions: Vec<PositionSettings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct BlockSettings {
    pub name: String,
    /// `horizontal` (default) or `vertical`.
    pub dir: Option<String>,
    /// `static` or `auto` (default).
    pub size: Option<String>,
    pub cols: Option<Scalar>,
    pub rows: Option<Scalar>,
    pub hmargin: i32,
    pub vmargin: i32,
    pub clones: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct LayerSetSettings {
    pub layers: Vec<LayerSettings>,
    pub blocks: Vec<BlockSettings>,
}

/// Top-level skin document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct SkinSettings {
    pub highdef_differentiate: bool,
    /// Default `clones` flag of blocks that do not set one.
    pub block_clones: bool,
    /// Overlay resources directory, relative to the skin file.
    pub resources: Option<String>,
    /// Flat keyword string per attribute token.
    pub keywords: BTreeMap<String, String>,
    pub layer_sets: BTreeMap<String, LayerSetSettings>,
    /// Profile per artwork kind key (`posters`, `thumbnails`, ...).
    pub profiles: BTreeMap<String, ProfileSettings>,
}

impl SkinSettings {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// JSON schema of the skin document.
#[cfg(feature = "jsonschema")]
pub fn json_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(SkinSettings)
}

// ============================================================================
// Skin
// ============================================================================

/// How logos are chosen for a profile.
#[derive(Debug, Clone)]
pub enum OverlayMode {
    /// Built-in HD/TV/language/subtitle/set logos.
    Legacy,
    Declarative(Arc<OverlaySpec>),
}

#[derive(Debug, Clone)]
pub struct CompiledProfile {
    pub profile: RenderProfile,
    pub overlay: OverlayMode,
}

/// Immutable, validated skin.
#[derive(Debug, Clone, Default)]
pub struct Skin {
    pub highdef_differentiate: bool,
    pub resources: PathBuf,
    pub keywords: KeywordTables,
    profiles: HashMap<ArtworkKind, CompiledProfile>,
}

impl Skin {
    /// An empty skin reading overlay images from `resources`.
    pub fn new(resources: impl Into<PathBuf>) -> Self {
        Self {
            resources: resources.into(),
            ..Self::default()
        }
    }

    pub fn with_profile(
        mut self,
        kind: ArtworkKind,
        profile: RenderProfile,
        overlay: OverlayMode,
    ) -> Self {
        self.profiles.insert(kind, CompiledProfile { profile, overlay });
        self
    }

    pub fn with_keywords(mut self, kind: AttributeKind, table: KeywordTable) -> Self {
        self.keywords.insert(kind, table);
        self
    }

    pub fn with_highdef_differentiate(mut self, on: bool) -> Self {
        self.highdef_differentiate = on;
        self
    }

    pub fn profile(&self, kind: ArtworkKind) -> Option<&CompiledProfile> {
        self.profiles.get(&kind)
    }
}

// ============================================================================
// SkinLoader
// ============================================================================

/// Validates skin documents into [`Skin`]s.
///
/// By default any invalid layer set fails the whole load. With
/// [`degrade_on_error`](Self::degrade_on_error), profiles whose layer set is
/// invalid fall back to the legacy logo set instead, and the failure is
/// logged at error level.
#[derive(Debug, Clone, Default)]
pub struct SkinLoader {
    degrade_on_error: bool,
    resources: Option<PathBuf>,
}

impl SkinLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn degrade_on_error(mut self, degrade: bool) -> Self {
        self.degrade_on_error = degrade;
        self
    }

    /// Overrides the resources directory named by the document.
    pub fn resources(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resources = Some(dir.into());
        self
    }

    /// Loads a skin document; relative resource paths resolve against its directory.
    pub fn load_file(&self, path: impl AsRef<Path>) -> ConfigResult<Skin> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = SkinSettings::from_json(&json)?;
        self.compile(&settings, path.parent().unwrap_or(Path::new(".")))
    }

    /// Loads a skin document; relative resource paths resolve against the working directory.
    pub fn load_str(&self, json: &str) -> ConfigResult<Skin> {
        let settings = SkinSettings::from_json(json)?;
        self.compile(&settings, Path::new("."))
    }

    pub fn compile(&self, settings: &SkinSettings, base: &Path) -> ConfigResult<Skin> {
        let resources = match (&self.resources, &settings.resources) {
            (Some(dir), _) => dir.clone(),
            (None, Some(dir)) => base.join(dir),
            (None, None) => base.join("resources"),
        };

        let mut keywords = KeywordTables::new();
        for (token, source) in &settings.keywords {
            let kind = AttributeKind::parse(token)
                .ok_or_else(|| ConfigError::invalid("keywords", token.as_str()))?;
            keywords.insert(kind, KeywordTable::parse(source));
        }

        let mut layer_sets = HashMap::new();
        let mut broken = HashSet::new();
        for (name, set) in &settings.layer_sets {
            match compile_overlay(set, settings.block_clones) {
                Ok(spec) => {
                    debug!(layer_set = %name, layers = spec.layers.len(), "compiled layer set");
                    layer_sets.insert(name.as_str(), Arc::new(spec));
                }
                Err(err) if self.degrade_on_error => {
                    error!(layer_set = %name, %err, "invalid layer set, using legacy logos");
                    broken.insert(name.as_str());
                }
                Err(err) => return Err(err),
            }
        }

        let mut profiles = HashMap::new();
        for (key, profile_settings) in &settings.profiles {
            let kind = ArtworkKind::from_key(key)
                .ok_or_else(|| ConfigError::invalid("profiles", key.as_str()))?;
            let profile = RenderProfile::from_settings(profile_settings)?;
            let overlay = match profile_settings.layer_set.as_deref() {
                None => OverlayMode::Legacy,
                Some(set) if broken.contains(set) => OverlayMode::Legacy,
                Some(set) => match layer_sets.get(set) {
                    Some(spec) => OverlayMode::Declarative(Arc::clone(spec)),
                    None => {
                        let err = ConfigError::MissingLayerSet {
                            profile: key.clone(),
                            layer_set: set.to_string(),
                        };
                        if !self.degrade_on_error {
                            return Err(err);
                        }
                        error!(profile = %key, %err, "using legacy logos");
                        OverlayMode::Legacy
                    }
                },
            };
            profiles.insert(kind, CompiledProfile { profile, overlay });
        }

        Ok(Skin {
            highdef_differentiate: settings.highdef_differentiate,
            resources,
            keywords,
            profiles,
        })
    }
}

// ============================================================================
// Compilation helpers
// ============================================================================

/// Compiles the layers and blocks of one layer set.
pub fn compile_overlay(set: &LayerSetSettings, default_clones: bool) -> ConfigResult<OverlaySpec> {
    let layers = set
        .layers
        .iter()
        .map(compile_layer)
        .collect::<ConfigResult<Vec<_>>>()?;
    let mut blocks = HashMap::new();
    for block in &set.blocks {
        let (kind, spec) = compile_block(block, default_clones)?;
        blocks.insert(kind, spec);
    }
    Ok(OverlaySpec { layers, blocks })
}

/// Splits a `/`-joined vector. Single-attribute layers never split, so a
/// value such as `16/9` stays intact.
fn slot_values(text: &str, arity: usize) -> Vec<String> {
    if arity == 1 {
        vec![text.trim().to_string()]
    } else {
        text.split('/').map(|v| v.trim().to_string()).collect()
    }
}

fn parse_align(field: &str, word: Option<&str>, default: Align) -> ConfigResult<Align> {
    match word.map(str::trim).filter(|w| !w.is_empty()) {
        None => Ok(default),
        Some(w) => Align::parse(w).ok_or_else(|| ConfigError::invalid(field, w)),
    }
}

fn parse_valign(field: &str, word: Option<&str>, default: VAlign) -> ConfigResult<VAlign> {
    match word.map(str::trim).filter(|w| !w.is_empty()) {
        None => Ok(default),
        Some(w) => VAlign::parse(w).ok_or_else(|| ConfigError::invalid(field, w)),
    }
}

fn parse_extent(field: &str, word: Option<&str>, default: Extent) -> ConfigResult<Extent> {
    match word.map(str::trim).filter(|w| !w.is_empty()) {
        None => Ok(default),
        Some(w) => Extent::parse(w).ok_or_else(|| ConfigError::invalid(field, w)),
    }
}

fn parse_offset(field: &str, word: Option<&str>, default: i32) -> ConfigResult<i32> {
    match word.map(str::trim).filter(|w| !w.is_empty()) {
        None => Ok(default),
        Some(w) => w.parse().map_err(|_| ConfigError::invalid(field, w)),
    }
}

pub fn compile_layer(layer: &LayerSettings) -> ConfigResult<LayerSpec> {
    let label = layer.name.trim();
    if label.is_empty() {
        return Err(ConfigError::EmptyLayerName);
    }
    let names: Vec<AttributeName> = label.split('/').map(AttributeName::parse).collect();
    if names.iter().any(|n| n.token.is_empty()) {
        return Err(ConfigError::EmptyLayerName);
    }
    let arity = names.len();

    let width = layer.width.as_ref().map(Scalar::text);
    let height = layer.height.as_ref().map(Scalar::text);
    let position = PositionSpec {
        left: layer.left,
        top: layer.top,
        align: parse_align("layer.align", layer.align.as_deref(), Align::Left)?,
        valign: parse_valign("layer.valign", layer.valign.as_deref(), VAlign::Top)?,
        width: parse_extent("layer.width", width.as_deref(), Extent::Equal)?,
        height: parse_extent("layer.height", height.as_deref(), Extent::Equal)?,
    };

    let mut images = Vec::with_capacity(layer.images.len());
    for image in &layer.images {
        images.push(compile_image(label, &names, image)?);
    }

    let mut positions = Vec::with_capacity(layer.positions.len());
    for condition in &layer.positions {
        positions.push(compile_condition(label, arity, &position, condition)?);
    }

    Ok(LayerSpec {
        names,
        before: !layer.after,
        position,
        images,
        positions,
    })
}

fn compile_image(
    label: &str,
    names: &[AttributeName],
    image: &ImageSettings,
) -> ConfigResult<ImageRule> {
    let slot = match image.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        None => 0,
        Some(name) => {
            let wanted = AttributeName::parse(name);
            names
                .iter()
                .position(|n| match (n.kind, wanted.kind) {
                    (Some(a), Some(b)) => a == b,
                    _ => n.token.eq_ignore_ascii_case(&wanted.token),
                })
                .ok_or_else(|| ConfigError::UnknownRuleAttribute {
                    layer: label.to_string(),
                    name: name.to_string(),
                })?
        }
    };

    let value = image.value.as_ref().map(Scalar::text).unwrap_or_default();
    if value.is_empty() {
        return Err(ConfigError::invalid(format!("layer `{label}` image value"), value));
    }
    let filename = image.filename.trim();
    if filename.is_empty() {
        return Err(ConfigError::invalid(
            format!("layer `{label}` image filename"),
            filename,
        ));
    }

    let mut values = slot_values(&value, names.len());
    let values = if values.len() > 1 {
        if values.len() != names.len() {
            return Err(ConfigError::arity(label, "image rule", names.len(), values.len()));
        }
        for v in values.iter_mut().filter(|v| v.is_empty()) {
            *v = UNKNOWN.to_string();
        }
        RuleValues::Joint(values)
    } else {
        RuleValues::Single(values.remove(0))
    };

    Ok(ImageRule {
        slot,
        values,
        filename: filename.to_string(),
    })
}

fn compile_condition(
    label: &str,
    arity: usize,
    default: &PositionSpec,
    condition: &PositionSettings,
) -> ConfigResult<ConditionalPosition> {
    let mut values = slot_values(&condition.value, arity);
    if values.len() != arity {
        return Err(ConfigError::arity(label, "position condition", arity, values.len()));
    }
    for v in values.iter_mut().filter(|v| v.is_empty()) {
        *v = UNKNOWN.to_string();
    }

    let split = |field: &'static str, text: Option<String>| -> ConfigResult<Vec<String>> {
        let parts = text.map(|t| slot_values(&t, arity)).unwrap_or_default();
        if parts.len() > arity {
            return Err(ConfigError::arity(label, field, arity, parts.len()));
        }
        Ok(parts)
    };
    let lefts = split("position left", condition.left.as_ref().map(Scalar::text))?;
    let tops = split("position top", condition.top.as_ref().map(Scalar::text))?;
    let aligns = split("position align", condition.align.clone())?;
    let valigns = split("position valign", condition.valign.clone())?;
    let widths = split("position width", condition.width.as_ref().map(Scalar::text))?;
    let heights = split("position height", condition.height.as_ref().map(Scalar::text))?;

    let positions = (0..arity)
        .map(|i| {
            Ok(PositionSpec {
                left: parse_offset("position.left", at(&lefts, i), default.left)?,
                top: parse_offset("position.top", at(&tops, i), default.top)?,
                align: parse_align("position.align", at(&aligns, i), default.align)?,
                valign: parse_valign("position.valign", at(&valigns, i), default.valign)?,
                width: parse_extent("position.width", at(&widths, i), default.width)?,
                height: parse_extent("position.height", at(&heights, i), default.height)?,
            })
        })
        .collect::<ConfigResult<Vec<_>>>()?;

    Ok(ConditionalPosition { values, positions })
}

fn at(parts: &[String], i: usize) -> Option<&str> {
    parts.get(i).map(String::as_str)
}

fn parse_count(field: &str, value: Option<&Scalar>) -> ConfigResult<u32> {
    match value {
        None => Ok(0),
        Some(Scalar::Int(n)) => u32::try_from(*n).map_err(|_| ConfigError::invalid(field, n.to_string())),
        Some(Scalar::Text(t)) if t.trim().is_empty() || t.trim().eq_ignore_ascii_case("auto") => Ok(0),
        Some(Scalar::Text(t)) => t.trim().parse().map_err(|_| ConfigError::invalid(field, t.as_str())),
    }
}

pub fn compile_block(
    block: &BlockSettings,
    default_clones: bool,
) -> ConfigResult<(AttributeKind, BlockSpec)> {
    let kind = AttributeKind::parse(&block.name)
        .ok_or_else(|| ConfigError::invalid("block.name", block.name.as_str()))?;

    let direction = match block.dir.as_deref().map(str::trim) {
        None | Some("") => Direction::RowMajor,
        Some(d) if d.eq_ignore_ascii_case("horizontal") => Direction::RowMajor,
        Some(d) if d.eq_ignore_ascii_case("vertical") => Direction::ColumnMajor,
        Some(d) => return Err(ConfigError::invalid("block.dir", d)),
    };
    let sizing = match block.size.as_deref().map(str::trim) {
        None | Some("") => Sizing::Auto,
        Some(s) if s.eq_ignore_ascii_case("auto") => Sizing::Auto,
        Some(s) if s.eq_ignore_ascii_case("static") => Sizing::Static,
        Some(s) => return Err(ConfigError::invalid("block.size", s)),
    };

    Ok((
        kind,
        BlockSpec {
            direction,
            sizing,
            cols: parse_count("block.cols", block.cols.as_ref())?,
            rows: parse_count("block.rows", block.rows.as_ref())?,
            hmargin: block.hmargin,
            vmargin: block.vmargin,
            clones: block.clones.unwrap_or(default_clones),
        },
    ))
}

// ============================================================================
// Tests
// ============================================================================
