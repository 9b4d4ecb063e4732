//! Per-artwork-kind render settings.
//!
//! [`ProfileSettings`] is the serializable form found in a skin document.
//! It is compiled once into a [`RenderProfile`], whose values are already
//! validated (colours parsed, display modes checked against their attribute)
//! and which every compositor stage reads.
//!
//! # Example
//!
//! ```
//! use marquee_renderer::{ProfileSettings, RenderProfile};
//!
//! let settings = ProfileSettings::from_json(r#"{
//!     "width": 200,
//!     "height": 300,
//!     "roundCorners": true,
//!     "attributes": { "HD": true, "audiocodec": "block" }
//! }"#).unwrap();
//!
//! let profile = RenderProfile::from_settings(&settings).unwrap();
//! assert_eq!(profile.width, 200);
//! ```

use std::collections::BTreeMap;
use std::str::FromStr;

use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::attribute::{AttributeKind, DisplayMode, DisplayModes};
use crate::error::{ConfigError, ConfigResult};
use crate::position::Align;

// ============================================================================
// Enumerations
// ============================================================================

/// Side that stays full height in the perspective effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum PerspectiveDirection {
    Left,
    #[default]
    Right,
}

impl FromStr for PerspectiveDirection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(ConfigError::invalid("perspectiveDirection", other)),
        }
    }
}

/// Attribute that picks the watermark overlay file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum OverlaySource {
    #[serde(alias = "source")]
    VideoSource,
    Certification,
    Container,
    #[default]
    Default,
}

// ============================================================================
// Settings (Serializable)
// ============================================================================

/// Border frame settings. Colours are `r/g/b` triples or colour names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct FrameSettings {
    pub enabled: bool,
    pub size: u32,
    pub color_sd: String,
    pub color_hd: String,
    pub color_720: String,
    pub color_1080: String,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            size: 5,
            color_sd: "255/255/255".into(),
            color_hd: "255/255/255".into(),
            color_720: "255/255/255".into(),
            color_1080: "255/255/255".into(),
        }
    }
}

/// Title, season and set-size text settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct TextSettings {
    pub title: bool,
    pub season: bool,
    pub set_size: bool,
    pub alignment: Align,
    pub font: String,
    pub font_size: u32,
    pub font_color: String,
    pub font_shadow: String,
    pub offset: i32,
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            title: false,
            season: false,
            set_size: false,
            alignment: Align::Left,
            font: "Helvetica".into(),
            font_size: 36,
            font_color: "LIGHT_GRAY".into(),
            font_shadow: "DARK_GRAY".into(),
            offset: 10,
        }
    }
}

/// Full-canvas watermark overlay settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct WatermarkSettings {
    pub enabled: bool,
    pub source: OverlaySource,
    pub offset_x: i32,
    pub offset_y: i32,
}

/// Reflection settings, all in percent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct ReflectionSettings {
    pub enabled: bool,
    pub height: f32,
    pub start: f32,
    pub end: f32,
    pub opacity_start: f32,
    pub opacity_end: f32,
}

impl Default for ReflectionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            height: 12.5,
            start: 0.0,
            end: 100.0,
            opacity_start: 30.0,
            opacity_end: 100.0,
        }
    }
}

/// Perspective settings; skews are percentages of the image height.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct PerspectiveSettings {
    pub enabled: bool,
    pub top: f32,
    pub bottom: f32,
    pub direction: PerspectiveDirection,
}

impl Default for PerspectiveSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            top: 3.0,
            bottom: 3.0,
            direction: PerspectiveDirection::Right,
        }
    }
}

/// Serializable settings of one artwork kind.
///
/// # JSON Format
///
/// ```json
/// {
///   "width": 400,
///   "height": 600,
///   "normalize": false,
///   "stretch": false,
///   "roundCorners": true,
///   "cornerRadius": 25,
///   "cornerQuality": 0,
///   "frame": { "enabled": false, "size": 5, "colorSd": "255/255/255" },
///   "text": { "title": true, "season": true },
///   "overlay": { "enabled": true, "source": "videosource" },
///   "reflection": { "enabled": true },
///   "perspective": { "enabled": true, "direction": "left" },
///   "attributes": { "HD": true, "TV": true, "rating": "real" },
///   "layerSet": "default"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileSettings {
    pub width: u32,
    pub height: u32,
    pub normalize: bool,
    pub stretch: bool,
    pub round_corners: bool,
    pub corner_radius: u32,
    pub corner_quality: u32,
    pub frame: FrameSettings,
    pub text: TextSettings,
    pub overlay: WatermarkSettings,
    pub reflection: ReflectionSettings,
    pub perspective: PerspectiveSettings,
    /// Display mode per attribute token (aliases allowed).
    pub attributes: BTreeMap<String, DisplayMode>,
    /// Name of the layer set that enables declarative layers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer_set: Option<String>,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            width: 400,
            height: 600,
            normalize: false,
            stretch: false,
            round_corners: false,
            corner_radius: 25,
            corner_quality: 0,
            frame: FrameSettings::default(),
            text: TextSettings::default(),
            overlay: WatermarkSettings::default(),
            reflection: ReflectionSettings::default(),
            perspective: PerspectiveSettings::default(),
            attributes: BTreeMap::new(),
            layer_set: None,
        }
    }
}

impl ProfileSettings {
    /// Serializes the settings to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes settings from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ============================================================================
// RenderProfile
// ============================================================================

/// How the base image is brought to the target size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleMode {
    /// Scale to the target width, keep the aspect ratio, bottom-align.
    #[default]
    Fit,
    /// Cover the target and crop the overflow around the center.
    Normalize,
    /// Resize to the exact target size.
    Stretch,
}

/// Highest accepted `cornerQuality`, an 11x supersampled canvas.
pub const MAX_CORNER_QUALITY: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundCorners {
    /// Corner arc size in pixels, as a diameter.
    pub radius: u32,
    pub quality: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub size: u32,
    pub color_sd: Srgb<u8>,
    pub color_hd: Srgb<u8>,
    pub color_720: Srgb<u8>,
    pub color_1080: Srgb<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BannerText {
    pub title: bool,
    pub season: bool,
    pub set_size: bool,
    pub align: Align,
    pub font: String,
    pub font_size: u32,
    pub color: Srgb<u8>,
    pub shadow: Srgb<u8>,
    pub offset: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watermark {
    pub source: OverlaySource,
    pub offset_x: i32,
    pub offset_y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reflection {
    pub height: f32,
    pub start: f32,
    pub end: f32,
    pub opacity_start: f32,
    pub opacity_end: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perspective {
    pub top: f32,
    pub bottom: f32,
    pub direction: PerspectiveDirection,
}

/// Validated settings governing one render call.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderProfile {
    pub width: u32,
    pub height: u32,
    pub scale: ScaleMode,
    pub corners: Option<RoundCorners>,
    pub frame: Option<Frame>,
    pub text: BannerText,
    pub watermark: Option<Watermark>,
    pub reflection: Option<Reflection>,
    pub perspective: Option<Perspective>,
    pub modes: DisplayModes,
}

impl Default for RenderProfile {
    fn default() -> Self {
        // The defaults contain only valid literals.
        Self::from_settings(&ProfileSettings::default()).unwrap_or_else(|_| Self::plain(400, 600))
    }
}

impl RenderProfile {
    /// A profile with every optional stage off.
    pub fn plain(width: u32, height: u32) -> Self {
        let white = Srgb::new(255, 255, 255);
        Self {
            width,
            height,
            scale: ScaleMode::Fit,
            corners: None,
            frame: None,
            text: BannerText {
                title: false,
                season: false,
                set_size: false,
                align: Align::Left,
                font: "Helvetica".into(),
                font_size: 36,
                color: white,
                shadow: Srgb::new(0, 0, 0),
                offset: 10,
            },
            watermark: None,
            reflection: None,
            perspective: None,
            modes: DisplayModes::new(),
        }
    }

    /// Enables an attribute in the given display mode.
    pub fn with_mode(mut self, kind: AttributeKind, mode: DisplayMode) -> Self {
        self.modes.set(kind, mode);
        self
    }

    pub fn mode(&self, kind: AttributeKind) -> DisplayMode {
        self.modes.get(kind)
    }

    /// Supersampling factor used while rounding corners, `quality / 10 + 1`.
    pub fn corner_factor(&self) -> f32 {
        self.corners
            .map_or(1.0, |c| c.quality.min(MAX_CORNER_QUALITY) as f32 / 10.0 + 1.0)
    }

    /// Compiles and validates serializable settings.
    pub fn from_settings(settings: &ProfileSettings) -> ConfigResult<Self> {
        if settings.width == 0 || settings.height == 0 {
            return Err(ConfigError::invalid(
                "width/height",
                format!("{}x{}", settings.width, settings.height),
            ));
        }

        let scale = if settings.normalize {
            ScaleMode::Normalize
        } else if settings.stretch {
            ScaleMode::Stretch
        } else {
            ScaleMode::Fit
        };

        if settings.corner_quality > MAX_CORNER_QUALITY {
            return Err(ConfigError::invalid(
                "cornerQuality",
                settings.corner_quality.to_string(),
            ));
        }
        let corners = settings.round_corners.then_some(RoundCorners {
            radius: settings.corner_radius,
            quality: settings.corner_quality,
        });

        let frame = if settings.frame.enabled {
            let f = &settings.frame;
            Some(Frame {
                size: f.size,
                color_sd: parse_color("frame.colorSd", &f.color_sd)?,
                color_hd: parse_color("frame.colorHd", &f.color_hd)?,
                color_720: parse_color("frame.color720", &f.color_720)?,
                color_1080: parse_color("frame.color1080", &f.color_1080)?,
            })
        } else {
            None
        };

        let t = &settings.text;
        let text = BannerText {
            title: t.title,
            season: t.season,
            set_size: t.set_size,
            align: t.alignment,
            font: t.font.clone(),
            font_size: t.font_size,
            color: parse_color("text.fontColor", &t.font_color)?,
            shadow: parse_color("text.fontShadow", &t.font_shadow)?,
            offset: t.offset,
        };

        let watermark = settings.overlay.enabled.then_some(Watermark {
            source: settings.overlay.source,
            offset_x: settings.overlay.offset_x,
            offset_y: settings.overlay.offset_y,
        });

        let r = &settings.reflection;
        let reflection = r.enabled.then_some(Reflection {
            height: r.height,
            start: r.start,
            end: r.end,
            opacity_start: r.opacity_start,
            opacity_end: r.opacity_end,
        });

        let p = &settings.perspective;
        let perspective = p.enabled.then_some(Perspective {
            top: p.top,
            bottom: p.bottom,
            direction: p.direction,
        });

        let mut modes = DisplayModes::new();
        for (token, mode) in &settings.attributes {
            let kind = AttributeKind::parse(token)
                .ok_or_else(|| ConfigError::invalid("attributes", token.as_str()))?;
            if !kind.supports(*mode) {
                return Err(ConfigError::invalid(
                    format!("attributes.{token}"),
                    format!("{mode:?}").to_lowercase(),
                ));
            }
            modes.set(kind, *mode);
        }

        Ok(Self {
            width: settings.width,
            height: settings.height,
            scale,
            corners,
            frame,
            text,
            watermark,
            reflection,
            perspective,
            modes,
        })
    }
}

/// Parses `r/g/b` or a colour name such as `LIGHT_GRAY` or `gold`.
pub fn parse_color(field: &str, value: &str) -> ConfigResult<Srgb<u8>> {
    let invalid = || ConfigError::invalid(field, value);
    if value.contains('/') {
        let channels: Vec<u8> = value
            .split('/')
            .map(|c| c.trim().parse::<u8>())
            .collect::<Result<_, _>>()
            .map_err(|_| invalid())?;
        return match channels.as_slice() {
            [r, g, b] => Ok(Srgb::new(*r, *g, *b)),
            _ => Err(invalid()),
        };
    }
    let name: String = value
        .trim()
        .chars()
        .filter(|c| *c != '_' && *c != ' ')
        .collect::<String>()
        .to_lowercase();
    palette::named::from_str(&name).ok_or_else(invalid)
}

// ============================================================================
// Tests
// ============================================================================
