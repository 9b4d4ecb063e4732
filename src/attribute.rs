//! Attribute resolution: media attribute token + media view to a value string.
//!
//! Every supported attribute is a variant of [`AttributeKind`]. Tokens are
//! parsed once at load time (aliases included) and resolution goes through
//! [`AttributeKind::resolver`], an exhaustive table of resolver functions.
//! Tokens outside the closed set never resolve to anything but [`UNKNOWN`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::artwork::{ArtworkKind, ArtworkTarget};
use crate::media::MediaMetadataView;

/// Value of an attribute whose data is absent, or whose token is unsupported.
pub const UNKNOWN: &str = "UNKNOWN";
pub const TRUE: &str = "TRUE";
pub const FALSE: &str = "FALSE";

/// Separator between the values of a multi-valued attribute.
pub const SEPARATOR: &str = " / ";

// ============================================================================
// AttributeKind
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Set,
    Tv,
    Hd,
    Subtitle,
    Language,
    Rating,
    VideoSource,
    VideoOut,
    VideoCodec,
    AudioCodec,
    AudioLang,
    AudioChannels,
    Container,
    Aspect,
    Fps,
    Certification,
    Watched,
    Episode,
    Top250,
    Keywords,
    Country,
    Company,
    Award,
}

/// Resolver function signature used by the dispatch table.
pub type Resolver = fn(&dyn MediaMetadataView, &ResolveContext) -> String;

impl AttributeKind {
    pub const ALL: [AttributeKind; 23] = [
        Self::Set,
        Self::Tv,
        Self::Hd,
        Self::Subtitle,
        Self::Language,
        Self::Rating,
        Self::VideoSource,
        Self::VideoOut,
        Self::VideoCodec,
        Self::AudioCodec,
        Self::AudioLang,
        Self::AudioChannels,
        Self::Container,
        Self::Aspect,
        Self::Fps,
        Self::Certification,
        Self::Watched,
        Self::Episode,
        Self::Top250,
        Self::Keywords,
        Self::Country,
        Self::Company,
        Self::Award,
    ];

    /// Parses an attribute token, accepting the short aliases. Case-insensitive.
    pub fn parse(token: &str) -> Option<Self> {
        let kind = match token.trim().to_ascii_lowercase().as_str() {
            "set" => Self::Set,
            "tv" => Self::Tv,
            "hd" => Self::Hd,
            "subtitle" | "st" => Self::Subtitle,
            "language" => Self::Language,
            "rating" => Self::Rating,
            "videosource" | "source" | "vs" => Self::VideoSource,
            "videoout" | "out" | "vo" => Self::VideoOut,
            "videocodec" | "vcodec" | "vc" => Self::VideoCodec,
            "audiocodec" | "acodec" | "ac" => Self::AudioCodec,
            "audiolang" | "alang" | "al" => Self::AudioLang,
            "audiochannels" | "channels" => Self::AudioChannels,
            "container" => Self::Container,
            "aspect" => Self::Aspect,
            "fps" => Self::Fps,
            "certification" => Self::Certification,
            "watched" => Self::Watched,
            "episode" => Self::Episode,
            "top250" => Self::Top250,
            "keywords" => Self::Keywords,
            "country" => Self::Country,
            "company" => Self::Company,
            "award" => Self::Award,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical token, also used as the block registry key.
    pub fn token(self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Tv => "TV",
            Self::Hd => "HD",
            Self::Subtitle => "subtitle",
            Self::Language => "language",
            Self::Rating => "rating",
            Self::VideoSource => "videosource",
            Self::VideoOut => "videoout",
            Self::VideoCodec => "videocodec",
            Self::AudioCodec => "audiocodec",
            Self::AudioLang => "audiolang",
            Self::AudioChannels => "audiochannels",
            Self::Container => "container",
            Self::Aspect => "aspect",
            Self::Fps => "fps",
            Self::Certification => "certification",
            Self::Watched => "watched",
            Self::Episode => "episode",
            Self::Top250 => "top250",
            Self::Keywords => "keywords",
            Self::Country => "country",
            Self::Company => "company",
            Self::Award => "award",
        }
    }

    /// Display modes this attribute accepts besides `Off` and `On`.
    pub fn supports(self, mode: DisplayMode) -> bool {
        match mode {
            DisplayMode::Off | DisplayMode::On => true,
            DisplayMode::Block => matches!(
                self,
                Self::Language
                    | Self::AudioCodec
                    | Self::AudioLang
                    | Self::AudioChannels
                    | Self::Watched
                    | Self::Episode
                    | Self::Country
                    | Self::Company
                    | Self::Award
            ),
            DisplayMode::Count => matches!(self, Self::Set | Self::Award),
            DisplayMode::Real => self == Self::Rating,
        }
    }

    pub fn resolver(self) -> Resolver {
        match self {
            Self::Set => resolve_set,
            Self::Tv => |m, _| flag(m.is_tv_show()),
            Self::Hd => resolve_hd,
            Self::Subtitle => resolve_subtitle,
            Self::Language => |m, _| joined(m.languages()),
            Self::Rating => resolve_rating,
            Self::VideoSource => |m, _| text(m.video_source()),
            Self::VideoOut => |m, _| text(m.video_output()),
            Self::VideoCodec => |m, _| text(m.video_codec()),
            Self::AudioCodec => resolve_audio_codec,
            Self::AudioLang => resolve_audio_lang,
            Self::AudioChannels => resolve_audio_channels,
            Self::Container => |m, _| text(m.container()),
            Self::Aspect => |m, _| text(m.aspect_ratio()),
            Self::Fps => |m, _| m.fps().map_or_else(|| UNKNOWN.to_string(), |f| format!("{f:?}")),
            Self::Certification => |m, _| text(m.certification()),
            Self::Watched => resolve_watched,
            Self::Episode => resolve_episode,
            Self::Top250 => |m, _| flag(m.top250().is_some_and(|rank| rank > 0)),
            Self::Keywords => |m, _| {
                let name = m.base_filename().trim();
                if name.is_empty() {
                    UNKNOWN.to_string()
                } else {
                    name.to_lowercase()
                }
            },
            Self::Country => |m, ctx| first_or_joined(m.countries(), ctx.mode),
            Self::Company => |m, ctx| first_or_joined(m.companies(), ctx.mode),
            Self::Award => resolve_award,
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

// ============================================================================
// AttributeName
// ============================================================================

/// An attribute token as written in the skin, with its parsed kind.
///
/// `kind` is `None` for tokens outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeName {
    pub token: String,
    pub kind: Option<AttributeKind>,
}

impl AttributeName {
    pub fn parse(token: &str) -> Self {
        Self {
            token: token.trim().to_string(),
            kind: AttributeKind::parse(token),
        }
    }

    pub fn is(&self, kind: AttributeKind) -> bool {
        self.kind == Some(kind)
    }
}

// ============================================================================
// DisplayMode
// ============================================================================

/// How an attribute is displayed: off, a single badge, a block of badges,
/// a count, or (for ratings) the unrounded value.
///
/// Deserializes from a JSON boolean or one of the words `true`, `false`,
/// `block`, `count`, `real`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "ModeRepr", into = "ModeRepr")]
pub enum DisplayMode {
    #[default]
    Off,
    On,
    Block,
    Count,
    Real,
}

impl DisplayMode {
    pub fn is_enabled(self) -> bool {
        self != Self::Off
    }

    pub fn is_block(self) -> bool {
        self == Self::Block
    }

    pub fn is_count(self) -> bool {
        self == Self::Count
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ModeRepr {
    Flag(bool),
    Word(String),
}

impl TryFrom<ModeRepr> for DisplayMode {
    type Error = String;

    fn try_from(repr: ModeRepr) -> Result<Self, Self::Error> {
        match repr {
            ModeRepr::Flag(true) => Ok(Self::On),
            ModeRepr::Flag(false) => Ok(Self::Off),
            ModeRepr::Word(word) => match word.trim().to_ascii_lowercase().as_str() {
                "true" | "on" => Ok(Self::On),
                "false" | "off" | "" => Ok(Self::Off),
                "block" => Ok(Self::Block),
                "count" => Ok(Self::Count),
                "real" => Ok(Self::Real),
                other => Err(format!("unknown display mode `{other}`")),
            },
        }
    }
}

impl From<DisplayMode> for ModeRepr {
    fn from(mode: DisplayMode) -> Self {
        match mode {
            DisplayMode::Off => ModeRepr::Flag(false),
            DisplayMode::On => ModeRepr::Flag(true),
            DisplayMode::Block => ModeRepr::Word("block".into()),
            DisplayMode::Count => ModeRepr::Word("count".into()),
            DisplayMode::Real => ModeRepr::Word("real".into()),
        }
    }
}

#[cfg(feature = "jsonschema")]
impl schemars::JsonSchema for DisplayMode {
    fn schema_name() -> String {
        "DisplayMode".into()
    }

    fn json_schema(generator: &mut schemars::r#gen::SchemaGenerator) -> schemars::schema::Schema {
        <serde_json::Value as schemars::JsonSchema>::json_schema(generator)
    }
}

/// Display mode per attribute kind, as compiled from a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayModes {
    modes: HashMap<AttributeKind, DisplayMode>,
}

impl DisplayModes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, kind: AttributeKind, mode: DisplayMode) {
        self.modes.insert(kind, mode);
    }

    pub fn with(mut self, kind: AttributeKind, mode: DisplayMode) -> Self {
        self.set(kind, mode);
        self
    }

    pub fn get(&self, kind: AttributeKind) -> DisplayMode {
        self.modes.get(&kind).copied().unwrap_or_default()
    }

    pub fn is_enabled(&self, kind: AttributeKind) -> bool {
        self.get(kind).is_enabled()
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Per-call inputs to a resolver besides the media itself.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext {
    pub target: ArtworkTarget,
    pub mode: DisplayMode,
    pub highdef_differentiate: bool,
}

/// Resolves an attribute for the given media. Disabled attributes are `UNKNOWN`.
pub fn resolve(kind: AttributeKind, media: &dyn MediaMetadataView, ctx: &ResolveContext) -> String {
    if !ctx.mode.is_enabled() {
        return UNKNOWN.to_string();
    }
    (kind.resolver())(media, ctx)
}

/// Resolves a parsed attribute name; unsupported tokens are `UNKNOWN`.
pub fn resolve_name(
    name: &AttributeName,
    media: &dyn MediaMetadataView,
    ctx: &ResolveContext,
) -> String {
    match name.kind {
        Some(kind) => resolve(kind, media, ctx),
        None => UNKNOWN.to_string(),
    }
}

/// Returns true when a resolved value carries information.
pub fn is_known(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !value.eq_ignore_ascii_case(UNKNOWN)
}

fn flag(value: bool) -> String {
    let word = if value { TRUE } else { FALSE };
    word.to_string()
}

fn text(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

fn joined(values: &[String]) -> String {
    let parts: Vec<&str> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect();
    if parts.is_empty() {
        UNKNOWN.to_string()
    } else {
        parts.join(SEPARATOR)
    }
}

fn first_or_joined(values: &[String], mode: DisplayMode) -> String {
    if mode.is_block() {
        joined(values)
    } else {
        text(values.first().map(String::as_str))
    }
}

/// Drops every ` (...)` group from a codec description.
fn strip_parenthesized(value: &str) -> String {
    let mut out = value.to_string();
    while let Some(open) = out.find(" (") {
        let Some(close) = out[open..].find(')') else {
            break;
        };
        out.replace_range(open..open + close + 1, "");
    }
    out.trim().to_string()
}

fn resolve_set(media: &dyn MediaMetadataView, ctx: &ResolveContext) -> String {
    let set_class = ctx.target.footer
        || matches!(ctx.target.kind, ArtworkKind::Thumbnail | ArtworkKind::Banner);
    let count = ctx.mode.is_count();
    match (set_class && media.is_set_master(), count) {
        (true, true) => media.set_size().to_string(),
        (true, false) => TRUE.to_string(),
        (false, true) => "0".to_string(),
        (false, false) => FALSE.to_string(),
    }
}

fn resolve_hd(media: &dyn MediaMetadataView, ctx: &ResolveContext) -> String {
    let value = match (media.is_hd(), ctx.highdef_differentiate, media.is_hd1080()) {
        (false, _, _) => FALSE,
        (true, false, _) => "hd",
        (true, true, true) => "hd1080",
        (true, true, false) => "hd720",
    };
    value.to_string()
}

fn resolve_subtitle(media: &dyn MediaMetadataView, _ctx: &ResolveContext) -> String {
    let subtitles: Vec<&str> = media
        .subtitles()
        .iter()
        .map(|s| s.trim())
        .filter(|s| is_known(s))
        .collect();
    let none = subtitles.is_empty() || (subtitles.len() == 1 && subtitles[0].eq_ignore_ascii_case("no"));
    flag(!none)
}

fn resolve_rating(media: &dyn MediaMetadataView, ctx: &ResolveContext) -> String {
    let tv = media.is_tv_show();
    let set = media.is_set_master();
    match media.rating() {
        Some(rating) if tv == set => {
            let rating = if ctx.mode == DisplayMode::Real {
                rating
            } else {
                rating / 10 * 10
            };
            rating.to_string()
        }
        _ => UNKNOWN.to_string(),
    }
}

fn resolve_audio_codec(media: &dyn MediaMetadataView, ctx: &ResolveContext) -> String {
    let codecs: Vec<String> = media
        .audio_tracks()
        .iter()
        .map(|t| strip_parenthesized(&t.codec))
        .filter(|c| !c.is_empty())
        .collect();
    first_or_joined(&codecs, ctx.mode)
}

fn resolve_audio_channels(media: &dyn MediaMetadataView, ctx: &ResolveContext) -> String {
    let channels: Vec<String> = media
        .audio_tracks()
        .iter()
        .filter_map(|t| t.channels.clone())
        .collect();
    first_or_joined(&channels, ctx.mode)
}

fn resolve_audio_lang(media: &dyn MediaMetadataView, ctx: &ResolveContext) -> String {
    let languages: Vec<String> = media
        .audio_tracks()
        .iter()
        .map(|t| text(t.language.as_deref()))
        .collect();
    match languages.first() {
        None => UNKNOWN.to_string(),
        Some(first) if !ctx.mode.is_block() => first.clone(),
        Some(_) => languages.join(SEPARATOR),
    }
}

fn resolve_watched(media: &dyn MediaMetadataView, ctx: &ResolveContext) -> String {
    let files = media.files();
    if ctx.target.kind == ArtworkKind::VideoImage {
        if let Some(file) = file_at(files, ctx.target.video_index) {
            return flag(file.watched);
        }
    } else if media.is_tv_show() && ctx.mode.is_block() && !files.is_empty() {
        return files
            .iter()
            .map(|f| if f.watched { TRUE } else { FALSE })
            .collect::<Vec<_>>()
            .join(SEPARATOR);
    }
    flag(media.is_watched())
}

fn resolve_episode(media: &dyn MediaMetadataView, ctx: &ResolveContext) -> String {
    if !media.is_tv_show() {
        return UNKNOWN.to_string();
    }
    let files = media.files();
    if ctx.target.kind == ArtworkKind::VideoImage {
        return match file_at(files, ctx.target.video_index) {
            Some(file) if ctx.mode.is_block() => parts(std::slice::from_ref(file)),
            Some(file) => file.first_part.to_string(),
            None => UNKNOWN.to_string(),
        };
    }
    if ctx.mode.is_block() {
        parts(files)
    } else {
        files.len().to_string()
    }
}

fn file_at(files: &[crate::media::MediaFile], index: usize) -> Option<&crate::media::MediaFile> {
    files.get(index.min(files.len().saturating_sub(1)))
}

fn parts(files: &[crate::media::MediaFile]) -> String {
    let parts: Vec<String> = files
        .iter()
        .flat_map(|f| f.first_part..=f.last_part)
        .map(|p| p.to_string())
        .collect();
    if parts.is_empty() {
        UNKNOWN.to_string()
    } else {
        parts.join(SEPARATOR)
    }
}

fn resolve_award(media: &dyn MediaMetadataView, ctx: &ResolveContext) -> String {
    let winning = || {
        media
            .awards()
            .iter()
            .filter(|event| !event.wins.is_empty() && !media.is_set_master())
    };

    match ctx.mode {
        DisplayMode::Count => winning().count().to_string(),
        DisplayMode::Block => {
            // Name -> win count, in first-seen order.
            let mut tally: Vec<(&str, usize)> = Vec::new();
            for name in winning().flat_map(|event| event.wins.iter()) {
                match tally.iter_mut().find(|(n, _)| *n == name.as_str()) {
                    Some((_, wins)) => *wins += 1,
                    None => tally.push((name.as_str(), 1)),
                }
            }
            if tally.is_empty() {
                return UNKNOWN.to_string();
            }
            tally.sort_by(|a, b| b.1.cmp(&a.1));
            tally
                .into_iter()
                .map(|(name, _)| name)
                .collect::<Vec<_>>()
                .join(SEPARATOR)
        }
        _ => flag(winning().next().is_some()),
    }
}
