//! marquee-renderer: skin-driven artwork overlay compositing
//!
//! This crate decorates posters, thumbnails, banners and video images of a
//! media library with badges (resolution, codecs, languages, ratings,
//! awards, ...), frames, captions and effects. What goes where is described
//! by a JSON skin; the crate only turns `(metadata, skin, base image)` into a
//! decorated image.
//!
//! # Example
//!
//! ```
//! use image::{DynamicImage, RgbaImage};
//! use marquee_renderer::{ArtworkEngine, ArtworkKind, MediaInfo, SkinLoader};
//!
//! let skin = SkinLoader::new()
//!     .load_str(r#"{ "profiles": { "posters": { "width": 40, "height": 60 } } }"#)
//!     .unwrap();
//! let engine = ArtworkEngine::new(skin);
//!
//! let mut media = MediaInfo::new("Serenity");
//! media.hd = true;
//! let base = DynamicImage::ImageRgba8(RgbaImage::new(80, 120));
//!
//! let poster = engine.render(&media, ArtworkKind::Poster.into(), &base, None);
//! assert_eq!((poster.width(), poster.height()), (40, 60));
//! ```
//!
//! # Pipeline
//!
//! For every render the [`Compositor`] runs its stages in a fixed order over
//! the base image: scaling, frame, rounded corners, banner captions, logo
//! layers before the watermark, the watermark, logo layers after it,
//! reflection and perspective. Logo layers are either the built-in legacy
//! set or the declarative layers of the profile's layer set, matched by
//! [`select_images`] and placed with [`resolve_axis`] and [`layout_block`].

mod artwork;
mod engine;
mod error;
mod keywords;
mod media;
mod profile;
mod resources;

pub mod attribute;
pub mod block;
pub mod layer;
pub mod matcher;
pub mod position;
pub mod skin;

pub use artwork::{ArtworkKind, ArtworkTarget};
pub use attribute::{AttributeKind, AttributeName, DisplayMode, DisplayModes, UNKNOWN};
pub use block::{Placement, layout_block};
pub use engine::{ArtworkEngine, RenderJob};
pub use error::{BatchError, ConfigError, ConfigResult, ResourceError, TargetParseError};
pub use keywords::{KeywordTable, KeywordTables};
pub use layer::{Compositor, RenderContext, Stage};
pub use matcher::{ResolvedState, apply_conditional_positions, cmp_overlay_value, select_images};
pub use media::{AudioTrack, AwardEvent, MediaFile, MediaInfo, MediaMetadataView};
pub use position::{Align, Anchor, VAlign, resolve_axis};
pub use profile::{
    BannerText, Frame, FrameSettings, OverlaySource, Perspective, PerspectiveDirection,
    PerspectiveSettings, ProfileSettings, Reflection, ReflectionSettings, RenderProfile,
    RoundCorners, ScaleMode, TextSettings, Watermark, WatermarkSettings,
};
pub use resources::ResourceStore;
pub use skin::{
    BlockSpec, CompiledProfile, LayerSpec, OverlayMode, OverlaySpec, PositionSpec, Skin,
    SkinLoader, SkinSettings,
};
