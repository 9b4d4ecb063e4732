//! Compositor stages.
//!
//! The compositor runs a fixed list of stages over one canvas. Each stage
//! decides from the [`RenderContext`] whether it applies, transforms the
//! canvas, and may leave typed properties behind for later stages (the frame
//! stage tells the corner stage it ran; the scale stage tells the
//! corner-quality stage what size to restore).
//!
//! # Stage order
//!
//! ```text
//! scale ─► frame ─► round corners ─► corner quality ─► banner text
//!   ─► logos (before) ─► watermark ─► logos (after) ─► reflection ─► perspective
//! ```
//!
//! A stage whose resource is missing logs a warning and leaves the canvas as
//! it was; no stage can fail a render.

pub mod effects;
pub mod frame;
pub mod logos;
pub mod overlay;
pub mod scale;
pub mod svg;
pub mod text;

pub use effects::{PerspectiveStage, ReflectionStage};
pub use frame::{FrameStage, RoundCornersStage};
pub use logos::LogoStage;
pub use overlay::WatermarkStage;
pub use scale::{CornerQualityStage, ScaleStage};
pub use text::BannerTextStage;

use std::any::{Any, TypeId};
use std::collections::HashMap;

use image::RgbaImage;
use tracing::debug;

use crate::artwork::ArtworkTarget;
use crate::media::MediaMetadataView;
use crate::profile::{PerspectiveDirection, RenderProfile};
use crate::resources::ResourceStore;
use crate::skin::{CompiledProfile, OverlayMode, Skin};

// ============================================================================
// Render Context
// ============================================================================

/// State of one render call, handed from stage to stage.
///
/// Everything but the canvas and the property bag is borrowed read-only from
/// the skin snapshot and the caller, so concurrent renders share nothing
/// mutable.
pub struct RenderContext<'a> {
    /// The canvas being decorated.
    pub image: RgbaImage,
    pub media: &'a dyn MediaMetadataView,
    pub target: ArtworkTarget,
    pub skin: &'a Skin,
    pub profile: &'a RenderProfile,
    pub overlay: &'a OverlayMode,
    pub resources: ResourceStore,

    /// Typed property bag for inter-stage communication.
    properties: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        image: RgbaImage,
        media: &'a dyn MediaMetadataView,
        target: ArtworkTarget,
        skin: &'a Skin,
        compiled: &'a CompiledProfile,
    ) -> Self {
        Self {
            image,
            media,
            target,
            skin,
            profile: &compiled.profile,
            overlay: &compiled.overlay,
            resources: ResourceStore::new(skin.resources.clone()),
            properties: HashMap::new(),
        }
    }

    /// Sets a typed property that downstream stages can read.
    pub fn set<T: Any + Send + Sync>(&mut self, value: T) {
        self.properties.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Gets a typed property set by an upstream stage.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.properties
            .get(&TypeId::of::<T>())
            .and_then(|b| b.downcast_ref())
    }

    /// Checks if a property has been set.
    pub fn has<T: Any + Send + Sync>(&self) -> bool {
        self.properties.contains_key(&TypeId::of::<T>())
    }
}

// ============================================================================
// Common Properties
// ============================================================================

/// The canvas was enlarged by `factor` for smoother corners and must be
/// brought back to `width x height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Supersample {
    pub factor: f32,
    pub width: u32,
    pub height: u32,
}

impl Supersample {
    /// `px` on the enlarged canvas, rounded and at least one pixel.
    pub fn upscale(px: u32, factor: f32) -> u32 {
        ((px as f32 * factor).round() as u32).max(1)
    }
}

/// A border frame was drawn in this render.
#[derive(Debug, Clone, Copy)]
pub struct FrameApplied;

/// Perspective direction requested by the caller, overriding the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerspectiveOverride(pub PerspectiveDirection);

// ============================================================================
// Stage Trait
// ============================================================================

/// One step of the compositor.
///
/// [`transform`](Self::transform) changes the canvas;
/// [`emit`](Self::emit) is the place to leave properties for later stages.
pub trait Stage: Sync {
    fn name(&self) -> &'static str;

    /// Whether the stage applies to this render.
    fn is_enabled(&self, ctx: &RenderContext<'_>) -> bool;

    fn transform(&self, ctx: &mut RenderContext<'_>);

    fn emit(&self, _ctx: &mut RenderContext<'_>) {}
}

// ============================================================================
// Compositor
// ============================================================================

static STAGES: [&dyn Stage; 10] = [
    &ScaleStage,
    &FrameStage,
    &RoundCornersStage,
    &CornerQualityStage,
    &BannerTextStage,
    &LogoStage { before: true },
    &WatermarkStage,
    &LogoStage { before: false },
    &ReflectionStage,
    &PerspectiveStage,
];

/// Runs the fixed stage list over a render context.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compositor;

impl Compositor {
    pub fn stage_names(&self) -> impl Iterator<Item = &'static str> {
        STAGES.iter().map(|stage| stage.name())
    }

    pub fn run(&self, ctx: &mut RenderContext<'_>) {
        for stage in STAGES {
            if !stage.is_enabled(ctx) {
                continue;
            }
            debug!(stage = stage.name(), artwork = %ctx.target.kind, "running stage");
            stage.transform(ctx);
            stage.emit(ctx);
        }
    }
}

// ============================================================================
// Test Fixtures
// ============================================================================

#[cfg(test)]
pub(crate) mod fixture {
    use std::path::Path;

    use super::*;
    use crate::artwork::ArtworkKind;
    use crate::media::MediaInfo;

    /// Owns everything a [`RenderContext`] borrows.
    pub struct Fixture {
        pub media: MediaInfo,
        pub skin: Skin,
        pub compiled: CompiledProfile,
        pub target: ArtworkTarget,
    }

    impl Fixture {
        pub fn new(profile: RenderProfile) -> Self {
            Self {
                media: MediaInfo::new("Fixture"),
                skin: Skin::new("resources"),
                compiled: CompiledProfile {
                    profile,
                    overlay: OverlayMode::Legacy,
                },
                target: ArtworkTarget::new(ArtworkKind::Poster),
            }
        }

        pub fn resources(mut self, dir: &Path) -> Self {
            self.skin.resources = dir.to_path_buf();
            self
        }

        pub fn context(&self, image: RgbaImage) -> RenderContext<'_> {
            RenderContext::new(image, &self.media, self.target, &self.skin, &self.compiled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixture::Fixture;
    use super::*;
    use image::Rgba;

    #[test]
    fn stages_run_in_fixed_order() {
        let names: Vec<_> = Compositor.stage_names().collect();
        assert_eq!(
            names,
            [
                "scale",
                "frame",
                "round-corners",
                "corner-quality",
                "banner-text",
                "logos-before",
                "watermark",
                "logos-after",
                "reflection",
                "perspective",
            ]
        );
    }

    #[test]
    fn property_bag_round_trip() {
        let fixture = Fixture::new(RenderProfile::plain(4, 4));
        let mut ctx = fixture.context(RgbaImage::new(4, 4));
        assert!(!ctx.has::<FrameApplied>());
        ctx.set(PerspectiveOverride(PerspectiveDirection::Left));
        ctx.set(FrameApplied);
        assert!(ctx.has::<FrameApplied>());
        assert_eq!(
            ctx.get::<PerspectiveOverride>(),
            Some(&PerspectiveOverride(PerspectiveDirection::Left))
        );
    }

    #[test]
    fn plain_profile_leaves_sized_canvas_untouched() {
        let fixture = Fixture::new(RenderProfile::plain(6, 4));
        let base = RgbaImage::from_pixel(6, 4, Rgba([10, 20, 30, 255]));
        let mut ctx = fixture.context(base.clone());
        Compositor.run(&mut ctx);
        assert_eq!(ctx.image, base);
    }
}
