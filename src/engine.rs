//! Rendering façade over a swappable skin snapshot.

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use image::{ColorType, DynamicImage, RgbaImage};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::artwork::ArtworkTarget;
use crate::error::{BatchError, ConfigResult};
use crate::layer::{Compositor, PerspectiveOverride, RenderContext};
use crate::media::MediaMetadataView;
use crate::profile::PerspectiveDirection;
use crate::skin::{Skin, SkinLoader};

/// One entry of a [`ArtworkEngine::render_batch`] call.
#[derive(Clone, Copy)]
pub struct RenderJob<'a> {
    pub media: &'a (dyn MediaMetadataView + Sync),
    pub target: ArtworkTarget,
    pub base: &'a DynamicImage,
    pub perspective: Option<PerspectiveDirection>,
}

/// Decorates artwork with the current skin.
///
/// Each render takes the skin snapshot current at its start and keeps it to
/// the end, so [`reload`](Self::reload) never affects a render in flight.
pub struct ArtworkEngine {
    skin: ArcSwap<Skin>,
    compositor: Compositor,
}

impl ArtworkEngine {
    pub fn new(skin: Skin) -> Self {
        Self {
            skin: ArcSwap::from_pointee(skin),
            compositor: Compositor,
        }
    }

    /// Loads the skin document at `path`.
    pub fn from_file(loader: &SkinLoader, path: impl AsRef<Path>) -> ConfigResult<Self> {
        Ok(Self::new(loader.load_file(path)?))
    }

    /// The skin renders started from now on will use.
    pub fn snapshot(&self) -> Arc<Skin> {
        self.skin.load_full()
    }

    pub fn reload(&self, skin: Skin) {
        self.skin.store(Arc::new(skin));
        info!("skin reloaded");
    }

    /// Reloads from a skin document. The current skin stays active when the
    /// document is invalid.
    pub fn reload_file(&self, loader: &SkinLoader, path: impl AsRef<Path>) -> ConfigResult<()> {
        let skin = loader.load_file(path)?;
        self.reload(skin);
        Ok(())
    }

    /// Renders one piece of artwork.
    ///
    /// `perspective` overrides the profile's perspective direction. Without a
    /// profile for the target kind the base image is returned as is. The
    /// result has the pixel format of `base`; transparency added by the
    /// pipeline is dropped for formats without alpha.
    pub fn render(
        &self,
        media: &dyn MediaMetadataView,
        target: ArtworkTarget,
        base: &DynamicImage,
        perspective: Option<PerspectiveDirection>,
    ) -> DynamicImage {
        let skin = self.snapshot();
        let Some(compiled) = skin.profile(target.kind) else {
            warn!(artwork = %target.kind, title = media.title(), "no profile for target, image left as is");
            return base.clone();
        };

        let mut ctx = RenderContext::new(base.to_rgba8(), media, target, &skin, compiled);
        if let Some(direction) = perspective {
            ctx.set(PerspectiveOverride(direction));
        }
        self.compositor.run(&mut ctx);

        debug!(
            artwork = %target.kind,
            title = media.title(),
            width = ctx.image.width(),
            height = ctx.image.height(),
            "rendered artwork"
        );
        with_color(ctx.image, base.color())
    }

    /// Renders `jobs` on a dedicated pool of `threads` workers (rayon's
    /// default when `None`). Results keep the order of `jobs`.
    pub fn render_batch(
        &self,
        jobs: &[RenderJob<'_>],
        threads: Option<usize>,
    ) -> Result<Vec<DynamicImage>, BatchError> {
        let pool = build_thread_pool(threads)?;
        Ok(pool.install(|| {
            jobs.par_iter()
                .map(|job| self.render(job.media, job.target, job.base, job.perspective))
                .collect()
        }))
    }
}

/// Converts the RGBA8 working canvas back to `color`.
fn with_color(image: RgbaImage, color: ColorType) -> DynamicImage {
    let image = DynamicImage::ImageRgba8(image);
    match color {
        ColorType::L8 => DynamicImage::ImageLuma8(image.to_luma8()),
        ColorType::La8 => DynamicImage::ImageLumaA8(image.to_luma_alpha8()),
        ColorType::Rgb8 => DynamicImage::ImageRgb8(image.to_rgb8()),
        ColorType::L16 => DynamicImage::ImageLuma16(image.to_luma16()),
        ColorType::La16 => DynamicImage::ImageLumaA16(image.to_luma_alpha16()),
        ColorType::Rgb16 => DynamicImage::ImageRgb16(image.to_rgb16()),
        ColorType::Rgba16 => DynamicImage::ImageRgba16(image.to_rgba16()),
        ColorType::Rgb32F => DynamicImage::ImageRgb32F(image.to_rgb32f()),
        ColorType::Rgba32F => DynamicImage::ImageRgba32F(image.to_rgba32f()),
        _ => image,
    }
}

fn build_thread_pool(threads: Option<usize>) -> Result<rayon::ThreadPool, BatchError> {
    if threads == Some(0) {
        return Err(BatchError::ZeroThreads);
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    Ok(builder.build()?)
}
