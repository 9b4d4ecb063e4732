//! Full-canvas watermark overlay (box covers, disc frames and the like).

use image::RgbaImage;
use image::imageops;
use tracing::debug;

use super::svg::composite_over;
use super::{RenderContext, Stage};
use crate::attribute;
use crate::media::MediaMetadataView;
use crate::profile::OverlaySource;

/// Places the canvas inside a `{source}_overlay_{kind}.png` watermark.
///
/// The result takes the watermark's size: the current canvas is copied at
/// the configured offset and the watermark is blended on top. When no file
/// exists for the discriminator value, `default_overlay_{kind}.png` is used.
pub struct WatermarkStage;

impl Stage for WatermarkStage {
    fn name(&self) -> &'static str {
        "watermark"
    }

    fn is_enabled(&self, ctx: &RenderContext<'_>) -> bool {
        ctx.profile.watermark.is_some()
    }

    fn transform(&self, ctx: &mut RenderContext<'_>) {
        let Some(watermark) = ctx.profile.watermark else {
            return;
        };
        let kind = ctx.target.kind.key();
        let source = watermark_source(watermark.source, ctx.media);

        let mut file = format!("{source}_overlay_{kind}.png");
        if !ctx.resources.exists(&file) {
            debug!(overlay = %file, "no watermark for value, using default");
            file = format!("default_overlay_{kind}.png");
        }
        let Some(overlay) = ctx.resources.load_or_warn(&file) else {
            return;
        };

        let mut canvas = RgbaImage::new(overlay.width(), overlay.height());
        imageops::replace(
            &mut canvas,
            &ctx.image,
            watermark.offset_x as i64,
            watermark.offset_y as i64,
        );
        composite_over(&mut canvas, &overlay, 0, 0);
        ctx.image = canvas;
        debug!(overlay = %file, "drew watermark");
    }
}

/// Lower-cased discriminator value, or `default` when it is blank or unknown.
pub fn watermark_source(source: OverlaySource, media: &dyn MediaMetadataView) -> String {
    let value = match source {
        OverlaySource::VideoSource => media.video_source(),
        OverlaySource::Certification => media.certification(),
        OverlaySource::Container => media.container(),
        OverlaySource::Default => None,
    };
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| attribute::is_known(v))
        .unwrap_or_else(|| "default".to_string())
}
