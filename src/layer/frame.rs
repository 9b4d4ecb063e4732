//! Border frame and rounded corners.
//!
//! Both are drawn through a tiny-skia mask shaped like the (possibly
//! rounded) canvas rectangle. Sizes are multiplied by the supersampling
//! factor left by the scale stage.

use image::RgbaImage;
use palette::Srgb;
use resvg::tiny_skia::{
    FillRule, Mask, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform,
};

use super::svg::{pixmap_to_rgba_image, resize_exact, rgba_to_pixmap};
use super::{FrameApplied, RenderContext, Stage, Supersample};
use crate::media::MediaMetadataView;
use crate::profile::Frame;

/// Cubic Bezier handle length for a quarter circle.
const KAPPA: f32 = 0.552_284_8;

fn supersample(ctx: &RenderContext<'_>) -> f32 {
    ctx.get::<Supersample>().map_or(1.0, |s| s.factor)
}

fn scaled(px: u32, factor: f32) -> u32 {
    if px == 0 {
        0
    } else {
        Supersample::upscale(px, factor)
    }
}

// ============================================================================
// FrameStage
// ============================================================================

/// Draws a border whose colour depends on the media's resolution.
pub struct FrameStage;

impl Stage for FrameStage {
    fn name(&self) -> &'static str {
        "frame"
    }

    fn is_enabled(&self, ctx: &RenderContext<'_>) -> bool {
        ctx.profile.frame.is_some()
    }

    fn transform(&self, ctx: &mut RenderContext<'_>) {
        let Some(frame) = ctx.profile.frame else {
            return;
        };
        let factor = supersample(ctx);
        let color = frame_color(&frame, ctx.media, ctx.skin.highdef_differentiate);
        let radius = scaled(ctx.profile.corners.map_or(0, |c| c.radius), factor);

        if let Some(framed) = draw_frame(&ctx.image, color, scaled(frame.size, factor), radius) {
            ctx.image = framed;
        }
    }

    fn emit(&self, ctx: &mut RenderContext<'_>) {
        ctx.set(FrameApplied);
    }
}

/// Picks one of the SD, HD, 720p or 1080p frame colours.
pub fn frame_color(frame: &Frame, media: &dyn MediaMetadataView, highdef_differentiate: bool) -> Srgb<u8> {
    if !media.is_hd() {
        frame.color_sd
    } else if !highdef_differentiate {
        frame.color_hd
    } else if media.is_hd1080() {
        frame.color_1080
    } else {
        frame.color_720
    }
}

/// Shrinks the image into the frame and strokes a `band` pixel border
/// inside the canvas outline.
pub fn draw_frame(image: &RgbaImage, color: Srgb<u8>, band: u32, radius: u32) -> Option<RgbaImage> {
    let (w, h) = image.dimensions();
    let path = outline(w, h, radius)?;
    let mask = outline_mask(&path, w, h)?;
    let mut canvas = Pixmap::new(w, h)?;

    let inner_w = (w + 2).saturating_sub(2 * band);
    let inner_h = (h + 2).saturating_sub(2 * band);
    if inner_w > 0 && inner_h > 0 {
        let inner = rgba_to_pixmap(&resize_exact(image.clone(), inner_w, inner_h))?;
        let offset = band as i32 - 1;
        canvas.draw_pixmap(
            offset,
            offset,
            inner.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            Some(&mask),
        );
    }

    if band > 0 {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.red, color.green, color.blue, 255);
        paint.anti_alias = true;
        let stroke = Stroke {
            width: (2 * band) as f32,
            ..Stroke::default()
        };
        canvas.stroke_path(&path, &paint, &stroke, Transform::identity(), Some(&mask));
    }

    Some(pixmap_to_rgba_image(&canvas))
}

// ============================================================================
// RoundCornersStage
// ============================================================================

/// Clears the corners outside a rounded rectangle. Skipped when a frame was
/// drawn, since the frame already follows the rounded outline.
pub struct RoundCornersStage;

impl Stage for RoundCornersStage {
    fn name(&self) -> &'static str {
        "round-corners"
    }

    fn is_enabled(&self, ctx: &RenderContext<'_>) -> bool {
        ctx.profile.corners.is_some() && !ctx.has::<FrameApplied>()
    }

    fn transform(&self, ctx: &mut RenderContext<'_>) {
        let Some(corners) = ctx.profile.corners else {
            return;
        };
        let radius = scaled(corners.radius, supersample(ctx));
        if let Some(rounded) = round_corners(&ctx.image, radius) {
            ctx.image = rounded;
        }
    }
}

/// Masks the image with a rounded rectangle; `radius` is the arc diameter.
pub fn round_corners(image: &RgbaImage, radius: u32) -> Option<RgbaImage> {
    let (w, h) = image.dimensions();
    let path = outline(w, h, radius)?;
    let mask = outline_mask(&path, w, h)?;
    let src = rgba_to_pixmap(image)?;
    let mut canvas = Pixmap::new(w, h)?;
    canvas.draw_pixmap(
        0,
        0,
        src.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        Some(&mask),
    );
    Some(pixmap_to_rgba_image(&canvas))
}

// ============================================================================
// Geometry
// ============================================================================

/// Canvas outline, with corner arcs of diameter `radius` when non-zero.
fn outline(width: u32, height: u32, radius: u32) -> Option<Path> {
    let (w, h) = (width as f32, height as f32);
    if radius == 0 {
        return Some(PathBuilder::from_rect(Rect::from_xywh(0.0, 0.0, w, h)?));
    }

    let r = (radius as f32 / 2.0).min(w / 2.0).min(h / 2.0);
    let k = KAPPA * r;
    let mut pb = PathBuilder::new();
    pb.move_to(r, 0.0);
    pb.line_to(w - r, 0.0);
    pb.cubic_to(w - r + k, 0.0, w, r - k, w, r);
    pb.line_to(w, h - r);
    pb.cubic_to(w, h - r + k, w - r + k, h, w - r, h);
    pb.line_to(r, h);
    pb.cubic_to(r - k, h, 0.0, h - r + k, 0.0, h - r);
    pb.line_to(0.0, r);
    pb.cubic_to(0.0, r - k, r - k, 0.0, r, 0.0);
    pb.close();
    pb.finish()
}

fn outline_mask(path: &Path, width: u32, height: u32) -> Option<Mask> {
    let mut mask = Mask::new(width, height)?;
    mask.fill_path(path, FillRule::Winding, true, Transform::identity());
    Some(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::fixture::Fixture;
    use crate::media::MediaInfo;
    use crate::profile::{RenderProfile, RoundCorners};
    use image::Rgba;

    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn frame() -> Frame {
        Frame {
            size: 4,
            color_sd: Srgb::new(1, 1, 1),
            color_hd: Srgb::new(2, 2, 2),
            color_720: Srgb::new(3, 3, 3),
            color_1080: Srgb::new(4, 4, 4),
        }
    }

    #[test]
    fn frame_colour_follows_resolution() {
        let f = frame();
        let mut media = MediaInfo::new("m");
        assert_eq!(frame_color(&f, &media, true), f.color_sd);

        media.hd = true;
        assert_eq!(frame_color(&f, &media, false), f.color_hd);
        assert_eq!(frame_color(&f, &media, true), f.color_720);

        media.hd1080 = true;
        assert_eq!(frame_color(&f, &media, true), f.color_1080);
    }

    #[test]
    fn frame_band_surrounds_image() {
        let img = RgbaImage::from_pixel(40, 40, BLUE);
        let out = draw_frame(&img, Srgb::new(255, 0, 0), 4, 0).unwrap();
        assert_eq!(out.dimensions(), (40, 40));
        assert_eq!(out.get_pixel(1, 20).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(20, 38).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(20, 20).0, BLUE.0);
    }

    #[test]
    fn rounded_corners_clear_the_corner() {
        let img = RgbaImage::from_pixel(40, 40, BLUE);
        let out = round_corners(&img, 20).unwrap();
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(39, 39)[3], 0);
        assert_eq!(out.get_pixel(20, 20).0, BLUE.0);
        assert_eq!(out.get_pixel(20, 0).0, BLUE.0);
    }

    #[test]
    fn frame_disables_corner_rounding() {
        let mut profile = RenderProfile::plain(40, 40);
        profile.frame = Some(frame());
        profile.corners = Some(RoundCorners { radius: 10, quality: 0 });
        let fixture = Fixture::new(profile);
        let mut ctx = fixture.context(RgbaImage::from_pixel(40, 40, BLUE));

        assert!(RoundCornersStage.is_enabled(&ctx));
        FrameStage.transform(&mut ctx);
        FrameStage.emit(&mut ctx);
        assert!(!RoundCornersStage.is_enabled(&ctx));
        assert_eq!(ctx.image.get_pixel(0, 0)[3], 0);
    }
}
