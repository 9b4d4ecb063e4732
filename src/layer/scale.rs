//! Bringing the base image to the profile size.

use image::RgbaImage;
use image::imageops;

use super::svg::resize_exact;
use super::{RenderContext, Stage, Supersample};
use crate::attribute::AttributeKind;
use crate::profile::ScaleMode;

/// Scales, normalizes or stretches the base image.
///
/// An image that already fits inside the target is left alone when neither
/// an HD nor a language badge is pending (normalize then only fixes the
/// aspect ratio at the image's own height). With rounded corners the result
/// is enlarged by the corner-quality factor.
pub struct ScaleStage;

impl Stage for ScaleStage {
    fn name(&self) -> &'static str {
        "scale"
    }

    fn is_enabled(&self, _ctx: &RenderContext<'_>) -> bool {
        true
    }

    fn transform(&self, ctx: &mut RenderContext<'_>) {
        let profile = ctx.profile;
        let factor = profile.corner_factor();
        let up = |px: u32| Supersample::upscale(px, factor);
        let (width, height) = ctx.image.dimensions();
        // An image exactly at the target size also skips, so a second
        // render of a finished image leaves it unchanged.
        let skip = width <= profile.width
            && height <= profile.height
            && !profile.modes.is_enabled(AttributeKind::Hd)
            && !profile.modes.is_enabled(AttributeKind::Language);

        let (w, h) = match profile.scale {
            ScaleMode::Normalize if skip => {
                let w = (u64::from(height) * u64::from(profile.width))
                    .checked_div(u64::from(profile.height))
                    .map_or(width, |w| u32::try_from(w).unwrap_or(u32::MAX));
                (w.max(1), height)
            }
            ScaleMode::Fit if skip => (width, height),
            _ => (profile.width, profile.height),
        };
        ctx.set(Supersample {
            factor,
            width: w,
            height: h,
        });

        let image = std::mem::take(&mut ctx.image);
        ctx.image = match profile.scale {
            ScaleMode::Normalize => normalize(image, up(w), up(h)),
            ScaleMode::Stretch => resize_exact(image, up(w), up(h)),
            ScaleMode::Fit if skip => resize_exact(image, up(w), up(h)),
            ScaleMode::Fit => fit(image, up(w), up(h)),
        };
    }
}

/// Shrinks the supersampled canvas back once corners are drawn.
pub struct CornerQualityStage;

impl Stage for CornerQualityStage {
    fn name(&self) -> &'static str {
        "corner-quality"
    }

    fn is_enabled(&self, ctx: &RenderContext<'_>) -> bool {
        ctx.get::<Supersample>().is_some_and(|s| s.factor > 1.0)
    }

    fn transform(&self, ctx: &mut RenderContext<'_>) {
        let Some(&Supersample { width, height, .. }) = ctx.get::<Supersample>() else {
            return;
        };
        let image = std::mem::take(&mut ctx.image);
        ctx.image = resize_exact(image, width, height);
    }
}

/// Scales to fit inside `width x height` keeping the aspect ratio, centred
/// horizontally and resting on the bottom edge of a transparent canvas.
pub fn fit(image: RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    if (w, h) == (width, height) {
        return image;
    }
    if w == 0 || h == 0 {
        return RgbaImage::new(width, height);
    }

    let ratio = (width as f64 / w as f64).min(height as f64 / h as f64);
    let nw = ((w as f64 * ratio).round() as u32).clamp(1, width);
    let nh = ((h as f64 * ratio).round() as u32).clamp(1, height);
    let scaled = resize_exact(image, nw, nh);
    if (nw, nh) == (width, height) {
        return scaled;
    }

    let mut canvas = RgbaImage::new(width, height);
    let x = (width - nw) / 2;
    let y = height - nh;
    imageops::replace(&mut canvas, &scaled, x as i64, y as i64);
    canvas
}

/// Scales to cover `width x height` and crops the overflow around the centre.
pub fn normalize(image: RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    if (w, h) == (width, height) {
        return image;
    }
    if w == 0 || h == 0 {
        return RgbaImage::new(width, height);
    }

    let ratio = (width as f64 / w as f64).max(height as f64 / h as f64);
    let nw = ((w as f64 * ratio).ceil() as u32).max(width);
    let nh = ((h as f64 * ratio).ceil() as u32).max(height);
    let scaled = resize_exact(image, nw, nh);
    imageops::crop_imm(&scaled, (nw - width) / 2, (nh - height) / 2, width, height).to_image()
}
