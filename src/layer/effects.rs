//! Post effects: mirrored reflection and 3D perspective.

use image::{Rgba, RgbaImage};

use super::{PerspectiveOverride, RenderContext, Stage};
use crate::profile::{Perspective, PerspectiveDirection, Reflection};

// ============================================================================
// ReflectionStage
// ============================================================================

/// Extends the canvas downwards with a faded mirror image.
pub struct ReflectionStage;

impl Stage for ReflectionStage {
    fn name(&self) -> &'static str {
        "reflection"
    }

    fn is_enabled(&self, ctx: &RenderContext<'_>) -> bool {
        ctx.profile.reflection.is_some()
    }

    fn transform(&self, ctx: &mut RenderContext<'_>) {
        if let Some(reflection) = ctx.profile.reflection {
            ctx.image = reflect(&ctx.image, &reflection);
        }
    }
}

/// Adds `height` percent of the image height below it, filled with the
/// upside-down image.
///
/// The mirror is faded by an opacity gradient running from `opacity_start`
/// to `opacity_end` between `start` and `end` percent of the reflection
/// height; the gradient value is how much of the mirror is removed.
///
/// The mirror starts on the row right below the image with no gap, so the
/// output height is `h * (1 + height / 100)`, truncated.
pub fn reflect(image: &RgbaImage, reflection: &Reflection) -> RgbaImage {
    let (w, h) = image.dimensions();
    let ratio = reflection.height.max(0.0) / 100.0;
    let new_h = (h as f32 * (1.0 + ratio)) as u32;
    let band = h as f32 * ratio;
    let start = reflection.start / 100.0 * band;
    let end = reflection.end / 100.0 * band;
    let opacity_start = (reflection.opacity_start / 100.0).clamp(0.0, 1.0);
    let opacity_end = (reflection.opacity_end / 100.0).clamp(0.0, 1.0);

    let mut out = RgbaImage::new(w, new_h.max(h));
    image::imageops::replace(&mut out, image, 0, 0);

    for k in 0..new_h.saturating_sub(h).min(h) {
        let pos = k as f32;
        let fade = if pos <= start {
            opacity_start
        } else if pos >= end {
            opacity_end
        } else {
            opacity_start + (opacity_end - opacity_start) * (pos - start) / (end - start)
        };
        let keep = 1.0 - fade;
        let src_y = h - 1 - k;
        for x in 0..w {
            let Rgba([r, g, b, a]) = *image.get_pixel(x, src_y);
            let alpha = (a as f32 * keep).round() as u8;
            out.put_pixel(x, h + k, Rgba([r, g, b, alpha]));
        }
    }
    out
}

// ============================================================================
// PerspectiveStage
// ============================================================================

/// Skews the canvas into a trapezoid so it appears turned in 3D.
///
/// The caller's direction wins over the profile's.
pub struct PerspectiveStage;

impl Stage for PerspectiveStage {
    fn name(&self) -> &'static str {
        "perspective"
    }

    fn is_enabled(&self, ctx: &RenderContext<'_>) -> bool {
        ctx.profile.perspective.is_some()
    }

    fn transform(&self, ctx: &mut RenderContext<'_>) {
        let Some(mut perspective) = ctx.profile.perspective else {
            return;
        };
        if let Some(PerspectiveOverride(direction)) = ctx.get::<PerspectiveOverride>() {
            perspective.direction = *direction;
        }
        ctx.image = skew(&ctx.image, &perspective);
    }
}

/// Maps the image onto a trapezoid of the same size.
///
/// Turning right keeps the left edge at full height and pulls the right
/// edge in by `top`/`bottom` percent of the height; turning left mirrors
/// this. Each column is resampled linearly between its new ends.
pub fn skew(image: &RgbaImage, perspective: &Perspective) -> RgbaImage {
    let (w, h) = image.dimensions();
    let mut out = RgbaImage::new(w, h);
    if w == 0 || h == 0 {
        return out;
    }

    let top = (h as f32 * perspective.top / 100.0).trunc();
    let bottom = (h as f32 * perspective.bottom / 100.0).trunc();
    let last = (w.max(2) - 1) as f32;

    for x in 0..w {
        let t = match perspective.direction {
            PerspectiveDirection::Right => x as f32 / last,
            PerspectiveDirection::Left => 1.0 - x as f32 / last,
        };
        let y0 = t * top;
        let y1 = h as f32 - t * bottom;
        let span = y1 - y0;
        if span <= 0.0 {
            continue;
        }
        for y in 0..h {
            let centre = y as f32 + 0.5;
            if centre < y0 || centre >= y1 {
                continue;
            }
            let src = (centre - y0) * h as f32 / span - 0.5;
            out.put_pixel(x, y, sample_column(image, x, src));
        }
    }
    out
}

/// Linear interpolation between the two source rows around `y`.
fn sample_column(image: &RgbaImage, x: u32, y: f32) -> Rgba<u8> {
    let max = (image.height() - 1) as f32;
    let y = y.clamp(0.0, max);
    let lo = y.floor();
    let frac = y - lo;
    let a = image.get_pixel(x, lo as u32).0;
    let b = image.get_pixel(x, (lo + 1.0).min(max) as u32).0;
    let mut px = [0u8; 4];
    for (i, c) in px.iter_mut().enumerate() {
        *c = (a[i] as f32 + (b[i] as f32 - a[i] as f32) * frac).round() as u8;
    }
    Rgba(px)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::fixture::Fixture;
    use crate::profile::RenderProfile;

    const GREEN: Rgba<u8> = Rgba([0, 200, 0, 255]);

    fn reflection() -> Reflection {
        Reflection {
            height: 50.0,
            start: 0.0,
            end: 100.0,
            opacity_start: 30.0,
            opacity_end: 100.0,
        }
    }

    fn perspective(direction: PerspectiveDirection) -> Perspective {
        Perspective {
            top: 10.0,
            bottom: 10.0,
            direction,
        }
    }

    #[test]
    fn reflection_grows_canvas_and_fades() {
        let mut img = RgbaImage::from_pixel(4, 8, GREEN);
        img.put_pixel(0, 7, Rgba([255, 0, 0, 255]));
        let out = reflect(&img, &reflection());

        assert_eq!(out.dimensions(), (4, 12));
        assert_eq!(*out.get_pixel(1, 3), GREEN);
        let first = out.get_pixel(0, 8);
        assert_eq!(&first.0[..3], &[255, 0, 0]);
        assert!((176..=180).contains(&first[3]));
        assert!(out.get_pixel(1, 11)[3] < out.get_pixel(1, 9)[3]);
    }

    #[test]
    fn zero_height_reflection_is_identity() {
        let img = RgbaImage::from_pixel(4, 8, GREEN);
        let mut r = reflection();
        r.height = 0.0;
        assert_eq!(reflect(&img, &r), img);
    }

    #[test]
    fn right_turn_shrinks_right_edge() {
        let img = RgbaImage::from_pixel(100, 100, GREEN);
        let out = skew(&img, &perspective(PerspectiveDirection::Right));
        assert_eq!(out.dimensions(), (100, 100));
        assert_eq!(out.get_pixel(0, 0)[3], 255);
        assert_eq!(out.get_pixel(0, 99)[3], 255);
        assert_eq!(out.get_pixel(99, 5)[3], 0);
        assert_eq!(out.get_pixel(99, 95)[3], 0);
        assert_eq!(*out.get_pixel(99, 50), GREEN);
    }

    #[test]
    fn left_turn_mirrors() {
        let img = RgbaImage::from_pixel(100, 100, GREEN);
        let out = skew(&img, &perspective(PerspectiveDirection::Left));
        assert_eq!(out.get_pixel(0, 5)[3], 0);
        assert_eq!(out.get_pixel(99, 0)[3], 255);
    }

    #[test]
    fn caller_direction_overrides_profile() {
        let mut profile = RenderProfile::plain(100, 100);
        profile.perspective = Some(perspective(PerspectiveDirection::Right));
        let fixture = Fixture::new(profile);
        let mut ctx = fixture.context(RgbaImage::from_pixel(100, 100, GREEN));
        ctx.set(PerspectiveOverride(PerspectiveDirection::Left));

        assert!(PerspectiveStage.is_enabled(&ctx));
        PerspectiveStage.transform(&mut ctx);
        assert_eq!(ctx.image.get_pixel(0, 5)[3], 0);
        assert_eq!(ctx.image.get_pixel(99, 5)[3], 255);
    }
}
