//! Raster helpers shared by the compositor stages.
//!
//! Text is drawn by rendering a small SVG document through resvg, and
//! masked drawing (frames, rounded corners) goes through tiny-skia. Both
//! work on premultiplied pixmaps, so images cross that boundary through
//! [`rgba_to_pixmap`] and [`pixmap_to_rgba_image`].

use std::sync::{Arc, OnceLock};

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{ColorU8, Pixmap, Transform};
use resvg::usvg::{Options, Tree, fontdb};

// ============================================================================
// SVG Rendering
// ============================================================================

fn font_database() -> Arc<fontdb::Database> {
    static FONTS: OnceLock<Arc<fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = fontdb::Database::new();
            db.load_system_fonts();
            Arc::new(db)
        })
        .clone()
}

/// Renders SVG markup 1:1 onto a transparent `width x height` canvas.
///
/// Returns `None` if the markup cannot be parsed or the canvas is empty.
pub fn render_svg(svg_data: &str, width: u32, height: u32) -> Option<RgbaImage> {
    let mut opts = Options::default();
    opts.fontdb = font_database();
    let tree = Tree::from_str(svg_data, &opts).ok()?;

    let mut pixmap = Pixmap::new(width, height)?;
    resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());
    Some(pixmap_to_rgba_image(&pixmap))
}

/// Escapes text for use inside an SVG element.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

// ============================================================================
// Pixmap Conversion
// ============================================================================

/// Converts an RGBA image into a premultiplied tiny-skia pixmap.
pub fn rgba_to_pixmap(img: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(img.width(), img.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

/// Converts a tiny-skia pixmap back into a straight-alpha RGBA image.
pub fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let (r, g, b, a) = unpremultiply(src.red(), src.green(), src.blue(), src.alpha());
        *dst = Rgba([r, g, b, a]);
    }
    img
}

fn unpremultiply(r: u8, g: u8, b: u8, a: u8) -> (u8, u8, u8, u8) {
    if a == 0 {
        return (0, 0, 0, 0);
    }
    let scale = 255.0 / a as f32;
    let un = |c: u8| (c as f32 * scale).round().min(255.0) as u8;
    (un(r), un(g), un(b), a)
}

// ============================================================================
// Compositing
// ============================================================================

/// Resizes to exactly `width x height`, returning the input untouched when
/// it already has that size.
pub fn resize_exact(img: RgbaImage, width: u32, height: u32) -> RgbaImage {
    if img.dimensions() == (width, height) {
        img
    } else {
        imageops::resize(&img, width, height, FilterType::CatmullRom)
    }
}

/// Draws `src` over `dest` with its top-left corner at (`x`, `y`).
///
/// Pixels falling outside `dest` are clipped.
pub fn composite_over(dest: &mut RgbaImage, src: &RgbaImage, x: i32, y: i32) {
    let dest_width = dest.width() as i32;
    let dest_height = dest.height() as i32;

    for (sx, sy, src_pixel) in src.enumerate_pixels() {
        let dx = x + sx as i32;
        let dy = y + sy as i32;
        if dx < 0 || dy < 0 || dx >= dest_width || dy >= dest_height {
            continue;
        }
        let dst_pixel = dest.get_pixel_mut(dx as u32, dy as u32);
        *dst_pixel = alpha_blend(*src_pixel, *dst_pixel);
    }
}

/// Source-over blend of two straight-alpha pixels.
fn alpha_blend(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0;
    let dw = dst[3] as f32 / 255.0 * (1.0 - sa);
    let alpha = sa + dw;
    if alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |i: usize| ((src[i] as f32 * sa + dst[i] as f32 * dw) / alpha).round() as u8;
    Rgba([channel(0), channel(1), channel(2), (alpha * 255.0).round() as u8])
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="20"><rect x="5" y="5" width="10" height="10" fill="#00ff00"/></svg>"##;

    #[test]
    fn renders_svg_onto_canvas() {
        let img = render_svg(SQUARE_SVG, 20, 20).unwrap();
        assert_eq!(img.dimensions(), (20, 20));
        assert_eq!(img.get_pixel(10, 10).0, [0, 255, 0, 255]);
        assert_eq!(img.get_pixel(1, 1)[3], 0);
    }

    #[test]
    fn invalid_svg_renders_nothing() {
        assert!(render_svg("<not-svg", 10, 10).is_none());
        assert!(render_svg(SQUARE_SVG, 0, 10).is_none());
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_text("Tom & Jerry <3"), "Tom &amp; Jerry &lt;3");
    }

    #[test]
    fn pixmap_conversion_keeps_straight_alpha() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([200, 100, 50, 255]));
        let back = pixmap_to_rgba_image(&rgba_to_pixmap(&img).unwrap());
        assert_eq!(back, img);
    }

    #[test]
    fn composite_opaque_and_clipped() {
        let mut dest = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let src = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));

        composite_over(&mut dest, &src, 8, -2);

        assert_eq!(dest.get_pixel(9, 0).0, [0, 0, 255, 255]);
        assert_eq!(dest.get_pixel(7, 0).0, [255, 0, 0, 255]);
        assert_eq!(dest.get_pixel(9, 2).0, [255, 0, 0, 255]);
    }

    #[test]
    fn composite_with_transparency() {
        let mut dest = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let src = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 128]));

        composite_over(&mut dest, &src, 0, 0);

        let pixel = dest.get_pixel(0, 0);
        assert!(pixel[0] > 0, "Should have some red");
        assert!(pixel[2] > 0, "Should have some blue");
        assert_eq!(pixel[3], 255);
    }

    #[test]
    fn transparent_source_leaves_destination() {
        let mut dest = RgbaImage::from_pixel(3, 3, Rgba([9, 8, 7, 255]));
        let before = dest.clone();
        composite_over(&mut dest, &RgbaImage::new(3, 3), 0, 0);
        assert_eq!(dest, before);
    }

    #[test]
    fn resize_exact_is_identity_at_size() {
        let img = RgbaImage::from_pixel(4, 3, Rgba([1, 2, 3, 4]));
        assert_eq!(resize_exact(img.clone(), 4, 3), img);
        assert_eq!(resize_exact(img, 8, 6).dimensions(), (8, 6));
    }
}
