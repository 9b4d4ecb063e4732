//! Title, season and set-size captions.
//!
//! Captions are laid out as an SVG `<text>` pair (shadow offset by two
//! pixels, then the text) and rendered with the system fonts.

use image::RgbaImage;
use palette::Srgb;

use super::svg::{composite_over, escape_text, render_svg};
use super::{RenderContext, Stage};
use crate::media::MediaMetadataView;
use crate::position::Align;
use crate::profile::BannerText;

/// Draws the title at the top and `Season N` at the bottom of banners.
pub struct BannerTextStage;

impl Stage for BannerTextStage {
    fn name(&self) -> &'static str {
        "banner-text"
    }

    fn is_enabled(&self, ctx: &RenderContext<'_>) -> bool {
        let text = &ctx.profile.text;
        ctx.target.is_banner_class() && (text.title || (text.season && ctx.media.is_tv_show()))
    }

    fn transform(&self, ctx: &mut RenderContext<'_>) {
        let style = &ctx.profile.text;
        if style.title {
            draw_text(&mut ctx.image, ctx.media.title(), true, style);
        }
        if style.season && ctx.media.is_tv_show() {
            if let Some(season) = ctx.media.season() {
                draw_text(&mut ctx.image, &format!("Season {season}"), false, style);
            }
        }
    }
}

/// Caption for a set of `size` items; sizes above nine read `9+`.
pub fn set_size_label(size: u32) -> Option<String> {
    match size {
        0 => None,
        1..=9 => Some(size.to_string()),
        _ => Some("9+".to_string()),
    }
}

/// Draws the set size at the bottom of the canvas when enabled.
pub fn draw_set_size(image: &mut RgbaImage, media: &dyn MediaMetadataView, style: &BannerText) {
    if !style.set_size {
        return;
    }
    if let Some(label) = set_size_label(media.set_size()) {
        draw_text(image, &label, false, style);
        tracing::debug!(size = media.set_size(), title = media.title(), "drew set size");
    }
}

/// Draws one caption line at the top or bottom of the canvas.
pub fn draw_text(image: &mut RgbaImage, text: &str, top: bool, style: &BannerText) {
    if text.trim().is_empty() {
        return;
    }
    let (w, h) = image.dimensions();
    let svg = caption_svg(text, w, h, top, style);
    if let Some(layer) = render_svg(&svg, w, h) {
        composite_over(image, &layer, 0, 0);
    }
}

fn hex(color: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

fn caption_svg(text: &str, width: u32, height: u32, top: bool, style: &BannerText) -> String {
    let (x, anchor) = match style.align {
        Align::Left => (style.offset, "start"),
        Align::Center => (width as i32 / 2, "middle"),
        Align::Right => (width as i32 - style.offset, "end"),
    };
    let y = if top {
        style.font_size as i32
    } else {
        height as i32 - 10
    };
    let text = escape_text(text);
    let font = escape_text(&style.font);

    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" "#,
            r#"font-family="{font}" font-size="{size}" font-weight="bold" text-anchor="{anchor}">"#,
            r#"<text x="{sx}" y="{sy}" fill="{shadow}">{text}</text>"#,
            r#"<text x="{x}" y="{y}" fill="{color}">{text}</text></svg>"#
        ),
        w = width,
        h = height,
        font = font,
        size = style.font_size,
        anchor = anchor,
        sx = x + 2,
        sy = y + 2,
        shadow = hex(style.shadow),
        x = x,
        y = y,
        color = hex(style.color),
        text = text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artwork::{ArtworkKind, ArtworkTarget};
    use crate::layer::fixture::Fixture;
    use crate::profile::RenderProfile;

    fn style() -> BannerText {
        RenderProfile::plain(10, 10).text
    }

    #[test]
    fn set_size_is_capped() {
        assert_eq!(set_size_label(0), None);
        assert_eq!(set_size_label(3).as_deref(), Some("3"));
        assert_eq!(set_size_label(9).as_deref(), Some("9"));
        assert_eq!(set_size_label(12).as_deref(), Some("9+"));
    }

    #[test]
    fn caption_alignment() {
        let mut style = style();
        style.align = Align::Right;
        style.offset = 7;
        let svg = caption_svg("Firefly", 300, 60, false, &style);
        assert!(svg.contains(r#"text-anchor="end""#));
        assert!(svg.contains(r##"<text x="293" y="50" fill="#ffffff">Firefly</text>"##));
        assert!(svg.contains(r##"<text x="295" y="52" fill="#000000">"##));
    }

    #[test]
    fn caption_text_is_escaped() {
        let svg = caption_svg("Law & Order", 100, 40, true, &style());
        assert!(svg.contains("Law &amp; Order"));
        assert!(svg.contains(r#"y="36""#));
    }

    #[test]
    fn only_banners_get_captions() {
        let mut profile = RenderProfile::plain(10, 10);
        profile.text.title = true;
        let mut fixture = Fixture::new(profile);
        assert!(!BannerTextStage.is_enabled(&fixture.context(RgbaImage::new(10, 10))));

        fixture.target = ArtworkTarget::new(ArtworkKind::Banner);
        assert!(BannerTextStage.is_enabled(&fixture.context(RgbaImage::new(10, 10))));
    }

    #[test]
    fn season_needs_a_tv_show() {
        let mut profile = RenderProfile::plain(10, 10);
        profile.text.season = true;
        let mut fixture = Fixture::new(profile);
        fixture.target = ArtworkTarget::new(ArtworkKind::Banner);
        assert!(!BannerTextStage.is_enabled(&fixture.context(RgbaImage::new(10, 10))));

        fixture.media.tv_show = true;
        assert!(BannerTextStage.is_enabled(&fixture.context(RgbaImage::new(10, 10))));
    }
}
