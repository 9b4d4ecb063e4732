//! Badge drawing: declarative layers and the built-in logo set.
//!
//! In declarative mode each layer of the current pass is resolved, matched
//! against its image rules, optionally repositioned by a conditional
//! position, and drawn either as one badge or as a block of badges. Language
//! flags skip the rule table and are tiled from one PNG per language.
//!
//! Without a layer set the profile's HD, TV, language, subtitle and set
//! toggles draw fixed logos in the before pass.

use image::RgbaImage;
use tracing::{debug, warn};

use super::svg::{composite_over, resize_exact};
use super::text::draw_set_size;
use super::{RenderContext, Stage};
use crate::artwork::ArtworkKind;
use crate::attribute::{self, AttributeKind, DisplayMode, ResolveContext, TRUE};
use crate::block::{dedup_files, layout_block, tile_grid};
use crate::matcher::{ResolvedState, apply_conditional_positions, select_images};
use crate::position::resolve_axis;
use crate::resources::ResourceStore;
use crate::skin::{BlockSpec, LayerSpec, OverlayMode, OverlaySpec, PositionSpec};

/// Inset of the built-in logos from the canvas edges.
const LEGACY_INSET: i32 = 5;

/// Draws the logo layers of one pass.
pub struct LogoStage {
    /// True for the pass drawn before the watermark overlay.
    pub before: bool,
}

impl Stage for LogoStage {
    fn name(&self) -> &'static str {
        if self.before {
            "logos-before"
        } else {
            "logos-after"
        }
    }

    fn is_enabled(&self, ctx: &RenderContext<'_>) -> bool {
        match ctx.overlay {
            OverlayMode::Declarative(spec) => spec.pass(self.before).next().is_some(),
            OverlayMode::Legacy => self.before,
        }
    }

    fn transform(&self, ctx: &mut RenderContext<'_>) {
        let overlay = ctx.overlay;
        match overlay {
            OverlayMode::Declarative(spec) => {
                for layer in spec.pass(self.before) {
                    draw_layer(ctx, spec, layer);
                }
            }
            OverlayMode::Legacy => draw_legacy(ctx),
        }
    }
}

// ============================================================================
// Declarative layers
// ============================================================================

fn draw_layer(ctx: &mut RenderContext<'_>, overlay: &OverlaySpec, layer: &LayerSpec) {
    let skin = ctx.skin;
    let profile = ctx.profile;

    let mut state = ResolvedState::resolve(
        layer,
        ctx.media,
        profile,
        ctx.target,
        skin.highdef_differentiate,
    );
    let enabled: Vec<bool> = layer
        .names
        .iter()
        .map(|name| {
            name.kind
                .is_some_and(|k| k != AttributeKind::Language && profile.modes.is_enabled(k))
        })
        .collect();
    select_images(layer, &mut state, &enabled, &skin.keywords);
    if apply_conditional_positions(layer, &mut state, &skin.keywords).is_some() {
        debug!(layer = %layer.label(), "conditional position applied");
    }

    for (slot, name) in state.slots.iter().zip(&layer.names) {
        let Some(kind) = name.kind else {
            continue;
        };
        let block = if profile.mode(kind).is_block() {
            overlay.block(kind)
        } else {
            None
        };

        if kind == AttributeKind::Language {
            draw_language(ctx, &slot.value, &slot.position, block);
            continue;
        }
        let Some(first) = slot.filenames.first() else {
            continue;
        };
        match block {
            Some(block) => draw_block(ctx, &slot.filenames, block, &slot.position),
            None => draw_file(ctx, first, &slot.position),
        }
        if kind == AttributeKind::Set {
            draw_set_size(&mut ctx.image, ctx.media, &profile.text);
        }
    }
}

fn draw_file(ctx: &mut RenderContext<'_>, file: &str, position: &PositionSpec) {
    if let Some(logo) = ctx.resources.load_or_warn(file) {
        draw_image(ctx, logo, position, file);
    }
}

/// Draws one badge at its resolved position, scaled to fixed extents.
fn draw_image(ctx: &mut RenderContext<'_>, logo: RgbaImage, position: &PositionSpec, label: &str) {
    let w = position.width.drawn(logo.width());
    let h = position.height.drawn(logo.height());
    if w == 0 || h == 0 {
        return;
    }
    let logo = resize_exact(logo, w, h);
    let x = resolve_axis(
        ctx.image.width() as i32,
        w as i32,
        position.left,
        position.align.into(),
    );
    let y = resolve_axis(
        ctx.image.height() as i32,
        h as i32,
        position.top,
        position.valign.into(),
    );
    composite_over(&mut ctx.image, &logo, x, y);
    debug!(logo = label, x, y, "drew logo");
}

fn draw_block(ctx: &mut RenderContext<'_>, files: &[String], block: &BlockSpec, position: &PositionSpec) {
    let files = dedup_files(files, block.clones);
    let images: Vec<RgbaImage> = files
        .iter()
        .filter_map(|file| ctx.resources.load_or_warn(file))
        .collect();
    place_block(ctx, images, block, position);
}

fn place_block(
    ctx: &mut RenderContext<'_>,
    images: Vec<RgbaImage>,
    block: &BlockSpec,
    position: &PositionSpec,
) {
    let sizes: Vec<(u32, u32)> = images.iter().map(RgbaImage::dimensions).collect();
    let placements = layout_block(
        &sizes,
        block,
        position.width,
        position.height,
        position.left,
        position.top,
    );
    let (cw, ch) = (ctx.image.width() as i32, ctx.image.height() as i32);
    let mut images: Vec<Option<RgbaImage>> = images.into_iter().map(Some).collect();

    for p in placements {
        let Some(img) = images.get_mut(p.index).and_then(Option::take) else {
            continue;
        };
        if p.width == 0 || p.height == 0 {
            continue;
        }
        let img = resize_exact(img, p.width, p.height);
        let x = resolve_axis(cw, p.width as i32, position.left + p.dx, position.align.into());
        let y = resolve_axis(ch, p.height as i32, position.top + p.dy, position.valign.into());
        composite_over(&mut ctx.image, &img, x, y);
    }
    debug!(count = sizes.len(), "drew block");
}

// ============================================================================
// Language flags
// ============================================================================

fn flag_path(language: &str) -> String {
    format!("languages/{language}.png")
}

/// Splits a resolved language value into its known entries.
fn languages(value: &str) -> Vec<&str> {
    value
        .split('/')
        .map(str::trim)
        .filter(|lang| attribute::is_known(lang))
        .collect()
}

fn draw_language(
    ctx: &mut RenderContext<'_>,
    value: &str,
    position: &PositionSpec,
    block: Option<&BlockSpec>,
) {
    let langs = languages(value);
    if langs.is_empty() {
        return;
    }
    if let Some(block) = block {
        let files: Vec<String> = langs.iter().map(|lang| flag_path(lang)).collect();
        draw_block(ctx, &files, block, position);
    } else if let Some(flag) = language_flag(&ctx.resources, &langs) {
        draw_image(ctx, flag, position, "language");
    }
}

/// The combined `languages/A_B.png` flag when present, otherwise the single
/// flags tiled into one image the size of the first.
pub fn language_flag(resources: &ResourceStore, langs: &[&str]) -> Option<RgbaImage> {
    let combined = flag_path(&langs.join("_"));
    if resources.exists(&combined) {
        return resources.load_or_warn(&combined);
    }
    if let [lang] = langs {
        warn!(language = *lang, path = %resources.path(&combined).display(), "missing language flag");
        return None;
    }
    debug!(flag = %combined, "tiling language flags");

    let flags: Vec<RgbaImage> = langs
        .iter()
        .filter_map(|lang| resources.load_or_warn(&flag_path(lang)))
        .collect();
    let (width, height) = flags.first()?.dimensions();
    let (cols, rows) = tile_grid(flags.len() as u32);
    let (cell_w, cell_h) = (width / cols, height / rows);
    if cell_w == 0 || cell_h == 0 {
        return None;
    }

    let mut tile = RgbaImage::new(width, height);
    for (i, flag) in flags.into_iter().enumerate() {
        let i = i as u32;
        let cell = resize_exact(flag, cell_w, cell_h);
        composite_over(
            &mut tile,
            &cell,
            ((i % cols) * cell_w) as i32,
            ((i / cols) * cell_h) as i32,
        );
    }
    Some(tile)
}

// ============================================================================
// Built-in logo set
// ============================================================================

fn hd_logo_file(resources: &ResourceStore, hd1080: bool, differentiate: bool) -> &'static str {
    let name = match (differentiate, hd1080) {
        (false, _) => "hd.png",
        (true, true) => "hd-1080.png",
        (true, false) => "hd-720.png",
    };
    if resources.exists(name) {
        name
    } else {
        debug!(logo = name, "missing HD logo, using hd.png");
        "hd.png"
    }
}

fn draw_legacy(ctx: &mut RenderContext<'_>) {
    let media = ctx.media;
    let modes = &ctx.profile.modes;
    let differentiate = ctx.skin.highdef_differentiate;
    let on = ResolveContext {
        target: ctx.target,
        mode: DisplayMode::On,
        highdef_differentiate: differentiate,
    };

    let hd = modes.is_enabled(AttributeKind::Hd) && media.is_hd();
    let tv = modes.is_enabled(AttributeKind::Tv) && media.is_tv_show();
    let (w, h) = (ctx.image.width() as i32, ctx.image.height() as i32);

    if hd {
        let file = hd_logo_file(&ctx.resources, media.is_hd1080(), differentiate);
        if let Some(logo) = ctx.resources.load_or_warn(file) {
            let (lw, lh) = (logo.width() as i32, logo.height() as i32);
            let x = if tv { LEGACY_INSET } else { w / 2 - lw / 2 };
            composite_over(&mut ctx.image, &logo, x, h - lh - LEGACY_INSET);
            debug!(logo = file, x, "drew HD logo");
        }
    }

    if tv {
        if let Some(logo) = ctx.resources.load_or_warn("tv.png") {
            let (lw, lh) = (logo.width() as i32, logo.height() as i32);
            let x = if hd { w - lw - LEGACY_INSET } else { w / 2 - lw / 2 };
            composite_over(&mut ctx.image, &logo, x, h - lh - LEGACY_INSET);
            debug!(logo = "tv.png", x, "drew TV logo");
        }
    }

    if modes.is_enabled(AttributeKind::Language) {
        let value = attribute::resolve(AttributeKind::Language, media, &on);
        let langs = languages(&value);
        if !langs.is_empty() {
            if let Some(flag) = language_flag(&ctx.resources, &langs) {
                composite_over(&mut ctx.image, &flag, 1, 1);
            }
        }
    }

    if modes.is_enabled(AttributeKind::Subtitle)
        && attribute::resolve(AttributeKind::Subtitle, media, &on) == TRUE
    {
        if let Some(logo) = ctx.resources.load_or_warn("subtitle.png") {
            let x = w - logo.width() as i32 - LEGACY_INSET;
            composite_over(&mut ctx.image, &logo, x, LEGACY_INSET);
        }
    }

    if ctx.target.kind == ArtworkKind::Thumbnail && media.is_set_master() {
        if modes.is_enabled(AttributeKind::Set) {
            if let Some(logo) = ctx.resources.load_or_warn("set.png") {
                let x = w - logo.width() as i32 - LEGACY_INSET;
                composite_over(&mut ctx.image, &logo, x, 1);
                debug!(title = media.title(), "drew set logo");
            }
        }
        draw_set_size(&mut ctx.image, media, &ctx.profile.text);
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use super::*;
    use crate::layer::fixture::Fixture;
    use crate::media::AudioTrack;
    use crate::profile::RenderProfile;
    use crate::skin::{LayerSetSettings, compile_overlay};
    use image::Rgba;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);

    fn png(dir: &Path, name: &str, w: u32, h: u32, color: Rgba<u8>) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        RgbaImage::from_pixel(w, h, color).save(path).unwrap();
    }

    fn declarative(json: &str) -> OverlayMode {
        let set: LayerSetSettings = serde_json::from_str(json).unwrap();
        OverlayMode::Declarative(Arc::new(compile_overlay(&set, false).unwrap()))
    }

    fn canvas() -> RgbaImage {
        RgbaImage::from_pixel(20, 20, BLACK)
    }

    fn run(fixture: &Fixture, before: bool) -> RgbaImage {
        let mut ctx = fixture.context(canvas());
        let stage = LogoStage { before };
        if stage.is_enabled(&ctx) {
            stage.transform(&mut ctx);
        }
        ctx.image
    }

    const SOURCE_LAYER: &str = r#"{ "layers": [{
        "name": "VS", "left": 2, "top": 3, "align": "right", "valign": "bottom",
        "images": [{ "value": "bluray", "filename": "bluray.png" }]
    }] }"#;

    fn source_fixture(dir: &Path, source: &str) -> Fixture {
        let profile = RenderProfile::plain(20, 20).with_mode(AttributeKind::VideoSource, DisplayMode::On);
        let mut fixture = Fixture::new(profile).resources(dir);
        fixture.compiled.overlay = declarative(SOURCE_LAYER);
        fixture.media.video_source = Some(source.into());
        fixture
    }

    #[test]
    fn matching_rule_draws_at_resolved_position() {
        let dir = tempfile::tempdir().unwrap();
        png(dir.path(), "bluray.png", 4, 4, RED);
        let out = run(&source_fixture(dir.path(), "BluRay"), true);

        assert_eq!(*out.get_pixel(14, 13), RED);
        assert_eq!(*out.get_pixel(17, 16), RED);
        assert_eq!(*out.get_pixel(13, 13), BLACK);
        assert_eq!(*out.get_pixel(18, 17), BLACK);
    }

    #[test]
    fn unmatched_layer_leaves_canvas_untouched() {
        let dir = tempfile::tempdir().unwrap();
        png(dir.path(), "bluray.png", 4, 4, RED);
        assert_eq!(run(&source_fixture(dir.path(), "DVD"), true), canvas());
    }

    #[test]
    fn missing_overlay_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(run(&source_fixture(dir.path(), "BluRay"), true), canvas());
    }

    #[test]
    fn layers_draw_only_in_their_pass() {
        let mut fixture = Fixture::new(RenderProfile::plain(20, 20));
        fixture.compiled.overlay = declarative(
            r#"{ "layers": [{ "name": "TV", "after": true,
                 "images": [{ "value": "TRUE", "filename": "tv.png" }] }] }"#,
        );
        let before = LogoStage { before: true };
        let after = LogoStage { before: false };
        let ctx = fixture.context(canvas());
        assert!(!before.is_enabled(&ctx));
        assert!(after.is_enabled(&ctx));
    }

    #[test]
    fn block_mode_draws_every_value() {
        let dir = tempfile::tempdir().unwrap();
        png(dir.path(), "ac3.png", 4, 4, RED);
        png(dir.path(), "dts.png", 4, 4, BLUE);

        let profile =
            RenderProfile::plain(20, 20).with_mode(AttributeKind::AudioCodec, DisplayMode::Block);
        let mut fixture = Fixture::new(profile).resources(dir.path());
        fixture.compiled.overlay = declarative(
            r#"{ "layers": [{ "name": "AC", "left": 1, "top": 1, "images": [
                    { "value": "AC3", "filename": "ac3.png" },
                    { "value": "DTS", "filename": "dts.png" }
                 ] }],
                 "blocks": [{ "name": "audiocodec", "cols": 2 }] }"#,
        );
        fixture.media.audio_tracks = ["AC3", "DTS", "AC3"]
            .iter()
            .map(|codec| AudioTrack {
                codec: codec.to_string(),
                channels: None,
                language: None,
            })
            .collect();

        let out = run(&fixture, true);
        assert_eq!(*out.get_pixel(1, 1), RED);
        assert_eq!(*out.get_pixel(5, 1), BLUE);
        assert_eq!(*out.get_pixel(9, 1), BLACK);
        assert_eq!(*out.get_pixel(1, 5), BLACK);
    }

    #[test]
    fn language_flags_are_tiled() {
        let dir = tempfile::tempdir().unwrap();
        png(dir.path(), "languages/English.png", 4, 4, RED);
        png(dir.path(), "languages/French.png", 4, 4, BLUE);
        let store = ResourceStore::new(dir.path());

        let tile = language_flag(&store, &["English", "French"]).unwrap();
        assert_eq!(tile.dimensions(), (4, 4));
        assert_eq!(*tile.get_pixel(0, 2), RED);
        assert_eq!(*tile.get_pixel(3, 2), BLUE);
    }

    #[test]
    fn combined_language_flag_wins() {
        let dir = tempfile::tempdir().unwrap();
        png(dir.path(), "languages/English.png", 4, 4, RED);
        png(dir.path(), "languages/English_French.png", 6, 4, GREEN);
        let store = ResourceStore::new(dir.path());

        let flag = language_flag(&store, &["English", "French"]).unwrap();
        assert_eq!(flag.dimensions(), (6, 4));
        assert!(language_flag(&store, &["German"]).is_none());
    }

    #[test]
    fn legacy_language_flag_sits_in_top_left() {
        let dir = tempfile::tempdir().unwrap();
        png(dir.path(), "languages/English.png", 4, 4, RED);
        let profile =
            RenderProfile::plain(20, 20).with_mode(AttributeKind::Language, DisplayMode::On);
        let mut fixture = Fixture::new(profile).resources(dir.path());
        fixture.media.languages = vec!["English".into()];

        let out = run(&fixture, true);
        assert_eq!(*out.get_pixel(0, 0), BLACK);
        assert_eq!(*out.get_pixel(1, 1), RED);
        assert_eq!(*out.get_pixel(4, 4), RED);
    }

    #[test]
    fn legacy_hd_logo_falls_back_and_centres() {
        let dir = tempfile::tempdir().unwrap();
        png(dir.path(), "hd.png", 4, 2, RED);
        let profile = RenderProfile::plain(20, 20).with_mode(AttributeKind::Hd, DisplayMode::On);
        let mut fixture = Fixture::new(profile).resources(dir.path());
        fixture.skin.highdef_differentiate = true;
        fixture.media.hd = true;

        let out = run(&fixture, true);
        assert_eq!(*out.get_pixel(8, 13), RED);
        assert_eq!(*out.get_pixel(11, 14), RED);
        assert_eq!(*out.get_pixel(7, 13), BLACK);
        assert_eq!(run(&fixture, false), canvas());
    }
}
