//! End-to-end renders through `SkinLoader` and `ArtworkEngine` against real
//! PNG resources written to a temporary skin directory.

use std::path::Path;

use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use marquee_renderer::{
    ArtworkEngine, ArtworkKind, ArtworkTarget, AudioTrack, ConfigError, MediaInfo, SkinLoader,
};
use tempfile::TempDir;

const GREY: Rgba<u8> = Rgba([60, 60, 60, 255]);
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);

fn png(resources: &Path, name: &str, w: u32, h: u32, color: Rgba<u8>) {
    let path = resources.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    RgbaImage::from_pixel(w, h, color).save(path).unwrap();
}

/// Writes `skin.json` and an empty `resources/` directory.
fn skin_dir(json: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("resources")).unwrap();
    std::fs::write(dir.path().join("skin.json"), json).unwrap();
    dir
}

fn engine(dir: &TempDir) -> ArtworkEngine {
    ArtworkEngine::from_file(&SkinLoader::new(), dir.path().join("skin.json")).unwrap()
}

fn base(w: u32, h: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, GREY))
}

fn poster(engine: &ArtworkEngine, media: &MediaInfo, img: &DynamicImage) -> RgbaImage {
    engine
        .render(media, ArtworkTarget::new(ArtworkKind::Poster), img, None)
        .to_rgba8()
}

#[test]
fn legacy_hd_and_tv_logos_share_the_bottom_edge() {
    let dir = skin_dir(
        r#"{ "profiles": { "posters": {
                "width": 100, "height": 150,
                "attributes": { "HD": true, "TV": true } } } }"#,
    );
    png(&dir.path().join("resources"), "hd.png", 10, 10, RED);
    png(&dir.path().join("resources"), "tv.png", 10, 10, BLUE);

    let mut media = MediaInfo::new("Firefly");
    media.hd = true;
    media.tv_show = true;

    let out = poster(&engine(&dir), &media, &base(100, 150));
    assert_eq!(out.dimensions(), (100, 150));
    assert_eq!(*out.get_pixel(5, 135), RED);
    assert_eq!(*out.get_pixel(14, 144), RED);
    assert_eq!(*out.get_pixel(85, 135), BLUE);
    assert_eq!(*out.get_pixel(94, 144), BLUE);
    assert_eq!(*out.get_pixel(50, 140), GREY);
}

#[test]
fn legacy_hd_logo_alone_is_centred() {
    let dir = skin_dir(
        r#"{ "highdefDifferentiate": true,
             "profiles": { "posters": {
                "width": 100, "height": 150, "attributes": { "HD": true } } } }"#,
    );
    png(&dir.path().join("resources"), "hd-1080.png", 10, 10, GREEN);

    let mut media = MediaInfo::new("Serenity");
    media.hd = true;
    media.hd1080 = true;

    let out = poster(&engine(&dir), &media, &base(100, 150));
    assert_eq!(*out.get_pixel(45, 135), GREEN);
    assert_eq!(*out.get_pixel(44, 135), GREY);
}

#[test]
fn conditional_position_splits_joint_layer() {
    let dir = skin_dir(
        r#"{
            "layerSets": { "main": { "layers": [{
                "name": "HD/TV", "valign": "bottom",
                "images": [
                    { "name": "HD", "value": "hd", "filename": "hd.png" },
                    { "name": "TV", "value": "TRUE", "filename": "tv.png" }
                ],
                "positions": [{ "value": "hd/TRUE", "left": "5/5", "align": "left/right" }]
            }] } },
            "profiles": { "posters": {
                "width": 100, "height": 150, "layerSet": "main",
                "attributes": { "HD": true, "TV": true } } }
        }"#,
    );
    png(&dir.path().join("resources"), "hd.png", 10, 10, RED);
    png(&dir.path().join("resources"), "tv.png", 10, 10, BLUE);

    let mut media = MediaInfo::new("Firefly");
    media.hd = true;
    media.tv_show = true;

    let out = poster(&engine(&dir), &media, &base(100, 150));
    assert_eq!(*out.get_pixel(5, 140), RED);
    assert_eq!(*out.get_pixel(85, 140), BLUE);
    assert_eq!(*out.get_pixel(50, 140), GREY);
}

#[test]
fn audio_codec_block_lays_out_every_track() {
    let dir = skin_dir(
        r#"{
            "layerSets": { "main": {
                "layers": [{ "name": "audiocodec", "left": 2, "top": 2, "images": [
                    { "value": "AC3", "filename": "ac3.png" },
                    { "value": "DTS", "filename": "dts.png" }
                ] }],
                "blocks": [{ "name": "audiocodec", "dir": "vertical", "rows": 2, "vmargin": 1 }]
            } },
            "profiles": { "posters": {
                "width": 40, "height": 40, "layerSet": "main",
                "attributes": { "audiocodec": "block" } } }
        }"#,
    );
    png(&dir.path().join("resources"), "ac3.png", 6, 6, RED);
    png(&dir.path().join("resources"), "dts.png", 6, 6, BLUE);

    let mut media = MediaInfo::new("Alien");
    media.audio_tracks = ["DTS", "AC3"]
        .into_iter()
        .map(|codec| AudioTrack {
            codec: codec.into(),
            ..AudioTrack::default()
        })
        .collect();

    let out = poster(&engine(&dir), &media, &base(40, 40));
    assert_eq!(*out.get_pixel(2, 2), BLUE);
    assert_eq!(*out.get_pixel(2, 9), RED);
    assert_eq!(*out.get_pixel(2, 8), GREY);
    assert_eq!(*out.get_pixel(9, 2), GREY);
}

#[test]
fn unmatched_layer_leaves_image_untouched() {
    let dir = skin_dir(
        r#"{
            "layerSets": { "main": { "layers": [{
                "name": "certification",
                "images": [{ "value": "PG", "filename": "pg.png" }]
            }] } },
            "profiles": { "posters": {
                "width": 30, "height": 30, "layerSet": "main",
                "attributes": { "certification": true } } }
        }"#,
    );
    png(&dir.path().join("resources"), "pg.png", 5, 5, RED);

    let mut media = MediaInfo::new("Alien");
    media.certification = Some("R".into());
    let img = base(30, 30);

    let out = poster(&engine(&dir), &media, &img);
    assert_eq!(out, img.to_rgba8());
}

#[test]
fn missing_resources_are_skipped() {
    let dir = skin_dir(
        r#"{
            "layerSets": { "main": { "layers": [{
                "name": "certification",
                "images": [{ "value": "R", "filename": "rated-r.png" }]
            }] } },
            "profiles": { "posters": {
                "width": 30, "height": 30, "layerSet": "main",
                "overlay": { "enabled": true, "source": "certification" },
                "attributes": { "certification": true } } }
        }"#,
    );

    let mut media = MediaInfo::new("Alien");
    media.certification = Some("R".into());
    let img = base(30, 30);

    let out = poster(&engine(&dir), &media, &img);
    assert_eq!(out, img.to_rgba8());
}

#[test]
fn small_images_render_idempotently() {
    let dir = skin_dir(r#"{ "profiles": { "posters": { "width": 100, "height": 150 } } }"#);
    let engine = engine(&dir);
    let media = MediaInfo::new("Alien");

    let first = poster(&engine, &media, &base(50, 60));
    assert_eq!(first.dimensions(), (50, 60));
    let second = poster(&engine, &media, &DynamicImage::ImageRgba8(first.clone()));
    assert_eq!(first, second);
}

#[test]
fn watermark_then_reflection_grow_the_canvas() {
    let dir = skin_dir(
        r#"{ "profiles": { "posters": {
                "width": 16, "height": 24,
                "overlay": { "enabled": true, "source": "videosource", "offsetX": 2, "offsetY": 3 },
                "reflection": { "enabled": true, "height": 50 } } } }"#,
    );
    let mut frame = RgbaImage::new(20, 30);
    for (x, y, px) in frame.enumerate_pixels_mut() {
        if x < 2 || y < 3 || x >= 18 || y >= 27 {
            *px = BLUE;
        }
    }
    frame
        .save(dir.path().join("resources/dvd_overlay_posters.png"))
        .unwrap();

    let mut media = MediaInfo::new("Alien");
    media.video_source = Some("DVD".into());

    let out = poster(&engine(&dir), &media, &base(16, 24));
    assert_eq!(out.dimensions(), (20, 45));
    assert_eq!(*out.get_pixel(0, 0), BLUE);
    assert_eq!(*out.get_pixel(10, 15), GREY);
    assert!(out.get_pixel(10, 31)[3] < 255);
}

#[test]
fn invalid_layer_set_fails_unless_degraded() {
    let dir = skin_dir(
        r#"{
            "layerSets": { "main": { "layers": [{
                "name": "HD/TV",
                "images": [{ "name": "HD", "value": "hd/TRUE/x", "filename": "hd.png" }]
            }] } },
            "profiles": { "posters": { "layerSet": "main" } }
        }"#,
    );
    let path = dir.path().join("skin.json");

    let err = SkinLoader::new().load_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Arity { .. }), "{err}");

    let skin = SkinLoader::new()
        .degrade_on_error(true)
        .load_file(&path)
        .unwrap();
    assert!(matches!(
        skin.profile(ArtworkKind::Poster).map(|p| &p.overlay),
        Some(marquee_renderer::OverlayMode::Legacy)
    ));
}

#[test]
fn perspective_override_from_caller() {
    let dir = skin_dir(
        r#"{ "profiles": { "thumbnails": {
                "width": 50, "height": 50,
                "perspective": { "enabled": true, "top": 10, "bottom": 10, "direction": "right" } } } }"#,
    );
    let engine = engine(&dir);
    let media = MediaInfo::new("Alien");
    let img = base(50, 50);
    let target = ArtworkTarget::new(ArtworkKind::Thumbnail);

    let right = engine.render(&media, target, &img, None);
    assert_eq!(right.dimensions(), (50, 50));
    assert_eq!(right.get_pixel(49, 1)[3], 0);
    assert_eq!(right.get_pixel(0, 1)[3], 255);

    let left = engine.render(
        &media,
        target,
        &img,
        Some(marquee_renderer::PerspectiveDirection::Left),
    );
    assert_eq!(left.get_pixel(0, 1)[3], 0);
    assert_eq!(left.get_pixel(49, 1)[3], 255);
}

#[test]
fn skin_with_runaway_corner_quality_is_rejected() {
    let err = SkinLoader::new()
        .load_str(
            r#"{ "profiles": { "posters": {
                    "roundCorners": true, "cornerRadius": 10, "cornerQuality": 200000000 } } }"#,
        )
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }), "{err}");
}
