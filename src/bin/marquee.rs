use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use marquee_renderer::{ArtworkEngine, ArtworkTarget, MediaInfo, PerspectiveDirection, SkinLoader};

/// Decorate one piece of artwork with a skin.
#[derive(Parser, Debug)]
#[command(name = "marquee", version)]
struct Cli {
    /// Skin JSON document.
    #[arg(long)]
    skin: PathBuf,

    /// Overrides the skin's resources directory.
    #[arg(long)]
    resources: Option<PathBuf>,

    /// Media metadata JSON.
    #[arg(long)]
    media: PathBuf,

    /// Artwork target, e.g. `posters`, `thumbnails`, `videoimages2`, `footerbanners`.
    #[arg(long, default_value = "posters")]
    target: ArtworkTarget,

    /// Base image.
    #[arg(long)]
    input: PathBuf,

    /// Output image; the format follows the extension.
    #[arg(long)]
    output: PathBuf,

    /// Perspective direction (`left` or `right`), overriding the profile.
    #[arg(long)]
    perspective: Option<PerspectiveDirection>,

    /// Fall back to the legacy logos when a layer set is invalid.
    #[arg(long)]
    degrade: bool,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut loader = SkinLoader::new().degrade_on_error(cli.degrade);
    if let Some(dir) = &cli.resources {
        loader = loader.resources(dir);
    }
    let engine = ArtworkEngine::from_file(&loader, &cli.skin)
        .with_context(|| format!("load skin '{}'", cli.skin.display()))?;

    let json = std::fs::read_to_string(&cli.media)
        .with_context(|| format!("read media '{}'", cli.media.display()))?;
    let media = MediaInfo::from_json(&json)
        .with_context(|| format!("parse media '{}'", cli.media.display()))?;

    let base = image::open(&cli.input)
        .with_context(|| format!("open image '{}'", cli.input.display()))?;

    let mut out = engine.render(&media, cli.target, &base, cli.perspective);
    let jpeg = cli
        .output
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"));
    if jpeg {
        out = image::DynamicImage::ImageRgb8(out.to_rgb8());
    }
    out.save(&cli.output)
        .with_context(|| format!("write image '{}'", cli.output.display()))?;

    tracing::info!(output = %cli.output.display(), "wrote artwork");
    Ok(())
}
