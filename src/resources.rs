//! Overlay image loading from a skin's resources directory.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use tracing::warn;

use crate::error::ResourceError;

/// Reads overlay PNGs relative to a resources root.
#[derive(Debug, Clone)]
pub struct ResourceStore {
    root: PathBuf,
}

impl ResourceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).is_file()
    }

    /// Loads and decodes an image as RGBA.
    pub fn load(&self, relative: &str) -> Result<RgbaImage, ResourceError> {
        let path = self.path(relative);
        if !path.is_file() {
            return Err(ResourceError::Missing(path));
        }
        match image::open(&path) {
            Ok(img) => Ok(img.to_rgba8()),
            Err(source) => Err(ResourceError::Decode { path, source }),
        }
    }

    /// Loads an image, logging and swallowing any failure.
    pub fn load_or_warn(&self, relative: &str) -> Option<RgbaImage> {
        match self.load(relative) {
            Ok(img) => Some(img),
            Err(err) => {
                warn!(resource = relative, error = %err, "skipping overlay image");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn loads_png_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("languages")).unwrap();
        RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]))
            .save(dir.path().join("languages/English.png"))
            .unwrap();

        let store = ResourceStore::new(dir.path());
        assert!(store.exists("languages/English.png"));
        let img = store.load("languages/English.png").unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(0, 0).0, [1, 2, 3, 255]);
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResourceStore::new(dir.path());
        let err = store.load("tv.png").unwrap_err();
        assert!(matches!(err, ResourceError::Missing(_)));
        assert!(err.to_string().starts_with("missing resource:"));
        assert!(store.load_or_warn("tv.png").is_none());
    }

    #[test]
    fn corrupt_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hd.png"), b"not a png").unwrap();
        let store = ResourceStore::new(dir.path());
        assert!(matches!(
            store.load("hd.png").unwrap_err(),
            ResourceError::Decode { .. }
        ));
    }
}
