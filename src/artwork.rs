//! Artwork kinds and render targets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TargetParseError;

/// Raster category being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtworkKind {
    Poster,
    Thumbnail,
    Banner,
    VideoImage,
}

impl ArtworkKind {
    pub const ALL: [ArtworkKind; 4] = [
        ArtworkKind::Poster,
        ArtworkKind::Thumbnail,
        ArtworkKind::Banner,
        ArtworkKind::VideoImage,
    ];

    /// Key of this kind in the skin's `profiles` table and in overlay file names.
    pub fn key(self) -> &'static str {
        match self {
            Self::Poster => "posters",
            Self::Thumbnail => "thumbnails",
            Self::Banner => "banners",
            Self::VideoImage => "videoimages",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

impl fmt::Display for ArtworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A concrete render request: the kind plus the footer flag and video file index.
///
/// Parsed from strings like `posters`, `videoimages3` (third video file) or
/// `footerbanners`. A bare `footer` is a banner-class footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArtworkTarget {
    pub kind: ArtworkKind,
    pub footer: bool,
    /// Zero-based file index for video images.
    pub video_index: usize,
}

impl ArtworkTarget {
    pub fn new(kind: ArtworkKind) -> Self {
        Self {
            kind,
            footer: false,
            video_index: 0,
        }
    }

    pub fn video_image(index: usize) -> Self {
        Self {
            kind: ArtworkKind::VideoImage,
            footer: false,
            video_index: index,
        }
    }

    pub fn footer(kind: ArtworkKind) -> Self {
        Self {
            kind,
            footer: true,
            video_index: 0,
        }
    }

    /// Banner-class targets get the title/season text stage.
    pub fn is_banner_class(&self) -> bool {
        self.kind == ArtworkKind::Banner
    }
}

impl From<ArtworkKind> for ArtworkTarget {
    fn from(kind: ArtworkKind) -> Self {
        Self::new(kind)
    }
}

impl FromStr for ArtworkTarget {
    type Err = TargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let (footer, rest) = match lowered.strip_prefix("footer") {
            Some("") => return Ok(Self::footer(ArtworkKind::Banner)),
            Some(rest) => (true, rest),
            None => (false, lowered.as_str()),
        };

        if let Some(kind) = ArtworkKind::from_key(rest) {
            return Ok(Self {
                kind,
                footer,
                video_index: 0,
            });
        }

        let digits = rest
            .strip_prefix(ArtworkKind::VideoImage.key())
            .filter(|d| !d.is_empty() && !footer)
            .ok_or_else(|| TargetParseError(s.to_string()))?;
        let number: usize = digits
            .parse()
            .map_err(|_| TargetParseError(s.to_string()))?;
        Ok(Self::video_image(number.saturating_sub(1)))
    }
}
