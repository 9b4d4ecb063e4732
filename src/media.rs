//! Read-only view of the media metadata consumed by the attribute resolver.
//!
//! Metadata gathering lives outside this crate. Callers either implement
//! [`MediaMetadataView`] over their own model or fill a [`MediaInfo`], which
//! deserializes from camelCase JSON.

use serde::{Deserialize, Serialize};

// ============================================================================
// Supporting records
// ============================================================================

/// One audio stream of the main video file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTrack {
    pub codec: String,
    #[serde(default)]
    pub channels: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// One physical video file belonging to the media item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    #[serde(default)]
    pub watched: bool,
    #[serde(default = "default_part")]
    pub first_part: u32,
    #[serde(default = "default_part")]
    pub last_part: u32,
}

fn default_part() -> u32 {
    1
}

/// An award ceremony with the awards won and the nominations received there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardEvent {
    pub name: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub wins: Vec<String>,
    #[serde(default)]
    pub nominations: Vec<String>,
}

// ============================================================================
// MediaMetadataView
// ============================================================================

/// Accessors the attribute resolver reads from a media item.
///
/// Absent data is expressed with `None` or an empty slice; the resolver maps
/// it to the `UNKNOWN` sentinel.
pub trait MediaMetadataView {
    fn title(&self) -> &str;
    fn season(&self) -> Option<i32>;
    fn is_tv_show(&self) -> bool;
    fn is_hd(&self) -> bool;
    fn is_hd1080(&self) -> bool;
    fn subtitles(&self) -> &[String];
    fn languages(&self) -> &[String];
    /// Rating on a 0-100 scale.
    fn rating(&self) -> Option<i32>;
    fn video_source(&self) -> Option<&str>;
    fn video_output(&self) -> Option<&str>;
    fn video_codec(&self) -> Option<&str>;
    fn audio_tracks(&self) -> &[AudioTrack];
    fn container(&self) -> Option<&str>;
    fn aspect_ratio(&self) -> Option<&str>;
    fn fps(&self) -> Option<f32>;
    fn certification(&self) -> Option<&str>;
    /// Aggregate watched flag of the whole item.
    fn is_watched(&self) -> bool;
    fn files(&self) -> &[MediaFile];
    fn top250(&self) -> Option<u32>;
    fn countries(&self) -> &[String];
    fn companies(&self) -> &[String];
    fn awards(&self) -> &[AwardEvent];
    fn is_set_master(&self) -> bool;
    fn set_size(&self) -> u32;
    /// File name without extension, only used for keyword matching.
    fn base_filename(&self) -> &str;
}

// ============================================================================
// MediaInfo
// ============================================================================

/// Plain metadata record implementing [`MediaMetadataView`].
///
/// # JSON Format
///
/// ```json
/// {
///   "title": "Firefly",
///   "tvShow": true,
///   "hd": true,
///   "audioTracks": [{ "codec": "AC3", "channels": "6", "language": "English" }],
///   "files": [{ "watched": true, "firstPart": 1, "lastPart": 2 }]
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaInfo {
    pub title: String,
    pub season: Option<i32>,
    pub tv_show: bool,
    pub hd: bool,
    pub hd1080: bool,
    pub subtitles: Vec<String>,
    pub languages: Vec<String>,
    pub rating: Option<i32>,
    pub video_source: Option<String>,
    pub video_output: Option<String>,
    pub video_codec: Option<String>,
    pub audio_tracks: Vec<AudioTrack>,
    pub container: Option<String>,
    pub aspect_ratio: Option<String>,
    pub fps: Option<f32>,
    pub certification: Option<String>,
    pub watched: bool,
    pub files: Vec<MediaFile>,
    pub top250: Option<u32>,
    pub countries: Vec<String>,
    pub companies: Vec<String>,
    pub awards: Vec<AwardEvent>,
    pub set_master: bool,
    pub set_size: u32,
    pub base_filename: String,
}

impl MediaInfo {
    /// Creates an empty record with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Deserializes a record from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl MediaMetadataView for MediaInfo {
    fn title(&self) -> &str {
        &self.title
    }

    fn season(&self) -> Option<i32> {
        self.season
    }

    fn is_tv_show(&self) -> bool {
        self.tv_show
    }

    fn is_hd(&self) -> bool {
        self.hd
    }

    fn is_hd1080(&self) -> bool {
        self.hd1080
    }

    fn subtitles(&self) -> &[String] {
        &self.subtitles
    }

    fn languages(&self) -> &[String] {
        &self.languages
    }

    fn rating(&self) -> Option<i32> {
        self.rating
    }

    fn video_source(&self) -> Option<&str> {
        self.video_source.as_deref()
    }

    fn video_output(&self) -> Option<&str> {
        self.video_output.as_deref()
    }

    fn video_codec(&self) -> Option<&str> {
        self.video_codec.as_deref()
    }

    fn audio_tracks(&self) -> &[AudioTrack] {
        &self.audio_tracks
    }

    fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    fn aspect_ratio(&self) -> Option<&str> {
        self.aspect_ratio.as_deref()
    }

    fn fps(&self) -> Option<f32> {
        self.fps
    }

    fn certification(&self) -> Option<&str> {
        self.certification.as_deref()
    }

    fn is_watched(&self) -> bool {
        self.watched
    }

    fn files(&self) -> &[MediaFile] {
        &self.files
    }

    fn top250(&self) -> Option<u32> {
        self.top250
    }

    fn countries(&self) -> &[String] {
        &self.countries
    }

    fn companies(&self) -> &[String] {
        &self.companies
    }

    fn awards(&self) -> &[AwardEvent] {
        &self.awards
    }

    fn is_set_master(&self) -> bool {
        self.set_master
    }

    fn set_size(&self) -> u32 {
        self.set_size
    }

    fn base_filename(&self) -> &str {
        &self.base_filename
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_info_from_camel_case_json() {
        let json = r#"{
            "title": "Firefly",
            "tvShow": true,
            "hd1080": true,
            "audioTracks": [{ "codec": "DTS", "language": "English" }],
            "files": [{ "watched": true, "lastPart": 3 }]
        }"#;
        let media = MediaInfo::from_json(json).unwrap();

        assert!(media.is_tv_show());
        assert!(media.is_hd1080());
        assert!(!media.is_hd());
        assert_eq!(media.audio_tracks()[0].channels, None);
        assert_eq!(media.files()[0].first_part, 1);
        assert_eq!(media.files()[0].last_part, 3);
    }

    #[test]
    fn empty_json_is_default() {
        let media = MediaInfo::from_json("{}").unwrap();
        assert!(media.title().is_empty());
        assert!(media.awards().is_empty());
        assert_eq!(media.rating(), None);
    }
}
