use chrono::NaiveDateTime;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Format of the `Date` field in an export, e.g. `2024-03-15 10:00:00 UTC`
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Month code (`"01"`..`"12"`) to display name
const MONTH_NAMES: [(&str, &str); 12] = [
    ("01", "January"),
    ("02", "February"),
    ("03", "March"),
    ("04", "April"),
    ("05", "May"),
    ("06", "June"),
    ("07", "July"),
    ("08", "August"),
    ("09", "September"),
    ("10", "October"),
    ("11", "November"),
    ("12", "December"),
];

/// Top-level shape of a data export file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedMediaExport {
    #[serde(rename = "Saved Media")]
    pub saved_media: Vec<Memory>,
}

/// Whether a memory is a photo or a video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Only a case-insensitive `"video"` is a video; anything else is an image.
    pub fn classify(media_type: &str) -> Self {
        if media_type.eq_ignore_ascii_case("video") {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "jpg",
            MediaKind::Video => "mp4",
        }
    }
}

/// One saved media item from an export.
///
/// The serialized field names match the export schema, so the same type is used
/// for importing and for the persisted state file. `id` is generated when the
/// export doesn't carry one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Memory {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// `yyyy-MM-dd HH:mm:ss UTC`. Never validated; also the dedup key.
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Media Type")]
    pub media_type: String,
    /// Resolution endpoint: POST here to receive the real media URL
    #[serde(rename = "Download Link")]
    pub download_link: String,
    /// Newer exports include a direct URL that needs no resolution
    #[serde(
        rename = "Media Download Url",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub media_download_url: Option<String>,
}

impl Memory {
    pub fn new(date: &str, media_type: &str, download_link: &str) -> Self {
        Memory {
            id: Uuid::new_v4(),
            date: date.to_string(),
            media_type: media_type.to_string(),
            download_link: download_link.to_string(),
            media_download_url: None,
        }
    }

    pub fn with_media_download_url(mut self, url: &str) -> Self {
        self.media_download_url = Some(url.to_string());
        self
    }

    pub fn kind(&self) -> MediaKind {
        MediaKind::classify(&self.media_type)
    }

    pub fn is_video(&self) -> bool {
        self.kind() == MediaKind::Video
    }

    /// Key used by the local file index
    pub fn key(&self) -> &str {
        &self.date
    }

    /// First four characters of the date
    pub fn year(&self) -> String {
        self.date.chars().take(4).collect()
    }

    /// Month name for characters [5, 7) of the date.
    ///
    /// Codes outside the month table are returned verbatim; a date too short to
    /// contain a month yields whatever characters exist.
    pub fn month(&self) -> String {
        let code: String = self.date.chars().skip(5).take(2).collect();
        month_name(&code)
            .map(str::to_string)
            .unwrap_or(code)
    }

    /// Parsed date, if it follows the export format
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.date, DATE_FORMAT).ok()
    }

    /// Direct media URL, when present and valid
    pub fn direct_url(&self) -> Option<Url> {
        self.media_download_url
            .as_deref()
            .and_then(|url| Url::parse(url).ok())
    }

    /// Resolution endpoint, when valid
    pub fn download_link_url(&self) -> Option<Url> {
        Url::parse(&self.download_link).ok()
    }

    /// The direct URL if usable, otherwise the resolution endpoint
    pub fn effective_url(&self) -> Option<Url> {
        self.direct_url().or_else(|| self.download_link_url())
    }

    /// Deterministic on-disk file name: `2024-03-15_10-00-00_UTC.jpg`
    pub fn file_name(&self) -> String {
        let stem: String = self
            .date
            .chars()
            .map(|c| match c {
                ':' | '/' | '\\' => '-',
                ' ' => '_',
                other => other,
            })
            .collect();
        format!("{}.{}", stem, self.kind().extension())
    }

    pub fn local_path(&self, storage_dir: &Path) -> PathBuf {
        storage_dir.join(self.file_name())
    }
}

/// Look up the display name for a two-digit month code
pub fn month_name(code: &str) -> Option<&'static str> {
    MONTH_NAMES
        .iter()
        .find(|(number, _)| *number == code)
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_fields() {
        let memory = Memory::new("2024-03-15 10:00:00 UTC", "Image", "https://x/1");

        assert_eq!(memory.year(), "2024");
        assert_eq!(memory.month(), "March");
        assert_eq!(memory.file_name(), "2024-03-15_10-00-00_UTC.jpg");
        assert_eq!(memory.key(), "2024-03-15 10:00:00 UTC");
        assert!(memory.timestamp().is_some());
    }

    #[test]
    fn test_media_kind_classification() {
        assert_eq!(MediaKind::classify("Video"), MediaKind::Video);
        assert_eq!(MediaKind::classify("VIDEO"), MediaKind::Video);
        assert_eq!(MediaKind::classify("Image"), MediaKind::Image);
        assert_eq!(MediaKind::classify("gif"), MediaKind::Image);
        assert_eq!(MediaKind::classify(""), MediaKind::Image);

        let video = Memory::new("2023-12-01 08:30:00 UTC", "video", "https://x/2");
        assert_eq!(video.file_name(), "2023-12-01_08-30-00_UTC.mp4");
    }

    #[test]
    fn test_malformed_dates_still_group() {
        let unknown_month = Memory::new("2024-13-01 00:00:00 UTC", "Image", "https://x/1");
        assert_eq!(unknown_month.month(), "13");
        assert!(unknown_month.timestamp().is_none());

        let short = Memory::new("20", "Image", "https://x/1");
        assert_eq!(short.year(), "20");
        assert_eq!(short.month(), "");
    }

    #[test]
    fn test_effective_url_prefers_direct_url() {
        let memory = Memory::new("2024-03-15 10:00:00 UTC", "Video", "https://resolve/1")
            .with_media_download_url("https://cdn/1.mp4");
        assert_eq!(
            memory.effective_url().unwrap().as_str(),
            "https://cdn/1.mp4"
        );

        let invalid_direct = Memory::new("2024-03-15 10:00:00 UTC", "Video", "https://resolve/1")
            .with_media_download_url("not a url");
        assert_eq!(
            invalid_direct.effective_url().unwrap().as_str(),
            "https://resolve/1"
        );

        let neither = Memory::new("2024-03-15 10:00:00 UTC", "Video", "::");
        assert!(neither.effective_url().is_none());
    }

    #[test]
    fn test_file_name_replaces_path_separators() {
        let memory = Memory::new("2024/03/15 10:00:00 UTC", "Image", "https://x/1");
        assert_eq!(memory.file_name(), "2024-03-15_10-00-00_UTC.jpg");
    }

    #[test]
    fn test_persisted_shape_omits_missing_direct_url() {
        let memory = Memory::new("2024-03-15 10:00:00 UTC", "Image", "https://x/1");
        let json = serde_json::to_value(&memory).unwrap();

        assert!(json.get("id").is_some());
        assert_eq!(json["Date"], "2024-03-15 10:00:00 UTC");
        assert_eq!(json["Media Type"], "Image");
        assert_eq!(json["Download Link"], "https://x/1");
        assert!(json.get("Media Download Url").is_none());
    }
}
