//! Media records produced by metadata extraction.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::GeoPoint;

/// Kind of media file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    /// Classify a file by extension. Returns None for unsupported files.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" | "png" => Some(MediaKind::Photo),
            "mp4" | "mov" => Some(MediaKind::Video),
            _ => None,
        }
    }

    pub fn noun(&self, count: usize) -> &'static str {
        match (self, count) {
            (MediaKind::Photo, 1) => "photo",
            (MediaKind::Photo, _) => "photos",
            (MediaKind::Video, 1) => "video",
            (MediaKind::Video, _) => "videos",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Photo => write!(f, "photo"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Metadata extracted from one media file.
///
/// Capture time is naive: EXIF dates and file modification times are local
/// wall-clock time, video creation times are UTC as the container stores them.
/// Coordinates are independent options because extractors can produce partial data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRecord {
    pub path: PathBuf,
    pub filename: String,
    pub kind: MediaKind,
    pub taken_at: NaiveDateTime,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
}

impl MediaRecord {
    pub fn new(path: &Path, kind: MediaKind, taken_at: NaiveDateTime) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path: path.to_path_buf(),
            filename,
            kind,
            taken_at,
            latitude: None,
            longitude: None,
            altitude: None,
        }
    }

    /// Location of this record, if both latitude and longitude are present
    pub fn geo_point(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon).with_altitude(self.altitude)),
            _ => None,
        }
    }
}
