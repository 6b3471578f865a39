//! Media discovery and per-file metadata extraction.
//!
//! Capture time and GPS come from EXIF for JPEG files (via `kamadak-exif`) and
//! from container tags for videos (via `ffprobe`). PNG files only carry their
//! modification time.

mod photo;
mod video;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::models::{MediaKind, MediaRecord};

pub use photo::ExifData;
pub use video::{ffprobe_available, parse_iso6709, VideoTags};

/// List supported media files under the given folders, sorted by path.
///
/// Only the top level of each folder is scanned unless `recursive` is set.
/// Missing folders are logged and skipped.
pub fn discover_media(folders: &[PathBuf], recursive: bool) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for folder in folders {
        if !folder.is_dir() {
            warn!("Media folder not found: {}", folder.display());
            continue;
        }

        let walker = WalkDir::new(folder).follow_links(true).min_depth(1);
        let walker = if recursive { walker } else { walker.max_depth(1) };

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Error walking {}: {}", folder.display(), e);
                    continue;
                }
            };
            let path = entry.path();
            if path.is_file() && MediaKind::from_path(path).is_some() {
                files.push(path.to_path_buf());
            }
        }
    }

    files.sort();
    files.dedup();
    info!("Discovered {} media files", files.len());
    files
}

/// Extract capture time and location for one file.
///
/// Returns None for unsupported files and for files without any capture time.
pub fn extract_record(path: &Path) -> Option<MediaRecord> {
    let kind = MediaKind::from_path(path)?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let record = match (kind, ext.as_str()) {
        (MediaKind::Photo, "png") => {
            let taken_at = modified_time(path)?;
            MediaRecord::new(path, kind, taken_at)
        }
        (MediaKind::Photo, _) => {
            let exif = ExifData::read(path);
            let taken_at = match exif.as_ref().and_then(|e| e.taken_at) {
                Some(t) => t,
                None => {
                    debug!("No EXIF date for {}, falling back to mod time", path.display());
                    modified_time(path)?
                }
            };
            let mut record = MediaRecord::new(path, kind, taken_at);
            if let Some(exif) = exif {
                record.latitude = exif.latitude;
                record.longitude = exif.longitude;
                record.altitude = exif.altitude;
            }
            record
        }
        (MediaKind::Video, _) => {
            let tags = match VideoTags::probe(path) {
                Ok(tags) => tags,
                Err(e) => {
                    warn!("Failed to probe {}: {:#}", path.display(), e);
                    return None;
                }
            };
            let Some(taken_at) = tags.creation_time else {
                info!("Skipping {}: no creation time found", path.display());
                return None;
            };
            let mut record = MediaRecord::new(path, kind, taken_at);
            if let Some(location) = tags.location {
                record.latitude = Some(location.lat);
                record.longitude = Some(location.lon);
                record.altitude = location.alt;
            }
            record
        }
    };

    Some(record)
}

/// File modification time as naive local time, the same clock EXIF dates use
fn modified_time(path: &Path) -> Option<NaiveDateTime> {
    match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(t) => Some(DateTime::<Local>::from(t).naive_local()),
        Err(e) => {
            warn!("Failed to get mod time for {}: {}", path.display(), e);
            None
        }
    }
}
