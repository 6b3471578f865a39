//! EXIF capture time and GPS for still images.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDateTime;
use exif::{In, Reader, Tag, Value};
use tracing::debug;

/// Date tags in order of preference
const DATE_TAGS: [Tag; 3] = [Tag::DateTimeOriginal, Tag::DateTime, Tag::DateTimeDigitized];

/// EXIF fields relevant to the atlas
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifData {
    pub taken_at: Option<NaiveDateTime>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
}

impl ExifData {
    /// Read EXIF from an image file. Returns None if the file has no readable EXIF.
    pub fn read(path: &Path) -> Option<Self> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                debug!("Cannot open {}: {}", path.display(), e);
                return None;
            }
        };
        let mut reader = BufReader::new(file);

        let exif = match Reader::new().read_from_container(&mut reader) {
            Ok(exif) => exif,
            Err(e) => {
                debug!("No EXIF in {}: {}", path.display(), e);
                return None;
            }
        };

        let taken_at = DATE_TAGS
            .iter()
            .filter_map(|tag| exif.get_field(*tag, In::PRIMARY))
            .find_map(|field| match &field.value {
                Value::Ascii(values) => values
                    .first()
                    .and_then(|raw| std::str::from_utf8(raw).ok())
                    .and_then(parse_exif_datetime),
                _ => None,
            });

        let (latitude, longitude) = match (
            coordinate(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, 'S'),
            coordinate(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, 'W'),
        ) {
            (Some(lat), Some(lon)) => (Some(lat), Some(lon)),
            _ => (None, None),
        };

        let altitude = exif
            .get_field(Tag::GPSAltitude, In::PRIMARY)
            .and_then(|f| match &f.value {
                Value::Rational(v) if !v.is_empty() => Some(v[0].to_f64()),
                _ => None,
            })
            .filter(|alt| alt.is_finite())
            .map(|alt| {
                let below_sea_level = exif
                    .get_field(Tag::GPSAltitudeRef, In::PRIMARY)
                    .and_then(|f| f.value.get_uint(0))
                    == Some(1);
                if below_sea_level {
                    -alt
                } else {
                    alt
                }
            });

        Some(Self {
            taken_at,
            latitude,
            longitude,
            altitude,
        })
    }
}

/// Signed decimal degrees from a DMS rational triple and its hemisphere reference
fn coordinate(exif: &exif::Exif, value_tag: Tag, ref_tag: Tag, negative_ref: char) -> Option<f64> {
    let field = exif.get_field(value_tag, In::PRIMARY)?;
    let degrees = match &field.value {
        Value::Rational(v) if v.len() >= 3 => dms_to_degrees(v[0].to_f64(), v[1].to_f64(), v[2].to_f64())?,
        _ => return None,
    };

    let negative = exif
        .get_field(ref_tag, In::PRIMARY)
        .map(|r| r.display_value().to_string().contains(negative_ref))
        .unwrap_or(false);

    Some(if negative { -degrees } else { degrees })
}

fn dms_to_degrees(degrees: f64, minutes: f64, seconds: f64) -> Option<f64> {
    let value = degrees + minutes / 60.0 + seconds / 3600.0;
    value.is_finite().then_some(value)
}

/// Parse an EXIF datetime ("2024:01:15 10:30:45")
fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_matches('"').trim_end_matches('\0');
    NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_dms_to_degrees() {
        // 48° 51' 23.76"
        assert_abs_diff_eq!(dms_to_degrees(48.0, 51.0, 23.76).unwrap(), 48.8566, epsilon = 1e-9);
        // Rational with zero denominator
        assert!(dms_to_degrees(f64::NAN, 0.0, 0.0).is_none());
        assert!(dms_to_degrees(1.0, f64::INFINITY, 0.0).is_none());
    }

    #[test]
    fn test_parse_exif_datetime() {
        let dt = parse_exif_datetime("2024:01:15 10:30:45").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 1, 15));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (10, 30, 45));

        assert!(parse_exif_datetime("\"2024:01:15 10:30:45\"").is_some());
        assert!(parse_exif_datetime("0000:00:00 00:00:00").is_none());
        assert!(parse_exif_datetime("2024-01-15T10:30:45").is_none());
    }

    #[test]
    fn test_read_missing_file() {
        assert!(ExifData::read(Path::new("/nonexistent/img.jpg")).is_none());
    }
}
