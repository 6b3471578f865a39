//! Video container tags via `ffprobe`.

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime};
use regex::Regex;
use serde::Deserialize;

use crate::models::GeoPoint;

/// Tag keys that carry an ISO 6709 location, most specific first
const LOCATION_TAGS: &[&str] = &[
    "com.apple.quicktime.location.ISO6709",
    "location",
    "location-eng",
];

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: ProbeFormat,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeFormat {
    #[serde(default)]
    tags: HashMap<String, String>,
}

/// Capture time and location read from a video container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoTags {
    /// Naive UTC
    pub creation_time: Option<NaiveDateTime>,
    pub location: Option<GeoPoint>,
}

impl VideoTags {
    /// Run ffprobe on a file and read its format tags
    pub fn probe(path: &Path) -> Result<Self> {
        let output = Command::new("ffprobe")
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-i"])
            .arg(path)
            .output()
            .context("Failed to run ffprobe")?;

        if !output.status.success() {
            anyhow::bail!("ffprobe exited with {}", output.status);
        }

        Self::from_json(&String::from_utf8_lossy(&output.stdout))
    }

    /// Parse ffprobe's JSON output
    pub fn from_json(json: &str) -> Result<Self> {
        let parsed: ProbeOutput =
            serde_json::from_str(json).context("Failed to parse ffprobe output")?;
        let tags = parsed.format.tags;

        let creation_time = tags
            .get("creation_time")
            .and_then(|t| DateTime::parse_from_rfc3339(t.trim()).ok())
            .map(|t| t.naive_utc());

        let location = LOCATION_TAGS
            .iter()
            .filter_map(|key| tags.get(*key))
            .find_map(|value| parse_iso6709(value));

        Ok(Self {
            creation_time,
            location,
        })
    }
}

/// Parse an ISO 6709 point such as `+48.8566+002.3522+035.000/`
pub fn parse_iso6709(value: &str) -> Option<GeoPoint> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^([+-]\d+(?:\.\d+)?)([+-]\d+(?:\.\d+)?)([+-]\d+(?:\.\d+)?)?(?:CRS[^/]*)?/?$")
            .expect("valid ISO 6709 pattern")
    });

    let caps = pattern.captures(value.trim())?;
    let lat: f64 = caps.get(1)?.as_str().parse().ok()?;
    let lon: f64 = caps.get(2)?.as_str().parse().ok()?;
    let alt = caps.get(3).and_then(|m| m.as_str().parse::<f64>().ok());

    Some(GeoPoint::new(lat, lon).with_altitude(alt))
}

/// Check if ffprobe is available on the system
pub fn ffprobe_available() -> bool {
    Command::new("ffprobe")
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
