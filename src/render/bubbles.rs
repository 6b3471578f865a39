use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};

use crate::city::{AggregationReport, CityAggregate};
use crate::models::MediaKind;

/// One city circle on the map, placed at the centroid of its matched points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityBubble {
    pub name: String,
    pub count: usize,
    pub photos: usize,
    pub videos: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub population: Option<u64>,
    pub lat: f64,
    pub lon: f64,
    /// Marker radius in pixels
    pub radius: f64,
    pub label: String,
}

/// Log-scaled marker radius so large cities don't swamp the map
pub fn bubble_radius(count: usize) -> f64 {
    10.0 + 2.0 * (1.0 + count as f64).ln()
}

/// "Paris (3 photos, 1 video)"; points of unknown kind are counted as points
pub fn bubble_label(city: &CityAggregate) -> String {
    let mut parts = Vec::new();
    for (kind, n) in [(MediaKind::Photo, city.photos), (MediaKind::Video, city.videos)] {
        if n > 0 {
            parts.push(format!("{} {}", n, kind.noun(n)));
        }
    }
    let other = city.count.saturating_sub(city.photos + city.videos);
    if other > 0 {
        parts.push(format!("{} {}", other, if other == 1 { "point" } else { "points" }));
    }
    if parts.is_empty() {
        return city.city_name.clone();
    }
    format!("{} ({})", city.city_name, parts.join(", "))
}

/// Bubbles ordered by count descending, then name
pub fn bubbles_from_report(report: &AggregationReport) -> Vec<CityBubble> {
    report
        .by_count()
        .into_iter()
        .map(|city| {
            let (lat, lon) = city.centroid();
            CityBubble {
                name: city.city_name.clone(),
                count: city.count,
                photos: city.photos,
                videos: city.videos,
                country: city.country.clone(),
                population: city.population,
                lat,
                lon,
                radius: bubble_radius(city.count),
                label: bubble_label(city),
            }
        })
        .collect()
}

fn bubbles_geojson(bubbles: &[CityBubble]) -> Value {
    let features: Vec<Value> = bubbles
        .iter()
        .map(|b| {
            json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [b.lon, b.lat] },
                "properties": {
                    "name": b.name,
                    "country": b.country,
                    "count": b.count,
                    "photos": b.photos,
                    "videos": b.videos,
                    "radius": b.radius,
                    "label": b.label,
                },
            })
        })
        .collect();

    json!({ "type": "FeatureCollection", "features": features })
}

pub fn write_bubbles_geojson(path: &Path, bubbles: &[CityBubble]) -> Result<()> {
    let text = serde_json::to_string_pretty(&bubbles_geojson(bubbles))?;
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

#[derive(Serialize)]
struct Summary<'a> {
    matched: usize,
    unmatched: usize,
    skipped: usize,
    cities: &'a [CityBubble],
}

/// Totals plus the per-city table as JSON
pub fn write_summary_json(path: &Path, report: &AggregationReport, bubbles: &[CityBubble]) -> Result<()> {
    let summary = Summary {
        matched: report.matched,
        unmatched: report.unmatched,
        skipped: report.skipped,
        cities: bubbles,
    };
    let text = serde_json::to_string_pretty(&summary)?;
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}
