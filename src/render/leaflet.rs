//! Standalone Leaflet page with city bubbles and optional photo markers.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::CityBubble;
use crate::models::GeoPoint;

const LEAFLET_VERSION: &str = "1.9.4";
const TILE_URL: &str = "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png";
const TILE_ATTRIBUTION: &str =
    "&copy; OpenStreetMap contributors &copy; CARTO";

/// View settings for the generated map
#[derive(Debug, Clone)]
pub struct MapOptions {
    pub title: String,
    /// Initial center as (lat, lon)
    pub center: (f64, f64),
    pub zoom: u8,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            title: "City bubbles".to_string(),
            center: (54.0, 15.0),
            zoom: 4,
        }
    }
}

/// Bubble as drawn on the map, with label markup already escaped
#[derive(Serialize)]
struct MapBubble {
    lat: f64,
    lon: f64,
    radius: f64,
    label: String,
    popup: String,
}

impl MapBubble {
    fn new(bubble: &CityBubble) -> Self {
        let label = html_escape(&bubble.label);
        let popup = match &bubble.country {
            Some(country) => format!("{}<br>{}", label, html_escape(country)),
            None => label.clone(),
        };
        Self {
            lat: bubble.lat,
            lon: bubble.lon,
            radius: bubble.radius,
            label,
            popup,
        }
    }
}

#[derive(Serialize)]
struct MarkerPoint {
    lat: f64,
    lon: f64,
}

/// Serialize for embedding inside a `<script>` block
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn render_map_html(bubbles: &[CityBubble], markers: &[GeoPoint], options: &MapOptions) -> Result<String> {
    let bubble_data = script_json(&bubbles.iter().map(MapBubble::new).collect::<Vec<_>>())?;
    let marker_data = script_json(
        &markers
            .iter()
            .map(|p| MarkerPoint { lat: p.lat, lon: p.lon })
            .collect::<Vec<_>>(),
    )?;

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<meta name="viewport" content="width=device-width, initial-scale=1">
<link rel="stylesheet" href="https://unpkg.com/leaflet@{version}/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@{version}/dist/leaflet.js"></script>
<style>
  html, body, #map {{ height: 100%; margin: 0; }}
  .city-label {{ font: 12px sans-serif; color: #333; white-space: nowrap; }}
</style>
</head>
<body>
<div id="map"></div>
<script>
const map = L.map('map').setView([{lat}, {lon}], {zoom});
L.tileLayer('{tiles}', {{ attribution: '{attribution}', subdomains: 'abcd', maxZoom: 19 }}).addTo(map);

const markers = {marker_data};
for (const m of markers) {{
  L.circleMarker([m.lat, m.lon], {{ radius: 2, color: 'red', fillColor: 'red', fillOpacity: 0.8, weight: 0 }}).addTo(map);
}}

const bubbles = {bubble_data};
for (const b of bubbles) {{
  L.circleMarker([b.lat, b.lon], {{ radius: b.radius, color: 'crimson', fillColor: 'crimson', fillOpacity: 0.5, weight: 1 }})
    .bindPopup(b.popup)
    .addTo(map);
  L.marker([b.lat, b.lon], {{
    icon: L.divIcon({{ className: 'city-label', html: b.label, iconAnchor: [-b.radius, 6] }}),
    interactive: false,
  }}).addTo(map);
}}
</script>
</body>
</html>
"#,
        title = html_escape(&options.title),
        version = LEAFLET_VERSION,
        lat = options.center.0,
        lon = options.center.1,
        zoom = options.zoom,
        tiles = TILE_URL,
        attribution = TILE_ATTRIBUTION,
        marker_data = marker_data,
        bubble_data = bubble_data,
    ))
}

pub fn write_map_html(
    path: &Path,
    bubbles: &[CityBubble],
    markers: &[GeoPoint],
    options: &MapOptions,
) -> Result<()> {
    let html = render_map_html(bubbles, markers, options)?;
    fs::write(path, html).with_context(|| format!("Failed to write {}", path.display()))
}
