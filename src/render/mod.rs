//! Map and summary outputs built from an aggregation report.

mod bubbles;
mod leaflet;

pub use bubbles::{
    bubble_label, bubble_radius, bubbles_from_report, write_bubbles_geojson, write_summary_json,
    CityBubble,
};
pub use leaflet::{render_map_html, write_map_html, MapOptions};
