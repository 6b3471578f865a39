//! Geographic points, gazetteer places and resolution results.

use serde::{Deserialize, Serialize};

/// Geographic point (lat/lon in degrees, optional altitude in meters)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<f64>,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            alt: None,
        }
    }

    pub fn with_altitude(mut self, alt: Option<f64>) -> Self {
        self.alt = alt;
        self
    }

    /// True when both coordinates are finite and inside geographic bounds
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// A named populated place from the gazetteer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPlace {
    pub name: String,
    pub lat: f64,
    pub lon: f64,

    /// Country name, when the dataset carries one (display only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// Population estimate, when the dataset carries one (display only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub population: Option<u64>,
}

impl NamedPlace {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
            country: None,
            population: None,
        }
    }
}

/// Result of resolving one point against the gazetteer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityMatch {
    pub place_name: String,
    /// Planar distance in meters, never negative
    pub distance_meters: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub population: Option<u64>,
}
