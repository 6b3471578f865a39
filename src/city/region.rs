//! Rectangular region of interest.

use serde::{Deserialize, Serialize};

use crate::error::{AtlasError, Result};

/// Closed lat/lon bounding box. Points on the boundary are inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Region {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Region {
    /// Build a region, rejecting inverted or non-finite bounds
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Result<Self> {
        let region = Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        };
        region.validate()?;
        Ok(region)
    }

    /// Continental Europe: lat [35, 71], lon [-25, 45]
    pub const fn europe() -> Self {
        Self {
            min_lat: 35.0,
            max_lat: 71.0,
            min_lon: -25.0,
            max_lon: 45.0,
        }
    }

    /// The whole globe
    pub const fn world() -> Self {
        Self {
            min_lat: -90.0,
            max_lat: 90.0,
            min_lon: -180.0,
            max_lon: 180.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let bounds = [self.min_lat, self.max_lat, self.min_lon, self.max_lon];
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(AtlasError::InvalidRegion(format!(
                "non-finite bound in {:?}",
                self
            )));
        }
        if self.min_lat > self.max_lat || self.min_lon > self.max_lon {
            return Err(AtlasError::InvalidRegion(format!(
                "minimum exceeds maximum in {:?}",
                self
            )));
        }
        Ok(())
    }

    /// Inclusive containment test. NaN coordinates are never inside.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::europe()
    }
}
