use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::city::{Region, DEFAULT_MAX_DISTANCE_KM, DEFAULT_NAME_FIELD};

/// Natural Earth 1:10m populated places, GeoJSON edition
pub const DEFAULT_GAZETTEER_URL: &str = "https://raw.githubusercontent.com/nvkelso/natural-earth-vector/master/geojson/ne_10m_populated_places.geojson";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub gazetteer: GazetteerConfig,
    pub region: Region,
    pub resolver: ResolverConfig,
    pub media: MediaConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GazetteerConfig {
    pub path: PathBuf,
    pub url: String,
    pub name_field: String,
}

impl Default for GazetteerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("assets/ne_10m_populated_places.geojson"),
            url: DEFAULT_GAZETTEER_URL.to_string(),
            name_field: DEFAULT_NAME_FIELD.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ResolverConfig {
    pub max_distance_km: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_distance_km: DEFAULT_MAX_DISTANCE_KM,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct MediaConfig {
    pub folders: Vec<PathBuf>,
    /// Descend into subdirectories
    pub recursive: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Ignore media taken before this date in the daily timeline
    pub timeline_since: Option<NaiveDate>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            timeline_since: None,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.region.validate()?;
        let cutoff = self.resolver.max_distance_km;
        if !cutoff.is_finite() || cutoff < 0.0 {
            anyhow::bail!("max_distance_km must be a non-negative number, got {}", cutoff);
        }
        Ok(())
    }
}
