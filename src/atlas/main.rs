//! Media atlas.
//!
//! Scans photo and video folders, resolves every geotagged file to its nearest
//! city and writes the bubble map, summary and timeline outputs.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use mediamap::city::{aggregate_par, Gazetteer, LambertAzimuthalEqualArea, Resolver};
use mediamap::config::Config;
use mediamap::extract::{discover_media, extract_record, ffprobe_available};
use mediamap::models::{GeoPoint, MediaKind, MediaRecord};
use mediamap::provision::ensure_gazetteer;
use mediamap::render::{self, MapOptions};
use mediamap::timeline;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "atlas")]
#[command(about = "Map photos and videos to their nearest cities")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Media folder to scan (repeatable, or comma-separated in FOLDER_PATH)
    #[arg(short, long, env = "FOLDER_PATH", value_delimiter = ',')]
    folder: Vec<PathBuf>,

    /// Descend into subfolders
    #[arg(short, long)]
    recursive: bool,

    /// Maximum distance to the nearest city, in kilometers
    #[arg(long)]
    max_distance_km: Option<f64>,

    /// Never download the gazetteer
    #[arg(long)]
    offline: bool,

    /// Draw a dot for every geotagged file in the region
    #[arg(long)]
    markers: bool,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Args {
    fn apply(&self, config: &mut Config) -> Result<()> {
        if !self.folder.is_empty() {
            config.media.folders = self.folder.clone();
        }
        if self.recursive {
            config.media.recursive = true;
        }
        if let Some(km) = self.max_distance_km {
            config.resolver.max_distance_km = km;
        }
        if let Some(dir) = &self.output {
            config.output.dir = dir.clone();
        }
        config.validate()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => Config::default(),
    };
    args.apply(&mut config)?;

    if config.media.folders.is_empty() {
        anyhow::bail!("No media folders given; use --folder or set FOLDER_PATH");
    }

    info!("Media atlas");
    for folder in &config.media.folders {
        info!("Folder: {}", folder.display());
    }

    // Gazetteer
    let gazetteer_path = if args.offline {
        config.gazetteer.path.clone()
    } else {
        ensure_gazetteer(&config.gazetteer.path, &config.gazetteer.url).await?
    };
    let gazetteer = Gazetteer::load(
        &gazetteer_path,
        config.region,
        LambertAzimuthalEqualArea::etrs89(),
        &config.gazetteer.name_field,
    )?;
    info!("{} places in region", gazetteer.len());

    // Extraction
    let files = discover_media(&config.media.folders, config.media.recursive);
    if files.iter().any(|f| MediaKind::from_path(f) == Some(MediaKind::Video)) && !ffprobe_available() {
        warn!("ffprobe not found; videos will be skipped");
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut records: Vec<MediaRecord> = files
        .par_iter()
        .filter_map(|path| {
            let record = extract_record(path);
            pb.inc(1);
            record
        })
        .collect();
    pb.finish_and_clear();

    records.sort_by(|a, b| a.taken_at.cmp(&b.taken_at).then_with(|| a.path.cmp(&b.path)));
    let geotagged = records.iter().filter(|r| r.geo_point().is_some()).count();
    info!("Extracted {} records, {} with GPS", records.len(), geotagged);

    // Aggregation
    let resolver = Resolver::new(&gazetteer);
    let report = aggregate_par(&records, resolver, config.resolver.max_distance_km);

    // Outputs
    let out = &config.output.dir;
    fs::create_dir_all(out).with_context(|| format!("Failed to create {}", out.display()))?;

    let bubbles = render::bubbles_from_report(&report);
    render::write_bubbles_geojson(&out.join("city_bubbles.geojson"), &bubbles)?;
    render::write_summary_json(&out.join("cities.json"), &report, &bubbles)?;

    let markers: Vec<GeoPoint> = if args.markers {
        records
            .iter()
            .filter(|r| r.kind == MediaKind::Photo)
            .filter_map(MediaRecord::geo_point)
            .filter(|p| config.region.contains(p.lat, p.lon))
            .collect()
    } else {
        Vec::new()
    };
    render::write_map_html(
        &out.join("city_bubbles_map.html"),
        &bubbles,
        &markers,
        &MapOptions::default(),
    )?;

    let days = timeline::daily_counts(&records, config.output.timeline_since);
    timeline::write_daily_csv(&out.join("daily_counts.csv"), &days)?;
    timeline::write_hourly_csv(&out.join("hourly_counts.csv"), &timeline::hourly_counts(&records))?;

    info!("Wrote outputs to {}", out.display());
    for bubble in bubbles.iter().take(10) {
        info!("  {}", bubble.label);
    }

    Ok(())
}
