//! Capture-time histograms by media kind.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Timelike};
use serde::Serialize;

use crate::models::{MediaKind, MediaRecord};

/// Photo and video counts for one bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub photos: usize,
    pub videos: usize,
}

impl KindCounts {
    fn add(&mut self, kind: MediaKind) {
        match kind {
            MediaKind::Photo => self.photos += 1,
            MediaKind::Video => self.videos += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.photos + self.videos
    }
}

#[derive(Serialize)]
struct DailyRow {
    date: NaiveDate,
    photos: usize,
    videos: usize,
}

#[derive(Serialize)]
struct HourlyRow {
    hour: u32,
    photos: usize,
    videos: usize,
}

/// Counts per calendar day, optionally ignoring records before `since`
pub fn daily_counts(
    records: &[MediaRecord],
    since: Option<NaiveDate>,
) -> BTreeMap<NaiveDate, KindCounts> {
    let mut days: BTreeMap<NaiveDate, KindCounts> = BTreeMap::new();
    for record in records {
        let date = record.taken_at.date();
        if since.is_some_and(|s| date < s) {
            continue;
        }
        days.entry(date).or_default().add(record.kind);
    }
    days
}

/// Counts per hour of day (0-23)
pub fn hourly_counts(records: &[MediaRecord]) -> [KindCounts; 24] {
    let mut hours = [KindCounts::default(); 24];
    for record in records {
        hours[record.taken_at.hour() as usize].add(record.kind);
    }
    hours
}

pub fn write_daily_csv(path: &Path, days: &BTreeMap<NaiveDate, KindCounts>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for (date, counts) in days {
        writer.serialize(DailyRow {
            date: *date,
            photos: counts.photos,
            videos: counts.videos,
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_hourly_csv(path: &Path, hours: &[KindCounts; 24]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for (hour, counts) in hours.iter().enumerate() {
        writer.serialize(HourlyRow {
            hour: hour as u32,
            photos: counts.photos,
            videos: counts.videos,
        })?;
    }
    writer.flush()?;
    Ok(())
}
