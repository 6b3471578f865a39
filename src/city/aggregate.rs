//! Per-city aggregation of resolved points.

use hashbrown::HashMap;
use rayon::prelude::*;
use tracing::{debug, info};

use super::Resolver;
use crate::models::{CityMatch, GeoPoint, MediaKind, MediaRecord};

/// Running statistics for one city
#[derive(Debug, Clone, PartialEq)]
pub struct CityAggregate {
    pub city_name: String,
    /// All matched points, including those of unknown kind
    pub count: usize,
    pub photos: usize,
    pub videos: usize,
    pub country: Option<String>,
    pub population: Option<u64>,
    lat_sum: f64,
    lon_sum: f64,
}

impl CityAggregate {
    pub fn new(city_name: impl Into<String>) -> Self {
        Self {
            city_name: city_name.into(),
            count: 0,
            photos: 0,
            videos: 0,
            country: None,
            population: None,
            lat_sum: 0.0,
            lon_sum: 0.0,
        }
    }

    fn from_match(hit: &CityMatch) -> Self {
        let mut city = Self::new(hit.place_name.clone());
        city.country = hit.country.clone();
        city.population = hit.population;
        city
    }

    /// Add one matched point (raw, unprojected coordinates)
    pub fn record(&mut self, lat: f64, lon: f64) {
        self.count += 1;
        self.lat_sum += lat;
        self.lon_sum += lon;
    }

    /// Add one matched media file
    pub fn record_media(&mut self, lat: f64, lon: f64, kind: MediaKind) {
        self.record(lat, lon);
        match kind {
            MediaKind::Photo => self.photos += 1,
            MediaKind::Video => self.videos += 1,
        }
    }

    /// Arithmetic mean of matched latitudes and longitudes, as (lat, lon)
    pub fn centroid(&self) -> (f64, f64) {
        if self.count == 0 {
            return (f64::NAN, f64::NAN);
        }
        let n = self.count as f64;
        (self.lat_sum / n, self.lon_sum / n)
    }
}

/// Outcome of aggregating one batch of points
#[derive(Debug, Clone, Default)]
pub struct AggregationReport {
    pub cities: HashMap<String, CityAggregate>,
    /// Points that resolved to a city
    pub matched: usize,
    /// Points with coordinates that matched nothing (outside region or beyond cutoff)
    pub unmatched: usize,
    /// Records without both latitude and longitude
    pub skipped: usize,
}

impl AggregationReport {
    /// Cities ordered by count descending, then name
    pub fn by_count(&self) -> Vec<&CityAggregate> {
        let mut cities: Vec<&CityAggregate> = self.cities.values().collect();
        cities.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.city_name.cmp(&b.city_name)));
        cities
    }

    /// Number of points that had usable coordinates
    pub fn valid_points(&self) -> usize {
        self.matched + self.unmatched
    }
}

/// Incremental aggregator bound to one resolver and cutoff
pub struct CityAggregator<'a> {
    resolver: Resolver<'a>,
    max_distance_km: f64,
    report: AggregationReport,
}

impl<'a> CityAggregator<'a> {
    pub fn new(resolver: Resolver<'a>, max_distance_km: f64) -> Self {
        Self {
            resolver,
            max_distance_km,
            report: AggregationReport::default(),
        }
    }

    /// Resolve and accumulate one point of unknown kind. Returns the match, if any.
    pub fn push(&mut self, point: &GeoPoint) -> Option<CityMatch> {
        let found = self.resolver.resolve_point(point, self.max_distance_km);
        self.accept(point, None, found.as_ref());
        found
    }

    /// Accumulate a media record, counting it as skipped when it has no location
    pub fn push_record(&mut self, record: &MediaRecord) -> Option<CityMatch> {
        match record.geo_point() {
            Some(point) => {
                let found = self.resolver.resolve_point(&point, self.max_distance_km);
                self.accept(&point, Some(record.kind), found.as_ref());
                found
            }
            None => {
                self.report.skipped += 1;
                None
            }
        }
    }

    fn accept(&mut self, point: &GeoPoint, kind: Option<MediaKind>, found: Option<&CityMatch>) {
        match found {
            Some(hit) => {
                let city = self
                    .report
                    .cities
                    .entry(hit.place_name.clone())
                    .or_insert_with(|| CityAggregate::from_match(hit));
                match kind {
                    Some(kind) => city.record_media(point.lat, point.lon, kind),
                    None => city.record(point.lat, point.lon),
                }
                self.report.matched += 1;
            }
            None => self.report.unmatched += 1,
        }
    }

    pub fn finish(self) -> AggregationReport {
        info!(
            "Aggregated {} points into {} cities ({} unmatched, {} without location)",
            self.report.matched,
            self.report.cities.len(),
            self.report.unmatched,
            self.report.skipped
        );
        self.report
    }
}

/// Aggregate media records sequentially
pub fn aggregate(records: &[MediaRecord], resolver: Resolver<'_>, max_distance_km: f64) -> AggregationReport {
    let mut aggregator = CityAggregator::new(resolver, max_distance_km);
    for record in records {
        aggregator.push_record(record);
    }
    aggregator.finish()
}

/// Aggregate media records, resolving points on the rayon pool.
///
/// Resolution is independent per point and the gazetteer is immutable, so
/// points are resolved in parallel and folded in input order; the report is
/// identical to `aggregate`.
pub fn aggregate_par(
    records: &[MediaRecord],
    resolver: Resolver<'_>,
    max_distance_km: f64,
) -> AggregationReport {
    let resolved: Vec<Option<(GeoPoint, MediaKind, Option<CityMatch>)>> = records
        .par_iter()
        .map(|record| {
            record
                .geo_point()
                .map(|point| (point, record.kind, resolver.resolve_point(&point, max_distance_km)))
        })
        .collect();

    debug!("Resolved {} records in parallel", resolved.len());

    let mut aggregator = CityAggregator::new(resolver, max_distance_km);
    for entry in resolved {
        match entry {
            Some((point, kind, found)) => aggregator.accept(&point, Some(kind), found.as_ref()),
            None => aggregator.report.skipped += 1,
        }
    }
    aggregator.finish()
}
