//! Gazetteer of named populated places.
//!
//! Loaded once per session, filtered to the region of interest, projected
//! and indexed up front. Read-only afterwards.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use geo::Coord;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::{PlaceIndex, Projection, Region};
use crate::error::{AtlasError, Result};
use crate::models::NamedPlace;

/// Name attribute of the Natural Earth populated places dataset
pub const DEFAULT_NAME_FIELD: &str = "NAMEASCII";

const NAME_FALLBACKS: &[&str] = &["NAME", "name"];
const COUNTRY_FIELDS: &[&str] = &["ADM0NAME", "country"];
const POPULATION_FIELDS: &[&str] = &["POP_MAX", "population"];
const LAT_COLUMNS: &[&str] = &["lat", "latitude"];
const LON_COLUMNS: &[&str] = &["lon", "lng", "longitude"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    GeoJson,
    Delimited(u8),
}

impl Format {
    fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        let name = name.strip_suffix(".gz").unwrap_or(&name);
        let ext = name.rsplit('.').next()?;
        match ext {
            "geojson" | "json" => Some(Format::GeoJson),
            "csv" => Some(Format::Delimited(b',')),
            "tsv" | "txt" => Some(Format::Delimited(b'\t')),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
    #[serde(default)]
    properties: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    geo_type: String,
    #[serde(default)]
    coordinates: Value,
}

/// Region-filtered, pre-projected set of places
pub struct Gazetteer {
    places: Vec<NamedPlace>,
    region: Region,
    projection: Box<dyn Projection>,
    index: PlaceIndex,
}

impl Gazetteer {
    /// Load places from a GeoJSON or CSV/TSV file (optionally `.gz`).
    ///
    /// Fails with `DataUnavailable` if the file is missing, unreadable or
    /// cannot be parsed. Individual malformed entries are skipped.
    pub fn load<P: Projection + 'static>(
        path: &Path,
        region: Region,
        projection: P,
        name_field: &str,
    ) -> Result<Self> {
        info!("Loading gazetteer from {}", path.display());

        let places = read_places(path, name_field)?;
        info!("Read {} places", places.len());

        let gazetteer = Self::from_places(places, region, projection);
        if gazetteer.is_empty() {
            warn!(
                "No gazetteer places inside region {:?}; every point will be unmatched",
                region
            );
        }
        Ok(gazetteer)
    }

    /// Build from an in-memory list, keeping input order for tie-breaking
    pub fn from_places<P: Projection + 'static>(
        places: Vec<NamedPlace>,
        region: Region,
        projection: P,
    ) -> Self {
        let total = places.len();
        let mut kept = Vec::with_capacity(total);
        let mut positions = Vec::with_capacity(total);

        for place in places {
            if !region.contains(place.lat, place.lon) {
                continue;
            }
            match projection.project(place.lat, place.lon) {
                Some(coord) => {
                    positions.push(coord);
                    kept.push(place);
                }
                None => debug!("Could not project gazetteer place {}", place.name),
            }
        }

        info!(
            "Gazetteer: kept {} of {} places in region ({})",
            kept.len(),
            total,
            projection.name()
        );

        Self {
            index: PlaceIndex::build(&positions),
            places: kept,
            region,
            projection: Box::new(projection),
        }
    }

    /// Project a query point with the same projection the places were indexed with
    pub fn project(&self, lat: f64, lon: f64) -> Option<Coord<f64>> {
        self.projection.project(lat, lon)
    }

    /// Nearest place to an already projected position, with its distance in meters
    pub fn nearest(&self, position: Coord<f64>) -> Option<(&NamedPlace, f64)> {
        let (idx, distance) = self.index.nearest(position)?;
        self.places.get(idx).map(|place| (place, distance))
    }

    pub fn places(&self) -> &[NamedPlace] {
        &self.places
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

fn read_places(path: &Path, name_field: &str) -> Result<Vec<NamedPlace>> {
    let format = Format::from_path(path)
        .ok_or_else(|| AtlasError::unavailable(path, "unsupported gazetteer format"))?;

    let file = File::open(path).map_err(|e| AtlasError::unavailable(path, e))?;
    let reader: Box<dyn Read> = if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("gz")) {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    let reader = BufReader::new(reader);

    match format {
        Format::GeoJson => parse_geojson(reader, name_field),
        Format::Delimited(delimiter) => parse_delimited(reader, delimiter, name_field),
    }
    .map_err(|reason| AtlasError::unavailable(path, reason))
}

fn parse_geojson<R: Read>(reader: R, name_field: &str) -> std::result::Result<Vec<NamedPlace>, String> {
    let collection: FeatureCollection =
        serde_json::from_reader(reader).map_err(|e| format!("invalid GeoJSON: {}", e))?;

    let mut places = Vec::with_capacity(collection.features.len());
    let mut skipped = 0usize;

    for feature in collection.features {
        match place_from_feature(&feature, name_field) {
            Some(place) => places.push(place),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("Skipped {} features without a point geometry or name", skipped);
    }
    Ok(places)
}

fn place_from_feature(feature: &Feature, name_field: &str) -> Option<NamedPlace> {
    let geometry = feature.geometry.as_ref()?;
    if geometry.geo_type != "Point" {
        return None;
    }
    let coords = geometry.coordinates.as_array()?;
    let lon = coords.first()?.as_f64()?;
    let lat = coords.get(1)?.as_f64()?;

    let props = &feature.properties;
    let name = std::iter::once(name_field)
        .chain(NAME_FALLBACKS.iter().copied())
        .find_map(|key| property(props, key).and_then(Value::as_str))
        .filter(|n| !n.trim().is_empty())?;

    let mut place = NamedPlace::new(name.trim(), lat, lon);
    place.country = COUNTRY_FIELDS
        .iter()
        .find_map(|key| property(props, key).and_then(Value::as_str))
        .map(str::to_string);
    place.population = POPULATION_FIELDS
        .iter()
        .find_map(|key| property(props, key).and_then(Value::as_f64))
        .filter(|p| *p >= 0.0)
        .map(|p| p as u64);
    Some(place)
}

/// Case-insensitive property lookup
fn property<'a>(props: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    props.get(key).or_else(|| {
        props
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

fn parse_delimited<R: Read>(
    reader: R,
    delimiter: u8,
    name_field: &str,
) -> std::result::Result<Vec<NamedPlace>, String> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| format!("invalid header row: {}", e))?
        .clone();

    let column = |candidates: &[&str]| {
        candidates
            .iter()
            .find_map(|c| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(c)))
    };

    let name_idx = column(&[name_field, "name"]).ok_or("column 'name' not found")?;
    let lat_idx = column(LAT_COLUMNS).ok_or("column 'lat' not found")?;
    let lon_idx = column(LON_COLUMNS).ok_or("column 'lon' not found")?;
    let country_idx = column(COUNTRY_FIELDS);
    let population_idx = column(POPULATION_FIELDS);

    let mut places = Vec::new();
    for result in csv_reader.records() {
        let record = result.map_err(|e| format!("invalid row: {}", e))?;

        let name = record.get(name_idx).map(str::trim).unwrap_or_default();
        let lat = record.get(lat_idx).and_then(|v| v.trim().parse::<f64>().ok());
        let lon = record.get(lon_idx).and_then(|v| v.trim().parse::<f64>().ok());

        let (lat, lon) = match (lat, lon) {
            (Some(lat), Some(lon)) if !name.is_empty() => (lat, lon),
            _ => {
                debug!("Skipping malformed gazetteer row {:?}", record.position());
                continue;
            }
        };

        let mut place = NamedPlace::new(name, lat, lon);
        place.country = country_idx
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        place.population = population_idx
            .and_then(|i| record.get(i))
            .and_then(|p| p.trim().parse::<f64>().ok())
            .filter(|p| *p >= 0.0)
            .map(|p| p as u64);
        places.push(place);
    }

    Ok(places)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::LambertAzimuthalEqualArea;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const GEOJSON: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"NAMEASCII": "Paris", "ADM0NAME": "France", "POP_MAX": 11174743},
             "geometry": {"type": "Point", "coordinates": [2.3522, 48.8566]}},
            {"type": "Feature", "properties": {"NAMEASCII": "New York", "ADM0NAME": "United States of America"},
             "geometry": {"type": "Point", "coordinates": [-74.006, 40.7128]}},
            {"type": "Feature", "properties": {"NAME": "Zurich"},
             "geometry": {"type": "Point", "coordinates": [8.5417, 47.3769]}},
            {"type": "Feature", "properties": {"NAMEASCII": "Nowhere"}, "geometry": null},
            {"type": "Feature", "properties": {"NAMEASCII": "Line"},
             "geometry": {"type": "LineString", "coordinates": [[0, 50], [1, 51]]}}
        ]
    }"#;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_geojson_filters_region() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "places.geojson", GEOJSON.as_bytes());

        let gazetteer = Gazetteer::load(
            &path,
            Region::europe(),
            LambertAzimuthalEqualArea::etrs89(),
            DEFAULT_NAME_FIELD,
        )
        .unwrap();

        let names: Vec<&str> = gazetteer.places().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Paris", "Zurich"]);

        let paris = &gazetteer.places()[0];
        assert_eq!(paris.country.as_deref(), Some("France"));
        assert_eq!(paris.population, Some(11_174_743));
    }

    #[test]
    fn test_load_gzipped_csv() {
        let dir = tempfile::tempdir().unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(b"name,latitude,longitude,country\nLyon,45.764,4.8357,France\nbroken,abc,1\nOslo,59.9139,10.7522,Norway\n")
            .unwrap();
        let path = write_file(&dir, "places.csv.gz", &encoder.finish().unwrap());

        let gazetteer = Gazetteer::load(
            &path,
            Region::europe(),
            LambertAzimuthalEqualArea::etrs89(),
            DEFAULT_NAME_FIELD,
        )
        .unwrap();

        assert_eq!(gazetteer.len(), 2);
        assert_eq!(gazetteer.places()[1].name, "Oslo");
        assert_eq!(gazetteer.places()[1].country.as_deref(), Some("Norway"));
    }

    #[test]
    fn test_gzip_suffix_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(GEOJSON.as_bytes()).unwrap();
        let path = write_file(&dir, "Places.GeoJSON.GZ", &encoder.finish().unwrap());

        let gazetteer = Gazetteer::load(
            &path,
            Region::europe(),
            LambertAzimuthalEqualArea::etrs89(),
            DEFAULT_NAME_FIELD,
        )
        .unwrap();
        assert_eq!(gazetteer.len(), 2);
    }

    #[test]
    fn test_missing_file_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let result = Gazetteer::load(
            &dir.path().join("absent.geojson"),
            Region::europe(),
            LambertAzimuthalEqualArea::etrs89(),
            DEFAULT_NAME_FIELD,
        );
        assert!(matches!(result, Err(AtlasError::DataUnavailable { .. })));
    }

    #[test]
    fn test_corrupt_file_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "places.geojson", b"{\"type\": \"FeatureColl");
        let result = Gazetteer::load(
            &path,
            Region::europe(),
            LambertAzimuthalEqualArea::etrs89(),
            DEFAULT_NAME_FIELD,
        );
        assert!(matches!(result, Err(AtlasError::DataUnavailable { .. })));

        let path = write_file(&dir, "places.csv", b"city,x,y\nParis,1,2\n");
        let result = Gazetteer::load(
            &path,
            Region::europe(),
            LambertAzimuthalEqualArea::etrs89(),
            DEFAULT_NAME_FIELD,
        );
        assert!(matches!(result, Err(AtlasError::DataUnavailable { .. })));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "ne_10m_populated_places.shp", b"\0\0\x27\x0a");
        let result = Gazetteer::load(
            &path,
            Region::europe(),
            LambertAzimuthalEqualArea::etrs89(),
            DEFAULT_NAME_FIELD,
        );
        assert!(matches!(result, Err(AtlasError::DataUnavailable { .. })));
    }

    #[test]
    fn test_from_places_keeps_order() {
        let gazetteer = Gazetteer::from_places(
            vec![
                NamedPlace::new("B", 50.0, 10.0),
                NamedPlace::new("A", 51.0, 11.0),
                NamedPlace::new("Outside", 10.0, 10.0),
            ],
            Region::europe(),
            LambertAzimuthalEqualArea::etrs89(),
        );
        let names: Vec<&str> = gazetteer.places().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }
}
