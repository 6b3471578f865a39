//! Nearest-city resolution with a distance cutoff.

use tracing::trace;

use super::Gazetteer;
use crate::models::{CityMatch, GeoPoint};

/// Default maximum distance to a gazetteer place, in kilometers
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 50.0;

/// Resolves points to the nearest gazetteer place.
///
/// Borrows the gazetteer, which is projected and indexed once at load; the
/// resolver never re-projects places per query.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    gazetteer: &'a Gazetteer,
}

impl<'a> Resolver<'a> {
    pub fn new(gazetteer: &'a Gazetteer) -> Self {
        Self { gazetteer }
    }

    /// Resolve (lat, lon) to the nearest place within `max_distance_km`.
    ///
    /// Total over all float inputs: points outside the region, outside the
    /// projection domain, or too far from every place yield None. A negative
    /// or non-finite cutoff matches nothing.
    pub fn resolve(&self, lat: f64, lon: f64, max_distance_km: f64) -> Option<CityMatch> {
        if !max_distance_km.is_finite() || max_distance_km < 0.0 {
            trace!("Cutoff {} km matches nothing", max_distance_km);
            return None;
        }
        if !self.gazetteer.region().contains(lat, lon) {
            return None;
        }

        let position = self.gazetteer.project(lat, lon)?;
        let (place, distance_meters) = self.gazetteer.nearest(position)?;

        if distance_meters > max_distance_km * 1000.0 {
            trace!(
                "({}, {}): nearest place {} is {:.0} m away, beyond cutoff",
                lat,
                lon,
                place.name,
                distance_meters
            );
            return None;
        }

        Some(CityMatch {
            place_name: place.name.clone(),
            distance_meters,
            country: place.country.clone(),
            population: place.population,
        })
    }

    pub fn resolve_point(&self, point: &GeoPoint, max_distance_km: f64) -> Option<CityMatch> {
        self.resolve(point.lat, point.lon, max_distance_km)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::{LambertAzimuthalEqualArea, Region};
    use crate::models::NamedPlace;

    fn paris_only() -> Gazetteer {
        Gazetteer::from_places(
            vec![NamedPlace::new("Paris", 48.8566, 2.3522)],
            Region::europe(),
            LambertAzimuthalEqualArea::etrs89(),
        )
    }

    fn sample() -> Gazetteer {
        Gazetteer::from_places(
            vec![
                NamedPlace::new("Paris", 48.8566, 2.3522),
                NamedPlace::new("London", 51.5074, -0.1278),
                NamedPlace::new("Berlin", 52.52, 13.405),
                NamedPlace::new("Rome", 41.9028, 12.4964),
                NamedPlace::new("Stockholm", 59.3293, 18.0686),
            ],
            Region::europe(),
            LambertAzimuthalEqualArea::etrs89(),
        )
    }

    #[test]
    fn test_paris_example() {
        let gazetteer = paris_only();
        let resolver = Resolver::new(&gazetteer);

        let hit = resolver.resolve(48.86, 2.35, 50.0).unwrap();
        assert_eq!(hit.place_name, "Paris");
        assert!(hit.distance_meters >= 0.0);
        assert!(hit.distance_meters < 1_000.0);

        // London is ~344 km from Paris
        assert!(resolver.resolve(51.5, -0.12, 50.0).is_none());
    }

    #[test]
    fn test_outside_region_is_none() {
        let gazetteer = sample();
        let resolver = Resolver::new(&gazetteer);
        // New York, even with an enormous cutoff
        assert!(resolver.resolve(40.7128, -74.006, 1.0e6).is_none());
        assert!(resolver.resolve(f64::NAN, 2.35, 1.0e6).is_none());
        assert!(resolver.resolve(48.86, f64::INFINITY, 1.0e6).is_none());
        assert!(resolver.resolve(1.0e9, -1.0e9, 1.0e6).is_none());
    }

    #[test]
    fn test_nearest_of_several() {
        let gazetteer = sample();
        let resolver = Resolver::new(&gazetteer);
        // Potsdam
        let hit = resolver.resolve(52.3906, 13.0645, 50.0).unwrap();
        assert_eq!(hit.place_name, "Berlin");
        assert!(hit.distance_meters <= 50_000.0);
    }

    #[test]
    fn test_cutoff_is_monotonic() {
        let gazetteer = sample();
        let resolver = Resolver::new(&gazetteer);
        let probes = [
            (48.5, 2.0),
            (49.5, 3.5),
            (51.0, 0.5),
            (52.0, 12.0),
            (42.5, 12.0),
            (60.0, 17.0),
            (45.0, 5.0),
        ];

        for (lat, lon) in probes {
            let mut found: Option<CityMatch> = None;
            for cutoff in [1.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0] {
                let current = resolver.resolve(lat, lon, cutoff);
                if let Some(previous) = &found {
                    // A larger cutoff never loses or changes a match
                    assert_eq!(current.as_ref(), Some(previous));
                }
                if let Some(hit) = &current {
                    assert!(hit.distance_meters <= cutoff * 1000.0);
                    found = current.clone();
                }
            }
        }
    }

    #[test]
    fn test_invalid_cutoff_matches_nothing() {
        let gazetteer = paris_only();
        let resolver = Resolver::new(&gazetteer);
        // Paris is far beyond any sane cutoff from London
        assert!(resolver.resolve(51.5, -0.12, f64::NAN).is_none());
        assert!(resolver.resolve(51.5, -0.12, f64::INFINITY).is_none());
        assert!(resolver.resolve(51.5, -0.12, -1.0).is_none());
        // Even right on top of the place
        assert!(resolver.resolve(48.8566, 2.3522, f64::NAN).is_none());
        assert!(resolver.resolve(48.8566, 2.3522, -0.001).is_none());
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let gazetteer = paris_only();
        let resolver = Resolver::new(&gazetteer);
        let d = resolver.resolve(48.9, 2.4, 1000.0).unwrap().distance_meters;
        assert!(d > 0.0);

        // Smallest cutoff in km whose meter value reaches d
        let next_up = |x: f64| f64::from_bits(x.to_bits() + 1);
        let next_down = |x: f64| f64::from_bits(x.to_bits() - 1);
        let mut km = d / 1000.0;
        while km * 1000.0 < d {
            km = next_up(km);
        }
        while next_down(km) * 1000.0 >= d {
            km = next_down(km);
        }

        let hit = resolver.resolve(48.9, 2.4, km);
        assert_eq!(hit.map(|h| h.distance_meters), Some(d));
        assert!(resolver.resolve(48.9, 2.4, next_down(km)).is_none());
        assert!(resolver.resolve(48.9, 2.4, d / 1000.0 * 0.999).is_none());
    }

    #[test]
    fn test_match_carries_place_details() {
        let mut paris = NamedPlace::new("Paris", 48.8566, 2.3522);
        paris.country = Some("France".to_string());
        paris.population = Some(11_174_743);
        let gazetteer = Gazetteer::from_places(
            vec![paris],
            Region::europe(),
            LambertAzimuthalEqualArea::etrs89(),
        );
        let hit = Resolver::new(&gazetteer).resolve(48.86, 2.35, 50.0).unwrap();
        assert_eq!(hit.country.as_deref(), Some("France"));
        assert_eq!(hit.population, Some(11_174_743));
    }

    #[test]
    fn test_deterministic() {
        let gazetteer = sample();
        let resolver = Resolver::new(&gazetteer);
        let first = resolver.resolve(41.95, 12.5, 50.0);
        for _ in 0..10 {
            assert_eq!(resolver.resolve(41.95, 12.5, 50.0), first);
        }
    }

    #[test]
    fn test_duplicate_places_prefer_first() {
        let gazetteer = Gazetteer::from_places(
            vec![
                NamedPlace::new("First", 50.0, 10.0),
                NamedPlace::new("Second", 50.0, 10.0),
            ],
            Region::europe(),
            LambertAzimuthalEqualArea::etrs89(),
        );
        let resolver = Resolver::new(&gazetteer);
        let hit = resolver.resolve(50.01, 10.01, 50.0).unwrap();
        assert_eq!(hit.place_name, "First");
    }

    #[test]
    fn test_empty_gazetteer() {
        let gazetteer =
            Gazetteer::from_places(vec![], Region::europe(), LambertAzimuthalEqualArea::etrs89());
        let resolver = Resolver::new(&gazetteer);
        assert!(resolver.resolve(48.86, 2.35, 50.0).is_none());
    }
}
