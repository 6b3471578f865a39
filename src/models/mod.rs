//! Core data models for media records and gazetteer places.

pub mod media;
pub mod place;

pub use media::{MediaKind, MediaRecord};
pub use place::{CityMatch, GeoPoint, NamedPlace};
