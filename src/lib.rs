//! Mediamap - nearest-city aggregation for personal photo and video collections
//!
//! This library provides the gazetteer, resolver and aggregation engine plus the
//! extraction and rendering collaborators used by the `atlas` binary.

pub mod city;
pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod provision;
pub mod render;
pub mod timeline;

pub use city::{AggregationReport, CityAggregate, Gazetteer, Region, Resolver};
pub use error::{AtlasError, Result};
pub use models::{CityMatch, GeoPoint, MediaKind, MediaRecord, NamedPlace};
