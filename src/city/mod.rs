//! Nearest-city aggregation engine.
//!
//! Filters raw GPS points to a region of interest, projects them to a planar
//! equal-area grid, resolves each to the closest gazetteer place within a
//! cutoff, and aggregates matches per city.

mod aggregate;
mod gazetteer;
mod index;
mod projection;
mod region;
mod resolver;

pub use aggregate::{aggregate, aggregate_par, AggregationReport, CityAggregate, CityAggregator};
pub use gazetteer::{Gazetteer, DEFAULT_NAME_FIELD};
pub use index::PlaceIndex;
pub use projection::{LambertAzimuthalEqualArea, Projection};
pub use region::Region;
pub use resolver::{Resolver, DEFAULT_MAX_DISTANCE_KM};
