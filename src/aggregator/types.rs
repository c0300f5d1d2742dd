//! Data types produced by the aggregation pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A cell value after numeric-if-possible coercion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

/// One observation of one tracked individual.
///
/// Longitude and latitude are WGS84 degrees rounded to 6 decimals and always
/// finite; rows failing that gate never become points. Altitude and speed
/// keep NaN when the source cell is not numeric. `timestamp` is None when the
/// source cell could not be parsed as an instant.
#[derive(Debug, Clone, Serialize)]
pub struct TrackPoint {
    pub entity_id: String,
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: f64,
    pub speed: f64,
    pub timestamp: Option<DateTime<Utc>>,
    /// Every CSV column not bound to one of the six fixed roles.
    pub extras: BTreeMap<String, Value>,
}

/// Ordered sequence of points for one entity, in CSV row order. The
/// aggregator assumes chronological input and never re-sorts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Track {
    pub points: Vec<TrackPoint>,
}

impl Track {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Reduced statistical description of one attribute for one entity.
///
/// An attribute whose finite samples are all identical degrades to
/// `Categorical` with a single value, so a constant column drives a one-item
/// filter list downstream instead of a zero-width numeric ramp.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum AttributeSummary {
    Numeric { min: f64, max: f64, mean: f64 },
    Categorical { values: Vec<Value> },
}

/// Per-entity statistics: attribute name → summary.
pub type EntityStatistics = BTreeMap<String, AttributeSummary>;

/// Complete result of one aggregation pass. `tracks` and `statistics` share
/// the same key set; an entity with zero valid points appears in neither.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregationResult {
    pub tracks: BTreeMap<String, Track>,
    pub statistics: BTreeMap<String, EntityStatistics>,
}

impl AggregationResult {
    /// True when no row survived the coordinate filter. A distinct non-error
    /// state the caller should render as "no data".
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn total_points(&self) -> usize {
        self.tracks.values().map(Track::len).sum()
    }
}
