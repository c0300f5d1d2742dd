//! Single-pass CSV aggregation: parsing, coordinate filtering, per-entity
//! grouping, and streaming per-attribute statistics.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::debug;

use crate::aggregator::types::{
    AggregationResult, AttributeSummary, Track, TrackPoint, Value,
};
use crate::aggregator::utility::{coerce, parse_f64, parse_timestamp_utc, round_to};
use crate::columns::{ColumnMap, ColumnRole};
use crate::error::IngestError;

/// Entity id used for rows whose id cell is empty or whose id column is
/// unresolved. Such rows are grouped, not dropped.
pub const UNKNOWN_ENTITY: &str = "unknown";

/// Running statistics for one (entity, attribute) pair, updated once per row.
///
/// Finite numeric samples feed the min/max/sum/count fields; textual samples
/// feed the distinct set. One pass over the data is sufficient, keeping
/// memory O(1) per numeric attribute even for multi-megabyte files.
struct AttributeAccumulator {
    min: f64,
    max: f64,
    sum: f64,
    count: u64,
    distinct: BTreeSet<String>,
}

impl AttributeAccumulator {
    fn new() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum: 0.0,
            count: 0,
            distinct: BTreeSet::new(),
        }
    }

    fn observe(&mut self, value: &Value) {
        match value {
            Value::Number(n) if n.is_finite() => {
                self.min = self.min.min(*n);
                self.max = self.max.max(*n);
                self.sum += *n;
                self.count += 1;
            }
            Value::Number(_) => {}
            Value::Text(s) => {
                self.distinct.insert(s.clone());
            }
        }
    }

    /// Reduces the running sums to a closed-form summary. An attribute whose
    /// numeric samples are all identical collapses to a single-value
    /// categorical instead of a zero-width numeric range.
    fn finalize(self) -> AttributeSummary {
        if self.count > 0 && self.min < self.max {
            AttributeSummary::Numeric {
                min: round_to(self.min, 2),
                max: round_to(self.max, 2),
                mean: round_to(self.sum / self.count as f64, 2),
            }
        } else {
            let mut values = Vec::new();
            if self.count > 0 {
                values.push(Value::Number(self.min));
            }
            values.extend(self.distinct.into_iter().map(Value::Text));
            AttributeSummary::Categorical { values }
        }
    }
}

fn role_index(
    headers: &[String],
    columns: &ColumnMap,
    role: ColumnRole,
) -> Result<usize, IngestError> {
    let header = columns
        .header(role)
        .ok_or(IngestError::UnresolvedRequiredColumn { role })?;
    headers
        .iter()
        .position(|h| h == header)
        .ok_or_else(|| IngestError::MissingSelectedColumn {
            role,
            header: header.to_string(),
        })
}

/// Aggregates raw CSV text into per-entity tracks and statistics.
///
/// The column map is validated against the actual header row before any data
/// row is parsed. Rows with a non-finite or (0, 0) coordinate pair are
/// silently dropped; other bad cells become NaN/None sentinels. A malformed
/// record (inconsistent field count, bad encoding) fails the whole call.
///
/// # Errors
///
/// [`IngestError::UnresolvedRequiredColumn`] or
/// [`IngestError::MissingSelectedColumn`] when the column map is incomplete,
/// [`IngestError::MalformedInput`] when the CSV cannot be tokenized.
pub fn aggregate(csv_text: &str, columns: &ColumnMap) -> Result<AggregationResult, IngestError> {
    let mut reader = csv::Reader::from_reader(csv_text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
        // Entirely empty input: an empty result, not an error.
        return Ok(AggregationResult::default());
    }

    columns.validate(&headers)?;

    let id_index = columns
        .header(ColumnRole::EntityId)
        .and_then(|header| headers.iter().position(|h| h == header));
    let lon_index = role_index(&headers, columns, ColumnRole::Longitude)?;
    let lat_index = role_index(&headers, columns, ColumnRole::Latitude)?;
    let alt_index = role_index(&headers, columns, ColumnRole::Altitude)?;
    let speed_index = role_index(&headers, columns, ColumnRole::Speed)?;
    let ts_index = role_index(&headers, columns, ColumnRole::Timestamp)?;

    let bound: HashSet<&str> = ColumnRole::ALL
        .iter()
        .filter_map(|role| columns.header(*role))
        .collect();
    let extra_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !bound.contains(h.as_str()))
        .map(|(i, h)| (i, h.clone()))
        .collect();

    let mut tracks: BTreeMap<String, Track> = BTreeMap::new();
    let mut accumulators: BTreeMap<String, BTreeMap<String, AttributeAccumulator>> =
        BTreeMap::new();
    let mut dropped_rows = 0usize;

    for record in reader.records() {
        let record = record?;

        let entity_id = id_index
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_ENTITY)
            .to_string();

        let longitude = round_to(parse_f64(record.get(lon_index).unwrap_or("")), 6);
        let latitude = round_to(parse_f64(record.get(lat_index).unwrap_or("")), 6);
        if !longitude.is_finite()
            || !latitude.is_finite()
            || (longitude == 0.0 && latitude == 0.0)
        {
            // (0, 0) is the conventional "no fix" sentinel in tracker dumps.
            dropped_rows += 1;
            continue;
        }

        let altitude = round_to(parse_f64(record.get(alt_index).unwrap_or("")), 3);
        let speed = round_to(parse_f64(record.get(speed_index).unwrap_or("")), 3);
        let timestamp = parse_timestamp_utc(record.get(ts_index).unwrap_or(""));

        let mut extras = BTreeMap::new();
        for (index, name) in &extra_columns {
            extras.insert(name.clone(), coerce(record.get(*index).unwrap_or("")));
        }

        let entity_accs = accumulators.entry(entity_id.clone()).or_default();
        for (name, value) in [
            (ColumnRole::Longitude.canonical(), longitude),
            (ColumnRole::Latitude.canonical(), latitude),
            (ColumnRole::Altitude.canonical(), altitude),
            (ColumnRole::Speed.canonical(), speed),
        ] {
            if value.is_finite() {
                entity_accs
                    .entry(name.to_string())
                    .or_insert_with(AttributeAccumulator::new)
                    .observe(&Value::Number(value));
            }
        }
        for (name, value) in &extras {
            entity_accs
                .entry(name.clone())
                .or_insert_with(AttributeAccumulator::new)
                .observe(value);
        }

        tracks.entry(entity_id.clone()).or_default().points.push(TrackPoint {
            entity_id,
            longitude,
            latitude,
            altitude,
            speed,
            timestamp,
            extras,
        });
    }

    let statistics = accumulators
        .into_iter()
        .map(|(entity, accs)| {
            let summaries = accs
                .into_iter()
                .map(|(name, acc)| (name, acc.finalize()))
                .collect();
            (entity, summaries)
        })
        .collect();

    let result = AggregationResult { tracks, statistics };
    debug!(
        entities = result.tracks.len(),
        points = result.total_points(),
        dropped_rows,
        "aggregation pass complete"
    );

    Ok(result)
}
