use std::collections::BTreeMap;

use track_stats::aggregator::aggregate::{UNKNOWN_ENTITY, aggregate};
use track_stats::aggregator::types::{AttributeSummary, Value};
use track_stats::columns::{ColumnRole, default_synonyms, read_headers, resolve_columns};

#[test]
fn test_full_pipeline_on_movebank_style_fixture() {
    let csv_text = include_str!("fixtures/sample_tracks.csv");

    let headers = read_headers(csv_text).expect("Failed to read headers");
    let column_map = resolve_columns(&headers, &BTreeMap::new(), &default_synonyms());
    assert_eq!(column_map.header(ColumnRole::Longitude), Some("location-long"));

    let result = aggregate(csv_text, &column_map).expect("Failed to aggregate fixture");

    // A01 keeps all 3 rows; B17 loses its (0, 0) fix; the id-less row
    // groups under "unknown".
    assert_eq!(result.tracks["A01"].len(), 3);
    assert_eq!(result.tracks["B17"].len(), 2);
    assert_eq!(result.tracks[UNKNOWN_ENTITY].len(), 1);
    assert_eq!(result.total_points(), 6);

    // Varying altitude summarizes numerically, rounded to 2 decimals.
    assert_eq!(
        result.statistics["A01"]["altitude"],
        AttributeSummary::Numeric {
            min: 412.5,
            max: 431.7,
            mean: 420.77
        }
    );

    // Constant columns degrade to single-value categoricals.
    assert_eq!(
        result.statistics["A01"]["ring_color"],
        AttributeSummary::Categorical {
            values: vec![Value::Text("red".to_string())]
        }
    );
    assert_eq!(
        result.statistics["A01"]["sensor"],
        AttributeSummary::Categorical {
            values: vec![Value::Number(7.0)]
        }
    );

    // The "unknown" entity's unparseable speed is a NaN sentinel, leaving
    // no numeric speed samples for it.
    assert!(result.tracks[UNKNOWN_ENTITY].points[0].speed.is_nan());
    assert!(!result.statistics[UNKNOWN_ENTITY].contains_key("speed"));

    // Timestamps parse as UTC instants.
    let first = result.tracks["A01"].points[0].timestamp.expect("timestamp");
    assert_eq!(first.to_rfc3339(), "2021-04-02T05:12:00+00:00");
}
