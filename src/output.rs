//! Output formatting and persistence for aggregation results.
//!
//! Supports pretty-printing, JSON serialization, and a flattened
//! per-attribute summary CSV.

use anyhow::Result;
use tracing::{debug, info};

use crate::aggregator::types::{AggregationResult, AttributeSummary, Value};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::Path;

/// Logs an aggregation result using Rust's debug pretty-print format.
pub fn print_pretty(result: &AggregationResult) {
    debug!("{:#?}", result);
}

/// Logs an aggregation result as pretty-printed JSON.
pub fn print_json(result: &AggregationResult) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

/// Writes the full aggregation result as JSON to a file.
pub fn write_json(path: &str, result: &AggregationResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(path, json)?;
    info!(path, entities = result.tracks.len(), "Result written");
    Ok(())
}

/// One flattened summary line: one attribute of one entity.
#[derive(Debug, Serialize)]
struct SummaryRow {
    entity_id: String,
    attribute: String,
    kind: &'static str,
    min: Option<f64>,
    max: Option<f64>,
    mean: Option<f64>,
    values: Option<String>,
}

fn summary_row(entity_id: &str, attribute: &str, summary: &AttributeSummary) -> SummaryRow {
    match summary {
        AttributeSummary::Numeric { min, max, mean } => SummaryRow {
            entity_id: entity_id.to_string(),
            attribute: attribute.to_string(),
            kind: "numeric",
            min: Some(*min),
            max: Some(*max),
            mean: Some(*mean),
            values: None,
        },
        AttributeSummary::Categorical { values } => {
            let joined = values
                .iter()
                .map(|v| match v {
                    Value::Number(n) => n.to_string(),
                    Value::Text(s) => s.clone(),
                })
                .collect::<Vec<_>>()
                .join("|");
            SummaryRow {
                entity_id: entity_id.to_string(),
                attribute: attribute.to_string(),
                kind: "categorical",
                min: None,
                max: None,
                mean: None,
                values: Some(joined),
            }
        }
    }
}

/// Appends every (entity, attribute) summary as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_summary_rows(path: &str, result: &AggregationResult) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending summary CSV rows");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for (entity_id, summaries) in &result.statistics {
        for (attribute, summary) in summaries {
            writer.serialize(summary_row(entity_id, attribute, summary))?;
        }
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::types::Track;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn sample_result() -> AggregationResult {
        let mut result = AggregationResult::default();
        result.tracks.insert("B1".to_string(), Track::default());
        let mut stats = std::collections::BTreeMap::new();
        stats.insert(
            "altitude".to_string(),
            AttributeSummary::Numeric {
                min: 100.0,
                max: 200.0,
                mean: 150.0,
            },
        );
        stats.insert(
            "color".to_string(),
            AttributeSummary::Categorical {
                values: vec![
                    Value::Text("blue".to_string()),
                    Value::Text("red".to_string()),
                ],
            },
        );
        result.statistics.insert("B1".to_string(), stats);
        result
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&sample_result());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&sample_result()).unwrap();
    }

    #[test]
    fn test_write_json_creates_file() {
        let path = temp_path("track_stats_test_result.json");
        let _ = fs::remove_file(&path); // clean up any prior run

        write_json(&path, &sample_result()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"kind\": \"Numeric\""));
        assert!(content.contains("\"mean\": 150.0"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_summary_rows_writes_header_once() {
        let path = temp_path("track_stats_test_summary.csv");
        let _ = fs::remove_file(&path);

        let result = sample_result();
        append_summary_rows(&path, &result).unwrap();
        append_summary_rows(&path, &result).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.contains("entity_id")).count();
        assert_eq!(header_count, 1);
        // 1 header + 2 attributes * 2 appends
        assert_eq!(content.lines().count(), 5);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_categorical_values_are_pipe_joined() {
        let path = temp_path("track_stats_test_categorical.csv");
        let _ = fs::remove_file(&path);

        append_summary_rows(&path, &sample_result()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("blue|red"));

        fs::remove_file(&path).unwrap();
    }
}
