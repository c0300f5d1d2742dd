//! Column schema resolution for heterogeneous tracking CSVs.
//!
//! Maps the six fixed semantic roles onto whatever headers a source file
//! actually uses, either from explicit user selections or from a built-in
//! synonym table.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::IngestError;

/// The fixed semantic columns every tracking CSV must supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ColumnRole {
    EntityId,
    Longitude,
    Latitude,
    Altitude,
    Speed,
    Timestamp,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 6] = [
        ColumnRole::EntityId,
        ColumnRole::Longitude,
        ColumnRole::Latitude,
        ColumnRole::Altitude,
        ColumnRole::Speed,
        ColumnRole::Timestamp,
    ];

    /// Canonical attribute name used in statistics and error messages.
    pub fn canonical(&self) -> &'static str {
        match self {
            ColumnRole::EntityId => "entity_id",
            ColumnRole::Longitude => "longitude",
            ColumnRole::Latitude => "latitude",
            ColumnRole::Altitude => "altitude",
            ColumnRole::Speed => "speed",
            ColumnRole::Timestamp => "timestamp",
        }
    }
}

impl std::fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.canonical())
    }
}

/// Default header synonyms per role, scanned in order. Matching is
/// case-insensitive; the stored value is always the literal header.
/// Covers Movebank-style exports alongside plain short names.
static DEFAULT_SYNONYMS: &[(ColumnRole, &[&str])] = &[
    (
        ColumnRole::EntityId,
        &["bird_id", "id", "individual-local-identifier", "tag_id", "name"],
    ),
    (
        ColumnRole::Longitude,
        &["longitude", "lon", "lng", "location-long"],
    ),
    (ColumnRole::Latitude, &["latitude", "lat", "location-lat"]),
    (
        ColumnRole::Altitude,
        &["altitude", "alt", "height-above-ellipsoid", "height"],
    ),
    (ColumnRole::Speed, &["speed", "spd", "ground-speed", "velocity"]),
    (
        ColumnRole::Timestamp,
        &["timestamp", "time", "ts", "datetime", "date-time"],
    ),
];

/// Returns the built-in synonym table as an ordered role → synonyms map.
pub fn default_synonyms() -> BTreeMap<ColumnRole, Vec<&'static str>> {
    DEFAULT_SYNONYMS
        .iter()
        .map(|(role, syns)| (*role, syns.to_vec()))
        .collect()
}

/// Resolved role → header lookup for one CSV load. Built once per load and
/// immutable afterwards; unresolved roles are simply absent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ColumnMap {
    resolved: BTreeMap<ColumnRole, String>,
}

impl ColumnMap {
    pub fn header(&self, role: ColumnRole) -> Option<&str> {
        self.resolved.get(&role).map(String::as_str)
    }

    pub fn is_bound(&self, header: &str) -> bool {
        self.resolved.values().any(|h| h == header)
    }

    /// Checks that every role except EntityId is resolved and that every
    /// resolved header actually exists in the header row. EntityId may stay
    /// unresolved; rows then group under the "unknown" entity.
    pub fn validate(&self, headers: &[String]) -> Result<(), IngestError> {
        for role in ColumnRole::ALL {
            match self.resolved.get(&role) {
                Some(header) => {
                    if !headers.iter().any(|h| h == header) {
                        return Err(IngestError::MissingSelectedColumn {
                            role,
                            header: header.clone(),
                        });
                    }
                }
                None => {
                    if role != ColumnRole::EntityId {
                        return Err(IngestError::UnresolvedRequiredColumn { role });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Resolves each role to a header: an explicit non-empty selection wins
/// verbatim, otherwise the first default synonym that case-insensitively
/// matches a header. Unmatched roles stay unresolved; completeness is
/// checked later by [`ColumnMap::validate`], never here.
pub fn resolve_columns(
    headers: &[String],
    explicit: &BTreeMap<ColumnRole, String>,
    defaults: &BTreeMap<ColumnRole, Vec<&str>>,
) -> ColumnMap {
    let mut resolved = BTreeMap::new();

    for role in ColumnRole::ALL {
        if let Some(selection) = explicit.get(&role) {
            if !selection.is_empty() {
                resolved.insert(role, selection.clone());
                continue;
            }
        }

        let synonyms = match defaults.get(&role) {
            Some(s) => s,
            None => continue,
        };

        for synonym in synonyms {
            if let Some(header) = headers.iter().find(|h| h.eq_ignore_ascii_case(synonym)) {
                resolved.insert(role, header.clone());
                break;
            }
        }
    }

    ColumnMap { resolved }
}

/// Reads the header row of a CSV text, for column resolution ahead of a
/// full aggregation pass.
pub fn read_headers(csv_text: &str) -> Result<Vec<String>, IngestError> {
    let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
    let headers = reader.headers()?;
    Ok(headers.iter().map(str::to_string).collect())
}
