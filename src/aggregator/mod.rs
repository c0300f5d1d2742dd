//! Track aggregation pipeline.
//!
//! This module turns raw CSV text plus a resolved column map into per-entity
//! ordered tracks and per-attribute streaming statistics, classified as
//! numeric or categorical for downstream filter/legend controls.

pub mod aggregate;
pub mod types;
pub mod utility;
