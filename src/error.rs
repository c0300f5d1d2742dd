//! Typed failures for the ingestion pipeline.
//!
//! Only schema resolution and CSV tokenization can fail a load; row-level
//! data-quality problems are filtered or kept as sentinel values instead.

use thiserror::Error;

use crate::columns::ColumnRole;

#[derive(Debug, Error)]
pub enum IngestError {
    /// A required role has no explicit selection and no default synonym
    /// matched the header row. Raised before any data row is parsed.
    #[error("required column for {role} could not be resolved against the CSV header")]
    UnresolvedRequiredColumn { role: ColumnRole },

    /// A role resolved to a header that is not present in the header row,
    /// e.g. a stale explicit selection from a previous file.
    #[error("column '{header}' selected for {role} is not present in the CSV header")]
    MissingSelectedColumn { role: ColumnRole, header: String },

    /// The CSV text could not be tokenized into consistent rows. The whole
    /// load fails; no partial result is returned.
    #[error("malformed CSV input: {0}")]
    MalformedInput(#[from] csv::Error),
}
