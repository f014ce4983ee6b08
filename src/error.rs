//! Error types for loading and normalizing MLFM data.

use std::fmt;

use thiserror::Error;

use crate::model::Channel;

/// Identifies the measurement row an error refers to.
///
/// `index` is the zero-based position in the slice handed to the engine;
/// `date_time` is the row's timestamp as it appeared in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowId {
    pub index: usize,
    pub date_time: String,
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} ({})", self.index, self.date_time)
    }
}

/// Error type for MLFM operations.
#[derive(Debug, Error)]
pub enum MlfmError {
    /// The selected reference record is missing or physically invalid.
    #[error("invalid reference: {reason}")]
    InvalidReference { reason: String },

    /// `rsc == roc`, so the tangent lines at Isc and Voc never intersect.
    #[error("degenerate IV curve at {row}: rsc ({rsc}) equals roc ({roc})")]
    DegenerateCurve { row: RowId, rsc: f64, roc: f64 },

    /// Irradiance must be strictly positive to normalize currents and power.
    #[error("non-positive irradiance at {row}: gti_kw_m2 = {gti_kw_m2}")]
    NonPositiveIrradiance { row: RowId, gti_kw_m2: f64 },

    /// A derived channel came out infinite or NaN.
    #[error("non-finite {channel} at {row}")]
    NonFiniteChannel { row: RowId, channel: Channel },

    /// A required column is absent from an input table header.
    #[error("missing column '{column}' in {table} table")]
    MissingColumn { table: &'static str, column: String },

    /// A required input path is absent from the run configuration.
    #[error("{field} is not set")]
    MissingInput { field: &'static str },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),
}

/// Result type alias for MLFM operations.
pub type Result<T> = std::result::Result<T, MlfmError>;

impl MlfmError {
    /// The offending measurement row, for row-level errors.
    pub fn row(&self) -> Option<&RowId> {
        match self {
            MlfmError::DegenerateCurve { row, .. }
            | MlfmError::NonPositiveIrradiance { row, .. }
            | MlfmError::NonFiniteChannel { row, .. } => Some(row),
            _ => None,
        }
    }

    /// Returns true if the error concerns a single measurement row and the
    /// rest of the batch can still be processed.
    pub fn is_row_error(&self) -> bool {
        self.row().is_some()
    }
}
