//! CSV loading of reference and measurement tables.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::constants::W_PER_KW;
use crate::error::{MlfmError, Result};
use crate::model::{MeasurementRow, ReferenceRecord, ReferenceTable};

/// Columns every reference table must have.
pub const REFERENCE_COLUMNS: &[&str] = &[
    "isc_ref",
    "imp_ref",
    "vmp_ref",
    "voc_ref",
    "alpha_isc_ref_norm",
    "beta_voc_ref_norm",
    "gamma_pmp_ref_norm",
];

/// Columns every measurement table must have, besides irradiance.
pub const MEASUREMENT_COLUMNS: &[&str] = &[
    "date_time",
    "wind_speed",
    "temperature_air",
    "temperature_module",
    "isc",
    "rsc",
    "imp",
    "vmp",
    "roc",
    "voc",
    "i_half_vmp",
    "v_half_imp",
];

/// Row-level limits applied while loading measurements.
///
/// Rows at or below either limit are dropped before they reach the
/// normalization engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SanityLimits {
    /// Irradiance floor (W/m²).
    pub min_gti_w_m2: f64,
    /// Measured max-power floor (W).
    pub min_pmp_w: f64,
}

impl Default for SanityLimits {
    fn default() -> Self {
        Self {
            min_gti_w_m2: 1.0,
            min_pmp_w: 0.0,
        }
    }
}

/// Counts of rows read and dropped by [`load_measurements`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub read: usize,
    pub kept: usize,
    /// Rows with an empty, unparsable or non-finite value.
    pub dropped_missing: usize,
    pub dropped_irradiance: usize,
    pub dropped_power: usize,
}

/// Measurements that passed the sanity filter, with the load counts.
#[derive(Debug, Clone, Default)]
pub struct LoadedMeasurements {
    pub rows: Vec<MeasurementRow>,
    pub report: LoadReport,
}

#[derive(Debug, Deserialize)]
struct MeasurementRecord {
    date_time: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    gti: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    gti_kw_m2: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    wind_speed: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    temperature_air: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    temperature_module: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    isc: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    rsc: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    imp: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    vmp: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    roc: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    voc: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pmp: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    i_half_vmp: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    v_half_imp: Option<f64>,
}

impl MeasurementRecord {
    /// Returns the row and its measured power, or `None` if any required
    /// value is missing or non-finite.
    fn into_row(self) -> Option<(MeasurementRow, f64)> {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        let gti_kw_m2 = finite(self.gti_kw_m2).or_else(|| finite(self.gti).map(|g| g / W_PER_KW))?;
        let row = MeasurementRow {
            date_time: self.date_time,
            gti_kw_m2,
            temperature_air: finite(self.temperature_air)?,
            temperature_module: finite(self.temperature_module)?,
            wind_speed: finite(self.wind_speed)?,
            isc: finite(self.isc)?,
            rsc: finite(self.rsc)?,
            imp: finite(self.imp)?,
            vmp: finite(self.vmp)?,
            roc: finite(self.roc)?,
            voc: finite(self.voc)?,
            i_half_vmp: finite(self.i_half_vmp)?,
            v_half_imp: finite(self.v_half_imp)?,
        };
        let pmp = match self.pmp {
            Some(p) if p.is_finite() => p,
            Some(_) => return None,
            None => row.pmp(),
        };
        Some((row, pmp))
    }
}

fn reader_for<R: io::Read>(rdr: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(rdr)
}

fn require_columns(
    headers: &csv::StringRecord,
    table: &'static str,
    required: &[&str],
) -> Result<()> {
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(MlfmError::MissingColumn {
                table,
                column: (*column).to_string(),
            });
        }
    }
    Ok(())
}

/// Reads a reference table from CSV.
///
/// # Errors
///
/// Returns [`MlfmError::MissingColumn`] before parsing any row if a column
/// of [`REFERENCE_COLUMNS`] is absent, or [`MlfmError::Csv`] for a
/// malformed row.
pub fn read_reference_table<R: io::Read>(rdr: R) -> Result<ReferenceTable> {
    let mut csv_rdr = reader_for(rdr);
    let headers = csv_rdr.headers()?.clone();
    require_columns(&headers, "reference", REFERENCE_COLUMNS)?;

    let records = csv_rdr
        .deserialize::<ReferenceRecord>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    debug!(records = records.len(), "reference table read");
    Ok(ReferenceTable::new(records))
}

/// Loads a reference table from a CSV file.
///
/// # Errors
///
/// Returns [`MlfmError::Io`] if the file cannot be opened, otherwise as
/// [`read_reference_table`].
pub fn load_reference_table(path: &Path) -> Result<ReferenceTable> {
    let file = File::open(path)?;
    let table = read_reference_table(BufReader::new(file))?;
    info!(path = %path.display(), records = table.len(), "loaded reference table");
    Ok(table)
}

/// Reads measurements from CSV and applies the sanity filter.
///
/// Irradiance is taken from `gti_kw_m2` when present, otherwise from `gti`
/// in W/m². Measured power comes from `pmp` when present, otherwise
/// `imp * vmp`. A row is dropped if a required value is missing or
/// non-finite, if irradiance is at or below `limits.min_gti_w_m2`, or if
/// power is at or below `limits.min_pmp_w`.
///
/// # Errors
///
/// Returns [`MlfmError::MissingColumn`] if a column of
/// [`MEASUREMENT_COLUMNS`] or both irradiance columns are absent, or
/// [`MlfmError::Csv`] for a structurally malformed file.
pub fn read_measurements<R: io::Read>(rdr: R, limits: &SanityLimits) -> Result<LoadedMeasurements> {
    let mut csv_rdr = reader_for(rdr);
    let headers = csv_rdr.headers()?.clone();
    require_columns(&headers, "measurements", MEASUREMENT_COLUMNS)?;
    if !headers.iter().any(|h| h == "gti" || h == "gti_kw_m2") {
        return Err(MlfmError::MissingColumn {
            table: "measurements",
            column: "gti".to_string(),
        });
    }

    let mut out = LoadedMeasurements::default();
    for record in csv_rdr.deserialize::<MeasurementRecord>() {
        let record = record?;
        out.report.read += 1;

        let Some((row, pmp)) = record.into_row() else {
            out.report.dropped_missing += 1;
            continue;
        };
        if row.gti_kw_m2 * W_PER_KW <= limits.min_gti_w_m2 {
            out.report.dropped_irradiance += 1;
            continue;
        }
        if pmp <= limits.min_pmp_w {
            out.report.dropped_power += 1;
            continue;
        }
        out.rows.push(row);
    }
    out.report.kept = out.rows.len();
    Ok(out)
}

/// Loads measurements from a CSV file and applies the sanity filter.
///
/// # Errors
///
/// Returns [`MlfmError::Io`] if the file cannot be opened, otherwise as
/// [`read_measurements`].
pub fn load_measurements(path: &Path, limits: &SanityLimits) -> Result<LoadedMeasurements> {
    let file = File::open(path)?;
    let loaded = read_measurements(BufReader::new(file), limits)?;
    let r = &loaded.report;
    info!(
        path = %path.display(),
        read = r.read,
        kept = r.kept,
        dropped_missing = r.dropped_missing,
        dropped_irradiance = r.dropped_irradiance,
        dropped_power = r.dropped_power,
        "loaded measurements"
    );
    Ok(loaded)
}
