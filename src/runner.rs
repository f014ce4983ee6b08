//! End-to-end run: load, select, filter, normalize, export.

use std::path::Path;

use tracing::{info, warn};

use crate::config::RunConfig;
use crate::error::{MlfmError, Result};
use crate::io::export::export_norm_csv;
use crate::io::load::{LoadReport, load_measurements, load_reference_table};
use crate::normalize::{Normalization, normalize_table};
use crate::series::{export_series_csv, export_series_meta, meta_path};
use crate::summary::NormSummary;

/// Everything a run produced.
#[derive(Debug)]
pub struct RunOutput {
    pub load: LoadReport,
    /// Rows removed by the condition filter.
    pub filtered_out: usize,
    pub normalization: Normalization,
    pub summary: NormSummary,
}

/// Runs the full pipeline described by `cfg`.
///
/// `cfg` is expected to have passed [`RunConfig::validate`].
///
/// # Errors
///
/// Returns the first load, selection, normalization or export error.
pub fn run(cfg: &RunConfig) -> Result<RunOutput> {
    let ref_path = required_path(cfg.input.reference.as_deref(), "input.reference")?;
    let meas_path = required_path(cfg.input.measurements.as_deref(), "input.measurements")?;

    let table = load_reference_table(ref_path)?;
    let loaded = load_measurements(meas_path, &cfg.sanity_limits())?;

    let filter = cfg.condition_filter();
    let meas = if filter.is_empty() {
        loaded.rows
    } else {
        let kept = filter.apply(&loaded.rows);
        info!(filter = %filter.label(), kept = kept.len(), of = loaded.rows.len(), "condition filter applied");
        kept
    };
    let filtered_out = loaded.report.kept - meas.len();

    let mut selector = cfg.selector();
    if let (Err(e), Some(fallback)) = (table.select(&selector), cfg.fallback_selector()) {
        warn!(%fallback, "{e}; using fallback");
        selector = fallback;
    }
    let normalization = normalize_table(&table, &selector, &meas, cfg.policy())?;
    let summary = NormSummary::from_rows(&normalization.rows);

    if let Some(path) = &cfg.output.norm {
        export_norm_csv(&normalization.rows, path)?;
        info!(path = %path.display(), rows = normalization.rows.len(), "normalized table written");
    }
    if let Some(path) = &cfg.output.series {
        let spec = cfg.series_spec();
        export_series_csv(&normalization.rows, &spec, path)?;
        let dataset = meas_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let meta = spec.meta(&dataset, &filter.label());
        let meta_file = meta_path(path);
        export_series_meta(&meta, &meta_file)?;
        info!(path = %path.display(), meta = %meta_file.display(), title = %meta.title, "series written");
    }

    Ok(RunOutput {
        load: loaded.report,
        filtered_out,
        normalization,
        summary,
    })
}

fn required_path<'a>(path: Option<&'a Path>, field: &'static str) -> Result<&'a Path> {
    path.ok_or(MlfmError::MissingInput { field })
}
