//! Measurement-to-normalized conversion for the Loss Factors Model.
//!
//! Every measured IV-curve snapshot is turned into multiplicative loss
//! factors relative to the module's STC datasheet values:
//!
//! ```text
//! prdc = 1/ff_ref * (isc * rsc * ffi) * (ffv * roc * voc)
//! ```
//!
//! The current side (`isc`, `rsc`, `ffi`) and the voltage side (`ffv`,
//! `roc`, `voc`) are split at the intersection `(ir, vr)` of the tangents
//! to the IV curve at short circuit and open circuit.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::constants::T_STC;
use crate::error::{MlfmError, Result, RowId};
use crate::model::{Channel, MeasurementRow, ModuleSelector, NormalizedRow, ReferenceRecord, ReferenceTable};

/// What to do when a single measurement row cannot be normalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Fail the whole pass on the first bad row.
    #[default]
    Strict,
    /// Skip bad rows, log them, and report them in [`Normalization::skipped`].
    Permissive,
}

impl ErrorPolicy {
    pub const NAMES: &[&str] = &["strict", "permissive"];
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "strict" => Ok(ErrorPolicy::Strict),
            "permissive" => Ok(ErrorPolicy::Permissive),
            _ => Err(format!(
                "must be one of {}, got \"{s}\"",
                ErrorPolicy::NAMES.join(", ")
            )),
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPolicy::Strict => f.write_str("strict"),
            ErrorPolicy::Permissive => f.write_str("permissive"),
        }
    }
}

/// Output of one normalization pass.
#[derive(Debug, Default)]
pub struct Normalization {
    /// Normalized rows, in input order.
    pub rows: Vec<NormalizedRow>,
    /// Rows dropped under [`ErrorPolicy::Permissive`], in input order.
    /// Always empty under [`ErrorPolicy::Strict`].
    pub skipped: Vec<MlfmError>,
}

/// Intersection of the tangent at `(0, isc)` with slope `-1/rsc` and the
/// tangent at `(voc, 0)` with slope `-1/roc`.
///
/// Returns `(ir, vr)`, or `None` when the tangents are parallel.
pub fn tangent_intersection(isc: f64, rsc: f64, roc: f64, voc: f64) -> Option<(f64, f64)> {
    let denom = rsc - roc;
    if denom == 0.0 {
        return None;
    }
    let ir = (isc * rsc - voc) / denom;
    let vr = rsc * (voc - isc * roc) / denom;
    Some((ir, vr))
}

/// Normalizes one measurement against `reference`.
///
/// `index` only labels errors; it does not affect the result.
///
/// # Errors
///
/// * [`MlfmError::NonPositiveIrradiance`] if `gti_kw_m2 <= 0` (or NaN)
/// * [`MlfmError::DegenerateCurve`] if `rsc == roc`
/// * [`MlfmError::NonFiniteChannel`] if any derived channel is infinite or NaN
pub fn normalize_row(
    reference: &ReferenceRecord,
    meas: &MeasurementRow,
    index: usize,
) -> Result<NormalizedRow> {
    let row_id = || RowId {
        index,
        date_time: meas.date_time.clone(),
    };

    let g = meas.gti_kw_m2;
    if !(g > 0.0) {
        return Err(MlfmError::NonPositiveIrradiance {
            row: row_id(),
            gti_kw_m2: g,
        });
    }

    let (ir, vr) = tangent_intersection(meas.isc, meas.rsc, meas.roc, meas.voc).ok_or_else(
        || MlfmError::DegenerateCurve {
            row: row_id(),
            rsc: meas.rsc,
            roc: meas.roc,
        },
    )?;

    let isc_ref = reference.isc_ref;
    let voc_ref = reference.voc_ref;

    let isc = meas.isc / (g * isc_ref);
    let voc = meas.voc / voc_ref;
    let prdc = (meas.imp * meas.vmp) / (reference.pmp_ref() * g);

    // Denominators are the linear extrapolations from Isc along Rsc and from
    // Voc along Roc. vcurve's form is not the mirror image of icurve's.
    let icurve = meas.i_half_vmp / (meas.isc - meas.vmp / (2.0 * meas.rsc));
    let vcurve = meas.v_half_imp / (meas.voc - meas.imp / 2.0 * meas.roc);

    let delta_t = meas.temperature_module - T_STC;

    let norm = NormalizedRow {
        date_time: meas.date_time.clone(),
        gti_kw_m2: g,
        temperature_air: meas.temperature_air,
        temperature_module: meas.temperature_module,
        wind_speed: meas.wind_speed,

        isc,
        rsc: ir / meas.isc,
        ffi: meas.imp / ir,
        ffv: meas.vmp / vr,
        roc: vr / meas.voc,
        voc,
        imp: meas.imp / (g * isc_ref),
        vmp: meas.vmp / voc_ref,
        prdc,

        icurve,
        vcurve,

        isc_tcorr: isc * (1.0 - reference.alpha_isc_ref_norm * delta_t),
        voc_tcorr: voc * (1.0 - reference.beta_voc_ref_norm * delta_t),
        prdc_tcorr: prdc * (1.0 - reference.gamma_pmp_ref_norm * delta_t),
    };

    if let Some(channel) = Channel::MLFM
        .into_iter()
        .find(|c| !norm.value(*c).is_finite())
    {
        return Err(MlfmError::NonFiniteChannel {
            row: row_id(),
            channel,
        });
    }

    Ok(norm)
}

/// Converts measured IV-curve values into normalized MLFM values.
///
/// The reference record is validated once, before any row is touched.
/// Under [`ErrorPolicy::Strict`] the output has exactly one row per input
/// row; under [`ErrorPolicy::Permissive`] `rows.len() + skipped.len()`
/// equals the input length. Order is preserved either way.
///
/// # Arguments
///
/// * `reference` - STC values and temperature coefficients of the module
/// * `meas` - Measured rows, already sanity filtered
/// * `policy` - How to handle rows that cannot be normalized
///
/// # Errors
///
/// Returns [`MlfmError::InvalidReference`] for a bad reference record, and
/// under the strict policy the first row-level error encountered.
pub fn meas_to_norm(
    reference: &ReferenceRecord,
    meas: &[MeasurementRow],
    policy: ErrorPolicy,
) -> Result<Normalization> {
    reference.validate()?;
    debug!(reference = %reference, ff_ref = reference.ff_ref(), "reference values");

    let mut out = Normalization {
        rows: Vec::with_capacity(meas.len()),
        skipped: Vec::new(),
    };

    for (index, m) in meas.iter().enumerate() {
        match normalize_row(reference, m, index) {
            Ok(row) => out.rows.push(row),
            Err(e) if policy == ErrorPolicy::Permissive && e.is_row_error() => {
                warn!("skipping measurement: {e}");
                out.skipped.push(e);
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        input = meas.len(),
        normalized = out.rows.len(),
        skipped = out.skipped.len(),
        %policy,
        "normalization complete"
    );
    Ok(out)
}

/// Selects the module's reference record from `table` and normalizes `meas`
/// against it.
///
/// # Errors
///
/// Returns [`MlfmError::InvalidReference`] if `selector` matches no record,
/// otherwise whatever [`meas_to_norm`] returns.
pub fn normalize_table(
    table: &ReferenceTable,
    selector: &ModuleSelector,
    meas: &[MeasurementRow],
    policy: ErrorPolicy,
) -> Result<Normalization> {
    let reference = table.select(selector)?;
    if !reference.is_active() {
        warn!(%selector, "reference record is marked inactive");
    }
    info!(%selector, module = %reference.module, id = %reference.id, "selected reference");
    meas_to_norm(reference, meas, policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> ReferenceRecord {
        ReferenceRecord::new(5.0, 4.7, 30.0, 37.0, 0.0004, -0.003, -0.004)
    }

    fn meas() -> MeasurementRow {
        MeasurementRow {
            date_time: "2011-06-01T12:00:00".to_string(),
            gti_kw_m2: 1.0,
            temperature_air: 20.0,
            temperature_module: 25.0,
            wind_speed: 1.5,
            isc: 5.0,
            rsc: 50.0,
            imp: 4.7,
            vmp: 30.0,
            roc: 5.0,
            voc: 37.0,
            i_half_vmp: 4.9,
            v_half_imp: 35.0,
        }
    }

    #[test]
    fn tangent_intersection_values() {
        // ir = (5*50 - 37) / 45, vr = 50 * (37 - 25) / 45
        let (ir, vr) = tangent_intersection(5.0, 50.0, 5.0, 37.0).unwrap();
        assert!((ir - 213.0 / 45.0).abs() < 1e-12);
        assert!((vr - 600.0 / 45.0).abs() < 1e-12);
    }

    #[test]
    fn tangent_intersection_lies_on_both_tangents() {
        let (isc, rsc, roc, voc) = (8.2, 320.0, 0.45, 44.1);
        let (ir, vr) = tangent_intersection(isc, rsc, roc, voc).unwrap();
        assert!((ir - (isc - vr / rsc)).abs() < 1e-9);
        assert!((ir - (voc - vr) / roc).abs() < 1e-9);
    }

    #[test]
    fn parallel_tangents_have_no_intersection() {
        assert!(tangent_intersection(5.0, 5.0, 5.0, 37.0).is_none());
    }

    #[test]
    fn stc_row_normalizes_to_unity() {
        let n = normalize_row(&reference(), &meas(), 0).unwrap();
        assert!((n.isc - 1.0).abs() < 1e-6);
        assert!((n.voc - 1.0).abs() < 1e-6);
        assert!((n.prdc - 1.0).abs() < 1e-3);
        assert_eq!(n.isc_tcorr, n.isc);
        assert_eq!(n.voc_tcorr, n.voc);
        assert_eq!(n.prdc_tcorr, n.prdc);
    }

    #[test]
    fn weather_passes_through() {
        let n = normalize_row(&reference(), &meas(), 0).unwrap();
        assert_eq!(n.date_time, "2011-06-01T12:00:00");
        assert_eq!(n.gti_kw_m2, 1.0);
        assert_eq!(n.temperature_air, 20.0);
        assert_eq!(n.wind_speed, 1.5);
    }

    #[test]
    fn curvature_factors_literal_formulas() {
        let n = normalize_row(&reference(), &meas(), 0).unwrap();
        // icurve = 4.9 / (5.0 - 30/(2*50)) = 4.9 / 4.7
        assert!((n.icurve - 4.9 / 4.7).abs() < 1e-12);
        // vcurve = 35 / (37 - 4.7/2*5) = 35 / 25.25
        assert!((n.vcurve - 35.0 / 25.25).abs() < 1e-12);
    }

    #[test]
    fn temperature_correction_at_hot_module() {
        let mut m = meas();
        m.temperature_module = 45.0;
        let n = normalize_row(&reference(), &m, 0).unwrap();
        // delta_t = 20
        assert!((n.isc_tcorr - n.isc * (1.0 - 0.0004 * 20.0)).abs() < 1e-12);
        assert!((n.voc_tcorr - n.voc * 1.06).abs() < 1e-12);
        assert!((n.prdc_tcorr - n.prdc * 1.08).abs() < 1e-12);
    }

    #[test]
    fn irradiance_scales_current_not_voltage() {
        let mut m = meas();
        m.gti_kw_m2 = 0.5;
        let n = normalize_row(&reference(), &m, 0).unwrap();
        assert!((n.isc - 2.0).abs() < 1e-12);
        assert!((n.imp - 4.7 / 2.5).abs() < 1e-12);
        assert!((n.voc - 1.0).abs() < 1e-12);
        assert!((n.vmp - 30.0 / 37.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_curve_is_reported() {
        let mut m = meas();
        m.roc = m.rsc;
        let err = normalize_row(&reference(), &m, 7).unwrap_err();
        assert!(matches!(err, MlfmError::DegenerateCurve { .. }));
        assert_eq!(err.row().map(|r| r.index), Some(7));
    }

    #[test]
    fn zero_irradiance_is_reported() {
        let mut m = meas();
        m.gti_kw_m2 = 0.0;
        let err = normalize_row(&reference(), &m, 2).unwrap_err();
        assert!(matches!(err, MlfmError::NonPositiveIrradiance { .. }));
    }

    #[test]
    fn nan_irradiance_is_reported() {
        let mut m = meas();
        m.gti_kw_m2 = f64::NAN;
        assert!(matches!(
            normalize_row(&reference(), &m, 0),
            Err(MlfmError::NonPositiveIrradiance { .. })
        ));
    }

    #[test]
    fn zero_isc_is_non_finite() {
        let mut m = meas();
        m.isc = 0.0;
        let err = normalize_row(&reference(), &m, 0).unwrap_err();
        assert!(matches!(
            err,
            MlfmError::NonFiniteChannel {
                channel: Channel::Rsc,
                ..
            }
        ));
    }

    #[test]
    fn strict_policy_fails_whole_batch() {
        let mut bad = meas();
        bad.roc = bad.rsc;
        let rows = vec![meas(), bad, meas()];
        let result = meas_to_norm(&reference(), &rows, ErrorPolicy::Strict);
        assert!(matches!(result, Err(MlfmError::DegenerateCurve { .. })));
    }

    #[test]
    fn permissive_policy_skips_and_keeps_order() {
        let mut bad = meas();
        bad.gti_kw_m2 = -0.1;
        let mut a = meas();
        a.date_time = "a".to_string();
        let mut c = meas();
        c.date_time = "c".to_string();
        let rows = vec![a, bad, c];

        let out = meas_to_norm(&reference(), &rows, ErrorPolicy::Permissive).unwrap();
        assert_eq!(out.rows.len() + out.skipped.len(), rows.len());
        assert_eq!(out.rows[0].date_time, "a");
        assert_eq!(out.rows[1].date_time, "c");
        assert_eq!(out.skipped[0].row().map(|r| r.index), Some(1));
    }

    #[test]
    fn invalid_reference_fails_before_rows() {
        let mut r = reference();
        r.isc_ref = -5.0;
        let result = meas_to_norm(&r, &[], ErrorPolicy::Permissive);
        assert!(matches!(result, Err(MlfmError::InvalidReference { .. })));
    }

    #[test]
    fn policy_parses() {
        assert_eq!("strict".parse::<ErrorPolicy>(), Ok(ErrorPolicy::Strict));
        assert_eq!(
            "permissive".parse::<ErrorPolicy>(),
            Ok(ErrorPolicy::Permissive)
        );
        assert!("lenient".parse::<ErrorPolicy>().is_err());
    }
}
