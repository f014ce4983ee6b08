//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use mlfm::model::{MeasurementRow, ReferenceRecord};

/// Reference module used across integration tests
/// (5.0 A / 4.7 A / 30 V / 37 V, alpha 0.0004, beta -0.003, gamma -0.004).
pub fn reference() -> ReferenceRecord {
    ReferenceRecord::new(5.0, 4.7, 30.0, 37.0, 0.0004, -0.003, -0.004)
}

/// Measurement at STC matching [`reference`].
pub fn stc_row() -> MeasurementRow {
    MeasurementRow {
        date_time: "2011-06-01T12:00:00".to_string(),
        gti_kw_m2: 1.0,
        temperature_air: 22.0,
        temperature_module: 25.0,
        wind_speed: 2.0,
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

/// A day of plausible outdoor measurements for [`reference`].
///
/// Irradiance ramps from 0.1 to 1.1 kW/m² and back; module temperature
/// follows irradiance.
pub fn outdoor_day(n: usize) -> Vec<MeasurementRow> {
    (0..n)
        .map(|i| {
            let x = i as f64 / (n.max(2) - 1) as f64;
            let g = 0.1 + 1.0 * (std::f64::consts::PI * x).sin();
            let tmod = 15.0 + 30.0 * g;
            let isc = 5.0 * g * (1.0 + 0.0004 * (tmod - 25.0));
            let voc = 37.0 * (1.0 - 0.003 * (tmod - 25.0)) * (1.0 + 0.02 * g.ln());
            let rsc = 250.0 + 40.0 / g;
            let roc = 0.55 + 0.05 / g;
            let imp = 0.93 * isc;
            let vmp = 0.8 * voc;
            MeasurementRow {
                date_time: format!("2011-06-01T{:02}:{:02}:00", 6 + i / 4, (i % 4) * 15),
                gti_kw_m2: g,
                temperature_air: tmod - 20.0 * g,
                temperature_module: tmod,
                wind_speed: 1.0 + x,
                isc,
                rsc,
                imp,
                vmp,
                roc,
                voc,
                i_half_vmp: 0.99 * (isc - vmp / (2.0 * rsc)),
                v_half_imp: 1.01 * (voc - imp / 2.0 * roc),
            }
        })
        .collect()
}

/// Relative closeness check.
pub fn rel_close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol * a.abs().max(b.abs()).max(f64::MIN_POSITIVE)
}
