/// Weather and raw electrical values from one IV-curve snapshot.
///
/// Irradiance is already in kW/m², so `gti_kw_m2 == 1.0` is STC irradiance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementRow {
    /// ISO 8601 timestamp, kept exactly as read.
    pub date_time: String,
    /// Plane-of-array global irradiance (kW/m²).
    pub gti_kw_m2: f64,
    /// Ambient air temperature (°C).
    pub temperature_air: f64,
    /// Module temperature (°C).
    pub temperature_module: f64,
    /// Wind speed (m/s).
    pub wind_speed: f64,

    /// Short-circuit current (A), not temperature corrected.
    pub isc: f64,
    /// `-1/(dI/dV)` at `V = 0` (Ω).
    pub rsc: f64,
    /// Max-power current (A).
    pub imp: f64,
    /// Max-power voltage (V).
    pub vmp: f64,
    /// `-1/(dI/dV)` at `I = 0` (Ω).
    pub roc: f64,
    /// Open-circuit voltage (V), not temperature corrected.
    pub voc: f64,

    /// Current at `V = vmp / 2` (A).
    pub i_half_vmp: f64,
    /// Voltage at `I = imp / 2` (V).
    pub v_half_imp: f64,
}

impl MeasurementRow {
    /// Measured max power (W).
    pub fn pmp(&self) -> f64 {
        self.imp * self.vmp
    }
}
