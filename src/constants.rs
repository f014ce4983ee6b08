//! Reference operating conditions used for normalization and plot limits.

/// STC module temperature (°C).
pub const T_STC: f64 = 25.0;
/// STC irradiance (kW/m²).
pub const G_STC: f64 = 1.0;
/// Low irradiance condition (kW/m²).
pub const G_LIC: f64 = 0.2;

/// Upper irradiance limit for plots (kW/m²).
pub const G_MAX: f64 = 1.4;
/// Upper module temperature limit for plots (°C).
pub const T_MAX: f64 = 80.0;

/// Irradiance unit conversion, W/m² per kW/m².
pub const W_PER_KW: f64 = 1000.0;
