//! TOML-based run configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::filter::{ConditionFilter, Window};
use crate::io::load::SanityLimits;
use crate::model::{Channel, ModuleSelector};
use crate::normalize::ErrorPolicy;
use crate::series::{DetailLevel, SeriesSpec, XAxis};

/// Top-level run configuration parsed from TOML.
///
/// Every section has defaults. Load from TOML with
/// [`RunConfig::from_toml_file`] or use [`RunConfig::demo`] for the bundled
/// sample data.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Input table locations.
    #[serde(default)]
    pub input: InputConfig,
    /// Which reference record applies to the measurements.
    #[serde(default)]
    pub selection: SelectionConfig,
    /// Load-time row filter.
    #[serde(default)]
    pub sanity: SanityConfig,
    /// Operating-condition windows.
    #[serde(default)]
    pub filter: FilterConfig,
    /// Engine options.
    #[serde(default)]
    pub normalize: NormalizeConfig,
    /// Output locations and series selection.
    #[serde(default)]
    pub output: OutputConfig,
    /// Log verbosity.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Input table locations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// Reference (datasheet) CSV.
    pub reference: Option<PathBuf>,
    /// Measured time-series CSV.
    pub measurements: Option<PathBuf>,
}

/// Reference record selection. At most one field may be set; with none set
/// the measurement file name is matched against the `filename` column, then
/// row 0 is used.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionConfig {
    pub id: Option<String>,
    pub filename: Option<String>,
    pub row: Option<usize>,
}

impl SelectionConfig {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.filename.is_none() && self.row.is_none()
    }
}

/// Load-time row filter.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SanityConfig {
    /// Rows at or below this irradiance are dropped (W/m²).
    pub min_gti_w_m2: f64,
    /// Rows at or below this max power are dropped (W).
    pub min_pmp_w: f64,
}

impl Default for SanityConfig {
    fn default() -> Self {
        let limits = SanityLimits::default();
        Self {
            min_gti_w_m2: limits.min_gti_w_m2,
            min_pmp_w: limits.min_pmp_w,
        }
    }
}

/// Operating-condition windows, `[min, max)`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Irradiance lower bound (kW/m²).
    pub gti_min: Option<f64>,
    /// Irradiance upper bound (kW/m²).
    pub gti_max: Option<f64>,
    /// Module temperature lower bound (°C).
    pub tmod_min: Option<f64>,
    /// Module temperature upper bound (°C).
    pub tmod_max: Option<f64>,
}

/// Engine options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizeConfig {
    /// `"strict"` or `"permissive"`.
    pub policy: String,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            policy: "strict".to_string(),
        }
    }
}

/// Output locations and series selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Normalized table CSV.
    pub norm: Option<PathBuf>,
    /// Plot-ready series CSV.
    pub series: Option<PathBuf>,
    /// `"gti_kw_m2"`, `"temperature_module"` or `"date_time"`.
    pub x_axis: String,
    /// Series detail level (1-4).
    pub detail: u8,
    /// Channel used to colour series points.
    pub color_by: Option<String>,
    /// Include scaled weather columns in the series.
    pub weather: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            norm: None,
            series: None,
            x_axis: "gti_kw_m2".to_string(),
            detail: DetailLevel::MAX,
            color_by: None,
            weather: true,
        }
    }
}

/// Log verbosity.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `"info"` or `"mlfm=debug"`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"output.detail"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl RunConfig {
    /// Returns the demo preset: bundled sample reference and measurement
    /// files, everything else default.
    pub fn demo() -> Self {
        Self {
            input: InputConfig {
                reference: Some(PathBuf::from("data/ref.csv")),
                measurements: Some(PathBuf::from("data/nrel_cocoa_mSi_0188.csv")),
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["demo"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "demo" => Ok(Self::demo()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.input.reference.is_none() {
            errors.push(ConfigError {
                field: "input.reference".into(),
                message: "is required".into(),
            });
        }
        if self.input.measurements.is_none() {
            errors.push(ConfigError {
                field: "input.measurements".into(),
                message: "is required".into(),
            });
        }

        let sel = &self.selection;
        let chosen = [sel.id.is_some(), sel.filename.is_some(), sel.row.is_some()]
            .iter()
            .filter(|b| **b)
            .count();
        if chosen > 1 {
            errors.push(ConfigError {
                field: "selection".into(),
                message: "set at most one of id, filename, row".into(),
            });
        }

        let s = &self.sanity;
        if !s.min_gti_w_m2.is_finite() || s.min_gti_w_m2 < 0.0 {
            errors.push(ConfigError {
                field: "sanity.min_gti_w_m2".into(),
                message: "must be >= 0".into(),
            });
        }
        if !s.min_pmp_w.is_finite() || s.min_pmp_w < 0.0 {
            errors.push(ConfigError {
                field: "sanity.min_pmp_w".into(),
                message: "must be >= 0".into(),
            });
        }

        let f = &self.filter;
        if let (Some(lo), Some(hi)) = (f.gti_min, f.gti_max) {
            if lo >= hi {
                errors.push(ConfigError {
                    field: "filter.gti_min".into(),
                    message: "must be < filter.gti_max".into(),
                });
            }
        }
        if let (Some(lo), Some(hi)) = (f.tmod_min, f.tmod_max) {
            if lo >= hi {
                errors.push(ConfigError {
                    field: "filter.tmod_min".into(),
                    message: "must be < filter.tmod_max".into(),
                });
            }
        }

        if let Err(message) = self.normalize.policy.parse::<ErrorPolicy>() {
            errors.push(ConfigError {
                field: "normalize.policy".into(),
                message,
            });
        }

        let o = &self.output;
        if let Err(message) = o.x_axis.parse::<XAxis>() {
            errors.push(ConfigError {
                field: "output.x_axis".into(),
                message,
            });
        }
        if DetailLevel::new(o.detail).is_none() {
            errors.push(ConfigError {
                field: "output.detail".into(),
                message: format!(
                    "must be in [{}, {}], got {}",
                    DetailLevel::MIN,
                    DetailLevel::MAX,
                    o.detail
                ),
            });
        }
        if let Some(Err(message)) = o.color_by.as_deref().map(str::parse::<Channel>) {
            errors.push(ConfigError {
                field: "output.color_by".into(),
                message,
            });
        }

        if self.logging.level.trim().is_empty() {
            errors.push(ConfigError {
                field: "logging.level".into(),
                message: "must not be empty".into(),
            });
        }

        errors
    }

    /// Reference selector implied by the configuration.
    ///
    /// With no explicit selection this matches the measurement file name;
    /// see [`RunConfig::fallback_selector`] for what applies when that name
    /// is not in the table.
    pub fn selector(&self) -> ModuleSelector {
        let sel = &self.selection;
        if let Some(id) = &sel.id {
            ModuleSelector::Id(id.clone())
        } else if let Some(name) = &sel.filename {
            ModuleSelector::Filename(name.clone())
        } else if let Some(row) = sel.row {
            ModuleSelector::Row(row)
        } else if let Some(meas) = &self.input.measurements {
            ModuleSelector::Filename(meas.to_string_lossy().into_owned())
        } else {
            ModuleSelector::Row(0)
        }
    }

    /// Selector to retry with when [`RunConfig::selector`] matches nothing.
    ///
    /// Only the implicit file-name match has a fallback (row 0); an explicit
    /// id, filename or row never silently picks another module.
    pub fn fallback_selector(&self) -> Option<ModuleSelector> {
        self.selection.is_empty().then_some(ModuleSelector::Row(0))
    }

    pub fn sanity_limits(&self) -> SanityLimits {
        SanityLimits {
            min_gti_w_m2: self.sanity.min_gti_w_m2,
            min_pmp_w: self.sanity.min_pmp_w,
        }
    }

    pub fn condition_filter(&self) -> ConditionFilter {
        let f = &self.filter;
        ConditionFilter {
            gti_kw_m2: Window::new(f.gti_min, f.gti_max),
            temperature_module: Window::new(f.tmod_min, f.tmod_max),
        }
    }

    /// Engine error policy; invalid names were reported by [`RunConfig::validate`].
    pub fn policy(&self) -> ErrorPolicy {
        self.normalize.policy.parse().unwrap_or_default()
    }

    /// Series selection; invalid values were reported by [`RunConfig::validate`].
    pub fn series_spec(&self) -> SeriesSpec {
        let o = &self.output;
        SeriesSpec {
            x_axis: o.x_axis.parse().unwrap_or_default(),
            detail: DetailLevel::new(o.detail).unwrap_or_default(),
            color_by: o.color_by.as_deref().and_then(|c| c.parse().ok()),
            weather: o.weather,
        }
    }
}
