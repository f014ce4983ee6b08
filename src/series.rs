//! Plot-ready series of normalized MLFM values.
//!
//! Nothing here draws. A [`SeriesSpec`] picks the x axis, how many MLFM
//! channels to show, and an optional colour channel; [`write_series_csv`]
//! writes those columns so any plotting tool can render them.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{G_LIC, G_MAX, G_STC, T_MAX, T_STC};
use crate::error::Result;
use crate::model::{Channel, NormalizedRow};

/// Horizontal axis of a series plot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum XAxis {
    #[default]
    Irradiance,
    ModuleTemperature,
    DateTime,
}

impl XAxis {
    pub const NAMES: &[&str] = &["gti_kw_m2", "temperature_module", "date_time"];

    pub fn as_str(self) -> &'static str {
        match self {
            XAxis::Irradiance => "gti_kw_m2",
            XAxis::ModuleTemperature => "temperature_module",
            XAxis::DateTime => "date_time",
        }
    }

    /// Numeric axis range, `None` for time.
    pub fn limits(self) -> Option<(f64, f64)> {
        match self {
            XAxis::Irradiance => Some((0.0, G_MAX)),
            XAxis::ModuleTemperature => Some((0.0, T_MAX)),
            XAxis::DateTime => None,
        }
    }

    /// Vertical marker lines at the standard conditions on this axis.
    pub fn reference_lines(self) -> &'static [f64] {
        match self {
            XAxis::Irradiance => &[G_LIC, G_STC],
            XAxis::ModuleTemperature => &[T_STC],
            XAxis::DateTime => &[],
        }
    }

    fn cell(self, row: &NormalizedRow) -> String {
        match self {
            XAxis::Irradiance => row.gti_kw_m2.to_string(),
            XAxis::ModuleTemperature => row.temperature_module.to_string(),
            XAxis::DateTime => row.date_time.clone(),
        }
    }
}

impl FromStr for XAxis {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "gti_kw_m2" => Ok(XAxis::Irradiance),
            "temperature_module" => Ok(XAxis::ModuleTemperature),
            "date_time" => Ok(XAxis::DateTime),
            _ => Err(format!(
                "must be one of {}, got \"{s}\"",
                XAxis::NAMES.join(", ")
            )),
        }
    }
}

impl fmt::Display for XAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many MLFM channels a series plot shows, 1 (fewest) to 4 (all).
///
/// Levels are cumulative:
/// 1. `rsc`, `ffi`, `ffv`, `roc`, `voc_tcorr`
/// 2. adds `isc_tcorr`, `prdc_tcorr`
/// 3. adds `icurve`, `vcurve`
/// 4. adds `imp`, `vmp`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DetailLevel(u8);

impl DetailLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 4;

    pub fn new(level: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&level).then_some(Self(level))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn channels(self) -> Vec<Channel> {
        const TIERS: [&[Channel]; 4] = [
            &[
                Channel::Rsc,
                Channel::Ffi,
                Channel::Ffv,
                Channel::Roc,
                Channel::VocTcorr,
            ],
            &[Channel::IscTcorr, Channel::PrdcTcorr],
            &[Channel::Icurve, Channel::Vcurve],
            &[Channel::Imp, Channel::Vmp],
        ];
        TIERS[..usize::from(self.0)].concat()
    }
}

impl Default for DetailLevel {
    fn default() -> Self {
        Self(Self::MAX)
    }
}

/// Columns on the secondary axis: irradiance, and temperatures scaled by
/// 1/100 so they share the irradiance scale.
const WEATHER_OVERLAY: [(&str, Channel, f64); 3] = [
    ("gi", Channel::GtiKwM2, 1.0),
    ("tmod_c100", Channel::TemperatureModule, 0.01),
    ("tamb_c100", Channel::TemperatureAir, 0.01),
];

/// Selection of columns for one series export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesSpec {
    pub x_axis: XAxis,
    pub detail: DetailLevel,
    /// Extra column used to colour points.
    pub color_by: Option<Channel>,
    /// Include the scaled weather overlay columns.
    pub weather: bool,
}

impl SeriesSpec {
    /// Header row: x column, MLFM channels, overlay, colour.
    pub fn columns(&self) -> Vec<String> {
        let mut cols = vec![self.x_axis.as_str().to_string()];
        cols.extend(self.detail.channels().iter().map(|c| c.as_str().to_string()));
        if self.weather {
            cols.extend(WEATHER_OVERLAY.iter().map(|(name, _, _)| (*name).to_string()));
        }
        if let Some(c) = self.color_by {
            cols.push(format!("c_{c}"));
        }
        cols
    }

    /// One output line for `row`, aligned with [`SeriesSpec::columns`].
    pub fn record(&self, row: &NormalizedRow) -> Vec<String> {
        let mut rec = vec![self.x_axis.cell(row)];
        rec.extend(
            self.detail
                .channels()
                .iter()
                .map(|c| format!("{:.6}", row.value(*c))),
        );
        if self.weather {
            rec.extend(
                WEATHER_OVERLAY
                    .iter()
                    .map(|(_, c, scale)| format!("{:.6}", row.value(*c) * scale)),
            );
        }
        if let Some(c) = self.color_by {
            rec.push(format!("{:.6}", row.value(c)));
        }
        rec
    }

    /// Title used for the export, e.g. `mlfm__site_module__x=gti_kw_m2_detail=4`.
    pub fn title(&self, dataset: &str, filter_label: &str) -> String {
        let mut title = format!(
            "mlfm__{dataset}__x={}_detail={}",
            self.x_axis,
            self.detail.get()
        );
        if let Some(c) = self.color_by {
            title.push_str(&format!("_c={c}"));
        }
        if !filter_label.is_empty() {
            title.push('_');
            title.push_str(filter_label);
        }
        title
    }
}

/// Plot settings that go with a series CSV: title, x range and the
/// vertical marker lines at the standard conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesMeta {
    pub title: String,
    pub x_axis: String,
    /// `[min, max]`; absent for a time axis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_limits: Option<[f64; 2]>,
    pub reference_lines: Vec<f64>,
    pub columns: Vec<String>,
}

impl SeriesSpec {
    pub fn meta(&self, dataset: &str, filter_label: &str) -> SeriesMeta {
        SeriesMeta {
            title: self.title(dataset, filter_label),
            x_axis: self.x_axis.as_str().to_string(),
            x_limits: self.x_axis.limits().map(|(lo, hi)| [lo, hi]),
            reference_lines: self.x_axis.reference_lines().to_vec(),
            columns: self.columns(),
        }
    }
}

/// Metadata file for a series CSV: `series.csv` -> `series.meta.toml`.
pub fn meta_path(series: &Path) -> PathBuf {
    series.with_extension("meta.toml")
}

/// Writes series metadata as TOML.
///
/// # Errors
///
/// Returns [`crate::MlfmError::Toml`] if serialization fails or
/// [`crate::MlfmError::Io`] if the file cannot be written.
pub fn export_series_meta(meta: &SeriesMeta, path: &Path) -> Result<()> {
    fs::write(path, toml::to_string(meta)?)?;
    Ok(())
}

/// Writes the selected series as CSV.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_series_csv(
    rows: &[NormalizedRow],
    spec: &SeriesSpec,
    writer: impl Write,
) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(spec.columns())?;
    for r in rows {
        wtr.write_record(spec.record(r))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the selected series to a CSV file.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_series_csv(rows: &[NormalizedRow], spec: &SeriesSpec, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_series_csv(rows, spec, io::BufWriter::new(file))
}
