use std::fmt;

use serde::Deserialize;

use crate::error::{MlfmError, Result};

/// Datasheet STC values and temperature coefficients for one module.
///
/// Deserialized from one row of the reference CSV. Only the four STC
/// electrical values and the three coefficients used for temperature
/// correction are required; the remaining columns are descriptive.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReferenceRecord {
    /// Explicit row number, if the table carries one.
    #[serde(default)]
    pub row: Option<usize>,
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub id: String,

    /// STC short-circuit current (A).
    pub isc_ref: f64,
    /// STC max-power current (A).
    pub imp_ref: f64,
    /// STC max-power voltage (V).
    pub vmp_ref: f64,
    /// STC open-circuit voltage (V).
    pub voc_ref: f64,

    /// Normalized Isc temperature coefficient (1/K).
    pub alpha_isc_ref_norm: f64,
    /// Normalized Imp temperature coefficient (1/K).
    #[serde(default)]
    pub alpha_imp_ref_norm: Option<f64>,
    /// Normalized Vmp temperature coefficient (1/K).
    #[serde(default)]
    pub beta_vmp_ref_norm: Option<f64>,
    /// Normalized Voc temperature coefficient (1/K).
    pub beta_voc_ref_norm: f64,
    /// Normalized Pmp temperature coefficient (1/K).
    pub gamma_pmp_ref_norm: f64,

    /// Whether measured data is available for this module (0 or 1).
    #[serde(default)]
    pub active: Option<u8>,
    #[serde(default)]
    pub comments: String,
    /// Measurement file this module's data lives in.
    #[serde(default)]
    pub filename: String,
}

impl ReferenceRecord {
    /// Builds a record from the seven values the engine needs; metadata is
    /// left empty.
    pub fn new(
        isc_ref: f64,
        imp_ref: f64,
        vmp_ref: f64,
        voc_ref: f64,
        alpha_isc_ref_norm: f64,
        beta_voc_ref_norm: f64,
        gamma_pmp_ref_norm: f64,
    ) -> Self {
        Self {
            row: None,
            site: String::new(),
            module: String::new(),
            id: String::new(),
            isc_ref,
            imp_ref,
            vmp_ref,
            voc_ref,
            alpha_isc_ref_norm,
            alpha_imp_ref_norm: None,
            beta_vmp_ref_norm: None,
            beta_voc_ref_norm,
            gamma_pmp_ref_norm,
            active: None,
            comments: String::new(),
            filename: String::new(),
        }
    }

    /// STC max power, `imp_ref * vmp_ref` (W).
    pub fn pmp_ref(&self) -> f64 {
        self.imp_ref * self.vmp_ref
    }

    /// STC fill factor, `(imp_ref / isc_ref) * (vmp_ref / voc_ref)`.
    pub fn ff_ref(&self) -> f64 {
        (self.imp_ref / self.isc_ref) * (self.vmp_ref / self.voc_ref)
    }

    /// Checks the physical invariants of the record.
    ///
    /// # Errors
    ///
    /// Returns [`MlfmError::InvalidReference`] if any STC current or voltage
    /// is non-positive or non-finite, a temperature coefficient is
    /// non-finite, or the fill factor falls outside (0, 1).
    pub fn validate(&self) -> Result<()> {
        let stc = [
            ("isc_ref", self.isc_ref),
            ("imp_ref", self.imp_ref),
            ("vmp_ref", self.vmp_ref),
            ("voc_ref", self.voc_ref),
        ];
        for (name, value) in stc {
            if !value.is_finite() || value <= 0.0 {
                return Err(MlfmError::InvalidReference {
                    reason: format!("{name} must be a positive number, got {value}"),
                });
            }
        }

        let coefficients = [
            ("alpha_isc_ref_norm", self.alpha_isc_ref_norm),
            ("beta_voc_ref_norm", self.beta_voc_ref_norm),
            ("gamma_pmp_ref_norm", self.gamma_pmp_ref_norm),
        ];
        for (name, value) in coefficients {
            if !value.is_finite() {
                return Err(MlfmError::InvalidReference {
                    reason: format!("{name} must be finite, got {value}"),
                });
            }
        }

        let ff = self.ff_ref();
        if !(ff > 0.0 && ff < 1.0) {
            return Err(MlfmError::InvalidReference {
                reason: format!("ff_ref must lie in (0, 1), got {ff:.4}"),
            });
        }
        Ok(())
    }

    /// False only when the table explicitly marks the module inactive.
    pub fn is_active(&self) -> bool {
        self.active != Some(0)
    }
}

impl fmt::Display for ReferenceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}] isc={:.3}A imp={:.3}A vmp={:.3}V voc={:.3}V",
            self.site, self.module, self.id, self.isc_ref, self.imp_ref, self.vmp_ref, self.voc_ref
        )
    }
}

/// How to pick the reference record that applies to a measurement file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleSelector {
    /// Match the `id` column.
    Id(String),
    /// Match the `filename` column against a measurement file name.
    Filename(String),
    /// Match the `row` column, or the position when the table has none.
    Row(usize),
}

impl fmt::Display for ModuleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleSelector::Id(id) => write!(f, "id \"{id}\""),
            ModuleSelector::Filename(name) => write!(f, "filename \"{name}\""),
            ModuleSelector::Row(row) => write!(f, "row {row}"),
        }
    }
}

/// All reference records of one reference file, in file order.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    records: Vec<ReferenceRecord>,
}

impl ReferenceTable {
    pub fn new(records: Vec<ReferenceRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ReferenceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Finds the record matching `selector`.
    ///
    /// `Row` compares against the `row` column of each record that has one
    /// and falls back to the position for records that don't.
    ///
    /// # Errors
    ///
    /// Returns [`MlfmError::InvalidReference`] when no record matches.
    pub fn select(&self, selector: &ModuleSelector) -> Result<&ReferenceRecord> {
        let found = match selector {
            ModuleSelector::Id(id) => self.records.iter().find(|r| r.id == *id),
            ModuleSelector::Filename(name) => self
                .records
                .iter()
                .find(|r| !r.filename.is_empty() && file_stem_eq(&r.filename, name)),
            ModuleSelector::Row(row) => self
                .records
                .iter()
                .enumerate()
                .find(|(pos, r)| r.row.unwrap_or(*pos) == *row)
                .map(|(_, r)| r),
        };
        found.ok_or_else(|| MlfmError::InvalidReference {
            reason: format!(
                "no reference record for {selector} ({} records loaded)",
                self.records.len()
            ),
        })
    }
}

/// Compares file names ignoring directories and extensions.
fn file_stem_eq(a: &str, b: &str) -> bool {
    fn stem(s: &str) -> &str {
        let name = s.rsplit(['/', '\\']).next().unwrap_or(s);
        name.rsplit_once('.').map_or(name, |(stem, _)| stem)
    }
    stem(a).eq_ignore_ascii_case(stem(b))
}
