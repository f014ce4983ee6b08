//! Operating-condition windows applied to measurements before normalization.

use crate::model::MeasurementRow;

/// Half-open numeric window `[min, max)`; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Window {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Window {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|lo| value >= lo) && self.max.is_none_or(|hi| value < hi)
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Tag like `0p4Gi0p8`: bounds around `symbol`, `.` spelled `p`.
    fn label(&self, symbol: &str) -> String {
        let fmt = |v: Option<f64>| v.map(|x| format!("{x}").replace('.', "p").replace('-', "m"));
        format!(
            "{}{symbol}{}",
            fmt(self.min).unwrap_or_default(),
            fmt(self.max).unwrap_or_default()
        )
    }
}

/// Irradiance and module-temperature windows.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConditionFilter {
    /// Irradiance window (kW/m²).
    pub gti_kw_m2: Window,
    /// Module temperature window (°C).
    pub temperature_module: Window,
}

impl ConditionFilter {
    pub fn is_empty(&self) -> bool {
        self.gti_kw_m2.is_unbounded() && self.temperature_module.is_unbounded()
    }

    pub fn accepts(&self, row: &MeasurementRow) -> bool {
        self.gti_kw_m2.contains(row.gti_kw_m2)
            && self.temperature_module.contains(row.temperature_module)
    }

    /// Keeps the rows inside every window, preserving order.
    pub fn apply(&self, rows: &[MeasurementRow]) -> Vec<MeasurementRow> {
        rows.iter().filter(|r| self.accepts(r)).cloned().collect()
    }

    /// Filesystem-safe description of the active windows, empty when the
    /// filter accepts everything.
    pub fn label(&self) -> String {
        let mut parts = Vec::new();
        if !self.gti_kw_m2.is_unbounded() {
            parts.push(self.gti_kw_m2.label("Gi"));
        }
        if !self.temperature_module.is_unbounded() {
            parts.push(self.temperature_module.label("Tm"));
        }
        parts.join("_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(g: f64, t: f64) -> MeasurementRow {
        MeasurementRow {
            gti_kw_m2: g,
            temperature_module: t,
            ..MeasurementRow::default()
        }
    }

    #[test]
    fn window_is_half_open() {
        let w = Window::new(Some(0.4), Some(0.8));
        assert!(w.contains(0.4));
        assert!(w.contains(0.79));
        assert!(!w.contains(0.8));
        assert!(!w.contains(0.2));
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let f = ConditionFilter::default();
        assert!(f.is_empty());
        let rows = vec![row(0.1, -5.0), row(1.3, 70.0)];
        assert_eq!(f.apply(&rows).len(), 2);
        assert_eq!(f.label(), "");
    }

    #[test]
    fn combined_windows() {
        let f = ConditionFilter {
            gti_kw_m2: Window::new(Some(0.4), Some(0.8)),
            temperature_module: Window::new(None, Some(40.0)),
        };
        let rows = vec![row(0.5, 30.0), row(0.5, 45.0), row(0.9, 30.0), row(0.6, 10.0)];
        let kept = f.apply(&rows);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].temperature_module, 30.0);
        assert_eq!(kept[1].temperature_module, 10.0);
    }

    #[test]
    fn label_spells_decimals() {
        let f = ConditionFilter {
            gti_kw_m2: Window::new(Some(0.4), Some(0.8)),
            temperature_module: Window::new(Some(20.0), None),
        };
        assert_eq!(f.label(), "0p4Gi0p8_20Tm");
    }
}
