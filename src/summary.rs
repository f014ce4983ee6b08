//! Post-hoc statistics over a normalized table.

use std::fmt;

use crate::model::{Channel, NormalizedRow};

/// Count, mean, spread and range of one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStats {
    pub channel: Channel,
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl ChannelStats {
    fn empty(channel: Channel) -> Self {
        Self {
            channel,
            count: 0,
            mean: 0.0,
            std_dev: 0.0,
            min: 0.0,
            max: 0.0,
        }
    }

    fn from_values(channel: Channel, values: impl Iterator<Item = f64> + Clone) -> Self {
        let n = values.clone().count();
        if n == 0 {
            return Self::empty(channel);
        }
        let mut sum = 0.0_f64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values.clone() {
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        let mean = sum / n as f64;
        let var = values.map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64;
        Self {
            channel,
            count: n,
            mean,
            std_dev: var.sqrt(),
            min,
            max,
        }
    }
}

/// Per-channel statistics for the fourteen MLFM channels.
///
/// Computed from the output rows so the report always agrees with the
/// exported table.
#[derive(Debug, Clone)]
pub struct NormSummary {
    pub rows: usize,
    pub first_date_time: Option<String>,
    pub last_date_time: Option<String>,
    pub channels: Vec<ChannelStats>,
}

impl NormSummary {
    pub fn from_rows(rows: &[NormalizedRow]) -> Self {
        let channels = Channel::MLFM
            .iter()
            .map(|&c| ChannelStats::from_values(c, rows.iter().map(move |r| r.value(c))))
            .collect();
        Self {
            rows: rows.len(),
            first_date_time: rows.first().map(|r| r.date_time.clone()),
            last_date_time: rows.last().map(|r| r.date_time.clone()),
            channels,
        }
    }

    pub fn get(&self, channel: Channel) -> Option<&ChannelStats> {
        self.channels.iter().find(|s| s.channel == channel)
    }
}

impl fmt::Display for NormSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- MLFM Summary ---")?;
        writeln!(f, "Rows:        {}", self.rows)?;
        if let (Some(first), Some(last)) = (&self.first_date_time, &self.last_date_time) {
            writeln!(f, "Period:      {first} .. {last}")?;
        }
        writeln!(
            f,
            "{:<12} {:>8} {:>8} {:>8} {:>8}",
            "channel", "mean", "std", "min", "max"
        )?;
        for (i, s) in self.channels.iter().enumerate() {
            write!(
                f,
                "{:<12} {:>8.4} {:>8.4} {:>8.4} {:>8.4}",
                s.channel.as_str(),
                s.mean,
                s.std_dev,
                s.min,
                s.max
            )?;
            if i + 1 < self.channels.len() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_row(prdc: f64) -> NormalizedRow {
        NormalizedRow {
            date_time: format!("t{prdc}"),
            prdc,
            ..NormalizedRow::default()
        }
    }

    #[test]
    fn mean_min_max_std() {
        let rows: Vec<NormalizedRow> = [0.8, 0.9, 1.0, 1.1].iter().map(|&p| make_row(p)).collect();
        let s = NormSummary::from_rows(&rows);
        let p = s.get(Channel::Prdc).unwrap();
        assert_eq!(p.count, 4);
        assert!((p.mean - 0.95).abs() < 1e-12);
        assert_eq!(p.min, 0.8);
        assert_eq!(p.max, 1.1);
        // deviations ±0.05, ±0.15 -> var = (2*0.0025 + 2*0.0225)/4
        assert!((p.std_dev - 0.0125_f64.sqrt()).abs() < 1e-12);
        assert_eq!(s.first_date_time.as_deref(), Some("t0.8"));
        assert_eq!(s.last_date_time.as_deref(), Some("t1.1"));
    }

    #[test]
    fn covers_all_mlfm_channels() {
        let s = NormSummary::from_rows(&[make_row(1.0)]);
        assert_eq!(s.channels.len(), 14);
        assert!(s.get(Channel::GtiKwM2).is_none());
    }

    #[test]
    fn empty_rows() {
        let s = NormSummary::from_rows(&[]);
        assert_eq!(s.rows, 0);
        assert!(s.channels.iter().all(|c| c.count == 0 && c.mean == 0.0));
        assert!(s.to_string().starts_with("--- MLFM Summary ---"));
    }

    #[test]
    fn display_has_one_line_per_channel() {
        let s = NormSummary::from_rows(&[make_row(1.0)]);
        let text = s.to_string();
        assert!(text.lines().any(|l| l.starts_with("prdc_tcorr")));
        assert!(text.lines().any(|l| l.starts_with("Rows:        1")));
    }
}
