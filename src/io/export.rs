//! CSV export for normalized MLFM tables.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::model::{Channel, NormalizedRow};

/// Column header of the normalized table, in order.
pub const NORM_COLUMNS: [&str; 19] = [
    "isc",
    "rsc",
    "ffi",
    "ffv",
    "roc",
    "voc",
    "imp",
    "vmp",
    "prdc",
    "icurve",
    "vcurve",
    "isc_tcorr",
    "voc_tcorr",
    "prdc_tcorr",
    "date_time",
    "gti_kw_m2",
    "temperature_air",
    "temperature_module",
    "wind_speed",
];

/// Exports normalized rows to a CSV file at the given path.
///
/// # Arguments
///
/// * `rows` - Normalized rows, written in order
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_norm_csv(rows: &[NormalizedRow], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_norm_csv(rows, buf)
}

/// Writes normalized rows as CSV to any writer.
///
/// Every value uses the shortest representation that parses back to the
/// same `f64`, so the table survives a round trip unchanged.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_norm_csv(rows: &[NormalizedRow], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(NORM_COLUMNS)?;

    for r in rows {
        let mut record: Vec<String> = Channel::MLFM
            .iter()
            .map(|c| r.value(*c).to_string())
            .collect();
        record.push(r.date_time.clone());
        record.extend(Channel::WEATHER.iter().map(|c| r.value(*c).to_string()));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_row(i: usize) -> NormalizedRow {
        NormalizedRow {
            date_time: format!("2011-06-01T{:02}:00:00", 8 + i),
            gti_kw_m2: 0.123,
            temperature_air: 21.7,
            temperature_module: 38.25,
            wind_speed: 2.0,
            isc: 0.98,
            rsc: 0.99,
            ffi: 0.97,
            ffv: 0.96,
            roc: 0.95,
            voc: 0.94,
            imp: 0.9,
            vmp: 0.8,
            prdc: 0.85,
            icurve: 1.01,
            vcurve: 1.02,
            isc_tcorr: 0.975,
            voc_tcorr: 0.99,
            prdc_tcorr: 0.9,
        }
    }

    #[test]
    fn header_matches_norm_schema() {
        let mut buf = Vec::new();
        write_norm_csv(&[make_row(0)], &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let first_line = output.as_deref().unwrap_or("").lines().next().unwrap_or("");
        assert_eq!(
            first_line,
            "isc,rsc,ffi,ffv,roc,voc,imp,vmp,prdc,icurve,vcurve,\
             isc_tcorr,voc_tcorr,prdc_tcorr,date_time,gti_kw_m2,\
             temperature_air,temperature_module,wind_speed"
        );
    }

    #[test]
    fn row_count_matches_input() {
        let rows: Vec<NormalizedRow> = (0..10).map(make_row).collect();
        let mut buf = Vec::new();
        write_norm_csv(&rows, &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        assert_eq!(output.as_deref().unwrap_or("").lines().count(), 11);
    }

    #[test]
    fn values_survive_round_trip() {
        let rows: Vec<NormalizedRow> = (0..3).map(make_row).collect();
        let mut buf = Vec::new();
        write_norm_csv(&rows, &mut buf).ok();

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        for (rec, row) in rdr.records().zip(rows.iter()) {
            let rec = rec.expect("row should parse");
            assert_eq!(&rec[14], row.date_time);
            assert_eq!(rec[15].parse::<f64>().ok(), Some(row.gti_kw_m2));
            assert_eq!(rec[16].parse::<f64>().ok(), Some(row.temperature_air));
            assert_eq!(rec[17].parse::<f64>().ok(), Some(row.temperature_module));
            assert_eq!(rec[18].parse::<f64>().ok(), Some(row.wind_speed));
            for (i, c) in Channel::MLFM.iter().enumerate() {
                assert_eq!(rec[i].parse::<f64>().ok(), Some(row.value(*c)), "{c}");
            }
        }
    }

    #[test]
    fn channels_keep_full_precision() {
        let mut row = make_row(0);
        row.prdc = 0.123_456_789_012_345;
        let mut buf = Vec::new();
        write_norm_csv(&[row], &mut buf).ok();
        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let rec = rdr.records().next().expect("one row").expect("row should parse");
        assert_eq!(&rec[8], "0.123456789012345");
    }

    #[test]
    fn deterministic_output() {
        let rows: Vec<NormalizedRow> = (0..5).map(make_row).collect();
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_norm_csv(&rows, &mut buf1).ok();
        write_norm_csv(&rows, &mut buf2).ok();
        assert_eq!(buf1, buf2);
    }
}
