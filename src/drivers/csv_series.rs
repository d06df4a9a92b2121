use std::io::Read;
use std::path::Path;
use csv::ReaderBuilder;
use log::{debug, info};
use crate::drivers::error::{open_input, AnalysisError};
/// Header written by the serial recorder and expected by the loader.
pub const PEAK_CSV_HEADER: [&str; 2] = ["timestamp", "peakToPeak"];
/// Peak-to-peak capture with timestamps relative to the first row.
#[derive(Clone, Debug, PartialEq)]
pub struct PeakSeries {
    pub timestamps: Vec<f64>,
    pub values: Vec<i64>,
}
impl PeakSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}
pub fn load_peak_csv(path: &Path) -> Result<PeakSeries, AnalysisError> {
    let file = open_input(path)?;
    let series = parse_peak_csv(file, path)?;
    info!("loaded {} samples from {}", series.len(), path.display());
    Ok(series)
}
/// Reads `timestamp,value` rows after a one-line header.
///
/// Rows with fewer than two fields are skipped. `source` is only used in error messages.
pub fn parse_peak_csv<R: Read>(reader: R, source: &Path) -> Result<PeakSeries, AnalysisError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let mut timestamps = Vec::new();
    let mut values = Vec::new();
    let mut skipped = 0usize;
    for record in rdr.records() {
        let record = record?;
        if record.len() < 2 {
            skipped += 1;
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let bad_field = |field: &str, err: &dyn std::fmt::Display| AnalysisError::Format {
            path: source.to_path_buf(),
            reason: format!("line {line}: invalid {field}: {err}"),
        };
        let timestamp: f64 = record[0]
            .trim()
            .parse()
            .map_err(|e| bad_field("timestamp", &e))?;
        let value: i64 = record[1]
            .trim()
            .parse()
            .map_err(|e| bad_field("value", &e))?;
        timestamps.push(timestamp);
        values.push(value);
    }
    if skipped > 0 {
        debug!("skipped {skipped} short rows in {}", source.display());
    }
    let Some(&start) = timestamps.first() else {
        return Err(AnalysisError::EmptySeries(format!(
            "{} has no data rows",
            source.display()
        )));
    };
    for t in &mut timestamps {
        *t -= start;
    }
    Ok(PeakSeries { timestamps, values })
}
