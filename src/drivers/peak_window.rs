use log::debug;
use serde::{Deserialize, Serialize};
use crate::drivers::csv_series::PeakSeries;
use crate::drivers::error::AnalysisError;
/// Where the stable part of a capture begins.
///
/// The first sample reaching `threshold_fraction` of the maximum marks the calibration
/// peak; everything before `peak + offset_secs` is dropped as onset transient.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowParams {
    pub threshold_fraction: f64,
    pub offset_secs: f64,
}
impl Default for WindowParams {
    fn default() -> Self {
        Self {
            threshold_fraction: 0.95,
            offset_secs: 2.0,
        }
    }
}
/// Samples kept after the post-peak offset, re-based to start at zero.
#[derive(Clone, Debug, PartialEq)]
pub struct PeakWindow {
    pub timestamps: Vec<f64>,
    pub values: Vec<i64>,
    pub mean: f64,
    /// Time of the first sample over the threshold, on the input's time axis.
    pub reference_time: f64,
}
pub fn extract_window(series: &PeakSeries, params: WindowParams) -> Result<PeakWindow, AnalysisError> {
    if series.is_empty() {
        return Err(AnalysisError::EmptySeries("no samples to window".into()));
    }
    let Some(&max) = series.values.iter().max() else {
        return Err(AnalysisError::EmptySeries("no values to window".into()));
    };
    let threshold = max as f64 * params.threshold_fraction;
    let reference_time = series
        .timestamps
        .iter()
        .zip(&series.values)
        .find(|&(_, &v)| v as f64 >= threshold)
        .map(|(&t, _)| t)
        .ok_or(AnalysisError::NoPeakFound {
            threshold,
            fraction: params.threshold_fraction,
        })?;
    let start = reference_time + params.offset_secs;
    let (mut timestamps, values): (Vec<f64>, Vec<i64>) = series
        .timestamps
        .iter()
        .zip(&series.values)
        .filter(|&(&t, _)| t >= start)
        .map(|(&t, &v)| (t, v))
        .unzip();
    let Some(&first) = timestamps.first() else {
        return Err(AnalysisError::EmptyWindow { start_secs: start });
    };
    for t in &mut timestamps {
        *t -= first;
    }
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64;
    debug!(
        "peak at {reference_time:.3}s (threshold {threshold:.1}), kept {} of {} samples, mean {mean:.2}",
        values.len(),
        series.len()
    );
    Ok(PeakWindow {
        timestamps,
        values,
        mean,
        reference_time,
    })
}
