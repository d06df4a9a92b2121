use log::debug;
use ndarray::{Array1, Array2, Axis};
use crate::drivers::amplitude::amplitude_db;
use crate::drivers::error::AnalysisError;
use crate::drivers::text_table::FrequencyResponse;
/// Mean ± std curve of one group over its shared frequency axis.
#[derive(Clone, Debug)]
pub struct AggregateCurve {
    pub label: String,
    pub color: String,
    pub frequencies_hz: Vec<f64>,
    pub mean_db: Vec<f64>,
    pub std_db: Vec<f64>,
}
/// Elementwise mean and population std (ddof = 0) of the dB curves of `trials`.
///
/// Each entry is a `(real, imag)` pair; all of them must have the same length.
pub fn aggregate_trials(
    trials: &[(&[f64], &[f64])],
    reference: f64,
) -> Result<(Vec<f64>, Vec<f64>), AnalysisError> {
    let Some((first_real, _)) = trials.first() else {
        return Err(AnalysisError::EmptySeries("group has no trials".into()));
    };
    let samples = first_real.len();
    let mut stacked = Vec::with_capacity(samples * trials.len());
    for (real, imag) in trials {
        if real.len() != samples {
            return Err(AnalysisError::ShapeMismatch {
                expected: samples,
                actual: real.len(),
            });
        }
        stacked.extend(amplitude_db(real, imag, reference)?);
    }
    let db = Array2::from_shape_vec((trials.len(), samples), stacked).map_err(|_| {
        AnalysisError::ShapeMismatch {
            expected: samples * trials.len(),
            actual: samples,
        }
    })?;
    // mean_axis is None only for a zero-length axis; trials is non-empty here
    let mean: Array1<f64> = db
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(samples));
    let std = db.std_axis(Axis(0), 0.0);
    debug!("aggregated {} trials x {} samples", trials.len(), samples);
    Ok((mean.to_vec(), std.to_vec()))
}
/// Aggregates loaded responses of one group, checking that they share a frequency axis.
pub fn aggregate_group(
    label: &str,
    color: &str,
    responses: &[(std::path::PathBuf, FrequencyResponse)],
    reference: f64,
) -> Result<AggregateCurve, AnalysisError> {
    let Some((_, first)) = responses.first() else {
        return Err(AnalysisError::EmptySeries(format!("group '{label}' has no files")));
    };
    for (path, response) in &responses[1..] {
        if response.len() == first.len() && response.frequencies_hz != first.frequencies_hz {
            return Err(AnalysisError::AxisMismatch {
                group: label.to_string(),
                path: path.clone(),
            });
        }
    }
    let pairs: Vec<(&[f64], &[f64])> = responses
        .iter()
        .map(|(_, r)| (r.real.as_slice(), r.imag.as_slice()))
        .collect();
    let (mean_db, std_db) = aggregate_trials(&pairs, reference)?;
    Ok(AggregateCurve {
        label: label.to_string(),
        color: color.to_string(),
        frequencies_hz: first.frequencies_hz.clone(),
        mean_db,
        std_db,
    })
}
