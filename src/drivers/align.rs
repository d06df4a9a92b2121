use log::debug;
use crate::drivers::error::AnalysisError;
use crate::drivers::peak_window::PeakWindow;
/// One windowed capture, tagged with the label and colour used on the chart.
#[derive(Clone, Debug, PartialEq)]
pub struct PeakTrial {
    pub label: String,
    pub color: String,
    pub timestamps: Vec<f64>,
    pub values: Vec<i64>,
    pub mean: f64,
}
impl PeakTrial {
    pub fn from_window(label: impl Into<String>, color: impl Into<String>, window: PeakWindow) -> Self {
        Self {
            label: label.into(),
            color: color.into(),
            timestamps: window.timestamps,
            values: window.values,
            mean: window.mean,
        }
    }
    /// Index of the largest value; ties resolve to the lowest index.
    pub fn peak_index(&self) -> Option<usize> {
        let mut best: Option<(usize, i64)> = None;
        for (idx, &value) in self.values.iter().enumerate() {
            match best {
                Some((_, current)) if value <= current => {}
                _ => best = Some((idx, value)),
            }
        }
        best.map(|(idx, _)| idx)
    }
    pub fn peak_time(&self) -> Result<f64, AnalysisError> {
        self.peak_index()
            .map(|idx| self.timestamps[idx])
            .ok_or_else(|| AnalysisError::EmptySeries(format!("trial '{}' has no samples", self.label)))
    }
}
/// Trial whose time axis was shifted so its peak lines up with the reference.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignedTrial {
    pub trial: PeakTrial,
    pub shift_secs: f64,
}
/// Shifts every trial so its peak coincides with the peak of `reference_label`.
///
/// Values and means are carried over untouched; only timestamps change. Output order
/// follows the input order.
pub fn align_to_peak(trials: &[PeakTrial], reference_label: &str) -> Result<Vec<AlignedTrial>, AnalysisError> {
    let reference = trials
        .iter()
        .find(|t| t.label == reference_label)
        .ok_or_else(|| AnalysisError::UnknownReference(reference_label.to_string()))?;
    let reference_peak = reference.peak_time()?;
    trials
        .iter()
        .map(|trial| -> Result<AlignedTrial, AnalysisError> {
            let shift_secs = if trial.label == reference_label {
                0.0
            } else {
                reference_peak - trial.peak_time()?
            };
            debug!("shifting '{}' by {shift_secs:+.3}s", trial.label);
            let mut shifted = trial.clone();
            for t in &mut shifted.timestamps {
                *t += shift_secs;
            }
            Ok(AlignedTrial {
                trial: shifted,
                shift_secs,
            })
        })
        .collect()
}
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    fn trial(label: &str, timestamps: &[f64], values: &[i64]) -> PeakTrial {
        let mean = values.iter().sum::<i64>() as f64 / values.len().max(1) as f64;
        PeakTrial {
            label: label.into(),
            color: "red".into(),
            timestamps: timestamps.to_vec(),
            values: values.to_vec(),
            mean,
        }
    }
    #[test]
    fn peaks_coincide_after_alignment() {
        let trials = vec![
            trial("Earphone", &[0.0, 0.1, 0.2, 0.3], &[1, 9, 3, 2]),
            trial("Silicone", &[0.0, 0.1, 0.2, 0.3], &[1, 2, 3, 8]),
            trial("PVC", &[0.0, 0.25, 0.5, 0.75], &[7, 2, 3, 1]),
        ];
        let aligned = align_to_peak(&trials, "Earphone").unwrap();
        let reference_peak = aligned[0].trial.peak_time().unwrap();
        for a in &aligned {
            assert!((a.trial.peak_time().unwrap() - reference_peak).abs() < 1e-12);
            assert_eq!(a.trial.values, trials.iter().find(|t| t.label == a.trial.label).unwrap().values);
        }
        assert_eq!(aligned[0].shift_secs, 0.0);
        assert_eq!(aligned[0].trial.timestamps, trials[0].timestamps);
        assert!((aligned[1].shift_secs + 0.2).abs() < 1e-12);
        assert!((aligned[2].shift_secs - 0.1).abs() < 1e-12);
    }
    #[test]
    fn ties_align_on_first_occurrence() {
        let flat = trial("Flat", &[0.0, 1.0, 2.0], &[5, 5, 5]);
        assert_eq!(flat.peak_index(), Some(0));
        let trials = vec![trial("Ref", &[0.0, 1.0, 2.0], &[0, 0, 3]), flat];
        let aligned = align_to_peak(&trials, "Ref").unwrap();
        assert_eq!(aligned[1].shift_secs, 2.0);
        assert_eq!(aligned[1].trial.timestamps, vec![2.0, 3.0, 4.0]);
    }
    #[test]
    fn unknown_reference_is_rejected() {
        let trials = vec![trial("PU", &[0.0], &[1])];
        assert!(matches!(
            align_to_peak(&trials, "Earphone"),
            Err(AnalysisError::UnknownReference(label)) if label == "Earphone"
        ));
    }
    #[test]
    fn empty_trial_is_rejected() {
        let trials = vec![trial("Earphone", &[0.0], &[1]), trial("PU", &[], &[])];
        assert!(matches!(
            align_to_peak(&trials, "Earphone"),
            Err(AnalysisError::EmptySeries(_))
        ));
    }
    fn generated_trial(label: String) -> impl Strategy<Value = PeakTrial> {
        prop::collection::vec((0.01f64..1.0, 0i64..1000), 1..30).prop_map(move |steps| {
            let mut t = 0.0;
            let mut timestamps = Vec::with_capacity(steps.len());
            let mut values = Vec::with_capacity(steps.len());
            for (dt, v) in steps {
                timestamps.push(t);
                values.push(v);
                t += dt;
            }
            trial(&label, &timestamps, &values)
        })
    }
    fn generated_trials() -> impl Strategy<Value = Vec<PeakTrial>> {
        (1usize..5).prop_flat_map(|n| {
            (0..n)
                .map(|i| generated_trial(format!("T{i}")))
                .collect::<Vec<_>>()
        })
    }
    proptest! {
        #[test]
        fn every_peak_lands_on_the_reference_peak(trials in generated_trials()) {
            let aligned = align_to_peak(&trials, "T0").unwrap();
            prop_assert_eq!(aligned.len(), trials.len());
            let reference_peak = trials[0].peak_time().unwrap();
            for (original, a) in trials.iter().zip(&aligned) {
                prop_assert!((a.trial.peak_time().unwrap() - reference_peak).abs() < 1e-9);
                prop_assert_eq!(&a.trial.values, &original.values);
                prop_assert_eq!(a.trial.mean, original.mean);
            }
        }
    }
}
