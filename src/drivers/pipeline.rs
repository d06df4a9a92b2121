use std::path::{Path, PathBuf};
use log::{info, warn};
use crate::config::{FrequencyResponseConfig, OutputConfig, PeakToPeakConfig};
use crate::drivers::aggregate::{aggregate_group, AggregateCurve};
use crate::drivers::align::{align_to_peak, AlignedTrial, PeakTrial};
use crate::drivers::csv_series::load_peak_csv;
use crate::drivers::difference::percent_difference;
use crate::drivers::error::AnalysisError;
use crate::drivers::peak_window::extract_window;
use crate::drivers::plot::{
    render_frequency_response_png, render_peak_comparison_png, PeakChart, PlotStyle, ResponseChart,
};
use crate::drivers::text_table::load_text_table;
fn write_chart(output: &OutputConfig, name: &str, png: &[u8]) -> Result<PathBuf, AnalysisError> {
    std::fs::create_dir_all(&output.directory)?;
    let path = output.directory.join(name);
    std::fs::write(&path, png)?;
    info!("saved chart {}", path.display());
    Ok(path)
}
/// Text exports → dB curves → group mean ± std → charts.
pub struct FrequencyResponsePipeline<'a> {
    config: &'a FrequencyResponseConfig,
    output: &'a OutputConfig,
}
#[derive(Clone, Debug)]
pub struct FrequencyResponseReport {
    pub curves: Vec<AggregateCurve>,
    pub written: Vec<PathBuf>,
}
impl<'a> FrequencyResponsePipeline<'a> {
    pub fn new(config: &'a FrequencyResponseConfig, output: &'a OutputConfig) -> Self {
        Self { config, output }
    }
    /// Loads every group and reduces it to one curve, in configuration order.
    pub fn load_curves(&self) -> Result<Vec<AggregateCurve>, AnalysisError> {
        self.config
            .groups
            .iter()
            .map(|group| -> Result<AggregateCurve, AnalysisError> {
                let responses = group
                    .files
                    .iter()
                    .map(|path| -> Result<_, AnalysisError> {
                        Ok((path.clone(), load_text_table(path, self.config.layout)?))
                    })
                    .collect::<Result<Vec<_>, AnalysisError>>()?;
                let curve = aggregate_group(&group.label, &group.color, &responses, group.reference)?;
                info!(
                    "group '{}': {} file(s), {} points, reference {:e}",
                    group.label,
                    group.files.len(),
                    curve.mean_db.len(),
                    group.reference
                );
                Ok(curve)
            })
            .collect()
    }
    /// Renders one chart per figure preset and writes it to the output directory.
    pub fn render(&self, curves: &[AggregateCurve]) -> Result<Vec<PathBuf>, AnalysisError> {
        let style = PlotStyle::from_figure(self.config.figure_inches, self.output.dpi);
        let mut written = Vec::with_capacity(self.config.figures.len());
        for figure in &self.config.figures {
            if figure.curves > curves.len() {
                warn!(
                    "figure '{}' asks for {} curves, only {} loaded",
                    figure.name,
                    figure.curves,
                    curves.len()
                );
            }
            let selected = &curves[..figure.curves.min(curves.len())];
            let chart = ResponseChart {
                title: &self.config.title,
                x_range_hz: self.config.x_range_hz,
                y_range_db: self.config.y_range_db,
                benchmark_db: self.config.benchmark_db,
                bands: &self.config.bands,
                accent: figure.accent.as_deref(),
            };
            let png = render_frequency_response_png(selected, &chart, &style)?;
            written.push(write_chart(self.output, &figure.file_name(), &png)?);
        }
        Ok(written)
    }
    pub fn run(&self) -> Result<FrequencyResponseReport, AnalysisError> {
        let curves = self.load_curves()?;
        let written = if self.output.save {
            self.render(&curves)?
        } else {
            info!("saving disabled; no frequency-response charts written");
            Vec::new()
        };
        Ok(FrequencyResponseReport { curves, written })
    }
}
/// Mean of one trial and its change against the reference trial.
#[derive(Clone, Debug, PartialEq)]
pub struct TrialSummary {
    pub label: String,
    pub mean: f64,
    /// `None` for the reference trial itself.
    pub difference_pct: Option<f64>,
}
#[derive(Clone, Debug)]
pub struct PeakComparisonReport {
    pub aligned: Vec<AlignedTrial>,
    pub summaries: Vec<TrialSummary>,
    pub written: Option<PathBuf>,
}
/// CSV logs → post-peak windows → peak alignment → percentage differences → chart.
pub struct PeakComparisonPipeline<'a> {
    config: &'a PeakToPeakConfig,
    output: &'a OutputConfig,
}
impl<'a> PeakComparisonPipeline<'a> {
    pub fn new(config: &'a PeakToPeakConfig, output: &'a OutputConfig) -> Self {
        Self { config, output }
    }
    pub fn load_trial(&self, label: &str, color: &str, path: &Path) -> Result<PeakTrial, AnalysisError> {
        let series = load_peak_csv(path)?;
        let window = extract_window(&series, self.config.window)?;
        info!(
            "trial '{label}': peak at {:.3}s, {} samples kept, mean {:.2}",
            window.reference_time,
            window.values.len(),
            window.mean
        );
        Ok(PeakTrial::from_window(label, color, window))
    }
    pub fn load_trials(&self) -> Result<Vec<PeakTrial>, AnalysisError> {
        self.config
            .trials
            .iter()
            .map(|t| self.load_trial(&t.label, &t.color, &t.file))
            .collect()
    }
    /// Aligns `trials` on the reference peak and compares every mean with the reference mean.
    pub fn compare(&self, trials: &[PeakTrial]) -> Result<(Vec<AlignedTrial>, Vec<TrialSummary>), AnalysisError> {
        let reference_label = self.config.reference_label.as_str();
        let aligned = align_to_peak(trials, reference_label)?;
        let reference_mean = aligned
            .iter()
            .find(|a| a.trial.label == reference_label)
            .map(|a| a.trial.mean)
            .ok_or_else(|| AnalysisError::UnknownReference(reference_label.to_string()))?;
        let summaries = aligned
            .iter()
            .map(|a| -> Result<TrialSummary, AnalysisError> {
                let difference_pct = if a.trial.label == reference_label {
                    None
                } else {
                    Some(percent_difference(reference_mean, a.trial.mean)?)
                };
                Ok(TrialSummary {
                    label: a.trial.label.clone(),
                    mean: a.trial.mean,
                    difference_pct,
                })
            })
            .collect::<Result<Vec<_>, AnalysisError>>()?;
        Ok((aligned, summaries))
    }
    pub fn render(&self, aligned: &[AlignedTrial], summaries: &[TrialSummary]) -> Result<PathBuf, AnalysisError> {
        let differences: Vec<Option<f64>> = summaries.iter().map(|s| s.difference_pct).collect();
        let chart = PeakChart {
            title: &self.config.title,
            x_range_secs: self.config.x_range_secs,
            trials: aligned,
            differences: &differences,
        };
        let style = PlotStyle::from_figure(self.config.figure_inches, self.output.dpi);
        let png = render_peak_comparison_png(&chart, &style)?;
        write_chart(self.output, &self.config.image_name, &png)
    }
    pub fn run(&self) -> Result<PeakComparisonReport, AnalysisError> {
        let trials = self.load_trials()?;
        let (aligned, summaries) = self.compare(&trials)?;
        let written = if self.output.save {
            Some(self.render(&aligned, &summaries)?)
        } else {
            info!("saving disabled; peak-to-peak chart not written");
            None
        };
        Ok(PeakComparisonReport {
            aligned,
            summaries,
            written,
        })
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GroupConfig, TrialConfig};
    use crate::drivers::peak_window::WindowParams;
    use crate::drivers::text_table::tests::export_with_rows;
    fn no_save(dir: &Path) -> OutputConfig {
        OutputConfig {
            directory: dir.join("images"),
            save: false,
            dpi: 72,
        }
    }
    #[test]
    fn frequency_response_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let single = dir.path().join("FRF_single.txt");
        std::fs::write(
            &single,
            export_with_rows(&["0 100 1.0 0.5", "1 200 2.0 0.0", "2 300 0.0 0.0"]),
        )
        .unwrap();
        let replicate = dir.path().join("FRF_rep.txt");
        std::fs::write(
            &replicate,
            export_with_rows(&["0 100 1.0 0.0", "1 200 1.0 0.0", "2 300 1.0 0.0"]),
        )
        .unwrap();
        let config = FrequencyResponseConfig {
            groups: vec![
                GroupConfig {
                    label: "Baseline".into(),
                    color: "red".into(),
                    files: vec![single.clone()],
                    reference: 1.0,
                },
                GroupConfig {
                    label: "Sound Box A".into(),
                    color: "blue".into(),
                    files: vec![replicate.clone(), replicate.clone(), replicate],
                    reference: 0.1,
                },
            ],
            ..FrequencyResponseConfig::default()
        };
        let output = no_save(dir.path());
        let report = FrequencyResponsePipeline::new(&config, &output).run().unwrap();
        assert!(report.written.is_empty());
        assert!(!output.directory.exists());
        let baseline = &report.curves[0];
        let expected = [
            20.0 * 1.25f64.sqrt().log10(),
            20.0 * 2.0f64.log10(),
            20.0 * 1e-12f64.log10(),
        ];
        for (got, want) in baseline.mean_db.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9);
        }
        assert_eq!(baseline.std_db, vec![0.0; 3]);
        let group = &report.curves[1];
        assert_eq!(group.frequencies_hz, vec![100.0, 200.0, 300.0]);
        for (mean, std) in group.mean_db.iter().zip(&group.std_db) {
            assert!((mean - 20.0).abs() < 1e-9);
            assert!(std.abs() < 1e-9);
        }
    }
    #[test]
    fn frequency_response_stops_at_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = FrequencyResponseConfig {
            groups: vec![GroupConfig {
                label: "Sound Box A".into(),
                color: "blue".into(),
                files: vec![dir.path().join("FRF_A01.txt")],
                reference: 20e-6,
            }],
            ..FrequencyResponseConfig::default()
        };
        let output = no_save(dir.path());
        let err = FrequencyResponsePipeline::new(&config, &output).run().unwrap_err();
        assert!(err.is_missing_file());
    }
    fn write_csv(dir: &Path, name: &str, rows: &[(f64, i64)]) -> PathBuf {
        let path = dir.join(name);
        let mut text = String::from("timestamp,peakToPeak\n");
        for (t, v) in rows {
            text.push_str(&format!("{t},{v}\n"));
        }
        std::fs::write(&path, text).unwrap();
        path
    }
    #[test]
    fn peak_comparison_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        // peak at 2s, window keeps t >= 3s
        let reference = write_csv(
            dir.path(),
            "earphone.csv",
            &[(100.0, 10), (101.0, 50), (102.0, 100), (103.0, 40), (104.0, 80), (105.0, 40)],
        );
        let tube = write_csv(
            dir.path(),
            "tube.csv",
            &[(7.0, 5), (8.0, 100), (9.0, 30), (10.0, 60), (11.0, 30), (12.0, 20)],
        );
        let config = PeakToPeakConfig {
            trials: vec![
                TrialConfig {
                    label: "Earphone".into(),
                    color: "red".into(),
                    file: reference,
                },
                TrialConfig {
                    label: "Silicone".into(),
                    color: "royalblue".into(),
                    file: tube,
                },
            ],
            reference_label: "Earphone".into(),
            window: WindowParams {
                threshold_fraction: 0.95,
                offset_secs: 1.0,
            },
            ..PeakToPeakConfig::default()
        };
        let output = no_save(dir.path());
        let report = PeakComparisonPipeline::new(&config, &output).run().unwrap();
        assert!(report.written.is_none());
        assert_eq!(report.summaries[0].mean, 160.0 / 3.0);
        assert_eq!(report.summaries[0].difference_pct, None);
        // Silicone keeps 30, 60, 30, 20 -> mean 35
        assert_eq!(report.summaries[1].mean, 35.0);
        let diff = report.summaries[1].difference_pct.unwrap();
        assert!((diff - (35.0 - 160.0 / 3.0) / (160.0 / 3.0) * 100.0).abs() < 1e-9);
        let peak_ref = report.aligned[0].trial.peak_time().unwrap();
        let peak_tube = report.aligned[1].trial.peak_time().unwrap();
        assert!((peak_ref - peak_tube).abs() < 1e-12);
    }
    #[test]
    fn zero_reference_mean_is_reported() {
        let config = PeakToPeakConfig {
            reference_label: "Earphone".into(),
            ..PeakToPeakConfig::default()
        };
        let output = OutputConfig::default();
        let pipeline = PeakComparisonPipeline::new(&config, &output);
        let trials = vec![
            PeakTrial {
                label: "Earphone".into(),
                color: "red".into(),
                timestamps: vec![0.0, 1.0],
                values: vec![0, 0],
                mean: 0.0,
            },
            PeakTrial {
                label: "PU".into(),
                color: "green".into(),
                timestamps: vec![0.0, 1.0],
                values: vec![4, 2],
                mean: 3.0,
            },
        ];
        assert!(matches!(
            pipeline.compare(&trials),
            Err(AnalysisError::DivisionByZero)
        ));
    }
}
