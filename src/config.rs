// src/config.rs
//! Run configuration.
//!
//! Everything the lab scripts used to hardcode lives here: which files form a group,
//! the calibration reference of each dataset, the window parameters of the
//! peak-to-peak analysis, and where charts end up. `AnalysisConfig::default()`
//! reproduces the lab's own setup; a JSON file can override any part of it:
//!
//! ```json
//! {
//!   "output": { "directory": "images", "save": true },
//!   "peak_to_peak": { "window": { "threshold_fraction": 0.9, "offset_secs": 1.5 } }
//! }
//! ```
use std::io::Read;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::drivers::amplitude::PRESSURE_REFERENCE_PA;
use crate::drivers::error::{open_input, AnalysisError};
use crate::drivers::{Band, TableLayout, WindowParams};
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub frequency_response: FrequencyResponseConfig,
    pub peak_to_peak: PeakToPeakConfig,
    pub output: OutputConfig,
}
impl AnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self, AnalysisError> {
        let mut content = String::new();
        open_input(path)?.read_to_string(&mut content)?;
        Self::from_json(&content)
    }
    pub fn from_json(content: &str) -> Result<Self, AnalysisError> {
        Ok(serde_json::from_str(content)?)
    }
    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// When false, charts are skipped and only the console summary is produced.
    pub save: bool,
    pub dpi: u32,
}
impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("images"),
            save: true,
            dpi: 300,
        }
    }
}
/// Replicate captures of one condition, converted with a shared reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub label: String,
    pub color: String,
    pub files: Vec<PathBuf>,
    /// Calibration divisor for the dB conversion of this group.
    pub reference: f64,
}
/// One saved variant of the response chart.
///
/// `curves` takes that many groups from the front of the group list; `accent` names a
/// group drawn with a heavier line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FigurePreset {
    pub name: String,
    pub curves: usize,
    #[serde(default)]
    pub accent: Option<String>,
}
impl FigurePreset {
    pub fn file_name(&self) -> String {
        format!("FRF_{}.png", self.name)
    }
}
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyResponseConfig {
    pub layout: TableLayout,
    pub groups: Vec<GroupConfig>,
    pub figures: Vec<FigurePreset>,
    pub title: String,
    pub benchmark_db: Option<f64>,
    pub bands: Vec<Band>,
    pub x_range_hz: (f64, f64),
    pub y_range_db: (f64, f64),
    pub figure_inches: (f64, f64),
}
fn lab_files(prefix: &str, numbers: std::ops::RangeInclusive<u32>) -> Vec<PathBuf> {
    numbers
        .map(|i| PathBuf::from(format!("lab_data/FRF_{prefix}0{i}.txt")))
        .collect()
}
impl Default for FrequencyResponseConfig {
    fn default() -> Self {
        let group = |label: &str, color: &str, files: Vec<PathBuf>, reference: f64| GroupConfig {
            label: label.into(),
            color: color.into(),
            files,
            reference,
        };
        let figure = |name: &str, curves: usize, accent: Option<&str>| FigurePreset {
            name: name.into(),
            curves,
            accent: accent.map(String::from),
        };
        Self {
            layout: TableLayout::default(),
            groups: vec![
                group("Sound Box A", "blue", lab_files("A", 1..=3), PRESSURE_REFERENCE_PA),
                group("Sound Box B", "orange", lab_files("B", 2..=4), PRESSURE_REFERENCE_PA),
                group("Sound Box C", "green", lab_files("C", 1..=3), PRESSURE_REFERENCE_PA),
                group(
                    "Baseline",
                    "red",
                    vec![PathBuf::from("lab_data/FRF_Baseline.txt")],
                    PRESSURE_REFERENCE_PA,
                ),
                // the ear capture is calibrated against 10x the pressure reference
                group(
                    "Ear Reference",
                    "black",
                    vec![PathBuf::from("lab_data/EarReference_1.txt")],
                    PRESSURE_REFERENCE_PA * 10.0,
                ),
            ],
            figures: vec![
                figure("A", 1, None),
                figure("AB", 2, None),
                figure("ABC", 3, None),
                figure("ABC_acc", 3, Some("Sound Box C")),
                figure("ABC_ref", 4, Some("Baseline")),
                figure("ABC_ref_ear", 5, Some("Ear Reference")),
            ],
            title: "Frequency Response".into(),
            benchmark_db: Some(80.0),
            bands: vec![
                Band {
                    label: "50-300 Hz region".into(),
                    color: "gray".into(),
                    from_hz: 50.0,
                    to_hz: 300.0,
                },
                Band {
                    label: "> 5000 Hz region".into(),
                    color: "red".into(),
                    from_hz: 5000.0,
                    to_hz: 20000.0,
                },
            ],
            x_range_hz: (20.0, 20000.0),
            y_range_db: (10.0, 130.0),
            figure_inches: (16.0, 10.0),
        }
    }
}
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrialConfig {
    pub label: String,
    pub color: String,
    pub file: PathBuf,
}
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakToPeakConfig {
    pub trials: Vec<TrialConfig>,
    /// Label of the trial every other trial is aligned to and compared against.
    pub reference_label: String,
    pub window: WindowParams,
    pub title: String,
    pub image_name: String,
    pub x_range_secs: (f64, f64),
    pub figure_inches: (f64, f64),
}
impl Default for PeakToPeakConfig {
    fn default() -> Self {
        let trial = |label: &str, color: &str, file: &str| TrialConfig {
            label: label.into(),
            color: color.into(),
            file: PathBuf::from(file),
        };
        Self {
            trials: vec![
                trial("Earphone", "red", "logs/earphon_silicon_1.csv"),
                trial("Silicone", "royalblue", "logs/tube_silicon_1.csv"),
                trial("PVC", "purple", "logs/tube_PVC_1.csv"),
                trial("PU", "green", "logs/tube_PU_1.csv"),
            ],
            reference_label: "Earphone".into(),
            window: WindowParams::default(),
            title: "Microphone Peak-to-Peak Signal Comparison".into(),
            image_name: "microphone_peak_to_peak_comparison.png".into(),
            x_range_secs: (5.0, 20.0),
            figure_inches: (16.0, 10.0),
        }
    }
}
