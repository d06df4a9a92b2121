use std::path::PathBuf;
use thiserror::Error;
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("file {} not found, please check the path and try again", .0.display())]
    FileNotFound(PathBuf),
    #[error("malformed table in {}: {reason}", path.display())]
    Format { path: PathBuf, reason: String },
    #[error("shape mismatch: expected {expected} samples, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("frequency axis of {} differs from the rest of group '{group}'", path.display())]
    AxisMismatch { group: String, path: PathBuf },
    #[error("series is empty: {0}")]
    EmptySeries(String),
    #[error("no sample reaches {threshold} ({fraction} of the maximum)")]
    NoPeakFound { threshold: f64, fraction: f64 },
    #[error("window starting at {start_secs}s contains no samples")]
    EmptyWindow { start_secs: f64 },
    #[error("reference mean is zero; percentage difference is undefined")]
    DivisionByZero,
    #[error("reference trial '{0}' is not among the loaded trials")]
    UnknownReference(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("failed to render plot: {0}")]
    Plot(String),
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for AnalysisError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        AnalysisError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for AnalysisError {
    fn from(value: image::ImageError) -> Self {
        AnalysisError::Plot(value.to_string())
    }
}
impl AnalysisError {
    /// Missing input files abort the whole run; callers use this to pick the exit path.
    pub fn is_missing_file(&self) -> bool {
        matches!(self, AnalysisError::FileNotFound(_))
    }
}
/// Opens `path`, mapping a missing file onto [`AnalysisError::FileNotFound`].
pub(crate) fn open_input(path: &std::path::Path) -> Result<std::fs::File, AnalysisError> {
    std::fs::File::open(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => AnalysisError::FileNotFound(path.to_path_buf()),
        _ => AnalysisError::Io(err),
    })
}
