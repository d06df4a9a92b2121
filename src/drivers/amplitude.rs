use crate::drivers::error::AnalysisError;
/// Smallest magnitude fed to the logarithm; exact zeros are clamped to it.
pub const MAGNITUDE_FLOOR: f64 = 1e-12;
/// Acoustic pressure reference (20 µPa).
pub const PRESSURE_REFERENCE_PA: f64 = 20e-6;
/// Converts complex samples into 20·log10(|z| / reference).
///
/// Only exact zeros are floored, tiny non-zero magnitudes pass through untouched.
pub fn amplitude_db(real: &[f64], imag: &[f64], reference: f64) -> Result<Vec<f64>, AnalysisError> {
    if real.len() != imag.len() {
        return Err(AnalysisError::ShapeMismatch {
            expected: real.len(),
            actual: imag.len(),
        });
    }
    Ok(real
        .iter()
        .zip(imag)
        .map(|(&re, &im)| {
            let mut magnitude = re.hypot(im);
            if magnitude == 0.0 {
                magnitude = MAGNITUDE_FLOOR;
            }
            20.0 * (magnitude / reference).log10()
        })
        .collect())
}
