use crate::drivers::error::AnalysisError;
/// Relative change of `candidate` against `reference`, in percent.
pub fn percent_difference(reference: f64, candidate: f64) -> Result<f64, AnalysisError> {
    if reference == 0.0 {
        return Err(AnalysisError::DivisionByZero);
    }
    Ok((candidate - reference) / reference * 100.0)
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn same_mean_is_zero_percent() {
        for reference in [1.0, -3.5, 412.25, 1e-9] {
            assert_eq!(percent_difference(reference, reference).unwrap(), 0.0);
        }
    }
    #[test]
    fn relative_change() {
        assert!((percent_difference(200.0, 150.0).unwrap() + 25.0).abs() < 1e-12);
        assert!((percent_difference(80.0, 100.0).unwrap() - 25.0).abs() < 1e-12);
    }
    #[test]
    fn zero_reference_is_an_error() {
        assert!(matches!(
            percent_difference(0.0, 5.0),
            Err(AnalysisError::DivisionByZero)
        ));
        assert!(matches!(
            percent_difference(-0.0, 5.0),
            Err(AnalysisError::DivisionByZero)
        ));
    }
}
