use super::{NONE_INSTRUMENT_NAME, ResolutionError, ResolutionFunction, validate_finite_frequencies};

/// The "None" instrument: no resolution broadening and unit Q.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityInstrument;

fn replicate(values: &[f64], points_per_peak: usize) -> Vec<f64> {
    values
        .iter()
        .flat_map(|&value| std::iter::repeat_n(value, points_per_peak))
        .collect()
}

impl ResolutionFunction for IdentityInstrument {
    fn name(&self) -> &'static str {
        NONE_INSTRUMENT_NAME
    }

    fn validate_frequencies(&self, frequencies: &[f64]) -> Result<(), ResolutionError> {
        validate_finite_frequencies(frequencies)
    }

    fn produce_abscissa_unchecked(&self, frequencies: &[f64], points_per_peak: usize) -> Vec<f64> {
        replicate(frequencies, points_per_peak)
    }

    fn convolve_unchecked(
        &self,
        _frequencies: &[f64],
        s_dft: &[f64],
        points_per_peak: usize,
    ) -> Vec<f64> {
        replicate(s_dft, points_per_peak)
    }

    fn calculate_q_powder(&self, frequencies: &[f64]) -> Result<Vec<f64>, ResolutionError> {
        validate_finite_frequencies(frequencies)?;
        Ok(vec![1.0; frequencies.len()])
    }
}
