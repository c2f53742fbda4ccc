use super::{
    ResolutionError, ResolutionFunction, TOSCA_INSTRUMENT_NAME, validate_finite_frequencies,
};
use crate::common::constants::WAVENUMBER_TO_INVERSE_A;
use crate::common::parameters::ToscaParameters;
use std::f64::consts::PI;

/// Indirect-geometry spectrometer with a quadratic Gaussian resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToscaInstrument {
    parameters: ToscaParameters,
}

impl ToscaInstrument {
    pub fn new(parameters: ToscaParameters) -> Self {
        Self { parameters }
    }

    /// Gaussian sigma at `frequency`, in cm⁻¹.
    pub fn sigma(&self, frequency: f64) -> f64 {
        let p = &self.parameters;
        p.a * frequency * frequency + p.b * frequency + p.c
    }

    fn peak_points(&self, center: f64, sigma: f64, points_per_peak: usize, out: &mut Vec<f64>) {
        if points_per_peak == 1 {
            out.push(center);
            return;
        }

        let half_width = self.parameters.sigma_span * sigma;
        let start = center - half_width;
        let step = 2.0 * half_width / (points_per_peak - 1) as f64;
        for point in 0..points_per_peak {
            out.push(start + step * point as f64);
        }
    }
}

fn gaussian(x: f64, center: f64, sigma: f64) -> f64 {
    let delta = (x - center) / sigma;
    (-0.5 * delta * delta).exp() / (sigma * (2.0 * PI).sqrt())
}

impl ResolutionFunction for ToscaInstrument {
    fn name(&self) -> &'static str {
        TOSCA_INSTRUMENT_NAME
    }

    fn validate_frequencies(&self, frequencies: &[f64]) -> Result<(), ResolutionError> {
        validate_finite_frequencies(frequencies)?;
        for (index, frequency) in frequencies.iter().copied().enumerate() {
            let sigma = self.sigma(frequency);
            if !sigma.is_finite() || sigma <= 0.0 {
                return Err(ResolutionError::NonPositiveWidth {
                    index,
                    frequency,
                    sigma,
                });
            }
        }
        Ok(())
    }

    fn produce_abscissa_unchecked(&self, frequencies: &[f64], points_per_peak: usize) -> Vec<f64> {
        let mut abscissa = Vec::with_capacity(frequencies.len() * points_per_peak);
        for &frequency in frequencies {
            self.peak_points(frequency, self.sigma(frequency), points_per_peak, &mut abscissa);
        }
        abscissa
    }

    fn convolve_unchecked(
        &self,
        frequencies: &[f64],
        s_dft: &[f64],
        points_per_peak: usize,
    ) -> Vec<f64> {
        let sigmas: Vec<f64> = frequencies.iter().map(|&f| self.sigma(f)).collect();
        let abscissa = self.produce_abscissa_unchecked(frequencies, points_per_peak);

        // every line contributes to every grid point of the shared grid
        abscissa
            .iter()
            .map(|&x| {
                frequencies
                    .iter()
                    .zip(&sigmas)
                    .zip(s_dft)
                    .map(|((&center, &sigma), &intensity)| intensity * gaussian(x, center, sigma))
                    .sum()
            })
            .collect()
    }

    /// Q² from the fixed final energy and scattering angle of the analysers.
    fn calculate_q_powder(&self, frequencies: &[f64]) -> Result<Vec<f64>, ResolutionError> {
        validate_finite_frequencies(frequencies)?;
        let final_energy = self.parameters.final_neutron_energy;
        let k2_f = final_energy * WAVENUMBER_TO_INVERSE_A;

        frequencies
            .iter()
            .copied()
            .enumerate()
            .map(|(index, frequency)| {
                let incident_energy = frequency + final_energy;
                if incident_energy < 0.0 {
                    return Err(ResolutionError::KinematicallyForbidden { index, frequency });
                }
                let k2_i = incident_energy * WAVENUMBER_TO_INVERSE_A;
                let q2 = k2_i + k2_f
                    - 2.0 * (k2_i * k2_f).sqrt() * self.parameters.cos_scattering_angle;
                Ok(q2.max(0.0))
            })
            .collect()
    }
}
