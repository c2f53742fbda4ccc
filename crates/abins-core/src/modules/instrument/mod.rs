mod identity;
mod tosca;

pub use identity::IdentityInstrument;
pub use tosca::ToscaInstrument;

use crate::common::parameters::AbinsParameters;
use crate::domain::{AbinsError, AbinsResult};

pub const TOSCA_INSTRUMENT_NAME: &str = "TOSCA";
pub const NONE_INSTRUMENT_NAME: &str = "None";
pub const ALL_INSTRUMENTS: [&str; 2] = [NONE_INSTRUMENT_NAME, TOSCA_INSTRUMENT_NAME];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolutionError {
    #[error("points per peak must be at least 1, got {value}")]
    InvalidPointsPerPeak { value: usize },
    #[error(
        "resolution input length mismatch: frequencies={frequencies}, intensities={intensities}"
    )]
    LengthMismatch {
        frequencies: usize,
        intensities: usize,
    },
    #[error("frequency must be finite at index {index}, got {value}")]
    NonFiniteFrequency { index: usize, value: f64 },
    #[error("intensity must be finite at index {index}, got {value}")]
    NonFiniteIntensity { index: usize, value: f64 },
    #[error("resolution width must be > 0 at index {index} (frequency {frequency}), got {sigma}")]
    NonPositiveWidth {
        index: usize,
        frequency: f64,
        sigma: f64,
    },
    #[error("frequency {frequency} at index {index} exceeds the incident neutron energy")]
    KinematicallyForbidden { index: usize, frequency: f64 },
}

impl From<ResolutionError> for AbinsError {
    fn from(error: ResolutionError) -> Self {
        match error {
            ResolutionError::InvalidPointsPerPeak { .. } => {
                AbinsError::configuration("CONFIG.POINTS_PER_PEAK", error.to_string())
            }
            ResolutionError::NonPositiveWidth { .. } => {
                AbinsError::configuration("CONFIG.RESOLUTION_WIDTH", error.to_string())
            }
            ResolutionError::KinematicallyForbidden { .. } => {
                AbinsError::structural("INPUT.Q_KINEMATICS", error.to_string())
            }
            ResolutionError::LengthMismatch { .. }
            | ResolutionError::NonFiniteFrequency { .. }
            | ResolutionError::NonFiniteIntensity { .. } => {
                AbinsError::structural("INPUT.RESOLUTION_INPUT", error.to_string())
            }
        }
    }
}

/// Instrument capability used by the structure factor accumulator.
///
/// The `*_unchecked` methods assume `points_per_peak >= 1`, matching slice
/// lengths, and that [`ResolutionFunction::validate_frequencies`] accepted the
/// frequencies; the checked forms verify this first.
pub trait ResolutionFunction {
    fn name(&self) -> &'static str;

    fn validate_frequencies(&self, frequencies: &[f64]) -> Result<(), ResolutionError>;

    fn produce_abscissa_unchecked(&self, frequencies: &[f64], points_per_peak: usize) -> Vec<f64>;

    fn convolve_unchecked(
        &self,
        frequencies: &[f64],
        s_dft: &[f64],
        points_per_peak: usize,
    ) -> Vec<f64>;

    /// Q (or Q²) per mode for a powder sample.
    fn calculate_q_powder(&self, frequencies: &[f64]) -> Result<Vec<f64>, ResolutionError>;

    fn produce_abscissa(
        &self,
        frequencies: &[f64],
        points_per_peak: usize,
    ) -> Result<Vec<f64>, ResolutionError> {
        validate_points_per_peak(points_per_peak)?;
        self.validate_frequencies(frequencies)?;
        Ok(self.produce_abscissa_unchecked(frequencies, points_per_peak))
    }

    fn convolve_with_resolution_function(
        &self,
        frequencies: &[f64],
        s_dft: &[f64],
        points_per_peak: usize,
    ) -> Result<Vec<f64>, ResolutionError> {
        validate_points_per_peak(points_per_peak)?;
        if frequencies.len() != s_dft.len() {
            return Err(ResolutionError::LengthMismatch {
                frequencies: frequencies.len(),
                intensities: s_dft.len(),
            });
        }
        self.validate_frequencies(frequencies)?;
        if let Some((index, value)) = s_dft
            .iter()
            .copied()
            .enumerate()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(ResolutionError::NonFiniteIntensity { index, value });
        }
        Ok(self.convolve_unchecked(frequencies, s_dft, points_per_peak))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instrument {
    Tosca(ToscaInstrument),
    Identity(IdentityInstrument),
}

impl Instrument {
    fn inner(&self) -> &dyn ResolutionFunction {
        match self {
            Self::Tosca(instrument) => instrument,
            Self::Identity(instrument) => instrument,
        }
    }
}

impl ResolutionFunction for Instrument {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn validate_frequencies(&self, frequencies: &[f64]) -> Result<(), ResolutionError> {
        self.inner().validate_frequencies(frequencies)
    }

    fn produce_abscissa_unchecked(&self, frequencies: &[f64], points_per_peak: usize) -> Vec<f64> {
        self.inner()
            .produce_abscissa_unchecked(frequencies, points_per_peak)
    }

    fn convolve_unchecked(
        &self,
        frequencies: &[f64],
        s_dft: &[f64],
        points_per_peak: usize,
    ) -> Vec<f64> {
        self.inner()
            .convolve_unchecked(frequencies, s_dft, points_per_peak)
    }

    fn calculate_q_powder(&self, frequencies: &[f64]) -> Result<Vec<f64>, ResolutionError> {
        self.inner().calculate_q_powder(frequencies)
    }
}

pub fn is_known_instrument(name: &str) -> bool {
    ALL_INSTRUMENTS.contains(&name)
}

/// Selects the instrument variant once; unknown names fail here rather than
/// at convolution time.
pub fn produce_instrument(name: &str, parameters: &AbinsParameters) -> AbinsResult<Instrument> {
    match name {
        TOSCA_INSTRUMENT_NAME => Ok(Instrument::Tosca(ToscaInstrument::new(parameters.tosca))),
        NONE_INSTRUMENT_NAME => Ok(Instrument::Identity(IdentityInstrument)),
        other => Err(AbinsError::configuration(
            "CONFIG.INSTRUMENT",
            format!("Unknown instrument {}", other),
        )),
    }
}

pub(crate) fn validate_points_per_peak(points_per_peak: usize) -> Result<(), ResolutionError> {
    if points_per_peak == 0 {
        return Err(ResolutionError::InvalidPointsPerPeak {
            value: points_per_peak,
        });
    }
    Ok(())
}

pub(crate) fn validate_finite_frequencies(frequencies: &[f64]) -> Result<(), ResolutionError> {
    match frequencies
        .iter()
        .copied()
        .enumerate()
        .find(|(_, value)| !value.is_finite())
    {
        Some((index, value)) => Err(ResolutionError::NonFiniteFrequency { index, value }),
        None => Ok(()),
    }
}
