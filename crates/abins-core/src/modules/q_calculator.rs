use crate::domain::{AbinsError, AbinsResult, SampleForm};
use crate::modules::input::KPointData;
use crate::modules::instrument::{Instrument, ResolutionFunction};
use tracing::debug;

/// Q (or Q²) per k-point and mode, tagged with the sample form it was
/// produced for.
#[derive(Debug, Clone, PartialEq)]
pub struct QData {
    sample_form: SampleForm,
    values: Vec<Vec<f64>>,
}

impl QData {
    pub fn new(sample_form: SampleForm, values: Vec<Vec<f64>>) -> AbinsResult<Self> {
        let Some(first) = values.first() else {
            return Err(AbinsError::structural(
                "INPUT.Q_EMPTY",
                "Q data must cover at least one k-point",
            ));
        };
        let num_freq = first.len();
        for (k, row) in values.iter().enumerate() {
            if row.len() != num_freq {
                return Err(AbinsError::structural(
                    "INPUT.Q_SHAPE",
                    format!(
                        "Q data for k-point {} has {} entries, expected {}",
                        k,
                        row.len(),
                        num_freq
                    ),
                ));
            }
            if let Some(mode) = row
                .iter()
                .position(|value| !value.is_finite() || *value < 0.0)
            {
                return Err(AbinsError::structural(
                    "INPUT.Q_VALUE",
                    format!(
                        "Q at k-point {} mode {} must be finite and non-negative, got {}",
                        k, mode, row[mode]
                    ),
                ));
            }
        }
        Ok(Self {
            sample_form,
            values,
        })
    }

    pub fn sample_form(&self) -> SampleForm {
        self.sample_form
    }

    pub fn num_k(&self) -> usize {
        self.values.len()
    }

    pub fn num_freq(&self) -> usize {
        self.values[0].len()
    }

    pub fn values(&self, k: usize) -> &[f64] {
        &self.values[k]
    }

    /// Fails unless the Q grid lines up with `k_points` one-to-one.
    pub fn check_shape(&self, k_points: &KPointData) -> AbinsResult<()> {
        if self.num_k() != k_points.num_k() || self.num_freq() != k_points.num_freq() {
            return Err(AbinsError::structural(
                "INPUT.Q_SHAPE",
                format!(
                    "Q data has shape {}x{} but k-point data has {}x{}",
                    self.num_k(),
                    self.num_freq(),
                    k_points.num_k(),
                    k_points.num_freq()
                ),
            ));
        }
        Ok(())
    }
}

pub fn calculate_q(
    instrument: &Instrument,
    sample_form: SampleForm,
    k_points: &KPointData,
) -> AbinsResult<QData> {
    match sample_form {
        SampleForm::Powder => {
            let values = k_points
                .all_frequencies()
                .iter()
                .map(|frequencies| instrument.calculate_q_powder(frequencies))
                .collect::<Result<Vec<_>, _>>()?;
            debug!(
                instrument = instrument.name(),
                num_k = values.len(),
                "calculated powder Q data"
            );
            QData::new(sample_form, values)
        }
        SampleForm::SingleCrystal => Err(AbinsError::unimplemented(
            "UNIMPLEMENTED.SINGLE_CRYSTAL_Q",
            "SingleCrystal case not implemented yet.",
        )),
    }
}
