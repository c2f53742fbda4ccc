mod model;

pub use model::{PerAtomSpectrum, StructureFactorResult};

use crate::common::constants::FOUR_PI;
use crate::common::numeric::{CompensatedRowSum, factorial_table};
use crate::common::parameters::{DEFAULT_OVERTONE_COUNT, DEFAULT_POINTS_PER_PEAK};
use crate::domain::{AbinsError, AbinsResult, ExecutionMode, SampleForm, Temperature};
use crate::modules::input::{AtomVibrationalData, KPointData};
use crate::modules::instrument::{Instrument, ResolutionFunction, validate_points_per_peak};
use crate::modules::q_calculator::QData;
use faer::Mat;
use rayon::prelude::*;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
pub struct StructureFactorInput<'a> {
    pub atoms: &'a [AtomVibrationalData],
    pub k_points: &'a KPointData,
    pub q_data: &'a QData,
    pub instrument: &'a Instrument,
    pub overtone_count: usize,
    pub points_per_peak: usize,
    pub temperature: Temperature,
    pub execution_mode: ExecutionMode,
}

impl<'a> StructureFactorInput<'a> {
    pub fn new(
        atoms: &'a [AtomVibrationalData],
        k_points: &'a KPointData,
        q_data: &'a QData,
        instrument: &'a Instrument,
        temperature: Temperature,
    ) -> Self {
        Self {
            atoms,
            k_points,
            q_data,
            instrument,
            overtone_count: DEFAULT_OVERTONE_COUNT,
            points_per_peak: DEFAULT_POINTS_PER_PEAK,
            temperature,
            execution_mode: ExecutionMode::Serial,
        }
    }

    pub fn with_overtone_count(mut self, overtone_count: usize) -> Self {
        self.overtone_count = overtone_count;
        self
    }

    pub fn with_points_per_peak(mut self, points_per_peak: usize) -> Self {
        self.points_per_peak = points_per_peak;
        self
    }

    pub fn with_execution_mode(mut self, execution_mode: ExecutionMode) -> Self {
        self.execution_mode = execution_mode;
        self
    }

    fn validate(&self) -> AbinsResult<()> {
        if self.atoms.is_empty() {
            return Err(AbinsError::structural(
                "INPUT.ATOMS_EMPTY",
                "at least one atom is required",
            ));
        }
        if self.overtone_count == 0 {
            return Err(AbinsError::configuration(
                "CONFIG.OVERTONE_COUNT",
                "overtone count must be at least 1",
            ));
        }
        validate_points_per_peak(self.points_per_peak)?;
        if self.q_data.sample_form() != SampleForm::Powder {
            return Err(AbinsError::type_mismatch(
                "TYPE.Q_DATA",
                format!(
                    "Q data was produced for {} but a powder structure factor was requested",
                    self.q_data.sample_form()
                ),
            ));
        }
        self.q_data.check_shape(self.k_points)?;
        for frequencies in self.k_points.all_frequencies() {
            self.instrument.validate_frequencies(frequencies)?;
        }
        Ok(())
    }
}

/// Powder S(Q, ω) for every atom, convolved with the instrument resolution.
///
/// Per k-point and mode the overtone `n` contribution is
/// `(Q·msd)^(2n) · exp(-Q·dw)²`; each overtone column is scaled by
/// `1 / (n! · 4π)` once all k-points have been added.
pub fn compute(input: &StructureFactorInput<'_>) -> AbinsResult<StructureFactorResult> {
    input.validate()?;

    let factorials = factorial_table(input.overtone_count);
    info!(
        atoms = input.atoms.len(),
        k_points = input.k_points.num_k(),
        modes = input.k_points.num_freq(),
        overtones = input.overtone_count,
        points_per_peak = input.points_per_peak,
        instrument = input.instrument.name(),
        mode = ?input.execution_mode,
        "computing powder structure factor"
    );

    let atoms = match input.execution_mode {
        ExecutionMode::Serial => input
            .atoms
            .iter()
            .enumerate()
            .map(|(index, atom)| atom_spectrum(input, &factorials, index, atom))
            .collect::<AbinsResult<Vec<_>>>()?,
        ExecutionMode::Parallel => input
            .atoms
            .par_iter()
            .enumerate()
            .map(|(index, atom)| atom_spectrum(input, &factorials, index, atom))
            .collect::<AbinsResult<Vec<_>>>()?,
    };

    let frequencies = combined_abscissa(input);
    StructureFactorResult::new(input.temperature, atoms, frequencies)
}

fn atom_spectrum(
    input: &StructureFactorInput<'_>,
    factorials: &[f64],
    index: usize,
    atom: &AtomVibrationalData,
) -> AbinsResult<PerAtomSpectrum> {
    let num_freq = input.k_points.num_freq();
    let points = input.points_per_peak * num_freq;
    let total = input.overtone_count;
    let mut value = Mat::<f64>::zeros(points, total + 1);
    let mut s_dft = vec![0.0; num_freq];

    for (n, factorial) in factorials.iter().copied().enumerate() {
        for k in 0..input.k_points.num_k() {
            let q = input.q_data.values(k);
            for (mode, s) in s_dft.iter_mut().enumerate() {
                let debye_waller = (-q[mode] * atom.dw()).exp();
                *s = (q[mode] * atom.msd()).powi(2 * n as i32) * debye_waller * debye_waller;
            }
            let ordinate = input.instrument.convolve_unchecked(
                input.k_points.frequencies(k),
                &s_dft,
                input.points_per_peak,
            );
            for (point, contribution) in ordinate.into_iter().enumerate() {
                value[(point, n)] += contribution;
            }
        }

        let scale = factorial * FOUR_PI;
        for point in 0..points {
            value[(point, n)] /= scale;
            value[(point, total)] += value[(point, n)];
        }
    }

    debug!(
        atom = index,
        symbol = atom.symbol(),
        points,
        "accumulated atomic structure factor"
    );
    PerAtomSpectrum::new(atom.sort(), atom.symbol(), value)
}

/// Weighted sum over k-points of each k-point's resolution grid.
fn combined_abscissa(input: &StructureFactorInput<'_>) -> Vec<f64> {
    let points = input.points_per_peak * input.k_points.num_freq();
    let mut sum = CompensatedRowSum::zeros(points);
    for (k, weight) in input.k_points.weights().iter().copied().enumerate() {
        let abscissa = input
            .instrument
            .produce_abscissa_unchecked(input.k_points.frequencies(k), input.points_per_peak);
        sum.add_weighted(&abscissa, weight);
    }
    sum.into_vec()
}

#[cfg(test)]
mod tests {
    use super::{StructureFactorInput, compute};
    use crate::common::constants::FOUR_PI;
    use crate::common::numeric::within_tolerance;
    use crate::common::parameters::AbinsParameters;
    use crate::domain::{AbinsErrorCategory, ExecutionMode, SampleForm, Temperature};
    use crate::modules::input::{AtomVibrationalData, KPointData};
    use crate::modules::instrument::{Instrument, produce_instrument};
    use crate::modules::q_calculator::{QData, calculate_q};

    fn none_instrument() -> Instrument {
        produce_instrument("None", &AbinsParameters::default()).expect("None should build")
    }

    fn temperature() -> Temperature {
        Temperature::new(10.0).expect("temperature")
    }

    #[test]
    fn two_atom_scenario_matches_closed_form() {
        let atoms = vec![
            AtomVibrationalData::new(0, "H", 0.1, 0.0).expect("H"),
            AtomVibrationalData::new(1, "O", 0.2, 0.5).expect("O"),
        ];
        let k_points = KPointData::from_frequencies(vec![1.0], vec![vec![100.0]]).expect("k");
        let q = QData::new(SampleForm::Powder, vec![vec![2.0]]).expect("q");
        let instrument = none_instrument();
        let input = StructureFactorInput::new(&atoms, &k_points, &q, &instrument, temperature())
            .with_overtone_count(2)
            .with_points_per_peak(1);

        let result = compute(&input).expect("compute should succeed");

        assert_eq!(result.frequencies(), &[100.0]);
        let hydrogen = &result.atoms()[0];
        assert!((hydrogen.overtone(0)[0] - 1.0 / FOUR_PI).abs() < 1.0e-15);
        assert!((hydrogen.overtone(1)[0] - 0.04 / FOUR_PI).abs() < 1.0e-15);
        assert!((hydrogen.total()[0] - 1.04 / FOUR_PI).abs() < 1.0e-15);

        let oxygen = &result.atoms()[1];
        let damping = (-1.0_f64).exp().powi(2);
        assert!((oxygen.overtone(0)[0] - damping / FOUR_PI).abs() < 1.0e-15);
        assert!((oxygen.overtone(1)[0] - 0.16 * damping / FOUR_PI).abs() < 1.0e-15);
        assert_eq!(oxygen.sort(), 1);
        assert_eq!(oxygen.symbol(), "O");
    }

    #[test]
    fn total_column_is_sum_of_overtones_and_grid_length_is_consistent() {
        let atoms = vec![
            AtomVibrationalData::new(0, "C", 0.05, 0.01).expect("C"),
            AtomVibrationalData::new(1, "N", 0.02, 0.03).expect("N"),
        ];
        let k_points = KPointData::from_frequencies(
            vec![0.25, 0.75],
            vec![vec![150.0, 600.0, 1200.0], vec![155.0, 610.0, 1190.0]],
        )
        .expect("k-points");
        let instrument =
            produce_instrument("TOSCA", &AbinsParameters::default()).expect("TOSCA should build");
        let q = calculate_q(&instrument, SampleForm::Powder, &k_points).expect("q");
        let input = StructureFactorInput::new(&atoms, &k_points, &q, &instrument, temperature())
            .with_overtone_count(4)
            .with_points_per_peak(9);

        let result = compute(&input).expect("compute should succeed");
        assert_eq!(result.frequencies().len(), 27);

        for atom in result.atoms() {
            assert_eq!(atom.num_points(), 27);
            assert_eq!(atom.overtone_count(), 4);
            let total = atom.total();
            for (point, value) in total.iter().enumerate() {
                let summed: f64 = (0..4).map(|n| atom.overtone(n)[point]).sum();
                assert!(
                    within_tolerance(*value, summed, 1.0e-14, 1.0e-12, 1.0e-30),
                    "point {point}: {value} vs {summed}"
                );
            }
        }
    }

    #[test]
    fn zero_displacement_leaves_only_the_fundamental_term() {
        let atoms = vec![AtomVibrationalData::new(0, "H", 0.0, 0.0).expect("H")];
        let k_points =
            KPointData::from_frequencies(vec![0.5, 0.5], vec![vec![50.0, 80.0], vec![52.0, 82.0]])
                .expect("k-points");
        let q = QData::new(SampleForm::Powder, vec![vec![1.0, 3.0], vec![2.0, 4.0]]).expect("q");
        let instrument = none_instrument();
        let input = StructureFactorInput::new(&atoms, &k_points, &q, &instrument, temperature())
            .with_overtone_count(3)
            .with_points_per_peak(2);

        let result = compute(&input).expect("compute should succeed");
        let atom = &result.atoms()[0];

        // 0^0 == 1 for n = 0 with one unit contribution per k-point
        for value in atom.overtone(0) {
            assert!((value - 2.0 / FOUR_PI).abs() < 1.0e-15);
        }
        assert!(atom.overtone(1).iter().all(|value| *value == 0.0));
        assert!(atom.overtone(2).iter().all(|value| *value == 0.0));
        assert_eq!(result.frequencies(), &[51.0, 51.0, 81.0, 81.0]);
    }

    #[test]
    fn parallel_execution_matches_serial_bit_for_bit() {
        let atoms: Vec<_> = (0..6)
            .map(|index| {
                let msd = 0.01 * (index + 1) as f64;
                AtomVibrationalData::new(index, "H", msd, 0.002 * index as f64).expect("atom")
            })
            .collect();
        let k_points = KPointData::from_frequencies(
            vec![0.5, 0.3, 0.2],
            vec![
                vec![100.0, 400.0],
                vec![110.0, 420.0],
                vec![120.0, 440.0],
            ],
        )
        .expect("k-points");
        let instrument =
            produce_instrument("TOSCA", &AbinsParameters::default()).expect("TOSCA should build");
        let q = calculate_q(&instrument, SampleForm::Powder, &k_points).expect("q");
        let serial = StructureFactorInput::new(&atoms, &k_points, &q, &instrument, temperature())
            .with_overtone_count(3)
            .with_points_per_peak(5);
        let parallel = serial.with_execution_mode(ExecutionMode::Parallel);

        let serial = compute(&serial).expect("serial compute");
        let parallel = compute(&parallel).expect("parallel compute");

        assert_eq!(serial.frequencies(), parallel.frequencies());
        for (lhs, rhs) in serial.atoms().iter().zip(parallel.atoms()) {
            assert_eq!(lhs.sort(), rhs.sort());
            assert_eq!(lhs.to_row_major(), rhs.to_row_major());
        }
    }

    #[test]
    fn invalid_configuration_fails_before_computation() {
        let atoms = vec![AtomVibrationalData::new(0, "H", 0.1, 0.0).expect("H")];
        let k_points = KPointData::from_frequencies(vec![1.0], vec![vec![100.0]]).expect("k");
        let q = QData::new(SampleForm::Powder, vec![vec![2.0]]).expect("q");
        let instrument = none_instrument();
        let base = StructureFactorInput::new(&atoms, &k_points, &q, &instrument, temperature());

        let overtones = compute(&base.with_overtone_count(0)).expect_err("no overtones");
        assert_eq!(overtones.category(), AbinsErrorCategory::ConfigurationError);

        let points = compute(&base.with_points_per_peak(0)).expect_err("no points");
        assert_eq!(points.category(), AbinsErrorCategory::ConfigurationError);

        let wide_q = QData::new(SampleForm::Powder, vec![vec![2.0, 3.0]]).expect("q");
        let shape = compute(&StructureFactorInput { q_data: &wide_q, ..base })
            .expect_err("Q shape mismatch");
        assert_eq!(
            shape.category(),
            AbinsErrorCategory::StructuralValidationError
        );

        let crystal_q = QData::new(SampleForm::SingleCrystal, vec![vec![2.0]]).expect("q");
        let crystal = compute(&StructureFactorInput {
            q_data: &crystal_q,
            ..base
        })
        .expect_err("single crystal Q");
        assert_eq!(crystal.category(), AbinsErrorCategory::TypeMismatchError);

        let empty = compute(&StructureFactorInput { atoms: &[], ..base }).expect_err("no atoms");
        assert_eq!(
            empty.category(),
            AbinsErrorCategory::StructuralValidationError
        );
    }

    #[test]
    fn overflowing_overtones_are_reported_instead_of_returned() {
        let atoms = vec![AtomVibrationalData::new(3, "H", 10.0, 0.0).expect("H")];
        let k_points = KPointData::from_frequencies(vec![1.0], vec![vec![100.0]]).expect("k");
        let q = QData::new(SampleForm::Powder, vec![vec![1.0e30]]).expect("q");
        let instrument = none_instrument();
        let input = StructureFactorInput::new(&atoms, &k_points, &q, &instrument, temperature())
            .with_points_per_peak(1);

        for mode in [ExecutionMode::Serial, ExecutionMode::Parallel] {
            let error = compute(&input.with_execution_mode(mode)).expect_err("S overflows");
            assert_eq!(
                error.category(),
                AbinsErrorCategory::StructuralValidationError
            );
            assert_eq!(error.placeholder(), "INPUT.SPECTRUM_VALUE");
            assert!(error.message().contains("sort 3"));
        }
    }
}
