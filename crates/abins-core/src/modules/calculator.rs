use crate::common::constants::{ATTRIBUTE_FILENAME, ATTRIBUTE_HASH, S_DATA_GROUP, STORE_EXTENSION};
use crate::common::parameters::AbinsParameters;
use crate::domain::{AbinsError, AbinsResult, ExecutionMode, SampleForm, Temperature};
use crate::modules::input::{AbinsData, PowderData};
use crate::modules::instrument::{Instrument, ResolutionFunction, produce_instrument};
use crate::modules::q_calculator::{QData, calculate_q};
use crate::modules::serialization::fnv1a64;
use crate::modules::store::StructuredStore;
use crate::modules::structure_factor::{StructureFactorInput, StructureFactorResult, compute};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Computes S for one vibrational data set and persists it next to the
/// input file, or reads a previously persisted result back.
#[derive(Debug, Clone)]
pub struct SCalculator {
    input_filename: PathBuf,
    temperature: Temperature,
    sample_form: SampleForm,
    abins_data: AbinsData,
    powder_data: PowderData,
    instrument: Instrument,
    parameters: AbinsParameters,
    q_values: Option<Vec<Vec<f64>>>,
    execution_mode: ExecutionMode,
}

impl SCalculator {
    pub fn new(
        input_filename: impl Into<PathBuf>,
        temperature: Temperature,
        sample_form: SampleForm,
        abins_data: AbinsData,
        powder_data: PowderData,
        instrument_name: &str,
        parameters: AbinsParameters,
    ) -> AbinsResult<Self> {
        parameters.validate()?;
        let instrument = produce_instrument(instrument_name, &parameters)?;
        if powder_data.num_atoms() != abins_data.num_atoms() {
            return Err(AbinsError::type_mismatch(
                "TYPE.POWDER_DATA",
                format!(
                    "powder data describes {} atoms but the vibrational data has {}",
                    powder_data.num_atoms(),
                    abins_data.num_atoms()
                ),
            ));
        }

        Ok(Self {
            input_filename: input_filename.into(),
            temperature,
            sample_form,
            abins_data,
            powder_data,
            instrument,
            parameters,
            q_values: None,
            execution_mode: ExecutionMode::Serial,
        })
    }

    /// Uses precomputed Q values instead of the instrument kinematics.
    pub fn with_q_values(mut self, q_values: Vec<Vec<f64>>) -> Self {
        self.q_values = Some(q_values);
        self
    }

    pub fn with_execution_mode(mut self, execution_mode: ExecutionMode) -> Self {
        self.execution_mode = execution_mode;
        self
    }

    pub fn input_filename(&self) -> &Path {
        &self.input_filename
    }

    pub fn store_path(&self) -> PathBuf {
        store_path_for(&self.input_filename)
    }

    pub fn get_s(&self) -> AbinsResult<StructureFactorResult> {
        if self.sample_form != SampleForm::Powder {
            return Err(AbinsError::unimplemented(
                "UNIMPLEMENTED.SINGLE_CRYSTAL_S",
                "SingleCrystal case not implemented yet.",
            ));
        }

        let k_points = self.abins_data.k_points();
        let q_data = match &self.q_values {
            Some(values) => QData::new(self.sample_form, values.clone())?,
            None => calculate_q(&self.instrument, self.sample_form, k_points)?,
        };
        let atoms = self.abins_data.vibrational_atoms(&self.powder_data)?;
        let input = StructureFactorInput::new(
            &atoms,
            k_points,
            &q_data,
            &self.instrument,
            self.temperature,
        )
        .with_overtone_count(self.parameters.overtone_count)
        .with_points_per_peak(self.parameters.points_per_peak)
        .with_execution_mode(self.execution_mode);
        let result = compute(&input)?;

        let mut store = StructuredStore::new(self.store_path(), S_DATA_GROUP);
        result.write_to(&mut store)?;
        store.add_attribute(
            ATTRIBUTE_FILENAME,
            &self.input_filename.display().to_string(),
        )?;
        if let Some(hash) = input_hash(&self.input_filename)? {
            store.add_attribute(ATTRIBUTE_HASH, &hash)?;
        }
        store.save()?;

        info!(
            store = %store.path().display(),
            instrument = self.instrument.name(),
            atoms = result.num_atoms(),
            "saved structure factor"
        );
        Ok(result)
    }

    pub fn load_data(&self) -> AbinsResult<StructureFactorResult> {
        load_structure_factor(&self.input_filename)
    }
}

/// Store file for `input_filename`: its extension replaced by `abins.json`.
pub fn store_path_for(input_filename: &Path) -> PathBuf {
    input_filename.with_extension(STORE_EXTENSION)
}

/// Reads the persisted S group of `input_filename` without recomputing it.
///
/// Fails with `IO.STORE_STALE` when the input file exists and no longer
/// matches the digest recorded at save time.
pub fn load_structure_factor(input_filename: &Path) -> AbinsResult<StructureFactorResult> {
    let store = StructuredStore::open(store_path_for(input_filename), S_DATA_GROUP)?;

    if let Some(current) = input_hash(input_filename)? {
        let stored = if store.has_attribute(ATTRIBUTE_HASH) {
            Some(store.attribute::<String>(ATTRIBUTE_HASH)?)
        } else {
            None
        };
        if stored.as_deref() != Some(current.as_str()) {
            warn!(
                input = %input_filename.display(),
                "stored structure factor does not match the input file"
            );
            return Err(AbinsError::io_system(
                "IO.STORE_STALE",
                format!(
                    "stored structure factor in '{}' was computed from a different '{}'",
                    store.path().display(),
                    input_filename.display()
                ),
            ));
        }
    }

    let result = StructureFactorResult::read_from(&store)?;
    info!(
        store = %store.path().display(),
        atoms = result.num_atoms(),
        "loaded structure factor"
    );
    Ok(result)
}

fn input_hash(path: &Path) -> AbinsResult<Option<String>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(format!("{:016x}", fnv1a64(&bytes)))),
        Err(source) if source.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(AbinsError::io_system(
            "IO.INPUT_READ",
            format!("failed to read input '{}': {}", path.display(), source),
        )),
    }
}
