use crate::common::constants::{
    ATTRIBUTE_SAMPLE_FORM, ATTRIBUTE_TEMPERATURE, DATASET_ATOMS, DATASET_FREQUENCIES,
};
use crate::domain::{AbinsError, AbinsResult, SampleForm, Temperature};
use crate::modules::store::{NumericArray, StructuredStore};
use faer::Mat;
use serde::{Deserialize, Serialize};

/// S for one atom: `value[(point, n)]` is overtone `n`, the last column the
/// sum over overtones.
#[derive(Debug, Clone)]
pub struct PerAtomSpectrum {
    sort: usize,
    symbol: String,
    value: Mat<f64>,
}

impl PerAtomSpectrum {
    /// Needs one overtone column plus the total, every entry finite.
    pub fn new(sort: usize, symbol: impl Into<String>, value: Mat<f64>) -> AbinsResult<Self> {
        let symbol = symbol.into();
        if value.ncols() < 2 {
            return Err(AbinsError::structural(
                "INPUT.SPECTRUM_SHAPE",
                format!(
                    "spectrum of {} (sort {}) has {} columns, at least 2 are required",
                    symbol,
                    sort,
                    value.ncols()
                ),
            ));
        }
        for column in 0..value.ncols() {
            for row in 0..value.nrows() {
                let entry = value[(row, column)];
                if !entry.is_finite() {
                    return Err(AbinsError::structural(
                        "INPUT.SPECTRUM_VALUE",
                        format!(
                            "S of {} (sort {}) at point {} column {} is not finite: {}",
                            symbol, sort, row, column, entry
                        ),
                    ));
                }
            }
        }
        Ok(Self {
            sort,
            symbol,
            value,
        })
    }

    pub fn sort(&self) -> usize {
        self.sort
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn value(&self) -> &Mat<f64> {
        &self.value
    }

    pub fn num_points(&self) -> usize {
        self.value.nrows()
    }

    pub fn overtone_count(&self) -> usize {
        self.value.ncols().saturating_sub(1)
    }

    pub fn column(&self, column: usize) -> Vec<f64> {
        (0..self.value.nrows())
            .map(|row| self.value[(row, column)])
            .collect()
    }

    pub fn overtone(&self, n: usize) -> Vec<f64> {
        self.column(n)
    }

    pub fn total(&self) -> Vec<f64> {
        self.column(self.overtone_count())
    }

    pub fn to_row_major(&self) -> Vec<f64> {
        let mut flat = Vec::with_capacity(self.value.nrows() * self.value.ncols());
        for row in 0..self.value.nrows() {
            for column in 0..self.value.ncols() {
                flat.push(self.value[(row, column)]);
            }
        }
        flat
    }

    fn from_row_major(
        sort: usize,
        symbol: String,
        rows: usize,
        columns: usize,
        flat: &[f64],
    ) -> Self {
        Self {
            sort,
            symbol,
            value: Mat::from_fn(rows, columns, |row, column| flat[row * columns + column]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredAtomSpectrum {
    sort: usize,
    symbol: String,
    value: NumericArray,
}

#[derive(Debug, Clone)]
pub struct StructureFactorResult {
    temperature: Temperature,
    sample_form: SampleForm,
    atoms: Vec<PerAtomSpectrum>,
    frequencies: Vec<f64>,
}

impl StructureFactorResult {
    /// Every atom must carry one row per entry of `frequencies`.
    pub fn new(
        temperature: Temperature,
        atoms: Vec<PerAtomSpectrum>,
        frequencies: Vec<f64>,
    ) -> AbinsResult<Self> {
        if let Some(point) = frequencies.iter().position(|value| !value.is_finite()) {
            return Err(AbinsError::structural(
                "INPUT.SPECTRUM_VALUE",
                format!(
                    "frequency at point {} is not finite: {}",
                    point, frequencies[point]
                ),
            ));
        }
        if let Some((index, atom)) = atoms
            .iter()
            .enumerate()
            .find(|(_, atom)| atom.num_points() != frequencies.len())
        {
            return Err(AbinsError::structural(
                "INPUT.SPECTRUM_SHAPE",
                format!(
                    "spectrum of atom {} has {} points but the frequency grid has {}",
                    index,
                    atom.num_points(),
                    frequencies.len()
                ),
            ));
        }
        Ok(Self {
            temperature,
            sample_form: SampleForm::Powder,
            atoms,
            frequencies,
        })
    }

    pub fn temperature(&self) -> Temperature {
        self.temperature
    }

    pub fn sample_form(&self) -> SampleForm {
        self.sample_form
    }

    pub fn atoms(&self) -> &[PerAtomSpectrum] {
        &self.atoms
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// Stages this result into `store`; the caller decides when to save.
    pub fn write_to(&self, store: &mut StructuredStore) -> AbinsResult<()> {
        store.add_attribute(ATTRIBUTE_TEMPERATURE, &self.temperature.kelvin())?;
        store.add_attribute(ATTRIBUTE_SAMPLE_FORM, self.sample_form.as_str())?;

        let records = self
            .atoms
            .iter()
            .map(|atom| {
                let value = NumericArray::new(
                    vec![atom.value.nrows(), atom.value.ncols()],
                    atom.to_row_major(),
                )?;
                Ok(StoredAtomSpectrum {
                    sort: atom.sort,
                    symbol: atom.symbol.clone(),
                    value,
                })
            })
            .collect::<AbinsResult<Vec<_>>>()?;
        store.add_structured_dataset(DATASET_ATOMS, &records)?;
        store.add_numeric_dataset(
            DATASET_FREQUENCIES,
            NumericArray::vector(self.frequencies.clone()),
        );
        Ok(())
    }

    pub fn read_from(store: &StructuredStore) -> AbinsResult<Self> {
        let sample_form = store
            .attribute::<String>(ATTRIBUTE_SAMPLE_FORM)?
            .parse::<SampleForm>()?;
        if sample_form != SampleForm::Powder {
            return Err(AbinsError::unimplemented(
                "UNIMPLEMENTED.SINGLE_CRYSTAL_S",
                "SingleCrystal case not implemented yet.",
            ));
        }
        let temperature = Temperature::new(store.attribute::<f64>(ATTRIBUTE_TEMPERATURE)?)?;
        let frequencies = store.numeric_dataset(DATASET_FREQUENCIES)?.data().to_vec();

        let atoms = store
            .structured_dataset::<StoredAtomSpectrum>(DATASET_ATOMS)?
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                let &[rows, columns] = record.value.shape() else {
                    return Err(stored_shape_error(index, record.value.shape()));
                };
                if rows != frequencies.len()
                    || columns < 2
                    || rows * columns != record.value.data().len()
                {
                    return Err(stored_shape_error(index, record.value.shape()));
                }
                Ok(PerAtomSpectrum::from_row_major(
                    record.sort,
                    record.symbol,
                    rows,
                    columns,
                    record.value.data(),
                ))
            })
            .collect::<AbinsResult<Vec<_>>>()?;

        Ok(Self {
            temperature,
            sample_form,
            atoms,
            frequencies,
        })
    }
}

fn stored_shape_error(index: usize, shape: &[usize]) -> AbinsError {
    AbinsError::io_system(
        "IO.STORE_SHAPE",
        format!("stored spectrum of atom {} has unusable shape {:?}", index, shape),
    )
}
