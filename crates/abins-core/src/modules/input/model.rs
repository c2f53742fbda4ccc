use crate::domain::{AbinsError, AbinsResult};
use serde::{Deserialize, Serialize};

/// Atom identity as delivered by the vibrational-data loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomData {
    /// Symmetry-equivalence group; carried through, never interpreted.
    pub sort: usize,
    pub symbol: String,
}

impl AtomData {
    pub fn new(sort: usize, symbol: impl Into<String>) -> Self {
        Self {
            sort,
            symbol: symbol.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KPointData {
    k_vectors: Vec<[f64; 3]>,
    weights: Vec<f64>,
    frequencies: Vec<Vec<f64>>,
}

impl KPointData {
    pub fn new(
        k_vectors: Vec<[f64; 3]>,
        weights: Vec<f64>,
        frequencies: Vec<Vec<f64>>,
    ) -> AbinsResult<Self> {
        if frequencies.is_empty() {
            return Err(AbinsError::structural(
                "INPUT.KPOINTS_EMPTY",
                "at least one k-point is required",
            ));
        }
        if weights.len() != frequencies.len() || k_vectors.len() != frequencies.len() {
            return Err(AbinsError::structural(
                "INPUT.KPOINTS_SHAPE",
                format!(
                    "k-point arrays disagree: k_vectors={}, weights={}, frequencies={}",
                    k_vectors.len(),
                    weights.len(),
                    frequencies.len()
                ),
            ));
        }

        let num_freq = frequencies[0].len();
        if num_freq == 0 {
            return Err(AbinsError::structural(
                "INPUT.KPOINTS_EMPTY",
                "k-points must carry at least one frequency",
            ));
        }
        for (k, row) in frequencies.iter().enumerate() {
            if row.len() != num_freq {
                return Err(AbinsError::structural(
                    "INPUT.KPOINTS_SHAPE",
                    format!(
                        "k-point {} has {} frequencies, expected {}",
                        k,
                        row.len(),
                        num_freq
                    ),
                ));
            }
            if let Some(mode) = row.iter().position(|value| !value.is_finite()) {
                return Err(AbinsError::structural(
                    "INPUT.KPOINTS_VALUE",
                    format!("frequency at k-point {} mode {} must be finite", k, mode),
                ));
            }
        }
        if let Some(k) = weights.iter().position(|weight| !weight.is_finite()) {
            return Err(AbinsError::structural(
                "INPUT.KPOINTS_VALUE",
                format!("weight of k-point {} must be finite", k),
            ));
        }

        Ok(Self {
            k_vectors,
            weights,
            frequencies,
        })
    }

    /// Weights and frequencies only; k-vectors default to the origin.
    pub fn from_frequencies(weights: Vec<f64>, frequencies: Vec<Vec<f64>>) -> AbinsResult<Self> {
        let k_vectors = vec![[0.0; 3]; frequencies.len()];
        Self::new(k_vectors, weights, frequencies)
    }

    pub fn num_k(&self) -> usize {
        self.frequencies.len()
    }

    pub fn num_freq(&self) -> usize {
        self.frequencies[0].len()
    }

    pub fn k_vectors(&self) -> &[[f64; 3]] {
        &self.k_vectors
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn frequencies(&self, k: usize) -> &[f64] {
        &self.frequencies[k]
    }

    pub fn all_frequencies(&self) -> &[Vec<f64>] {
        &self.frequencies
    }
}

/// Per-atom mean-square displacements and Debye-Waller factors from the
/// powder calculator.
#[derive(Debug, Clone, PartialEq)]
pub struct PowderData {
    msd: Vec<f64>,
    dw: Vec<f64>,
}

impl PowderData {
    pub fn new(msd: Vec<f64>, dw: Vec<f64>) -> AbinsResult<Self> {
        if msd.len() != dw.len() {
            return Err(AbinsError::structural(
                "INPUT.POWDER_SHAPE",
                format!("powder arrays disagree: msd={}, dw={}", msd.len(), dw.len()),
            ));
        }
        for (atom, (&msd_value, &dw_value)) in msd.iter().zip(&dw).enumerate() {
            validate_displacement("msd", "atom", atom, msd_value)?;
            validate_displacement("dw", "atom", atom, dw_value)?;
        }
        Ok(Self { msd, dw })
    }

    pub fn num_atoms(&self) -> usize {
        self.msd.len()
    }

    pub fn msd(&self) -> &[f64] {
        &self.msd
    }

    pub fn dw(&self) -> &[f64] {
        &self.dw
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtomVibrationalData {
    sort: usize,
    symbol: String,
    msd: f64,
    dw: f64,
}

impl AtomVibrationalData {
    pub fn new(sort: usize, symbol: impl Into<String>, msd: f64, dw: f64) -> AbinsResult<Self> {
        validate_displacement("msd", "sort", sort, msd)?;
        validate_displacement("dw", "sort", sort, dw)?;
        Ok(Self {
            sort,
            symbol: symbol.into(),
            msd,
            dw,
        })
    }

    pub fn sort(&self) -> usize {
        self.sort
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn msd(&self) -> f64 {
        self.msd
    }

    pub fn dw(&self) -> f64 {
        self.dw
    }
}

/// Atoms plus k-point data of one vibrational calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct AbinsData {
    atoms: Vec<AtomData>,
    k_points: KPointData,
}

impl AbinsData {
    pub fn new(atoms: Vec<AtomData>, k_points: KPointData) -> AbinsResult<Self> {
        if atoms.is_empty() {
            return Err(AbinsError::structural(
                "INPUT.ATOMS_EMPTY",
                "at least one atom is required",
            ));
        }
        Ok(Self { atoms, k_points })
    }

    pub fn atoms(&self) -> &[AtomData] {
        &self.atoms
    }

    pub fn k_points(&self) -> &KPointData {
        &self.k_points
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// Pairs every atom with its powder entry, in atom-index order.
    pub fn vibrational_atoms(&self, powder: &PowderData) -> AbinsResult<Vec<AtomVibrationalData>> {
        if powder.num_atoms() != self.atoms.len() {
            return Err(AbinsError::type_mismatch(
                "TYPE.POWDER_DATA",
                format!(
                    "powder data describes {} atoms but the vibrational data has {}",
                    powder.num_atoms(),
                    self.atoms.len()
                ),
            ));
        }

        self.atoms
            .iter()
            .zip(powder.msd().iter().zip(powder.dw()))
            .map(|(atom, (&msd, &dw))| {
                AtomVibrationalData::new(atom.sort, atom.symbol.clone(), msd, dw)
            })
            .collect()
    }
}

/// `owner` names what `index` counts: a position for `atom`, a group for `sort`.
fn validate_displacement(name: &str, owner: &str, index: usize, value: f64) -> AbinsResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(AbinsError::configuration(
            "CONFIG.POWDER_VALUE",
            format!(
                "{} of {} {} must be finite and non-negative, got {}",
                name, owner, index, value
            ),
        ));
    }
    Ok(())
}
