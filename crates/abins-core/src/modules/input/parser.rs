use super::model::{AbinsData, AtomData, KPointData, PowderData};
use crate::domain::{AbinsError, AbinsResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbinsInputDocument {
    pub atoms: Vec<AtomData>,
    pub k_points: KPointsDocument,
    pub powder: PowderDocument,
    /// Precomputed Q (or Q²) per k-point and mode; computed from the
    /// instrument when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<Vec<Vec<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KPointsDocument {
    #[serde(default)]
    pub k_vectors: Vec<[f64; 3]>,
    pub weights: Vec<f64>,
    pub frequencies: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PowderDocument {
    pub msd: Vec<f64>,
    pub dw: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AbinsInput {
    pub data: AbinsData,
    pub powder: PowderData,
    pub q: Option<Vec<Vec<f64>>>,
}

impl AbinsInputDocument {
    pub fn into_input(self) -> AbinsResult<AbinsInput> {
        let KPointsDocument {
            k_vectors,
            weights,
            frequencies,
        } = self.k_points;
        let k_points = if k_vectors.is_empty() {
            KPointData::from_frequencies(weights, frequencies)?
        } else {
            KPointData::new(k_vectors, weights, frequencies)?
        };

        Ok(AbinsInput {
            data: AbinsData::new(self.atoms, k_points)?,
            powder: PowderData::new(self.powder.msd, self.powder.dw)?,
            q: self.q,
        })
    }
}

pub fn parse_abins_input(source_name: &str, source: &str) -> AbinsResult<AbinsInput> {
    let document: AbinsInputDocument = serde_json::from_str(source).map_err(|error| {
        AbinsError::configuration(
            "CONFIG.INPUT_PARSE",
            format!("failed to parse input '{}': {}", source_name, error),
        )
    })?;
    document.into_input()
}

pub fn load_abins_input(path: impl AsRef<Path>) -> AbinsResult<AbinsInput> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| {
        AbinsError::io_system(
            "IO.INPUT_READ",
            format!("failed to read input '{}': {}", path.display(), source),
        )
    })?;
    parse_abins_input(&path.display().to_string(), &source)
}
