pub mod errors;

pub use errors::{AbinsError, AbinsErrorCategory, AbinsResult, ExitStatus};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecutionMode {
    #[default]
    Serial,
    Parallel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleForm {
    Powder,
    SingleCrystal,
}

impl SampleForm {
    pub const ALL: [SampleForm; 2] = [SampleForm::Powder, SampleForm::SingleCrystal];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Powder => "Powder",
            Self::SingleCrystal => "SingleCrystal",
        }
    }
}

impl Display for SampleForm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for SampleForm {
    type Err = AbinsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|form| form.as_str() == value.trim())
            .ok_or_else(|| {
                AbinsError::configuration(
                    "CONFIG.SAMPLE_FORM",
                    format!("Invalid sample form {}", value),
                )
            })
    }
}

/// Sample temperature in Kelvin; always finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Temperature(f64);

impl Temperature {
    pub fn new(kelvin: f64) -> AbinsResult<Self> {
        if !kelvin.is_finite() {
            return Err(AbinsError::configuration(
                "CONFIG.TEMPERATURE",
                format!(
                    "Invalid value of the temperature '{}'. Number was expected.",
                    kelvin
                ),
            ));
        }
        if kelvin < 0.0 {
            return Err(AbinsError::configuration(
                "CONFIG.TEMPERATURE",
                "Temperature cannot be negative.",
            ));
        }
        Ok(Self(kelvin))
    }

    pub fn parse(source: &str) -> AbinsResult<Self> {
        let kelvin = source.trim().parse::<f64>().map_err(|_| {
            AbinsError::configuration(
                "CONFIG.TEMPERATURE",
                format!(
                    "Invalid value of the temperature '{}'. Number was expected.",
                    source
                ),
            )
        })?;
        Self::new(kelvin)
    }

    pub const fn kelvin(self) -> f64 {
        self.0
    }
}

impl Display for Temperature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} K", self.0)
    }
}
