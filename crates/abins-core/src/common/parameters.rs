use crate::domain::AbinsError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_OVERTONE_COUNT: usize = 10;
pub const DEFAULT_POINTS_PER_PEAK: usize = 50;

/// TOSCA resolution and kinematics constants, all in cm⁻¹ except the angle.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToscaParameters {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub final_neutron_energy: f64,
    pub cos_scattering_angle: f64,
    /// Half width of each sampled peak in units of its sigma.
    pub sigma_span: f64,
}

impl Default for ToscaParameters {
    fn default() -> Self {
        Self {
            a: 0.000_000_1,
            b: 0.005,
            c: 2.5,
            final_neutron_energy: 32.0,
            cos_scattering_angle: 2.356_f64.cos(),
            sigma_span: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AbinsParameters {
    pub overtone_count: usize,
    pub points_per_peak: usize,
    pub tosca: ToscaParameters,
}

impl Default for AbinsParameters {
    fn default() -> Self {
        Self {
            overtone_count: DEFAULT_OVERTONE_COUNT,
            points_per_peak: DEFAULT_POINTS_PER_PEAK,
            tosca: ToscaParameters::default(),
        }
    }
}

impl AbinsParameters {
    pub fn validate(&self) -> Result<(), AbinsError> {
        if self.overtone_count == 0 {
            return Err(AbinsError::configuration(
                "CONFIG.OVERTONE_COUNT",
                "overtone count must be at least 1",
            ));
        }
        if self.points_per_peak == 0 {
            return Err(AbinsError::configuration(
                "CONFIG.POINTS_PER_PEAK",
                "points per peak must be at least 1",
            ));
        }

        let tosca = &self.tosca;
        let named = [
            ("a", tosca.a),
            ("b", tosca.b),
            ("c", tosca.c),
            ("finalNeutronEnergy", tosca.final_neutron_energy),
            ("cosScatteringAngle", tosca.cos_scattering_angle),
            ("sigmaSpan", tosca.sigma_span),
        ];
        if let Some((name, value)) = named.iter().find(|(_, value)| !value.is_finite()) {
            return Err(AbinsError::configuration(
                "CONFIG.TOSCA_PARAMETERS",
                format!("TOSCA parameter '{}' must be finite, got {}", name, value),
            ));
        }
        if tosca.final_neutron_energy <= 0.0 {
            return Err(AbinsError::configuration(
                "CONFIG.TOSCA_PARAMETERS",
                format!(
                    "TOSCA final neutron energy must be > 0, got {}",
                    tosca.final_neutron_energy
                ),
            ));
        }
        if !(-1.0..=1.0).contains(&tosca.cos_scattering_angle) {
            return Err(AbinsError::configuration(
                "CONFIG.TOSCA_PARAMETERS",
                format!(
                    "TOSCA scattering angle cosine must lie in [-1, 1], got {}",
                    tosca.cos_scattering_angle
                ),
            ));
        }
        if tosca.sigma_span <= 0.0 {
            return Err(AbinsError::configuration(
                "CONFIG.TOSCA_PARAMETERS",
                format!("TOSCA sigma span must be > 0, got {}", tosca.sigma_span),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParameterError {
    #[error("failed to read parameter file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse parameter file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl From<ParameterError> for AbinsError {
    fn from(error: ParameterError) -> Self {
        match &error {
            ParameterError::Read { .. } => {
                AbinsError::io_system("IO.PARAMETERS_READ", error.to_string())
            }
            ParameterError::Parse { .. } => {
                AbinsError::configuration("CONFIG.PARAMETERS_PARSE", error.to_string())
            }
        }
    }
}

/// Missing keys fall back to [`AbinsParameters::default`].
pub fn load_parameters(path: impl AsRef<Path>) -> Result<AbinsParameters, ParameterError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| ParameterError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&source).map_err(|source| ParameterError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::{
        AbinsParameters, DEFAULT_OVERTONE_COUNT, DEFAULT_POINTS_PER_PEAK, ParameterError,
        load_parameters,
    };
    use crate::domain::{AbinsError, AbinsErrorCategory};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        let parameters = AbinsParameters::default();
        assert_eq!(parameters.overtone_count, DEFAULT_OVERTONE_COUNT);
        assert_eq!(parameters.points_per_peak, DEFAULT_POINTS_PER_PEAK);
        assert!(parameters.validate().is_ok());
        assert!((parameters.tosca.cos_scattering_angle - 2.356_f64.cos()).abs() < 1.0e-15);
    }

    #[test]
    fn partial_file_overrides_only_named_keys() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("parameters.json");
        fs::write(&path, r#"{"pointsPerPeak": 7, "tosca": {"c": 1.5}}"#)
            .expect("parameters should be written");

        let parameters = load_parameters(&path).expect("parameters should load");
        assert_eq!(parameters.points_per_peak, 7);
        assert_eq!(parameters.overtone_count, DEFAULT_OVERTONE_COUNT);
        assert_eq!(parameters.tosca.c, 1.5);
        assert_eq!(parameters.tosca.b, 0.005);
    }

    #[test]
    fn load_reports_read_and_parse_failures() {
        let temp = TempDir::new().expect("tempdir should be created");
        let missing = load_parameters(temp.path().join("missing.json"))
            .expect_err("missing file should fail");
        assert!(matches!(missing, ParameterError::Read { .. }));
        assert_eq!(
            AbinsError::from(missing).category(),
            AbinsErrorCategory::IoSystemError
        );

        let path = temp.path().join("broken.json");
        fs::write(&path, "{ not json").expect("broken file should be written");
        let broken = load_parameters(&path).expect_err("broken file should fail");
        assert!(matches!(broken, ParameterError::Parse { .. }));
        assert_eq!(
            AbinsError::from(broken).category(),
            AbinsErrorCategory::ConfigurationError
        );
    }

    #[test]
    fn validate_rejects_zero_counts_and_bad_tosca_values() {
        let mut parameters = AbinsParameters {
            overtone_count: 0,
            ..AbinsParameters::default()
        };
        assert_eq!(
            parameters.validate().map_err(|error| error.placeholder()),
            Err("CONFIG.OVERTONE_COUNT")
        );

        parameters.overtone_count = 2;
        parameters.points_per_peak = 0;
        assert_eq!(
            parameters.validate().map_err(|error| error.placeholder()),
            Err("CONFIG.POINTS_PER_PEAK")
        );

        parameters.points_per_peak = 3;
        parameters.tosca.b = f64::NAN;
        let error = parameters.validate().expect_err("NaN parameter should fail");
        assert!(error.message().contains("'b'"));

        parameters.tosca.b = 0.005;
        parameters.tosca.cos_scattering_angle = 1.5;
        assert!(parameters.validate().is_err());
    }
}
