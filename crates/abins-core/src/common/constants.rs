//! Physical constants and fixed names shared by the S(Q, ω) pipeline.
//!
//! CODATA 2014 values; frequencies throughout the crate are in cm⁻¹ and
//! momentum transfer in Å⁻¹.

pub const PI: f64 = std::f64::consts::PI;
pub const FOUR_PI: f64 = 4.0 * PI;

pub const NEUTRON_MASS_KG: f64 = 1.674_927_471e-27;
pub const PLANCK_J_S: f64 = 6.626_070_040e-34;
pub const HBAR_J_S: f64 = 1.054_571_800e-34;
pub const SPEED_OF_LIGHT_M_S: f64 = 2.997_924_58e8;

const PER_CM_TO_PER_M: f64 = 100.0;
const SQUARE_M_TO_SQUARE_ANGSTROM: f64 = 1.0e-20;

/// Converts a neutron energy in cm⁻¹ to k² in Å⁻².
pub const WAVENUMBER_TO_INVERSE_A: f64 = 2.0
    * NEUTRON_MASS_KG
    * PLANCK_J_S
    * SPEED_OF_LIGHT_M_S
    * PER_CM_TO_PER_M
    / (HBAR_J_S * HBAR_J_S)
    * SQUARE_M_TO_SQUARE_ANGSTROM;

pub const S_DATA_GROUP: &str = "S";
pub const STORE_EXTENSION: &str = "abins.json";

pub const ATTRIBUTE_TEMPERATURE: &str = "temperature";
pub const ATTRIBUTE_SAMPLE_FORM: &str = "sample_form";
pub const ATTRIBUTE_FILENAME: &str = "filename";
pub const ATTRIBUTE_HASH: &str = "hash";
pub const DATASET_ATOMS: &str = "atoms_data";
pub const DATASET_FREQUENCIES: &str = "convoluted_frequencies";
