pub mod common;
pub mod domain;
pub mod modules;

pub use common::parameters::{AbinsParameters, ToscaParameters, load_parameters};
pub use domain::{
    AbinsError, AbinsErrorCategory, AbinsResult, ExecutionMode, SampleForm, Temperature,
};
pub use modules::calculator::{SCalculator, load_structure_factor, store_path_for};
pub use modules::export::{render_spectrum_table, write_spectra};
pub use modules::input::{
    AbinsData, AbinsInput, AtomData, AtomVibrationalData, KPointData, PowderData,
    load_abins_input, parse_abins_input,
};
pub use modules::instrument::{Instrument, ResolutionFunction, produce_instrument};
pub use modules::q_calculator::{QData, calculate_q};
pub use modules::store::{NumericArray, StructuredStore};
pub use modules::structure_factor::{
    PerAtomSpectrum, StructureFactorInput, StructureFactorResult, compute,
};
