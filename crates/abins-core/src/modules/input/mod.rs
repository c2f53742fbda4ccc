mod model;
mod parser;

pub use model::{AbinsData, AtomData, AtomVibrationalData, KPointData, PowderData};
pub use parser::{
    AbinsInput, AbinsInputDocument, KPointsDocument, PowderDocument, load_abins_input,
    parse_abins_input,
};
