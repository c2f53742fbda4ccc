pub mod constants;
pub mod numeric;
pub mod parameters;
