pub mod calculator;
pub mod export;
pub mod input;
pub mod instrument;
pub mod q_calculator;
pub mod serialization;
pub mod store;
pub mod structure_factor;
