pub mod serialization;
pub mod turn;
