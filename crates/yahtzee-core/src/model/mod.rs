pub mod category;
pub mod hand;
pub mod keep;
pub mod score;
pub mod scorecard;
