//! Dice probability model and dice sources.

pub mod outcomes;
pub mod source;

pub use outcomes::{RollDistribution, RollOutcome, RollOutcomeCache};
pub use source::{DiceSource, FixedDice, RngDice, reroll, roll_hand};
