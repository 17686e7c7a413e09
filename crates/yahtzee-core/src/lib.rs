#![deny(warnings)]
pub mod dice;
pub mod game;
pub mod model;
