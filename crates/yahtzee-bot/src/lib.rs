pub mod advice;
pub mod simulator;
pub mod solver;
pub mod weights;

pub use advice::{Advice, Adviser};
pub use simulator::{SimulatedTurn, TurnPhase, TurnSimulator, TurnStep};
pub use solver::{BestMove, EvCache, Potential, Solver, SolverError};
pub use weights::{Strength, WeightTable};
