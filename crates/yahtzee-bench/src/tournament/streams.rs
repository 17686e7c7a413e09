use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use yahtzee_core::dice::RngDice;

/// Dice for one game: a shared stream of opening hands and one reroll stream per agent,
/// all seeded from the game seed.
pub struct DiceStreams {
    openings: u64,
    rerolls: Vec<u64>,
}

impl DiceStreams {
    pub fn new(game_seed: u64, agents: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(game_seed);
        let openings = rng.next_u64();
        let rerolls = (0..agents).map(|_| rng.next_u64()).collect();
        Self { openings, rerolls }
    }

    pub fn openings(&self) -> RngDice<StdRng> {
        RngDice::seeded(self.openings)
    }

    /// One reroll source per agent, in configuration order.
    pub fn rerolls(&self) -> impl Iterator<Item = RngDice<StdRng>> + '_ {
        self.rerolls.iter().map(|&seed| RngDice::seeded(seed))
    }
}
