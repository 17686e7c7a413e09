use crate::solver::{BestMove, Solver, SolverError};
use crate::weights::Strength;
use yahtzee_core::game::turn::TurnState;
use yahtzee_core::model::category::Category;
use yahtzee_core::model::scorecard::ScoreCard;

/// Suggestion shown to a human player for the turn in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Advice {
    Reroll(BestMove),
    Score { category: Category, utility: f64 },
}

/// Live hint provider. Defaults to the game-state aware weights.
#[derive(Debug, Clone, Copy)]
pub struct Adviser<'c> {
    solver: Solver<'c>,
    strength: Strength,
}

impl Adviser<'static> {
    pub fn global() -> Self {
        Self::new(Solver::global(), Strength::Pro)
    }
}

impl Default for Adviser<'static> {
    fn default() -> Self {
        Self::global()
    }
}

impl<'c> Adviser<'c> {
    pub fn new(solver: Solver<'c>, strength: Strength) -> Self {
        Self { solver, strength }
    }

    pub fn strength(&self) -> Strength {
        self.strength
    }

    pub fn advise(&self, turn: &TurnState, card: &ScoreCard) -> Result<Advice, SolverError> {
        let open = card.open_categories();
        let weights = self.strength.weights(card, open);

        if turn.can_reroll() {
            let best = self
                .solver
                .best_move(turn.hand(), turn.rerolls_left(), open, &weights)?;
            return Ok(Advice::Reroll(best));
        }

        let potential = self.solver.potential_score(turn.hand(), open, &weights);
        match potential.category {
            Some(category) => Ok(Advice::Score {
                category,
                utility: potential.utility,
            }),
            None => Err(SolverError::NoOpenCategories),
        }
    }
}
