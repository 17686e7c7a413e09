//! Autonomous opponent: plays one full turn by following the solver's holds.

use crate::solver::{BestMove, Solver, SolverError};
use crate::weights::{Strength, WeightTable};
use serde::Serialize;
use tracing::{Level, event};
use yahtzee_core::dice::{DiceSource, reroll};
use yahtzee_core::game::turn::MAX_REROLLS;
use yahtzee_core::model::category::{Category, CategorySet};
use yahtzee_core::model::hand::Hand;
use yahtzee_core::model::keep::KeepMask;
use yahtzee_core::model::score::score;
use yahtzee_core::model::scorecard::ScoreCard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    AwaitingReroll(u8),
    Resolved,
}

/// One reroll decision: the hand the solver saw and what it chose to hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnStep {
    pub rerolls_left: u8,
    pub hand_before: Hand,
    pub kept: Vec<u8>,
    pub keep: KeepMask,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulatedTurn {
    pub final_hand: Hand,
    pub category: Category,
    pub score: u32,
    pub history: Vec<TurnStep>,
}

#[derive(Debug, Clone, Copy)]
pub struct TurnSimulator<'c> {
    solver: Solver<'c>,
}

impl TurnSimulator<'static> {
    pub fn global() -> Self {
        Self::new(Solver::global())
    }
}

impl Default for TurnSimulator<'static> {
    fn default() -> Self {
        Self::global()
    }
}

impl<'c> TurnSimulator<'c> {
    pub fn new(solver: Solver<'c>) -> Self {
        Self { solver }
    }

    /// Plays out a turn from an opening hand. The scorecard is only read to pick weights;
    /// committing the result is left to the caller.
    pub fn simulate_turn<S: DiceSource + ?Sized>(
        &self,
        start: Hand,
        open: CategorySet,
        card: &ScoreCard,
        strength: Strength,
        source: &mut S,
    ) -> Result<SimulatedTurn, SolverError> {
        if open.is_empty() {
            return Err(SolverError::NoOpenCategories);
        }

        let weights = strength.weights(card, open);
        let mut hand = start;
        let mut history = Vec::with_capacity(usize::from(MAX_REROLLS));
        let mut phase = TurnPhase::AwaitingReroll(MAX_REROLLS);

        while let TurnPhase::AwaitingReroll(rerolls_left) = phase {
            let BestMove { keep, .. } =
                self.solver.best_move(&hand, rerolls_left, open, &weights)?;
            history.push(TurnStep {
                rerolls_left,
                hand_before: hand,
                kept: keep.kept_dice(&hand),
                keep,
            });

            if keep.keeps_all() {
                phase = TurnPhase::Resolved;
                continue;
            }

            hand = reroll(&hand, keep, source);
            phase = match rerolls_left - 1 {
                0 => TurnPhase::Resolved,
                left => TurnPhase::AwaitingReroll(left),
            };
        }

        let turn = self.resolve(hand, open, &weights, history)?;
        log_simulated_turn(&start, strength, &turn);
        Ok(turn)
    }

    fn resolve(
        &self,
        hand: Hand,
        open: CategorySet,
        weights: &WeightTable,
        history: Vec<TurnStep>,
    ) -> Result<SimulatedTurn, SolverError> {
        let potential = self.solver.potential_score(&hand, open, weights);
        let category = potential
            .category
            .or_else(|| open.first())
            .ok_or(SolverError::NoOpenCategories)?;
        Ok(SimulatedTurn {
            final_hand: hand,
            category,
            score: score(&hand, category),
            history,
        })
    }
}

fn log_simulated_turn(start: &Hand, strength: Strength, turn: &SimulatedTurn) {
    if !tracing::enabled!(Level::INFO) {
        return;
    }

    let steps = if turn_details_enabled() {
        turn.history
            .iter()
            .map(|step| format!("{}:{}->{}", step.rerolls_left, step.hand_before, step.keep))
            .collect::<Vec<_>>()
            .join(",")
    } else {
        format!("{} steps", turn.history.len())
    };

    event!(
        target: "yahtzee_bot::simulator",
        Level::INFO,
        strength = %strength,
        start = %start,
        final_hand = %turn.final_hand,
        category = %turn.category,
        score = turn.score,
        steps = %steps,
    );
}

fn turn_details_enabled() -> bool {
    std::env::var("YZP_TURN_DETAILS")
        .map(|raw| matches!(raw.trim(), "1" | "true" | "TRUE" | "on" | "ON"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use yahtzee_core::dice::{FixedDice, RngDice};

    fn hand(dice: [u8; 5]) -> Hand {
        Hand::new(dice).unwrap()
    }

    #[test]
    fn made_yahtzee_stops_after_one_step() {
        let simulator = TurnSimulator::global();
        let card = ScoreCard::new();
        let open = [Category::Yahtzee].into_iter().collect();
        let mut dice = FixedDice::default();
        let turn = simulator
            .simulate_turn(hand([4, 4, 4, 4, 4]), open, &card, Strength::Standard, &mut dice)
            .unwrap();

        assert_eq!(turn.history.len(), 1);
        assert_eq!(turn.history[0].rerolls_left, 2);
        assert_eq!(turn.history[0].keep, KeepMask::ALL);
        assert_eq!(turn.category, Category::Yahtzee);
        assert_eq!(turn.score, 50);
        assert_eq!(dice.remaining(), 0);
    }

    #[test]
    fn scripted_rerolls_fill_the_yahtzee() {
        let simulator = TurnSimulator::global();
        let card = ScoreCard::new();
        let open: CategorySet = [Category::Yahtzee].into_iter().collect();
        // pair of sixes held; three rerolled dice come up 6, 6, 2 then the last die hits
        let mut dice = FixedDice::new([6, 6, 2, 6]);
        let turn = simulator
            .simulate_turn(hand([1, 2, 4, 6, 6]), open, &card, Strength::Standard, &mut dice)
            .unwrap();

        assert_eq!(turn.history.len(), 2);
        assert_eq!(turn.history[0].kept, vec![6, 6]);
        assert_eq!(turn.history[1].hand_before, hand([2, 6, 6, 6, 6]));
        assert_eq!(turn.history[1].kept, vec![6, 6, 6, 6]);
        assert_eq!(turn.final_hand, hand([6, 6, 6, 6, 6]));
        assert_eq!(turn.category, Category::Yahtzee);
        assert_eq!(turn.score, 50);
        assert_eq!(dice.remaining(), 0);
    }

    #[test]
    fn history_length_and_category_stay_in_bounds() {
        let simulator = TurnSimulator::global();
        let mut card = ScoreCard::new();
        card.record(Category::Chance, 20).unwrap();
        card.record(Category::Sixes, 24).unwrap();
        let open = card.open_categories();
        let mut opening = RngDice::seeded(7);
        let mut rerolls = RngDice::seeded(11);

        for strength in [Strength::Standard, Strength::Pro] {
            for _ in 0..6 {
                let start = yahtzee_core::dice::roll_hand(&mut opening);
                let turn = simulator
                    .simulate_turn(start, open, &card, strength, &mut rerolls)
                    .unwrap();
                assert!((1..=2).contains(&turn.history.len()));
                assert!(open.contains(turn.category));
                assert_eq!(turn.history[0].hand_before, start);
                assert_eq!(turn.score, score(&turn.final_hand, turn.category));
            }
        }
    }

    #[test]
    fn empty_open_set_is_rejected() {
        let simulator = TurnSimulator::global();
        let mut dice = FixedDice::default();
        let result = simulator.simulate_turn(
            hand([1, 2, 3, 4, 5]),
            CategorySet::empty(),
            &ScoreCard::new(),
            Strength::Pro,
            &mut dice,
        );
        assert_eq!(result, Err(SolverError::NoOpenCategories));
    }

    #[test]
    fn turn_details_disabled_without_env() {
        unsafe {
            std::env::remove_var("YZP_TURN_DETAILS");
        }
        assert!(!turn_details_enabled());
    }
}
