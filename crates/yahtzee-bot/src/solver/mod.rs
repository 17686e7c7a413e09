//! Backward-induction expected-value solver over (hand, rerolls left, open categories).

mod cache;

pub use cache::{EvCache, EvKey, KeepKey};

use crate::weights::WeightTable;
use core::fmt;
use tracing::{Level, event};
use yahtzee_core::dice::RollOutcomeCache;
use yahtzee_core::game::turn::MAX_REROLLS;
use yahtzee_core::model::category::{Category, CategorySet};
use yahtzee_core::model::hand::Hand;
use yahtzee_core::model::keep::KeepMask;
use yahtzee_core::model::score::score;

const SET_BONUS: f64 = 5.0;
const QUAD_BONUS: f64 = 2.0;

/// Best terminal utility over the open categories.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Potential {
    pub utility: f64,
    pub category: Option<Category>,
}

/// Recommended dice to hold and the expected utility of holding them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMove {
    pub keep: KeepMask,
    pub expected_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverError {
    NoRerollsLeft,
    TooManyRerolls { requested: u8, max: u8 },
    NoOpenCategories,
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::NoRerollsLeft => {
                write!(f, "no rerolls left; evaluate the potential score instead")
            }
            SolverError::TooManyRerolls { requested, max } => {
                write!(f, "{requested} rerolls requested but a turn allows {max}")
            }
            SolverError::NoOpenCategories => write!(f, "no open categories to score into"),
        }
    }
}

impl std::error::Error for SolverError {}

/// Utility of `hand` written into each open category, minus that category's par.
///
/// Upper categories earn a small bonus for three or four matching dice, since such
/// hands also keep the kind-based lower categories alive.
pub fn potential_score(hand: &Hand, open: CategorySet, weights: &WeightTable) -> Potential {
    let mut best = Potential {
        utility: f64::NEG_INFINITY,
        category: None,
    };

    for category in open.iter() {
        let mut utility = f64::from(score(hand, category)) - weights.get(category);
        if let Some(face) = category.upper_face() {
            let matching = hand.count(face);
            if matching >= 3 {
                utility += SET_BONUS;
            }
            if matching >= 4 {
                utility += QUAD_BONUS;
            }
        }

        if utility > best.utility {
            best = Potential {
                utility,
                category: Some(category),
            };
        }
    }

    best
}

#[derive(Debug, Clone, Copy)]
pub struct Solver<'c> {
    outcomes: &'c RollOutcomeCache,
}

impl Solver<'static> {
    /// Solver backed by the process-wide roll distribution cache.
    pub fn global() -> Self {
        Self::new(RollOutcomeCache::global())
    }
}

impl Default for Solver<'static> {
    fn default() -> Self {
        Self::global()
    }
}

impl<'c> Solver<'c> {
    pub fn new(outcomes: &'c RollOutcomeCache) -> Self {
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &'c RollOutcomeCache {
        self.outcomes
    }

    pub fn potential_score(
        &self,
        hand: &Hand,
        open: CategorySet,
        weights: &WeightTable,
    ) -> Potential {
        potential_score(hand, open, weights)
    }

    /// Value of `hand` with `rerolls_left` rerolls under optimal holds.
    ///
    /// `cache` may be reused across open sets but its entries assume one `weights` table.
    pub fn expected_value(
        &self,
        hand: &Hand,
        rerolls_left: u8,
        open: CategorySet,
        weights: &WeightTable,
        cache: &mut EvCache,
    ) -> f64 {
        let key = EvKey::new(*hand, rerolls_left, open);
        if let Some(value) = cache.get(&key) {
            return value;
        }

        let value = if rerolls_left == 0 {
            potential_score(hand, open, weights).utility
        } else {
            KeepMask::iter_all()
                .map(|keep| self.keep_value(hand, keep, rerolls_left - 1, open, weights, cache))
                .fold(f64::NEG_INFINITY, f64::max)
        };

        cache.insert(key, value);
        value
    }

    /// Recommended hold for `hand` with `rerolls_left` rerolls.
    ///
    /// Every one of the 32 masks is evaluated; ties go to the lowest mask.
    pub fn best_move(
        &self,
        hand: &Hand,
        rerolls_left: u8,
        open: CategorySet,
        weights: &WeightTable,
    ) -> Result<BestMove, SolverError> {
        if rerolls_left == 0 {
            return Err(SolverError::NoRerollsLeft);
        }
        if rerolls_left > MAX_REROLLS {
            return Err(SolverError::TooManyRerolls {
                requested: rerolls_left,
                max: MAX_REROLLS,
            });
        }
        if open.is_empty() {
            return Err(SolverError::NoOpenCategories);
        }

        let mut cache = EvCache::new();
        let mut best = BestMove {
            keep: KeepMask::NONE,
            expected_value: f64::NEG_INFINITY,
        };

        for keep in KeepMask::iter_all() {
            let value = self.keep_value(hand, keep, rerolls_left - 1, open, weights, &mut cache);
            if value > best.expected_value {
                best = BestMove {
                    keep,
                    expected_value: value,
                };
            }
        }

        log_best_move(hand, rerolls_left, open, &best, &cache);
        Ok(best)
    }

    fn keep_value(
        &self,
        hand: &Hand,
        keep: KeepMask,
        rerolls_after: u8,
        open: CategorySet,
        weights: &WeightTable,
        cache: &mut EvCache,
    ) -> f64 {
        let kept = keep.kept_dice(hand);
        let key = KeepKey::new(&kept, rerolls_after, open);
        if let Some(value) = cache.keep_value(&key) {
            return value;
        }

        let value = self
            .outcomes
            .transition(&kept, keep.rerolled_count())
            .iter()
            .map(|(next, probability)| {
                probability * self.expected_value(next, rerolls_after, open, weights, cache)
            })
            .sum();

        cache.insert_keep(key, value);
        value
    }
}

fn log_best_move(
    hand: &Hand,
    rerolls_left: u8,
    open: CategorySet,
    best: &BestMove,
    cache: &EvCache,
) {
    if !tracing::enabled!(target: "yahtzee_bot::solver", Level::DEBUG) {
        return;
    }

    event!(
        target: "yahtzee_bot::solver",
        Level::DEBUG,
        hand = %hand,
        rerolls_left,
        open = open.len(),
        keep = %best.keep,
        expected_value = best.expected_value,
        cache_entries = cache.len(),
        cache_hits = cache.hits(),
        cache_misses = cache.misses(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand(dice: [u8; 5]) -> Hand {
        Hand::new(dice).unwrap()
    }

    fn set(categories: &[Category]) -> CategorySet {
        categories.iter().copied().collect()
    }

    #[test]
    fn all_threes_prefers_upper_threes_when_open() {
        let potential = potential_score(
            &hand([3, 3, 3, 3, 3]),
            CategorySet::all(),
            &WeightTable::STATIC,
        );
        // 15 - 8 plus both same-kind bonuses
        assert_eq!(potential.category, Some(Category::Threes));
        assert_eq!(potential.utility, 14.0);
    }

    #[test]
    fn all_threes_takes_yahtzee_among_lower_categories() {
        let open = set(&[
            Category::ThreeOfAKind,
            Category::FourOfAKind,
            Category::SmallStraight,
            Category::LargeStraight,
            Category::Yahtzee,
            Category::Chance,
        ]);
        let potential = potential_score(&hand([3, 3, 3, 3, 3]), open, &WeightTable::STATIC);
        assert_eq!(potential.category, Some(Category::Yahtzee));
        assert_eq!(potential.utility, 0.0);
    }

    #[test]
    fn degenerate_hand_picks_least_negative() {
        let open = set(&[Category::Yahtzee, Category::LargeStraight, Category::Sixes]);
        let potential = potential_score(&hand([1, 1, 2, 3, 5]), open, &WeightTable::STATIC);
        assert_eq!(potential.category, Some(Category::Sixes));
        assert_eq!(potential.utility, -17.0);
    }

    #[test]
    fn ties_keep_first_category_in_order() {
        let mut weights = WeightTable::STATIC;
        weights.set(Category::Chance, 0.0);
        weights.set(Category::ThreeOfAKind, 0.0);
        let open = set(&[Category::Chance, Category::ThreeOfAKind]);
        let potential = potential_score(&hand([2, 2, 2, 5, 6]), open, &weights);
        assert_eq!(potential.category, Some(Category::ThreeOfAKind));
    }

    #[test]
    fn empty_open_set_has_no_category() {
        let potential = potential_score(
            &hand([1, 2, 3, 4, 5]),
            CategorySet::empty(),
            &WeightTable::STATIC,
        );
        assert_eq!(potential.category, None);
        assert_eq!(potential.utility, f64::NEG_INFINITY);
    }

    #[test]
    fn best_move_rejects_out_of_domain_queries() {
        let solver = Solver::global();
        let h = hand([1, 2, 3, 4, 5]);
        let weights = WeightTable::STATIC;
        assert_eq!(
            solver.best_move(&h, 0, CategorySet::all(), &weights),
            Err(SolverError::NoRerollsLeft)
        );
        assert_eq!(
            solver.best_move(&h, 3, CategorySet::all(), &weights),
            Err(SolverError::TooManyRerolls {
                requested: 3,
                max: 2
            })
        );
        assert_eq!(
            solver.best_move(&h, 1, CategorySet::empty(), &weights),
            Err(SolverError::NoOpenCategories)
        );
    }

    #[test]
    fn five_sixes_keeps_everything() {
        let solver = Solver::global();
        let best = solver
            .best_move(
                &hand([6, 6, 6, 6, 6]),
                1,
                CategorySet::all(),
                &WeightTable::STATIC,
            )
            .unwrap();
        assert_eq!(best.keep, KeepMask::ALL);
        assert!((best.expected_value - 20.0).abs() < 1e-9);
    }

    #[test]
    fn only_yahtzee_open_chases_the_pair() {
        let solver = Solver::global();
        let h = hand([1, 2, 4, 6, 6]);
        let best = solver
            .best_move(&h, 2, set(&[Category::Yahtzee]), &WeightTable::STATIC)
            .unwrap();
        assert_eq!(best.keep.kept_dice(&h), vec![6, 6]);
        assert!(best.expected_value > -50.0 && best.expected_value < 0.0);
    }

    // Plain recursion over (hand, mask) with no memo at all.
    fn reference_value(
        outcomes: &RollOutcomeCache,
        hand: &Hand,
        rerolls_left: u8,
        open: CategorySet,
        weights: &WeightTable,
    ) -> f64 {
        if rerolls_left == 0 {
            return potential_score(hand, open, weights).utility;
        }
        KeepMask::iter_all()
            .map(|keep| {
                outcomes
                    .transition(&keep.kept_dice(hand), keep.rerolled_count())
                    .iter()
                    .map(|(next, p)| {
                        p * reference_value(outcomes, next, rerolls_left - 1, open, weights)
                    })
                    .sum::<f64>()
            })
            .fold(f64::NEG_INFINITY, f64::max)
    }

    #[test]
    fn memoized_values_match_plain_recursion() {
        let solver = Solver::global();
        let weights = WeightTable::STATIC;
        let open = set(&[
            Category::Fours,
            Category::FullHouse,
            Category::SmallStraight,
            Category::Yahtzee,
        ]);
        for dice in [[2, 3, 3, 5, 6], [1, 1, 4, 4, 6]] {
            let h = hand(dice);
            let expected = reference_value(solver.outcomes(), &h, 1, open, &weights);
            let best = solver.best_move(&h, 1, open, &weights).unwrap();
            let mut cache = EvCache::new();
            let value = solver.expected_value(&h, 1, open, &weights, &mut cache);
            assert!((best.expected_value - expected).abs() < 1e-9);
            assert!((value - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn best_move_matches_expected_value_with_two_rerolls() {
        let solver = Solver::global();
        let weights = WeightTable::STATIC;
        let open = CategorySet::all().without(Category::Chance);
        let h = hand([2, 3, 3, 5, 6]);
        let best = solver.best_move(&h, 2, open, &weights).unwrap();
        let mut cache = EvCache::new();
        let value = solver.expected_value(&h, 2, open, &weights, &mut cache);
        assert!((best.expected_value - value).abs() < 1e-9);
    }

    #[test]
    fn reused_cache_keeps_open_sets_apart() {
        let solver = Solver::global();
        let weights = WeightTable::STATIC;
        let h = hand([1, 2, 3, 4, 6]);
        let yahtzee = set(&[Category::Yahtzee]);
        let chance = set(&[Category::Chance]);

        let mut shared = EvCache::new();
        let first = solver.expected_value(&h, 1, yahtzee, &weights, &mut shared);
        let reused = solver.expected_value(&h, 1, chance, &weights, &mut shared);

        let mut fresh = EvCache::new();
        let alone = solver.expected_value(&h, 1, chance, &weights, &mut fresh);
        assert!(first < -40.0);
        assert!((reused - alone).abs() < 1e-9);
    }

    #[test]
    fn more_rerolls_never_hurt() {
        let solver = Solver::global();
        let weights = WeightTable::STATIC;
        for dice in [[1, 1, 2, 5, 6], [2, 3, 4, 4, 6], [5, 5, 5, 1, 2]] {
            let h = hand(dice);
            let stand = potential_score(&h, CategorySet::all(), &weights).utility;
            let one = solver.best_move(&h, 1, CategorySet::all(), &weights).unwrap();
            let two = solver.best_move(&h, 2, CategorySet::all(), &weights).unwrap();
            assert!(one.expected_value >= stand - 1e-9);
            assert!(two.expected_value >= one.expected_value - 1e-9);
        }
    }

    #[test]
    fn private_roll_cache_gives_same_answer() {
        let own = RollOutcomeCache::new();
        let local = Solver::new(&own);
        let shared = Solver::global();
        let h = hand([1, 3, 4, 5, 5]);
        let open = CategorySet::all();
        let a = local.best_move(&h, 2, open, &WeightTable::STATIC).unwrap();
        let b = shared.best_move(&h, 2, open, &WeightTable::STATIC).unwrap();
        assert_eq!(a, b);
        assert!(own.is_computed(5));
    }
}
