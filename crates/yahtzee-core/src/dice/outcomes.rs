//! Probability of every sorted outcome when rolling `n` fresh dice, and the
//! transition from a set of held dice to complete hands.

use crate::model::hand::{DICE_PER_HAND, FACES, Hand};
use std::collections::BTreeMap;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq)]
pub struct RollOutcome {
    pub dice: Vec<u8>,
    pub probability: f64,
}

/// Outcomes for one dice count, ordered by their sorted dice sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct RollDistribution {
    dice_count: usize,
    outcomes: Vec<RollOutcome>,
}

impl RollDistribution {
    /// Enumerates all `6^n` ordered rolls and collapses them onto sorted sequences.
    pub fn compute(dice_count: usize) -> Self {
        let mut counts: BTreeMap<Vec<u8>, u32> = BTreeMap::new();
        let mut current = Vec::with_capacity(dice_count);
        enumerate_ordered(dice_count, &mut current, &mut |roll: &[u8]| {
            let mut key = roll.to_vec();
            key.sort_unstable();
            *counts.entry(key).or_insert(0) += 1;
        });

        let total = f64::from(FACES).powi(dice_count as i32);
        let outcomes = counts
            .into_iter()
            .map(|(dice, count)| RollOutcome {
                dice,
                probability: f64::from(count) / total,
            })
            .collect();

        Self {
            dice_count,
            outcomes,
        }
    }

    pub fn dice_count(&self) -> usize {
        self.dice_count
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn outcomes(&self) -> &[RollOutcome] {
        &self.outcomes
    }

    pub fn total_probability(&self) -> f64 {
        self.outcomes.iter().map(|outcome| outcome.probability).sum()
    }
}

fn enumerate_ordered<F>(remaining: usize, current: &mut Vec<u8>, visit: &mut F)
where
    F: FnMut(&[u8]),
{
    if remaining == 0 {
        visit(current);
        return;
    }
    for face in 1..=FACES {
        current.push(face);
        enumerate_ordered(remaining - 1, current, visit);
        current.pop();
    }
}

/// Write-once store of roll distributions for 0..=5 dice.
#[derive(Debug, Default)]
pub struct RollOutcomeCache {
    slots: [OnceLock<RollDistribution>; DICE_PER_HAND + 1],
}

impl RollOutcomeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide instance; distributions depend only on the dice count.
    pub fn global() -> &'static RollOutcomeCache {
        static GLOBAL: OnceLock<RollOutcomeCache> = OnceLock::new();
        GLOBAL.get_or_init(RollOutcomeCache::new)
    }

    /// # Panics
    /// Panics if `dice_count` exceeds the five dice of a hand.
    pub fn outcomes(&self, dice_count: usize) -> &RollDistribution {
        assert!(
            dice_count <= DICE_PER_HAND,
            "cannot roll {dice_count} dice, a hand holds {DICE_PER_HAND}"
        );
        self.slots[dice_count].get_or_init(|| RollDistribution::compute(dice_count))
    }

    pub fn is_computed(&self, dice_count: usize) -> bool {
        self.slots
            .get(dice_count)
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Every hand reachable by rolling `rolling` dice next to `held`, with its probability.
    pub fn transition(&self, held: &[u8], rolling: usize) -> Vec<(Hand, f64)> {
        debug_assert_eq!(held.len() + rolling, DICE_PER_HAND);
        self.outcomes(rolling)
            .outcomes()
            .iter()
            .map(|outcome| (Hand::from_parts(held, &outcome.dice), outcome.probability))
            .collect()
    }
}
