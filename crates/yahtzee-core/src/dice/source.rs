use crate::model::hand::{DICE_PER_HAND, FACES, Hand};
use crate::model::keep::KeepMask;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Uniform source of die faces in `1..=6`.
pub trait DiceSource {
    fn roll_die(&mut self) -> u8;

    fn roll_many(&mut self, count: usize) -> Vec<u8> {
        (0..count).map(|_| self.roll_die()).collect()
    }
}

impl<S: DiceSource + ?Sized> DiceSource for &mut S {
    fn roll_die(&mut self) -> u8 {
        (**self).roll_die()
    }
}

/// Adapts any `rand` generator into a dice source.
#[derive(Debug, Clone)]
pub struct RngDice<R> {
    rng: R,
}

impl<R: Rng> RngDice<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl RngDice<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> DiceSource for RngDice<R> {
    fn roll_die(&mut self) -> u8 {
        self.rng.gen_range(1..=FACES)
    }
}

/// Replays a scripted sequence of faces.
#[derive(Debug, Clone, Default)]
pub struct FixedDice {
    faces: VecDeque<u8>,
}

impl FixedDice {
    pub fn new(faces: impl IntoIterator<Item = u8>) -> Self {
        Self {
            faces: faces.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.faces.len()
    }
}

impl DiceSource for FixedDice {
    /// # Panics
    /// Panics once the script is exhausted or yields a value outside `1..=6`.
    fn roll_die(&mut self) -> u8 {
        let face = self
            .faces
            .pop_front()
            .expect("scripted dice source exhausted");
        assert!((1..=FACES).contains(&face), "scripted face {face} out of range");
        face
    }
}

/// Opening roll of a turn.
pub fn roll_hand<S: DiceSource + ?Sized>(source: &mut S) -> Hand {
    let dice = source.roll_many(DICE_PER_HAND);
    Hand::from_parts(&[], &dice)
}

/// Keeps the masked dice, draws fresh faces for the rest in order, and re-sorts.
pub fn reroll<S: DiceSource + ?Sized>(hand: &Hand, keep: KeepMask, source: &mut S) -> Hand {
    let kept = keep.kept_dice(hand);
    let fresh = source.roll_many(keep.rerolled_count());
    Hand::from_parts(&kept, &fresh)
}
