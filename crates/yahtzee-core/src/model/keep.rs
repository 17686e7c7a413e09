use crate::model::hand::{DICE_PER_HAND, Hand};
use core::fmt;
use serde::{Deserialize, Serialize};

/// Selector over hand positions; bit `i` set means die `i` is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeepMask(u8);

impl KeepMask {
    pub const COUNT: u8 = 1 << DICE_PER_HAND;
    pub const NONE: KeepMask = KeepMask(0);
    pub const ALL: KeepMask = KeepMask(Self::COUNT - 1);

    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits < Self::COUNT {
            Some(Self(bits))
        } else {
            None
        }
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Every mask in increasing numeric order, starting with "reroll everything".
    pub fn iter_all() -> impl Iterator<Item = KeepMask> {
        (0..Self::COUNT).map(KeepMask)
    }

    pub const fn keeps(self, position: usize) -> bool {
        position < DICE_PER_HAND && (self.0 >> position) & 1 == 1
    }

    pub const fn kept_count(self) -> usize {
        self.0.count_ones() as usize
    }

    pub const fn rerolled_count(self) -> usize {
        DICE_PER_HAND - self.kept_count()
    }

    pub const fn keeps_all(self) -> bool {
        self.0 == Self::ALL.0
    }

    pub fn toggle(&mut self, position: usize) {
        if position < DICE_PER_HAND {
            self.0 ^= 1 << position;
        }
    }

    /// Held dice in ascending order.
    pub fn kept_dice(self, hand: &Hand) -> Vec<u8> {
        hand.iter()
            .enumerate()
            .filter(|(position, _)| self.keeps(*position))
            .map(|(_, value)| value)
            .collect()
    }
}

impl fmt::Display for KeepMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for position in 0..DICE_PER_HAND {
            f.write_str(if self.keeps(position) { "K" } else { "." })?;
        }
        Ok(())
    }
}
