use core::fmt;
use serde::{Deserialize, Serialize};

pub const DICE_PER_HAND: usize = 5;
pub const FACES: u8 = 6;

/// Five dice kept in ascending order so equal multisets compare and hash equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "[u8; 5]")]
pub struct Hand {
    dice: [u8; DICE_PER_HAND],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandError {
    InvalidFace { position: usize, value: u8 },
    WrongLength { found: usize },
}

impl fmt::Display for HandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandError::InvalidFace { position, value } => {
                write!(f, "die {position} has face {value}, expected 1..=6")
            }
            HandError::WrongLength { found } => {
                write!(f, "a hand holds {DICE_PER_HAND} dice but {found} were given")
            }
        }
    }
}

impl std::error::Error for HandError {}

impl Hand {
    pub fn new(dice: [u8; DICE_PER_HAND]) -> Result<Self, HandError> {
        for (position, &value) in dice.iter().enumerate() {
            if !is_face(value) {
                return Err(HandError::InvalidFace { position, value });
            }
        }
        let mut dice = dice;
        dice.sort_unstable();
        Ok(Self { dice })
    }

    pub fn from_slice(dice: &[u8]) -> Result<Self, HandError> {
        let array: [u8; DICE_PER_HAND] = dice
            .try_into()
            .map_err(|_| HandError::WrongLength { found: dice.len() })?;
        Self::new(array)
    }

    /// Joins held dice with freshly rolled ones. Both slices are assumed valid faces.
    pub fn from_parts(held: &[u8], rolled: &[u8]) -> Self {
        debug_assert_eq!(held.len() + rolled.len(), DICE_PER_HAND);
        let mut dice = [0u8; DICE_PER_HAND];
        for (slot, &value) in dice.iter_mut().zip(held.iter().chain(rolled.iter())) {
            debug_assert!(is_face(value));
            *slot = value;
        }
        dice.sort_unstable();
        Self { dice }
    }

    pub fn dice(&self) -> &[u8; DICE_PER_HAND] {
        &self.dice
    }

    pub fn die(&self, position: usize) -> Option<u8> {
        self.dice.get(position).copied()
    }

    pub fn sum(&self) -> u32 {
        self.dice.iter().map(|&d| d as u32).sum()
    }

    /// Occurrences per face; index 0 is unused.
    pub fn face_counts(&self) -> [u8; 7] {
        let mut counts = [0u8; 7];
        for &d in &self.dice {
            counts[d as usize] += 1;
        }
        counts
    }

    pub fn count(&self, face: u8) -> u8 {
        self.dice.iter().filter(|&&d| d == face).count() as u8
    }

    pub fn max_of_a_kind(&self) -> u8 {
        self.face_counts().iter().copied().max().unwrap_or(0)
    }

    pub fn contains_face(&self, face: u8) -> bool {
        self.dice.contains(&face)
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.dice.iter().copied()
    }
}

const fn is_face(value: u8) -> bool {
    value >= 1 && value <= FACES
}

impl From<Hand> for [u8; DICE_PER_HAND] {
    fn from(hand: Hand) -> Self {
        hand.dice
    }
}

impl TryFrom<[u8; DICE_PER_HAND]> for Hand {
    type Error = HandError;

    fn try_from(dice: [u8; DICE_PER_HAND]) -> Result<Self, Self::Error> {
        Hand::new(dice)
    }
}

impl<'de> Deserialize<'de> for Hand {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let dice = <[u8; DICE_PER_HAND]>::deserialize(deserializer)?;
        Hand::new(dice).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e] = self.dice;
        write!(f, "[{a} {b} {c} {d} {e}]")
    }
}
