use crate::dice::source::{DiceSource, reroll, roll_hand};
use crate::model::category::Category;
use crate::model::hand::{DICE_PER_HAND, Hand};
use crate::model::keep::KeepMask;
use crate::model::scorecard::{ScoreCard, ScoreCardError};
use core::fmt;

/// Rerolls available after the mandatory opening roll.
pub const MAX_REROLLS: u8 = 2;

/// Hand, held dice and remaining rerolls for the turn in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnState {
    hand: Hand,
    held: KeepMask,
    rerolls_left: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnError {
    NoRerollsLeft,
    InvalidPosition(usize),
    Score(ScoreCardError),
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::NoRerollsLeft => write!(f, "no rerolls left this turn"),
            TurnError::InvalidPosition(position) => {
                write!(f, "die position {position} is outside the hand")
            }
            TurnError::Score(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for TurnError {}

impl From<ScoreCardError> for TurnError {
    fn from(err: ScoreCardError) -> Self {
        TurnError::Score(err)
    }
}

impl TurnState {
    /// Rolls the opening hand.
    pub fn open<S: DiceSource + ?Sized>(source: &mut S) -> Self {
        Self::from_hand(roll_hand(source))
    }

    pub fn from_hand(hand: Hand) -> Self {
        Self::with_rerolls(hand, MAX_REROLLS)
    }

    pub fn with_rerolls(hand: Hand, rerolls_left: u8) -> Self {
        Self {
            hand,
            held: KeepMask::NONE,
            rerolls_left: rerolls_left.min(MAX_REROLLS),
        }
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn held(&self) -> KeepMask {
        self.held
    }

    pub fn rerolls_left(&self) -> u8 {
        self.rerolls_left
    }

    pub fn can_reroll(&self) -> bool {
        self.rerolls_left > 0
    }

    pub fn toggle_hold(&mut self, position: usize) -> Result<(), TurnError> {
        if position >= DICE_PER_HAND {
            return Err(TurnError::InvalidPosition(position));
        }
        self.held.toggle(position);
        Ok(())
    }

    pub fn set_held(&mut self, held: KeepMask) {
        self.held = held;
    }

    /// Rerolls every unheld die. Holds are cleared because sorting reassigns positions.
    pub fn reroll<S: DiceSource + ?Sized>(&mut self, source: &mut S) -> Result<&Hand, TurnError> {
        if self.rerolls_left == 0 {
            return Err(TurnError::NoRerollsLeft);
        }
        self.hand = reroll(&self.hand, self.held, source);
        self.rerolls_left -= 1;
        self.held = KeepMask::NONE;
        Ok(&self.hand)
    }

    /// Writes the current hand into `category` on `card`.
    pub fn commit(&self, card: &mut ScoreCard, category: Category) -> Result<u32, TurnError> {
        Ok(card.record_hand(&self.hand, category)?)
    }
}
