use crate::model::category::{Category, CategorySet};
use crate::model::hand::Hand;
use crate::model::score::score;
use core::fmt;
use serde::{Deserialize, Serialize};

pub const UPPER_BONUS_THRESHOLD: u32 = 63;
pub const UPPER_BONUS: u32 = 35;

/// Points recorded per category for one player over a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreCard {
    entries: [Option<u32>; Category::COUNT],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreCardError {
    AlreadyRecorded(Category),
    OpenButRecorded(Category),
}

impl fmt::Display for ScoreCardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreCardError::AlreadyRecorded(category) => {
                write!(f, "{category} has already been scored")
            }
            ScoreCardError::OpenButRecorded(category) => {
                write!(f, "{category} is listed as open but carries a score")
            }
        }
    }
}

impl std::error::Error for ScoreCardError {}

impl ScoreCard {
    pub const fn new() -> Self {
        Self {
            entries: [None; Category::COUNT],
        }
    }

    pub fn record(&mut self, category: Category, points: u32) -> Result<(), ScoreCardError> {
        let slot = &mut self.entries[category.index()];
        if slot.is_some() {
            return Err(ScoreCardError::AlreadyRecorded(category));
        }
        *slot = Some(points);
        Ok(())
    }

    /// Scores `hand` into `category` and returns the points written.
    pub fn record_hand(&mut self, hand: &Hand, category: Category) -> Result<u32, ScoreCardError> {
        let points = score(hand, category);
        self.record(category, points)?;
        Ok(points)
    }

    pub fn recorded(&self, category: Category) -> Option<u32> {
        self.entries[category.index()]
    }

    pub fn is_recorded(&self, category: Category) -> bool {
        self.recorded(category).is_some()
    }

    pub fn open_categories(&self) -> CategorySet {
        Category::ALL
            .into_iter()
            .filter(|category| !self.is_recorded(*category))
            .collect()
    }

    pub fn turns_played(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.turns_played() == Category::COUNT
    }

    pub fn upper_total(&self) -> u32 {
        self.section_total(&Category::UPPER)
    }

    pub fn upper_bonus(&self) -> u32 {
        if self.upper_total() >= UPPER_BONUS_THRESHOLD {
            UPPER_BONUS
        } else {
            0
        }
    }

    pub fn lower_total(&self) -> u32 {
        self.section_total(&Category::LOWER)
    }

    pub fn total(&self) -> u32 {
        self.upper_total() + self.upper_bonus() + self.lower_total()
    }

    fn section_total(&self, section: &[Category]) -> u32 {
        section.iter().filter_map(|c| self.recorded(*c)).sum()
    }
}
