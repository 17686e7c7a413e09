//! Per-category reference thresholds that turn raw points into decision utility.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use yahtzee_core::model::category::{Category, CategorySet};
use yahtzee_core::model::scorecard::{ScoreCard, UPPER_BONUS_THRESHOLD};

const RELAXED_UPPER: f64 = 1.0;
const BONUS_PRESSURE_AVERAGE: f64 = 3.0;
const BONUS_PRESSURE_SCALE: f64 = 2.0;
const EARLY_GAME_OPEN: usize = 7;
const LATE_GAME_OPEN: usize = 4;
const EARLY_CHANCE: f64 = 26.0;
const LATE_CHANCE: f64 = 15.0;
const YAHTZEE_PAR: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightTable {
    thresholds: [f64; Category::COUNT],
}

impl WeightTable {
    /// Par scores used by the standard bot.
    pub const STATIC: WeightTable = WeightTable {
        thresholds: [
            2.0,  // Ones
            5.0,  // Twos
            8.0,  // Threes
            11.0, // Fours
            14.0, // Fives
            17.0, // Sixes
            21.0, // ThreeOfAKind
            16.0, // FourOfAKind
            22.0, // FullHouse
            27.0, // SmallStraight
            35.0, // LargeStraight
            50.0, // Yahtzee
            22.0, // Chance
        ],
    };

    pub const fn new(thresholds: [f64; Category::COUNT]) -> Self {
        Self { thresholds }
    }

    pub const fn get(&self, category: Category) -> f64 {
        self.thresholds[category.index()]
    }

    pub fn set(&mut self, category: Category, threshold: f64) {
        self.thresholds[category.index()] = threshold;
    }

    pub fn thresholds(&self) -> &[f64; Category::COUNT] {
        &self.thresholds
    }

    /// Static table re-tuned for upper-bonus progress and the number of open categories.
    pub fn dynamic(card: &ScoreCard, open: CategorySet) -> Self {
        let mut weights = Self::STATIC;

        let upper_score: u32 = Category::UPPER
            .iter()
            .filter_map(|category| card.recorded(*category))
            .sum();
        let slots_left = Category::UPPER
            .iter()
            .filter(|category| !card.is_recorded(**category))
            .count();
        let deficit = f64::from(UPPER_BONUS_THRESHOLD) - f64::from(upper_score);

        if slots_left > 0 {
            let open_upper = Category::UPPER.into_iter().filter(|c| open.contains(*c));
            if deficit <= 0.0 {
                for category in open_upper {
                    weights.set(category, RELAXED_UPPER);
                }
            } else {
                let average_needed = deficit / slots_left as f64;
                if average_needed > BONUS_PRESSURE_AVERAGE {
                    for category in open_upper {
                        let inflated =
                            weights.get(category) + average_needed * BONUS_PRESSURE_SCALE;
                        weights.set(category, inflated);
                    }
                }
            }
        }

        if open.len() > EARLY_GAME_OPEN {
            weights.set(Category::Chance, EARLY_CHANCE);
        } else if open.len() < LATE_GAME_OPEN {
            weights.set(Category::Chance, LATE_CHANCE);
        }

        weights.set(Category::Yahtzee, YAHTZEE_PAR);
        weights
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::STATIC
    }
}

/// Playing strength: which weighting function feeds the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    #[default]
    #[serde(alias = "normal", alias = "static")]
    Standard,
    #[serde(alias = "hard", alias = "dynamic")]
    Pro,
}

impl Strength {
    pub fn weights(self, card: &ScoreCard, open: CategorySet) -> WeightTable {
        match self {
            Strength::Standard => WeightTable::STATIC,
            Strength::Pro => WeightTable::dynamic(card, open),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Strength::Standard => "standard",
            Strength::Pro => "pro",
        }
    }

    pub fn from_env() -> Self {
        static CACHED: OnceLock<Strength> = OnceLock::new();
        *CACHED.get_or_init(|| Self::from_reader(|key| std::env::var(key).ok()))
    }

    fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        read("YZP_BOT_STRENGTH")
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStrength(pub String);

impl fmt::Display for UnknownStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown strength '{}'", self.0)
    }
}

impl std::error::Error for UnknownStrength {}

impl FromStr for Strength {
    type Err = UnknownStrength;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" | "normal" | "default" | "static" => Ok(Strength::Standard),
            "pro" | "hard" | "dynamic" => Ok(Strength::Pro),
            _ => Err(UnknownStrength(value.to_string())),
        }
    }
}
