use crate::model::category::{Category, CategorySet};
use crate::model::scorecard::{ScoreCard, ScoreCardError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Human-readable view of a scorecard: recorded points by category name plus totals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreCardSnapshot {
    pub recorded: BTreeMap<Category, u32>,
    pub open: CategorySet,
    pub upper_total: u32,
    pub upper_bonus: u32,
    pub lower_total: u32,
    pub total: u32,
}

impl ScoreCardSnapshot {
    pub fn capture(card: &ScoreCard) -> Self {
        let recorded = Category::ALL
            .into_iter()
            .filter_map(|category| card.recorded(category).map(|points| (category, points)))
            .collect();
        ScoreCardSnapshot {
            recorded,
            open: card.open_categories(),
            upper_total: card.upper_total(),
            upper_bonus: card.upper_bonus(),
            lower_total: card.lower_total(),
            total: card.total(),
        }
    }

    /// Rebuilds the card from recorded entries; totals are recomputed, not trusted.
    pub fn restore(&self) -> Result<ScoreCard, ScoreCardError> {
        let mut card = ScoreCard::new();
        for (&category, &points) in &self.recorded {
            card.record(category, points)?;
        }
        if let Some(category) = self.open.iter().find(|&category| card.is_recorded(category)) {
            return Err(ScoreCardError::OpenButRecorded(category));
        }
        Ok(card)
    }

    pub fn to_json(card: &ScoreCard) -> serde_json::Result<String> {
        let snapshot = Self::capture(card);
        serde_json::to_string_pretty(&snapshot)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
