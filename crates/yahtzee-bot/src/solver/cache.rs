//! Memo table for one top-level solver query.

use std::collections::HashMap;
use yahtzee_core::model::category::CategorySet;
use yahtzee_core::model::hand::{DICE_PER_HAND, Hand};

/// Keys carry the full open-category bitset, not just its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvKey {
    hand: Hand,
    rerolls_left: u8,
    open: CategorySet,
}

impl EvKey {
    pub fn new(hand: Hand, rerolls_left: u8, open: CategorySet) -> Self {
        Self {
            hand,
            rerolls_left,
            open,
        }
    }
}

/// Held multiset (zero padded, ascending), the rerolls that remain after rolling it,
/// and the open categories it is scored against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeepKey {
    dice: [u8; DICE_PER_HAND],
    rerolls_after: u8,
    open: CategorySet,
}

impl KeepKey {
    pub fn new(kept: &[u8], rerolls_after: u8, open: CategorySet) -> Self {
        let mut dice = [0u8; DICE_PER_HAND];
        dice[..kept.len()].copy_from_slice(kept);
        Self {
            dice,
            rerolls_after,
            open,
        }
    }
}

/// Expected values valid for a single weight table. Open sets may be mixed.
#[derive(Debug, Default)]
pub struct EvCache {
    entries: HashMap<EvKey, f64>,
    keeps: HashMap<KeepKey, f64>,
    hits: u64,
    misses: u64,
}

impl EvCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, key: &EvKey) -> Option<f64> {
        match self.entries.get(key) {
            Some(&value) => {
                self.hits += 1;
                Some(value)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: EvKey, value: f64) {
        self.entries.insert(key, value);
    }

    /// Value of rerolling around a held multiset; it does not depend on the dice thrown back.
    pub fn keep_value(&mut self, key: &KeepKey) -> Option<f64> {
        let value = self.keeps.get(key).copied();
        if value.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        value
    }

    pub fn insert_keep(&mut self, key: KeepKey, value: f64) {
        self.keeps.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len() + self.keeps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.keeps.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
