//! Certainty store: accumulated CF per (context, parameter, value).
//!
//! Evidence is only ever combined in with [`cf_or`]; nothing is overwritten
//! or removed during a run.

use std::collections::HashMap;

use crate::cf::{self, cf_or};
use crate::domain::{Slot, Value};

/// Accumulates certainty factors for every value a slot may hold.
#[derive(Debug, Clone, Default)]
pub struct CertaintyStore {
    entries: HashMap<Slot, HashMap<Value, f64>>,
}

impl CertaintyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded `(value, cf)` pairs of a slot, in no particular order.
    pub fn get(&self, slot: Slot) -> impl Iterator<Item = (&Value, f64)> + '_ {
        self.entries
            .get(&slot)
            .into_iter()
            .flat_map(|values| values.iter().map(|(v, cf)| (v, *cf)))
    }

    /// CF currently recorded for one value, [`cf::UNKNOWN`] if none.
    pub fn cf_of(&self, slot: Slot, value: &Value) -> f64 {
        self.entries
            .get(&slot)
            .and_then(|values| values.get(value))
            .copied()
            .unwrap_or(cf::UNKNOWN)
    }

    /// Combine `cf` into the value's existing evidence. Returns the new CF.
    pub fn update(&mut self, slot: Slot, value: Value, cf: f64) -> f64 {
        let entry = self
            .entries
            .entry(slot)
            .or_default()
            .entry(value)
            .or_insert(cf::UNKNOWN);
        *entry = cf_or(*entry, cf);
        *entry
    }

    /// Recorded pairs sorted by descending CF (ties by value text).
    pub fn ranked(&self, slot: Slot) -> Vec<(Value, f64)> {
        let mut pairs: Vec<(Value, f64)> = self.get(slot).map(|(v, cf)| (v.clone(), cf)).collect();
        pairs.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| a.0.to_string().cmp(&b.0.to_string()))
        });
        pairs
    }

    /// Number of slots with recorded evidence.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
