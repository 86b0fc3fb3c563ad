//! Global inventory - the single shared item store
//!
//! There is no per-worker carry: harvests, craft outputs and craft/build
//! consumption all go through this one map. Allocation bookkeeping lives in
//! the task graph, never here.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::catalog::recipe::Material;
use crate::core::types::ItemId;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    items: AHashMap<ItemId, u32>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, item: ItemId) -> u32 {
        self.items.get(&item).copied().unwrap_or(0)
    }

    pub fn add(&mut self, item: ItemId, amount: u32) {
        if amount > 0 {
            *self.items.entry(item).or_insert(0) += amount;
        }
    }

    /// Try to remove `amount` units, returns the amount actually removed
    pub fn remove(&mut self, item: ItemId, amount: u32) -> u32 {
        match self.items.get_mut(&item) {
            Some(have) => {
                let removed = amount.min(*have);
                *have -= removed;
                removed
            }
            None => 0,
        }
    }

    /// Check if every listed material is covered
    pub fn has_materials(&self, requirements: &[Material]) -> bool {
        requirements.iter().all(|m| self.get(m.item) >= m.qty)
    }

    /// Consume all listed materials atomically, returns false (and leaves
    /// the inventory untouched) if any is short
    pub fn consume_materials(&mut self, requirements: &[Material]) -> bool {
        if !self.has_materials(requirements) {
            return false;
        }
        for m in requirements {
            self.remove(m.item, m.qty);
        }
        true
    }

    /// Copy of the current quantities, used by the scheduler as a
    /// pre-reservation ledger. The scheduler never mutates the live store.
    pub fn snapshot(&self) -> AHashMap<ItemId, i64> {
        self.items.iter().map(|(&k, &v)| (k, v as i64)).collect()
    }
}
