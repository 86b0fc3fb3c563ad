//! Resource points - finite harvestable deposits on the map

use serde::{Deserialize, Serialize};

use crate::core::types::{ItemId, Pos, ResourcePointId};

/// A deposit of one raw resource. Depletes as it is harvested and never
/// regenerates; at most one worker may harvest it per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcePoint {
    pub id: ResourcePointId,
    pub item: ItemId,
    pub pos: Pos,
    pub remaining: u32,
}

impl ResourcePoint {
    pub fn new(id: ResourcePointId, item: ItemId, pos: Pos, remaining: u32) -> Self {
        Self {
            id,
            item,
            pos,
            remaining,
        }
    }

    /// Take up to `amount` units, returns the amount actually taken
    pub fn harvest(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.remaining);
        self.remaining -= taken;
        taken
    }

    pub fn is_depleted(&self) -> bool {
        self.remaining == 0
    }
}
