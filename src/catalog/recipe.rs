//! Crafting recipes - materials in, product out

use serde::{Deserialize, Serialize};

use crate::core::types::{BuildingId, CraftingId, ItemId};

/// One material requirement of a recipe or blueprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub item: ItemId,
    pub qty: u32,
}

impl Material {
    pub fn new(item: ItemId, qty: u32) -> Self {
        Self { item, qty }
    }
}

/// A crafting recipe. Immutable after load.
///
/// Exactly one recipe produces any given item; supply expansion relies on
/// that uniqueness to resolve an item to either a recipe or a gather task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: CraftingId,
    pub product: ItemId,
    /// Units of the product one execution yields
    pub quantity_produced: u32,
    /// Seconds one execution takes at the workshop
    pub production_time: u32,
    /// Workshop this recipe must run in (None = anywhere)
    pub required_building: Option<BuildingId>,
    pub materials: Vec<Material>,
}

impl Recipe {
    /// Batches needed to cover `qty` units of the product
    pub fn batches_for(&self, qty: u32) -> u32 {
        let per = self.quantity_produced.max(1);
        qty.div_ceil(per)
    }
}
