//! Item definitions - the vocabulary of the production world

use serde::{Deserialize, Serialize};

use crate::core::types::{BuildingId, ItemId};

/// A catalog item. Immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Raw resources are harvestable from resource points; everything else
    /// must be crafted.
    pub is_resource: bool,
    /// Building needed to hold or use this item, if any
    pub required_building: Option<BuildingId>,
}

impl Item {
    pub fn resource(id: ItemId, name: &str) -> Self {
        Self {
            id,
            name: name.into(),
            is_resource: true,
            required_building: None,
        }
    }

    pub fn crafted(id: ItemId, name: &str) -> Self {
        Self {
            id,
            name: name.into(),
            is_resource: false,
            required_building: None,
        }
    }
}
