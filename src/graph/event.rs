//! Events flowing from task completion back into the graph and world
//!
//! Completion paths never hold references across components; they emit one
//! of these plain values and the graph applies it.

use crate::core::types::{BuildingId, ItemId, Pos};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldEvent {
    /// A construction finished at a site
    ConstructionFinished { building: BuildingId, site: Pos },
    /// Items entered the global inventory
    ItemProduced { item: ItemId, quantity: u32 },
}
