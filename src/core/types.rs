//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Simulation tick counter (20 ticks = 1 simulated second)
pub type Tick = u64;

/// Identifier of a catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u32);

/// Identifier of a building blueprint / instance (unique per world)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildingId(pub u32);

/// Identifier of a crafting recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CraftingId(pub u32);

/// Identifier of a resource point on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourcePointId(pub u32);

/// Index of a task node in the task graph arena
pub type TaskId = usize;

/// Index of a worker in the crew
pub type WorkerId = usize;

/// Item ids at or above this value are pseudo-items standing in for a
/// building target (`PSEUDO_ITEM_BASE + building_id`). They never appear in
/// the inventory or in shortage accounting.
pub const PSEUDO_ITEM_BASE: u32 = 10_000;

impl ItemId {
    /// Pseudo-item id for a building target
    pub fn for_building(building: BuildingId) -> Self {
        Self(PSEUDO_ITEM_BASE + building.0)
    }

    pub fn is_building_pseudo(&self) -> bool {
        self.0 >= PSEUDO_ITEM_BASE
    }
}

/// Integer grid position. All distances in the simulation are Manhattan;
/// movement is straight-line, there is no pathfinding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another position
    pub fn manhattan(&self, other: Pos) -> i32 {
        (other.x - self.x).abs() + (other.y - self.y).abs()
    }

    /// Advance toward `target` by at most `speed` Manhattan units,
    /// consuming the budget along the x axis first.
    pub fn step_toward(&mut self, target: Pos, speed: i32) {
        let mut budget = speed.max(0);
        let dx = target.x - self.x;
        let step_x = dx.clamp(-budget, budget);
        self.x += step_x;
        budget -= step_x.abs();
        let dy = target.y - self.y;
        let step_y = dy.clamp(-budget, budget);
        self.y += step_y;
    }
}
