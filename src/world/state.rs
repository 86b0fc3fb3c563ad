//! Mutable world state: resource points, building instances, inventory
//!
//! A single instance is passed explicitly through constructors; the
//! simulator borrows it mutably for the duration of a tick. Only the
//! harvest/craft/build completion paths mutate it.

use ahash::AHashMap;

use crate::core::types::{BuildingId, ItemId, Pos, ResourcePointId};
use crate::world::building::BuildingSite;
use crate::world::inventory::Inventory;
use crate::world::resource_point::ResourcePoint;

#[derive(Debug, Clone, Default)]
pub struct WorldState {
    pub inventory: Inventory,
    buildings: AHashMap<BuildingId, BuildingSite>,
    resource_points: AHashMap<ResourcePointId, ResourcePoint>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_building(&mut self, site: BuildingSite) {
        self.buildings.insert(site.id, site);
    }

    pub fn add_resource_point(&mut self, rp: ResourcePoint) {
        self.resource_points.insert(rp.id, rp);
    }

    pub fn building(&self, id: BuildingId) -> Option<&BuildingSite> {
        self.buildings.get(&id)
    }

    pub fn building_mut(&mut self, id: BuildingId) -> Option<&mut BuildingSite> {
        self.buildings.get_mut(&id)
    }

    pub fn buildings(&self) -> impl Iterator<Item = &BuildingSite> {
        self.buildings.values()
    }

    pub fn resource_point(&self, id: ResourcePointId) -> Option<&ResourcePoint> {
        self.resource_points.get(&id)
    }

    pub fn resource_point_mut(&mut self, id: ResourcePointId) -> Option<&mut ResourcePoint> {
        self.resource_points.get_mut(&id)
    }

    pub fn resource_points(&self) -> impl Iterator<Item = &ResourcePoint> {
        self.resource_points.values()
    }

    /// Nearest non-depleted resource point holding `item`, with its
    /// Manhattan distance from `from`. Ties break on the lower point id so
    /// the choice is deterministic.
    pub fn nearest_resource_point(&self, item: ItemId, from: Pos) -> Option<(ResourcePointId, i32)> {
        self.resource_points
            .values()
            .filter(|rp| rp.item == item && !rp.is_depleted())
            .map(|rp| (rp.id, from.manhattan(rp.pos)))
            .min_by_key(|&(id, dist)| (dist, id))
    }

    /// Whether any point for `item` still has units left
    pub fn has_resource_for(&self, item: ItemId) -> bool {
        self.resource_points
            .values()
            .any(|rp| rp.item == item && !rp.is_depleted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rp(id: u32, item: u32, x: i32, y: i32, remaining: u32) -> ResourcePoint {
        ResourcePoint::new(
            ResourcePointId(id),
            ItemId(item),
            Pos::new(x, y),
            remaining,
        )
    }

    #[test]
    fn test_nearest_resource_point_skips_depleted() {
        let mut world = WorldState::new();
        world.add_resource_point(rp(1, 1, 5, 0, 0));
        world.add_resource_point(rp(2, 1, 20, 0, 10));
        world.add_resource_point(rp(3, 2, 1, 0, 10));

        let (id, dist) = world
            .nearest_resource_point(ItemId(1), Pos::new(0, 0))
            .unwrap();
        assert_eq!(id, ResourcePointId(2));
        assert_eq!(dist, 20);
    }

    #[test]
    fn test_nearest_resource_point_tie_breaks_on_id() {
        let mut world = WorldState::new();
        world.add_resource_point(rp(7, 1, 10, 0, 5));
        world.add_resource_point(rp(3, 1, 0, 10, 5));

        let (id, _) = world
            .nearest_resource_point(ItemId(1), Pos::new(0, 0))
            .unwrap();
        assert_eq!(id, ResourcePointId(3));
    }

    #[test]
    fn test_nearest_resource_point_none_for_missing_item() {
        let world = WorldState::new();
        assert!(world
            .nearest_resource_point(ItemId(9), Pos::new(0, 0))
            .is_none());
        assert!(!world.has_resource_for(ItemId(9)));
    }
}
