//! Task scoring - a pure function of node, worker, world and shortage
//!
//! Construction dominates crafting dominates gathering; distance pulls a
//! score down and the live shortage pushes gathers and needed crafts up.
//! The same function drives bidding, bundle ordering, trading, and gather
//! interruption, so every decision ranks tasks consistently.

use crate::catalog::Catalog;
use crate::graph::{TaskKind, TaskNode};
use crate::scheduler::{shortage_of, Shortage};
use crate::sim::worker::Worker;
use crate::world::state::WorldState;

/// Base value of a Build task
pub const BUILD_VALUE: f64 = 1e6;
/// Base value of a Craft task
pub const CRAFT_VALUE: f64 = 1e4;
/// Added per missing unit of a craft's product
pub const CRAFT_SHORTAGE_WEIGHT: f64 = 100.0;
/// Value per missing unit of a gatherable item
pub const GATHER_SHORTAGE_WEIGHT: f64 = 50.0;
/// Score lost per Manhattan unit of travel
pub const DISTANCE_WEIGHT: f64 = 10.0;
/// Stand-in distance when no resource point holds the item
pub const NO_RESOURCE_DISTANCE: i32 = 10_000;
/// Score lost per task already promised to the worker
pub const BUNDLE_PENALTY: f64 = 50.0;
/// Score gained per batch a task still has open
pub const BATCH_BONUS: f64 = 20.0;

/// Base score of `node` for `worker`: value minus weighted distance.
/// Bundle penalty and open-batch bonus are bidding concerns and are added
/// by the auction on top of this.
pub fn score_task(
    node: &TaskNode,
    worker: &Worker,
    world: &WorldState,
    catalog: &Catalog,
    shortage: &Shortage,
) -> f64 {
    let (value, dist) = match node.kind {
        TaskKind::Build { site, .. } => (BUILD_VALUE * node.weight, worker.distance_to(site)),
        TaskKind::Craft { recipe, item } => {
            let value =
                (CRAFT_VALUE + CRAFT_SHORTAGE_WEIGHT * shortage_of(shortage, item) as f64)
                    * node.weight;
            let dist = catalog
                .recipe(recipe)
                .and_then(|r| r.required_building)
                .and_then(|b| world.building(b))
                .map_or(0, |b| worker.distance_to(b.pos));
            (value, dist)
        }
        TaskKind::Gather { item } => {
            let value = GATHER_SHORTAGE_WEIGHT * shortage_of(shortage, item) as f64;
            let dist = world
                .nearest_resource_point(item, worker.pos)
                .map_or(NO_RESOURCE_DISTANCE, |(_, d)| d);
            (value, dist)
        }
    };
    value - DISTANCE_WEIGHT * dist as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::blueprint::Blueprint;
    use crate::catalog::item::Item;
    use crate::catalog::recipe::{Material, Recipe};
    use crate::core::config::SimConfig;
    use crate::core::types::{BuildingId, CraftingId, ItemId, Pos, ResourcePointId};
    use crate::graph::TaskNode;
    use crate::world::building::BuildingSite;
    use crate::world::resource_point::ResourcePoint;

    fn worker_at(x: i32, y: i32) -> Worker {
        let mut w = Worker::default_crew(1, Pos::new(x, y), &SimConfig::default())
            .pop()
            .unwrap();
        w.speed = 9;
        w
    }

    #[test]
    fn test_build_score_dominates() {
        let world = WorldState::new();
        let catalog = Catalog::new();
        let node = TaskNode::new(
            TaskKind::Build {
                building: BuildingId(1),
                site: Pos::new(10, 0),
            },
            1,
        );
        let score = score_task(&node, &worker_at(0, 0), &world, &catalog, &Shortage::new());
        assert!((score - (1e6 - 100.0)).abs() < 1e-9);
    }

    #[test]
    fn test_gather_score_scales_with_shortage_and_distance() {
        let mut world = WorldState::new();
        world.add_resource_point(ResourcePoint::new(
            ResourcePointId(1),
            ItemId(1),
            Pos::new(4, 0),
            100,
        ));
        let catalog = Catalog::new();
        let node = TaskNode::new(TaskKind::Gather { item: ItemId(1) }, 30);

        let mut shortage = Shortage::new();
        shortage.insert(ItemId(1), 6);
        let score = score_task(&node, &worker_at(0, 0), &world, &catalog, &shortage);
        assert!((score - (6.0 * 50.0 - 4.0 * 10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_gather_without_resource_points_scores_far() {
        let world = WorldState::new();
        let catalog = Catalog::new();
        let node = TaskNode::new(TaskKind::Gather { item: ItemId(1) }, 10);
        let mut shortage = Shortage::new();
        shortage.insert(ItemId(1), 1);
        let score = score_task(&node, &worker_at(0, 0), &world, &catalog, &shortage);
        assert!((score - (50.0 - 10.0 * 10_000.0)).abs() < 1e-9);
    }

    #[test]
    fn test_craft_distance_uses_required_workshop() {
        let mut catalog = Catalog::new();
        catalog.add_item(Item::resource(ItemId(1), "Log"));
        catalog.add_item(Item::crafted(ItemId(5), "Plank"));
        catalog.add_blueprint(Blueprint {
            id: BuildingId(1),
            name: "Workshop".into(),
            construction_time: 1,
            materials: vec![],
        });
        catalog.add_recipe(Recipe {
            id: CraftingId(1),
            product: ItemId(5),
            quantity_produced: 1,
            production_time: 1,
            required_building: Some(BuildingId(1)),
            materials: vec![Material::new(ItemId(1), 2)],
        });
        let mut world = WorldState::new();
        let mut site = BuildingSite::from_blueprint(
            catalog.blueprint(BuildingId(1)).unwrap(),
            Pos::new(0, 25),
        );
        site.completed = true;
        world.add_building(site);

        let node = TaskNode::new(
            TaskKind::Craft {
                recipe: CraftingId(1),
                item: ItemId(5),
            },
            1,
        );
        let score = score_task(&node, &worker_at(0, 0), &world, &catalog, &Shortage::new());
        assert!((score - (1e4 - 250.0)).abs() < 1e-9);
    }

    #[test]
    fn test_weight_rescales_build_value() {
        let world = WorldState::new();
        let catalog = Catalog::new();
        let mut node = TaskNode::new(
            TaskKind::Build {
                building: BuildingId(1),
                site: Pos::new(0, 0),
            },
            1,
        );
        node.weight = 1.5;
        let score = score_task(&node, &worker_at(0, 0), &world, &catalog, &Shortage::new());
        assert!((score - 1.5e6).abs() < 1e-9);
    }
}
