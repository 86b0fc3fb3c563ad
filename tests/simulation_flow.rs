//! End-to-end simulation scenarios
//!
//! Each test wires a small catalog and world, runs the tick loop, and
//! checks the final accounting: buildings stand, demand is met, inventory
//! never leaks, and the system degrades gracefully when supply runs out.

use ember_colony::catalog::blueprint::Blueprint;
use ember_colony::catalog::item::Item;
use ember_colony::catalog::recipe::{Material, Recipe};
use ember_colony::catalog::{Catalog, PriorityWeights};
use ember_colony::core::config::SimConfig;
use ember_colony::core::types::{BuildingId, CraftingId, ItemId, Pos, ResourcePointId};
use ember_colony::graph::TaskGraph;
use ember_colony::sim::{Simulator, Worker, WorkerSpec};
use ember_colony::world::building::BuildingSite;
use ember_colony::world::resource_point::ResourcePoint;
use ember_colony::world::state::WorldState;

fn worker_at(x: i32, y: i32, speed: i32) -> Worker {
    Worker::from_spec(&WorkerSpec {
        name: "W".into(),
        role: "Worker".into(),
        x,
        y,
        speed,
        energy: 100,
    })
}

fn run_ticks(
    sim: &mut Simulator,
    catalog: &Catalog,
    world: &mut WorldState,
    graph: &mut TaskGraph,
    workers: &mut [Worker],
    ticks: u64,
) {
    for t in 0..ticks {
        sim.tick(catalog, world, graph, workers, t);
        graph.check_invariants().expect("invariants hold each tick");
        if graph.len() > 0 && graph.all_builds_complete() {
            break;
        }
    }
}

/// Single building, two raw materials, one worker: gather both, walk to
/// the site, build. Every node ends fully delivered.
#[test]
fn test_single_worker_builds_from_raw_materials() {
    let mut catalog = Catalog::new();
    catalog.add_item(Item::resource(ItemId(1), "Log"));
    catalog.add_item(Item::resource(ItemId(2), "Stone"));
    catalog.add_blueprint(Blueprint {
        id: BuildingId(1),
        name: "Hut".into(),
        construction_time: 0,
        materials: vec![Material::new(ItemId(1), 2), Material::new(ItemId(2), 3)],
    });

    let mut world = WorldState::new();
    world.add_building(BuildingSite::from_blueprint(
        catalog.blueprint(BuildingId(1)).unwrap(),
        Pos::new(1, 1),
    ));
    world.add_resource_point(ResourcePoint::new(
        ResourcePointId(1),
        ItemId(1),
        Pos::new(10, 0),
        1000,
    ));
    world.add_resource_point(ResourcePoint::new(
        ResourcePointId(2),
        ItemId(2),
        Pos::new(0, 10),
        1000,
    ));

    let mut graph = TaskGraph::build(&catalog, &world, &PriorityWeights::default()).unwrap();
    let mut workers = vec![worker_at(0, 0, 5)];
    let mut sim = Simulator::new(SimConfig::default());

    run_ticks(&mut sim, &catalog, &mut world, &mut graph, &mut workers, 2000);

    assert!(world.building(BuildingId(1)).unwrap().completed);
    for node in graph.nodes() {
        assert_eq!(
            node.produced, node.demand,
            "node {} should be fully delivered",
            node.id
        );
    }
    // Exactly the demanded units were harvested, batches capped by need
    assert_eq!(world.resource_point(ResourcePointId(1)).unwrap().remaining, 998);
    assert_eq!(world.resource_point(ResourcePointId(2)).unwrap().remaining, 997);
    // The build consumed everything that was gathered
    assert_eq!(world.inventory.get(ItemId(1)), 0);
    assert_eq!(world.inventory.get(ItemId(2)), 0);
}

/// Two buildings fed from one contended resource point: workers take
/// turns on the point, both buildings complete, and the point never
/// gives out more than one batch per tick.
#[test]
fn test_contended_resource_point() {
    let mut catalog = Catalog::new();
    catalog.add_item(Item::resource(ItemId(1), "Log"));
    catalog.add_blueprint(Blueprint {
        id: BuildingId(1),
        name: "HutA".into(),
        construction_time: 0,
        materials: vec![Material::new(ItemId(1), 5)],
    });
    catalog.add_blueprint(Blueprint {
        id: BuildingId(2),
        name: "HutB".into(),
        construction_time: 0,
        materials: vec![Material::new(ItemId(1), 5)],
    });

    let mut world = WorldState::new();
    world.add_building(BuildingSite::from_blueprint(
        catalog.blueprint(BuildingId(1)).unwrap(),
        Pos::new(8, 0),
    ));
    world.add_building(BuildingSite::from_blueprint(
        catalog.blueprint(BuildingId(2)).unwrap(),
        Pos::new(0, 8),
    ));
    world.add_resource_point(ResourcePoint::new(
        ResourcePointId(1),
        ItemId(1),
        Pos::new(0, 0),
        100,
    ));

    let mut graph = TaskGraph::build(&catalog, &world, &PriorityWeights::default()).unwrap();
    let mut workers = vec![worker_at(0, 0, 5), worker_at(0, 0, 5)];
    let mut sim = Simulator::new(SimConfig::default());

    let mut last_remaining = 100;
    for t in 0..4000 {
        sim.tick(&catalog, &mut world, &mut graph, &mut workers, t);
        let remaining = world.resource_point(ResourcePointId(1)).unwrap().remaining;
        assert!(
            last_remaining - remaining <= 5,
            "at most one worker harvests the point per tick"
        );
        last_remaining = remaining;
        if graph.all_builds_complete() {
            break;
        }
    }

    assert!(world.building(BuildingId(1)).unwrap().completed);
    assert!(world.building(BuildingId(2)).unwrap().completed);
    assert_eq!(
        world.resource_point(ResourcePointId(1)).unwrap().remaining,
        90,
        "exactly the demanded ten units were taken"
    );
}

/// Two gatherers in flight on the same demand: the first delivery covers
/// the shortage, and the second worker is released mid-travel without
/// harvesting anything beyond the in-flight batch.
#[test]
fn test_gather_released_when_shortage_fills() {
    let mut catalog = Catalog::new();
    catalog.add_item(Item::resource(ItemId(1), "Log"));

    let mut world = WorldState::new();
    world.add_resource_point(ResourcePoint::new(
        ResourcePointId(1),
        ItemId(1),
        Pos::new(600, 0),
        1000,
    ));

    // Bare gather demand of 20: two batches of ten
    let mut graph = TaskGraph::new();
    graph.add_node(ember_colony::graph::TaskNode::new(
        ember_colony::graph::TaskKind::Gather { item: ItemId(1) },
        20,
    ));

    // Worker 0 wins the first replan and is still traveling at the
    // second, so worker 1 is sent after the remaining batch
    let mut workers = vec![worker_at(0, 0, 5), worker_at(-500, 0, 5)];
    let mut sim = Simulator::new(SimConfig::default());

    for t in 0..600 {
        sim.tick(&catalog, &mut world, &mut graph, &mut workers, t);
        graph.check_invariants().expect("invariants hold each tick");
    }

    // Worker 0 delivered ten; the raw need of the rest is covered by the
    // shared inventory, so worker 1 was released without harvesting
    assert_eq!(world.inventory.get(ItemId(1)), 10);
    assert_eq!(graph.get(0).produced, 10);
    assert_eq!(
        world.resource_point(ResourcePointId(1)).unwrap().remaining,
        990
    );
    assert!(workers.iter().all(|w| w.is_idle()));
    assert_eq!(graph.get(0).allocated, 0, "stale allocations were released");
}

/// Two workers standing on one resource point: only the first claimant
/// harvests; the other's countdown never even starts while the point is
/// held.
#[test]
fn test_resource_point_mutual_exclusion() {
    let mut catalog = Catalog::new();
    catalog.add_item(Item::resource(ItemId(1), "Log"));

    let mut world = WorldState::new();
    world.add_resource_point(ResourcePoint::new(
        ResourcePointId(1),
        ItemId(1),
        Pos::new(0, 0),
        1000,
    ));

    let mut graph = TaskGraph::new();
    graph.add_node(ember_colony::graph::TaskNode::new(
        ember_colony::graph::TaskKind::Gather { item: ItemId(1) },
        40,
    ));

    let mut workers = vec![worker_at(0, 0, 5), worker_at(0, 0, 5)];
    workers[0].start_task(0, 10);
    workers[1].start_task(0, 10);

    let mut sim = Simulator::new(SimConfig::default());
    // Ticks 1..=40 avoid the replan boundary; both workers contend on the
    // point directly
    for t in 1..=40 {
        sim.tick(&catalog, &mut world, &mut graph, &mut workers, t);
        if workers[0].current_task.is_some() {
            assert_eq!(
                workers[1].ticks_left, 0,
                "the waiting worker never starts its countdown"
            );
        }
    }

    // Worker 0 harvested two batches; the shared inventory then covered
    // the remaining raw need and both workers let go
    assert_eq!(graph.get(0).produced, 20);
    assert_eq!(world.inventory.get(ItemId(1)), 20);
    assert_eq!(
        world.resource_point(ResourcePointId(1)).unwrap().remaining,
        980
    );
}

/// Recipe expansion end to end: logs are gathered, planks crafted and
/// consumed into the building.
#[test]
fn test_craft_chain_completes_building() {
    let mut catalog = Catalog::new();
    catalog.add_item(Item::resource(ItemId(1), "Log"));
    catalog.add_item(Item::crafted(ItemId(5), "Plank"));
    catalog.add_recipe(Recipe {
        id: CraftingId(1),
        product: ItemId(5),
        quantity_produced: 1,
        production_time: 1,
        required_building: None,
        materials: vec![Material::new(ItemId(1), 2)],
    });
    catalog.add_blueprint(Blueprint {
        id: BuildingId(1),
        name: "House".into(),
        construction_time: 1,
        materials: vec![Material::new(ItemId(5), 4)],
    });

    let mut world = WorldState::new();
    world.add_building(BuildingSite::from_blueprint(
        catalog.blueprint(BuildingId(1)).unwrap(),
        Pos::new(20, 0),
    ));
    world.add_resource_point(ResourcePoint::new(
        ResourcePointId(1),
        ItemId(1),
        Pos::new(0, 0),
        1000,
    ));

    let mut graph = TaskGraph::build(&catalog, &world, &PriorityWeights::default()).unwrap();
    assert_eq!(graph.len(), 3);
    assert_eq!(graph.get(1).demand, 4, "craft covers four planks");
    assert_eq!(graph.get(2).demand, 8, "eight logs feed four batches");

    let mut workers = vec![worker_at(0, 0, 9)];
    let mut sim = Simulator::new(SimConfig::default());

    run_ticks(&mut sim, &catalog, &mut world, &mut graph, &mut workers, 6000);

    assert!(world.building(BuildingId(1)).unwrap().completed);
    assert_eq!(graph.get(1).produced, 4, "all four planks were crafted");
    assert_eq!(
        world.resource_point(ResourcePointId(1)).unwrap().remaining,
        992,
        "eight logs were harvested"
    );
    assert_eq!(world.inventory.get(ItemId(5)), 0, "planks went into the building");
    assert_eq!(world.inventory.get(ItemId(1)), 0, "logs went into the planks");
}

/// A workshop-gated recipe waits for its workshop, then runs there.
#[test]
fn test_workshop_gates_crafting() {
    let mut catalog = Catalog::new();
    catalog.add_item(Item::resource(ItemId(1), "Log"));
    catalog.add_item(Item::crafted(ItemId(5), "Plank"));
    catalog.add_item(Item::crafted(ItemId(6), "Fitting"));
    // Planks craft anywhere; fittings need the workshop
    catalog.add_recipe(Recipe {
        id: CraftingId(1),
        product: ItemId(5),
        quantity_produced: 1,
        production_time: 1,
        required_building: None,
        materials: vec![Material::new(ItemId(1), 2)],
    });
    catalog.add_recipe(Recipe {
        id: CraftingId(2),
        product: ItemId(6),
        quantity_produced: 1,
        production_time: 1,
        required_building: Some(BuildingId(1)),
        materials: vec![Material::new(ItemId(1), 1)],
    });
    catalog.add_blueprint(Blueprint {
        id: BuildingId(1),
        name: "Workshop".into(),
        construction_time: 1,
        materials: vec![Material::new(ItemId(5), 2)],
    });
    catalog.add_blueprint(Blueprint {
        id: BuildingId(2),
        name: "Smithy".into(),
        construction_time: 1,
        materials: vec![Material::new(ItemId(6), 2)],
    });

    let mut world = WorldState::new();
    world.add_building(BuildingSite::from_blueprint(
        catalog.blueprint(BuildingId(1)).unwrap(),
        Pos::new(15, 0),
    ));
    world.add_building(BuildingSite::from_blueprint(
        catalog.blueprint(BuildingId(2)).unwrap(),
        Pos::new(0, 15),
    ));
    world.add_resource_point(ResourcePoint::new(
        ResourcePointId(1),
        ItemId(1),
        Pos::new(0, 0),
        1000,
    ));

    let mut graph = TaskGraph::build(&catalog, &world, &PriorityWeights::default()).unwrap();
    let mut workers = vec![worker_at(0, 0, 9), worker_at(0, 0, 9)];
    let mut sim = Simulator::new(SimConfig::default());

    run_ticks(&mut sim, &catalog, &mut world, &mut graph, &mut workers, 12_000);

    assert!(world.building(BuildingId(1)).unwrap().completed);
    assert!(
        world.building(BuildingId(2)).unwrap().completed,
        "fitting recipe ran once the workshop stood"
    );
}

/// Supply short of demand: the system keeps running without deadlock or
/// runaway allocation, and delivers what the world can give.
#[test]
fn test_starved_gather_never_deadlocks() {
    let mut catalog = Catalog::new();
    catalog.add_item(Item::resource(ItemId(1), "Log"));
    catalog.add_blueprint(Blueprint {
        id: BuildingId(1),
        name: "GreatHall".into(),
        construction_time: 0,
        materials: vec![Material::new(ItemId(1), 50)],
    });

    let mut world = WorldState::new();
    world.add_building(BuildingSite::from_blueprint(
        catalog.blueprint(BuildingId(1)).unwrap(),
        Pos::new(5, 5),
    ));
    // Only 20 of the 50 needed logs exist
    world.add_resource_point(ResourcePoint::new(
        ResourcePointId(1),
        ItemId(1),
        Pos::new(0, 0),
        20,
    ));

    let mut graph = TaskGraph::build(&catalog, &world, &PriorityWeights::default()).unwrap();
    let mut workers = vec![worker_at(0, 0, 5)];
    let mut sim = Simulator::new(SimConfig::default());

    for t in 0..2000 {
        sim.tick(&catalog, &mut world, &mut graph, &mut workers, t);
        graph.check_invariants().expect("invariants hold each tick");
    }

    assert!(!world.building(BuildingId(1)).unwrap().completed);
    assert_eq!(world.inventory.get(ItemId(1)), 20, "everything available was taken");
    assert!(world.resource_point(ResourcePointId(1)).unwrap().is_depleted());
    let gather = graph.nodes().iter().find(|n| n.is_gather()).unwrap();
    assert_eq!(gather.produced, 20);
    assert!(gather.produced < gather.demand, "demand stays open");
}

/// Zero workers: ticks pass, nothing moves, nothing is allocated.
#[test]
fn test_zero_workers_make_no_progress() {
    let catalog = Catalog::with_defaults();
    let mut world = WorldState::new();
    world.add_building(BuildingSite::from_blueprint(
        catalog.blueprint(BuildingId(1)).unwrap(),
        Pos::new(10, 10),
    ));
    world.add_resource_point(ResourcePoint::new(
        ResourcePointId(1),
        ItemId(1),
        Pos::new(0, 0),
        1000,
    ));

    let mut graph = TaskGraph::build(&catalog, &world, &PriorityWeights::default()).unwrap();
    let mut workers: Vec<Worker> = Vec::new();
    let mut sim = Simulator::new(SimConfig::default());

    for t in 0..500 {
        sim.tick(&catalog, &mut world, &mut graph, &mut workers, t);
    }

    assert!(!world.building(BuildingId(1)).unwrap().completed);
    for node in graph.nodes() {
        assert_eq!(node.produced, 0);
        assert_eq!(node.allocated, 0);
    }
    assert_eq!(world.inventory.get(ItemId(1)), 0);
}
