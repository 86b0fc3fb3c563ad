//! Tick simulator - orchestrates replanning and worker execution
//!
//! Each tick: sync the graph with the world, compute the live shortage,
//! replan on the configured cadence (stale-allocation release, gather
//! interruption, bidding, bundle pulls, stealing, trading), then drive
//! every worker one step. Workers are processed in index order, so a later
//! worker sees inventory mutations and resource-point claims made earlier
//! in the same tick.

use ahash::AHashMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::catalog::Catalog;
use crate::core::config::SimConfig;
use crate::core::types::{ResourcePointId, Tick, WorkerId};
use crate::graph::{TaskGraph, TaskKind, WorldEvent};
use crate::scheduler::score::score_task;
use crate::scheduler::trade::{resort_bundle, run_steals, run_trades};
use crate::scheduler::{batch_size, compute_shortage, shortage_of, Scheduler, Shortage};
use crate::sim::worker::Worker;
use crate::world::state::WorldState;

pub struct Simulator {
    config: SimConfig,
    scheduler: Scheduler,
    rng: ChaCha8Rng,
}

impl Simulator {
    pub fn new(config: SimConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        let scheduler = Scheduler::new(config.clone());
        Self {
            config,
            scheduler,
            rng,
        }
    }

    /// Run up to `ticks` ticks, stopping early once every build target is
    /// complete. Returns the tick count actually simulated.
    pub fn run(
        &mut self,
        catalog: &Catalog,
        world: &mut WorldState,
        graph: &mut TaskGraph,
        workers: &mut [Worker],
        ticks: Tick,
    ) -> Tick {
        self.log_roster(world);
        for t in 0..ticks {
            self.tick(catalog, world, graph, workers, t);
            if graph.all_builds_complete() {
                tracing::info!(tick = t, "all build targets complete");
                return t + 1;
            }
        }
        ticks
    }

    /// Advance the simulation by one tick
    pub fn tick(
        &mut self,
        catalog: &Catalog,
        world: &mut WorldState,
        graph: &mut TaskGraph,
        workers: &mut [Worker],
        t: Tick,
    ) {
        graph.sync_with_world(world);
        let shortage = compute_shortage(graph, &world.inventory);

        if t % self.config.replan_period == 0 {
            self.replan(catalog, world, graph, workers, &shortage, t);
        }

        self.execute(catalog, world, graph, workers, t);
        self.log_tick(world, graph, workers, t);
    }

    fn replan(
        &mut self,
        catalog: &Catalog,
        world: &WorldState,
        graph: &mut TaskGraph,
        workers: &mut [Worker],
        shortage: &Shortage,
        t: Tick,
    ) {
        tracing::debug!(tick = t, shortage = ?shortage, "replan");

        self.release_stale_allocations(graph, workers);
        self.interrupt_gathers(catalog, world, graph, workers, shortage, t);

        // Bidding
        let ready = graph.ready(world);
        let plan = self
            .scheduler
            .assign(graph, &ready, workers, shortage, world, catalog);
        for assignment in plan {
            let worker = &mut workers[assignment.worker];
            if worker.bundle_contains(assignment.task) {
                continue;
            }
            let node = graph.get(assignment.task);
            let batch = batch_size(&self.config, graph, node, world, catalog);
            graph.get_mut(assignment.task).allocated += batch;
            worker.bundle.push_back(assignment.task);
            tracing::info!(
                tick = t,
                worker = assignment.worker,
                task = assignment.task,
                batch,
                "task assigned"
            );
        }

        // Bundles stay sorted best-first so pulls take the top task
        for wid in 0..workers.len() {
            resort_bundle(workers, wid, graph, world, catalog, shortage);
        }
        self.pull_bundles(catalog, world, graph, workers, t);

        // Idle workers with nothing promised raid a loaded peer
        let steals = run_steals(workers, graph, t, &self.config);
        for mv in &steals {
            tracing::info!(tick = t, task = mv.task, from = mv.from, to = mv.to, "task stolen");
        }
        if !steals.is_empty() {
            self.pull_bundles(catalog, world, graph, workers, t);
        }

        let trades = run_trades(
            workers,
            graph,
            world,
            catalog,
            shortage,
            t,
            &mut self.rng,
            &self.config,
        );
        for mv in &trades {
            tracing::info!(tick = t, task = mv.task, from = mv.from, to = mv.to, "task traded");
        }
    }

    /// Gather allocations not owned by any executing worker are leftovers
    /// from interrupted or re-planned batches; they must not lock demand.
    fn release_stale_allocations(&self, graph: &mut TaskGraph, workers: &[Worker]) {
        let in_use: Vec<_> = workers.iter().filter_map(|w| w.current_task).collect();
        for id in 0..graph.len() {
            let node = graph.get(id);
            if node.is_gather() && node.allocated > 0 && !in_use.contains(&id) {
                graph.get_mut(id).allocated = 0;
            }
        }
    }

    /// A gathering worker lets go when the shortage is already covered or
    /// when some ready task would score higher for it. Craft and Build are
    /// never interrupted.
    fn interrupt_gathers(
        &self,
        catalog: &Catalog,
        world: &WorldState,
        graph: &mut TaskGraph,
        workers: &mut [Worker],
        shortage: &Shortage,
        t: Tick,
    ) {
        let ready = graph.ready(world);
        for wid in 0..workers.len() {
            let Some(task) = workers[wid].current_task else {
                continue;
            };
            let TaskKind::Gather { item } = graph.get(task).kind else {
                continue;
            };

            if shortage_of(shortage, item) == 0 {
                tracing::debug!(tick = t, worker = wid, task, "gather released, shortage filled");
                workers[wid].drop_task();
                graph.get_mut(task).allocated = 0;
                continue;
            }

            let self_score = score_task(graph.get(task), &workers[wid], world, catalog, shortage);
            let outscored = ready.iter().any(|&cand| {
                score_task(graph.get(cand), &workers[wid], world, catalog, shortage)
                    > self_score + 1e-6
            });
            if outscored {
                tracing::debug!(tick = t, worker = wid, task, "gather interrupted");
                workers[wid].drop_task();
                graph.get_mut(task).allocated = 0;
            }
        }
    }

    /// Idle workers pull the head of their bundle into execution
    fn pull_bundles(
        &self,
        catalog: &Catalog,
        world: &WorldState,
        graph: &TaskGraph,
        workers: &mut [Worker],
        t: Tick,
    ) {
        for wid in 0..workers.len() {
            if !workers[wid].is_idle() {
                continue;
            }
            let Some(task) = workers[wid].bundle.pop_front() else {
                continue;
            };
            let batch = batch_size(&self.config, graph, graph.get(task), world, catalog);
            workers[wid].start_task(task, batch);
            tracing::info!(tick = t, worker = wid, task, "task started");
        }
    }

    fn execute(
        &self,
        catalog: &Catalog,
        world: &mut WorldState,
        graph: &mut TaskGraph,
        workers: &mut [Worker],
        t: Tick,
    ) {
        // First arrival claims a resource point for the whole tick
        let mut rp_owner: AHashMap<ResourcePointId, WorkerId> = AHashMap::new();

        for wid in 0..workers.len() {
            let Some(task) = workers[wid].current_task else {
                continue;
            };
            match graph.get(task).kind {
                TaskKind::Gather { .. } => {
                    self.execute_gather(world, graph, workers, wid, task, &mut rp_owner, t);
                }
                TaskKind::Craft { .. } => {
                    self.execute_craft(catalog, world, graph, workers, wid, task, t);
                }
                TaskKind::Build { .. } => {
                    self.execute_build(world, graph, workers, wid, task, t);
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn execute_gather(
        &self,
        world: &mut WorldState,
        graph: &mut TaskGraph,
        workers: &mut [Worker],
        wid: WorkerId,
        task: usize,
        rp_owner: &mut AHashMap<ResourcePointId, WorkerId>,
        t: Tick,
    ) {
        let TaskKind::Gather { item } = graph.get(task).kind else {
            return;
        };
        let need = graph.remaining_need_raw(graph.get(task), world);
        if need == 0 {
            workers[wid].drop_task();
            return;
        }

        let Some((rp_id, dist)) = world.nearest_resource_point(item, workers[wid].pos) else {
            // Nothing left to harvest anywhere; the dependent builds stay
            // blocked until some other supply appears
            tracing::warn!(tick = t, worker = wid, item = item.0, "no resource point available");
            workers[wid].drop_task();
            return;
        };

        if dist > 0 {
            let Some(target) = world.resource_point(rp_id).map(|rp| rp.pos) else {
                workers[wid].drop_task();
                return;
            };
            let speed = workers[wid].speed;
            workers[wid].pos.step_toward(target, speed);
            workers[wid].harvested_since_arrival = 0;
            return;
        }

        // Contention: the loser just waits this tick out
        if rp_owner.get(&rp_id).is_some_and(|&owner| owner != wid) {
            return;
        }
        rp_owner.insert(rp_id, wid);

        if workers[wid].ticks_left == 0 {
            workers[wid].ticks_left = self.config.harvest_ticks;
        }
        workers[wid].ticks_left -= 1;
        if workers[wid].ticks_left > 0 {
            return;
        }

        // Harvest countdown expired: transfer one batch
        let batch_cap = workers[wid]
            .current_batch
            .clamp(1, self.config.gather_batch);
        let available = world.resource_point(rp_id).map_or(0, |rp| rp.remaining);
        let amount = batch_cap.min(need).min(available);
        if amount > 0 {
            if let Some(rp) = world.resource_point_mut(rp_id) {
                rp.harvest(amount);
            }
            world.inventory.add(item, amount);
            let node = graph.get_mut(task);
            node.produced += amount;
            node.allocated = node.allocated.saturating_sub(amount);
            workers[wid].harvested_since_arrival += amount;
        }

        // If the global shortage is already covered, stop early rather
        // than over-harvesting
        let live = compute_shortage(graph, &world.inventory);
        if shortage_of(&live, item) == 0 {
            if workers[wid].harvested_since_arrival > 0 {
                tracing::info!(
                    tick = t,
                    worker = wid,
                    amount = workers[wid].harvested_since_arrival,
                    item = item.0,
                    rp = rp_id.0,
                    "harvest stopped, shortage filled"
                );
            }
            workers[wid].drop_task();
            return;
        }

        if graph.get(task).produced >= graph.get(task).demand {
            if workers[wid].harvested_since_arrival > 0 {
                tracing::info!(
                    tick = t,
                    worker = wid,
                    amount = workers[wid].harvested_since_arrival,
                    item = item.0,
                    rp = rp_id.0,
                    "harvested batch"
                );
            }
            workers[wid].drop_task();
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn execute_craft(
        &self,
        catalog: &Catalog,
        world: &mut WorldState,
        graph: &mut TaskGraph,
        workers: &mut [Worker],
        wid: WorkerId,
        task: usize,
        t: Tick,
    ) {
        let TaskKind::Craft { recipe, item } = graph.get(task).kind else {
            return;
        };
        let Some(recipe) = catalog.recipe(recipe) else {
            workers[wid].drop_task();
            return;
        };

        if workers[wid].ticks_left == 0 {
            // Materials are consumed atomically up front; a shortfall here
            // means another worker got there first this replan
            if !world.inventory.consume_materials(&recipe.materials) {
                let batch = workers[wid].current_batch;
                let node = graph.get_mut(task);
                node.allocated = node.allocated.saturating_sub(batch);
                tracing::debug!(tick = t, worker = wid, task, "craft dropped, materials missing");
                workers[wid].drop_task();
                return;
            }
            workers[wid].ticks_left =
                (recipe.production_time * self.config.ticks_per_second).max(1);
        }

        workers[wid].ticks_left -= 1;
        if workers[wid].ticks_left > 0 {
            return;
        }

        let quantity = recipe.quantity_produced.max(1);
        graph.apply_event(WorldEvent::ItemProduced { item, quantity }, world);
        let node = graph.get_mut(task);
        node.produced = (node.produced + quantity).min(node.demand);
        node.allocated = node.allocated.saturating_sub(quantity);
        tracing::info!(tick = t, worker = wid, item = item.0, quantity, "crafted item");

        workers[wid].current_batch = 0;
        if graph.remaining_need(graph.get(task), world) == 0 {
            workers[wid].drop_task();
        }
    }

    fn execute_build(
        &self,
        world: &mut WorldState,
        graph: &mut TaskGraph,
        workers: &mut [Worker],
        wid: WorkerId,
        task: usize,
        t: Tick,
    ) {
        let TaskKind::Build { building, site } = graph.get(task).kind else {
            return;
        };
        let Some(b) = world.building(building) else {
            workers[wid].drop_task();
            return;
        };
        if b.completed {
            let node = graph.get_mut(task);
            node.produced = node.demand;
            workers[wid].drop_task();
            return;
        }

        let target = b.pos;
        if workers[wid].distance_to(target) > 0 {
            let speed = workers[wid].speed;
            workers[wid].pos.step_toward(target, speed);
            return;
        }

        if workers[wid].ticks_left == 0 {
            let materials = b.materials.clone();
            let construction_time = b.construction_time;
            if !world.inventory.consume_materials(&materials) {
                let node = graph.get_mut(task);
                node.allocated = node.allocated.saturating_sub(1);
                tracing::debug!(tick = t, worker = wid, task, "build dropped, materials missing");
                workers[wid].drop_task();
                return;
            }
            workers[wid].ticks_left =
                (construction_time * self.config.ticks_per_second).max(1);
            workers[wid].current_batch = 1;
        }

        workers[wid].ticks_left -= 1;
        if workers[wid].ticks_left > 0 {
            return;
        }

        let node = graph.get_mut(task);
        node.produced = node.demand;
        node.allocated = node.allocated.saturating_sub(1);
        graph.apply_event(WorldEvent::ConstructionFinished { building, site }, world);
        tracing::info!(tick = t, worker = wid, building = building.0, "built building");
        workers[wid].drop_task();
    }

    fn log_roster(&self, world: &WorldState) {
        for rp in world.resource_points() {
            tracing::debug!(
                rp = rp.id.0,
                item = rp.item.0,
                x = rp.pos.x,
                y = rp.pos.y,
                remaining = rp.remaining,
                "resource point"
            );
        }
        for b in world.buildings() {
            tracing::debug!(
                building = b.id.0,
                name = %b.name,
                x = b.pos.x,
                y = b.pos.y,
                completed = b.completed,
                "building"
            );
        }
    }

    /// Per-tick trace of positions, needs/inventory and current tasks,
    /// the feed the visualizer consumes
    fn log_tick(&self, world: &WorldState, graph: &TaskGraph, workers: &[Worker], t: Tick) {
        if !tracing::enabled!(tracing::Level::TRACE) {
            return;
        }
        let positions: Vec<(i32, i32)> = workers.iter().map(|w| (w.pos.x, w.pos.y)).collect();
        let mut needs: Vec<(u32, u32, u32)> = Vec::new();
        for node in graph.nodes() {
            if node.is_build() || node.item().is_building_pseudo() {
                continue;
            }
            let rem = graph.remaining_need(node, world);
            if rem > 0 {
                needs.push((node.item().0, rem, world.inventory.get(node.item())));
            }
        }
        let tasks: Vec<String> = workers
            .iter()
            .map(|w| match w.current_task {
                None => "Idle".into(),
                Some(task) => {
                    let node = graph.get(task);
                    format!("{}{}", node.kind.code(), node.item().0)
                }
            })
            .collect();
        tracing::trace!(tick = t, ?positions, ?needs, ?tasks, "tick");
    }
}
