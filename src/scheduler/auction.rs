//! Multi-round bidding with material pre-reservation
//!
//! Each replan, idle workers score the ready tasks against a copy of the
//! inventory from which in-flight craft/build materials are already
//! deducted. Rounds repeat while winners change; every worker then commits
//! to the best task it still wins, consuming its batch of materials from
//! the ledger so later commitments cannot double-spend.

use std::cmp::Reverse;

use ahash::AHashMap;
use ordered_float::OrderedFloat;
use rayon::prelude::*;

use crate::catalog::Catalog;
use crate::core::config::SimConfig;
use crate::core::types::{ItemId, TaskId, WorkerId};
use crate::graph::{TaskGraph, TaskKind, TaskNode};
use crate::scheduler::score::{score_task, BATCH_BONUS, BUNDLE_PENALTY};
use crate::scheduler::{batch_size, shortage_of, Shortage};
use crate::sim::worker::Worker;
use crate::world::state::WorldState;

/// One task handed to one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub task: TaskId,
    pub worker: WorkerId,
}

/// Current best bid for a task
#[derive(Debug, Clone, Copy)]
struct WinInfo {
    score: f64,
    worker: Option<WorkerId>,
}

impl Default for WinInfo {
    fn default() -> Self {
        Self {
            score: f64::NEG_INFINITY,
            worker: None,
        }
    }
}

/// A ready task that passed the static gates, with its open batch count
struct Candidate {
    task: TaskId,
    units: u32,
}

pub struct Scheduler {
    config: SimConfig,
}

impl Scheduler {
    pub fn new(config: SimConfig) -> Self {
        Self { config }
    }

    /// Run the auction for the current replan. Returns at most one new
    /// assignment per idle worker; the caller appends them to bundles and
    /// locks one batch of allocation each.
    pub fn assign(
        &self,
        graph: &TaskGraph,
        ready: &[TaskId],
        workers: &[Worker],
        shortage: &Shortage,
        world: &WorldState,
        catalog: &Catalog,
    ) -> Vec<Assignment> {
        let mut ledger = self.reservation_ledger(graph, workers, world, catalog);
        let candidates = self.gather_candidates(graph, ready, shortage, world, catalog);

        let idle: Vec<WorkerId> = workers
            .iter()
            .enumerate()
            .filter(|(_, w)| w.is_idle())
            .map(|(i, _)| i)
            .collect();
        if idle.is_empty() || candidates.is_empty() {
            return Vec::new();
        }

        let mut winners: Vec<WinInfo> = vec![WinInfo::default(); graph.len()];
        let mut picks: Vec<Vec<(f64, TaskId)>> = vec![Vec::new(); workers.len()];

        for _round in 0..self.config.max_bid_rounds {
            let mut changed = false;
            for &wid in &idle {
                let scored = self.score_candidates(
                    &candidates,
                    graph,
                    &workers[wid],
                    picks[wid].len(),
                    shortage,
                    world,
                    catalog,
                    &ledger,
                );
                for &(score, task) in &scored {
                    if score > winners[task].score {
                        winners[task] = WinInfo {
                            score,
                            worker: Some(wid),
                        };
                        changed = true;
                    }
                }
                picks[wid] = scored;
            }
            if !changed {
                break;
            }
        }

        // Commit phase: best still-won pick per worker, materials reserved
        let mut result = Vec::new();
        for &wid in &idle {
            let chosen = picks[wid].iter().find(|&&(_, task)| {
                winners[task].worker == Some(wid)
                    && self.materials_available(graph.get(task), &ledger, world, catalog)
            });
            if let Some(&(_, task)) = chosen {
                self.reserve_batch(graph.get(task), &mut ledger, world, catalog);
                result.push(Assignment { task, worker: wid });
            }
        }
        result
    }

    /// Inventory snapshot minus the materials of every in-flight
    /// craft/build task. The live inventory is never touched.
    fn reservation_ledger(
        &self,
        graph: &TaskGraph,
        workers: &[Worker],
        world: &WorldState,
        catalog: &Catalog,
    ) -> AHashMap<ItemId, i64> {
        let mut ledger = world.inventory.snapshot();
        for worker in workers {
            if let Some(task) = worker.current_task {
                self.reserve_batch(graph.get(task), &mut ledger, world, catalog);
            }
        }
        ledger
    }

    fn gather_candidates(
        &self,
        graph: &TaskGraph,
        ready: &[TaskId],
        shortage: &Shortage,
        world: &WorldState,
        catalog: &Catalog,
    ) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for &task in ready {
            let node = graph.get(task);
            let remaining = graph.remaining_need(node, world);
            if remaining == 0 {
                continue;
            }
            match node.kind {
                TaskKind::Gather { item } => {
                    if shortage_of(shortage, item) == 0 {
                        continue;
                    }
                }
                TaskKind::Craft { recipe, .. } => {
                    let Some(r) = catalog.recipe(recipe) else {
                        continue;
                    };
                    // Workshop must stand before its recipes are biddable
                    if let Some(b) = r.required_building {
                        if !world.building(b).is_some_and(|b| b.completed) {
                            continue;
                        }
                    }
                }
                TaskKind::Build { .. } => {}
            }
            let batch = batch_size(&self.config, graph, node, world, catalog);
            candidates.push(Candidate {
                task,
                units: remaining.div_ceil(batch.max(1)),
            });
        }
        candidates
    }

    /// Score every candidate for one worker, best first, capped at the
    /// per-round candidate limit. The bundle penalty counts both the
    /// worker's promised tasks and its tentative picks from the previous
    /// round, so loaded bidders fade across rounds. Scoring is pure, so
    /// large candidate sets fan out over rayon.
    #[allow(clippy::too_many_arguments)]
    fn score_candidates(
        &self,
        candidates: &[Candidate],
        graph: &TaskGraph,
        worker: &Worker,
        tentative: usize,
        shortage: &Shortage,
        world: &WorldState,
        catalog: &Catalog,
        ledger: &AHashMap<ItemId, i64>,
    ) -> Vec<(f64, TaskId)> {
        let penalty = BUNDLE_PENALTY * (worker.bundle.len() + tentative) as f64;
        let score_one = |c: &Candidate| -> Option<(f64, TaskId)> {
            if worker.bundle_contains(c.task) {
                return None;
            }
            let node = graph.get(c.task);
            if !self.materials_available(node, ledger, world, catalog) {
                return None;
            }
            let score = score_task(node, worker, world, catalog, shortage)
                + BATCH_BONUS * c.units as f64
                - penalty;
            Some((score, c.task))
        };

        let mut scored: Vec<(f64, TaskId)> = if candidates.len() >= self.config.parallel_threshold
        {
            candidates.par_iter().filter_map(score_one).collect()
        } else {
            candidates.iter().filter_map(score_one).collect()
        };
        scored.sort_by_key(|&(score, task)| (Reverse(OrderedFloat(score)), task));
        scored.truncate(self.config.candidate_cap);
        scored
    }

    /// One batch of this task's materials fits in the ledger
    fn materials_available(
        &self,
        node: &TaskNode,
        ledger: &AHashMap<ItemId, i64>,
        world: &WorldState,
        catalog: &Catalog,
    ) -> bool {
        let covered = |item: ItemId, qty: u32| ledger.get(&item).copied().unwrap_or(0) >= qty as i64;
        match node.kind {
            TaskKind::Gather { .. } => true,
            TaskKind::Craft { recipe, .. } => catalog
                .recipe(recipe)
                .is_some_and(|r| r.materials.iter().all(|m| covered(m.item, m.qty))),
            TaskKind::Build { building, .. } => world
                .building(building)
                .is_some_and(|b| b.materials.iter().all(|m| covered(m.item, m.qty))),
        }
    }

    /// Deduct one batch of this task's materials from the ledger
    fn reserve_batch(
        &self,
        node: &TaskNode,
        ledger: &mut AHashMap<ItemId, i64>,
        world: &WorldState,
        catalog: &Catalog,
    ) {
        let materials = match node.kind {
            TaskKind::Gather { .. } => return,
            TaskKind::Craft { recipe, .. } => match catalog.recipe(recipe) {
                Some(r) => r.materials.clone(),
                None => return,
            },
            TaskKind::Build { building, .. } => match world.building(building) {
                Some(b) => b.materials.clone(),
                None => return,
            },
        };
        for m in &materials {
            *ledger.entry(m.item).or_insert(0) -= m.qty as i64;
        }
    }
}
