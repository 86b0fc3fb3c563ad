//! Bundle trading and task stealing
//!
//! After assignment, three passes try to move promised tasks to workers
//! who value them more: the tail of every bundle, a random sample across
//! all bundles, and the tail of any bundle over the size cap. A move needs
//! a minimum score gain and respects the per-task cooldown, which is what
//! makes the exchange converge instead of oscillating. Idle workers with
//! nothing promised may steal the lowest-value tail task of a loaded peer.

use ordered_float::OrderedFloat;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::catalog::Catalog;
use crate::core::config::SimConfig;
use crate::core::types::{TaskId, Tick, WorkerId};
use crate::graph::TaskGraph;
use crate::scheduler::score::score_task;
use crate::scheduler::Shortage;
use crate::sim::worker::Worker;
use crate::world::state::WorldState;

/// A task that changed hands, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleMove {
    pub task: TaskId,
    pub from: WorkerId,
    pub to: WorkerId,
}

fn score_for(
    workers: &[Worker],
    wid: WorkerId,
    task: TaskId,
    graph: &TaskGraph,
    world: &WorldState,
    catalog: &Catalog,
    shortage: &Shortage,
) -> f64 {
    score_task(graph.get(task), &workers[wid], world, catalog, shortage)
}

/// Sort a worker's bundle best-score-first, ties on the lower task id
pub fn resort_bundle(
    workers: &mut [Worker],
    wid: WorkerId,
    graph: &TaskGraph,
    world: &WorldState,
    catalog: &Catalog,
    shortage: &Shortage,
) {
    let mut entries: Vec<TaskId> = workers[wid].bundle.iter().copied().collect();
    entries.sort_by_key(|&task| {
        (
            std::cmp::Reverse(OrderedFloat(score_for(
                workers, wid, task, graph, world, catalog, shortage,
            ))),
            task,
        )
    });
    workers[wid].bundle = entries.into();
}

/// Try to move one task between bundles. Fails when the destination
/// already holds it, the cooldown is active, or the gain is too small.
#[allow(clippy::too_many_arguments)]
fn attempt_move(
    workers: &mut [Worker],
    from: WorkerId,
    to: WorkerId,
    task: TaskId,
    graph: &mut TaskGraph,
    world: &WorldState,
    catalog: &Catalog,
    shortage: &Shortage,
    tick: Tick,
    config: &SimConfig,
) -> bool {
    if from == to || workers[to].bundle_contains(task) {
        return false;
    }
    if graph.get(task).trade_frozen(tick, config.trade_cooldown) {
        return false;
    }
    let gain = score_for(workers, to, task, graph, world, catalog, shortage)
        - score_for(workers, from, task, graph, world, catalog, shortage);
    if gain <= config.trade_gain_threshold {
        return false;
    }

    workers[from].bundle.retain(|&t| t != task);
    workers[to].bundle.push_back(task);
    graph.get_mut(task).mark_traded(tick);
    resort_bundle(workers, from, graph, world, catalog, shortage);
    resort_bundle(workers, to, graph, world, catalog, shortage);
    true
}

/// Best-gain destination for a task currently held by `from`
fn best_target(
    workers: &[Worker],
    from: WorkerId,
    task: TaskId,
    graph: &TaskGraph,
    world: &WorldState,
    catalog: &Catalog,
    shortage: &Shortage,
) -> Option<WorkerId> {
    let from_score = score_for(workers, from, task, graph, world, catalog, shortage);
    (0..workers.len())
        .filter(|&other| other != from)
        .map(|other| {
            let gain =
                score_for(workers, other, task, graph, world, catalog, shortage) - from_score;
            (OrderedFloat(gain), other)
        })
        .filter(|&(gain, _)| gain > OrderedFloat(0.0))
        .max_by_key(|&(gain, other)| (gain, std::cmp::Reverse(other)))
        .map(|(_, other)| other)
}

/// Run the three trade passes over all bundles, returning accepted moves
#[allow(clippy::too_many_arguments)]
pub fn run_trades(
    workers: &mut [Worker],
    graph: &mut TaskGraph,
    world: &WorldState,
    catalog: &Catalog,
    shortage: &Shortage,
    tick: Tick,
    rng: &mut ChaCha8Rng,
    config: &SimConfig,
) -> Vec<BundleMove> {
    let mut moves = Vec::new();
    let try_export = |workers: &mut [Worker],
                          graph: &mut TaskGraph,
                          from: WorkerId,
                          task: TaskId,
                          moves: &mut Vec<BundleMove>| {
        if let Some(to) = best_target(workers, from, task, graph, world, catalog, shortage) {
            if attempt_move(
                workers, from, to, task, graph, world, catalog, shortage, tick, config,
            ) {
                moves.push(BundleMove { task, from, to });
            }
        }
    };

    // Pass 1: the tail of every bundle
    for from in 0..workers.len() {
        let tail: Vec<TaskId> = workers[from]
            .bundle
            .iter()
            .rev()
            .take(config.trade_tail)
            .copied()
            .collect();
        for task in tail {
            try_export(workers, graph, from, task, &mut moves);
        }
    }

    // Pass 2: a random sample across all bundles
    let mut pool: Vec<(WorkerId, TaskId)> = workers
        .iter()
        .enumerate()
        .flat_map(|(wid, w)| w.bundle.iter().map(move |&t| (wid, t)))
        .collect();
    pool.shuffle(rng);
    pool.truncate(config.trade_sample);
    for (from, task) in pool {
        if !workers[from].bundle_contains(task) {
            continue; // moved by an earlier attempt
        }
        try_export(workers, graph, from, task, &mut moves);
    }

    // Pass 3: overloaded bundles export their tail
    for from in 0..workers.len() {
        if workers[from].bundle.len() <= config.bundle_cap {
            continue;
        }
        let tail: Vec<TaskId> = workers[from]
            .bundle
            .iter()
            .rev()
            .take(config.bundle_export_tail)
            .copied()
            .collect();
        for task in tail {
            try_export(workers, graph, from, task, &mut moves);
        }
    }

    moves
}

/// Idle workers with empty bundles pull the tail task of a loaded peer.
/// Stolen tasks respect and refresh the trade cooldown.
pub fn run_steals(
    workers: &mut [Worker],
    graph: &mut TaskGraph,
    tick: Tick,
    config: &SimConfig,
) -> Vec<BundleMove> {
    let mut moves = Vec::new();
    for thief in 0..workers.len() {
        if !workers[thief].is_idle() || !workers[thief].bundle.is_empty() {
            continue;
        }
        let victim = (0..workers.len()).find(|&other| {
            other != thief
                && workers[other].bundle.len() >= 2
                && workers[other]
                    .bundle
                    .back()
                    .is_some_and(|&t| !graph.get(t).trade_frozen(tick, config.trade_cooldown))
        });
        if let Some(victim) = victim {
            if let Some(task) = workers[victim].bundle.pop_back() {
                workers[thief].bundle.push_back(task);
                graph.get_mut(task).mark_traded(tick);
                moves.push(BundleMove {
                    task,
                    from: victim,
                    to: thief,
                });
            }
        }
    }
    moves
}
