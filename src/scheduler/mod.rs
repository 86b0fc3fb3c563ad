//! Auction-style task scheduler
//!
//! Runs every replan period: computes the live shortage, scores ready
//! tasks for idle workers, and resolves contention through multi-round
//! bidding with material pre-reservation. Bundle trading and stealing
//! rebalance the resulting bundles.

pub mod auction;
pub mod score;
pub mod trade;

use ahash::AHashMap;

use crate::catalog::Catalog;
use crate::core::config::SimConfig;
use crate::core::types::ItemId;
use crate::graph::{TaskGraph, TaskKind, TaskNode};
use crate::world::inventory::Inventory;
use crate::world::state::WorldState;

pub use auction::{Assignment, Scheduler};

/// Live shortage per item: remaining demand not covered by inventory
pub type Shortage = AHashMap<ItemId, u32>;

/// Shortage across all Gather/Craft nodes. Build pseudo-items never
/// participate; inventory offsets the summed remaining demand.
pub fn compute_shortage(graph: &TaskGraph, inventory: &Inventory) -> Shortage {
    let mut need: Shortage = AHashMap::new();
    for node in graph.nodes() {
        if node.is_build() || node.item().is_building_pseudo() {
            continue;
        }
        let remaining = node.demand.saturating_sub(node.produced);
        if remaining > 0 {
            *need.entry(node.item()).or_insert(0) += remaining;
        }
    }
    for (&item, missing) in need.iter_mut() {
        *missing = missing.saturating_sub(inventory.get(item));
    }
    need
}

/// Shortage lookup with absent items counting as zero
pub fn shortage_of(shortage: &Shortage, item: ItemId) -> u32 {
    shortage.get(&item).copied().unwrap_or(0)
}

/// Units locked per assignment of this task: a gather batch capped by the
/// residual need, one recipe execution, or one construction. The residual
/// cap uses the raw need so that a task's own fresh allocation does not
/// shrink the batch it was allocated for.
pub fn batch_size(
    config: &SimConfig,
    graph: &TaskGraph,
    node: &TaskNode,
    world: &WorldState,
    catalog: &Catalog,
) -> u32 {
    match node.kind {
        TaskKind::Gather { .. } => {
            let residual = graph.remaining_need_raw(node, world);
            config.gather_batch.min(residual.max(1))
        }
        TaskKind::Craft { recipe, .. } => catalog
            .recipe(recipe)
            .map_or(1, |r| r.quantity_produced.max(1)),
        TaskKind::Build { .. } => 1,
    }
}
