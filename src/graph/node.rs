//! Task nodes - the entities of the dependency DAG

use serde::{Deserialize, Serialize};

use crate::core::types::{BuildingId, CraftingId, ItemId, Pos, TaskId, Tick};

/// What a task node actually does, as a tagged sum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    /// Harvest a raw resource from resource points
    Gather { item: ItemId },
    /// Run a recipe to produce an item
    Craft { recipe: CraftingId, item: ItemId },
    /// Construct a building at a fixed site
    Build { building: BuildingId, site: Pos },
}

impl TaskKind {
    /// One-letter code used in log lines
    pub fn code(&self) -> char {
        match self {
            TaskKind::Gather { .. } => 'G',
            TaskKind::Craft { .. } => 'C',
            TaskKind::Build { .. } => 'B',
        }
    }
}

/// A node in the task graph. Nodes are arena-allocated and never deleted;
/// `demand` is fixed at build time, `produced`/`allocated` mutate during
/// simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskNode {
    pub id: TaskId,
    pub kind: TaskKind,
    /// Total units this node must deliver
    pub demand: u32,
    /// Units actually delivered so far (monotonic, <= demand)
    pub produced: u32,
    /// Units locked by in-flight batches; provisional, reconciled at replan
    pub allocated: u32,
    /// Priority weight: product of per-item factors down the tree
    pub weight: f64,
    pub parents: Vec<TaskId>,
    pub children: Vec<TaskId>,
    /// Times this task changed hands through bundle trades or steals
    pub trade_count: u32,
    /// Tick of the last trade, for the trade cooldown
    pub last_trade_tick: Option<Tick>,
}

impl TaskNode {
    pub fn new(kind: TaskKind, demand: u32) -> Self {
        Self {
            id: 0,
            kind,
            demand,
            produced: 0,
            allocated: 0,
            weight: 1.0,
            parents: Vec::new(),
            children: Vec::new(),
            trade_count: 0,
            last_trade_tick: None,
        }
    }

    /// Product item for Gather/Craft, pseudo-item for Build
    pub fn item(&self) -> ItemId {
        match self.kind {
            TaskKind::Gather { item } => item,
            TaskKind::Craft { item, .. } => item,
            TaskKind::Build { building, .. } => ItemId::for_building(building),
        }
    }

    pub fn is_build(&self) -> bool {
        matches!(self.kind, TaskKind::Build { .. })
    }

    pub fn is_gather(&self) -> bool {
        matches!(self.kind, TaskKind::Gather { .. })
    }

    /// Whether the trade cooldown blocks moving this task at `tick`
    pub fn trade_frozen(&self, tick: Tick, cooldown: Tick) -> bool {
        matches!(self.last_trade_tick, Some(last) if tick.saturating_sub(last) < cooldown)
    }

    /// Record a bundle trade or steal
    pub fn mark_traded(&mut self, tick: Tick) {
        self.trade_count += 1;
        self.last_trade_tick = Some(tick);
    }
}
