//! Task graph construction and accounting
//!
//! The graph is built once from the catalog and the initial building list
//! by recursive recipe expansion, then only its `produced`/`allocated`
//! counters mutate. Nodes live in an arena vector; all edges and external
//! references are integer ids.

use ahash::AHashMap;

use crate::catalog::{Catalog, PriorityWeights};
use crate::core::error::GraphError;
use crate::core::types::{BuildingId, ItemId, Pos, TaskId};
use crate::graph::event::WorldEvent;
use crate::graph::node::{TaskKind, TaskNode};
use crate::world::building::BuildingSite;
use crate::world::state::WorldState;

#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    nodes: Vec<TaskNode>,
    /// Construction sites not yet finished, per building id
    pending_sites: AHashMap<BuildingId, Vec<Pos>>,
    /// Guards the one-Build-node-per-building invariant
    build_targets: AHashMap<BuildingId, TaskId>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the full graph for every incomplete building in the world.
    /// Pre-existing completed buildings (storage) are not targets.
    pub fn build(
        catalog: &Catalog,
        world: &WorldState,
        weights: &PriorityWeights,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        let mut sites: Vec<&BuildingSite> = world.buildings().filter(|b| !b.completed).collect();
        sites.sort_by_key(|b| b.id);
        for site in sites {
            graph.add_build_target(site, catalog, weights)?;
        }
        Ok(graph)
    }

    /// Add one building target and its full supply sub-tree
    pub fn add_build_target(
        &mut self,
        site: &BuildingSite,
        catalog: &Catalog,
        weights: &PriorityWeights,
    ) -> Result<TaskId, GraphError> {
        if self.build_targets.contains_key(&site.id) {
            return Err(GraphError::DuplicateBuildTarget(site.id));
        }

        let mut node = TaskNode::new(
            TaskKind::Build {
                building: site.id,
                site: site.pos,
            },
            1,
        );
        node.weight = weights.get(ItemId::for_building(site.id));
        let weight = node.weight;
        let build_id = self.add_node(node);
        self.build_targets.insert(site.id, build_id);
        self.pending_sites.entry(site.id).or_default().push(site.pos);

        let mut stack = Vec::new();
        for mat in &site.materials {
            let child =
                self.expand_supply(mat.item, mat.qty, weight, catalog, weights, &mut stack)?;
            self.add_edge(build_id, child);
        }
        Ok(build_id)
    }

    /// Recursive supply expansion: a craftable item becomes a Craft node
    /// over its materials, anything else a Gather leaf. Sibling demands
    /// share nothing; duplicate sub-trees are fine because inventory is
    /// accounted separately.
    fn expand_supply(
        &mut self,
        item: ItemId,
        qty: u32,
        parent_weight: f64,
        catalog: &Catalog,
        weights: &PriorityWeights,
        stack: &mut Vec<ItemId>,
    ) -> Result<TaskId, GraphError> {
        if stack.contains(&item) {
            return Err(GraphError::CyclicRecipe(item));
        }
        let weight = parent_weight * weights.get(item);

        match catalog.recipe_for_product(item) {
            Some(recipe) => {
                let batches = recipe.batches_for(qty);
                let mut node = TaskNode::new(
                    TaskKind::Craft {
                        recipe: recipe.id,
                        item,
                    },
                    batches * recipe.quantity_produced.max(1),
                );
                node.weight = weight;
                let parent = self.add_node(node);

                stack.push(item);
                let materials = recipe.materials.clone();
                for mat in &materials {
                    let child = self.expand_supply(
                        mat.item,
                        mat.qty * batches,
                        weight,
                        catalog,
                        weights,
                        stack,
                    )?;
                    self.add_edge(parent, child);
                }
                stack.pop();
                Ok(parent)
            }
            None => {
                let mut node = TaskNode::new(TaskKind::Gather { item }, qty);
                node.weight = weight;
                Ok(self.add_node(node))
            }
        }
    }

    pub fn add_node(&mut self, mut node: TaskNode) -> TaskId {
        node.id = self.nodes.len();
        let id = node.id;
        self.nodes.push(node);
        id
    }

    /// `parent` depends on `child`
    pub fn add_edge(&mut self, parent: TaskId, child: TaskId) {
        if parent >= self.nodes.len() || child >= self.nodes.len() {
            return;
        }
        self.nodes[parent].children.push(child);
        self.nodes[child].parents.push(parent);
    }

    pub fn get(&self, id: TaskId) -> &TaskNode {
        &self.nodes[id]
    }

    pub fn get_mut(&mut self, id: TaskId) -> &mut TaskNode {
        &mut self.nodes[id]
    }

    pub fn nodes(&self) -> &[TaskNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Units still missing, ignoring in-flight allocations. Inventory is
    /// shared for Gather: a gather counts as satisfied as soon as enough
    /// of its item sits in the global store, delivered or not. Craft
    /// counts delivered batches only; its output already sits in the
    /// inventory and must not be counted twice.
    pub fn remaining_need_raw(&self, node: &TaskNode, world: &WorldState) -> u32 {
        match node.kind {
            TaskKind::Build { building, .. } => {
                let done = world
                    .building(building)
                    .is_some_and(|b| b.completed);
                if done {
                    0
                } else {
                    node.demand.saturating_sub(node.produced)
                }
            }
            TaskKind::Craft { .. } => node.demand.saturating_sub(node.produced),
            TaskKind::Gather { .. } => {
                let have = world.inventory.get(node.item());
                node.demand.saturating_sub(node.produced + have)
            }
        }
    }

    /// Units still missing after subtracting in-flight allocations; the
    /// scheduler's form, so it never over-assigns.
    pub fn remaining_need(&self, node: &TaskNode, world: &WorldState) -> u32 {
        self.remaining_need_raw(node, world)
            .saturating_sub(node.allocated)
    }

    pub fn is_satisfied(&self, id: TaskId, world: &WorldState) -> bool {
        self.remaining_need_raw(&self.nodes[id], world) == 0
    }

    /// Tasks that are incomplete and whose every child is satisfied
    pub fn ready(&self, world: &WorldState) -> Vec<TaskId> {
        self.nodes
            .iter()
            .filter(|n| {
                self.remaining_need_raw(n, world) > 0
                    && n.children.iter().all(|&c| self.is_satisfied(c, world))
            })
            .map(|n| n.id)
            .collect()
    }

    /// Mark Build nodes complete when the underlying building is.
    /// Idempotent: applying twice in a row changes nothing.
    pub fn sync_with_world(&mut self, world: &WorldState) {
        for node in &mut self.nodes {
            if let TaskKind::Build { building, .. } = node.kind {
                if world.building(building).is_some_and(|b| b.completed) {
                    node.produced = node.demand;
                }
            }
        }
    }

    /// Apply a completion event emitted by the simulator
    pub fn apply_event(&mut self, event: WorldEvent, world: &mut WorldState) {
        match event {
            WorldEvent::ConstructionFinished { building, site } => {
                if let Some(sites) = self.pending_sites.get_mut(&building) {
                    if let Some(idx) = sites.iter().position(|&p| p == site) {
                        sites.remove(idx);
                    }
                }
                if let Some(b) = world.building_mut(building) {
                    b.complete_construction();
                }
            }
            WorldEvent::ItemProduced { item, quantity } => {
                world.inventory.add(item, quantity);
            }
        }
    }

    pub fn pending_sites(&self, building: BuildingId) -> &[Pos] {
        self.pending_sites
            .get(&building)
            .map_or(&[], |v| v.as_slice())
    }

    /// Whether every build target is done
    pub fn all_builds_complete(&self) -> bool {
        self.nodes
            .iter()
            .filter(|n| n.is_build())
            .all(|n| n.produced >= n.demand)
    }

    /// Structural and accounting invariants, for tests and debugging:
    /// counter bounds on every node and acyclicity of the edge set.
    pub fn check_invariants(&self) -> Result<(), String> {
        for node in &self.nodes {
            if node.produced > node.demand {
                return Err(format!(
                    "node {} produced {} exceeds demand {}",
                    node.id, node.produced, node.demand
                ));
            }
        }

        // Kahn's algorithm; leftovers mean a cycle
        let mut indegree: Vec<usize> = self.nodes.iter().map(|n| n.parents.len()).collect();
        let mut queue: Vec<TaskId> = indegree
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d == 0)
            .map(|(i, _)| i)
            .collect();
        let mut seen = 0;
        while let Some(id) = queue.pop() {
            seen += 1;
            for &child in &self.nodes[id].children {
                indegree[child] -= 1;
                if indegree[child] == 0 {
                    queue.push(child);
                }
            }
        }
        if seen != self.nodes.len() {
            return Err("task graph contains a cycle".into());
        }
        Ok(())
    }
}
