//! Workers - the mobile agents executing tasks
//!
//! A worker advances by one discrete step per tick. Its phase is derived
//! state: no task means idle, an armed countdown means working, otherwise
//! it is moving toward its target.

use std::collections::VecDeque;

use crate::core::config::SimConfig;
use crate::core::types::{Pos, TaskId};

/// Startup description of one worker
#[derive(Debug, Clone)]
pub struct WorkerSpec {
    pub name: String,
    pub role: String,
    pub x: i32,
    pub y: i32,
    pub speed: i32,
    pub energy: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    Idle,
    Moving,
    Working,
}

#[derive(Debug, Clone)]
pub struct Worker {
    pub name: String,
    pub role: String,
    pub energy: u32,
    pub pos: Pos,
    /// Manhattan units moved per tick
    pub speed: i32,
    /// Tasks this worker has been promised, best first
    pub bundle: VecDeque<TaskId>,
    pub current_task: Option<TaskId>,
    /// Remaining ticks of the active work countdown (0 = not started)
    pub ticks_left: u32,
    /// Units locked for the active batch
    pub current_batch: u32,
    /// Units harvested since arriving at the current resource point
    pub harvested_since_arrival: u32,
}

impl Worker {
    pub fn from_spec(spec: &WorkerSpec) -> Self {
        Self {
            name: spec.name.clone(),
            role: spec.role.clone(),
            energy: spec.energy,
            pos: Pos::new(spec.x, spec.y),
            speed: spec.speed,
            bundle: VecDeque::new(),
            current_task: None,
            ticks_left: 0,
            current_batch: 0,
            harvested_since_arrival: 0,
        }
    }

    /// Spawn `count` identical workers at `center`
    pub fn default_crew(count: usize, center: Pos, config: &SimConfig) -> Vec<Self> {
        (0..count)
            .map(|i| {
                Self::from_spec(&WorkerSpec {
                    name: format!("Worker_{}", i + 1),
                    role: "Worker".into(),
                    x: center.x,
                    y: center.y,
                    speed: config.worker_speed,
                    energy: config.worker_energy,
                })
            })
            .collect()
    }

    pub fn is_idle(&self) -> bool {
        self.current_task.is_none()
    }

    pub fn phase(&self) -> WorkerPhase {
        if self.current_task.is_none() {
            WorkerPhase::Idle
        } else if self.ticks_left > 0 {
            WorkerPhase::Working
        } else {
            WorkerPhase::Moving
        }
    }

    pub fn distance_to(&self, pos: Pos) -> i32 {
        self.pos.manhattan(pos)
    }

    /// Clear all execution state for the active task
    pub fn drop_task(&mut self) {
        self.current_task = None;
        self.ticks_left = 0;
        self.current_batch = 0;
        self.harvested_since_arrival = 0;
    }

    /// Start executing a task with the given batch size
    pub fn start_task(&mut self, task: TaskId, batch: u32) {
        self.current_task = Some(task);
        self.ticks_left = 0;
        self.current_batch = batch;
        self.harvested_since_arrival = 0;
    }

    pub fn bundle_contains(&self, task: TaskId) -> bool {
        self.bundle.contains(&task)
    }
}
