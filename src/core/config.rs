//! Simulation configuration with documented constants
//!
//! All tunables of the planner and simulator are collected here with
//! explanations of their purpose and how they interact with each other.

use crate::core::types::Tick;

/// Configuration for the scheduler and tick simulator
///
/// These values have been tuned to produce steady progress without
/// oscillation. Changing them affects pacing, not correctness.
#[derive(Debug, Clone)]
pub struct SimConfig {
    // === TIME ===
    /// Discrete simulation steps per simulated second
    ///
    /// Work durations in the catalog are expressed in seconds and are
    /// multiplied by this value when a countdown starts.
    pub ticks_per_second: u32,

    /// How often the scheduler re-runs, in ticks
    ///
    /// At the default (100 ticks = 5 simulated seconds), stale allocations
    /// are released, gather tasks may be interrupted, and new bidding and
    /// trading rounds happen on this cadence. Replanning every tick makes
    /// workers thrash; replanning too rarely leaves them idle.
    pub replan_period: Tick,

    // === BATCHING ===
    /// Units of a resource locked per gather assignment
    ///
    /// A gather batch caps how much one worker commits to before the
    /// shortage is re-evaluated. Smaller batches react faster to filled
    /// shortages; larger batches cut travel overhead.
    pub gather_batch: u32,

    /// Ticks a worker spends at a resource point per harvested batch
    pub harvest_ticks: u32,

    // === BIDDING ===
    /// Maximum bidding rounds per replan
    ///
    /// Rounds after the first only matter when a later worker outbids an
    /// earlier winner; three rounds are enough for the scores to settle.
    pub max_bid_rounds: usize,

    /// Candidate tasks a worker keeps per bidding round
    pub candidate_cap: usize,

    // === TRADING ===
    /// Minimum score gain for a bundle trade to be accepted
    ///
    /// Below this threshold a move is churn, not improvement.
    pub trade_gain_threshold: f64,

    /// Ticks a task is frozen after being traded or stolen
    ///
    /// The cooldown guarantees trade convergence: a task cannot bounce
    /// between two workers within the window even if both moves look
    /// profitable in isolation.
    pub trade_cooldown: Tick,

    /// Tail entries of every bundle offered for export each replan
    pub trade_tail: usize,

    /// Random bundle entries sampled for trade attempts each replan
    pub trade_sample: usize,

    /// Bundle size above which the overflow pass exports the tail
    pub bundle_cap: usize,

    /// Tail entries exported by the overflow pass
    pub bundle_export_tail: usize,

    // === WORKERS ===
    /// Manhattan units a worker moves per tick
    pub worker_speed: i32,

    /// Initial energy of a default worker
    pub worker_energy: u32,

    // === PARALLELIZATION ===
    /// Minimum candidate-task count before the scoring loop fans out
    ///
    /// Below this threshold, thread overhead exceeds the benefit of
    /// parallel scoring. Scoring is pure, so the fan-out never changes
    /// results.
    pub parallel_threshold: usize,

    // === DETERMINISM ===
    /// Seed for the trade-sampling and world-generation RNG
    pub rng_seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 20,
            replan_period: 100,

            gather_batch: 10,
            harvest_ticks: 20,

            max_bid_rounds: 3,
            candidate_cap: 5,

            trade_gain_threshold: 50.0,
            trade_cooldown: 50,
            trade_tail: 3,
            trade_sample: 10,
            bundle_cap: 40,
            bundle_export_tail: 20,

            worker_speed: 9,
            worker_energy: 100,

            parallel_threshold: 64,

            rng_seed: 42,
        }
    }
}

impl SimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.ticks_per_second == 0 {
            return Err("ticks_per_second must be positive".into());
        }
        if self.replan_period == 0 {
            return Err("replan_period must be positive".into());
        }
        if self.gather_batch == 0 {
            return Err("gather_batch must be positive".into());
        }
        if self.max_bid_rounds == 0 || self.candidate_cap == 0 {
            return Err("bidding needs at least one round and one candidate".into());
        }
        if self.bundle_export_tail > self.bundle_cap {
            return Err(format!(
                "bundle_export_tail ({}) should be <= bundle_cap ({})",
                self.bundle_export_tail, self.bundle_cap
            ));
        }
        if self.worker_speed <= 0 {
            return Err("worker_speed must be positive".into());
        }
        Ok(())
    }
}
