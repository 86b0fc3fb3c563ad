pub mod simulator;
pub mod worker;

pub use simulator::Simulator;
pub use worker::{Worker, WorkerPhase, WorkerSpec};
