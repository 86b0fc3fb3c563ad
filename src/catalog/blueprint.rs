//! Building blueprints - what a construction site needs and how long it takes

use serde::{Deserialize, Serialize};

use crate::catalog::recipe::Material;
use crate::core::types::BuildingId;

/// A building template. Immutable after load; world generation turns each
/// blueprint into at most one construction site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blueprint {
    pub id: BuildingId,
    pub name: String,
    /// Seconds of on-site work once materials are consumed
    pub construction_time: u32,
    pub materials: Vec<Material>,
}
