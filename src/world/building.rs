//! Building instances - construction sites and completed buildings

use serde::{Deserialize, Serialize};

use crate::catalog::blueprint::Blueprint;
use crate::catalog::recipe::Material;
use crate::core::types::{BuildingId, Pos};

/// A placed building. Unique per blueprint id in this world model; starts
/// as a construction site and flips to completed exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingSite {
    pub id: BuildingId,
    pub name: String,
    pub pos: Pos,
    pub completed: bool,
    /// Seconds of on-site work once materials are consumed
    pub construction_time: u32,
    /// Materials consumed when construction starts
    pub materials: Vec<Material>,
}

impl BuildingSite {
    /// Place a blueprint as a fresh construction site
    pub fn from_blueprint(bp: &Blueprint, pos: Pos) -> Self {
        Self {
            id: bp.id,
            name: bp.name.clone(),
            pos,
            completed: false,
            construction_time: bp.construction_time,
            materials: bp.materials.clone(),
        }
    }

    /// A building that exists from the start and needs no work (storage)
    pub fn pre_built(id: BuildingId, name: &str, pos: Pos) -> Self {
        Self {
            id,
            name: name.into(),
            pos,
            completed: true,
            construction_time: 0,
            materials: Vec::new(),
        }
    }

    pub fn complete_construction(&mut self) {
        self.completed = true;
    }
}
