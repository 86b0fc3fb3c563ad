use thiserror::Error;

use crate::core::types::{BuildingId, CraftingId, ItemId};

#[derive(Error, Debug)]
pub enum ColonyError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("task graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Catalog load/validation failures. These are data bugs and abort startup.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to parse catalog: {0}")]
    Parse(String),

    #[error("recipe {0:?} produces unknown item {1:?}")]
    UnknownProduct(CraftingId, ItemId),

    #[error("recipe {0:?} requires unknown material {1:?}")]
    UnknownMaterial(CraftingId, ItemId),

    #[error("two recipes produce item {0:?}; products must be unique")]
    DuplicateProduct(ItemId),

    #[error("blueprint {0:?} requires unknown material {1:?}")]
    UnknownBlueprintMaterial(BuildingId, ItemId),

    #[error("recipe {0:?} requires unknown building {1:?}")]
    UnknownWorkshop(CraftingId, BuildingId),

    #[error("resource point template names unknown item {0:?}")]
    UnknownResourceItem(String),
}

/// Task graph construction failures. These are data bugs and abort startup.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("recipe expansion for item {0:?} reaches itself")]
    CyclicRecipe(ItemId),

    #[error("duplicate build target for building {0:?}")]
    DuplicateBuildTarget(BuildingId),
}

pub type Result<T> = std::result::Result<T, ColonyError>;
