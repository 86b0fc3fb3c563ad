//! Static catalog: items, recipes, building blueprints, resource templates
//!
//! Loaded once at startup from a TOML file (or built from defaults for
//! tests and demos) and treated as read-only afterwards.

pub mod blueprint;
pub mod item;
pub mod recipe;

use ahash::AHashMap;
use serde::Deserialize;

use crate::catalog::blueprint::Blueprint;
use crate::catalog::item::Item;
use crate::catalog::recipe::{Material, Recipe};
use crate::core::error::CatalogError;
use crate::core::types::{BuildingId, CraftingId, ItemId};

/// Template for scattering resource points at world generation
#[derive(Debug, Clone)]
pub struct ResourceTemplate {
    pub item: ItemId,
    /// Units each generated point starts with (never regenerates)
    pub initial: u32,
    /// How many points of this resource to place
    pub count: u32,
}

/// The immutable world catalog
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: AHashMap<ItemId, Item>,
    recipes: Vec<Recipe>,
    product_index: AHashMap<ItemId, usize>,
    blueprints: AHashMap<BuildingId, Blueprint>,
    resource_templates: Vec<ResourceTemplate>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A small hardcoded catalog for tests and demos: two raw resources,
    /// one crafted intermediate, a workshop and a house.
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        catalog.add_item(Item::resource(ItemId(1), "Log"));
        catalog.add_item(Item::resource(ItemId(2), "Stone"));
        catalog.add_item(Item::crafted(ItemId(5), "Plank"));

        catalog.add_recipe(Recipe {
            id: CraftingId(1),
            product: ItemId(5),
            quantity_produced: 1,
            production_time: 5,
            required_building: None,
            materials: vec![Material::new(ItemId(1), 2)],
        });

        catalog.add_blueprint(Blueprint {
            id: BuildingId(1),
            name: "Workshop".into(),
            construction_time: 8,
            materials: vec![Material::new(ItemId(5), 4)],
        });
        catalog.add_blueprint(Blueprint {
            id: BuildingId(2),
            name: "House".into(),
            construction_time: 10,
            materials: vec![Material::new(ItemId(5), 6), Material::new(ItemId(2), 4)],
        });

        catalog.resource_templates = vec![
            ResourceTemplate {
                item: ItemId(1),
                initial: 1000,
                count: 8,
            },
            ResourceTemplate {
                item: ItemId(2),
                initial: 1000,
                count: 8,
            },
        ];
        catalog
    }

    pub fn add_item(&mut self, item: Item) {
        self.items.insert(item.id, item);
    }

    pub fn add_recipe(&mut self, recipe: Recipe) {
        self.product_index.insert(recipe.product, self.recipes.len());
        self.recipes.push(recipe);
    }

    pub fn add_blueprint(&mut self, blueprint: Blueprint) {
        self.blueprints.insert(blueprint.id, blueprint);
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn recipe(&self, id: CraftingId) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    /// The unique recipe producing `item`, if the item is craftable
    pub fn recipe_for_product(&self, item: ItemId) -> Option<&Recipe> {
        self.product_index.get(&item).map(|&i| &self.recipes[i])
    }

    pub fn blueprint(&self, id: BuildingId) -> Option<&Blueprint> {
        self.blueprints.get(&id)
    }

    pub fn blueprints(&self) -> impl Iterator<Item = &Blueprint> {
        self.blueprints.values()
    }

    pub fn resource_templates(&self) -> &[ResourceTemplate] {
        &self.resource_templates
    }

    /// Load and validate a catalog from a TOML file
    pub fn load_toml(path: &std::path::Path) -> Result<Self, CatalogError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::parse_toml(&content)
    }

    /// Parse and validate a catalog from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, CatalogError> {
        let raw: TomlCatalog =
            toml::from_str(content).map_err(|e| CatalogError::Parse(e.to_string()))?;

        let mut catalog = Self::new();
        for item in raw.items {
            catalog.add_item(Item {
                id: ItemId(item.id),
                name: item.name,
                is_resource: item.resource,
                required_building: (item.building != 0).then_some(BuildingId(item.building)),
            });
        }
        for recipe in raw.recipes {
            let product = ItemId(recipe.product);
            if catalog.product_index.contains_key(&product) {
                return Err(CatalogError::DuplicateProduct(product));
            }
            catalog.add_recipe(Recipe {
                id: CraftingId(recipe.id),
                product,
                quantity_produced: recipe.quantity.max(1),
                production_time: recipe.time,
                required_building: (recipe.building != 0).then_some(BuildingId(recipe.building)),
                materials: recipe
                    .materials
                    .into_iter()
                    .map(|m| Material::new(ItemId(m.item), m.qty))
                    .collect(),
            });
        }
        for bp in raw.buildings {
            catalog.add_blueprint(Blueprint {
                id: BuildingId(bp.id),
                name: bp.name,
                construction_time: bp.time,
                materials: bp
                    .materials
                    .into_iter()
                    .map(|m| Material::new(ItemId(m.item), m.qty))
                    .collect(),
            });
        }
        for rp in raw.resource_points {
            // Resource templates name items; join by name
            let item = catalog
                .items
                .values()
                .find(|i| i.name == rp.item)
                .map(|i| i.id)
                .ok_or_else(|| CatalogError::UnknownResourceItem(rp.item.clone()))?;
            catalog.resource_templates.push(ResourceTemplate {
                item,
                initial: rp.initial,
                count: rp.count,
            });
        }

        catalog.validate()?;
        Ok(catalog)
    }

    /// Cross-reference consistency checks. Catalog inconsistencies are data
    /// bugs; loading aborts rather than limping along.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for recipe in &self.recipes {
            if !self.items.contains_key(&recipe.product) {
                return Err(CatalogError::UnknownProduct(recipe.id, recipe.product));
            }
            for mat in &recipe.materials {
                if !self.items.contains_key(&mat.item) {
                    return Err(CatalogError::UnknownMaterial(recipe.id, mat.item));
                }
            }
            if let Some(b) = recipe.required_building {
                if !self.blueprints.contains_key(&b) {
                    return Err(CatalogError::UnknownWorkshop(recipe.id, b));
                }
            }
        }
        for bp in self.blueprints.values() {
            for mat in &bp.materials {
                if !self.items.contains_key(&mat.item) {
                    return Err(CatalogError::UnknownBlueprintMaterial(bp.id, mat.item));
                }
            }
        }
        Ok(())
    }
}

/// Optional per-item priority weights (id -> factor). Craft/Build score
/// values are re-scaled by the product of weights down the task tree.
#[derive(Debug, Clone, Default)]
pub struct PriorityWeights {
    weights: AHashMap<ItemId, f64>,
}

impl PriorityWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, item: ItemId, factor: f64) {
        self.weights.insert(item, factor);
    }

    /// Weight factor for an item; unlisted items weigh 1.0
    pub fn get(&self, item: ItemId) -> f64 {
        self.weights.get(&item).copied().unwrap_or(1.0)
    }

    pub fn load_toml(path: &std::path::Path) -> Result<Self, CatalogError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::parse_toml(&content)
    }

    pub fn parse_toml(content: &str) -> Result<Self, CatalogError> {
        let raw: TomlWeights =
            toml::from_str(content).map_err(|e| CatalogError::Parse(e.to_string()))?;
        let mut weights = Self::new();
        for w in raw.weights {
            weights.set(ItemId(w.item), w.factor);
        }
        Ok(weights)
    }
}

// --- TOML raw tables ---

#[derive(Debug, Deserialize)]
struct TomlCatalog {
    #[serde(default)]
    items: Vec<TomlItem>,
    #[serde(default)]
    recipes: Vec<TomlRecipe>,
    #[serde(default)]
    buildings: Vec<TomlBuilding>,
    #[serde(default)]
    resource_points: Vec<TomlResourcePoint>,
}

#[derive(Debug, Deserialize)]
struct TomlItem {
    id: u32,
    name: String,
    #[serde(default)]
    resource: bool,
    #[serde(default)]
    building: u32,
}

#[derive(Debug, Deserialize)]
struct TomlRecipe {
    id: u32,
    product: u32,
    #[serde(default = "one")]
    quantity: u32,
    time: u32,
    #[serde(default)]
    building: u32,
    materials: Vec<TomlMaterial>,
}

#[derive(Debug, Deserialize)]
struct TomlBuilding {
    id: u32,
    name: String,
    time: u32,
    materials: Vec<TomlMaterial>,
}

#[derive(Debug, Deserialize)]
struct TomlMaterial {
    item: u32,
    qty: u32,
}

#[derive(Debug, Deserialize)]
struct TomlResourcePoint {
    item: String,
    #[serde(default = "thousand")]
    initial: u32,
    #[serde(default = "eight")]
    count: u32,
}

#[derive(Debug, Deserialize)]
struct TomlWeights {
    weights: Vec<TomlWeight>,
}

#[derive(Debug, Deserialize)]
struct TomlWeight {
    item: u32,
    factor: f64,
}

fn one() -> u32 {
    1
}

fn thousand() -> u32 {
    1000
}

fn eight() -> u32 {
    8
}
