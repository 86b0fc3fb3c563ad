//! Random world generation - the initial WorldState the core consumes
//!
//! Places a pre-built storage near the map center, one construction site
//! per catalog blueprint, and the templated resource points, all with a
//! minimum spacing so nothing overlaps. Deterministic given a seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::catalog::Catalog;
use crate::core::types::{BuildingId, Pos, ResourcePointId};
use crate::world::building::BuildingSite;
use crate::world::resource_point::ResourcePoint;
use crate::world::state::WorldState;

/// Distance kept from the map border
const MARGIN: i32 = 60;
/// Minimum spacing between any two placed features
const MIN_SPACING: i32 = 60;
/// Placement attempts before a feature is skipped
const MAX_ATTEMPTS: u32 = 1000;

/// Reserved id for the pre-built storage building
pub const STORAGE_BUILDING_ID: BuildingId = BuildingId(256);

#[derive(Debug, Clone)]
pub struct WorldGenParams {
    pub width: i32,
    pub height: i32,
    pub seed: u64,
}

impl Default for WorldGenParams {
    fn default() -> Self {
        Self {
            width: 2000,
            height: 2000,
            seed: 42,
        }
    }
}

/// Generate the initial world from the catalog
pub fn generate_world(catalog: &Catalog, params: &WorldGenParams) -> WorldState {
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let mut world = WorldState::new();
    let mut occupied: Vec<Pos> = Vec::new();

    // Storage sits near the center, already complete
    let center = Pos::new(params.width / 2, params.height / 2);
    let storage_pos = Pos::new(
        (center.x + rng.gen_range(-30..=30)).clamp(MARGIN, params.width - MARGIN),
        (center.y + rng.gen_range(-30..=30)).clamp(MARGIN, params.height - MARGIN),
    );
    world.add_building(BuildingSite::pre_built(
        STORAGE_BUILDING_ID,
        "Storage",
        storage_pos,
    ));
    occupied.push(storage_pos);

    // One construction site per blueprint, sorted by id for determinism
    let mut blueprints: Vec<_> = catalog.blueprints().collect();
    blueprints.sort_by_key(|bp| bp.id);
    for bp in blueprints {
        if let Some(pos) = place(&mut rng, params, &occupied) {
            world.add_building(BuildingSite::from_blueprint(bp, pos));
            occupied.push(pos);
        } else {
            tracing::warn!(building = bp.id.0, "no room to place construction site");
        }
    }

    // Templated resource points
    let mut next_rp = 1u32;
    for template in catalog.resource_templates() {
        for _ in 0..template.count {
            let Some(pos) = place(&mut rng, params, &occupied) else {
                tracing::warn!(item = template.item.0, "no room to place resource point");
                continue;
            };
            world.add_resource_point(ResourcePoint::new(
                ResourcePointId(next_rp),
                template.item,
                pos,
                template.initial,
            ));
            occupied.push(pos);
            next_rp += 1;
        }
    }

    world
}

fn place(rng: &mut ChaCha8Rng, params: &WorldGenParams, occupied: &[Pos]) -> Option<Pos> {
    for _ in 0..MAX_ATTEMPTS {
        let pos = Pos::new(
            rng.gen_range(MARGIN..=params.width - MARGIN),
            rng.gen_range(MARGIN..=params.height - MARGIN),
        );
        if occupied.iter().all(|&o| o.manhattan(pos) >= MIN_SPACING) {
            return Some(pos);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ItemId;

    #[test]
    fn test_generation_is_deterministic() {
        let catalog = Catalog::with_defaults();
        let params = WorldGenParams::default();
        let a = generate_world(&catalog, &params);
        let b = generate_world(&catalog, &params);

        let mut pos_a: Vec<_> = a.resource_points().map(|rp| (rp.id, rp.pos)).collect();
        let mut pos_b: Vec<_> = b.resource_points().map(|rp| (rp.id, rp.pos)).collect();
        pos_a.sort_by_key(|&(id, _)| id);
        pos_b.sort_by_key(|&(id, _)| id);
        assert_eq!(pos_a, pos_b);
    }

    #[test]
    fn test_storage_is_seeded_complete() {
        let catalog = Catalog::with_defaults();
        let world = generate_world(&catalog, &WorldGenParams::default());
        let storage = world.building(STORAGE_BUILDING_ID).unwrap();
        assert!(storage.completed);
        // Blueprint sites start incomplete
        assert!(!world.building(BuildingId(1)).unwrap().completed);
    }

    #[test]
    fn test_resource_points_follow_templates() {
        let catalog = Catalog::with_defaults();
        let world = generate_world(&catalog, &WorldGenParams::default());
        let logs = world
            .resource_points()
            .filter(|rp| rp.item == ItemId(1))
            .count();
        assert_eq!(logs, 8);
        assert!(world.resource_points().all(|rp| rp.remaining == 1000));
    }

    #[test]
    fn test_features_respect_spacing() {
        let catalog = Catalog::with_defaults();
        let world = generate_world(&catalog, &WorldGenParams::default());
        let positions: Vec<_> = world
            .resource_points()
            .map(|rp| rp.pos)
            .chain(world.buildings().map(|b| b.pos))
            .collect();
        for (i, a) in positions.iter().enumerate() {
            for b in positions.iter().skip(i + 1) {
                assert!(a.manhattan(*b) >= MIN_SPACING);
            }
        }
    }
}
