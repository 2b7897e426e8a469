//! World save/load as a versioned binary blob.
//!
//! The blob carries the seed, the dimension, the stacked layer kinds in
//! order and every grid's raw cell array, so a consumer can either read
//! the grids directly or regenerate the identical world from the seed.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GenError;
use crate::grid::Grid;
use crate::layers::{City, LayerKind};
use crate::world::World;

const SAVE_VERSION: u32 = 1;

/// On-disk layout. Grids are row-major cell arrays: `u8` for layer labels,
/// `u64` for classification archetype ids.
#[derive(Serialize, Deserialize)]
struct SaveFile {
    version: u32,
    seed: i64,
    dim: u32,
    kinds: Vec<LayerKind>,
    height_cells: Vec<u8>,
    layers: Vec<SavedLayer>,
    cities: Vec<City>,
}

#[derive(Serialize, Deserialize)]
struct SavedLayer {
    kind: LayerKind,
    cells: Vec<u8>,
    tiles: Option<Vec<u64>>,
}

/// Write a world to `path`.
pub fn save_world(world: &World, path: &Path) -> Result<(), GenError> {
    let kinds = world.layer_kinds();
    let layers = kinds
        .iter()
        .map(|&kind| {
            let layer = world.layer(kind).expect("stacked kind is present");
            SavedLayer {
                kind,
                cells: layer.grid.to_vec(),
                tiles: layer.tiles.as_ref().map(|t| t.to_vec()),
            }
        })
        .collect();

    let save = SaveFile {
        version: SAVE_VERSION,
        seed: world.seed(),
        dim: world.dim() as u32,
        kinds,
        height_cells: world.heights().to_vec(),
        layers,
        cities: world.cities().to_vec(),
    };

    let bytes = bincode::serialize(&save).map_err(|e| GenError::Codec(e.to_string()))?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Read a world back from `path`.
pub fn load_world(path: &Path) -> Result<World, GenError> {
    let bytes = fs::read(path)?;
    let save: SaveFile =
        bincode::deserialize(&bytes).map_err(|e| GenError::Codec(e.to_string()))?;

    if save.version != SAVE_VERSION {
        return Err(GenError::Codec(format!(
            "unsupported save version {} (expected {})",
            save.version, SAVE_VERSION
        )));
    }

    let dim = save.dim as usize;
    let n_cells = dim * dim;
    if save.height_cells.len() != n_cells {
        return Err(GenError::Codec("height grid size mismatch".into()));
    }
    for layer in &save.layers {
        if layer.cells.len() != n_cells
            || layer.tiles.as_ref().map(|t| t.len() != n_cells).unwrap_or(false)
        {
            return Err(GenError::Codec(format!("layer {} grid size mismatch", layer.kind.name())));
        }
    }

    let heightmap = Grid::from_vec(dim, save.height_cells);
    let mut world = World::from_parts(save.seed, save.dim, &save.kinds, heightmap, save.cities)?;
    for layer in save.layers {
        world.stack_mut().restore(
            layer.kind,
            Grid::from_vec(dim, layer.cells),
            layer.tiles.map(|t| Grid::from_vec(dim, t)),
        );
    }
    Ok(world)
}
