//! Biome layer: forest and desert patches on mid-elevation land.
//!
//! Candidate cells sit strictly between the sea and mountain bands, away
//! from water: never on a river or sea cell and never within one cell of
//! the sea (no beach biomes). Each surviving patch is painted wholly
//! forest or wholly desert.

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::grid::Grid;
use crate::layers::Layer;
use crate::params::WorldParams;

pub const BIOME_FOREST: u8 = 1;
pub const BIOME_DESERT: u8 = 2;

/// 3x3 summing kernel.
const BOX_KERNEL: [[i32; 3]; 3] = [[1, 1, 1], [1, 1, 1], [1, 1, 1]];

pub fn generate(
    layer: &mut Layer,
    sea: &Layer,
    river: &Layer,
    heightmap: &Grid<u8>,
    params: &WorldParams,
    seed: u64,
) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let lo = params.sea_threshold as i32 + params.biome_h_delta as i32;
    let hi = params.mountain_threshold as i32 - params.biome_h_delta as i32;

    let sea_around = sea.grid.convolve3x3(BOX_KERNEL);

    for (x, y, &h) in heightmap.cells() {
        let candidate = (h as i32) > lo
            && (h as i32) < hi
            && *river.grid.get(x, y) == 0
            && *sea_around.get(x, y) == 0;
        layer.grid.set(x, y, candidate as u8);
    }

    let n_labels = layer.grid.label_segments(params.min_biome_size);

    // Collect each surviving patch before rewriting: the biome values
    // share the low id range with the labels.
    let mut patches: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n_labels + 1];
    for (x, y, &label) in layer.grid.nonzero() {
        patches[label as usize].push((x, y));
    }

    let mut painted = 0usize;
    for cells in patches.iter().skip(1) {
        if cells.is_empty() {
            continue;
        }
        let biome = if rng.gen_range(0..2) == 0 { BIOME_FOREST } else { BIOME_DESERT };
        for &(x, y) in cells {
            layer.grid.set(x, y, biome);
        }
        painted += 1;
    }

    debug!("biome: {painted} patches painted out of {n_labels} candidates");
}
