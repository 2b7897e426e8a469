//! River layer: downhill walks from sampled mountain sources.
//!
//! Each source grows one river with a fresh id. A walk ends when it enters
//! the sea (the sea cell is marked with the river id, which the delta layer
//! later consumes), or when it touches a different river (convergence; the
//! ids are left distinct). A walk that runs out of usable neighbors erases
//! its own cells and the source counts as failed.

use log::debug;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::GenError;
use crate::grid::{Flow, Grid};
use crate::layers::Layer;
use crate::params::WorldParams;

/// River ids live in a u8 cell, so a generation run caps out here.
pub const MAX_RIVERS: usize = 255;

pub fn generate(
    layer: &mut Layer,
    sea: &Layer,
    heightmap: &Grid<u8>,
    params: &WorldParams,
    seed: u64,
) -> Result<(), GenError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    // Every cell at or above the mountain threshold is a potential source.
    let mut sources: Vec<(usize, usize)> = heightmap
        .cells()
        .filter(|&(_, _, &h)| h >= params.mountain_threshold)
        .map(|(x, y, _)| (x, y))
        .collect();

    if sources.is_empty() {
        debug!("river: no mountain cells, nothing to do");
        return Ok(());
    }

    sources.shuffle(&mut rng);

    let mut wanted = (sources.len() as f64 * params.river_density) as usize;
    if wanted < params.min_river_sources {
        wanted = params.min_river_sources.min(sources.len());
    }

    let capacity_hit = wanted > MAX_RIVERS;
    let taken = wanted.min(MAX_RIVERS);

    let mut grown = 0usize;
    for (i, &(x, y)) in sources[..taken].iter().enumerate() {
        let river_id = (i + 1) as u8;
        if grow_river(&mut layer.grid, &sea.grid, heightmap, x, y, river_id, &mut rng) {
            grown += 1;
        }
    }
    debug!("river: {grown} of {taken} sources grew into rivers");

    if capacity_hit {
        Err(GenError::Capacity { limit: MAX_RIVERS as u32 })
    } else {
        Ok(())
    }
}

/// Walk one river from `(x, y)`. Returns whether the river survived.
fn grow_river(
    river: &mut Grid<u8>,
    sea: &Grid<u8>,
    heightmap: &Grid<u8>,
    mut x: usize,
    mut y: usize,
    river_id: u8,
    rng: &mut ChaCha8Rng,
) -> bool {
    // The source and its edge neighbors must be untouched by any river.
    if *river.get(x, y) != 0 {
        return false;
    }
    let clear = river.visit_neighbors4(x, y, |nx, ny| {
        if *river.get(nx, ny) != 0 { Flow::Stop } else { Flow::Continue }
    });
    if !clear {
        return false;
    }

    loop {
        if *sea.get(x, y) != 0 {
            // Terminus marker on the sea cell.
            river.set(x, y, river_id);
            return true;
        }
        if is_converging(river, x, y, river_id) {
            river.set(x, y, river_id);
            return true;
        }
        river.set(x, y, river_id);

        // A neighbor qualifies if it is not ours already and touches at
        // most one of our cells (that one being the current cell). Other
        // river ids do not count here, which is what lets walks meet.
        let mut candidates: Vec<(usize, usize)> = Vec::with_capacity(4);
        for (nx, ny) in river.neighbors4(x, y) {
            if *river.get(nx, ny) == river_id {
                continue;
            }
            let mut own_neighbors = 0;
            river.visit_neighbors4(nx, ny, |cx, cy| {
                if *river.get(cx, cy) == river_id {
                    own_neighbors += 1;
                }
                Flow::Continue
            });
            if own_neighbors <= 1 {
                candidates.push((nx, ny));
            }
        }

        // Shuffle, then stable-sort by elevation: the lowest neighbor wins
        // and ties break uniformly at random.
        candidates.shuffle(rng);
        candidates.sort_by_key(|&(cx, cy)| *heightmap.get(cx, cy));

        match candidates.first() {
            Some(&(nx, ny)) => {
                x = nx;
                y = ny;
            }
            None => {
                erase_river(river, river_id);
                return false;
            }
        }
    }
}

/// Does any edge neighbor belong to a different river?
fn is_converging(river: &Grid<u8>, x: usize, y: usize, river_id: u8) -> bool {
    !river.visit_neighbors4(x, y, |nx, ny| {
        let v = *river.get(nx, ny);
        if v != 0 && v != river_id { Flow::Stop } else { Flow::Continue }
    })
}

fn erase_river(river: &mut Grid<u8>, river_id: u8) {
    let dim = river.dim();
    for y in 0..dim {
        for x in 0..dim {
            if *river.get(x, y) == river_id {
                river.set(x, y, 0);
            }
        }
    }
}
