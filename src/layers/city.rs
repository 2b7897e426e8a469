//! City layer: scored settlement placement with a separation pass.
//!
//! Cities prefer:
//! - proximity to fresh water and the coast (trade and fishing)
//! - land components large enough to support a population
//! - open terrain over desert and forest
//!
//! Sampling is weighted by score; the cumulative weights are built in
//! row-major candidate order so the draw sequence is reproducible. A final
//! pass clears any city that crowds an earlier one.

use log::debug;
use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::layers::biome::{BIOME_DESERT, BIOME_FOREST};
use crate::layers::Layer;
use crate::params::WorldParams;

/// A founded city.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: u32,
    pub x: u32,
    pub y: u32,
}

const SCORE_BASE: f64 = 1.0;
const SCORE_NEAR_RIVER: f64 = 3.0;
const SCORE_NEAR_SEA: f64 = 3.0;
const SCORE_ON_DESERT: f64 = -0.9;
const SCORE_ON_FOREST: f64 = -0.5;

pub fn generate(
    layer: &mut Layer,
    sea: &Layer,
    river: &Layer,
    biome: &Layer,
    params: &WorldParams,
    seed: u64,
) -> Vec<City> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let dim = layer.grid.dim();

    // Land components big enough to support settlement, minus river beds.
    let mut support = Grid::new_with(dim, 0u8);
    for (x, y, &v) in sea.grid.cells() {
        support.set(x, y, (v == 0) as u8);
    }
    support.label_segments(params.min_popsupport_size);
    for (x, y, &v) in river.grid.cells() {
        if v != 0 {
            support.set(x, y, 0);
        }
    }

    let mut candidates: Vec<(usize, usize)> = Vec::new();
    let mut weights: Vec<f64> = Vec::new();
    for (x, y, &v) in support.cells() {
        if v == 0 {
            continue;
        }
        candidates.push((x, y));
        weights.push(score_cell(x, y, sea, river, biome));
    }

    let n_cities = (candidates.len() as f64 * params.city_density) as usize;
    if n_cities > 0 {
        if let Ok(sampler) = WeightedIndex::new(&weights) {
            // Draws may repeat a cell; the write collapses duplicates.
            for _ in 0..n_cities {
                let (x, y) = candidates[sampler.sample(&mut rng)];
                layer.grid.set(x, y, 1);
            }
        }
    }

    let cities = separate(layer, params);
    debug!("city: {} of {} sampled sites kept", cities.len(), n_cities);
    cities
}

fn score_cell(x: usize, y: usize, sea: &Layer, river: &Layer, biome: &Layer) -> f64 {
    let mut score = SCORE_BASE;

    if river.grid.neighbors8(x, y).any(|(nx, ny)| *river.grid.get(nx, ny) != 0) {
        score += SCORE_NEAR_RIVER;
    }
    if sea.grid.neighbors8(x, y).any(|(nx, ny)| *sea.grid.get(nx, ny) != 0) {
        score += SCORE_NEAR_SEA;
    }
    match *biome.grid.get(x, y) {
        BIOME_DESERT => score += SCORE_ON_DESERT,
        BIOME_FOREST => score += SCORE_ON_FOREST,
        _ => {}
    }

    score
}

/// Walk city cells in row-major order and clear every later city inside the
/// disallow radius of an earlier one, then number the survivors.
fn separate(layer: &mut Layer, params: &WorldParams) -> Vec<City> {
    let dim = layer.grid.dim();
    let min_distance = params.city_min_distance(dim);

    let cells: Vec<(usize, usize)> = layer.grid.nonzero().map(|(x, y, _)| (x, y)).collect();
    let mut alive = vec![true; cells.len()];

    for a in 0..cells.len() {
        if !alive[a] {
            continue;
        }
        for b in 0..cells.len() {
            if a == b || !alive[b] {
                continue;
            }
            if distance(cells[a], cells[b]) < min_distance {
                alive[b] = false;
            }
        }
    }

    layer.grid.fill(0);
    let mut cities = Vec::new();
    for (&(x, y), _) in cells.iter().zip(alive.iter()).filter(|(_, &a)| a) {
        layer.grid.set(x, y, 1);
        cities.push(City { id: cities.len() as u32, x: x as u32, y: y as u32 });
    }
    cities
}

fn distance(a: (usize, usize), b: (usize, usize)) -> f64 {
    let dx = a.0 as f64 - b.0 as f64;
    let dy = a.1 as f64 - b.1 as f64;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::LayerKind;

    fn empty(kind: LayerKind, dim: usize) -> Layer {
        Layer::new(kind, dim)
    }

    fn run_on_plain(dim: usize, seed: u64) -> (Layer, Vec<City>) {
        let sea = empty(LayerKind::Sea, dim);
        let river = empty(LayerKind::River, dim);
        let biome = empty(LayerKind::Biome, dim);
        let mut layer = empty(LayerKind::City, dim);
        let cities = generate(&mut layer, &sea, &river, &biome, &WorldParams::default(), seed);
        (layer, cities)
    }

    #[test]
    fn test_cities_are_founded_and_deterministic() {
        let (a, ca) = run_on_plain(64, 17);
        let (b, cb) = run_on_plain(64, 17);
        assert_eq!(a.grid, b.grid);
        assert_eq!(ca, cb);
        assert!(!ca.is_empty());
    }

    #[test]
    fn test_city_records_match_grid_cells() {
        let (layer, cities) = run_on_plain(64, 23);
        assert_eq!(layer.grid.nonzero().count(), cities.len());
        for city in &cities {
            assert_eq!(*layer.grid.get(city.x as usize, city.y as usize), 1);
        }
        // Ids number the row-major order.
        for (i, city) in cities.iter().enumerate() {
            assert_eq!(city.id, i as u32);
        }
    }

    #[test]
    fn test_separation_invariant_holds() {
        let (_, cities) = run_on_plain(64, 31);
        let params = WorldParams::default();
        let min_distance = params.city_min_distance(64);

        for a in &cities {
            for b in &cities {
                if a.id == b.id {
                    continue;
                }
                let d = distance((a.x as usize, a.y as usize), (b.x as usize, b.y as usize));
                assert!(d >= min_distance, "cities {} and {} are {d:.2} apart", a.id, b.id);
            }
        }
    }

    #[test]
    fn test_earlier_city_survives_the_separation_pass() {
        let params = WorldParams::default();
        let mut layer = empty(LayerKind::City, 64);
        layer.grid.set(10, 10, 1);
        layer.grid.set(12, 10, 1); // too close, later in row-major order
        layer.grid.set(40, 40, 1);

        let cities = separate(&mut layer, &params);
        assert_eq!(cities.len(), 2);
        assert_eq!((cities[0].x, cities[0].y), (10, 10));
        assert_eq!((cities[1].x, cities[1].y), (40, 40));
        assert_eq!(*layer.grid.get(12, 10), 0);
    }

    #[test]
    fn test_no_cities_on_rivers() {
        let sea = empty(LayerKind::Sea, 64);
        let mut river = empty(LayerKind::River, 64);
        for y in 0..64 {
            river.grid.set(20, y, 1);
        }
        let biome = empty(LayerKind::Biome, 64);
        let mut layer = empty(LayerKind::City, 64);
        let cities = generate(&mut layer, &sea, &river, &biome, &WorldParams::default(), 3);

        for city in &cities {
            assert_ne!(city.x, 20);
        }
    }

    #[test]
    fn test_small_islands_support_no_city() {
        // Everything is sea except a 3x3 island below the support size.
        let mut sea = empty(LayerKind::Sea, 32);
        for (x, y) in (0..32).flat_map(|y| (0..32).map(move |x| (x, y))) {
            sea.grid.set(x, y, 1);
        }
        for y in 10..13 {
            for x in 10..13 {
                sea.grid.set(x, y, 0);
            }
        }
        let river = empty(LayerKind::River, 32);
        let biome = empty(LayerKind::Biome, 32);
        let mut layer = empty(LayerKind::City, 32);
        let cities = generate(&mut layer, &sea, &river, &biome, &WorldParams::default(), 5);
        assert!(cities.is_empty());
    }
}
