//! Road layer: weighted shortest paths between sampled city pairs.
//!
//! A movement-cost field is derived from the sea, biome and river layers;
//! sea is impassable and rivers can only be crossed where they run
//! straight (a bridge). Each routed pair runs a single-source search with
//! a dynamic elevation penalty and a flat discount for re-using existing
//! road cells, then walks the distance field back downhill to lay the
//! road. Pairs with no finite-cost path are dropped.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::debug;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::grid::Grid;
use crate::layers::biome::{BIOME_DESERT, BIOME_FOREST};
use crate::layers::{City, Layer};
use crate::params::WorldParams;
use crate::tiles::line;

/// Node for the search's priority queue.
#[derive(Clone, Copy)]
struct PathNode {
    x: usize,
    y: usize,
    cost: f32,
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}

impl Eq for PathNode {}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior.
        other.cost.partial_cmp(&self.cost).unwrap_or(Ordering::Equal)
    }
}

#[allow(clippy::too_many_arguments)]
pub fn generate(
    layer: &mut Layer,
    sea: &Layer,
    river: &Layer,
    biome: &Layer,
    heightmap: &Grid<u8>,
    cities: &[City],
    params: &WorldParams,
    seed: u64,
) {
    if cities.len() < 2 {
        return;
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let weights = movement_weights(sea, river, biome, params);

    // Uniform unordered pairs without replacement.
    let mut pairs: Vec<(usize, usize)> = Vec::new();
    for i in 0..cities.len() {
        for j in i + 1..cities.len() {
            pairs.push((i, j));
        }
    }
    pairs.shuffle(&mut rng);

    let mut routed = 0usize;
    let n_pairs = cities.len() / 2;
    for &(i, j) in pairs.iter().take(n_pairs) {
        let a = (cities[i].x as usize, cities[i].y as usize);
        let b = (cities[j].x as usize, cities[j].y as usize);
        if route(&mut layer.grid, &weights, heightmap, a, b, params) {
            routed += 1;
        } else {
            debug!("road: no path between city {} and city {}", cities[i].id, cities[j].id);
        }
    }
    debug!("road: {routed} of {n_pairs} pairs connected");
}

/// Static per-cell movement cost. Sea cells and unbridgeable river cells
/// are infinite.
fn movement_weights(sea: &Layer, river: &Layer, biome: &Layer, params: &WorldParams) -> Grid<f32> {
    let dim = sea.grid.dim();
    let river_tiles = river.tiles.as_ref();
    let mut weights = Grid::new_with(dim, 1.0f32);

    for y in 0..dim {
        for x in 0..dim {
            if *sea.grid.get(x, y) != 0 {
                weights.set(x, y, f32::INFINITY);
                continue;
            }

            let mut w = 1.0f32;
            match *biome.grid.get(x, y) {
                BIOME_DESERT => w += params.mp_penalty_desert,
                BIOME_FOREST => w += params.mp_penalty_forest,
                _ => {}
            }

            if *river.grid.get(x, y) != 0 {
                let bridgeable = river_tiles
                    .map(|t| {
                        let tile = *t.get(x, y);
                        tile == line::STRAIGHT_NS || tile == line::STRAIGHT_WE
                    })
                    .unwrap_or(false);
                w = if bridgeable { params.mp_bridge } else { f32::INFINITY };
            }

            weights.set(x, y, w);
        }
    }

    weights
}

/// Route one city pair. Returns false when the end is unreachable.
fn route(
    road: &mut Grid<u8>,
    weights: &Grid<f32>,
    heightmap: &Grid<u8>,
    start: (usize, usize),
    end: (usize, usize),
    params: &WorldParams,
) -> bool {
    let dim = road.dim();
    let mut dist = Grid::new_with(dim, f32::INFINITY);
    let mut heap = BinaryHeap::new();

    dist.set(start.0, start.1, 0.0);
    heap.push(PathNode { x: start.0, y: start.1, cost: 0.0 });

    while let Some(PathNode { x, y, cost }) = heap.pop() {
        if cost > *dist.get(x, y) {
            continue;
        }
        if (x, y) == end {
            break;
        }

        let from_height = *heightmap.get(x, y) as f32;
        for (nx, ny) in road.neighbors4(x, y) {
            let step = if *road.get(nx, ny) == 1 {
                params.mp_road
            } else {
                let w = *weights.get(nx, ny);
                if !w.is_finite() {
                    continue;
                }
                let delta = (from_height - *heightmap.get(nx, ny) as f32).abs();
                w + params.mp_penalty_elev * delta
            };

            let next = cost + step;
            if next < *dist.get(nx, ny) {
                dist.set(nx, ny, next);
                heap.push(PathNode { x: nx, y: ny, cost: next });
            }
        }
    }

    if !dist.get(end.0, end.1).is_finite() {
        return false;
    }

    // Greedy descent over the distance field back to the start.
    let (mut x, mut y) = end;
    road.set(x, y, 1);
    while (x, y) != start {
        let here = *dist.get(x, y);
        let mut best: Option<(usize, usize, f32)> = None;
        for (nx, ny) in dist.neighbors4(x, y) {
            let d = *dist.get(nx, ny);
            if d < here && best.map(|(_, _, bd)| d < bd).unwrap_or(true) {
                best = Some((nx, ny, d));
            }
        }
        match best {
            Some((nx, ny, _)) => {
                x = nx;
                y = ny;
                road.set(x, y, 1);
            }
            None => break,
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::LayerKind;

    fn empty(kind: LayerKind, dim: usize) -> Layer {
        Layer::new(kind, dim)
    }

    fn city(id: u32, x: u32, y: u32) -> City {
        City { id, x, y }
    }

    fn flat_route(dim: usize, cities: &[City]) -> Layer {
        let sea = empty(LayerKind::Sea, dim);
        let river = empty(LayerKind::River, dim);
        let biome = empty(LayerKind::Biome, dim);
        let hm = Grid::new_with(dim, 128u8);
        let mut layer = empty(LayerKind::Road, dim);
        generate(&mut layer, &sea, &river, &biome, &hm, cities, &WorldParams::default(), 5);
        layer
    }

    #[test]
    fn test_single_pair_gets_a_connected_road() {
        let cities = [city(0, 2, 2), city(1, 20, 2)];
        let layer = flat_route(32, &cities);

        assert_eq!(*layer.grid.get(2, 2), 1);
        assert_eq!(*layer.grid.get(20, 2), 1);
        // On flat ground the shortest path has Manhattan length.
        assert_eq!(layer.grid.nonzero().count(), 19);
    }

    #[test]
    fn test_road_avoids_sea() {
        let dim = 32;
        let mut sea = empty(LayerKind::Sea, dim);
        // A sea bar across the middle with a land gap at y = 30.
        for y in 0..30 {
            sea.grid.set(15, y, 1);
        }
        let river = empty(LayerKind::River, dim);
        let biome = empty(LayerKind::Biome, dim);
        let hm = Grid::new_with(dim, 128u8);
        let mut layer = empty(LayerKind::Road, dim);
        let cities = [city(0, 2, 2), city(1, 28, 2)];
        generate(&mut layer, &sea, &river, &biome, &hm, &cities, &WorldParams::default(), 5);

        assert_eq!(*layer.grid.get(2, 2), 1);
        assert_eq!(*layer.grid.get(28, 2), 1);
        for (x, y, &v) in layer.grid.nonzero() {
            assert_eq!(v, 1);
            assert_eq!(*sea.grid.get(x, y), 0, "road crosses sea at ({x}, {y})");
        }
    }

    #[test]
    fn test_unreachable_pair_is_dropped() {
        let dim = 32;
        let mut sea = empty(LayerKind::Sea, dim);
        // A full sea wall.
        for y in 0..dim {
            sea.grid.set(15, y, 1);
        }
        let river = empty(LayerKind::River, dim);
        let biome = empty(LayerKind::Biome, dim);
        let hm = Grid::new_with(dim, 128u8);
        let mut layer = empty(LayerKind::Road, dim);
        let cities = [city(0, 2, 2), city(1, 28, 2)];
        generate(&mut layer, &sea, &river, &biome, &hm, &cities, &WorldParams::default(), 5);

        assert_eq!(layer.grid.nonzero().count(), 0);
    }

    #[test]
    fn test_river_crossed_only_at_straight_sections() {
        let dim = 32;
        let sea = empty(LayerKind::Sea, dim);
        let mut river = empty(LayerKind::River, dim);
        let mut tiles = Grid::new_with(dim, 0u64);
        // A north-south river; one cell is classified straight, the rest
        // are corners and unbridgeable.
        for y in 0..dim {
            river.grid.set(15, y, 1);
            tiles.set(15, y, line::CORNER_NE);
        }
        tiles.set(15, 10, line::STRAIGHT_NS);
        river.tiles = Some(tiles);

        let biome = empty(LayerKind::Biome, dim);
        let hm = Grid::new_with(dim, 128u8);
        let mut layer = empty(LayerKind::Road, dim);
        let cities = [city(0, 2, 10), city(1, 28, 10)];
        generate(&mut layer, &sea, &river, &biome, &hm, &cities, &WorldParams::default(), 5);

        assert_eq!(*layer.grid.get(15, 10), 1);
        for (x, y, _) in layer.grid.nonzero() {
            if *river.grid.get(x, y) != 0 {
                assert_eq!((x, y), (15, 10), "road crosses river off the bridge");
            }
        }
    }

    #[test]
    fn test_fewer_than_two_cities_builds_nothing() {
        let layer = flat_route(16, &[city(0, 3, 3)]);
        assert_eq!(layer.grid.nonzero().count(), 0);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let cities: Vec<City> =
            (0..6).map(|i| city(i, 4 + (i as u32 % 3) * 10, 4 + (i as u32 / 3) * 12)).collect();
        let a = flat_route(32, &cities);
        let b = flat_route(32, &cities);
        assert_eq!(a.grid, b.grid);
    }
}
