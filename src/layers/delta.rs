//! Delta layer: the transition zone where rivers enter the sea.
//!
//! This is the one generator that rewrites earlier layers: the sea-side
//! transition cells lose their river marker (and its classification), so a
//! river visibly ends in a mouth instead of running into open water.

use log::debug;

use crate::classify::{DELTA_RIVER, DELTA_SEA};
use crate::layers::Layer;
use crate::tiles::common;

/// 4-neighbor counting kernel.
const EDGE_KERNEL: [[i32; 3]; 3] = [[0, 1, 0], [1, 0, 1], [0, 1, 0]];

pub fn generate(layer: &mut Layer, sea: &mut Layer, river: &mut Layer) {
    let dim = layer.grid.dim();

    // Sea-side transition: every cell that is both sea and river carries
    // the marker a finished walk left behind.
    for y in 0..dim {
        for x in 0..dim {
            if *sea.grid.get(x, y) != 0 && *river.grid.get(x, y) != 0 {
                layer.grid.set(x, y, DELTA_SEA);
                river.grid.set(x, y, 0);
                if let Some(tiles) = river.tiles.as_mut() {
                    tiles.set(x, y, common::EMPTY);
                }
            }
        }
    }

    // River-side transition: river cells bordering a sea-side cell.
    let adjacency = layer.grid.convolve3x3(EDGE_KERNEL);
    for y in 0..dim {
        for x in 0..dim {
            if *river.grid.get(x, y) != 0 && *adjacency.get(x, y) > 0 {
                layer.grid.set(x, y, DELTA_RIVER);
            }
        }
    }

    debug!("delta: {} transition cells", layer.grid.nonzero().count());
}
