//! Sea layer: contiguous bodies of water below the sea threshold.

use log::debug;

use crate::grid::Grid;
use crate::layers::Layer;
use crate::params::WorldParams;

/// Threshold every cell against the sea level, then label the connected
/// bodies and merge the ones below the minimum size back into land.
pub fn generate(layer: &mut Layer, heightmap: &Grid<u8>, params: &WorldParams) {
    for (x, y, &h) in heightmap.cells() {
        layer.grid.set(x, y, if h <= params.sea_threshold { 1 } else { 0 });
    }

    let n_labels = layer.grid.label_segments(params.min_sea_size);
    debug!(
        "sea: {} candidate bodies, {} cells kept",
        n_labels,
        layer.grid.nonzero().count()
    );
}
