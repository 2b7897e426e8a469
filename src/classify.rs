//! Fixed-point tile classification.
//!
//! A classifier turns a layer's labeled grid into a grid of archetype ids.
//! The solid and line classifiers match 3x3 ternary templates against a
//! padded boolean working matrix and demote cells that fit no archetype;
//! demotions change neighborhoods, so passes repeat until one runs clean.
//! Classification ids always describe the final, demoted grid, which makes
//! a second run over an already-classified layer a no-op.

use crate::grid::{Grid, EDGE_OFFSETS};
use crate::tiles::{self, common, line_specs, matches, rotate_cw, solid_specs, TileSpec};

/// Marker written into a layer grid when the reversed solid classifier
/// demotes a foreground (land) cell to background.
pub const REMOVED_LAND: u8 = 0xFE;

/// Delta layer cell values, shared with the delta generator.
pub const DELTA_SEA: u8 = 1;
pub const DELTA_RIVER: u8 = 2;

/// How a layer's grid is interpreted and which archetype set applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassifierKind {
    /// Areal features; nonzero cells are the shape.
    Solid,
    /// Areal features with the shape and background swapped: nonzero cells
    /// are the background and zero cells the classified shape.
    SolidReversed,
    /// 1-cell-wide linear features.
    Line,
    /// River mouth transitions.
    Delta,
    /// Pass the cell values through unchanged.
    Simple,
}

/// Explicit configuration for the template-driven classifiers.
pub struct ClassifierConfig {
    specs: Vec<TileSpec>,
    /// Swap shape and background when reading the layer grid.
    reversed: bool,
    /// Mark fully-interior cells SOLID before template matching.
    with_solid: bool,
    /// Pad the working matrix with background instead of replicating edges.
    zero_padding: bool,
    /// Value written into the layer grid for demoted cells.
    removed_marker: u8,
}

impl ClassifierConfig {
    pub fn solid(reversed: bool) -> Self {
        Self {
            specs: solid_specs(),
            reversed,
            with_solid: true,
            zero_padding: false,
            removed_marker: if reversed { REMOVED_LAND } else { 0 },
        }
    }

    pub fn line() -> Self {
        Self {
            specs: line_specs(),
            reversed: false,
            with_solid: false,
            zero_padding: false,
            removed_marker: 0,
        }
    }
}

/// Classify a layer grid. Template classifiers may rewrite demoted cells in
/// the grid; the other kinds leave it untouched.
pub fn run(kind: ClassifierKind, grid: &mut Grid<u8>) -> Grid<u64> {
    match kind {
        ClassifierKind::Solid => classify_shapes(grid, &ClassifierConfig::solid(false)),
        ClassifierKind::SolidReversed => classify_shapes(grid, &ClassifierConfig::solid(true)),
        ClassifierKind::Line => classify_shapes(grid, &ClassifierConfig::line()),
        ClassifierKind::Delta => classify_delta(grid),
        ClassifierKind::Simple => classify_simple(grid),
    }
}

/// The template engine behind the solid and line classifiers.
pub fn classify_shapes(grid: &mut Grid<u8>, config: &ClassifierConfig) -> Grid<u64> {
    let dim = grid.dim();
    let mut work = Working::build(grid, config.reversed, config.zero_padding);
    let mut tiles = Grid::new_with(dim, common::EMPTY);

    loop {
        let mut changed = false;

        // Every pass re-derives the classification, so the returned ids
        // always describe the surviving cells.
        for y in 0..dim {
            for x in 0..dim {
                if !work.get(x, y) {
                    tiles.set(x, y, common::EMPTY);
                    continue;
                }

                let nhood = work.neighborhood(x, y);

                if config.with_solid && all_foreground(&nhood) {
                    tiles.set(x, y, tiles::solid::SOLID);
                    continue;
                }

                match match_specs(&config.specs, &nhood) {
                    Some(id) => tiles.set(x, y, id),
                    None => {
                        work.set(x, y, false);
                        tiles.set(x, y, common::EMPTY);
                        grid.set(x, y, config.removed_marker);
                        changed = true;
                    }
                }
            }
        }

        if !changed {
            break;
        }
    }

    tiles
}

/// First matching spec wins; the rotation index is added to the base id.
fn match_specs(specs: &[TileSpec], nhood: &[[bool; 3]; 3]) -> Option<u64> {
    for spec in specs {
        match spec {
            TileSpec::Sliver => {
                if is_sliver(nhood) {
                    return None;
                }
            }
            TileSpec::Template { cells, base, rotations } => {
                let mut t = *cells;
                for k in 0..*rotations {
                    if matches(&t, nhood) {
                        return Some(base + k as u64);
                    }
                    t = rotate_cw(&t);
                }
            }
        }
    }
    None
}

fn all_foreground(nhood: &[[bool; 3]; 3]) -> bool {
    nhood.iter().flatten().all(|&c| c)
}

/// A 1-cell-thick protrusion: background on both x-axis sides or both
/// y-axis sides.
fn is_sliver(nhood: &[[bool; 3]; 3]) -> bool {
    (!nhood[1][0] && !nhood[1][2]) || (!nhood[0][1] && !nhood[2][1])
}

/// Classify river mouths: each transition cell on the river side takes the
/// direction of the first adjacent transition cell on the sea side.
pub fn classify_delta(grid: &Grid<u8>) -> Grid<u64> {
    let dim = grid.dim();
    let mut tiles = Grid::new_with(dim, common::EMPTY);

    for (x, y, &v) in grid.cells() {
        if v != DELTA_RIVER {
            continue;
        }
        for (dir, &(dx, dy)) in EDGE_OFFSETS.iter().enumerate() {
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            if grid.in_bounds(nx, ny) && *grid.get(nx as usize, ny as usize) == DELTA_SEA {
                tiles.set(x, y, tiles::delta::MOUTH_N + dir as u64);
                break;
            }
        }
    }

    tiles
}

fn classify_simple(grid: &Grid<u8>) -> Grid<u64> {
    let dim = grid.dim();
    let mut tiles = Grid::new_with(dim, common::EMPTY);
    for (x, y, &v) in grid.cells() {
        tiles.set(x, y, v as u64);
    }
    tiles
}

/// Boolean working matrix with a 1-cell border.
struct Working {
    side: usize,
    cells: Vec<bool>,
}

impl Working {
    fn build(grid: &Grid<u8>, reversed: bool, zero_padding: bool) -> Self {
        let dim = grid.dim();
        let side = dim + 2;
        let mut w = Self { side, cells: vec![false; side * side] };

        for (x, y, &v) in grid.cells() {
            let fg = if reversed { v == 0 } else { v != 0 };
            w.cells[(y + 1) * side + (x + 1)] = fg;
        }

        if !zero_padding {
            // Replicate edge rows, then edge columns (corners come along).
            for x in 0..side {
                w.cells[x] = w.cells[side + x];
                w.cells[(side - 1) * side + x] = w.cells[(side - 2) * side + x];
            }
            for y in 0..side {
                w.cells[y * side] = w.cells[y * side + 1];
                w.cells[y * side + side - 1] = w.cells[y * side + side - 2];
            }
        }

        w
    }

    /// Read/write in grid coordinates (the border is addressed at -1/dim).
    #[inline]
    fn get(&self, x: usize, y: usize) -> bool {
        self.cells[(y + 1) * self.side + (x + 1)]
    }

    #[inline]
    fn set(&mut self, x: usize, y: usize, v: bool) {
        self.cells[(y + 1) * self.side + (x + 1)] = v;
    }

    fn neighborhood(&self, x: usize, y: usize) -> [[bool; 3]; 3] {
        let mut n = [[false; 3]; 3];
        for (r, row) in n.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = self.cells[(y + r) * self.side + (x + c)];
            }
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::{line, solid};

    fn block_grid(dim: usize, x0: usize, y0: usize, w: usize, h: usize) -> Grid<u8> {
        let mut g = Grid::new_with(dim, 0u8);
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                g.set(x, y, 1);
            }
        }
        g
    }

    #[test]
    fn test_solid_block_classification() {
        let mut g = block_grid(8, 2, 2, 3, 3);
        let tiles = run(ClassifierKind::Solid, &mut g);

        assert_eq!(*tiles.get(3, 3), solid::SOLID);
        assert_eq!(*tiles.get(3, 2), solid::STRAIGHT_N);
        assert_eq!(*tiles.get(4, 3), solid::STRAIGHT_E);
        assert_eq!(*tiles.get(3, 4), solid::STRAIGHT_S);
        assert_eq!(*tiles.get(2, 3), solid::STRAIGHT_W);
        assert_eq!(*tiles.get(4, 2), solid::CONVEX_NE);
        assert_eq!(*tiles.get(4, 4), solid::CONVEX_SE);
        assert_eq!(*tiles.get(2, 4), solid::CONVEX_SW);
        assert_eq!(*tiles.get(2, 2), solid::CONVEX_NW);
    }

    #[test]
    fn test_concave_inner_corner() {
        // An L shape: 3x3 block plus a 3x3 block to its east-south, meeting
        // at a concave corner.
        let mut g = block_grid(10, 1, 1, 6, 3);
        for y in 4..7 {
            for x in 4..7 {
                g.set(x, y, 1);
            }
        }
        let tiles = run(ClassifierKind::Solid, &mut g);

        // The cell north-west of the notch wraps around the empty diagonal.
        assert_eq!(*tiles.get(4, 3), solid::CONCAVE_SW);
    }

    #[test]
    fn test_sliver_rows_are_removed() {
        let mut g = block_grid(8, 2, 4, 3, 1);
        let tiles = run(ClassifierKind::Solid, &mut g);

        for (_, _, &t) in tiles.cells() {
            assert_eq!(t, common::EMPTY);
        }
        assert!(g.cells().all(|(_, _, &v)| v == 0));
    }

    #[test]
    fn test_reversed_mode_marks_removed_land() {
        // Sea everywhere except a 1-wide land sliver; land is the shape.
        let mut g = Grid::new_with(8, 3u8);
        for y in 2..5 {
            g.set(4, y, 0);
        }
        let tiles = run(ClassifierKind::SolidReversed, &mut g);

        assert_eq!(*g.get(4, 2), REMOVED_LAND);
        assert_eq!(*g.get(4, 3), REMOVED_LAND);
        assert_eq!(*tiles.get(4, 3), common::EMPTY);
    }

    #[test]
    fn test_map_edge_cells_extend_outward() {
        // A block flush against the north edge: its edge row behaves as
        // interior because padding replicates it.
        let mut g = block_grid(8, 2, 0, 3, 3);
        let tiles = run(ClassifierKind::Solid, &mut g);

        assert_eq!(*tiles.get(3, 0), solid::SOLID);
        assert_eq!(*tiles.get(3, 1), solid::SOLID);
        assert_eq!(*tiles.get(3, 2), solid::STRAIGHT_S);
    }

    #[test]
    fn test_line_run_and_endpoints() {
        let mut g = Grid::new_with(8, 0u8);
        for y in 2..6 {
            g.set(4, y, 1);
        }
        let tiles = run(ClassifierKind::Line, &mut g);

        assert_eq!(*tiles.get(4, 2), line::SOURCE_N);
        assert_eq!(*tiles.get(4, 3), line::STRAIGHT_NS);
        assert_eq!(*tiles.get(4, 4), line::STRAIGHT_NS);
        assert_eq!(*tiles.get(4, 5), line::SOURCE_S);
    }

    #[test]
    fn test_line_corner_tbone_fourway() {
        let mut g = Grid::new_with(9, 0u8);
        // A plus shape centered at (4, 4).
        for i in 2..7 {
            g.set(4, i, 1);
            g.set(i, 4, 1);
        }
        let tiles = run(ClassifierKind::Line, &mut g);
        assert_eq!(*tiles.get(4, 4), line::FOURWAY);

        // Remove the north arm: the center becomes a T with its crossbar
        // running west-east and the stem south.
        let mut g2 = Grid::new_with(9, 0u8);
        for i in 2..7 {
            g2.set(i, 4, 1);
        }
        for i in 5..7 {
            g2.set(4, i, 1);
        }
        let tiles2 = run(ClassifierKind::Line, &mut g2);
        assert_eq!(*tiles2.get(4, 4), line::TBONE_S);

        // An L bend connecting north and east.
        let mut g3 = Grid::new_with(9, 0u8);
        for i in 2..5 {
            g3.set(4, i, 1);
        }
        for i in 5..7 {
            g3.set(i, 4, 1);
        }
        let tiles3 = run(ClassifierKind::Line, &mut g3);
        assert_eq!(*tiles3.get(4, 4), line::CORNER_NE);
    }

    #[test]
    fn test_isolated_line_cell_is_demoted() {
        let mut g = Grid::new_with(8, 0u8);
        g.set(3, 3, 5);
        let tiles = run(ClassifierKind::Line, &mut g);

        assert_eq!(*tiles.get(3, 3), common::EMPTY);
        assert_eq!(*g.get(3, 3), 0);
    }

    #[test]
    fn test_classifier_is_idempotent() {
        let mut g = block_grid(8, 2, 2, 4, 3);
        // Attach a protrusion that the first run removes.
        g.set(6, 3, 1);
        let first = run(ClassifierKind::Solid, &mut g);
        let after_first = g.clone();
        let second = run(ClassifierKind::Solid, &mut g);

        assert_eq!(first, second);
        assert_eq!(after_first, g);
    }

    #[test]
    fn test_no_cell_left_unclassified() {
        let mut g = block_grid(16, 1, 1, 7, 5);
        g.set(9, 3, 1);
        g.set(10, 10, 1);
        let tiles = run(ClassifierKind::Solid, &mut g);

        for (x, y, &t) in tiles.cells() {
            assert_ne!(t, common::NA, "cell ({x}, {y}) kept the placeholder id");
        }
    }

    #[test]
    fn test_delta_mouth_directions() {
        let mut g = Grid::new_with(6, 0u8);
        g.set(2, 2, DELTA_SEA);
        g.set(2, 3, DELTA_RIVER); // sea to the north
        g.set(3, 2, DELTA_RIVER); // sea to the west

        let tiles = run(ClassifierKind::Delta, &mut g);
        assert_eq!(*tiles.get(2, 3), tiles::delta::MOUTH_N);
        assert_eq!(*tiles.get(3, 2), tiles::delta::MOUTH_W);
        assert_eq!(*tiles.get(2, 2), common::EMPTY);
    }

    #[test]
    fn test_simple_passthrough() {
        let mut g = Grid::new_with(4, 0u8);
        g.set(1, 2, 1);
        let tiles = run(ClassifierKind::Simple, &mut g);
        assert_eq!(*tiles.get(1, 2), 1);
        assert_eq!(*tiles.get(0, 0), 0);
    }
}
