//! Tile archetype ids and the ternary templates that recognize them.
//!
//! Each classifier family owns a closed set of numeric archetype ids.
//! Rotationally related archetypes occupy consecutive ids in N, E, S, W
//! order (corner families in NE, SE, SW, NW order), so a template matched
//! at clockwise rotation `k` classifies the cell as `base_id + k`.

/// Archetypes shared by every family.
pub mod common {
    /// Background cell
    pub const EMPTY: u64 = 0;
    /// Foreground cell not yet classified
    pub const NA: u64 = 1;
}

/// Archetypes of the solid (areal) classifier.
pub mod solid {
    pub const SOLID: u64 = 2;
    pub const STRAIGHT_N: u64 = 3;
    pub const STRAIGHT_E: u64 = 4;
    pub const STRAIGHT_S: u64 = 5;
    pub const STRAIGHT_W: u64 = 6;
    pub const CONVEX_NE: u64 = 7;
    pub const CONVEX_SE: u64 = 8;
    pub const CONVEX_SW: u64 = 9;
    pub const CONVEX_NW: u64 = 10;
    pub const CONCAVE_NE: u64 = 11;
    pub const CONCAVE_SE: u64 = 12;
    pub const CONCAVE_SW: u64 = 13;
    pub const CONCAVE_NW: u64 = 14;
}

/// Archetypes of the line (1-cell-wide) classifier.
pub mod line {
    pub const STRAIGHT_NS: u64 = 2;
    pub const STRAIGHT_WE: u64 = 3;
    pub const SOURCE_N: u64 = 4;
    pub const SOURCE_E: u64 = 5;
    pub const SOURCE_S: u64 = 6;
    pub const SOURCE_W: u64 = 7;
    pub const CORNER_NE: u64 = 8;
    pub const CORNER_SE: u64 = 9;
    pub const CORNER_SW: u64 = 10;
    pub const CORNER_NW: u64 = 11;
    pub const TBONE_N: u64 = 12;
    pub const TBONE_E: u64 = 13;
    pub const TBONE_S: u64 = 14;
    pub const TBONE_W: u64 = 15;
    pub const FOURWAY: u64 = 16;
}

/// Archetypes of the delta classifier: the cardinal direction a river
/// mouth flows out through.
pub mod delta {
    pub const MOUTH_N: u64 = 1;
    pub const MOUTH_E: u64 = 2;
    pub const MOUTH_S: u64 = 3;
    pub const MOUTH_W: u64 = 4;
}

/// One position of a ternary template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tern {
    Yes,
    No,
    Any,
}

use Tern::{Any, No, Yes};

/// A 3x3 ternary neighborhood template, row-major, row 0 to the north.
pub type Template = [[Tern; 3]; 3];

/// One entry of a classifier's recognition list.
#[derive(Clone, Copy, Debug)]
pub enum TileSpec {
    /// Match `cells` at up to `rotations` clockwise rotations; rotation `k`
    /// assigns `base + k`.
    Template { cells: Template, base: u64, rotations: u8 },
    /// Remove 1-cell-thick protrusions: a foreground cell whose two x-axis
    /// or two y-axis edge neighbors are both background.
    Sliver,
}

/// Rotate a template 90° clockwise: transpose, then flip horizontally.
pub fn rotate_cw(t: &Template) -> Template {
    let mut out = [[Any; 3]; 3];
    for (r, row) in out.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell = t[2 - c][r];
        }
    }
    out
}

/// A template matches a boolean neighborhood iff every position is either
/// `Any` or equal to the neighborhood cell.
pub fn matches(template: &Template, nhood: &[[bool; 3]; 3]) -> bool {
    for r in 0..3 {
        for c in 0..3 {
            match template[r][c] {
                Any => {}
                Yes if !nhood[r][c] => return false,
                No if nhood[r][c] => return false,
                _ => {}
            }
        }
    }
    true
}

/// Recognition list of the solid classifier, most specific first. The
/// sliver pass runs ahead of the templates so edge matching never sees
/// 1-cell-thick protrusions.
pub fn solid_specs() -> Vec<TileSpec> {
    vec![
        TileSpec::Sliver,
        // Inner corner: everything solid except one diagonal.
        TileSpec::Template {
            cells: [
                [Yes, Yes, No],
                [Yes, Yes, Yes],
                [Yes, Yes, Yes],
            ],
            base: solid::CONCAVE_NE,
            rotations: 4,
        },
        // Outer corner: two adjacent sides empty.
        TileSpec::Template {
            cells: [
                [Any, No, Any],
                [Yes, Yes, No],
                [Yes, Yes, Any],
            ],
            base: solid::CONVEX_NE,
            rotations: 4,
        },
        // Straight edge: one side empty.
        TileSpec::Template {
            cells: [
                [Any, No, Any],
                [Yes, Yes, Yes],
                [Yes, Yes, Yes],
            ],
            base: solid::STRAIGHT_N,
            rotations: 4,
        },
    ]
}

/// Recognition list of the line classifier, most connected first.
pub fn line_specs() -> Vec<TileSpec> {
    vec![
        TileSpec::Template {
            cells: [
                [Any, Yes, Any],
                [Yes, Yes, Yes],
                [Any, Yes, Any],
            ],
            base: line::FOURWAY,
            rotations: 1,
        },
        // T-junction: the stem points at the empty side's opposite.
        TileSpec::Template {
            cells: [
                [Any, Yes, Any],
                [Yes, Yes, Yes],
                [Any, No, Any],
            ],
            base: line::TBONE_N,
            rotations: 4,
        },
        // Corner: two adjacent connections.
        TileSpec::Template {
            cells: [
                [Any, Yes, Any],
                [No, Yes, Yes],
                [Any, No, Any],
            ],
            base: line::CORNER_NE,
            rotations: 4,
        },
        // Straight run.
        TileSpec::Template {
            cells: [
                [Any, Yes, Any],
                [No, Yes, No],
                [Any, Yes, Any],
            ],
            base: line::STRAIGHT_NS,
            rotations: 2,
        },
        // Endpoint: a single connection, away from the tip.
        TileSpec::Template {
            cells: [
                [Any, No, Any],
                [No, Yes, No],
                [Any, Yes, Any],
            ],
            base: line::SOURCE_N,
            rotations: 4,
        },
    ]
}
