//! Elevation synthesis using the diamond-square algorithm.
//!
//! Generation runs on an internal `(dim + 1)²` buffer because the algorithm
//! needs a symmetric square; the returned map is the top-left `dim × dim`
//! slice. Post-processing stretches the output to the full 0-255 range,
//! then optionally adds per-cell uniform noise and a Gaussian blur.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::GenError;
use crate::grid::Grid;
use crate::params::HeightmapParams;

/// Corner cells are seeded uniformly from this inclusive range.
pub const INITIAL_RANGE: (u8, u8) = (0x40, 0xBF);

/// Generate an elevation grid of side `dim` (a power of two).
pub fn generate(dim: usize, params: &HeightmapParams, seed: u64) -> Result<Grid<u8>, GenError> {
    if dim == 0 || !dim.is_power_of_two() {
        return Err(GenError::config(format!(
            "heightmap dimension must be a power of two, got {dim}"
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut buf: Grid<u8> = Grid::new(dim + 1);

    buf.set(0, 0, rng.gen_range(INITIAL_RANGE.0..=INITIAL_RANGE.1));
    buf.set(dim, 0, rng.gen_range(INITIAL_RANGE.0..=INITIAL_RANGE.1));
    buf.set(0, dim, rng.gen_range(INITIAL_RANGE.0..=INITIAL_RANGE.1));
    buf.set(dim, dim, rng.gen_range(INITIAL_RANGE.0..=INITIAL_RANGE.1));

    let min_square_dim = (params.min_cell_size as usize + 1).max(2);
    let mut square_dim = dim + 1;
    let mut range = params.perturb_range;

    while square_dim > min_square_dim {
        subdivide_pass(&mut buf, dim, square_dim, range, false, &mut rng);
        square_dim = square_dim / 2 + 1;
        range -= (range as f32 * params.perturb_decrease) as u32;
    }

    // Subdivision stopped early: block-fill the remaining squares with their
    // perturbed center value.
    if square_dim > 2 {
        subdivide_pass(&mut buf, dim, square_dim, range, true, &mut rng);
    }

    let mut out = Grid::new_with(dim, 0u8);
    for y in 0..dim {
        for x in 0..dim {
            out.set(x, y, *buf.get(x, y));
        }
    }

    stretch_levels(&mut out);
    apply_noise(&mut out, params.noise_range, &mut rng);
    if params.blur_sigma > 0.0 {
        gaussian_blur(&mut out, params.blur_sigma);
    }

    Ok(out)
}

/// One square/diamond sweep over every square of side `square_dim`.
fn subdivide_pass(
    buf: &mut Grid<u8>,
    dim: usize,
    square_dim: usize,
    range: u32,
    fill: bool,
    rng: &mut ChaCha8Rng,
) {
    let step = square_dim - 1;
    let mut y = 0;
    while y < dim {
        let mut x = 0;
        while x < dim {
            square_step(buf, x, y, square_dim, range, fill, rng);
            if !fill {
                diamond_steps(buf, x, y, square_dim, range, rng);
            }
            x += step;
        }
        y += step;
    }
}

/// Set the square's center to the mean of its corners plus perturbation.
/// In fill mode the whole square interior takes the center value instead.
fn square_step(
    buf: &mut Grid<u8>,
    x: usize,
    y: usize,
    square_dim: usize,
    range: u32,
    fill: bool,
    rng: &mut ChaCha8Rng,
) {
    let step = square_dim - 1;
    let p1 = *buf.get(x, y) as u32;
    let p2 = *buf.get(x + step, y) as u32;
    let p3 = *buf.get(x, y + step) as u32;
    let p4 = *buf.get(x + step, y + step) as u32;

    let avg = (p1 + p2 + p3 + p4) / 4;
    let mid = step / 2;
    let val = set_perturbed(buf, x + mid, y + mid, avg, range, rng);

    if fill {
        for fy in y..y + step {
            for fx in x..x + step {
                buf.set(fx, fy, val);
            }
        }
    }
}

/// Set the four edge midpoints of a square to the mean of their in-bounds
/// diamond neighbors plus perturbation.
fn diamond_steps(
    buf: &mut Grid<u8>,
    x: usize,
    y: usize,
    square_dim: usize,
    range: u32,
    rng: &mut ChaCha8Rng,
) {
    let step = square_dim - 1;
    let mid = step / 2;

    diamond_average(buf, x + mid, y, mid, range, rng);
    diamond_average(buf, x + step, y + mid, mid, range, rng);
    diamond_average(buf, x + mid, y + step, mid, range, rng);
    diamond_average(buf, x, y + mid, mid, range, rng);
}

fn diamond_average(
    buf: &mut Grid<u8>,
    x: usize,
    y: usize,
    half: usize,
    range: u32,
    rng: &mut ChaCha8Rng,
) {
    let side = buf.dim() as i32;
    let half = half as i32;
    let mut total = 0u32;
    let mut nval = 0u32;

    for (tx, ty) in [
        (x as i32, y as i32 - half),
        (x as i32 + half, y as i32),
        (x as i32, y as i32 + half),
        (x as i32 - half, y as i32),
    ] {
        if tx >= 0 && ty >= 0 && tx < side && ty < side {
            total += *buf.get(tx as usize, ty as usize) as u32;
            nval += 1;
        }
    }

    set_perturbed(buf, x, y, total / nval, range, rng);
}

/// Write `val` plus a uniform perturbation from `[-range/2, range/2]`,
/// clamped to the cell range. Returns the stored value.
fn set_perturbed(
    buf: &mut Grid<u8>,
    x: usize,
    y: usize,
    val: u32,
    range: u32,
    rng: &mut ChaCha8Rng,
) -> u8 {
    let half = (range / 2) as i32;
    let v = (val as i32 + rng.gen_range(-half..=half)).clamp(0, 255) as u8;
    buf.set(x, y, v);
    v
}

/// Rescale so the lowest cell is 0 and the highest 255. Integer scaling
/// keeps the extremes exact.
fn stretch_levels(grid: &mut Grid<u8>) {
    let mut min = u8::MAX;
    let mut max = u8::MIN;
    for (_, _, &v) in grid.cells() {
        min = min.min(v);
        max = max.max(v);
    }

    if max <= min || (min == 0 && max == 255) {
        return;
    }

    let span = (max - min) as u32;
    let dim = grid.dim();
    for y in 0..dim {
        for x in 0..dim {
            let v = *grid.get(x, y);
            grid.set(x, y, ((v - min) as u32 * 255 / span) as u8);
        }
    }
}

/// Resample every cell uniformly from `[v - range/2, v + range/2]`.
fn apply_noise(grid: &mut Grid<u8>, range: u32, rng: &mut ChaCha8Rng) {
    if range == 0 {
        return;
    }

    let half = (range / 2) as i32;
    let dim = grid.dim();
    for y in 0..dim {
        for x in 0..dim {
            let v = *grid.get(x, y) as i32;
            let v = rng.gen_range(v - half..=v + half).clamp(0, 255) as u8;
            grid.set(x, y, v);
        }
    }
}

/// Separable Gaussian blur with replicated edges, radius `⌈4σ⌉`.
fn gaussian_blur(grid: &mut Grid<u8>, sigma: f32) {
    let dim = grid.dim();
    let radius = (4.0 * sigma).ceil() as usize;
    let kernel_size = radius * 2 + 1;

    let mut kernel = vec![0.0f32; kernel_size];
    let mut sum = 0.0;
    for (i, k) in kernel.iter_mut().enumerate() {
        let d = i as f32 - radius as f32;
        *k = (-d * d / (2.0 * sigma * sigma)).exp();
        sum += *k;
    }
    for k in &mut kernel {
        *k /= sum;
    }

    // Horizontal pass
    let mut temp = Grid::new_with(dim, 0.0f32);
    for y in 0..dim {
        for x in 0..dim {
            let mut val = 0.0;
            for (i, &k) in kernel.iter().enumerate() {
                let sx = (x as i32 + i as i32 - radius as i32).clamp(0, dim as i32 - 1) as usize;
                val += *grid.get(sx, y) as f32 * k;
            }
            temp.set(x, y, val);
        }
    }

    // Vertical pass
    for y in 0..dim {
        for x in 0..dim {
            let mut val = 0.0;
            for (i, &k) in kernel.iter().enumerate() {
                let sy = (y as i32 + i as i32 - radius as i32).clamp(0, dim as i32 - 1) as usize;
                val += *temp.get(x, sy) * k;
            }
            grid.set(x, y, val.round().clamp(0.0, 255.0) as u8);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_power_of_two() {
        let params = HeightmapParams::default();
        assert!(generate(0, &params, 1).is_err());
        assert!(generate(63, &params, 1).is_err());
        assert!(generate(100, &params, 1).is_err());
        assert!(generate(64, &params, 1).is_ok());
    }

    #[test]
    fn test_deterministic_for_seed() {
        let params = HeightmapParams::default();
        let a = generate(64, &params, 99).unwrap();
        let b = generate(64, &params, 99).unwrap();
        assert_eq!(a, b);

        let c = generate(64, &params, 100).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_stretch_reaches_full_range() {
        let params = HeightmapParams::default();
        let map = generate(64, &params, 1).unwrap();

        let mut min = u8::MAX;
        let mut max = u8::MIN;
        for (_, _, &v) in map.cells() {
            min = min.min(v);
            max = max.max(v);
        }
        assert_eq!(min, 0);
        assert_eq!(max, 255);
    }

    #[test]
    fn test_min_cell_size_block_fills() {
        let params = HeightmapParams { min_cell_size: 8, ..HeightmapParams::default() };
        let map = generate(64, &params, 7).unwrap();

        // Subdivision stopped at squares of side 9, so the 8x8 interior of
        // at least one block must be constant.
        let probe = *map.get(1, 1);
        let uniform = map.cells_in(0, 0, 8, 8).all(|(_, _, &v)| v == probe);
        assert!(uniform);
    }

    #[test]
    fn test_blur_keeps_range_and_determinism() {
        let params = HeightmapParams { blur_sigma: 1.5, ..HeightmapParams::default() };
        let a = generate(64, &params, 3).unwrap();
        let b = generate(64, &params, 3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_noise_is_applied_after_stretch() {
        let base = generate(64, &HeightmapParams::default(), 11).unwrap();
        let noisy = generate(
            64,
            &HeightmapParams { noise_range: 32, ..HeightmapParams::default() },
            11,
        )
        .unwrap();
        assert_ne!(base, noisy);
    }
}
