//! Flat PNG export of a generated world.
//!
//! One pixel per cell: grayscale elevation with each stacked layer drawn
//! over it. This is a debug view, not a tile renderer; rivers keep their
//! id-cycled colors so separate walks stay distinguishable.

use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};

use crate::error::GenError;
use crate::layers::LayerKind;
use crate::world::World;

const SEA_COLOR: [u8; 3] = [30, 60, 120];
const DELTA_COLOR: [u8; 3] = [237, 201, 175];
const FOREST_COLOR: [u8; 3] = [34, 120, 40];
const DESERT_COLOR: [u8; 3] = [220, 200, 140];
const ROAD_COLOR: [u8; 3] = [139, 94, 60];
const CITY_COLOR: [u8; 3] = [200, 30, 30];

/// Id-cycled river palette.
const RIVER_COLORS: [[u8; 3]; 6] = [
    [255, 0, 255],
    [0, 255, 255],
    [0, 0, 255],
    [0, 255, 0],
    [255, 0, 0],
    [255, 255, 0],
];

/// Render the world to an RGB image, one pixel per cell.
pub fn render_map(world: &World) -> RgbImage {
    let dim = world.dim();
    let mut img: RgbImage = ImageBuffer::new(dim as u32, dim as u32);

    for (x, y, &h) in world.heights().cells() {
        img.put_pixel(x as u32, y as u32, Rgb([h, h, h]));
    }

    // Layer order matters: later features draw over earlier ones.
    if let Some(sea) = world.layer(LayerKind::Sea) {
        for (x, y, _) in sea.grid.nonzero() {
            img.put_pixel(x as u32, y as u32, Rgb(SEA_COLOR));
        }
    }
    if let Some(biome) = world.layer(LayerKind::Biome) {
        for (x, y, &v) in biome.grid.nonzero() {
            let color = if v == crate::layers::biome::BIOME_DESERT {
                DESERT_COLOR
            } else {
                FOREST_COLOR
            };
            img.put_pixel(x as u32, y as u32, Rgb(color));
        }
    }
    if let Some(river) = world.layer(LayerKind::River) {
        for (x, y, &v) in river.grid.nonzero() {
            let color = RIVER_COLORS[(v % 6) as usize];
            img.put_pixel(x as u32, y as u32, Rgb(color));
        }
    }
    if let Some(delta) = world.layer(LayerKind::Delta) {
        for (x, y, _) in delta.grid.nonzero() {
            img.put_pixel(x as u32, y as u32, Rgb(DELTA_COLOR));
        }
    }
    if let Some(road) = world.layer(LayerKind::Road) {
        for (x, y, _) in road.grid.nonzero() {
            img.put_pixel(x as u32, y as u32, Rgb(ROAD_COLOR));
        }
    }
    if let Some(city) = world.layer(LayerKind::City) {
        for (x, y, _) in city.grid.nonzero() {
            img.put_pixel(x as u32, y as u32, Rgb(CITY_COLOR));
        }
    }

    img
}

/// Render and write a PNG.
pub fn export_png(world: &World, path: &Path) -> Result<(), GenError> {
    render_map(world).save(path).map_err(|e| GenError::Codec(e.to_string()))
}
