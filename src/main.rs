use std::path::PathBuf;
use std::process;

use clap::Parser;

use terramap::persist;
use terramap::{export, GenError, LayerKind, Stage, World, WorldParams};

#[derive(Parser, Debug)]
#[command(name = "terramap")]
#[command(about = "Generate layered tile maps from a single seed")]
struct Args {
    /// Master seed
    #[arg(short, long, default_value_t = 42)]
    seed: i64,

    /// Map side length (a power of two)
    #[arg(short, long, default_value_t = 64)]
    dim: u32,

    /// Comma-separated layer list, in generation order
    #[arg(short, long, default_value = "sea,river,delta,biome,city,road")]
    layers: String,

    /// Write a PNG render of the generated map
    #[arg(long)]
    png: Option<PathBuf>,

    /// Save the world to a binary blob
    #[arg(long)]
    save: Option<PathBuf>,

    /// Load a world blob instead of generating
    #[arg(long)]
    load: Option<PathBuf>,

    /// Override the sea elevation threshold
    #[arg(long)]
    sea_threshold: Option<u8>,

    /// Override the city sampling density
    #[arg(long)]
    city_density: Option<f64>,
}

fn main() {
    if let Err(e) = run(Args::parse()) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), GenError> {
    let world = match &args.load {
        Some(path) => {
            let world = persist::load_world(path)?;
            println!("loaded world from {}", path.display());
            world
        }
        None => {
            let kinds = parse_layers(&args.layers)?;
            let mut params = WorldParams::default();
            if let Some(t) = args.sea_threshold {
                params.sea_threshold = t;
            }
            if let Some(d) = args.city_density {
                params.city_density = d;
            }

            let mut world = World::with_params(args.seed, args.dim, &kinds, params)?;
            world.generate(|stage| match stage {
                Stage::Heightmap => println!("generated heightmap"),
                Stage::Layer(kind) => println!("generated {kind} layer"),
            })?;
            world
        }
    };

    print_summary(&world);

    if let Some(path) = &args.png {
        export::export_png(&world, path)?;
        println!("wrote {}", path.display());
    }
    if let Some(path) = &args.save {
        persist::save_world(&world, path)?;
        println!("saved {}", path.display());
    }

    Ok(())
}

fn parse_layers(list: &str) -> Result<Vec<LayerKind>, GenError> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<LayerKind>().map_err(|e| GenError::Configuration { reason: e }))
        .collect()
}

fn print_summary(world: &World) {
    println!();
    println!("seed {} | {}x{} cells", world.seed(), world.dim(), world.dim());
    for kind in world.layer_kinds() {
        if let Some(layer) = world.layer(kind) {
            println!("  {:<6} {:>5} cells", kind.name(), layer.cell_count());
        }
    }
    if !world.cities().is_empty() {
        println!("cities:");
        for city in world.cities() {
            println!("  #{} at ({}, {})", city.id, city.x, city.y);
        }
    }
}
