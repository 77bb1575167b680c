//! Voxdeform - deform a generated test volume with an expression.
//!
//! Usage: cargo run --release -- [OPTIONS] [EXPRESSION]
//!
//! Options:
//!   -m, --mode <MODE>     Coordinate mode: raw, offset, unit (default: unit)
//!   -s, --size <N>        Edge length of the test volume (default: 16)
//!   --offset <X,Y,Z>      World placement offset (default: 0,0,0)
//!   --timeout <MS>        Calculation budget in milliseconds
//!   --config <PATH>       Load a JSON deform config
//!   --chunk <N>           Cells processed per resume
//!   --output <PATH>       Write the deformed voxels as raw bytes
//!   -h, --help            Print this help

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use voxdeform::core::{self, DVec3, DeformConfig, Error, IVec3, logging};
use voxdeform::deform::{Deform, EditContext, Mode, Operation, Progress};
use voxdeform::voxel::{CuboidRegion, InputExtent, Voxel, VoxelGrid};

const DEFAULT_EXPRESSION: &str = "y = y + sin(x * pi) * 0.25";

fn main() {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    if has_flag(&args, &["-h", "--help"]) {
        print_usage();
        return;
    }

    if let Err(e) = run(&args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> core::Result<()> {
    let source = expression_arg(args).unwrap_or_else(|| DEFAULT_EXPRESSION.to_string());
    let mode: Mode = match parse_str_arg(args, &["-m", "--mode"]) {
        Some(s) => s.parse().map_err(|e| Error::Config(format!("{}", e)))?,
        None => Mode::UnitCube,
    };
    let size = parse_arg::<i32>(args, &["-s", "--size"]).unwrap_or(16).max(1);
    let offset = match parse_str_arg(args, &["--offset"]) {
        Some(s) => parse_vec3(&s).ok_or_else(|| Error::Config(format!("bad offset `{}`", s)))?,
        None => DVec3::ZERO,
    };

    let mut config = match parse_str_arg(args, &["--config"]) {
        Some(path) => DeformConfig::load(path)?,
        None => DeformConfig::default(),
    };
    if let Some(ms) = parse_arg::<u64>(args, &["--timeout"]) {
        config.calculation_timeout_ms = ms;
    }
    if let Some(n) = parse_arg::<usize>(args, &["--chunk"]) {
        config.cells_per_resume = Some(n);
    }
    let output = parse_str_arg(args, &["--output"]).map(PathBuf::from);

    println!("=== Voxdeform ===");
    println!("Expression: {}", source);
    println!("Mode:       {}", mode);
    println!("Volume:     {}^3", size);
    println!("Offset:     {}", offset);
    println!("Budget:     {:?}", config.timeout());
    println!();

    let max = IVec3::splat(size - 1);
    let mut grid = test_volume(max);
    let before = grid.clone();

    let deform = Deform::builder(source)
        .destination(&mut grid)
        .region(Arc::new(CuboidRegion::new(IVec3::ZERO, max)))
        .mode(mode)
        .offset(offset)
        .build()?;

    let started = Instant::now();
    let mut op = deform.into_operation(EditContext::new().with_config(config));
    let mut resumes = 0;
    loop {
        resumes += 1;
        if op.resume()? == Progress::Done {
            break;
        }
    }
    let stats = op.stats();
    drop(op);

    println!(
        "Deformed {} of {} cells in {} resume(s), {:.2?}",
        stats.cells_written,
        stats.cells_total,
        resumes,
        started.elapsed()
    );
    println!("Non-empty voxels: {} -> {}", before.count_non_empty(), grid.count_non_empty());
    println!();

    let z = size / 2;
    println!("Before (z = {}):", z);
    print_slice(&before, max, z);
    println!("After (z = {}):", z);
    print_slice(&grid, max, z);

    if let Some(path) = output {
        let bytes: &[u8] = bytemuck::cast_slice(grid.voxels());
        std::fs::write(&path, bytes)?;
        println!("Wrote {} bytes to {}", bytes.len(), path.display());
    }

    Ok(())
}

/// Layered ground filling the lower half, with a colored band every few cells
fn test_volume(max: IVec3) -> VoxelGrid {
    let ground = (max.y + 1) / 2;
    VoxelGrid::from_fn(IVec3::ZERO, max, |p| {
        if p.y >= ground {
            return Voxel::EMPTY;
        }
        match (p.x / 2 + p.z / 2) % 3 {
            0 => Voxel::new(120, 90, 60, 1),
            1 => Voxel::new(90, 160, 70, 2),
            _ => Voxel::new(150, 150, 150, 3),
        }
    })
}

fn print_slice(grid: &VoxelGrid, max: IVec3, z: i32) {
    for y in (0..=max.y).rev() {
        let row: String = (0..=max.x)
            .map(|x| match grid.voxel(IVec3::new(x, y, z)).material_id {
                0 => '.',
                1 => '#',
                2 => '%',
                _ => '@',
            })
            .collect();
        println!("  {}", row);
    }
    println!();
}

fn print_usage() {
    println!("Usage: voxdeform [OPTIONS] [EXPRESSION]");
    println!();
    println!("Options:");
    println!("  -m, --mode <MODE>   raw, offset or unit (default: unit)");
    println!("  -s, --size <N>      Edge length of the test volume (default: 16)");
    println!("  --offset <X,Y,Z>    World placement offset");
    println!("  --timeout <MS>      Calculation budget in milliseconds");
    println!("  --config <PATH>     Load a JSON deform config");
    println!("  --chunk <N>         Cells processed per resume");
    println!("  --output <PATH>     Write the deformed voxels as raw bytes");
    println!();
    println!("Default expression: {}", DEFAULT_EXPRESSION);
    println!("Default budget:     {:?}", Duration::from_millis(DeformConfig::default().calculation_timeout_ms));
}

const VALUE_FLAGS: [&str; 9] = [
    "-m", "--mode", "-s", "--size", "--offset", "--timeout", "--config", "--chunk", "--output",
];

/// First argument that is neither a flag nor a flag's value
fn expression_arg(args: &[String]) -> Option<String> {
    let mut i = 1;
    while i < args.len() {
        let arg = &args[i];
        if VALUE_FLAGS.contains(&arg.as_str()) {
            i += 2;
            continue;
        }
        if !arg.starts_with('-') || arg.parse::<f64>().is_ok() {
            return Some(arg.clone());
        }
        i += 1;
    }
    None
}

fn has_flag(args: &[String], flags: &[&str]) -> bool {
    args.iter().any(|a| flags.contains(&a.as_str()))
}

fn parse_str_arg(args: &[String], flags: &[&str]) -> Option<String> {
    args.iter().position(|a| flags.contains(&a.as_str()))
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flags: &[&str]) -> Option<T> {
    parse_str_arg(args, flags).and_then(|s| s.parse().ok())
}

fn parse_vec3(s: &str) -> Option<DVec3> {
    let parts: Vec<f64> = s.split(',').map(|p| p.trim().parse().ok()).collect::<Option<_>>()?;
    match parts.as_slice() {
        [x, y, z] => Some(DVec3::new(*x, *y, *z)),
        _ => None,
    }
}
