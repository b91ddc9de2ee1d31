use clap::Parser;
use dxf_nest::entity::Drawing;
use dxf_nest::export;
use dxf_nest::packer;
use dxf_nest::render;
use dxf_nest::types::{PackConfig, Part};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "dxf_nest",
    about = "2D sheet nesting optimizer for DXF flat parts"
)]
struct Cli {
    /// Sheet dimensions in mm (WxH, e.g. 2440x1220)
    #[arg(long)]
    sheet: String,

    /// Parts as WxH:qty in mm (e.g. 800x600:3 400x300:5)
    #[arg(long = "part", num_args = 1..)]
    parts: Vec<String>,

    /// Parsed drawing files as path:qty (JSON entity lists)
    #[arg(long = "file", num_args = 1..)]
    files: Vec<String>,

    /// Disable 90-degree part rotation
    #[arg(long)]
    no_rotate: bool,

    /// Allow mirrored placements
    #[arg(long)]
    mirror: bool,

    /// Clearance from every sheet edge in mm
    #[arg(long, default_value_t = 0.0)]
    edge_gap: f64,

    /// Spacing between parts in mm
    #[arg(long, default_value_t = 0.0)]
    spacing: f64,

    /// Show ASCII layout of each sheet
    #[arg(long)]
    layout: bool,

    /// Write a DXF file per sheet into this directory
    #[arg(long)]
    export_dir: Option<PathBuf>,
}

fn parse_dimensions(s: &str) -> Result<(f64, f64), String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!("invalid dimensions '{}', expected WxH", s));
    }
    let width = parts[0]
        .parse::<f64>()
        .map_err(|_| format!("invalid width in '{}'", s))?;
    let height = parts[1]
        .parse::<f64>()
        .map_err(|_| format!("invalid height in '{}'", s))?;
    if width <= 0.0 || height <= 0.0 {
        return Err(format!("dimensions must be positive in '{}'", s));
    }
    Ok((width, height))
}

fn split_qty(s: &str) -> Result<(&str, u32), String> {
    let (head, qty) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("invalid argument '{}', expected value:qty", s))?;
    let qty = qty
        .parse::<u32>()
        .map_err(|_| format!("invalid quantity in '{}'", s))?;
    if qty == 0 {
        return Err(format!("quantity must be non-zero in '{}'", s));
    }
    Ok((head, qty))
}

fn parse_part(s: &str, index: usize) -> Result<Part, String> {
    let (dims, qty) = split_qty(s)?;
    let (width, height) = parse_dimensions(dims)?;
    Ok(Part::from_size(format!("part-{}", index + 1), width, height, qty))
}

fn load_part_file(s: &str) -> Result<Part, String> {
    let (path, qty) = split_qty(s)?;
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read '{}': {}", path, e))?;
    let drawing: Drawing = serde_json::from_str(&content)
        .map_err(|e| format!("failed to parse '{}': {}", path, e))?;
    let name = PathBuf::from(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    Part::from_drawing(name, &drawing, qty).map_err(|e| e.to_string())
}

fn main() {
    let cli = Cli::parse();

    let (sheet_width, sheet_height) = parse_dimensions(&cli.sheet).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let mut parts: Vec<Part> = Vec::new();
    for (i, arg) in cli.parts.iter().enumerate() {
        match parse_part(arg, i) {
            Ok(part) => parts.push(part),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
    for arg in &cli.files {
        match load_part_file(arg) {
            Ok(part) => parts.push(part),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    if parts.is_empty() {
        eprintln!("Error: no parts given, use --part and/or --file");
        std::process::exit(1);
    }

    let config = PackConfig {
        sheet_width,
        sheet_height,
        allow_rotation: !cli.no_rotate,
        allow_mirroring: cli.mirror,
        edge_gap: cli.edge_gap,
        part_spacing: cli.spacing,
    };

    let result = packer::pack(&parts, &config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    for sheet in &result.sheets {
        println!("Sheet {}:", sheet.index + 1);
        for item in &sheet.items {
            let rot = if item.rotation != 0 { " [rotated]" } else { "" };
            let mir = if item.mirrored { " [mirrored]" } else { "" };
            println!(
                "  {} {:.1}x{:.1} @ ({:.1}, {:.1}){}{}",
                item.part, item.width, item.height, item.x, item.y, rot, mir
            );
        }
        if cli.layout {
            print!("{}", render::render_sheet(sheet));
        }
        println!();
    }

    if let Some(dir) = &cli.export_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Error: failed to create '{}': {}", dir.display(), e);
            std::process::exit(1);
        }
        for sheet in &result.sheets {
            let dxf = export::export_sheet(sheet, &parts);
            let path = dir.join(format!("sheet-{}.dxf", sheet.index + 1));
            if let Err(e) = std::fs::write(&path, dxf) {
                eprintln!("Error: failed to write '{}': {}", path.display(), e);
                std::process::exit(1);
            }
            println!("Wrote {}", path.display());
        }
    }

    println!(
        "Summary: {} item{} on {} sheet{}, {:.1}% utilization",
        result.total_items,
        if result.total_items == 1 { "" } else { "s" },
        result.total_sheets,
        if result.total_sheets == 1 { "" } else { "s" },
        result.utilization * 100.0,
    );
}
