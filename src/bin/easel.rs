use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "easel", version)]
struct Cli {
    /// Log debug events to stderr.
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the first expansion canvas and mask for an image.
    Expand(ExpandArgs),
    /// Print the expansion steps for an image as JSON.
    Plan(PlanArgs),
    /// Rasterize freeform strokes into a binary mask PNG.
    Mask(MaskArgs),
}

#[derive(Parser, Debug)]
struct ExpandArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// up, down, left, right or panoramic.
    #[arg(long)]
    direction: easel::Direction,

    /// Override the configured ratio for this direction.
    #[arg(long)]
    ratio: Option<f64>,

    /// Studio config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output canvas PNG path.
    #[arg(long)]
    canvas: PathBuf,

    /// Output mask PNG path.
    #[arg(long)]
    mask: PathBuf,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// up, down, left, right or panoramic.
    #[arg(long)]
    direction: easel::Direction,

    /// Override the configured ratio for this direction.
    #[arg(long)]
    ratio: Option<f64>,

    /// Studio config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct MaskArgs {
    /// Mask width in pixels.
    #[arg(long)]
    width: u32,

    /// Mask height in pixels.
    #[arg(long)]
    height: u32,

    /// JSON array of strokes.
    #[arg(long)]
    strokes: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(serde::Serialize)]
struct PlannedStep {
    edge: easel::Edge,
    band_px: u32,
    width: u32,
    height: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.cmd {
        Command::Expand(args) => cmd_expand(args),
        Command::Plan(args) => cmd_plan(args),
        Command::Mask(args) => cmd_mask(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<easel::StudioConfig> {
    match path {
        Some(p) => easel::StudioConfig::from_path(p)
            .with_context(|| format!("load config '{}'", p.display())),
        None => Ok(easel::StudioConfig::default()),
    }
}

fn spec_for(
    cfg: &easel::StudioConfig,
    direction: easel::Direction,
    ratio: Option<f64>,
) -> easel::ExpansionSpec {
    let configured = match direction {
        easel::Direction::Panoramic => cfg.panoramic_ratio,
        _ => cfg.single_ratio,
    };
    easel::ExpansionSpec::with_ratio(direction, ratio.unwrap_or(configured))
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn cmd_expand(args: ExpandArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let source = easel::RasterImage::open(&args.in_path)
        .with_context(|| format!("read image '{}'", args.in_path.display()))?;
    let spec = spec_for(&cfg, args.direction, args.ratio);
    let out = easel::build_expansion_canvas(&source, &spec, cfg.expansion_fill)?;

    ensure_parent(&args.canvas)?;
    ensure_parent(&args.mask)?;
    out.canvas
        .save_png(&args.canvas)
        .with_context(|| format!("write png '{}'", args.canvas.display()))?;
    out.mask
        .as_image()
        .save_png(&args.mask)
        .with_context(|| format!("write png '{}'", args.mask.display()))?;

    if args.direction == easel::Direction::Panoramic {
        eprintln!("panoramic: wrote phase 1 of 2; phase 2 is built from the generated result");
    }
    eprintln!("wrote {}", args.canvas.display());
    eprintln!("wrote {}", args.mask.display());
    Ok(())
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let source = easel::RasterImage::open(&args.in_path)
        .with_context(|| format!("read image '{}'", args.in_path.display()))?;
    let spec = spec_for(&cfg, args.direction, args.ratio);

    let mut dims = source.dims();
    let mut planned = Vec::new();
    for step in spec.plan(source.dims())? {
        dims = step.target_dims(dims)?;
        planned.push(PlannedStep {
            edge: step.edge,
            band_px: step.band_px,
            width: dims.width,
            height: dims.height,
        });
    }

    let stdout = std::io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), &planned).context("write plan json")?;
    println!();
    Ok(())
}

fn cmd_mask(args: MaskArgs) -> anyhow::Result<()> {
    let f = File::open(&args.strokes)
        .with_context(|| format!("open strokes '{}'", args.strokes.display()))?;
    let strokes: Vec<easel::Stroke> = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse strokes '{}'", args.strokes.display()))?;

    let mask =
        easel::build_freeform_mask(easel::Dims::new(args.width, args.height), &strokes)?;

    ensure_parent(&args.out)?;
    mask.as_image()
        .save_png(&args.out)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    tracing::info!(white_px = mask.white_area(), "mask written");
    eprintln!("wrote {}", args.out.display());
    Ok(())
}
