use std::path::{Path, PathBuf};

use chrono::Local;
use clap::{Parser, Subcommand};
use cropkit_core::decode::orient_image;
use cropkit_core::transform::{apply_circle_mask, apply_crop, centered_square, scale_rect};
use cropkit_core::{
    encode_image, Bounds, ConfigError, CropConfig, ImageIdentifier, ImageLoader, JsonPhotoIndex,
    LocalFilesystem, OutputReconciler,
};
use log::info;

/// Fill painted outside a circular crop.
const CIRCLE_FILL: [u8; 3] = [255, 255, 255];

/// Flags for the `crop` command.
#[derive(clap::Args, Clone, Debug)]
struct CropArgs {
    /// Image to crop: a path, file:// or content://media/... identifier
    source: String,

    /// Crop rectangle in upright full-size pixels: LEFT,TOP,RIGHT,BOTTOM
    #[arg(long, value_parser = parse_rect)]
    rect: Option<Bounds>,

    /// Circular crop. Without --rect, uses the largest centered square
    #[arg(long)]
    circle: bool,

    /// Bound on the decoded bitmap's constraining side
    #[arg(long)]
    max_side: Option<u32>,

    /// Constrain the shorter side instead of the longer one
    #[arg(long)]
    use_min: bool,

    /// Replace the source's index entry and remove its file
    #[arg(long)]
    delete_original: bool,

    /// JPEG quality of the saved crop (1-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,
}

#[derive(Parser)]
#[command(name = "cropkit")]
#[command(about = "Crop photos and record the result in a photo index")]
#[command(version)]
struct Cli {
    /// JSON photo index, created on first save
    #[arg(long, default_value = "photo-index.json", global = true)]
    index: PathBuf,

    /// TOML crop settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print stored bounds, MIME type and orientation of an image
    Bounds { source: String },
    /// Crop an image, save it as JPEG and record it in the index
    Crop(CropArgs),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let index = JsonPhotoIndex::open(&cli.index)?;

    match cli.command {
        Command::Bounds { source } => {
            let id = ImageLoader::parse_identifier(&source)?;
            for line in describe(&index, &id) {
                println!("{}", line);
            }
        }
        Command::Crop(args) => {
            let config = resolve_config(cli.config.as_deref(), &args)?;
            let id = crop(&index, &args, &config)?;
            println!("{}", id);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Parse `LEFT,TOP,RIGHT,BOTTOM`.
fn parse_rect(s: &str) -> Result<Bounds, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [left, top, right, bottom] = parts.as_slice() else {
        return Err(format!("expected LEFT,TOP,RIGHT,BOTTOM, got '{}'", s));
    };
    let parse = |v: &str| {
        v.parse::<i32>()
            .map_err(|_| format!("'{}' is not a pixel coordinate", v))
    };
    let rect = Bounds::new(parse(left)?, parse(top)?, parse(right)?, parse(bottom)?);
    if rect.is_empty() {
        return Err(format!("rectangle '{}' is empty", s));
    }
    Ok(rect)
}

/// Config file (or defaults) with command line flags applied on top.
fn resolve_config(path: Option<&Path>, args: &CropArgs) -> Result<CropConfig, ConfigError> {
    let mut config = match path {
        Some(path) => CropConfig::load(path)?,
        None => CropConfig::default(),
    };

    if let Some(max_side) = args.max_side {
        config.max_side_length = max_side;
    }
    if let Some(quality) = args.quality {
        config.jpeg_quality = quality;
    }
    config.use_min |= args.use_min;
    config.delete_original |= args.delete_original;

    config.validate()?;
    Ok(config)
}

fn describe(index: &JsonPhotoIndex, id: &ImageIdentifier) -> Vec<String> {
    let loader = ImageLoader::new(index);
    let bounds = loader.load_bounds(id);
    if bounds.is_empty() {
        return vec![format!("{}: not a readable image", id)];
    }

    let orientation = loader.resolve_orientation(id);
    vec![
        id.to_string(),
        format!("  size:        {}x{}", bounds.width(), bounds.height()),
        format!(
            "  mime type:   {}",
            loader.resolve_mime_type(id).unwrap_or("unknown")
        ),
        format!("  orientation: {:?}", orientation),
        format!("  rotation:    {} degrees", orientation.rotation_degrees()),
    ]
}

/// Load, orient, crop, encode and save `args.source`, returning the
/// identifier the index now holds for the saved file.
fn crop(
    index: &JsonPhotoIndex,
    args: &CropArgs,
    config: &CropConfig,
) -> Result<ImageIdentifier, Box<dyn std::error::Error>> {
    let source = ImageLoader::parse_identifier(&args.source)?;
    let loader = ImageLoader::new(index);

    let image = loader
        .load_constrained_bitmap(&source, config.max_side_length, config.use_min)?
        .ok_or_else(|| format!("cannot decode {}", source))?;
    let image = orient_image(image, loader.resolve_orientation(&source))?;

    let rect = match args.rect {
        Some(rect) => scale_rect(rect, image.sample_factor),
        None if args.circle => centered_square(image.width, image.height),
        None => Bounds::from_size(image.width, image.height),
    };
    let mut cropped = apply_crop(&image, rect);
    if args.circle {
        cropped = apply_circle_mask(&cropped, CIRCLE_FILL);
    }
    let bytes = encode_image(&cropped, config.jpeg_quality)?;

    let fs = LocalFilesystem;
    let reconciler = OutputReconciler::new(index, &fs);
    let now = Local::now();
    let output = reconciler.make_output_path(
        &source,
        &config.storage_root(),
        &config.default_save_directory,
        &now,
    )?;
    std::fs::write(&output, bytes)?;
    info!(
        "Wrote {}x{} crop of {} to {}",
        cropped.width,
        cropped.height,
        source,
        output.display()
    );

    Ok(reconciler.reconcile(
        &source,
        &output,
        now.timestamp_millis(),
        config.delete_original,
    )?)
}
