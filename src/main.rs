use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use archdiagram::{OutputFormat, RasterOptions, RenderOptions, architecture, raster};

#[derive(Parser)]
#[command(
    name = "archdiagram",
    about = "Render the Gafaelfawr token management architecture diagram"
)]
struct Cli {
    /// Directory to write the diagram into
    #[arg(long, short = 'o', default_value = ".")]
    out_dir: PathBuf,

    /// Output file name without extension
    #[arg(long, default_value = architecture::FILE_STEM, value_parser = parse_file_stem)]
    filename: String,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = Format::Png)]
    format: Format,

    /// Raster scale factor (PNG only)
    #[arg(long, default_value_t = 1.0)]
    scale: f32,

    /// Background color for PNG output (`transparent`, `white`, `#rrggbb`, ...)
    #[arg(long, default_value = "white", value_parser = parse_background)]
    background: String,

    /// Log progress to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Png,
    Svg,
    Dot,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Png => OutputFormat::Png,
            Format::Svg => OutputFormat::Svg,
            Format::Dot => OutputFormat::Dot,
        }
    }
}

fn parse_background(s: &str) -> Result<String, String> {
    match raster::parse_color(s) {
        Some(_) => Ok(s.to_string()),
        None => Err(format!("unsupported color `{s}`")),
    }
}

fn parse_file_stem(s: &str) -> Result<String, String> {
    archdiagram::check_file_stem(s)
        .map(|()| s.to_string())
        .map_err(|e| e.to_string())
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("archdiagram={level}")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let diagram = architecture::token_management().unwrap_or_else(|e| {
        eprintln!("ERROR: {e}");
        std::process::exit(1);
    });

    let options = RenderOptions {
        format: cli.format.into(),
        raster: RasterOptions {
            scale: cli.scale,
            background: Some(cli.background),
        },
    };

    if let Err(e) = archdiagram::render_to_dir(&diagram, &cli.out_dir, &cli.filename, &options) {
        eprintln!("ERROR: {e}");
        std::process::exit(1);
    }
}
