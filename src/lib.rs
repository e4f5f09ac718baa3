pub mod architecture;
pub mod builder;
pub mod display_width;
pub mod dot;
pub mod error;
pub mod graph_ast;
pub mod graph_layout;
pub mod output;
pub mod raster;
pub mod svg_renderer;

use std::path::{Component, Path, PathBuf};

pub use builder::DiagramBuilder;
pub use error::{Error, Result};
pub use graph_ast::{ArrowDir, Diagram, DiagramAttrs, Direction, NodeKind};
pub use raster::RasterOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
    Dot,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
            OutputFormat::Dot => "dot",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub format: OutputFormat,
    pub raster: RasterOptions,
}

/// Renders `diagram` entirely in memory.
pub fn render(diagram: &Diagram, options: &RenderOptions) -> Result<Vec<u8>> {
    if options.format == OutputFormat::Dot {
        return Ok(dot::render(diagram).into_bytes());
    }

    let layout = graph_layout::compute(diagram)?;
    let svg = svg_renderer::render(&layout);
    match options.format {
        OutputFormat::Png => Ok(raster::svg_to_png(&svg, &options.raster)?),
        _ => Ok(svg.into_bytes()),
    }
}

/// A file stem must name a single file inside the output directory.
pub fn check_file_stem(file_stem: &str) -> Result<()> {
    let mut components = Path::new(file_stem).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None)
            if name == file_stem && !file_stem.contains(['/', '\\']) =>
        {
            Ok(())
        }
        _ => Err(Error::InvalidFileStem(file_stem.to_string())),
    }
}

/// Renders `diagram` and writes it to `dir/<file_stem>.<ext>`.
///
/// Nothing is written unless rendering succeeds, and the file is replaced
/// atomically, so a failed run keeps whatever was there before. The process
/// working directory is never changed.
pub fn render_to_dir(
    diagram: &Diagram,
    dir: &Path,
    file_stem: &str,
    options: &RenderOptions,
) -> Result<PathBuf> {
    let _span = tracing::info_span!("render", diagram = %diagram.name).entered();
    check_file_stem(file_stem)?;
    let bytes = render(diagram, options)?;
    let file_name = format!("{file_stem}.{}", options.format.extension());
    let path = output::write_atomic(dir, &file_name, &bytes)?;
    tracing::info!(path = %path.display(), "diagram written");
    Ok(path)
}
