use crate::config::FaviconConfig;
use crate::generate;
use crate::ico;
use crate::img::RasterImage;
use crate::png;
use crate::raster::SvgRasterizer;
use anyhow::{Context, Result, bail};
use clap::Subcommand;
use ::ico::{IconDir, ResourceType};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

// IHDR colour type for truecolour with alpha
const COLOR_TYPE_RGBA: u8 = 6;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render the favicon PNGs and favicon.ico from an SVG
    Generate {
        #[arg(
            short,
            long,
            env = "FAVGEN_STATIC_DIR",
            default_value = "static",
            help = "Directory holding the source SVG; outputs are written here"
        )]
        static_dir: PathBuf,
        #[arg(
            short = 'i',
            long,
            default_value = "favicon.svg",
            help = "Source SVG, relative to the static directory"
        )]
        source: PathBuf,
        #[arg(short, long, help = "TOML manifest overriding the default targets")]
        config: Option<PathBuf>,
        #[arg(
            short,
            long,
            help = "DPI for absolute units in the SVG (default 300); output is always scaled to each target size, so this does not sharpen the result"
        )]
        density: Option<f32>,
    },
    /// Pack square PNG files into one multi-resolution .ico
    Ico {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(short, long, help = "Output .ico path")]
        output: PathBuf,
    },
    /// List the images inside an .ico file
    Inspect { file_path: PathBuf },
}

impl Command {
    pub fn run(self) -> Result<()> {
        match self {
            Command::Generate {
                static_dir,
                source,
                config,
                density,
            } => generate(&static_dir, &source, config.as_deref(), density),
            Command::Ico { files, output } => pack(&files, &output),
            Command::Inspect { file_path } => inspect(&file_path),
        }
    }
}

fn generate(
    static_dir: &Path,
    source: &Path,
    config_path: Option<&Path>,
    density: Option<f32>,
) -> Result<()> {
    let mut config = FaviconConfig::load(config_path)?;
    if let Some(density) = density {
        config.density = density;
    }

    let source_path = static_dir.join(source);
    info!("Generating favicons from {}...", source_path.display());

    let svg = fs::read(&source_path)
        .with_context(|| format!("failed to read {}", source_path.display()))?;
    let rasterizer = SvgRasterizer::new(svg, config.density)
        .with_context(|| format!("failed to load {}", source_path.display()))?;

    let written = generate::run(&rasterizer, &config, static_dir)?;
    info!("All {} favicons generated successfully!", written.len());
    Ok(())
}

fn pack(files: &[PathBuf], output: &Path) -> Result<()> {
    let images = files
        .iter()
        .map(|path| load_png(path))
        .collect::<Result<Vec<_>>>()?;

    let bytes = ico::encode(&images)
        .with_context(|| format!("failed to build {}", output.display()))?;
    fs::write(output, &bytes).with_context(|| format!("failed to write {}", output.display()))?;

    let mut sizes: Vec<u32> = images.iter().map(RasterImage::edge_length).collect();
    sizes.sort_unstable();
    let sizes: Vec<String> = sizes.iter().map(u32::to_string).collect();
    info!("Generated: {} ({}px)", output.display(), sizes.join(", "));
    Ok(())
}

fn load_png(path: &Path) -> Result<RasterImage> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let header = png::read_header(&bytes)
        .with_context(|| format!("{} is not a valid PNG", path.display()))?;

    if header.width != header.height {
        bail!(
            "{} is {}x{}; icon layers must be square",
            path.display(),
            header.width,
            header.height
        );
    }
    if header.color_type != COLOR_TYPE_RGBA || header.bit_depth != 8 {
        warn!(
            "{} is not 8-bit RGBA (colour type {}, depth {})",
            path.display(),
            header.color_type,
            header.bit_depth
        );
    }

    debug!(path = %path.display(), edge = header.width, bytes = bytes.len(), "loaded png");
    Ok(RasterImage::new(header.width, bytes))
}

fn inspect(file_path: &Path) -> Result<()> {
    let data =
        fs::read(file_path).with_context(|| format!("failed to read {}", file_path.display()))?;
    let dir = IconDir::read(Cursor::new(&data))
        .with_context(|| format!("failed to decode {}", file_path.display()))?;
    if dir.resource_type() != ResourceType::Icon {
        bail!("{} is a cursor file, not an icon", file_path.display());
    }

    println!(
        "{}: {} image(s), {} bytes",
        file_path.display(),
        dir.entries().len(),
        data.len()
    );
    for entry in dir.entries() {
        let (width, height) = (entry.width(), entry.height());
        let format = if entry.is_png() { "png" } else { "bmp" };
        println!(
            "  {}x{}  {}bpp  {} bytes  {}",
            width,
            height,
            entry.bits_per_pixel(),
            entry.data().len(),
            format
        );

        // Checks the embedded PNG against the directory dimensions
        if let Err(e) = entry.decode() {
            warn!("{}x{} entry does not decode: {}", width, height, e);
        }
    }
    Ok(())
}
