//! Full favicon run: rasterize every target, write the PNGs, pack the ICO.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::config::FaviconConfig;
use crate::ico;
use crate::raster::{self, Rasterize};

/// Render every target in `config` into `out_dir` and return the written paths.
///
/// Any failure aborts the run. Files written before the failure are left in place.
pub fn run<R: Rasterize>(
    rasterizer: &R,
    config: &FaviconConfig,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    config.validate()?;
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mut written = Vec::with_capacity(config.png.len() + 1);

    let png_sizes: Vec<u32> = config.png.iter().map(|t| t.size).collect();
    let rendered = raster::rasterize_all(rasterizer, &png_sizes)
        .context("failed to rasterize png targets")?;
    for (target, img) in config.png.iter().zip(rendered) {
        let path = out_dir.join(&target.name);
        write(&path, img.encoded_bytes())?;
        info!("Generated: {} ({}x{})", target.name, target.size, target.size);
        written.push(path);
    }

    let layers = raster::rasterize_all(rasterizer, &config.ico.sizes)
        .context("failed to rasterize ico layers")?;
    let ico_bytes = ico::encode(&layers).context("failed to encode ico")?;
    let path = out_dir.join(&config.ico.name);
    write(&path, &ico_bytes)?;
    let sizes: Vec<String> = config.ico.sizes.iter().map(u32::to_string).collect();
    info!("Generated: {} ({}px)", config.ico.name, sizes.join(", "));
    written.push(path);

    Ok(written)
}

fn write(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}
