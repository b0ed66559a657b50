//! SVG rasterization into square PNG icon variants

use crate::img::RasterImage;
use crate::png::{self, PngError};
use resvg::{tiny_skia, usvg};
use std::sync::Arc;
use std::thread;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("failed to parse SVG: {0}")]
    Parse(#[from] usvg::Error),

    #[error("cannot allocate a {0}x{0} pixmap")]
    Pixmap(u32),

    #[error(transparent)]
    Png(#[from] PngError),

    #[error("rasterization worker panicked")]
    WorkerPanicked,
}

/// Produces a PNG-encoded square image at a requested edge length
pub trait Rasterize: Sync {
    fn rasterize(&self, edge_length: u32) -> Result<RasterImage, RasterError>;
}

pub struct SvgRasterizer {
    svg: Vec<u8>,
    density: f32,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl SvgRasterizer {
    /// Fails early if `svg` does not parse
    pub fn new(svg: Vec<u8>, density: f32) -> Result<Self, RasterError> {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        let rasterizer = SvgRasterizer {
            svg,
            density,
            fontdb: Arc::new(fontdb),
        };

        let size = rasterizer.tree()?.size();
        tracing::debug!(
            width = size.width(),
            height = size.height(),
            density,
            "parsed source svg"
        );
        Ok(rasterizer)
    }

    fn tree(&self) -> Result<usvg::Tree, RasterError> {
        let opt = usvg::Options {
            dpi: self.density,
            fontdb: Arc::clone(&self.fontdb),
            ..usvg::Options::default()
        };
        Ok(usvg::Tree::from_data(&self.svg, &opt)?)
    }
}

impl Rasterize for SvgRasterizer {
    fn rasterize(&self, edge_length: u32) -> Result<RasterImage, RasterError> {
        let tree = self.tree()?;
        let size = tree.size();
        let (scale, tx, ty) = contain(size.width(), size.height(), edge_length);

        // New pixmaps start fully transparent
        let mut pixmap =
            tiny_skia::Pixmap::new(edge_length, edge_length).ok_or(RasterError::Pixmap(edge_length))?;
        let transform = tiny_skia::Transform::from_row(scale, 0.0, 0.0, scale, tx, ty);
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        let rgba: Vec<u8> = pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        let encoded = png::encode_rgba(edge_length, edge_length, &rgba)?;

        tracing::debug!(edge_length, bytes = encoded.len(), "rasterized");
        Ok(RasterImage::new(edge_length, encoded))
    }
}

/// Scale and centring offsets that fit a `width` x `height` box inside an
/// `edge` square without distortion
pub fn contain(width: f32, height: f32, edge: u32) -> (f32, f32, f32) {
    let edge = edge as f32;
    let scale = (edge / width).min(edge / height);
    let tx = (edge - width * scale) / 2.0;
    let ty = (edge - height * scale) / 2.0;
    (scale, tx, ty)
}

/// Rasterize every size on its own thread; results keep the order of `sizes`.
///
/// Every worker is joined before the first error, in `sizes` order, is
/// returned.
pub fn rasterize_all<R: Rasterize>(
    rasterizer: &R,
    sizes: &[u32],
) -> Result<Vec<RasterImage>, RasterError> {
    let results: Vec<Result<RasterImage, RasterError>> = thread::scope(|s| {
        let handles: Vec<_> = sizes
            .iter()
            .map(|&size| s.spawn(move || rasterizer.rasterize(size)))
            .collect();

        // A handle left unjoined makes the scope re-raise its panic
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or(Err(RasterError::WorkerPanicked)))
            .collect()
    });
    results.into_iter().collect()
}
