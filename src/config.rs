use std::collections::HashSet;
use std::path::{Component, Path};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::ico::MAX_EDGE_LENGTH;

/// A standalone PNG output
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PngTarget {
    pub name: String,
    pub size: u32,
}

/// The multi-resolution ICO output
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IcoTarget {
    #[serde(default = "default_ico_name")]
    pub name: String,
    #[serde(default = "default_ico_sizes")]
    pub sizes: Vec<u32>,
}

/// Everything `generate` renders, optionally loaded from a TOML manifest.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FaviconConfig {
    /// DPI used to resolve absolute units in the source SVG.
    #[serde(default = "default_density")]
    pub density: f32,
    #[serde(default = "default_png_targets")]
    pub png: Vec<PngTarget>,
    #[serde(default)]
    pub ico: IcoTarget,
}

fn default_density() -> f32 {
    300.0
}

fn default_png_targets() -> Vec<PngTarget> {
    [
        ("favicon-96x96.png", 96),
        ("apple-touch-icon.png", 180),
        ("web-app-manifest-192x192.png", 192),
        ("web-app-manifest-512x512.png", 512),
    ]
    .into_iter()
    .map(|(name, size)| PngTarget {
        name: name.to_string(),
        size,
    })
    .collect()
}

fn default_ico_name() -> String {
    "favicon.ico".to_string()
}

fn default_ico_sizes() -> Vec<u32> {
    vec![16, 32, 48]
}

impl Default for IcoTarget {
    fn default() -> Self {
        Self {
            name: default_ico_name(),
            sizes: default_ico_sizes(),
        }
    }
}

impl Default for FaviconConfig {
    fn default() -> Self {
        Self {
            density: default_density(),
            png: default_png_targets(),
            ico: IcoTarget::default(),
        }
    }
}

impl FaviconConfig {
    /// Load a manifest, or the built-in targets when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Reject targets that cannot be rendered or would land outside the
    /// output directory.
    pub fn validate(&self) -> Result<()> {
        if !self.density.is_finite() || self.density <= 0.0 {
            bail!("density must be a positive number, got {}", self.density);
        }

        let mut names = HashSet::new();
        for target in &self.png {
            if target.name.is_empty() {
                bail!("png target of size {} has an empty name", target.size);
            }
            if !is_plain_file_name(&target.name) {
                bail!("png target name {} must be a bare file name", target.name);
            }
            if target.size == 0 {
                bail!("png target {} has size 0", target.name);
            }
            if !names.insert(target.name.as_str()) {
                bail!("output name {} is used twice", target.name);
            }
        }
        if self.ico.name.is_empty() {
            bail!("ico target has an empty name");
        }
        if !is_plain_file_name(&self.ico.name) {
            bail!("ico target name {} must be a bare file name", self.ico.name);
        }
        if !names.insert(self.ico.name.as_str()) {
            bail!("output name {} is used twice", self.ico.name);
        }

        if self.ico.sizes.is_empty() {
            bail!("ico target {} lists no sizes", self.ico.name);
        }
        let mut sizes = HashSet::new();
        for &size in &self.ico.sizes {
            if !(1..=MAX_EDGE_LENGTH).contains(&size) {
                bail!("ico size {size} is outside 1..={MAX_EDGE_LENGTH}");
            }
            if !sizes.insert(size) {
                bail!("ico size {size} is listed twice");
            }
        }
        Ok(())
    }
}

// Exactly one normal component: no separators, `..`, or roots
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
