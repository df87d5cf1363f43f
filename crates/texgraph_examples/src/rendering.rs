use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use image::{Rgba, RgbaImage};
use texgraph::prelude::*;

/// How float pixels are turned into 8-bit PNG output.
#[derive(Debug, Clone, Copy)]
pub struct PngConfig {
    /// Integer upscale factor applied with nearest-neighbour filtering.
    pub scale: u32,
    /// Background blended under pixels whose alpha is below one.
    pub background: [u8; 3],
}

impl Default for PngConfig {
    fn default() -> Self {
        Self {
            scale: 1,
            background: [240, 240, 244],
        }
    }
}

impl PngConfig {
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale.max(1);
        self
    }

    pub fn with_background(mut self, background: [u8; 3]) -> Self {
        self.background = background;
        self
    }
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Writes `handle` to `path` as an opaque RGBA PNG.
pub fn image_to_png(
    handle: &ImageHandle,
    config: &PngConfig,
    path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    let source = handle.snapshot();
    if source.width == 0 || source.height == 0 {
        bail!("refusing to write an empty image to {}", path.display());
    }

    let scale = config.scale.max(1);
    let bg = glam::Vec3::from_array(config.background.map(|c| c as f32 / 255.0));
    let mut out = RgbaImage::new(source.width * scale, source.height * scale);
    for (x, y, px) in out.enumerate_pixels_mut() {
        let v = source.pixel(x / scale, y / scale);
        let rgb = bg.lerp(v.truncate(), v.w.clamp(0.0, 1.0));
        *px = Rgba([to_byte(rgb.x), to_byte(rgb.y), to_byte(rgb.z), 255]);
    }

    out.save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("wrote {}x{} {}", out.width(), out.height(), path.display());
    Ok(())
}

/// Writes layer `layer` of `node`'s render set to `path`.
pub fn layer_to_png(
    scene: &Scene,
    node: NodeId,
    layer: &str,
    config: &PngConfig,
    path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let set = scene
        .render_set(node)
        .ok_or_else(|| anyhow!("node {node} does not exist"))?;
    let handle = set
        .get(layer)
        .ok_or_else(|| anyhow!("node {node} has no layer {layer:?}"))?;
    image_to_png(handle, config, path)
}

/// Makes `view` the view node and blocks until the background worker settles it.
pub fn settle(scene: &Scene, view: NodeId, timeout: Duration) -> anyhow::Result<()> {
    scene.set_view_node(Some(view))?;
    if !scene.wait_idle(timeout) {
        bail!("scene did not settle within {timeout:?}");
    }
    match scene.node_state(view) {
        Some(State::Processed) => Ok(()),
        Some(state) => Err(anyhow!(
            "view node {view} ended in {state}: {}",
            scene.node_error(view).unwrap_or_default()
        )),
        None => bail!("view node {view} was removed"),
    }
}
