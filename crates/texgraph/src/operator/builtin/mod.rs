//! Small built-in operators so a graph can be exercised end to end.
//!
//! - generators: `solid`, `noise`, `gradient`
//! - filters: `invert`, `channel`
//! - compositing: `blend`
//! - iterative: `blur` (one pass per scheduler tick)
use glam::Vec4;

use crate::error::{Error, Result};
use crate::image::ImageHandle;
use crate::operator::OperatorRegistry;

pub mod blend;
pub mod blur;
pub mod filters;
pub mod generators;

pub use blend::{Blend, BlendMode};
pub use blur::Blur;
pub use filters::{Channel, Invert};
pub use generators::{Gradient, Noise, Solid};

/// Registers every built-in operator under its canonical name.
pub fn register_all(registry: &mut OperatorRegistry) -> Result<()> {
    registry.register_default::<Solid>("solid")?;
    registry.register_default::<Noise>("noise")?;
    registry.register_default::<Gradient>("gradient")?;
    registry.register_default::<Invert>("invert")?;
    registry.register_default::<Channel>("channel")?;
    registry.register_default::<Blend>("blend")?;
    registry.register_default::<Blur>("blur")?;
    Ok(())
}

/// Writes `f(x, y)` into every pixel of `target`.
pub(crate) fn generate(target: &ImageHandle, mut f: impl FnMut(u32, u32) -> Vec4) {
    let mut image = target.write();
    for y in 0..image.height {
        for x in 0..image.width {
            let v = f(x, y);
            image.set_pixel(x, y, v);
        }
    }
}

/// Writes `f(source pixel)` into every pixel of `target`. Sources smaller than
/// the target are edge-clamped.
pub(crate) fn map_pixels(
    source: &ImageHandle,
    target: &ImageHandle,
    f: impl Fn(Vec4) -> Vec4,
) -> Result<()> {
    if source.ptr_eq(target) {
        return Err(Error::Operator("source and target alias the same image".into()));
    }
    let src = source.read();
    let mut dst = target.write();
    for y in 0..dst.height {
        for x in 0..dst.width {
            let v = f(src.pixel_clamped(x as i64, y as i64));
            dst.set_pixel(x, y, v);
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use glam::UVec2;

    use super::*;
    use crate::graph::{ConnectorId, Graph, NodeId, State};
    use crate::scene::SceneSettings;

    pub(crate) fn scene() -> SceneSettings {
        SceneSettings::default().with_size(6, 4)
    }

    /// Steps `id` until it settles; returns the number of steps taken.
    pub(crate) fn run(g: &mut Graph, id: NodeId) -> usize {
        let scene = scene();
        let mut steps = 0;
        loop {
            steps += 1;
            if g.process_step(id, &scene).expect("node exists") {
                return steps;
            }
            if g.node(id).unwrap().state() == State::Error || steps > 1_000 {
                return steps;
            }
        }
    }

    pub(crate) fn pixel(g: &Graph, id: NodeId, x: u32, y: u32) -> Vec4 {
        g.node(id).unwrap().image().expect("image layer").read().pixel(x, y)
    }

    pub(crate) fn link(g: &mut Graph, from: NodeId, to: NodeId, input: usize) {
        assert!(g.connect(ConnectorId::output(from, 0), ConnectorId::input(to, input)));
    }

    #[test]
    fn every_builtin_is_registered() {
        let registry = OperatorRegistry::with_builtins();
        assert_eq!(
            registry.names(),
            vec!["blend", "blur", "channel", "gradient", "invert", "noise", "solid"]
        );
    }

    #[test]
    fn map_pixels_rejects_aliasing() {
        let h = ImageHandle::allocate(UVec2::new(2, 2), 4);
        assert!(map_pixels(&h, &h, |v| v).is_err());
        let out = ImageHandle::allocate(UVec2::new(3, 3), 4);
        h.write().fill(Vec4::splat(0.25));
        map_pixels(&h, &out, |v| v * 2.0).expect("distinct handles");
        assert_eq!(out.read().pixel(2, 2), Vec4::splat(0.5));
    }
}
