//! Two-input compositing.
use glam::Vec4;

use super::map_pixels;
use crate::error::{Error, Result};
use crate::operator::{InputSpec, Operator, ProcessContext, Progress};
use crate::render_set::DEFAULT_LAYER;
use crate::settings::{Setting, Settings};

/// How `overlay` is combined with `base`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendMode {
    Mix,
    Add,
    Multiply,
}

impl BlendMode {
    pub const ALL: [BlendMode; 3] = [BlendMode::Mix, BlendMode::Add, BlendMode::Multiply];

    pub fn label(self) -> &'static str {
        match self {
            BlendMode::Mix => "mix",
            BlendMode::Add => "add",
            BlendMode::Multiply => "multiply",
        }
    }

    pub fn from_index(index: i32) -> Option<BlendMode> {
        usize::try_from(index).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    /// Combines rgb; alpha follows `base`.
    pub fn apply(self, base: Vec4, overlay: Vec4, opacity: f32) -> Vec4 {
        let blended = match self {
            BlendMode::Mix => overlay,
            BlendMode::Add => (base + overlay).min(Vec4::ONE),
            BlendMode::Multiply => base * overlay,
        };
        base.lerp(blended, opacity).with_w(base.w)
    }
}

/// Blends an optional `overlay` onto a required `base`.
#[derive(Debug, Default)]
pub struct Blend;

impl Operator for Blend {
    fn inputs(&self) -> Vec<InputSpec> {
        vec![InputSpec::required("base"), InputSpec::optional("overlay")]
    }

    fn register_settings(&self, settings: &mut Settings) {
        let modes = BlendMode::ALL
            .iter()
            .enumerate()
            .map(|(i, m)| (m.label(), i as i32));
        settings
            .add(Setting::new("mode", 0i32).with_choices(modes))
            .add(Setting::new("opacity", 1.0f32).with_range(0.0f32, 1.0f32));
    }

    fn process(&mut self, ctx: &ProcessContext<'_>) -> Result<Progress> {
        let index = ctx.settings.value::<i32>("mode").unwrap_or(0);
        let mode = BlendMode::from_index(index)
            .ok_or_else(|| Error::Operator(format!("unknown blend mode {index}")))?;
        let opacity: f32 = ctx.settings.value("opacity").unwrap_or(1.0);
        let base = ctx.required_image(0)?;
        let out = ctx.default_output()?;

        let Some(overlay) = ctx.input_layer(1, DEFAULT_LAYER)? else {
            map_pixels(&base, &out, |v| v)?;
            return Ok(Progress::Complete);
        };
        if overlay.ptr_eq(&out) || base.ptr_eq(&out) {
            return Err(Error::Operator("inputs alias the blend output".into()));
        }
        let base = base.read();
        let overlay = overlay.read();
        let mut dst = out.write();
        for y in 0..dst.height {
            for x in 0..dst.width {
                let (x, y) = (x as i64, y as i64);
                let v = mode.apply(base.pixel_clamped(x, y), overlay.pixel_clamped(x, y), opacity);
                dst.set_pixel(x as u32, y as u32, v);
            }
        }
        Ok(Progress::Complete)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{link, pixel, run};
    use super::*;
    use crate::graph::Graph;

    #[test]
    fn modes_combine_rgb_and_keep_base_alpha() {
        let base = Vec4::new(0.5, 0.5, 0.5, 0.25);
        let over = Vec4::new(1.0, 0.0, 0.5, 1.0);
        assert_eq!(BlendMode::Mix.apply(base, over, 1.0), over.with_w(0.25));
        assert_eq!(BlendMode::Mix.apply(base, over, 0.0), base);
        assert_eq!(
            BlendMode::Add.apply(base, over, 1.0),
            Vec4::new(1.0, 0.5, 1.0, 0.25)
        );
        assert_eq!(
            BlendMode::Multiply.apply(base, over, 1.0),
            Vec4::new(0.5, 0.0, 0.25, 0.25)
        );
        assert_eq!(BlendMode::from_index(3), None);
    }

    #[test]
    fn blend_copies_base_without_overlay_and_mixes_with_one() {
        let mut g = Graph::with_builtins();
        let base = g.create_node("solid");
        let over = g.create_node("solid");
        let blend = g.create_node("blend");
        g.update_setting(base, "color", Vec4::new(0.0, 0.0, 0.0, 1.0))
            .unwrap();
        g.update_setting(over, "color", Vec4::ONE).unwrap();
        g.update_setting(blend, "opacity", 0.5f32).unwrap();
        link(&mut g, base, blend, 0);
        run(&mut g, base);
        run(&mut g, blend);
        assert_eq!(pixel(&g, blend, 0, 0), Vec4::new(0.0, 0.0, 0.0, 1.0));

        link(&mut g, over, blend, 1);
        g.node_mut(blend).unwrap().reset();
        run(&mut g, over);
        run(&mut g, blend);
        assert_eq!(pixel(&g, blend, 2, 2), Vec4::new(0.5, 0.5, 0.5, 1.0));
        assert!(g.update_setting(blend, "mode", 7).is_err());
    }
}
