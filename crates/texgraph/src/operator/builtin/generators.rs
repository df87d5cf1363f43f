//! Operators without inputs.
use glam::Vec4;
use rand::rngs::StdRng;
use rand::{Rng as RngCore, SeedableRng};

use super::generate;
use crate::error::Result;
use crate::operator::{Operator, ProcessContext, Progress};
use crate::settings::{Setting, SettingHints, Settings};

fn rand01(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0)
}

/// Fills the output with one color.
#[derive(Debug, Default)]
pub struct Solid;

impl Operator for Solid {
    fn register_settings(&self, settings: &mut Settings) {
        settings.add(
            Setting::new("color", Vec4::new(0.5, 0.5, 0.5, 1.0))
                .with_range(Vec4::ZERO, Vec4::ONE)
                .with_hints(SettingHints::COLOR),
        );
    }

    fn process(&mut self, ctx: &ProcessContext<'_>) -> Result<Progress> {
        let color: Vec4 = ctx.settings.value("color").unwrap_or(Vec4::ONE);
        ctx.default_output()?.write().fill(color);
        Ok(Progress::Complete)
    }
}

/// Seeded grey white noise.
#[derive(Debug, Default)]
pub struct Noise;

impl Operator for Noise {
    fn register_settings(&self, settings: &mut Settings) {
        settings
            .add(Setting::new("seed", 0u32))
            .add(Setting::new("amplitude", 1.0f32).with_range(0.0f32, 1.0f32));
    }

    fn process(&mut self, ctx: &ProcessContext<'_>) -> Result<Progress> {
        let seed: u32 = ctx.settings.value("seed").unwrap_or_default();
        let amplitude: f32 = ctx.settings.value("amplitude").unwrap_or(1.0);
        let mut rng = StdRng::seed_from_u64(seed as u64);
        generate(&ctx.default_output()?, |_, _| {
            let v = rand01(&mut rng) * amplitude;
            Vec4::new(v, v, v, 1.0)
        });
        Ok(Progress::Complete)
    }
}

/// Linear black-to-white ramp.
#[derive(Debug, Default)]
pub struct Gradient;

impl Gradient {
    pub const HORIZONTAL: i32 = 0;
    pub const VERTICAL: i32 = 1;
}

impl Operator for Gradient {
    fn register_settings(&self, settings: &mut Settings) {
        settings.add(Setting::new("direction", Self::HORIZONTAL).with_choices([
            ("horizontal", Self::HORIZONTAL),
            ("vertical", Self::VERTICAL),
        ]));
    }

    fn process(&mut self, ctx: &ProcessContext<'_>) -> Result<Progress> {
        let vertical = ctx.settings.value::<i32>("direction") == Some(Self::VERTICAL);
        let span = |n: u32| n.saturating_sub(1).max(1) as f32;
        let (w, h) = (span(ctx.size.x), span(ctx.size.y));
        generate(&ctx.default_output()?, |x, y| {
            let v = if vertical { y as f32 / h } else { x as f32 / w };
            Vec4::new(v, v, v, 1.0)
        });
        Ok(Progress::Complete)
    }
}
