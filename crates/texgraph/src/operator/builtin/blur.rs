//! Iterative box blur.
use glam::Vec4;

use super::map_pixels;
use crate::error::Result;
use crate::operator::{InputSpec, Operator, ProcessContext, Progress};
use crate::settings::{Setting, Settings};

/// Repeated 3x3 box filter. Each `process` call performs a single pass, so a
/// blur with `passes = n` needs `n` scheduler ticks to complete.
#[derive(Debug, Default)]
pub struct Blur {
    done: u32,
}

impl Blur {
    /// Passes performed since the last reset.
    pub fn passes_done(&self) -> u32 {
        self.done
    }
}

impl Operator for Blur {
    fn inputs(&self) -> Vec<InputSpec> {
        vec![InputSpec::required("source")]
    }

    fn register_settings(&self, settings: &mut Settings) {
        settings.add(Setting::new("passes", 4u32).with_range(1u32, 64u32));
    }

    fn process(&mut self, ctx: &ProcessContext<'_>) -> Result<Progress> {
        let passes: u32 = ctx.settings.value("passes").unwrap_or(1);
        let out = ctx.default_output()?;
        if self.done == 0 {
            map_pixels(&ctx.required_image(0)?, &out, |v| v)?;
        }

        let previous = out.snapshot();
        let mut dst = out.write();
        for y in 0..dst.height {
            for x in 0..dst.width {
                let mut sum = Vec4::ZERO;
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        sum += previous.pixel_clamped(x as i64 + dx, y as i64 + dy);
                    }
                }
                dst.set_pixel(x, y, sum / 9.0);
            }
        }

        self.done += 1;
        if self.done >= passes {
            Ok(Progress::Complete)
        } else {
            Ok(Progress::Pending)
        }
    }

    fn reset(&mut self) {
        self.done = 0;
    }
}
