//! Single-input per-pixel filters.
use glam::Vec4;

use super::map_pixels;
use crate::error::Result;
use crate::operator::{InputSpec, Operator, ProcessContext, Progress};
use crate::settings::{Setting, SettingHints, Settings};

/// `1 - rgb`, alpha unchanged.
#[derive(Debug, Default)]
pub struct Invert;

impl Operator for Invert {
    fn inputs(&self) -> Vec<InputSpec> {
        vec![InputSpec::required("source")]
    }

    fn process(&mut self, ctx: &ProcessContext<'_>) -> Result<Progress> {
        let source = ctx.required_image(0)?;
        map_pixels(&source, &ctx.default_output()?, |v| {
            (Vec4::ONE - v).with_w(v.w)
        })?;
        Ok(Progress::Complete)
    }
}

/// Broadcasts one channel of the input to grey.
#[derive(Debug, Default)]
pub struct Channel;

impl Operator for Channel {
    fn inputs(&self) -> Vec<InputSpec> {
        vec![InputSpec::required("source")]
    }

    fn register_settings(&self, settings: &mut Settings) {
        settings.add(
            Setting::new("channel", 0i32)
                .with_range(0i32, 3i32)
                .with_hints(SettingHints::CHANNEL_SELECTOR),
        );
    }

    fn process(&mut self, ctx: &ProcessContext<'_>) -> Result<Progress> {
        let channel = ctx.settings.value::<i32>("channel").unwrap_or(0).clamp(0, 3) as usize;
        let source = ctx.required_image(0)?;
        map_pixels(&source, &ctx.default_output()?, |v| {
            Vec4::new(v[channel], v[channel], v[channel], 1.0)
        })?;
        Ok(Progress::Complete)
    }
}
