//! The pluggable unit of computation behind every node.
//!
//! An [`Operator`] declares its ports and settings, then does its numeric work in
//! [`Operator::process`], which the scheduler calls once per tick until it reports
//! [`Progress::Complete`]. Operators are created by name through an
//! [`OperatorRegistry`].
use glam::UVec2;

use crate::error::{Error, Result};
use crate::image::ImageHandle;
use crate::render_set::{RenderSet, DEFAULT_LAYER};
use crate::scene::SceneSettings;
use crate::settings::Settings;

pub mod builtin;
pub mod registry;

pub use registry::{OperatorFactory, OperatorRegistry};

/// Declared input port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputSpec {
    pub name: String,
    /// A required input must be connected for the node to process.
    pub required: bool,
}

impl InputSpec {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }
}

/// Declared output port. Each output owns one image layer of the same name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputSpec {
    pub name: String,
    pub channels: u32,
}

impl OutputSpec {
    pub fn new(name: impl Into<String>, channels: u32) -> Self {
        Self {
            name: name.into(),
            channels,
        }
    }
}

/// Result of a single [`Operator::process`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// More calls are needed.
    Pending,
    /// Outputs are final.
    Complete,
}

impl Progress {
    #[inline]
    pub fn is_complete(self) -> bool {
        matches!(self, Progress::Complete)
    }
}

/// One-time setup before processing starts.
pub struct PreprocessContext<'a> {
    /// Upstream render sets by input index; `None` for unconnected optional inputs.
    pub inputs: &'a [Option<RenderSet>],
    pub settings: &'a Settings,
    pub scene: &'a SceneSettings,
    /// Output image size. Pre-filled from the first connected input or the scene;
    /// operators may overwrite it.
    pub size: UVec2,
}

/// Everything an operator can see while processing.
pub struct ProcessContext<'a> {
    pub(crate) inputs: &'a [Option<RenderSet>],
    pub(crate) input_names: &'a [String],
    pub(crate) outputs: &'a RenderSet,
    pub settings: &'a Settings,
    pub scene: &'a SceneSettings,
    /// Size of the node's output images.
    pub size: UVec2,
}

impl<'a> ProcessContext<'a> {
    /// Upstream render set at `index`, or `None` if unconnected.
    pub fn input(&self, index: usize) -> Option<&RenderSet> {
        self.inputs.get(index).and_then(Option::as_ref)
    }

    /// Named layer of input `index`.
    ///
    /// Unconnected inputs yield `Ok(None)`. A connected input that lacks the layer
    /// is a configuration error.
    pub fn input_layer(&self, index: usize, layer: &str) -> Result<Option<ImageHandle>> {
        let Some(set) = self.input(index) else {
            return Ok(None);
        };
        match set.get(layer) {
            Some(handle) => Ok(Some(handle.clone())),
            None => Err(Error::MissingLayer {
                input: self.input_name(index),
                layer: layer.to_owned(),
            }),
        }
    }

    /// Default layer of a required input.
    pub fn required_image(&self, index: usize) -> Result<ImageHandle> {
        self.input_layer(index, DEFAULT_LAYER)?
            .ok_or_else(|| Error::MissingInput {
                input: self.input_name(index),
            })
    }

    /// Handle of one of the node's own declared outputs.
    pub fn output(&self, name: &str) -> Result<ImageHandle> {
        self.outputs
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Operator(format!("operator has no output '{name}'")))
    }

    /// Shortcut for `output(DEFAULT_LAYER)`.
    pub fn default_output(&self) -> Result<ImageHandle> {
        self.output(DEFAULT_LAYER)
    }

    fn input_name(&self, index: usize) -> String {
        self.input_names
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("#{index}"))
    }
}

/// Pluggable computation unit.
///
/// The engine guarantees that [`Operator::register_settings`] runs exactly once at
/// node construction, that [`Operator::reset`] runs before processing resumes after
/// any settings or topology change, and that `process` only sees inputs whose
/// nodes are processed.
pub trait Operator: Send {
    fn inputs(&self) -> Vec<InputSpec> {
        Vec::new()
    }

    fn outputs(&self) -> Vec<OutputSpec> {
        vec![OutputSpec::new(DEFAULT_LAYER, 4)]
    }

    fn register_settings(&self, _settings: &mut Settings) {}

    fn preprocess(&mut self, _ctx: &mut PreprocessContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Advance the computation. Returning an error puts the node into its error state.
    fn process(&mut self, ctx: &ProcessContext<'_>) -> Result<Progress>;

    /// Drop operator-local progress such as iteration counters.
    fn reset(&mut self) {}
}
