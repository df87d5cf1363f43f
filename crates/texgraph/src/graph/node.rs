//! A placed operator instance with its settings, ports and processing state.
//!
//! Nodes step through [`State`] under the control of the scheduler:
//! `Unprocessed -> Preprocessing -> Processing -> Processed`, with `Error`
//! reachable from anywhere a fault is recorded. Only [`Node::reset`] leaves
//! `Processed` or `Error`.
use std::fmt;

use glam::{UVec2, Vec2};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::connector::{connector_bounds, Connector, ConnectorId, Direction};
use super::element::{Bounds, ElementFlags, GraphElement};
use super::NodeId;
use crate::error::{Error, Result};
use crate::image::ImageHandle;
use crate::operator::{Operator, OutputSpec, PreprocessContext, ProcessContext};
use crate::persist::{ArchiveReader, ArchiveWriter};
use crate::render_set::{RenderSet, DEFAULT_LAYER};
use crate::scene::SceneSettings;
use crate::settings::{SettingValue, Settings};

/// Default editor size of a node.
pub const DEFAULT_NODE_SIZE: Vec2 = Vec2::new(120.0, 48.0);

/// Processing lifecycle of a node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum State {
    #[default]
    Unprocessed,
    Preprocessing,
    Processing,
    Processed,
    Error,
}

impl State {
    /// `Processed` or `Error`: nothing more will happen without a reset.
    #[inline]
    pub fn is_settled(self) -> bool {
        matches!(self, State::Processed | State::Error)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            State::Unprocessed => "unprocessed",
            State::Preprocessing => "preprocessing",
            State::Processing => "processing",
            State::Processed => "processed",
            State::Error => "error",
        };
        f.write_str(s)
    }
}

/// A graph node wrapping one operator instance.
pub struct Node {
    id: NodeId,
    type_name: String,
    operator: Option<Box<dyn Operator>>,
    settings: Settings,
    inputs: Vec<Connector>,
    input_names: Vec<String>,
    outputs: Vec<Connector>,
    output_specs: Vec<OutputSpec>,
    state: State,
    error: Option<String>,
    dirty: bool,
    render_set: RenderSet,
    owned: RenderSet,
    image_size: UVec2,
    position: Vec2,
    size: Vec2,
    flags: ElementFlags,
}

impl Node {
    /// Builds a node around `operator`. A `None` operator makes a null node that
    /// can be placed and wired but always fails to process.
    pub fn new(
        id: NodeId,
        type_name: impl Into<String>,
        operator: Option<Box<dyn Operator>>,
    ) -> Self {
        let mut settings = Settings::new();
        let (input_specs, output_specs) = match &operator {
            Some(op) => {
                op.register_settings(&mut settings);
                (op.inputs(), op.outputs())
            }
            None => (Vec::new(), Vec::new()),
        };

        let inputs = input_specs
            .iter()
            .enumerate()
            .map(|(i, spec)| Connector::new_input(id, i, spec.name.clone(), spec.required))
            .collect();
        let outputs = output_specs
            .iter()
            .enumerate()
            .map(|(i, spec)| Connector::new_output(id, i, spec.name.clone()))
            .collect();

        Self {
            id,
            type_name: type_name.into(),
            operator,
            settings,
            inputs,
            input_names: input_specs.into_iter().map(|s| s.name).collect(),
            outputs,
            output_specs,
            state: State::Unprocessed,
            error: None,
            dirty: false,
            render_set: RenderSet::new(),
            owned: RenderSet::new(),
            image_size: UVec2::ZERO,
            position: Vec2::ZERO,
            size: DEFAULT_NODE_SIZE,
            flags: ElementFlags::NONE,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Registry name the node was created from.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// `true` if no operator is registered under the node's type name.
    pub fn is_null(&self) -> bool {
        self.operator.is_none()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn inputs(&self) -> &[Connector] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Connector] {
        &self.outputs
    }

    pub fn connectors(&self, direction: Direction) -> &[Connector] {
        match direction {
            Direction::Input => &self.inputs,
            Direction::Output => &self.outputs,
        }
    }

    pub fn connector(&self, id: ConnectorId) -> Option<&Connector> {
        if id.node != self.id {
            return None;
        }
        self.connectors(id.direction).get(id.index)
    }

    pub(crate) fn connector_mut(&mut self, id: ConnectorId) -> Option<&mut Connector> {
        if id.node != self.id {
            return None;
        }
        match id.direction {
            Direction::Input => self.inputs.get_mut(id.index),
            Direction::Output => self.outputs.get_mut(id.index),
        }
    }

    /// Input connector by name.
    pub fn input_named(&self, name: &str) -> Option<&Connector> {
        self.inputs.iter().find(|c| c.name() == name)
    }

    /// Output connector by name.
    pub fn output_named(&self, name: &str) -> Option<&Connector> {
        self.outputs.iter().find(|c| c.name() == name)
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Layers currently visible for this node.
    pub fn render_set(&self) -> &RenderSet {
        &self.render_set
    }

    /// Output resources allocated and owned by this node.
    pub fn owned_outputs(&self) -> &RenderSet {
        &self.owned
    }

    /// Size of the output images computed during preprocessing.
    pub fn image_size(&self) -> UVec2 {
        self.image_size
    }

    /// Default layer of the render set, if present.
    pub fn image(&self) -> Option<&ImageHandle> {
        self.render_set.get(DEFAULT_LAYER)
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn set_size(&mut self, size: Vec2) {
        self.size = size.max(Vec2::ZERO);
    }

    pub fn set_flags(&mut self, flags: ElementFlags) {
        self.flags = flags;
    }

    pub fn flags_mut(&mut self) -> &mut ElementFlags {
        &mut self.flags
    }

    /// Layout rectangle of one of this node's connectors.
    pub fn connector_bounds(&self, id: ConnectorId) -> Option<Bounds> {
        let connector = self.connector(id)?;
        Some(connector.bounds(self.bounds(), self.connectors(id.direction).len()))
    }

    /// Connector under `p`, inputs first.
    pub fn connector_at(&self, p: Vec2) -> Option<ConnectorId> {
        let bounds = self.bounds();
        [Direction::Input, Direction::Output]
            .into_iter()
            .flat_map(|dir| {
                let siblings = self.connectors(dir).len();
                self.connectors(dir)
                    .iter()
                    .map(move |c| (c.id(), connector_bounds(bounds, dir, c.index(), siblings)))
            })
            .find(|(_, b)| b.contains(p))
            .map(|(id, _)| id)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Validates, applies and marks the node dirty.
    pub fn update_setting(&mut self, name: &str, value: impl Into<SettingValue>) -> Result<()> {
        self.settings.set(name, value.into())?;
        self.dirty = true;
        Ok(())
    }

    /// Restores every setting to its default and marks the node dirty.
    pub fn restore_default_settings(&mut self) {
        self.settings.restore_defaults();
        self.dirty = true;
    }

    /// Back to `Unprocessed`. Clears the error, the dirty flag and the render set,
    /// and resets the operator. Owned output images are kept for reuse.
    pub fn reset(&mut self) {
        self.state = State::Unprocessed;
        self.error = None;
        self.dirty = false;
        self.render_set.clear();
        if let Some(op) = self.operator.as_mut() {
            op.reset();
        }
    }

    /// Records a fault and enters the error state.
    pub fn set_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("Node {} ({}) failed: {}.", self.id, self.type_name, message);
        self.error = Some(message);
        self.state = State::Error;
    }

    /// Advances the state machine by one scheduler tick. `inputs` is the outcome of
    /// [`crate::graph::Graph::evaluate_inputs`]. Returns `true` once the node is
    /// processed.
    pub fn process_step(
        &mut self,
        inputs: Result<Vec<Option<RenderSet>>>,
        scene: &SceneSettings,
    ) -> bool {
        match self.state {
            State::Processed => return true,
            State::Error => return false,
            _ => {}
        }

        if self.operator.is_none() {
            self.set_error(
                Error::UnknownOperator {
                    name: self.type_name.clone(),
                }
                .to_string(),
            );
            return false;
        }

        let inputs = match inputs {
            Ok(inputs) => inputs,
            Err(e) => {
                self.set_error(e.to_string());
                return false;
            }
        };

        if matches!(self.state, State::Unprocessed | State::Preprocessing) {
            self.state = State::Preprocessing;
            if let Err(e) = self.preprocess(&inputs, scene) {
                self.set_error(e.to_string());
                return false;
            }
            self.state = State::Processing;
        }

        self.process(&inputs, scene)
    }

    fn preprocess(&mut self, inputs: &[Option<RenderSet>], scene: &SceneSettings) -> Result<()> {
        let size = inputs
            .iter()
            .flatten()
            .find_map(|set| {
                set.layer_size(DEFAULT_LAYER)
                    .or_else(|| set.first().map(|(_, h)| h.size()))
            })
            .unwrap_or_else(|| scene.size());

        let mut ctx = PreprocessContext {
            inputs,
            settings: &self.settings,
            scene,
            size,
        };
        if let Some(op) = self.operator.as_mut() {
            op.preprocess(&mut ctx)?;
        }
        let size = ctx.size;
        if size.x == 0 || size.y == 0 {
            return Err(Error::InvalidConfig(format!("output size {size} is empty")));
        }
        self.image_size = size;

        for spec in &self.output_specs {
            match self.owned.get(&spec.name) {
                Some(handle) => handle.write().resize(size.x, size.y, spec.channels),
                None => self
                    .owned
                    .insert(spec.name.clone(), ImageHandle::allocate(size, spec.channels)),
            }
        }

        self.render_set.clear();
        if let Some(first) = inputs.iter().flatten().next() {
            self.render_set.extend_from(first);
        }
        self.render_set.extend_from(&self.owned);
        debug!("Node {} preprocessed at {}.", self.id, size);
        Ok(())
    }

    fn process(&mut self, inputs: &[Option<RenderSet>], scene: &SceneSettings) -> bool {
        let Some(op) = self.operator.as_mut() else {
            return false;
        };
        let ctx = ProcessContext {
            inputs,
            input_names: &self.input_names,
            outputs: &self.owned,
            settings: &self.settings,
            scene,
            size: self.image_size,
        };
        match op.process(&ctx) {
            Ok(progress) if progress.is_complete() => {
                self.state = State::Processed;
                debug!("Node {} processed.", self.id);
                true
            }
            Ok(_) => false,
            Err(e) => {
                self.set_error(e.to_string());
                false
            }
        }
    }

    /// Writes `{id, type, pos, size, flags, settings}` into the current object.
    pub fn serialize(&self, w: &mut dyn ArchiveWriter) -> Result<()> {
        w.write_uint("id", self.id.0)?;
        w.write_str("type", &self.type_name)?;
        w.write_vec2("pos", self.position)?;
        w.write_vec2("size", self.size)?;
        w.write_uint("flags", self.flags.bits() as u64)?;
        w.start_object("settings")?;
        for setting in &self.settings {
            w.write_property(setting.name(), setting.raw_value())?;
        }
        w.finish_object()
    }

    /// Reads placement, flags and settings from the current object. Nothing is
    /// applied unless every field reads back valid and every setting is known.
    /// The node's identity is left untouched.
    pub fn deserialize(&mut self, r: &mut dyn ArchiveReader) -> Result<()> {
        let position = r.read_vec2("pos")?;
        let size = if r.contains("size") {
            r.read_vec2("size")?
        } else {
            self.size
        };
        let bits = r.read_uint("flags")?.min(u8::MAX as u64) as u8;
        let flags = ElementFlags::from_bits_truncate(bits);

        let mut staged = Vec::new();
        if r.contains("settings") {
            r.enter_object("settings")?;
            let result = self.stage_settings(r, &mut staged);
            r.leave_object()?;
            result?;
        }

        let mut settings = self.settings.clone();
        for (name, value) in staged {
            settings.set(&name, value)?;
        }

        self.settings = settings;
        self.position = position;
        self.set_size(size);
        self.flags = flags;
        self.dirty = true;
        Ok(())
    }

    fn stage_settings(
        &self,
        r: &mut dyn ArchiveReader,
        staged: &mut Vec<(String, SettingValue)>,
    ) -> Result<()> {
        for name in r.keys()? {
            let Some(setting) = self.settings.get(&name) else {
                return Err(Error::UnknownSetting { name });
            };
            let value = setting.check(r.read_property(&name)?)?;
            staged.push((name, value));
        }
        Ok(())
    }
}

impl GraphElement for Node {
    fn bounds(&self) -> Bounds {
        Bounds::from_pos_size(self.position, self.size)
    }

    fn flags(&self) -> ElementFlags {
        self.flags
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .field("state", &self.state)
            .field("dirty", &self.dirty)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec4;

    use super::*;
    use crate::operator::{InputSpec, Progress};
    use crate::settings::Setting;

    /// Completes after `calls` process calls and records how often it ran.
    struct Counting {
        calls: u32,
        seen: u32,
        resets: u32,
    }

    impl Counting {
        fn new(calls: u32) -> Self {
            Self {
                calls,
                seen: 0,
                resets: 0,
            }
        }
    }

    impl Operator for Counting {
        fn inputs(&self) -> Vec<InputSpec> {
            vec![InputSpec::optional("source")]
        }

        fn register_settings(&self, settings: &mut Settings) {
            settings.add(Setting::new("x", 0.5f32).with_range(0.0f32, 1.0f32));
        }

        fn process(&mut self, ctx: &ProcessContext<'_>) -> Result<Progress> {
            self.seen += 1;
            ctx.default_output()?.write().fill(Vec4::splat(self.seen as f32));
            if self.seen >= self.calls {
                Ok(Progress::Complete)
            } else {
                Ok(Progress::Pending)
            }
        }

        fn reset(&mut self) {
            self.seen = 0;
            self.resets += 1;
        }
    }

    fn node(calls: u32) -> Node {
        Node::new(NodeId(1), "counting", Some(Box::new(Counting::new(calls))))
    }

    #[test]
    fn construction_seeds_settings_and_connectors() {
        let node = node(1);
        assert_eq!(node.settings().value::<f32>("x"), Some(0.5));
        assert_eq!(node.inputs().len(), 1);
        assert!(!node.inputs()[0].is_required());
        assert_eq!(node.outputs()[0].name(), DEFAULT_LAYER);
        assert_eq!(node.state(), State::Unprocessed);
        assert!(!node.is_dirty());
    }

    #[test]
    fn multi_tick_operator_stays_processing_until_complete() {
        let mut node = node(4);
        let scene = SceneSettings::default();
        for _ in 0..3 {
            assert!(!node.process_step(Ok(vec![None]), &scene));
            assert_eq!(node.state(), State::Processing);
        }
        assert!(node.process_step(Ok(vec![None]), &scene));
        assert_eq!(node.state(), State::Processed);
        // further steps are no-ops
        assert!(node.process_step(Ok(vec![None]), &scene));
        let image = node.image().expect("default layer").read().pixel(0, 0);
        assert_eq!(image, Vec4::splat(4.0));
    }

    #[test]
    fn input_errors_are_terminal_until_reset() {
        let mut node = node(1);
        let scene = SceneSettings::default();
        let failed = node.process_step(
            Err(Error::MissingInput {
                input: "source".into(),
            }),
            &scene,
        );
        assert!(!failed);
        assert_eq!(node.state(), State::Error);
        assert!(node.error().unwrap().contains("source"));
        assert!(!node.process_step(Ok(vec![None]), &scene));
        assert_eq!(node.state(), State::Error);

        node.reset();
        assert_eq!(node.state(), State::Unprocessed);
        assert!(node.error().is_none());
        assert!(node.process_step(Ok(vec![None]), &scene));
    }

    #[test]
    fn reset_keeps_owned_outputs_and_reproduces_layers() {
        let mut node = node(1);
        let scene = SceneSettings::default().with_size(16, 8);
        assert!(node.process_step(Ok(vec![None]), &scene));
        let before: Vec<(String, UVec2)> = node
            .render_set()
            .iter()
            .map(|(n, h)| (n.to_owned(), h.size()))
            .collect();
        let owned = node.owned_outputs().get(DEFAULT_LAYER).cloned().unwrap();

        node.reset();
        assert!(node.render_set().is_empty());
        assert!(node.owned_outputs().get(DEFAULT_LAYER).unwrap().ptr_eq(&owned));

        assert!(node.process_step(Ok(vec![None]), &scene));
        let after: Vec<(String, UVec2)> = node
            .render_set()
            .iter()
            .map(|(n, h)| (n.to_owned(), h.size()))
            .collect();
        assert_eq!(before, after);
        assert_eq!(after, vec![(DEFAULT_LAYER.to_owned(), UVec2::new(16, 8))]);
    }

    #[test]
    fn render_set_passes_through_upstream_layers() {
        let mut node = node(1);
        let mut upstream = RenderSet::new();
        let mask = ImageHandle::allocate(UVec2::new(5, 3), 1);
        upstream.insert("mask", mask.clone());
        upstream.insert(DEFAULT_LAYER, ImageHandle::allocate(UVec2::new(5, 3), 4));

        assert!(node.process_step(Ok(vec![Some(upstream.clone())]), &SceneSettings::default()));
        assert!(node.render_set().get("mask").unwrap().ptr_eq(&mask));
        let own = node.render_set().get(DEFAULT_LAYER).unwrap();
        assert!(!own.ptr_eq(upstream.get(DEFAULT_LAYER).unwrap()));
        assert_eq!(node.image_size(), UVec2::new(5, 3));
    }

    #[test]
    fn null_nodes_always_fail() {
        let mut node = Node::new(NodeId(3), "does-not-exist", None);
        assert!(node.is_null());
        assert!(!node.process_step(Ok(Vec::new()), &SceneSettings::default()));
        assert_eq!(node.state(), State::Error);
        assert!(node.error().unwrap().contains("does-not-exist"));
    }

    #[test]
    fn update_setting_marks_dirty_and_rejects_unknown_names() {
        let mut node = node(1);
        node.update_setting("x", 0.8f32).expect("known setting");
        assert!(node.is_dirty());
        assert_eq!(node.settings().value::<f32>("x"), Some(0.8));

        node.reset();
        let err = node.update_setting("nope", 1.0f32).expect_err("unknown");
        assert!(matches!(err, Error::UnknownSetting { .. }));
        assert!(!node.is_dirty());
    }

    #[test]
    fn restoring_defaults_marks_dirty() {
        let mut node = node(1);
        node.update_setting("x", 0.1f32).unwrap();
        node.reset();
        node.restore_default_settings();
        assert_eq!(node.settings().value::<f32>("x"), Some(0.5));
        assert!(node.is_dirty());
    }

    #[test]
    fn connector_hit_testing_uses_node_bounds() {
        let mut node = node(1);
        node.set_position(Vec2::new(100.0, 100.0));
        let input = node.inputs()[0].id();
        let b = node.connector_bounds(input).unwrap();
        assert_eq!(node.connector_at(b.center()), Some(input));
        assert_eq!(node.connector_at(Vec2::ZERO), None);
        assert!(node.hit_test(Vec2::new(110.0, 110.0)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn settings_round_trip_into_a_fresh_node() {
        use crate::persist::{JsonReader, JsonWriter};

        let mut original = node(1);
        original.update_setting("x", 0.8f32).unwrap();
        original.set_position(Vec2::new(4.0, 2.0));
        original.flags_mut().insert(ElementFlags::SELECTED);

        let mut w = JsonWriter::new();
        w.start_object("node").unwrap();
        original.serialize(&mut w).unwrap();
        w.finish_object().unwrap();
        let mut r = JsonReader::new(w.into_value().unwrap());

        let mut fresh = Node::new(NodeId(9), "counting", Some(Box::new(Counting::new(1))));
        r.enter_object("node").unwrap();
        fresh.deserialize(&mut r).expect("valid document");
        assert_eq!(fresh.settings().get("x").unwrap().value::<f32>(), Some(0.8));
        assert_eq!(fresh.position(), Vec2::new(4.0, 2.0));
        assert!(fresh.is_selected());
        assert!(fresh.is_dirty());
        assert_eq!(fresh.id(), NodeId(9));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn failed_deserialize_leaves_node_untouched() {
        use crate::persist::JsonReader;

        let doc = serde_json::json!({
            "pos": [1.0, 1.0],
            "flags": 0,
            "settings": { "x": { "Bool": true } }
        });
        let mut r = JsonReader::new(doc);
        let mut target = node(1);
        assert!(target.deserialize(&mut r).is_err());
        assert_eq!(target.settings().value::<f32>("x"), Some(0.5));
        assert_eq!(target.position(), Vec2::ZERO);
        assert!(!target.is_dirty());
    }
}
