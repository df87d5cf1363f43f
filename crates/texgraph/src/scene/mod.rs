//! Background evaluation of a graph.
//!
//! A [`Scene`] owns a [`Graph`] behind a mutex and runs one worker thread that
//! evaluates it tick by tick toward the current view node. Edits made through
//! the scene take the same lock, so they never interleave with a tick; each edit
//! marks the affected nodes dirty and wakes the worker, which reconciles before
//! stepping again.
//!
//! The worker sleeps whenever there is nothing to do and can be paused, stepped
//! one tick at a time, or stopped and joined.
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::graph::{ConnectorId, Graph, NodeId, State};
#[cfg(feature = "serde")]
use crate::persist::{ArchiveReader, ArchiveWriter, JsonReader, JsonWriter};
use crate::render_set::RenderSet;
use crate::settings::SettingValue;

pub mod config;
pub mod events;
pub mod scheduler;

pub use config::SceneSettings;
pub use events::{ChannelSink, EventSink, FnSink, SceneEvent, VecSink};
pub use scheduler::Tick;

/// Scheduling state of the worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Schedule {
    /// Nothing left to do until the next edit.
    Idle,
    /// Work may be pending; the worker keeps ticking while unpaused.
    Armed,
    /// The worker has been asked to exit.
    Stopped,
}

struct SceneState {
    graph: Graph,
    view: Option<NodeId>,
    current: Option<NodeId>,
    settings: SceneSettings,
    paused: bool,
    step_once: bool,
    dirty: bool,
    schedule: Schedule,
    sink: Box<dyn EventSink + Send>,
}

impl SceneState {
    /// Records an edit: work may now exist.
    fn touch(&mut self) {
        self.dirty = true;
        self.current = if self.graph.has_dirty() {
            // reconcile pending; stand in with the view node until the next tick
            self.view.filter(|id| self.graph.contains(*id))
        } else {
            scheduler::current_node(&self.graph, self.view)
        };
        if self.schedule != Schedule::Stopped {
            self.schedule = Schedule::Armed;
        }
    }

    fn is_busy(&self) -> bool {
        self.schedule != Schedule::Stopped
            && (self.step_once || (!self.paused && self.schedule == Schedule::Armed))
    }

    fn run_tick(&mut self) -> Tick {
        if std::mem::take(&mut self.dirty) || self.graph.has_dirty() {
            scheduler::reconcile(&mut self.graph, self.sink.as_mut());
        }
        let outcome = scheduler::advance(
            &mut self.graph,
            self.view,
            &self.settings,
            self.sink.as_mut(),
        );
        self.current = scheduler::current_node(&self.graph, self.view);
        if outcome.is_idle() && self.schedule == Schedule::Armed {
            self.schedule = Schedule::Idle;
            debug!("Scene idle.");
            self.sink.send(SceneEvent::Idle);
        }
        outcome
    }
}

struct Shared {
    state: Mutex<SceneState>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SceneState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owner of a graph and its evaluation thread.
pub struct Scene {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl Scene {
    /// Wraps `graph`. The worker is not started until [`Scene::start_processing`].
    pub fn new(graph: Graph, settings: SceneSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::from_parts(graph, settings))
    }

    /// Empty scene over the built-in operators with default settings.
    pub fn with_builtins() -> Self {
        Self::from_parts(Graph::with_builtins(), SceneSettings::default())
    }

    fn from_parts(graph: Graph, settings: SceneSettings) -> Self {
        let state = SceneState {
            graph,
            view: None,
            current: None,
            settings,
            paused: false,
            step_once: false,
            dirty: true,
            schedule: Schedule::Idle,
            sink: Box::new(()),
        };
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                wake: Condvar::new(),
            }),
            worker: None,
        }
    }

    fn edit<R>(&self, f: impl FnOnce(&mut SceneState) -> R) -> R {
        let result = {
            let mut state = self.shared.lock();
            let result = f(&mut state);
            state.touch();
            result
        };
        self.shared.wake.notify_all();
        result
    }

    /// Spawns the evaluation thread. Does nothing if it is already running.
    pub fn start_processing(&mut self) -> Result<()> {
        if self.worker.is_some() {
            return Ok(());
        }
        self.shared.lock().schedule = Schedule::Armed;
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("texgraph-scene".into())
            .spawn(move || run_worker(&shared))?;
        self.worker = Some(handle);
        info!("Scene processing started.");
        Ok(())
    }

    /// Stops and joins the evaluation thread. A node in the middle of a multi-tick
    /// operator is left where it is.
    pub fn stop_processing(&mut self) {
        {
            let mut state = self.shared.lock();
            state.schedule = Schedule::Stopped;
            state.paused = false;
            state.step_once = false;
        }
        self.shared.wake.notify_all();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!("Scene worker panicked.");
            }
            info!("Scene processing stopped.");
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    pub fn schedule(&self) -> Schedule {
        self.shared.lock().schedule
    }

    pub fn set_paused(&self, paused: bool) {
        {
            let mut state = self.shared.lock();
            state.paused = paused;
            if !paused && state.schedule == Schedule::Idle {
                state.schedule = Schedule::Armed;
            }
        }
        self.shared.wake.notify_all();
    }

    pub fn is_paused(&self) -> bool {
        self.shared.lock().paused
    }

    /// Asks the worker for exactly one tick, after which it pauses.
    pub fn process_one(&self) {
        {
            let mut state = self.shared.lock();
            state.step_once = true;
            if state.schedule == Schedule::Idle {
                state.schedule = Schedule::Armed;
            }
        }
        self.shared.wake.notify_all();
    }

    /// Runs one tick on the calling thread, regardless of pause state.
    pub fn step(&self) -> Tick {
        let outcome = self.shared.lock().run_tick();
        self.shared.wake.notify_all();
        outcome
    }

    /// Blocks until the worker has nothing to do or is paused. Returns `false` on
    /// timeout, which is also what happens when work is pending but the worker
    /// was never started.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let state = self.shared.lock();
        let (state, _) = self
            .shared
            .wake
            .wait_timeout_while(state, timeout, |s| s.is_busy())
            .unwrap_or_else(PoisonError::into_inner);
        !state.is_busy()
    }

    pub fn settings(&self) -> SceneSettings {
        self.shared.lock().settings
    }

    /// Changes the output size for nodes without inputs. Every node is marked dirty.
    pub fn set_size(&self, width: u32, height: u32) -> Result<()> {
        let settings = self.settings().with_size(width, height);
        settings.validate()?;
        self.edit(|s| {
            s.settings = settings;
            s.graph.mark_all_dirty();
        });
        Ok(())
    }

    /// Installs the sink that receives [`SceneEvent`]s.
    pub fn set_event_sink(&self, sink: impl EventSink + Send + 'static) {
        self.shared.lock().sink = Box::new(sink);
    }

    /// Sets the node the scheduler evaluates toward.
    pub fn set_view_node(&self, node: Option<NodeId>) -> Result<()> {
        self.edit(|s| {
            if let Some(id) = node {
                if !s.graph.contains(id) {
                    return Err(Error::UnknownNode { id });
                }
            }
            s.view = node;
            s.sink.send(SceneEvent::ViewNodeChanged { node });
            debug!("View node set to {:?}.", node);
            Ok(())
        })
    }

    pub fn view_node(&self) -> Option<NodeId> {
        self.shared.lock().view
    }

    /// Node the scheduler will step next, as of the last edit or tick. While an
    /// edit is waiting to be reconciled this is the view node itself.
    pub fn current_node(&self) -> Option<NodeId> {
        self.shared.lock().current
    }

    pub fn create_node(&self, type_name: &str) -> NodeId {
        self.edit(|s| s.graph.create_node(type_name))
    }

    /// Deletes a node. Clears the view node if it was the one deleted.
    pub fn delete_node(&self, id: NodeId) -> Result<()> {
        self.edit(|s| {
            s.graph.delete_node(id)?;
            if s.view == Some(id) {
                s.view = None;
                s.sink.send(SceneEvent::ViewNodeChanged { node: None });
            }
            Ok(())
        })
    }

    pub fn connect(&self, a: ConnectorId, b: ConnectorId) -> bool {
        self.edit(|s| s.graph.connect(a, b))
    }

    pub fn disconnect(&self, a: ConnectorId, b: ConnectorId) -> bool {
        self.edit(|s| s.graph.disconnect(a, b))
    }

    pub fn disconnect_all(&self, id: NodeId) -> usize {
        self.edit(|s| s.graph.disconnect_all(id))
    }

    pub fn update_setting(
        &self,
        id: NodeId,
        name: &str,
        value: impl Into<SettingValue>,
    ) -> Result<()> {
        let value = value.into();
        self.edit(|s| s.graph.update_setting(id, name, value))
    }

    pub fn node_state(&self, id: NodeId) -> Option<State> {
        self.shared.lock().graph.node(id).map(|n| n.state())
    }

    pub fn node_error(&self, id: NodeId) -> Option<String> {
        self.shared
            .lock()
            .graph
            .node(id)
            .and_then(|n| n.error().map(str::to_owned))
    }

    /// Snapshot of a node's visible layers. Handles alias the live images.
    pub fn render_set(&self, id: NodeId) -> Option<RenderSet> {
        self.shared.lock().graph.node(id).map(|n| n.render_set().clone())
    }

    /// Read access to the graph under the scene lock.
    pub fn with_graph<R>(&self, f: impl FnOnce(&Graph) -> R) -> R {
        f(&self.shared.lock().graph)
    }

    /// Write access to the graph under the scene lock. The scene is treated as
    /// edited afterwards.
    pub fn edit_graph<R>(&self, f: impl FnOnce(&mut Graph) -> R) -> R {
        self.edit(|s| f(&mut s.graph))
    }

    /// Serializes the graph and scene settings as a JSON document.
    #[cfg(feature = "serde")]
    pub fn save_to_string(&self) -> Result<String> {
        let state = self.shared.lock();
        let mut w = JsonWriter::new();
        state.graph.serialize(&mut w)?;
        w.start_object("scene")?;
        w.write_uint("width", state.settings.width as u64)?;
        w.write_uint("height", state.settings.height as u64)?;
        w.finish_object()?;
        w.into_pretty_string()
    }

    /// Replaces the graph and scene settings from a JSON document. Nothing
    /// changes unless the whole document loads.
    #[cfg(feature = "serde")]
    pub fn load_from_str(&self, text: &str) -> Result<()> {
        let mut r = JsonReader::parse(text)?;
        let mut state = self.shared.lock();
        let settings = read_scene_settings(&mut r, state.settings)?;
        state.graph.deserialize(&mut r)?;
        state.settings = settings;
        if state.view.is_some_and(|id| !state.graph.contains(id)) {
            state.view = None;
        }
        state.graph.mark_all_dirty();
        state.touch();
        drop(state);
        self.shared.wake.notify_all();
        info!("Scene loaded.");
        Ok(())
    }

    #[cfg(feature = "serde")]
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let text = self.save_to_string()?;
        std::fs::write(path, text)?;
        Ok(())
    }

    #[cfg(feature = "serde")]
    pub fn load(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let text = std::fs::read_to_string(path)?;
        self.load_from_str(&text)
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        self.stop_processing();
    }
}

#[cfg(feature = "serde")]
fn read_scene_settings(r: &mut dyn ArchiveReader, current: SceneSettings) -> Result<SceneSettings> {
    if !r.contains("scene") {
        return Ok(current);
    }
    r.enter_object("scene")?;
    let size = read_size(r);
    r.leave_object()?;
    let (width, height) = size?;
    let dim = |v: u64| {
        u32::try_from(v).map_err(|_| Error::Persistence(format!("scene size {v} is out of range")))
    };
    let settings = SceneSettings::new(dim(width)?, dim(height)?);
    settings.validate()?;
    Ok(settings)
}

#[cfg(feature = "serde")]
fn read_size(r: &dyn ArchiveReader) -> Result<(u64, u64)> {
    Ok((r.read_uint("width")?, r.read_uint("height")?))
}

fn run_worker(shared: &Shared) {
    debug!("Scene worker running.");
    let mut state = shared.lock();
    loop {
        if state.schedule == Schedule::Stopped {
            break;
        }
        if !state.is_busy() {
            state = shared.wake.wait(state).unwrap_or_else(PoisonError::into_inner);
            continue;
        }

        let single = std::mem::take(&mut state.step_once);
        let outcome = state.run_tick();
        if single {
            state.paused = true;
        }
        shared.wake.notify_all();

        if !outcome.is_idle() {
            // let editors in between ticks
            drop(state);
            thread::yield_now();
            state = shared.lock();
        }
    }
    debug!("Scene worker exiting.");
}
