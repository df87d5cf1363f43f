//! Event types and sinks for observing a running scene.
//!
//! The scheduler reports node state transitions, node failures and its own
//! wake/idle cycle as [`SceneEvent`]s. Install a sink with
//! [`crate::scene::Scene::set_event_sink`]; sinks run on the evaluation thread while
//! the scene lock is held, so they should return quickly.
use crossbeam_channel::Sender;

use crate::graph::{NodeId, State};

/// Describes events emitted by the scheduler.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// Emitted when a node's state changed during a tick or a reset.
    NodeStateChanged {
        node: NodeId,
        from: State,
        to: State,
    },

    /// Emitted when a node entered the error state.
    NodeFailed {
        node: NodeId,
        /// The error message stored on the node.
        message: String,
    },

    /// Emitted after dirty nodes and their consumers were reset.
    Reconciled {
        /// Number of nodes reset, counting repeated visits once.
        reset: usize,
    },

    /// Emitted when the view node changed.
    ViewNodeChanged { node: Option<NodeId> },

    /// Emitted when the scheduler runs out of work.
    Idle,
}

/// A generic event sink that accepts [`SceneEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: SceneEvent);

    fn send_many<I>(&mut self, events: I)
    where
        Self: Sized,
        I: IntoIterator<Item = SceneEvent>,
    {
        for e in events {
            self.send(e);
        }
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: SceneEvent) {}
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(SceneEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(SceneEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(SceneEvent),
{
    #[inline]
    fn send(&mut self, event: SceneEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects all events in a `Vec`.
#[derive(Default)]
pub struct VecSink {
    events: Vec<SceneEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn into_inner(self) -> Vec<SceneEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[SceneEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: SceneEvent) {
        self.events.push(event);
    }
}

/// Forwards events to a channel, typically read on the editing thread.
/// Events are dropped once the receiver is gone.
#[derive(Clone)]
pub struct ChannelSink {
    pub tx: Sender<SceneEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<SceneEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    #[inline]
    fn send(&mut self, event: SceneEvent) {
        let _ = self.tx.send(event);
    }
}
