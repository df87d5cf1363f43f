#![forbid(unsafe_code)]
//! texgraph: incremental evaluation of procedural image graphs.
//!
//! Modules:
//! - settings: typed, bounded, enumerable node parameters
//! - image / render_set: shared image handles and named layer maps
//! - graph: nodes, connectors, the owning graph and depth-first traversal
//! - operator: the pluggable computation trait, its registry and built-ins
//! - scene: the background scheduler (pause, single-step, view node), events
//! - persist: structured archive traits and a JSON backend
//!
//! For a runnable tour, see the `texgraph_examples` crate.
pub mod error;
pub mod graph;
pub mod image;
pub mod operator;
pub mod persist;
pub mod render_set;
pub mod scene;
pub mod settings;

/// Convenient re-exports for common types. Import with `use texgraph::prelude::*;`.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::graph::{
        Bounds, Connector, ConnectorId, DepthIterator, Direction, ElementFlags, Graph,
        GraphElement, Node, NodeId, State, TraversalFlags,
    };
    pub use crate::image::{Image, ImageHandle};
    pub use crate::operator::builtin::BlendMode;
    pub use crate::operator::{
        InputSpec, Operator, OperatorFactory, OperatorRegistry, OutputSpec, PreprocessContext,
        ProcessContext, Progress,
    };
    pub use crate::persist::{ArchiveReader, ArchiveWriter, FORMAT_VERSION};
    #[cfg(feature = "serde")]
    pub use crate::persist::{JsonReader, JsonWriter};
    pub use crate::render_set::{RenderSet, DEFAULT_LAYER};
    pub use crate::scene::{
        ChannelSink, EventSink, FnSink, Scene, SceneEvent, SceneSettings, Schedule, Tick,
        VecSink,
    };
    pub use crate::settings::{Choice, Setting, SettingHints, SettingType, SettingValue, Settings};
}
