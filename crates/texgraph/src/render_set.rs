//! Named layers a node exposes to downstream nodes and to the presentation layer.
//!
//! A node's [`RenderSet`] starts as a copy of its first connected input's set, so
//! layers it does not touch pass through by reference. Its own outputs are then
//! inserted on top.
use glam::UVec2;
use indexmap::IndexMap;

use crate::image::ImageHandle;

/// Name of the layer every built-in operator reads and writes.
pub const DEFAULT_LAYER: &str = "image";

/// Insertion-ordered mapping from layer name to a shared image handle.
#[derive(Clone, Debug, Default)]
pub struct RenderSet {
    layers: IndexMap<String, ImageHandle>,
}

impl RenderSet {
    /// Creates a new, empty [`RenderSet`].
    pub fn new() -> Self {
        Self {
            layers: IndexMap::new(),
        }
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            layers: IndexMap::with_capacity(n),
        }
    }

    /// Returns the number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }

    /// Inserts or overwrites a layer.
    pub fn insert(&mut self, name: impl Into<String>, image: ImageHandle) {
        self.layers.insert(name.into(), image);
    }

    /// Copies every layer handle of `other` into this set.
    pub fn extend_from(&mut self, other: &RenderSet) {
        for (k, v) in other.layers.iter() {
            self.layers.insert(k.clone(), v.clone());
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<ImageHandle> {
        self.layers.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ImageHandle> {
        self.layers.get(name)
    }

    /// The first layer in insertion order.
    pub fn first(&self) -> Option<(&str, &ImageHandle)> {
        self.layers.first().map(|(k, v)| (k.as_str(), v))
    }

    /// Size of the named layer.
    pub fn layer_size(&self, name: &str) -> Option<UVec2> {
        self.layers.get(name).map(ImageHandle::size)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ImageHandle)> {
        self.layers.iter().map(|(k, v)| (k.as_str(), v))
    }
}
