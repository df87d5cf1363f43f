//! Name-keyed factory registry for operators.
//!
//! The registry is filled once at startup and then shared read-only (behind an
//! [`std::sync::Arc`]) with every [`crate::graph::Graph`] that creates nodes.
use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::operator::Operator;

/// Constructor for a fresh operator instance.
pub type OperatorFactory = Box<dyn Fn() -> Box<dyn Operator> + Send + Sync>;

/// Registry of operator factories keyed by type name.
pub struct OperatorRegistry {
    factories: HashMap<String, OperatorFactory>,
}

impl OperatorRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Creates a registry holding every built-in operator.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        if let Err(e) = crate::operator::builtin::register_all(&mut registry) {
            warn!("Built-in operator registration failed: {}.", e);
        }
        registry
    }

    /// Registers a factory. Registering a name twice is rejected.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<()>
    where
        F: Fn() -> Box<dyn Operator> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(Error::DuplicateOperator { name });
        }
        debug!("Registered operator '{}'.", name);
        self.factories.insert(name, Box::new(factory));
        Ok(())
    }

    /// Shortcut for operators that implement [`Default`].
    pub fn register_default<T>(&mut self, name: impl Into<String>) -> Result<()>
    where
        T: Operator + Default + 'static,
    {
        self.register(name, || Box::new(T::default()))
    }

    /// Instantiates the operator registered under `name`.
    pub fn create(&self, name: &str) -> Option<Box<dyn Operator>> {
        self.factories.get(name).map(|f| f())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered type names containing `query`, case-insensitively, sorted.
    pub fn search(&self, query: &str) -> Vec<&str> {
        let query = query.to_lowercase();
        self.names()
            .into_iter()
            .filter(|n| n.to_lowercase().contains(&query))
            .collect()
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorRegistry")
            .field("names", &self.names())
            .finish()
    }
}
