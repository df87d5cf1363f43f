//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias.
//! Variants cover invalid configuration, operator registration and lookup, setting access, graph
//! wiring, node evaluation faults, persistence and generic errors.
use thiserror::Error;

use crate::graph::NodeId;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown operator type '{name}'")]
    UnknownOperator { name: String },

    #[error("operator type '{name}' is already registered")]
    DuplicateOperator { name: String },

    #[error("unknown node {id}")]
    UnknownNode { id: NodeId },

    #[error("unknown setting '{name}'")]
    UnknownSetting { name: String },

    #[error("setting '{name}' expects a {expected} value but got {found}")]
    SettingType {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("value is not one of the choices of setting '{name}'")]
    InvalidChoice { name: String },

    #[error("invalid connection: {0}")]
    InvalidConnection(String),

    #[error("required input '{input}' is not connected")]
    MissingInput { input: String },

    #[error("input '{input}' has no layer '{layer}'")]
    MissingLayer { input: String, layer: String },

    #[error("input '{input}' is connected to node {source_node} which is not processed")]
    UpstreamNotReady { input: String, source_node: NodeId },

    #[error("{0}")]
    Operator(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("unsupported format version {found} (supported up to {supported})")]
    UnsupportedVersion { found: u64, supported: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}
