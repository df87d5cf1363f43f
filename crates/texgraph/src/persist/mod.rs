//! Structured read/write interface the data model persists itself through.
//!
//! [`crate::graph::Graph`], [`crate::graph::Node`] and the scene settings walk an
//! [`ArchiveWriter`] to save and an [`ArchiveReader`] to load. Backends decide the
//! concrete encoding; [`json`] provides one over `serde_json` values.
use glam::Vec2;

use crate::error::{Error, Result};
use crate::settings::SettingValue;

#[cfg(feature = "serde")]
pub mod json;

#[cfg(feature = "serde")]
pub use json::{JsonReader, JsonWriter};

/// Highest document version this crate reads and the version it writes.
pub const FORMAT_VERSION: u64 = 1;

/// Sink for structured documents.
pub trait ArchiveWriter {
    /// Opens a named child object; subsequent writes go into it.
    fn start_object(&mut self, name: &str) -> Result<()>;

    fn finish_object(&mut self) -> Result<()>;

    fn write_bool(&mut self, name: &str, value: bool) -> Result<()>;

    fn write_int(&mut self, name: &str, value: i64) -> Result<()>;

    fn write_uint(&mut self, name: &str, value: u64) -> Result<()>;

    fn write_float(&mut self, name: &str, value: f64) -> Result<()>;

    fn write_str(&mut self, name: &str, value: &str) -> Result<()>;

    fn write_vec2(&mut self, name: &str, value: Vec2) -> Result<()>;

    /// Writes a typed setting value, preserving its kind.
    fn write_property(&mut self, name: &str, value: &SettingValue) -> Result<()>;
}

/// Source for structured documents.
pub trait ArchiveReader {
    /// Descends into a named child object.
    fn enter_object(&mut self, name: &str) -> Result<()>;

    fn leave_object(&mut self) -> Result<()>;

    /// Names of the current object's children. Order is backend-defined.
    fn keys(&self) -> Result<Vec<String>>;

    fn contains(&self, name: &str) -> bool;

    fn read_bool(&self, name: &str) -> Result<bool>;

    fn read_int(&self, name: &str) -> Result<i64>;

    fn read_uint(&self, name: &str) -> Result<u64>;

    fn read_float(&self, name: &str) -> Result<f64>;

    fn read_str(&self, name: &str) -> Result<String>;

    fn read_vec2(&self, name: &str) -> Result<Vec2>;

    fn read_property(&self, name: &str) -> Result<SettingValue>;
}

/// Writes the leading `version` property of a document.
pub fn write_version(w: &mut dyn ArchiveWriter) -> Result<()> {
    w.write_uint("version", FORMAT_VERSION)
}

/// Reads and checks the leading `version` property of a document.
pub fn read_version(r: &dyn ArchiveReader) -> Result<u64> {
    let found = r.read_uint("version")?;
    if found == 0 || found > FORMAT_VERSION {
        return Err(Error::UnsupportedVersion {
            found,
            supported: FORMAT_VERSION,
        });
    }
    Ok(found)
}

pub(crate) fn missing(name: &str) -> Error {
    Error::Persistence(format!("missing field '{name}'"))
}

pub(crate) fn wrong_type(name: &str, expected: &str) -> Error {
    Error::Persistence(format!("field '{name}' is not a {expected}"))
}
