//! JSON archive backend built on [`serde_json::Value`].
use glam::Vec2;
use serde_json::{Map, Value};

use super::{missing, wrong_type, ArchiveReader, ArchiveWriter};
use crate::error::{Error, Result};
use crate::settings::SettingValue;

/// Builds a JSON document in memory.
#[derive(Debug, Default)]
pub struct JsonWriter {
    root: Map<String, Value>,
    stack: Vec<(String, Map<String, Value>)>,
}

impl JsonWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&mut self) -> &mut Map<String, Value> {
        match self.stack.last_mut() {
            Some((_, map)) => map,
            None => &mut self.root,
        }
    }

    fn put(&mut self, name: &str, value: Value) -> Result<()> {
        self.current().insert(name.to_owned(), value);
        Ok(())
    }

    /// Finishes the document. Fails if objects are still open.
    pub fn into_value(self) -> Result<Value> {
        if let Some((name, _)) = self.stack.last() {
            return Err(Error::Persistence(format!("object '{name}' was not finished")));
        }
        Ok(Value::Object(self.root))
    }

    pub fn into_pretty_string(self) -> Result<String> {
        let value = self.into_value()?;
        serde_json::to_string_pretty(&value).map_err(|e| Error::Persistence(e.to_string()))
    }
}

impl ArchiveWriter for JsonWriter {
    fn start_object(&mut self, name: &str) -> Result<()> {
        self.stack.push((name.to_owned(), Map::new()));
        Ok(())
    }

    fn finish_object(&mut self) -> Result<()> {
        let Some((name, map)) = self.stack.pop() else {
            return Err(Error::Persistence("finish_object without start_object".into()));
        };
        self.put(&name, Value::Object(map))
    }

    fn write_bool(&mut self, name: &str, value: bool) -> Result<()> {
        self.put(name, Value::Bool(value))
    }

    fn write_int(&mut self, name: &str, value: i64) -> Result<()> {
        self.put(name, Value::from(value))
    }

    fn write_uint(&mut self, name: &str, value: u64) -> Result<()> {
        self.put(name, Value::from(value))
    }

    fn write_float(&mut self, name: &str, value: f64) -> Result<()> {
        self.put(name, Value::from(value))
    }

    fn write_str(&mut self, name: &str, value: &str) -> Result<()> {
        self.put(name, Value::String(value.to_owned()))
    }

    fn write_vec2(&mut self, name: &str, value: Vec2) -> Result<()> {
        self.put(name, Value::from(vec![value.x as f64, value.y as f64]))
    }

    fn write_property(&mut self, name: &str, value: &SettingValue) -> Result<()> {
        let encoded = serde_json::to_value(value).map_err(|e| Error::Persistence(e.to_string()))?;
        self.put(name, encoded)
    }
}

/// Reads a JSON document produced by [`JsonWriter`].
#[derive(Debug, Clone)]
pub struct JsonReader {
    root: Value,
    path: Vec<String>,
}

impl JsonReader {
    pub fn new(root: Value) -> Self {
        Self {
            root,
            path: Vec::new(),
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        let root = serde_json::from_str(text).map_err(|e| Error::Persistence(e.to_string()))?;
        Ok(Self::new(root))
    }

    fn current(&self) -> Result<&Map<String, Value>> {
        let mut value = &self.root;
        for key in &self.path {
            value = value.get(key).ok_or_else(|| missing(key))?;
        }
        value
            .as_object()
            .ok_or_else(|| wrong_type(self.path.last().map_or("<root>", String::as_str), "object"))
    }

    fn field(&self, name: &str) -> Result<&Value> {
        self.current()?.get(name).ok_or_else(|| missing(name))
    }
}

impl ArchiveReader for JsonReader {
    fn enter_object(&mut self, name: &str) -> Result<()> {
        if !self.field(name)?.is_object() {
            return Err(wrong_type(name, "object"));
        }
        self.path.push(name.to_owned());
        Ok(())
    }

    fn leave_object(&mut self) -> Result<()> {
        self.path
            .pop()
            .map(|_| ())
            .ok_or_else(|| Error::Persistence("leave_object at document root".into()))
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.current()?.keys().cloned().collect())
    }

    fn contains(&self, name: &str) -> bool {
        self.current().is_ok_and(|m| m.contains_key(name))
    }

    fn read_bool(&self, name: &str) -> Result<bool> {
        self.field(name)?
            .as_bool()
            .ok_or_else(|| wrong_type(name, "bool"))
    }

    fn read_int(&self, name: &str) -> Result<i64> {
        self.field(name)?
            .as_i64()
            .ok_or_else(|| wrong_type(name, "integer"))
    }

    fn read_uint(&self, name: &str) -> Result<u64> {
        self.field(name)?
            .as_u64()
            .ok_or_else(|| wrong_type(name, "unsigned integer"))
    }

    fn read_float(&self, name: &str) -> Result<f64> {
        self.field(name)?
            .as_f64()
            .ok_or_else(|| wrong_type(name, "number"))
    }

    fn read_str(&self, name: &str) -> Result<String> {
        self.field(name)?
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| wrong_type(name, "string"))
    }

    fn read_vec2(&self, name: &str) -> Result<Vec2> {
        let parts = self
            .field(name)?
            .as_array()
            .filter(|a| a.len() == 2)
            .ok_or_else(|| wrong_type(name, "2-element array"))?;
        let x = parts[0].as_f64().ok_or_else(|| wrong_type(name, "number pair"))?;
        let y = parts[1].as_f64().ok_or_else(|| wrong_type(name, "number pair"))?;
        Ok(Vec2::new(x as f32, y as f32))
    }

    fn read_property(&self, name: &str) -> Result<SettingValue> {
        serde_json::from_value(self.field(name)?.clone())
            .map_err(|e| Error::Persistence(format!("setting '{name}': {e}")))
    }
}
