//! Typed, introspectable settings attached to every node.
//!
//! Operators declare their parameters once through
//! [`crate::operator::Operator::register_settings`]. A [`Setting`] carries a default,
//! the current value, optional bounds, display hints and an optional fixed set of
//! choices. Values can only be changed through [`crate::graph::Graph::update_setting`]
//! (or the scene wrapper around it), which keeps the owning node's dirty flag in sync.
use std::fmt;
use std::ops::BitOr;

use glam::{IVec2, Vec2, Vec3, Vec4};
use indexmap::IndexMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// A setting value of one of the supported kinds.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum SettingValue {
    Bool(bool),
    Int(i32),
    UInt(u32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    IVec2(IVec2),
    String(String),
}

impl SettingValue {
    /// Short name of the value kind, used in error messages and persistence.
    pub fn kind_name(&self) -> &'static str {
        match self {
            SettingValue::Bool(_) => "bool",
            SettingValue::Int(_) => "int",
            SettingValue::UInt(_) => "uint",
            SettingValue::Float(_) => "float",
            SettingValue::Vec2(_) => "vec2",
            SettingValue::Vec3(_) => "vec3",
            SettingValue::Vec4(_) => "vec4",
            SettingValue::IVec2(_) => "ivec2",
            SettingValue::String(_) => "string",
        }
    }

    /// Returns `true` if both values are of the same kind.
    pub fn same_kind(&self, other: &SettingValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Typed access to the contained value.
    pub fn get<T: SettingType>(&self) -> Option<T> {
        T::from_value(self)
    }

    fn clamped(&self, min: Option<&SettingValue>, max: Option<&SettingValue>) -> SettingValue {
        let mut out = self.clone();
        if let Some(lo) = min {
            out = out.combine(lo, Bound::Lower);
        }
        if let Some(hi) = max {
            out = out.combine(hi, Bound::Upper);
        }
        out
    }

    fn combine(self, bound: &SettingValue, which: Bound) -> SettingValue {
        use SettingValue as V;
        match (self, bound, which) {
            (V::Int(v), V::Int(b), Bound::Lower) => V::Int(v.max(*b)),
            (V::Int(v), V::Int(b), Bound::Upper) => V::Int(v.min(*b)),
            (V::UInt(v), V::UInt(b), Bound::Lower) => V::UInt(v.max(*b)),
            (V::UInt(v), V::UInt(b), Bound::Upper) => V::UInt(v.min(*b)),
            (V::Float(v), V::Float(b), Bound::Lower) => V::Float(v.max(*b)),
            (V::Float(v), V::Float(b), Bound::Upper) => V::Float(v.min(*b)),
            (V::Vec2(v), V::Vec2(b), Bound::Lower) => V::Vec2(v.max(*b)),
            (V::Vec2(v), V::Vec2(b), Bound::Upper) => V::Vec2(v.min(*b)),
            (V::Vec3(v), V::Vec3(b), Bound::Lower) => V::Vec3(v.max(*b)),
            (V::Vec3(v), V::Vec3(b), Bound::Upper) => V::Vec3(v.min(*b)),
            (V::Vec4(v), V::Vec4(b), Bound::Lower) => V::Vec4(v.max(*b)),
            (V::Vec4(v), V::Vec4(b), Bound::Upper) => V::Vec4(v.min(*b)),
            (V::IVec2(v), V::IVec2(b), Bound::Lower) => V::IVec2(v.max(*b)),
            (V::IVec2(v), V::IVec2(b), Bound::Upper) => V::IVec2(v.min(*b)),
            // bool and string have no ordering
            (v, _, _) => v,
        }
    }
}

#[derive(Clone, Copy)]
enum Bound {
    Lower,
    Upper,
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(v) => write!(f, "{v}"),
            SettingValue::Int(v) => write!(f, "{v}"),
            SettingValue::UInt(v) => write!(f, "{v}"),
            SettingValue::Float(v) => write!(f, "{v}"),
            SettingValue::Vec2(v) => write!(f, "{v}"),
            SettingValue::Vec3(v) => write!(f, "{v}"),
            SettingValue::Vec4(v) => write!(f, "{v}"),
            SettingValue::IVec2(v) => write!(f, "{v}"),
            SettingValue::String(v) => f.write_str(v),
        }
    }
}

/// Rust types that map onto exactly one [`SettingValue`] kind.
pub trait SettingType: Sized {
    /// Kind name matching [`SettingValue::kind_name`].
    const KIND: &'static str;

    fn from_value(value: &SettingValue) -> Option<Self>;

    fn into_value(self) -> SettingValue;
}

macro_rules! setting_type {
    ($ty:ty, $variant:ident, $kind:literal) => {
        impl SettingType for $ty {
            const KIND: &'static str = $kind;

            #[inline]
            fn from_value(value: &SettingValue) -> Option<Self> {
                match value {
                    SettingValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }

            #[inline]
            fn into_value(self) -> SettingValue {
                SettingValue::$variant(self)
            }
        }

        impl From<$ty> for SettingValue {
            fn from(value: $ty) -> Self {
                SettingValue::$variant(value)
            }
        }
    };
}

setting_type!(bool, Bool, "bool");
setting_type!(i32, Int, "int");
setting_type!(u32, UInt, "uint");
setting_type!(f32, Float, "float");
setting_type!(Vec2, Vec2, "vec2");
setting_type!(Vec3, Vec3, "vec3");
setting_type!(Vec4, Vec4, "vec4");
setting_type!(IVec2, IVec2, "ivec2");
setting_type!(String, String, "string");

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::String(value.to_owned())
    }
}

impl From<mint::Vector2<f32>> for SettingValue {
    fn from(value: mint::Vector2<f32>) -> Self {
        SettingValue::Vec2(Vec2::from(value))
    }
}

impl From<mint::Vector3<f32>> for SettingValue {
    fn from(value: mint::Vector3<f32>) -> Self {
        SettingValue::Vec3(Vec3::from(value))
    }
}

impl From<mint::Vector4<f32>> for SettingValue {
    fn from(value: mint::Vector4<f32>) -> Self {
        SettingValue::Vec4(Vec4::from(value))
    }
}

impl From<mint::Vector2<i32>> for SettingValue {
    fn from(value: mint::Vector2<i32>) -> Self {
        SettingValue::IVec2(IVec2::from(value))
    }
}

/// Display hints for the presentation layer.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SettingHints(u8);

impl SettingHints {
    pub const NONE: SettingHints = SettingHints(0);
    /// Integer setting selects an image channel.
    pub const CHANNEL_SELECTOR: SettingHints = SettingHints(1);
    /// Vector setting is a color.
    pub const COLOR: SettingHints = SettingHints(1 << 1);
    /// Numeric setting is edited on a logarithmic scale.
    pub const LOGARITHMIC: SettingHints = SettingHints(1 << 2);

    #[inline]
    pub fn contains(self, other: SettingHints) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for SettingHints {
    type Output = SettingHints;

    fn bitor(self, rhs: Self) -> Self::Output {
        SettingHints(self.0 | rhs.0)
    }
}

/// A labelled entry of an enumerated setting.
#[derive(Clone, Debug, PartialEq)]
pub struct Choice {
    pub label: String,
    pub value: SettingValue,
}

/// A named, typed configuration value.
#[derive(Clone, Debug)]
pub struct Setting {
    name: String,
    default: SettingValue,
    value: SettingValue,
    min: Option<SettingValue>,
    max: Option<SettingValue>,
    hints: SettingHints,
    choices: Option<Vec<Choice>>,
}

impl Setting {
    /// Creates a setting whose current value starts at `default`.
    pub fn new(name: impl Into<String>, default: impl Into<SettingValue>) -> Self {
        let default = default.into();
        Self {
            name: name.into(),
            value: default.clone(),
            default,
            min: None,
            max: None,
            hints: SettingHints::NONE,
            choices: None,
        }
    }

    /// Sets inclusive bounds. The default is clamped into them.
    pub fn with_range(
        mut self,
        min: impl Into<SettingValue>,
        max: impl Into<SettingValue>,
    ) -> Self {
        let (min, max) = (min.into(), max.into());
        debug_assert!(
            min.same_kind(&self.default) && max.same_kind(&self.default),
            "bounds of '{}' must match its kind",
            self.name
        );
        self.min = Some(min);
        self.max = Some(max);
        self.default = self.default.clamped(self.min.as_ref(), self.max.as_ref());
        self.value = self.default.clone();
        self
    }

    /// Restricts the setting to a fixed set of labelled values. Choices take
    /// precedence over bounds.
    pub fn with_choices<L, V>(mut self, choices: impl IntoIterator<Item = (L, V)>) -> Self
    where
        L: Into<String>,
        V: Into<SettingValue>,
    {
        self.choices = Some(
            choices
                .into_iter()
                .map(|(label, value)| Choice {
                    label: label.into(),
                    value: value.into(),
                })
                .collect(),
        );
        self
    }

    pub fn with_hints(mut self, hints: SettingHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current value, if it is of kind `T`.
    pub fn value<T: SettingType>(&self) -> Option<T> {
        T::from_value(&self.value)
    }

    pub fn raw_value(&self) -> &SettingValue {
        &self.value
    }

    pub fn default_value(&self) -> &SettingValue {
        &self.default
    }

    pub fn kind_name(&self) -> &'static str {
        self.default.kind_name()
    }

    pub fn min(&self) -> Option<&SettingValue> {
        self.min.as_ref()
    }

    pub fn max(&self) -> Option<&SettingValue> {
        self.max.as_ref()
    }

    pub fn hints(&self) -> SettingHints {
        self.hints
    }

    pub fn choices(&self) -> Option<&[Choice]> {
        self.choices.as_deref()
    }

    /// Label of the choice matching the current value.
    pub fn selected_label(&self) -> Option<&str> {
        self.choices
            .as_ref()?
            .iter()
            .find(|c| c.value == self.value)
            .map(|c| c.label.as_str())
    }

    /// Validates `value` against kind, choices and bounds without applying it.
    /// Returns the value that would be stored.
    pub fn check(&self, value: SettingValue) -> Result<SettingValue> {
        if !value.same_kind(&self.default) {
            return Err(Error::SettingType {
                name: self.name.clone(),
                expected: self.default.kind_name(),
                found: value.kind_name(),
            });
        }
        if let Some(choices) = &self.choices {
            if !choices.iter().any(|c| c.value == value) {
                return Err(Error::InvalidChoice {
                    name: self.name.clone(),
                });
            }
            return Ok(value);
        }
        Ok(value.clamped(self.min.as_ref(), self.max.as_ref()))
    }

    /// Applies a value. Returns `true` if the stored value changed.
    pub(crate) fn apply(&mut self, value: SettingValue) -> Result<bool> {
        let value = self.check(value)?;
        if value == self.value {
            return Ok(false);
        }
        self.value = value;
        Ok(true)
    }
}

/// Ordered, name-unique collection of settings owned by a node.
#[derive(Clone, Debug, Default)]
pub struct Settings {
    entries: IndexMap<String, Setting>,
}

impl Settings {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Adds a setting. A setting with the same name is replaced in place.
    pub fn add(&mut self, setting: Setting) -> &mut Self {
        if self.entries.contains_key(setting.name()) {
            warn!("Setting '{}' registered twice; replacing.", setting.name());
        }
        self.entries.insert(setting.name.clone(), setting);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Setting> {
        self.entries.get(name)
    }

    /// Typed shortcut for `get(name)?.value::<T>()`.
    pub fn value<T: SettingType>(&self, name: &str) -> Option<T> {
        self.get(name)?.value()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates settings in registration order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Setting> + ExactSizeIterator {
        self.entries.values()
    }

    /// Validates and applies a value. Returns `true` if the stored value changed.
    pub(crate) fn set(&mut self, name: &str, value: SettingValue) -> Result<bool> {
        match self.entries.get_mut(name) {
            Some(setting) => setting.apply(value),
            None => Err(Error::UnknownSetting {
                name: name.to_owned(),
            }),
        }
    }

    /// Resets every setting to its default value.
    pub(crate) fn restore_defaults(&mut self) -> bool {
        let mut changed = false;
        for setting in self.entries.values_mut() {
            if setting.value != setting.default {
                setting.value = setting.default.clone();
                changed = true;
            }
        }
        changed
    }
}

impl<'a> IntoIterator for &'a Settings {
    type Item = &'a Setting;
    type IntoIter = indexmap::map::Values<'a, String, Setting>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}
