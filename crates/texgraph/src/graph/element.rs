//! Editor-space placement shared by nodes and connectors.
//!
//! Layout and drawing live in the presentation layer; this module only keeps
//! the state that is part of the data model: rectangles and selection flags.
use std::ops::BitOr;

use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in editor space.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    /// Top-left corner.
    pub min: Vec2,
    /// Bottom-right corner.
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self::new(pos, pos + size)
    }

    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self::new(center - half, center + half)
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Inclusive point test.
    pub fn contains(&self, p: Vec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// Grow by `margin` on every side.
    pub fn expand(&self, margin: f32) -> Bounds {
        Bounds::new(self.min - Vec2::splat(margin), self.max + Vec2::splat(margin))
    }
}

/// Selection state of an element.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ElementFlags(u8);

impl ElementFlags {
    pub const NONE: ElementFlags = ElementFlags(0);
    pub const SELECTED: ElementFlags = ElementFlags(1);
    pub const HOVERED: ElementFlags = ElementFlags(1 << 1);
    /// The element is the scene's view node.
    pub const VIEWED: ElementFlags = ElementFlags(1 << 2);

    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Rebuild from raw bits, dropping unknown ones.
    #[inline]
    pub fn from_bits_truncate(bits: u8) -> Self {
        ElementFlags(bits & 0b111)
    }

    #[inline]
    pub fn contains(self, other: ElementFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: ElementFlags) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn remove(&mut self, other: ElementFlags) {
        self.0 &= !other.0;
    }

    pub fn set(&mut self, other: ElementFlags, on: bool) {
        if on {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }
}

impl BitOr for ElementFlags {
    type Output = ElementFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        ElementFlags(self.0 | rhs.0)
    }
}

/// Something placed and hit-tested in editor space.
pub trait GraphElement {
    fn bounds(&self) -> Bounds;

    fn flags(&self) -> ElementFlags;

    fn is_selected(&self) -> bool {
        self.flags().contains(ElementFlags::SELECTED)
    }

    fn hit_test(&self, p: Vec2) -> bool {
        self.bounds().contains(p)
    }
}
