use glam::UVec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Scene-wide parameters shared with every operator.
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneSettings {
    /// Output width in pixels for nodes without inputs.
    pub width: u32,
    /// Output height in pixels for nodes without inputs.
    pub height: u32,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
        }
    }
}

impl SceneSettings {
    /// Creates a new [`SceneSettings`] with the given output size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Sets both output dimensions.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfig(
                "scene width and height must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_builders() {
        let s = SceneSettings::default();
        assert_eq!(s.size(), UVec2::new(256, 256));
        s.validate().expect("default is valid");

        let s = s.with_width(64).with_height(32);
        assert_eq!(s, SceneSettings::new(64, 32));
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let err = SceneSettings::new(0, 8).validate().expect_err("zero width");
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(SceneSettings::default().with_size(8, 0).validate().is_err());
    }
}
