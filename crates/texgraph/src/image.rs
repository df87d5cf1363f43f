//! Image storage and shared resource handles.
//!
//! The engine never interprets pixel contents. It creates, resizes and hands out
//! [`ImageHandle`]s; operators read and write the [`Image`] behind them.
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use glam::{UVec2, Vec4};

/// A width x height image with `channels` interleaved `f32` values per pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub data: Vec<f32>,
}

impl Image {
    /// Create a new zero-filled image.
    pub fn new(width: u32, height: u32, channels: u32) -> Self {
        Self {
            width,
            height,
            channels,
            data: vec![0.0; len_for(width, height, channels)],
        }
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    /// Resize in place. Content is discarded and zeroed whenever the shape changes.
    pub fn resize(&mut self, width: u32, height: u32, channels: u32) {
        if self.width == width && self.height == height && self.channels == channels {
            return;
        }
        self.width = width;
        self.height = height;
        self.channels = channels;
        self.data.clear();
        self.data.resize(len_for(width, height, channels), 0.0);
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(((y as usize) * (self.width as usize) + x as usize) * self.channels as usize)
    }

    /// Read a pixel as RGBA. Missing channels read as `0.0`, except alpha which reads as `1.0`.
    pub fn pixel(&self, x: u32, y: u32) -> Vec4 {
        let Some(i) = self.index(x, y) else {
            return Vec4::ZERO;
        };
        let c = self.channels as usize;
        let mut out = Vec4::new(0.0, 0.0, 0.0, 1.0);
        for k in 0..c.min(4) {
            out[k] = self.data[i + k];
        }
        out
    }

    /// Write a pixel from RGBA, dropping channels the image does not have.
    pub fn set_pixel(&mut self, x: u32, y: u32, value: Vec4) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        let c = self.channels as usize;
        for k in 0..c.min(4) {
            self.data[i + k] = value[k];
        }
    }

    /// Pixel read with coordinates clamped to the image edge.
    pub fn pixel_clamped(&self, x: i64, y: i64) -> Vec4 {
        if self.width == 0 || self.height == 0 {
            return Vec4::ZERO;
        }
        let x = x.clamp(0, self.width as i64 - 1) as u32;
        let y = y.clamp(0, self.height as i64 - 1) as u32;
        self.pixel(x, y)
    }

    pub fn fill(&mut self, value: Vec4) {
        for y in 0..self.height {
            for x in 0..self.width {
                self.set_pixel(x, y, value);
            }
        }
    }
}

fn len_for(width: u32, height: u32, channels: u32) -> usize {
    width as usize * height as usize * channels as usize
}

/// Shared handle to an [`Image`]. Cloning aliases the same resource.
#[derive(Clone)]
pub struct ImageHandle {
    inner: Arc<RwLock<Image>>,
}

impl ImageHandle {
    pub fn new(image: Image) -> Self {
        Self {
            inner: Arc::new(RwLock::new(image)),
        }
    }

    /// Allocate a zero-filled image behind a new handle.
    pub fn allocate(size: UVec2, channels: u32) -> Self {
        Self::new(Image::new(size.x, size.y, channels))
    }

    /// Lock for reading. A poisoned lock is recovered since images carry no invariants.
    pub fn read(&self) -> RwLockReadGuard<'_, Image> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Image> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn size(&self) -> UVec2 {
        self.read().size()
    }

    pub fn channels(&self) -> u32 {
        self.read().channels
    }

    /// Returns `true` if both handles refer to the same resource.
    pub fn ptr_eq(&self, other: &ImageHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Image {
        self.read().clone()
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let image = self.read();
        f.debug_struct("ImageHandle")
            .field("width", &image.width)
            .field("height", &image.height)
            .field("channels", &image.channels)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_initializes_with_zeroes() {
        let image = Image::new(3, 2, 4);
        assert_eq!(image.size(), UVec2::new(3, 2));
        assert_eq!(image.data.len(), 24);
        assert!(image.data.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn pixel_access_ignores_out_of_bounds() {
        let mut image = Image::new(2, 2, 4);
        image.set_pixel(5, 5, Vec4::ONE);
        assert!(image.data.iter().all(|v| *v == 0.0));
        image.set_pixel(1, 1, Vec4::new(0.1, 0.2, 0.3, 0.4));
        assert_eq!(image.pixel(1, 1), Vec4::new(0.1, 0.2, 0.3, 0.4));
        assert_eq!(image.pixel(9, 9), Vec4::ZERO);
        assert_eq!(image.pixel_clamped(-3, 7), image.pixel(0, 1));
    }

    #[test]
    fn single_channel_images_report_opaque_alpha() {
        let mut image = Image::new(1, 1, 1);
        image.set_pixel(0, 0, Vec4::splat(0.5));
        assert_eq!(image.pixel(0, 0), Vec4::new(0.5, 0.0, 0.0, 1.0));
    }

    #[test]
    fn resize_discards_content_only_when_shape_changes() {
        let mut image = Image::new(2, 2, 1);
        image.fill(Vec4::ONE);
        image.resize(2, 2, 1);
        assert!(image.data.iter().all(|v| *v == 1.0));
        image.resize(4, 1, 1);
        assert_eq!(image.data.len(), 4);
        assert!(image.data.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn cloned_handles_alias_the_same_image() {
        let a = ImageHandle::allocate(UVec2::new(2, 2), 4);
        let b = a.clone();
        b.write().fill(Vec4::splat(0.25));
        assert!(a.ptr_eq(&b));
        assert_eq!(a.read().pixel(1, 1), Vec4::splat(0.25));

        let c = ImageHandle::allocate(UVec2::new(2, 2), 4);
        assert!(!a.ptr_eq(&c));
    }
}
