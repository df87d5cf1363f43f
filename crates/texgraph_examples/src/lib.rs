#![forbid(unsafe_code)]

mod rendering;

pub use rendering::{image_to_png, layer_to_png, settle, PngConfig};
