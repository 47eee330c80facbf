//! tessel-canvas: a mutable in-memory raster canvas (sans-IO).
//!
//! A [`Canvas`] is a rectangular pixel buffer plus its geometry/tag
//! record and a derived luminance view. On top of it:
//!
//! - [`compose`]: insert one canvas into another with automatic growth
//!   and directional edge clipping, XOR combination, and background
//!   detection/cropping.
//! - [`align`]: find the offset between two canvases by minimizing the
//!   summed absolute difference of a luminance sampling block, with an
//!   exhaustive window scan or an expanding-ring scan.
//!
//! This crate has **no I/O dependencies** — it operates on in-memory
//! buffers. Codec adapters (see `tessel-codec`) decode files into a
//! flat packed byte buffer plus a [`Geometry`] record and hand both to
//! [`Canvas::from_packed`]; [`Canvas::to_packed`] goes the other way.

pub mod align;
pub mod buffer;
pub mod canvas;
pub mod compose;
pub mod luma;
pub mod types;

pub use align::{ScanReport, SearchConfig, SearchStrategy, find_offset, full_scan, radar_scan};
pub use buffer::PixelBuffer;
pub use canvas::Canvas;
pub use compose::{InsertSession, crop_background, detect_background, insert, xor};
pub use luma::{Luma, LumaState, LuminanceCache, luma_of};
pub use types::{CanvasError, Geometry, Offset, Photometric, PlanarLayout};
