//! Shared types for the tessel canvas: geometry/tag record, pixel
//! offsets, and the error enum.
//!
//! The [`Geometry`] record carries everything a codec adapter needs to
//! interpret a packed pixel buffer, plus advisory metadata (resolution,
//! orientation, origin) that every canvas operation carries through
//! unchanged.

use serde::{Deserialize, Serialize};

/// Interpretation of the pixel bytes.
///
/// Only the two modes the canvas can operate on are representable.
/// Unknown tag codes are rejected at the [`from_code`](Self::from_code)
/// boundary with [`CanvasError::UnsupportedPhotometric`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Photometric {
    /// One sample per pixel, zero is black.
    Grayscale,
    /// Three interleaved samples per pixel (RGBRGB...).
    Rgb,
}

impl Photometric {
    /// Parse a TIFF-style photometric interpretation code.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::UnsupportedPhotometric`] for any code other
    /// than 1 (black-is-zero grayscale) or 2 (RGB).
    pub fn from_code(code: u16) -> Result<Self, CanvasError> {
        match code {
            1 => Ok(Self::Grayscale),
            2 => Ok(Self::Rgb),
            other => Err(CanvasError::UnsupportedPhotometric { code: other }),
        }
    }

    /// The TIFF-style tag code for this mode.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Grayscale => 1,
            Self::Rgb => 2,
        }
    }

    /// Samples per pixel implied by this mode.
    #[must_use]
    pub const fn samples_per_pixel(self) -> u16 {
        match self {
            Self::Grayscale => 1,
            Self::Rgb => 3,
        }
    }
}

/// Arrangement of samples within the pixel buffer.
///
/// `SeparatePlanes` is a recognized tag value but no pixel operation
/// supports it; operations reject it with
/// [`CanvasError::UnsupportedLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanarLayout {
    /// Samples interleaved within each row (RGBRGB...). The only layout
    /// the canvas operates on.
    Interleaved,
    /// One plane per sample. Recognized, never supported.
    SeparatePlanes,
}

impl PlanarLayout {
    /// Parse a TIFF-style planar configuration code.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::UnsupportedLayout`] for any code other than
    /// 1 (contiguous/interleaved) or 2 (separate planes).
    pub fn from_code(code: u16) -> Result<Self, CanvasError> {
        match code {
            1 => Ok(Self::Interleaved),
            2 => Ok(Self::SeparatePlanes),
            other => Err(CanvasError::UnsupportedLayout { code: other }),
        }
    }

    /// The TIFF-style tag code for this layout.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Interleaved => 1,
            Self::SeparatePlanes => 2,
        }
    }
}

/// Geometry and tag record for one canvas.
///
/// The first six fields determine the buffer layout; the rest are
/// advisory metadata carried through every operation unchanged (a
/// codec adapter may persist them, the canvas never interprets them).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Pixels per row.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Bits per sample. Pixel-addressed operations require 8.
    pub bits_per_sample: u16,
    /// Samples per pixel (1 for grayscale, 3 for RGB).
    pub samples_per_pixel: u16,
    /// Interpretation of the samples.
    pub photometric: Photometric,
    /// Arrangement of samples within the buffer.
    pub layout: PlanarLayout,

    /// Horizontal resolution, advisory.
    pub x_resolution: f32,
    /// Vertical resolution, advisory.
    pub y_resolution: f32,
    /// Resolution unit tag (2 = inch), advisory.
    pub resolution_unit: u16,
    /// Orientation tag (1 = top-left), advisory.
    pub orientation: u16,
    /// Horizontal placement offset in some parent pixel space, advisory.
    pub origin_x: i32,
    /// Vertical placement offset in some parent pixel space, advisory.
    pub origin_y: i32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::rgb(1, 1)
    }
}

impl Geometry {
    /// Geometry for an 8-bit interleaved RGB image.
    #[must_use]
    pub const fn rgb(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits_per_sample: 8,
            samples_per_pixel: 3,
            photometric: Photometric::Rgb,
            layout: PlanarLayout::Interleaved,
            x_resolution: 1200.0,
            y_resolution: 1200.0,
            resolution_unit: 2,
            orientation: 1,
            origin_x: 0,
            origin_y: 0,
        }
    }

    /// Geometry for an 8-bit grayscale image.
    #[must_use]
    pub const fn grayscale(width: u32, height: u32) -> Self {
        let mut geometry = Self::rgb(width, height);
        geometry.samples_per_pixel = 1;
        geometry.photometric = Photometric::Grayscale;
        geometry
    }

    /// Byte length of one packed row:
    /// `ceil(bits_per_sample * samples_per_pixel * width / 8)`.
    #[must_use]
    pub const fn scanline_bytes(&self) -> usize {
        let bits = self.bits_per_sample as usize * self.samples_per_pixel as usize
            * self.width as usize;
        bits.div_ceil(8)
    }

    /// Bytes per pixel for 8-bit interleaved storage.
    #[must_use]
    pub const fn pixel_stride(&self) -> usize {
        self.samples_per_pixel as usize
    }

    /// Total byte length of the packed buffer.
    #[must_use]
    pub const fn packed_len(&self) -> usize {
        self.scanline_bytes() * self.height as usize
    }
}

/// A signed pixel offset: `dx` columns, `dy` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Offset {
    /// Horizontal shift in pixels (positive = right).
    pub dx: i32,
    /// Vertical shift in pixels (positive = down).
    pub dy: i32,
}

impl Offset {
    /// Create a new offset.
    #[must_use]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

/// Errors reported by canvas operations.
///
/// All are returned to the direct caller; no operation retries
/// internally. Allocation failure is not represented here (the process
/// aborts, there is no smaller fallback for an in-memory buffer).
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    /// A packed buffer or pixel array had the wrong length.
    #[error("buffer size mismatch: expected {expected} elements, got {actual}")]
    SizeMismatch {
        /// Required element count.
        expected: usize,
        /// Provided element count.
        actual: usize,
    },

    /// The planar layout is recognized but not operable, or unknown.
    #[error("unsupported planar layout (code {code})")]
    UnsupportedLayout {
        /// The offending layout tag code.
        code: u16,
    },

    /// The photometric mode is not one the canvas supports.
    #[error("unsupported photometric interpretation (code {code})")]
    UnsupportedPhotometric {
        /// The offending photometric tag code.
        code: u16,
    },

    /// Pixel-addressed operations only support 8 bits per sample.
    #[error("unsupported sample depth: {bits} bits per sample")]
    UnsupportedDepth {
        /// The offending depth.
        bits: u16,
    },

    /// Two canvases that must have equal dimensions do not.
    #[error("canvas dimensions do not match: {width}x{height} vs {other_width}x{other_height}")]
    DimensionMismatch {
        /// Width of the canvas the operation was invoked on.
        width: u32,
        /// Height of the canvas the operation was invoked on.
        height: u32,
        /// Width of the other canvas.
        other_width: u32,
        /// Height of the other canvas.
        other_height: u32,
    },

    /// Two canvases being composited store different samples per pixel.
    #[error("samples per pixel do not match: {expected} vs {actual}")]
    SampleMismatch {
        /// Samples per pixel of the destination.
        expected: u16,
        /// Samples per pixel of the source.
        actual: u16,
    },

    /// A row copy or move could not complete within the destination.
    #[error("row copy failed at destination row {row}")]
    BadCopy {
        /// The destination row that could not be written.
        row: u32,
    },

    /// The requested search window would index outside an image.
    #[error("search window around guess ({dx}, {dy}) extends outside the image")]
    OutOfBounds {
        /// Horizontal component of the initial guess.
        dx: i32,
        /// Vertical component of the initial guess.
        dy: i32,
    },

    /// No uniform border line was found.
    #[error("no uniform border line found")]
    NoBackgroundFound,
}
