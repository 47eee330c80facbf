//! The canvas aggregate: geometry, pixel buffer, and luminance cache.
//!
//! A [`Canvas`] exclusively owns its storage; nothing is shared between
//! canvases. Codec adapters talk to it through exactly two calls —
//! [`Canvas::from_packed`] and [`Canvas::to_packed`] — plus the
//! [`Geometry`] record. The canvas itself performs no file I/O.

use crate::buffer::PixelBuffer;
use crate::luma::{Luma, LumaState, LuminanceCache, luma_of};
use crate::types::{CanvasError, Geometry, Photometric, PlanarLayout};

/// A mutable in-memory raster image.
#[derive(Debug, Clone)]
pub struct Canvas {
    pub(crate) geometry: Geometry,
    pub(crate) buffer: PixelBuffer,
    pub(crate) luma: LuminanceCache,
}

impl Canvas {
    /// A zero-filled 8-bit RGB canvas.
    #[must_use]
    pub fn new_rgb(width: u32, height: u32) -> Self {
        let geometry = Geometry::rgb(width, height);
        let buffer = PixelBuffer::new(height, geometry.scanline_bytes());
        Self {
            geometry,
            buffer,
            luma: LuminanceCache::new(),
        }
    }

    /// A zero-filled 8-bit grayscale canvas.
    #[must_use]
    pub fn new_grayscale(width: u32, height: u32) -> Self {
        let geometry = Geometry::grayscale(width, height);
        let buffer = PixelBuffer::new(height, geometry.scanline_bytes());
        Self {
            geometry,
            buffer,
            luma: LuminanceCache::new(),
        }
    }

    /// A zero-filled canvas with the given geometry.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::UnsupportedLayout`] unless the layout is
    /// interleaved, and [`CanvasError::UnsupportedDepth`] unless samples
    /// are 8 bits deep — the only storage the pixel operations address.
    pub fn with_geometry(geometry: Geometry) -> Result<Self, CanvasError> {
        Self::validate(&geometry)?;
        let buffer = PixelBuffer::new(geometry.height, geometry.scanline_bytes());
        Ok(Self {
            geometry,
            buffer,
            luma: LuminanceCache::new(),
        })
    }

    /// A zero-filled canvas with new dimensions but `other`'s tags
    /// (photometric mode, advisory metadata) carried over.
    #[must_use]
    pub fn like(other: &Self, width: u32, height: u32) -> Self {
        let geometry = Geometry {
            width,
            height,
            ..other.geometry.clone()
        };
        let buffer = PixelBuffer::new(height, geometry.scanline_bytes());
        Self {
            geometry,
            buffer,
            luma: LuminanceCache::new(),
        }
    }

    /// Build a canvas from a flat packed byte buffer, the boundary a
    /// codec adapter populates after decoding.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::SizeMismatch`] unless
    /// `packed.len() == height * scanline_bytes`, plus the geometry
    /// validation errors of [`Canvas::with_geometry`].
    pub fn from_packed(geometry: Geometry, packed: &[u8]) -> Result<Self, CanvasError> {
        Self::validate(&geometry)?;
        let buffer = PixelBuffer::from_packed(packed, geometry.height, geometry.scanline_bytes())?;
        Ok(Self {
            geometry,
            buffer,
            luma: LuminanceCache::new(),
        })
    }

    /// Flatten the canvas into a packed byte buffer for a codec adapter
    /// to encode.
    #[must_use]
    pub fn to_packed(&self) -> Vec<u8> {
        self.buffer.to_packed()
    }

    fn validate(geometry: &Geometry) -> Result<(), CanvasError> {
        if geometry.layout != PlanarLayout::Interleaved {
            return Err(CanvasError::UnsupportedLayout {
                code: geometry.layout.code(),
            });
        }
        if geometry.bits_per_sample != 8 {
            return Err(CanvasError::UnsupportedDepth {
                bits: geometry.bits_per_sample,
            });
        }
        Ok(())
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.geometry.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.geometry.height
    }

    /// The full geometry/tag record.
    #[must_use]
    pub const fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Freshness of the cached luminance plane.
    ///
    /// Grayscale canvases alias the pixel buffer, so their luminance is
    /// fresh by construction.
    #[must_use]
    pub const fn luma_state(&self) -> LumaState {
        match self.geometry.photometric {
            Photometric::Grayscale => LumaState::Fresh,
            Photometric::Rgb => self.luma.state(),
        }
    }

    /// Replace the pixel content from one 32-bit ARGB value per pixel.
    /// Alpha is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::UnsupportedPhotometric`] on a grayscale
    /// canvas (ARGB packing addresses 3-byte pixels) and
    /// [`CanvasError::SizeMismatch`] unless `pixels` holds exactly
    /// `width * height` values.
    pub fn set_pixels(&mut self, pixels: &[u32]) -> Result<(), CanvasError> {
        if self.geometry.photometric != Photometric::Rgb {
            return Err(CanvasError::UnsupportedPhotometric {
                code: self.geometry.photometric.code(),
            });
        }
        self.buffer.set_pixels(pixels, self.geometry.width)?;
        self.luma.invalidate();
        Ok(())
    }

    /// Read the pixel content as one 32-bit ARGB value per pixel, alpha
    /// synthesized fully opaque.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::UnsupportedPhotometric`] on a grayscale
    /// canvas.
    pub fn get_pixels(&self) -> Result<Vec<u32>, CanvasError> {
        if self.geometry.photometric != Photometric::Rgb {
            return Err(CanvasError::UnsupportedPhotometric {
                code: self.geometry.photometric.code(),
            });
        }
        Ok(self.buffer.get_pixels(self.geometry.width))
    }

    /// Copy `other`'s content into this canvas without reallocating or
    /// changing this canvas's geometry.
    ///
    /// The destination keeps its own tags; `other`'s rows land in the
    /// top-left corner. An RGB source copies into a grayscale
    /// destination as its luminance plane.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::DimensionMismatch`] if this canvas is
    /// smaller than `other` in either axis (assignment never shrinks),
    /// and [`CanvasError::UnsupportedPhotometric`] for any conversion
    /// other than same-mode or RGB into grayscale.
    pub fn copy_from(&mut self, other: &Self) -> Result<(), CanvasError> {
        if self.geometry.width < other.geometry.width
            || self.geometry.height < other.geometry.height
        {
            return Err(CanvasError::DimensionMismatch {
                width: self.geometry.width,
                height: self.geometry.height,
                other_width: other.geometry.width,
                other_height: other.geometry.height,
            });
        }

        let src_rows = other.geometry.height as usize;
        match (self.geometry.photometric, other.geometry.photometric) {
            (a, b) if a == b => {
                let src_scanline = other.buffer.scanline_bytes();
                for j in 0..src_rows {
                    self.buffer.row_mut(j)[..src_scanline].copy_from_slice(other.buffer.row(j));
                }
            }
            (Photometric::Grayscale, Photometric::Rgb) => {
                // Convert on the fly rather than trusting other's cache,
                // which may be stale.
                let width = other.geometry.width as usize;
                for j in 0..src_rows {
                    let src = other.buffer.row(j);
                    let dst = self.buffer.row_mut(j);
                    for i in 0..width {
                        dst[i] = luma_of(src[3 * i], src[3 * i + 1], src[3 * i + 2]);
                    }
                }
            }
            (_, source) => {
                return Err(CanvasError::UnsupportedPhotometric {
                    code: source.code(),
                });
            }
        }

        self.luma.invalidate();
        Ok(())
    }

    /// Borrow the luminance view, refreshing the cache first if the
    /// pixel content changed since the last derivation.
    pub fn luma(&mut self) -> Luma<'_> {
        self.refresh_luma();
        self.luma_view()
    }

    /// Force the cached luminance plane fresh. No-op for grayscale.
    pub(crate) fn refresh_luma(&mut self) {
        if self.geometry.photometric == Photometric::Rgb && self.luma.state() != LumaState::Fresh {
            self.luma.refresh(&self.buffer, self.geometry.width);
        }
    }

    /// Luminance view without refreshing. Callers inside the crate must
    /// have called [`refresh_luma`](Self::refresh_luma) first.
    pub(crate) const fn luma_view(&self) -> Luma<'_> {
        match self.geometry.photometric {
            Photometric::Grayscale => Luma::aliasing(&self.buffer),
            Photometric::Rgb => Luma::cached(&self.luma),
        }
    }
}
