//! Codec adapter backed by the `image` crate.
//!
//! One [`ImageCodec`] instance handles one format (PNG, JPEG, BMP,
//! WebP). Decoding accepts 8-bit grayscale and RGB pixel data — an
//! alpha channel is discarded, matching how the canvas treats ARGB
//! input — and rejects deeper sample formats. Encoding writes the
//! packed canvas bytes back out as L8 or RGB8.
//!
//! WebP is decode-only in the backing crate; encoding through a WebP
//! instance reports an encode failure.

use std::path::Path;

use image::{ColorType, ExtendedColorType, ImageFormat};
use tessel_canvas::{Geometry, Photometric};

use crate::{Codec, CodecError, Decoded};

/// Adapter for one `image`-crate format.
#[derive(Debug, Clone, Copy)]
pub struct ImageCodec {
    format: ImageFormat,
}

impl ImageCodec {
    /// An adapter for the given format.
    #[must_use]
    pub const fn new(format: ImageFormat) -> Self {
        Self { format }
    }

    /// PNG adapter.
    #[must_use]
    pub const fn png() -> Self {
        Self::new(ImageFormat::Png)
    }

    /// JPEG adapter (lossy; round trips are approximate).
    #[must_use]
    pub const fn jpeg() -> Self {
        Self::new(ImageFormat::Jpeg)
    }

    /// BMP adapter.
    #[must_use]
    pub const fn bmp() -> Self {
        Self::new(ImageFormat::Bmp)
    }

    /// WebP adapter (decode-only).
    #[must_use]
    pub const fn webp() -> Self {
        Self::new(ImageFormat::WebP)
    }
}

impl Codec for ImageCodec {
    fn decode(&self, path: &Path) -> Result<Decoded, CodecError> {
        let mut reader = image::ImageReader::open(path)?;
        // Decode strictly as this adapter's format; no content sniffing.
        reader.set_format(self.format);
        let dynamic = reader.decode().map_err(|e| CodecError::Decode {
            reason: e.to_string(),
        })?;

        let color = dynamic.color();
        match color {
            ColorType::L8 | ColorType::La8 => {
                let img = dynamic.into_luma8();
                let geometry = Geometry::grayscale(img.width(), img.height());
                Ok(Decoded {
                    geometry,
                    packed: img.into_raw(),
                })
            }
            ColorType::Rgb8 | ColorType::Rgba8 => {
                let img = dynamic.into_rgb8();
                let geometry = Geometry::rgb(img.width(), img.height());
                Ok(Decoded {
                    geometry,
                    packed: img.into_raw(),
                })
            }
            other => Err(CodecError::Decode {
                reason: format!("unsupported pixel format {other:?} (only 8-bit channels)"),
            }),
        }
    }

    fn encode(&self, geometry: &Geometry, packed: &[u8], path: &Path) -> Result<(), CodecError> {
        if packed.len() != geometry.packed_len() {
            return Err(CodecError::Encode {
                reason: format!(
                    "packed buffer is {} bytes, geometry needs {}",
                    packed.len(),
                    geometry.packed_len(),
                ),
            });
        }

        let color = match (geometry.photometric, geometry.bits_per_sample) {
            (Photometric::Grayscale, 8) => ExtendedColorType::L8,
            (Photometric::Rgb, 8) => ExtendedColorType::Rgb8,
            (_, bits) => {
                return Err(CodecError::Encode {
                    reason: format!("unsupported sample depth: {bits} bits"),
                });
            }
        };

        image::save_buffer_with_format(
            path,
            packed,
            geometry.width,
            geometry.height,
            color,
            self.format,
        )
        .map_err(|e| CodecError::Encode {
            reason: e.to_string(),
        })
    }
}
