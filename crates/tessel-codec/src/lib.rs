//! tessel-codec: codec adapters for tessel canvases.
//!
//! The canvas core performs no file I/O. Everything that touches a
//! persisted image format lives here, behind the [`Codec`] capability
//! trait: `decode` produces a ([`Geometry`], packed bytes) pair and
//! `encode` consumes one — exactly the boundary
//! [`Canvas::from_packed`] / [`Canvas::to_packed`] expose.
//!
//! Concrete adapters are selected from a [`CodecRegistry`] keyed on a
//! format identifier. Mapping filenames to format identifiers is a
//! caller concern, not part of this crate.

use std::path::Path;

use tessel_canvas::{Canvas, CanvasError, Geometry};

pub mod formats;
pub mod raw;
pub mod registry;

pub use formats::ImageCodec;
pub use raw::RawCodec;
pub use registry::CodecRegistry;

/// A decoded image: the geometry/tag record plus the flat packed pixel
/// buffer, ready for [`Canvas::from_packed`].
#[derive(Debug, Clone)]
pub struct Decoded {
    /// Geometry describing the packed buffer.
    pub geometry: Geometry,
    /// Row-major packed pixel bytes, `geometry.packed_len()` long.
    pub packed: Vec<u8>,
}

/// Capability trait for one persisted image format.
///
/// Adapters own all format-specific parsing, compression handling, and
/// container structure; the canvas never sees any of it.
pub trait Codec {
    /// Decode the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decode`] on malformed input, unsupported
    /// compression, unsupported pixel depth, or an unsupported channel
    /// layout, and [`CodecError::Io`] if the file cannot be read.
    fn decode(&self, path: &Path) -> Result<Decoded, CodecError>;

    /// Encode `packed` (described by `geometry`) to the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] if the geometry cannot be
    /// represented in this format or the buffer length does not match
    /// it, and [`CodecError::Io`] if the file cannot be written.
    fn encode(&self, geometry: &Geometry, packed: &[u8], path: &Path) -> Result<(), CodecError>;
}

/// Errors reported by codec adapters.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The input could not be decoded.
    #[error("decode failed: {reason}")]
    Decode {
        /// What the adapter could not handle.
        reason: String,
    },

    /// The output could not be encoded.
    #[error("encode failed: {reason}")]
    Encode {
        /// What the adapter could not produce.
        reason: String,
    },

    /// Reading or writing the file itself failed.
    #[error("file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The decoded data was rejected by the canvas boundary.
    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

/// Decode a file straight into a canvas.
///
/// # Errors
///
/// Propagates the codec's errors plus any [`CanvasError`] from the
/// packed-buffer boundary.
pub fn read_canvas(codec: &dyn Codec, path: &Path) -> Result<Canvas, CodecError> {
    let decoded = codec.decode(path)?;
    Ok(Canvas::from_packed(decoded.geometry, &decoded.packed)?)
}

/// Encode a canvas to a file.
///
/// # Errors
///
/// Propagates the codec's errors.
pub fn write_canvas(codec: &dyn Codec, canvas: &Canvas, path: &Path) -> Result<(), CodecError> {
    codec.encode(canvas.geometry(), &canvas.to_packed(), path)
}
