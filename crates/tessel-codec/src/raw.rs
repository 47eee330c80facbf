//! Headerless raw pixel files.
//!
//! A raw file is nothing but the packed pixel bytes, so the geometry
//! cannot be recovered from the file itself — it is preset when the
//! adapter is constructed, and decoding validates the file length
//! against it.

use std::path::Path;

use tessel_canvas::Geometry;

use crate::{Codec, CodecError, Decoded};

/// Adapter for headerless packed pixel files.
#[derive(Debug, Clone)]
pub struct RawCodec {
    geometry: Geometry,
}

impl RawCodec {
    /// An adapter that reads and writes raw files of exactly this
    /// geometry.
    #[must_use]
    pub const fn new(geometry: Geometry) -> Self {
        Self { geometry }
    }
}

impl Codec for RawCodec {
    fn decode(&self, path: &Path) -> Result<Decoded, CodecError> {
        if self.geometry.width == 0 || self.geometry.height == 0 {
            return Err(CodecError::Decode {
                reason: "raw geometry has zero extent".to_owned(),
            });
        }

        let packed = std::fs::read(path)?;
        let expected = self.geometry.packed_len();
        if packed.len() != expected {
            return Err(CodecError::Decode {
                reason: format!("raw file is {} bytes, geometry needs {expected}", packed.len()),
            });
        }

        Ok(Decoded {
            geometry: self.geometry.clone(),
            packed,
        })
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

        std::fs::write(path, packed)?;
        Ok(())
    }
}
