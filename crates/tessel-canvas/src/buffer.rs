//! Row-oriented pixel byte storage.
//!
//! A [`PixelBuffer`] owns one `Vec<u8>` per scanline. Rows are
//! reallocated wholesale whenever geometry changes (grow, crop, chop);
//! `Clone` deep-copies the backing storage.
//!
//! The buffer knows only byte lengths, not pixel formats — geometry
//! interpretation (samples per pixel, photometric mode) lives in
//! [`Canvas`](crate::Canvas).

use crate::types::CanvasError;

/// Owned row-major pixel byte storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    rows: Vec<Vec<u8>>,
    scanline: usize,
}

impl PixelBuffer {
    /// Allocate a zero-filled buffer of `height` rows, each
    /// `scanline_bytes` long.
    #[must_use]
    pub fn new(height: u32, scanline_bytes: usize) -> Self {
        Self {
            rows: (0..height).map(|_| vec![0u8; scanline_bytes]).collect(),
            scanline: scanline_bytes,
        }
    }

    /// Build a buffer from a flat packed byte array.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::SizeMismatch`] unless
    /// `packed.len() == height * scanline_bytes`.
    pub fn from_packed(
        packed: &[u8],
        height: u32,
        scanline_bytes: usize,
    ) -> Result<Self, CanvasError> {
        let expected = height as usize * scanline_bytes;
        if packed.len() != expected {
            return Err(CanvasError::SizeMismatch {
                expected,
                actual: packed.len(),
            });
        }

        let rows = if scanline_bytes == 0 {
            (0..height).map(|_| Vec::new()).collect()
        } else {
            packed
                .chunks_exact(scanline_bytes)
                .map(<[u8]>::to_vec)
                .collect()
        };
        Ok(Self {
            rows,
            scanline: scanline_bytes,
        })
    }

    /// Flatten the rows into one contiguous packed byte array.
    #[must_use]
    pub fn to_packed(&self) -> Vec<u8> {
        let mut packed = Vec::with_capacity(self.rows.len() * self.scanline);
        for row in &self.rows {
            packed.extend_from_slice(row);
        }
        packed
    }

    /// Number of rows.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.rows.len() as u32
    }

    /// Byte length of each row.
    #[must_use]
    pub const fn scanline_bytes(&self) -> usize {
        self.scanline
    }

    /// Borrow row `index`.
    #[must_use]
    pub fn row(&self, index: usize) -> &[u8] {
        &self.rows[index]
    }

    /// Mutably borrow row `index`.
    pub fn row_mut(&mut self, index: usize) -> &mut [u8] {
        &mut self.rows[index]
    }

    /// Iterate over all rows.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Pack one 32-bit ARGB value per pixel into 3-byte interleaved
    /// storage. The alpha byte is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::SizeMismatch`] unless `pixels` holds
    /// exactly `width * height` values.
    pub fn set_pixels(&mut self, pixels: &[u32], width: u32) -> Result<(), CanvasError> {
        let expected = width as usize * self.rows.len();
        if pixels.len() != expected {
            return Err(CanvasError::SizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        let width = width as usize;
        for (row, line) in self.rows.iter_mut().enumerate() {
            for (i, &p) in pixels[row * width..(row + 1) * width].iter().enumerate() {
                line[3 * i] = (p >> 16) as u8;
                line[3 * i + 1] = (p >> 8) as u8;
                line[3 * i + 2] = p as u8;
            }
        }
        Ok(())
    }

    /// Unpack 3-byte interleaved storage into one 32-bit ARGB value per
    /// pixel. Alpha is synthesized as fully opaque.
    #[must_use]
    pub fn get_pixels(&self, width: u32) -> Vec<u32> {
        let width = width as usize;
        let mut pixels = Vec::with_capacity(width * self.rows.len());
        for line in &self.rows {
            for i in 0..width {
                let r = u32::from(line[3 * i]);
                let g = u32::from(line[3 * i + 1]);
                let b = u32::from(line[3 * i + 2]);
                pixels.push(0xFF00_0000 | (r << 16) | (g << 8) | b);
            }
        }
        pixels
    }

    /// Reallocate to `new_height` rows of `new_scanline_bytes`, copying
    /// the existing content so that old row `i` lands at new row
    /// `i + row_shift`, starting at byte `byte_shift`. New regions are
    /// zero-filled.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::BadCopy`] if the anchored old content would
    /// not fit inside the new allocation.
    pub fn grow(
        &mut self,
        new_height: u32,
        new_scanline_bytes: usize,
        row_shift: u32,
        byte_shift: usize,
    ) -> Result<(), CanvasError> {
        let mut new_rows: Vec<Vec<u8>> = (0..new_height)
            .map(|_| vec![0u8; new_scanline_bytes])
            .collect();

        for (i, old_row) in self.rows.iter().enumerate() {
            let j = i + row_shift as usize;
            let Some(target) = new_rows.get_mut(j) else {
                return Err(CanvasError::BadCopy { row: j as u32 });
            };
            let end = byte_shift + old_row.len();
            if end > target.len() {
                return Err(CanvasError::BadCopy { row: j as u32 });
            }
            target[byte_shift..end].copy_from_slice(old_row);
        }

        self.rows = new_rows;
        self.scanline = new_scanline_bytes;
        Ok(())
    }

    /// Drop all rows at and beyond `new_height`.
    pub fn truncate(&mut self, new_height: u32) {
        self.rows.truncate(new_height as usize);
    }

    /// Drop the first `count` rows, shifting the rest up.
    pub(crate) fn drop_leading_rows(&mut self, count: usize) {
        self.rows.drain(..count.min(self.rows.len()));
    }

    /// Shrink every row to `new_scanline_bytes`, keeping the byte range
    /// starting at `byte_start`.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::BadCopy`] if the requested range falls
    /// outside any row.
    pub(crate) fn shift_rows_left(
        &mut self,
        byte_start: usize,
        new_scanline_bytes: usize,
    ) -> Result<(), CanvasError> {
        for (j, row) in self.rows.iter_mut().enumerate() {
            let end = byte_start + new_scanline_bytes;
            if end > row.len() {
                return Err(CanvasError::BadCopy { row: j as u32 });
            }
            row.copy_within(byte_start..end, 0);
            row.truncate(new_scanline_bytes);
        }
        self.scanline = new_scanline_bytes;
        Ok(())
    }
}
