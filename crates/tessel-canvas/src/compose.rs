//! Compositing: insert one canvas into another with automatic growth,
//! XOR combination, and background detection/cropping.
//!
//! `insert` is the workhorse for building a mosaic out of overlapping
//! frames: the destination grows on demand when a source lands outside
//! its current bounds, and an optional edge-clip heuristic suppresses
//! seam artifacts on the trailing edges of a moving source.
//!
//! The edge-clip decision depends on the *previous* insertion offset,
//! which is call-sequence state, not canvas state. Callers own it as an
//! [`InsertSession`] — one per destination canvas — and thread it
//! through explicitly.

use std::cmp::Ordering;

use crate::canvas::Canvas;
use crate::luma::luma_of;
use crate::types::{CanvasError, Offset, Photometric};

/// Call-sequence state for repeated insertions into one destination.
///
/// Holds the offset actually used by the previous [`insert`] call so
/// the edge-clip heuristic can tell which way the source is moving.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertSession {
    last_offset: Offset,
}

impl InsertSession {
    /// A session with no prior insertion (previous offset is zero).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_offset: Offset::new(0, 0),
        }
    }

    /// The adjusted offset recorded by the most recent insertion.
    #[must_use]
    pub const fn last_offset(&self) -> Offset {
        self.last_offset
    }
}

/// Per-edge clip widths for one insertion, in pixels.
#[derive(Debug, Clone, Copy, Default)]
struct EdgeClip {
    left: usize,
    right: usize,
    top: usize,
    bottom: usize,
}

impl EdgeClip {
    /// Clip the trailing edges of the source based on its motion since
    /// the previous insertion, capped at 10% of the source extent per
    /// axis. An unchanged axis clips nothing.
    fn from_motion(source: &Canvas, offset: Offset, clip_margin: u32, previous: Offset) -> Self {
        let mut clip = Self::default();
        if clip_margin == 0 {
            return clip;
        }

        let margin = clip_margin as usize;
        let max_x = source.width() as usize / 10;
        let max_y = source.height() as usize / 10;

        match offset.dx.cmp(&previous.dx) {
            Ordering::Equal => {}
            Ordering::Greater => clip.left = margin.min(max_x),
            Ordering::Less => clip.right = margin.min(max_x),
        }
        match offset.dy.cmp(&previous.dy) {
            Ordering::Equal => {}
            Ordering::Greater => clip.top = margin.min(max_y),
            Ordering::Less => clip.bottom = margin.min(max_y),
        }
        clip
    }
}

/// Composite `source` onto `dest` at `offset`, growing `dest` as needed.
///
/// Returns the offset actually used: when the destination grows to
/// admit a negative or overflowing offset, the old content shifts and
/// the insertion offset is adjusted by the same amount.
///
/// Growth per overflowing axis is `max(30% of the current extent,
/// 2 × overflow)`; axes that fit are untouched. When `clip_margin > 0`
/// the trailing edges of the source (relative to the previous offset in
/// `session`) are excluded from the copy, up to `min(clip_margin, 10%
/// of the source extent)` pixels per edge.
///
/// Invalidates the destination's luminance cache.
///
/// # Errors
///
/// Returns [`CanvasError::SampleMismatch`] when the two canvases store
/// a different number of samples per pixel, and
/// [`CanvasError::BadCopy`] if a row copy cannot complete (the growth
/// step makes this unreachable in practice, but it is checked).
pub fn insert(
    dest: &mut Canvas,
    source: &Canvas,
    offset: Offset,
    clip_margin: u32,
    session: &mut InsertSession,
) -> Result<Offset, CanvasError> {
    if dest.geometry.samples_per_pixel != source.geometry.samples_per_pixel {
        return Err(CanvasError::SampleMismatch {
            expected: dest.geometry.samples_per_pixel,
            actual: source.geometry.samples_per_pixel,
        });
    }

    // Clip decisions use the offset as requested, before any growth
    // adjustment, mirroring how the motion direction is perceived.
    let clip = EdgeClip::from_motion(source, offset, clip_margin, session.last_offset);

    let src_w = i64::from(source.width());
    let src_h = i64::from(source.height());
    let mut sx = i64::from(offset.dx);
    let mut sy = i64::from(offset.dy);

    let dest_w = i64::from(dest.width());
    let dest_h = i64::from(dest.height());
    let overflow_x = if sx < 0 { -sx } else { (src_w + sx - dest_w).max(0) };
    let overflow_y = if sy < 0 { -sy } else { (src_h + sy - dest_h).max(0) };

    if overflow_x > 0 || overflow_y > 0 {
        let del_x = if overflow_x > 0 {
            (dest_w * 3 / 10).max(2 * overflow_x)
        } else {
            0
        };
        let del_y = if overflow_y > 0 {
            (dest_h * 3 / 10).max(2 * overflow_y)
        } else {
            0
        };
        // Old content anchors at the full growth amount on an axis that
        // grew leftward/upward, and stays at zero otherwise.
        let shift_x = if sx < 0 { del_x } else { 0 };
        let shift_y = if sy < 0 { del_y } else { 0 };

        dest.geometry.width = (dest_w + del_x) as u32;
        dest.geometry.height = (dest_h + del_y) as u32;
        let new_scanline = dest.geometry.scanline_bytes();
        dest.buffer.grow(
            dest.geometry.height,
            new_scanline,
            shift_y as u32,
            shift_x as usize * dest.geometry.pixel_stride(),
        )?;

        sx += shift_x;
        sy += shift_y;
    }

    // Row-by-row byte-range copy, honoring the per-edge clips.
    let stride = source.geometry.pixel_stride();
    let dest_byte = stride * (sx as usize + clip.left);
    let src_byte = stride * clip.left;
    let line_len = source.buffer.scanline_bytes() - stride * (clip.left + clip.right);
    let last_row = (src_h as usize).saturating_sub(clip.bottom);

    for i in clip.top..last_row {
        let j = sy as usize + i;
        if j >= dest.buffer.height() as usize {
            return Err(CanvasError::BadCopy { row: j as u32 });
        }
        let row = dest.buffer.row_mut(j);
        let Some(target) = row.get_mut(dest_byte..dest_byte + line_len) else {
            return Err(CanvasError::BadCopy { row: j as u32 });
        };
        target.copy_from_slice(&source.buffer.row(i)[src_byte..src_byte + line_len]);
    }

    dest.luma.invalidate();

    let adjusted = Offset::new(sx as i32, sy as i32);
    session.last_offset = adjusted;
    Ok(adjusted)
}

/// XOR every byte of `other` into `dest` in place.
///
/// Invalidates the destination's luminance cache. XOR is self-inverse:
/// applying the same canvas twice restores the original content.
///
/// # Errors
///
/// Returns [`CanvasError::DimensionMismatch`] unless both canvases have
/// identical width and height, and [`CanvasError::SampleMismatch`] if
/// their rows pack a different number of samples per pixel.
pub fn xor(dest: &mut Canvas, other: &Canvas) -> Result<(), CanvasError> {
    if dest.width() != other.width() || dest.height() != other.height() {
        return Err(CanvasError::DimensionMismatch {
            width: dest.width(),
            height: dest.height(),
            other_width: other.width(),
            other_height: other.height(),
        });
    }
    if dest.geometry.samples_per_pixel != other.geometry.samples_per_pixel {
        return Err(CanvasError::SampleMismatch {
            expected: dest.geometry.samples_per_pixel,
            actual: other.geometry.samples_per_pixel,
        });
    }

    for j in 0..dest.buffer.height() as usize {
        let row = dest.buffer.row_mut(j);
        for (d, s) in row.iter_mut().zip(other.buffer.row(j)) {
            *d ^= s;
        }
    }

    dest.luma.invalidate();
    Ok(())
}

/// Detect the background color from the canvas borders.
///
/// Inspects the four border lines of the luminance view in a fixed
/// order — top row, bottom row, left column, right column — and returns
/// the color of the first line whose pixels are all equal. The color is
/// reported as an RGB triple; grayscale canvases replicate the
/// luminance value across all three channels.
///
/// # Errors
///
/// Returns [`CanvasError::NoBackgroundFound`] when none of the four
/// border lines is uniform.
pub fn detect_background(canvas: &mut Canvas) -> Result<[u8; 3], CanvasError> {
    canvas.refresh_luma();

    let w = canvas.width() as usize;
    let h = canvas.height() as usize;
    if w == 0 || h == 0 {
        return Err(CanvasError::NoBackgroundFound);
    }

    let y = canvas.luma_view();
    let row_uniform = |j: usize| {
        let row = y.row(j);
        row.iter().all(|&v| v == row[0])
    };
    let col_uniform = |i: usize| {
        let first = y.at(i, 0);
        (1..h).all(|j| y.at(i, j) == first)
    };

    // (col, row) of a pixel on the first uniform line found.
    let found = if row_uniform(0) {
        Some((0, 0))
    } else if row_uniform(h - 1) {
        Some((0, h - 1))
    } else if col_uniform(0) {
        Some((0, 0))
    } else if col_uniform(w - 1) {
        Some((w - 1, 0))
    } else {
        None
    };
    let Some((i, j)) = found else {
        return Err(CanvasError::NoBackgroundFound);
    };

    Ok(match canvas.geometry.photometric {
        Photometric::Grayscale => {
            let v = y.at(i, j);
            [v, v, v]
        }
        Photometric::Rgb => {
            let row = canvas.buffer.row(j);
            [row[3 * i], row[3 * i + 1], row[3 * i + 2]]
        }
    })
}

/// Crop the uniform background frame off the canvas edges in place.
///
/// Detects the background color, derives its luminance threshold, and
/// scans inward from all four edges for the first line containing any
/// differing pixel. The content inside that bounding box shifts to the
/// origin, the geometry is rewritten, and the luminance cache is
/// invalidated. A canvas that is entirely background clamps to 1×1.
///
/// Returns `true` if a background was found (and the canvas possibly
/// resized); a canvas with no uniform border is left unchanged and
/// reports `false` — that case is a no-op, not an error.
///
/// # Errors
///
/// Returns [`CanvasError::BadCopy`] if the in-place row move cannot
/// complete.
pub fn crop_background(canvas: &mut Canvas) -> Result<bool, CanvasError> {
    let bg = match detect_background(canvas) {
        Ok(color) => color,
        Err(CanvasError::NoBackgroundFound) => return Ok(false),
        Err(other) => return Err(other),
    };
    let bg_luma = luma_of(bg[0], bg[1], bg[2]);

    let w = canvas.width() as usize;
    let h = canvas.height() as usize;

    // Bounding box of non-background content, inclusive on all sides.
    // The luminance view is fresh: detect_background refreshed it.
    let (top, bottom, left, right) = {
        let y = canvas.luma_view();
        let row_differs = |j: usize| y.row(j).iter().any(|&v| v != bg_luma);
        let col_differs = |i: usize| (0..h).any(|j| y.at(i, j) != bg_luma);

        match (0..h).find(|&j| row_differs(j)) {
            Some(top) => {
                let bottom = (0..h).rfind(|&j| row_differs(j)).unwrap_or(top);
                let left = (0..w).find(|&i| col_differs(i)).unwrap_or(0);
                let right = (0..w).rfind(|&i| col_differs(i)).unwrap_or(left);
                (top, bottom, left, right)
            }
            // Entirely background: clamp to the top-left pixel.
            None => (0, 0, 0, 0),
        }
    };

    let new_w = (right - left + 1) as u32;
    let new_h = (bottom - top + 1) as u32;
    let stride = canvas.geometry.pixel_stride();

    canvas.buffer.drop_leading_rows(top);
    canvas.buffer.truncate(new_h);
    canvas
        .buffer
        .shift_rows_left(left * stride, new_w as usize * stride)?;

    canvas.geometry.width = new_w;
    canvas.geometry.height = new_h;
    canvas.luma.invalidate();
    Ok(true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Geometry;

    /// Grayscale canvas filled with `fill`, one byte per pixel.
    fn gray_canvas(w: u32, h: u32, fill: u8) -> Canvas {
        let packed = vec![fill; (w * h) as usize];
        Canvas::from_packed(Geometry::grayscale(w, h), &packed).unwrap()
    }

    /// Grayscale canvas with per-pixel values from `f(col, row)`.
    fn gray_canvas_from_fn(w: u32, h: u32, f: impl Fn(u32, u32) -> u8) -> Canvas {
        let mut packed = Vec::with_capacity((w * h) as usize);
        for j in 0..h {
            for i in 0..w {
                packed.push(f(i, j));
            }
        }
        Canvas::from_packed(Geometry::grayscale(w, h), &packed).unwrap()
    }

    // ── insert ──────────────────────────────────────────────────────

    #[test]
    fn insert_inside_bounds_copies_without_growth() {
        let mut dest = gray_canvas(10, 10, 0);
        let source = gray_canvas(4, 3, 7);
        let mut session = InsertSession::new();

        let used = insert(&mut dest, &source, Offset::new(2, 5), 0, &mut session).unwrap();

        assert_eq!(used, Offset::new(2, 5));
        assert_eq!(dest.width(), 10);
        assert_eq!(dest.height(), 10);
        // Exactly the source's scanline bytes per row, at the offset.
        for j in 0..10usize {
            for i in 0..10usize {
                let expected = u8::from((2..6).contains(&i) && (5..8).contains(&j)) * 7;
                assert_eq!(dest.buffer.row(j)[i], expected, "pixel ({i}, {j})");
            }
        }
        assert_eq!(session.last_offset(), Offset::new(2, 5));
    }

    #[test]
    fn insert_negative_offset_grows_and_adjusts() {
        // 20x20 source at (-5,-5) into a 50x50 destination.
        let mut dest = gray_canvas(50, 50, 1);
        let source = gray_canvas(20, 20, 9);
        let mut session = InsertSession::new();

        let used = insert(&mut dest, &source, Offset::new(-5, -5), 0, &mut session).unwrap();

        // Growth per axis: max(30% of 50, 2*5) = 15.
        assert_eq!(dest.width(), 65);
        assert_eq!(dest.height(), 65);
        assert!(used.dx >= 0 && used.dy >= 0);
        assert_eq!(used, Offset::new(10, 10));

        // Old content shifted intact to (15, 15).
        assert_eq!(dest.buffer.row(14)[15], 0);
        assert_eq!(dest.buffer.row(15)[15], 1);
        assert_eq!(dest.buffer.row(64)[64], 1);
        // Source landed at the adjusted offset.
        assert_eq!(dest.buffer.row(10)[10], 9);
        assert_eq!(dest.buffer.row(29)[29], 9);
        assert_eq!(dest.buffer.row(30)[30], 1);
    }

    #[test]
    fn insert_far_edge_overflow_grows_only_that_axis() {
        let mut dest = gray_canvas(50, 50, 1);
        let source = gray_canvas(20, 20, 9);
        let mut session = InsertSession::new();

        // x: 45 + 20 = 65 > 50 overflows by 15; y fits.
        let used = insert(&mut dest, &source, Offset::new(45, 10), 0, &mut session).unwrap();

        // Growth: max(30% of 50, 2*15) = 30; anchored at zero shift.
        assert_eq!(dest.width(), 80);
        assert_eq!(dest.height(), 50);
        assert_eq!(used, Offset::new(45, 10));
        assert_eq!(dest.buffer.row(10)[45], 9);
        assert_eq!(dest.buffer.row(10)[64], 9);
    }

    #[test]
    fn insert_rejects_sample_mismatch() {
        let mut dest = Canvas::new_rgb(10, 10);
        let source = Canvas::new_grayscale(4, 4);
        let mut session = InsertSession::new();
        let result = insert(&mut dest, &source, Offset::new(0, 0), 0, &mut session);
        assert!(matches!(
            result,
            Err(CanvasError::SampleMismatch {
                expected: 3,
                actual: 1,
            })
        ));
    }

    #[test]
    fn insert_clips_trailing_edges_of_a_moving_source() {
        let mut dest = gray_canvas(60, 60, 0);
        let source = gray_canvas(20, 20, 9);
        let mut session = InsertSession::new();

        // First insertion: offset equals the session's zero state on
        // both axes, so nothing is clipped.
        insert(&mut dest, &source, Offset::new(0, 0), 3, &mut session).unwrap();
        assert_eq!(dest.buffer.row(0)[0], 9);

        // Second insertion moved right and down: the left and top edges
        // (trailing) are clipped by min(3, 20/10) = 2 pixels.
        let mut dest2 = gray_canvas(60, 60, 0);
        insert(&mut dest2, &source, Offset::new(30, 30), 3, &mut session).unwrap();
        assert_eq!(dest2.buffer.row(30)[30], 0, "top-left corner clipped");
        assert_eq!(dest2.buffer.row(32)[32], 9, "interior copied");
        assert_eq!(dest2.buffer.row(49)[49], 9, "bottom-right kept");

        // Third insertion moved back left/up: clips right and bottom.
        let mut dest3 = gray_canvas(60, 60, 0);
        insert(&mut dest3, &source, Offset::new(10, 10), 3, &mut session).unwrap();
        assert_eq!(dest3.buffer.row(10)[10], 9, "top-left kept");
        assert_eq!(dest3.buffer.row(29)[29], 0, "bottom-right corner clipped");
        assert_eq!(dest3.buffer.row(27)[27], 9, "interior copied");
    }

    #[test]
    fn insert_unchanged_offset_clips_nothing() {
        let source = gray_canvas(20, 20, 9);
        let mut session = InsertSession::new();

        let mut dest = gray_canvas(60, 60, 0);
        insert(&mut dest, &source, Offset::new(5, 5), 4, &mut session).unwrap();
        let mut dest2 = gray_canvas(60, 60, 0);
        insert(&mut dest2, &source, Offset::new(5, 5), 4, &mut session).unwrap();

        // Same offset as the previous call: full copy, no clip.
        assert_eq!(dest2.buffer.row(5)[5], 9);
        assert_eq!(dest2.buffer.row(24)[24], 9);
    }

    #[test]
    fn insert_invalidates_destination_luma() {
        let mut dest = Canvas::new_rgb(10, 10);
        let _ = dest.luma();
        let source = Canvas::new_rgb(2, 2);
        let mut session = InsertSession::new();
        insert(&mut dest, &source, Offset::new(1, 1), 0, &mut session).unwrap();
        assert_eq!(dest.luma_state(), crate::luma::LumaState::Stale);
    }

    // ── xor ─────────────────────────────────────────────────────────

    #[test]
    fn xor_with_self_zeroes_every_byte() {
        let a = gray_canvas_from_fn(8, 8, |i, j| (i * 16 + j) as u8);
        let mut dest = a.clone();
        xor(&mut dest, &a).unwrap();
        assert!(dest.to_packed().iter().all(|&b| b == 0));
    }

    #[test]
    fn xor_twice_restores_original() {
        let a = gray_canvas_from_fn(8, 8, |i, j| (i * 31 + j * 7) as u8);
        let b = gray_canvas_from_fn(8, 8, |i, j| (i ^ j) as u8);

        let mut combined = a.clone();
        xor(&mut combined, &b).unwrap();
        xor(&mut combined, &b).unwrap();
        assert_eq!(combined.to_packed(), a.to_packed());
    }

    #[test]
    fn xor_rejects_dimension_mismatch() {
        let mut a = gray_canvas(8, 8, 0);
        let b = gray_canvas(8, 9, 0);
        let result = xor(&mut a, &b);
        assert!(matches!(result, Err(CanvasError::DimensionMismatch { .. })));
    }

    // ── background ──────────────────────────────────────────────────

    #[test]
    fn detect_background_prefers_the_top_row() {
        // Top row uniform 200; bottom row uniform 100. Top wins.
        let mut canvas = gray_canvas_from_fn(6, 6, |i, j| match j {
            0 => 200,
            5 => 100,
            _ => (i * 40) as u8,
        });
        assert_eq!(detect_background(&mut canvas).unwrap(), [200, 200, 200]);
    }

    #[test]
    fn detect_background_falls_through_to_columns() {
        // Rows are mixed, but the left column is uniformly 50.
        let mut canvas =
            gray_canvas_from_fn(6, 6, |i, j| if i == 0 { 50 } else { (i + j * 6) as u8 });
        assert_eq!(detect_background(&mut canvas).unwrap(), [50, 50, 50]);
    }

    #[test]
    fn detect_background_reports_rgb_color() {
        // RGB canvas, all pixels one color: any border line is uniform.
        let mut canvas = Canvas::new_rgb(4, 4);
        canvas.set_pixels(&[0x0020_4060; 16]).unwrap();
        assert_eq!(detect_background(&mut canvas).unwrap(), [0x20, 0x40, 0x60]);
    }

    #[test]
    fn detect_background_fails_without_a_uniform_line() {
        let mut canvas = gray_canvas_from_fn(6, 6, |i, j| (i * 7 + j * 13) as u8);
        let result = detect_background(&mut canvas);
        assert!(matches!(result, Err(CanvasError::NoBackgroundFound)));
    }

    #[test]
    fn crop_background_shrinks_to_the_content_box() {
        // 10x10 field of 200 with textured content in rows 3..=5,
        // cols 4..=6.
        let mut canvas = gray_canvas_from_fn(10, 10, |i, j| {
            if (4..=6).contains(&i) && (3..=5).contains(&j) {
                (10 + i * 3 + j) as u8
            } else {
                200
            }
        });

        assert!(crop_background(&mut canvas).unwrap());
        assert_eq!(canvas.width(), 3);
        assert_eq!(canvas.height(), 3);
        // Content moved to the origin.
        assert_eq!(canvas.buffer.row(0)[0], 10 + 4 * 3 + 3);
        // New border is non-uniform.
        let top_row = canvas.luma().row(0).to_vec();
        assert!(top_row.iter().any(|&v| v != top_row[0]));
    }

    #[test]
    fn crop_background_without_background_is_a_no_op() {
        let mut canvas = gray_canvas_from_fn(6, 6, |i, j| (i * 7 + j * 13) as u8);
        let before = canvas.to_packed();
        assert!(!crop_background(&mut canvas).unwrap());
        assert_eq!(canvas.to_packed(), before);
        assert_eq!(canvas.width(), 6);
    }

    #[test]
    fn crop_background_on_a_uniform_canvas_clamps_to_one_pixel() {
        let mut canvas = gray_canvas(8, 8, 33);
        assert!(crop_background(&mut canvas).unwrap());
        assert_eq!((canvas.width(), canvas.height()), (1, 1));
        assert_eq!(canvas.to_packed(), vec![33]);
    }

    #[test]
    fn crop_background_updates_geometry_and_scanline() {
        let mut canvas = gray_canvas_from_fn(10, 10, |i, j| {
            u8::from((2..=7).contains(&i) && (2..=7).contains(&j)) * (10 + (i ^ j)) as u8
        });
        // Border is uniform zero; content is a 6x6 textured square.
        assert!(crop_background(&mut canvas).unwrap());
        assert_eq!(canvas.width(), 6);
        assert_eq!(canvas.height(), 6);
        assert_eq!(canvas.geometry().scanline_bytes(), 6);
        assert_eq!(canvas.to_packed().len(), 36);
    }
}
