//! Spatial alignment of two canvases by block-matching search.
//!
//! The similarity metric is the summed absolute difference (MAD) of a
//! fixed-size luminance sampling block between the two images at a
//! candidate offset. Two complementary strategies minimize it:
//!
//! - [`full_scan`] sweeps a rectangular window around the initial
//!   guess in row-major order — exhaustive within the window, the
//!   validated default.
//! - [`radar_scan`] visits offsets in expanding square rings around
//!   the guess. It converges faster when the true offset is close to
//!   the guess, but early termination can stop on a local minimum, so
//!   it does not guarantee the window's global minimum.
//!
//! Both stop the moment a MAD at or below the configured threshold is
//! found. Rotation estimation is not implemented.

use serde::{Deserialize, Serialize};

use crate::canvas::Canvas;
use crate::luma::Luma;
use crate::types::{CanvasError, Offset};

/// Tunables for the alignment search.
///
/// The defaults are the empirically validated values; `min_gradient`
/// scales with the block area (3 per block pixel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Side length of the square sampling block, in pixels.
    pub block_size: u32,

    /// Half-extent of the search window: offsets within `±window` of
    /// the initial guess are candidates.
    pub window: u32,

    /// A MAD at or below this value is good enough to stop the scan
    /// immediately.
    pub mad_threshold: u32,

    /// Minimum sum of absolute adjacent-pixel luminance gradients over
    /// the sampling block. A nonzero sum below this marks the block as
    /// low-detail: matches may be unreliable, though the scan proceeds.
    pub min_gradient: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            block_size: 16,
            window: 10,
            mad_threshold: 400,
            min_gradient: 3 * 16 * 16,
        }
    }
}

/// Outcome of one alignment scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    /// The best offset found.
    pub offset: Offset,
    /// The MAD at that offset; zero is a perfect block match.
    pub mad: u32,
    /// How many offsets were evaluated before the scan stopped.
    pub evaluations: u32,
    /// The sampling block sits in a low-detail region; the reported
    /// offset may be unreliable. Only [`full_scan`] performs this
    /// pre-check; [`radar_scan`] always reports `false`.
    pub low_detail: bool,
}

/// Selects which scan strategy to run.
///
/// `Full` is the validated default. `Radar` is a faster heuristic with
/// no global-minimum guarantee — do not treat the two as
/// interchangeable in correctness-sensitive callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStrategy {
    /// Exhaustive row-major sweep of the window ([`full_scan`]).
    #[default]
    Full,
    /// Expanding square rings from the guess ([`radar_scan`]).
    Radar,
}

impl SearchStrategy {
    /// Run the selected scan.
    ///
    /// # Errors
    ///
    /// Propagates the underlying scan's [`CanvasError::OutOfBounds`].
    pub fn scan(
        self,
        canvas: &mut Canvas,
        other: &mut Canvas,
        guess: Offset,
        config: &SearchConfig,
    ) -> Result<ScanReport, CanvasError> {
        match self {
            Self::Full => full_scan(canvas, other, guess, config),
            Self::Radar => radar_scan(canvas, other, guess, config),
        }
    }
}

/// Find the offset of `other` relative to `canvas`.
///
/// The alignment entry point: runs [`full_scan`] (the validated
/// strategy) around `guess` and returns the optimized offset. The
/// rotation component of the original problem is a non-goal and is not
/// estimated.
///
/// # Errors
///
/// Returns [`CanvasError::OutOfBounds`] if the search window plus
/// sampling block plus `|guess|` would index outside either image;
/// supply a guess within the image interior.
pub fn find_offset(
    canvas: &mut Canvas,
    other: &mut Canvas,
    guess: Offset,
    config: &SearchConfig,
) -> Result<Offset, CanvasError> {
    full_scan(canvas, other, guess, config).map(|report| report.offset)
}

/// Exhaustively evaluate MAD over `±window` around `guess`, row-major,
/// stopping early at the first offset at or below the MAD threshold.
///
/// Before scanning, the absolute-gradient sum over the sampling block
/// is measured; a nonzero sum below `config.min_gradient` sets
/// [`ScanReport::low_detail`] (non-fatal — the scan proceeds).
///
/// # Errors
///
/// Returns [`CanvasError::OutOfBounds`] if the window plus block plus
/// `|guess|` would index outside either image.
pub fn full_scan(
    canvas: &mut Canvas,
    other: &mut Canvas,
    guess: Offset,
    config: &SearchConfig,
) -> Result<ScanReport, CanvasError> {
    canvas.refresh_luma();
    other.refresh_luma();

    let n = config.block_size as usize;
    // Sampling block anchored at 2/5 of each extent, just off center.
    let i0 = canvas.width() as usize * 2 / 5;
    let j0 = canvas.height() as usize * 2 / 5;
    check_window(canvas, other, i0, j0, n, guess, config.window)?;

    let block = SampleBlock {
        a: canvas.luma_view(),
        b: other.luma_view(),
        i0,
        j0,
        n,
    };
    let low_detail = block.is_low_detail(config.min_gradient);

    let window = config.window as i32;
    let mut evaluations = 0u32;
    let mut best: Option<(u32, Offset)> = None;

    for jc in -window..window {
        let sy = guess.dy + jc;
        for ic in -window..window {
            let sx = guess.dx + ic;
            let mad = block.mad(sx, sy);
            evaluations += 1;

            if best.is_none_or(|(least, _)| mad < least) {
                best = Some((mad, Offset::new(sx, sy)));
                if mad <= config.mad_threshold {
                    return Ok(ScanReport {
                        offset: Offset::new(sx, sy),
                        mad,
                        evaluations,
                        low_detail,
                    });
                }
            }
        }
    }

    // A zero-width window visits nothing; fall back to the guess.
    let (mad, offset) = match best {
        Some(found) => found,
        None => {
            evaluations += 1;
            (block.mad(guess.dx, guess.dy), guess)
        }
    };
    Ok(ScanReport {
        offset,
        mad,
        evaluations,
        low_detail,
    })
}

/// Evaluate MAD in expanding square rings around `guess`.
///
/// Ring sides grow 2, 4, … up to `2 × window`; each ring is swept from
/// its lower-right corner in a fixed rotational order (down the right
/// side first). The guess itself is evaluated before the first ring to
/// seed the minimum. Early termination matches [`full_scan`], but the
/// ring ordering is a heuristic: a local minimum can stop the scan
/// before the window's global minimum is seen.
///
/// # Errors
///
/// Returns [`CanvasError::OutOfBounds`] if the window plus block plus
/// `|guess|` would index outside either image.
pub fn radar_scan(
    canvas: &mut Canvas,
    other: &mut Canvas,
    guess: Offset,
    config: &SearchConfig,
) -> Result<ScanReport, CanvasError> {
    canvas.refresh_luma();
    other.refresh_luma();

    let n = config.block_size as usize;
    // The ring walk anchors its block at the true center.
    let i0 = canvas.width() as usize / 2;
    let j0 = canvas.height() as usize / 2;
    check_window(canvas, other, i0, j0, n, guess, config.window)?;

    let block = SampleBlock {
        a: canvas.luma_view(),
        b: other.luma_view(),
        i0,
        j0,
        n,
    };

    let mut evaluations = 1u32;
    let mut best_mad = block.mad(guess.dx, guess.dy);
    let mut best = guess;

    if best_mad > config.mad_threshold {
        let mut sx = guess.dx;
        let mut sy = guess.dy;
        let mut visit = |sx: i32, sy: i32| {
            let mad = block.mad(sx, sy);
            evaluations += 1;
            if mad < best_mad {
                best_mad = mad;
                best = Offset::new(sx, sy);
            }
            best_mad <= config.mad_threshold
        };

        let mut side = 2u32;
        'rings: while side <= 2 * config.window {
            // Step out to the ring's lower-right corner.
            sx += 1;
            sy -= 1;

            for _ in 0..side {
                sy += 1;
                if visit(sx, sy) {
                    break 'rings;
                }
            }
            for _ in 0..side {
                sx -= 1;
                if visit(sx, sy) {
                    break 'rings;
                }
            }
            for _ in 0..side {
                sy -= 1;
                if visit(sx, sy) {
                    break 'rings;
                }
            }
            for _ in 0..side {
                sx += 1;
                if visit(sx, sy) {
                    break 'rings;
                }
            }

            side += 2;
        }
    }

    Ok(ScanReport {
        offset: best,
        mad: best_mad,
        evaluations,
        low_detail: false,
    })
}

/// Reject scans whose block, shifted anywhere within the window around
/// the guess, could index outside either image.
fn check_window(
    canvas: &Canvas,
    other: &Canvas,
    i0: usize,
    j0: usize,
    n: usize,
    guess: Offset,
    window: u32,
) -> Result<(), CanvasError> {
    let fits = |width: u32, height: u32| {
        let (i0, j0, n) = (i0 as i64, j0 as i64, n as i64);
        let win = i64::from(window);
        let adx = i64::from(guess.dx).abs();
        let ady = i64::from(guess.dy).abs();

        j0 - ady - win >= 0
            && j0 + n + ady + win <= i64::from(height)
            && i0 - adx - win >= 0
            && i0 + n + adx + win <= i64::from(width)
    };

    if fits(canvas.width(), canvas.height()) && fits(other.width(), other.height()) {
        Ok(())
    } else {
        Err(CanvasError::OutOfBounds {
            dx: guess.dx,
            dy: guess.dy,
        })
    }
}

/// The two luminance views plus the anchored sampling block.
struct SampleBlock<'a> {
    a: Luma<'a>,
    b: Luma<'a>,
    i0: usize,
    j0: usize,
    n: usize,
}

impl SampleBlock<'_> {
    /// Summed absolute difference between this block on `a` and the
    /// block shifted by (`-sx`, `-sy`) on `b`.
    fn mad(&self, sx: i32, sy: i32) -> u32 {
        let bx = (self.i0 as i64 - i64::from(sx)) as usize;
        let mut sum = 0u32;
        for j in self.j0..self.j0 + self.n {
            let bj = (j as i64 - i64::from(sy)) as usize;
            let row_a = &self.a.row(j)[self.i0..self.i0 + self.n];
            let row_b = &self.b.row(bj)[bx..bx + self.n];
            for (va, vb) in row_a.iter().zip(row_b) {
                sum += u32::from(va.abs_diff(*vb));
            }
        }
        sum
    }

    /// Sum of absolute adjacent-pixel gradients inside the block on
    /// `a`, compared against the empirical minimum.
    fn is_low_detail(&self, min_gradient: u32) -> bool {
        if self.i0 == 0 || self.j0 == 0 {
            return false;
        }

        let mut absgrad = 0u32;
        for j in self.j0..self.j0 + self.n {
            let row = self.a.row(j);
            let above = self.a.row(j - 1);
            for i in self.i0..self.i0 + self.n {
                absgrad +=
                    u32::from(row[i].abs_diff(row[i - 1])) + u32::from(row[i].abs_diff(above[i]));
            }
        }
        absgrad > 0 && absgrad < min_gradient
    }
}
