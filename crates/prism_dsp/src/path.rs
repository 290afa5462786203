//! Curve Generation
//!
//! Maps dB spectrum frames into renderable 2-D curves in the caller's
//! coordinate space: logarithmic frequency on the x-axis (20Hz at the
//! left edge, 20kHz at the right), linear dB on the y-axis with the
//! silence floor pinned to the bottom edge. Finished curves go into a
//! small overwrite-oldest FIFO; the renderer always reads the most
//! recently completed curve and never waits for a new one.

use crate::bands::{MAX_FREQUENCY, MIN_FREQUENCY};
use crate::fifo::{self, Consumer, Producer};
use crate::spectrum::{SpectrumFrame, MIN_DB};

/// How many finished curves the FIFO holds before overwriting the oldest
pub const PATH_FIFO_DEPTH: usize = 5;

/// Only every Nth bin contributes a vertex, bounding curve size
pub const PATH_BIN_STRIDE: usize = 2;

/// One curve vertex in the caller's coordinate space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// An ordered list of vertices forming a renderable curve
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectrumPath {
    pub points: Vec<Point>,
}

/// The rectangle curves are mapped into, in the caller's coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveBounds {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl CurveBounds {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }
}

/// Normalized horizontal position of a frequency on the log axis
///
/// 20Hz maps to 0.0 and 20kHz to 1.0, monotonically increasing in
/// between. Frequencies outside the audible range land outside [0, 1].
#[inline]
pub fn frequency_position(frequency: f32) -> f32 {
    (frequency / MIN_FREQUENCY).log10() / (MAX_FREQUENCY / MIN_FREQUENCY).log10()
}

/// Inverse of [`frequency_position`]
#[inline]
pub fn position_frequency(position: f32) -> f32 {
    MIN_FREQUENCY * (MAX_FREQUENCY / MIN_FREQUENCY).powf(position)
}

/// Linear dB-to-pixel mapping; non-finite values pin to the bottom edge
#[inline]
fn map_db_to_y(db: f32, floor_db: f32, bounds: &CurveBounds) -> f32 {
    if !db.is_finite() {
        return bounds.bottom();
    }
    let t = (db.max(floor_db) - floor_db) / -floor_db;
    bounds.bottom() + (bounds.top - bounds.bottom()) * t
}

/// Converts spectrum frames into curves, keeping the latest for display
pub struct PathGenerator {
    paths_tx: Producer<SpectrumPath>,
    paths_rx: Consumer<SpectrumPath>,
    /// Curve being assembled (reused between frames)
    scratch: SpectrumPath,
    /// Most recently completed curve, retained across empty polls
    latest: SpectrumPath,
}

impl PathGenerator {
    pub fn new() -> Self {
        let (paths_tx, paths_rx) = fifo::channel(PATH_FIFO_DEPTH, SpectrumPath::default);
        Self {
            paths_tx,
            paths_rx,
            scratch: SpectrumPath::default(),
            latest: SpectrumPath::default(),
        }
    }

    /// Map one frame into a curve and queue it for display
    ///
    /// `bin_width` is the frequency spacing of the frame's bins
    /// (sample rate / FFT size).
    pub fn generate(&mut self, frame: &SpectrumFrame, bounds: CurveBounds, bin_width: f32) {
        let points = &mut self.scratch.points;
        points.clear();

        let first = frame.first().copied().unwrap_or(MIN_DB);
        points.push(Point {
            x: bounds.left,
            y: map_db_to_y(first, MIN_DB, &bounds),
        });

        let mut bin = 1;
        while bin < frame.len() {
            let y = map_db_to_y(frame[bin], MIN_DB, &bounds);
            let position = frequency_position(bin as f32 * bin_width).clamp(0.0, 1.0);
            points.push(Point {
                x: bounds.left + position * bounds.width,
                y,
            });
            bin += PATH_BIN_STRIDE;
        }

        self.paths_tx.push(&self.scratch);
    }

    /// Advance `latest` to the newest completed curve, if any
    ///
    /// Returns `true` if a newer curve was available. When the FIFO is
    /// empty the previous curve stays published - an empty poll is not
    /// an error.
    pub fn sync_latest(&mut self) -> bool {
        self.paths_rx.pop_latest(&mut self.latest)
    }

    /// The most recently completed curve
    pub fn path(&self) -> &SpectrumPath {
        &self.latest
    }

    /// Curves queued but not yet synced
    pub fn paths_pending(&self) -> usize {
        self.paths_rx.len()
    }
}

impl Default for PathGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::{FFT_SIZE, NUM_BINS};

    const BIN_WIDTH: f32 = 48_000.0 / FFT_SIZE as f32;

    fn bounds() -> CurveBounds {
        CurveBounds::new(0.0, 0.0, 600.0, 200.0)
    }

    #[test]
    fn test_log_mapping_endpoints() {
        assert!((frequency_position(20.0)).abs() < 1e-6);
        assert!((frequency_position(20_000.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_log_mapping_monotonic() {
        let mut prev = frequency_position(20.0);
        let mut freq = 25.0;
        while freq <= 20_000.0 {
            let pos = frequency_position(freq);
            assert!(pos > prev, "Mapping must increase at {}Hz", freq);
            prev = pos;
            freq *= 1.25;
        }
    }

    #[test]
    fn test_log_mapping_roundtrip() {
        for freq in [20.0, 100.0, 1_000.0, 9_999.0, 20_000.0] {
            let back = position_frequency(frequency_position(freq));
            assert!((back - freq).abs() / freq < 1e-4);
        }
    }

    #[test]
    fn test_silence_frame_hugs_bottom() {
        let mut gen = PathGenerator::new();
        let frame: SpectrumFrame = vec![MIN_DB; NUM_BINS];
        gen.generate(&frame, bounds(), BIN_WIDTH);
        assert!(gen.sync_latest());

        for p in &gen.path().points {
            assert_eq!(p.y, bounds().bottom());
        }
    }

    #[test]
    fn test_full_scale_frame_hits_top() {
        let mut gen = PathGenerator::new();
        let frame: SpectrumFrame = vec![0.0; NUM_BINS];
        gen.generate(&frame, bounds(), BIN_WIDTH);
        assert!(gen.sync_latest());

        for p in &gen.path().points {
            assert_eq!(p.y, bounds().top);
        }
    }

    #[test]
    fn test_non_finite_values_pin_to_bottom() {
        let mut gen = PathGenerator::new();
        let mut frame: SpectrumFrame = vec![-20.0; NUM_BINS];
        frame[3] = f32::NAN;
        frame[5] = f32::INFINITY;
        gen.generate(&frame, bounds(), BIN_WIDTH);
        assert!(gen.sync_latest());

        for p in &gen.path().points {
            assert!(p.y.is_finite());
            assert!(p.y <= bounds().bottom());
        }
        // Bin 3 and 5 are stride-aligned vertices (1, 3, 5, ...)
        assert_eq!(gen.path().points[2].y, bounds().bottom());
        assert_eq!(gen.path().points[3].y, bounds().bottom());
    }

    #[test]
    fn test_vertex_count_bounded_by_stride() {
        let mut gen = PathGenerator::new();
        let frame: SpectrumFrame = vec![-30.0; NUM_BINS];
        gen.generate(&frame, bounds(), BIN_WIDTH);
        assert!(gen.sync_latest());

        // Start point plus one vertex per strided bin
        let strided = (1..NUM_BINS).step_by(PATH_BIN_STRIDE).count();
        assert_eq!(gen.path().points.len(), strided + 1);
    }

    #[test]
    fn test_points_stay_inside_bounds() {
        let mut gen = PathGenerator::new();
        let frame: SpectrumFrame = (0..NUM_BINS)
            .map(|i| -((i % 90) as f32))
            .collect();
        let b = CurveBounds::new(10.0, 5.0, 300.0, 150.0);
        gen.generate(&frame, b, BIN_WIDTH);
        assert!(gen.sync_latest());

        for p in &gen.path().points {
            assert!(p.x >= b.left && p.x <= b.right());
            assert!(p.y >= b.top && p.y <= b.bottom());
        }
    }

    #[test]
    fn test_path_fifo_overwrites_oldest() {
        let mut gen = PathGenerator::new();
        let frame: SpectrumFrame = vec![-10.0; NUM_BINS];
        for _ in 0..PATH_FIFO_DEPTH + 3 {
            gen.generate(&frame, bounds(), BIN_WIDTH);
        }
        assert_eq!(gen.paths_pending(), PATH_FIFO_DEPTH);
    }

    #[test]
    fn test_empty_poll_retains_last_path() {
        let mut gen = PathGenerator::new();
        let frame: SpectrumFrame = vec![-10.0; NUM_BINS];
        gen.generate(&frame, bounds(), BIN_WIDTH);
        assert!(gen.sync_latest());
        let before = gen.path().clone();

        assert!(!gen.sync_latest(), "No new path should be available");
        assert_eq!(*gen.path(), before);
    }
}
