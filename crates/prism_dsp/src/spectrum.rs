//! FFT Frame Generation
//!
//! Turns the sample blocks delivered by the analysis FIFO into magnitude
//! spectra: a rolling window of the most recent `FFT_SIZE` samples is
//! tapered with a Blackman-Harris window, transformed, normalized, and
//! converted to decibels with an explicit silence floor. Finished frames
//! go into a small overwrite-oldest FIFO for the path generator.
//!
//! Everything here runs on the non-real-time analysis side; the only
//! contact with the audio thread is through the lock-free block FIFO.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::fifo::{self, Consumer, Producer};

/// FFT window length in samples (power of two)
/// 4096 at 48kHz gives ~11.7Hz bin resolution, enough to separate the
/// lowest EQ bands visually.
pub const FFT_SIZE: usize = 4096;

/// Number of magnitude bins per frame (positive frequencies only)
pub const NUM_BINS: usize = FFT_SIZE / 2;

/// Decibel value substituted for silence; nothing in a frame goes below it
pub const MIN_DB: f32 = -96.0;

/// How many finished frames the FIFO holds before overwriting the oldest
pub const FRAME_FIFO_DEPTH: usize = 5;

/// One magnitude spectrum: `NUM_BINS` dB values, floored at [`MIN_DB`]
pub type SpectrumFrame = Vec<f32>;

/// Convert linear gain to decibels with a defined floor
///
/// Zero or negative gain maps to `floor_db`, never to -inf or NaN.
#[inline]
pub fn gain_to_db(gain: f32, floor_db: f32) -> f32 {
    if gain > 0.0 {
        (20.0 * gain.log10()).max(floor_db)
    } else {
        floor_db
    }
}

/// Pre-computed 4-term Blackman-Harris window
///
/// Chosen over Hann for its much lower sidelobes (-92dB), which keeps
/// narrow-band EQ changes visible next to strong neighbors.
struct BlackmanHarrisWindow {
    coeffs: Vec<f32>,
}

impl BlackmanHarrisWindow {
    fn new() -> Self {
        const A0: f32 = 0.35875;
        const A1: f32 = 0.48829;
        const A2: f32 = 0.14128;
        const A3: f32 = 0.01168;

        let coeffs = (0..FFT_SIZE)
            .map(|n| {
                let x = 2.0 * std::f32::consts::PI * n as f32 / (FFT_SIZE - 1) as f32;
                A0 - A1 * x.cos() + A2 * (2.0 * x).cos() - A3 * (3.0 * x).cos()
            })
            .collect();
        Self { coeffs }
    }
}

/// Produces dB magnitude frames from incoming sample blocks
pub struct FftFrameGenerator {
    /// Rolling analysis window; newest samples at the tail
    rolling: Vec<f32>,
    window: BlackmanHarrisWindow,
    fft: Arc<dyn Fft<f32>>,
    /// Working buffer for the in-place transform
    scratch: Vec<Complex<f32>>,
    /// Frame being assembled (reused between calls)
    frame: SpectrumFrame,
    frames_tx: Producer<SpectrumFrame>,
}

impl FftFrameGenerator {
    /// Create a generator and the consumer half of its frame FIFO
    pub fn new() -> (Self, Consumer<SpectrumFrame>) {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);

        let (frames_tx, frames_rx) = fifo::channel(FRAME_FIFO_DEPTH, || vec![MIN_DB; NUM_BINS]);

        (
            Self {
                rolling: vec![0.0; FFT_SIZE],
                window: BlackmanHarrisWindow::new(),
                fft,
                scratch: vec![Complex::new(0.0, 0.0); FFT_SIZE],
                frame: vec![MIN_DB; NUM_BINS],
                frames_tx,
            },
            frames_rx,
        )
    }

    /// Append a block to the rolling window; the oldest samples fall off
    pub fn push_block(&mut self, block: &[f32]) {
        let len = block.len().min(FFT_SIZE);
        if len == 0 {
            return;
        }
        self.rolling.copy_within(len.., 0);
        self.rolling[FFT_SIZE - len..].copy_from_slice(&block[block.len() - len..]);
    }

    /// Window + transform the current rolling buffer into a dB frame
    /// and push it into the frame FIFO
    pub fn produce_frame(&mut self) {
        for (i, out) in self.scratch.iter_mut().enumerate() {
            *out = Complex::new(self.rolling[i] * self.window.coeffs[i], 0.0);
        }
        self.fft.process(&mut self.scratch);

        for (bin, value) in self.frame.iter_mut().enumerate() {
            let mut magnitude = self.scratch[bin].norm() / NUM_BINS as f32;
            if !magnitude.is_finite() {
                magnitude = 0.0;
            }
            *value = gain_to_db(magnitude, MIN_DB);
        }

        self.frames_tx.push(&self.frame);
    }

    /// Number of frames queued but not yet consumed
    pub fn frames_pending(&self) -> usize {
        self.frames_tx.len()
    }
}
