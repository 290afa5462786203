//! Per-Channel Spectrum Analyzer
//!
//! The non-real-time end of the analysis pipeline for one channel:
//! drains sample blocks from the cross-thread FIFO, rolls them into the
//! FFT frame generator, and maps finished frames into renderable
//! curves. Driven periodically (e.g. at 60Hz) by the display side; it
//! never touches the filter chain or blocks on the audio thread.

use crate::fifo::Consumer;
use crate::path::{CurveBounds, PathGenerator, SpectrumPath};
use crate::spectrum::{FftFrameGenerator, SpectrumFrame, FFT_SIZE, MIN_DB, NUM_BINS};

/// One channel's block-to-curve pipeline
pub struct SpectrumAnalyzer {
    blocks: Consumer<Vec<f32>>,
    /// Scratch block reused across polls
    block: Vec<f32>,
    frames: FftFrameGenerator,
    frames_rx: Consumer<SpectrumFrame>,
    frame: SpectrumFrame,
    paths: PathGenerator,
    /// Frequency spacing of FFT bins (sample rate / FFT size)
    bin_width: f32,
}

impl SpectrumAnalyzer {
    /// Wire an analyzer to the consumer half of a channel's block FIFO
    pub fn new(blocks: Consumer<Vec<f32>>, block_len: usize, sample_rate: f32) -> Self {
        let (frames, frames_rx) = FftFrameGenerator::new();
        Self {
            blocks,
            block: vec![0.0; block_len.max(1)],
            frames,
            frames_rx,
            frame: vec![MIN_DB; NUM_BINS],
            paths: PathGenerator::new(),
            bin_width: sample_rate / FFT_SIZE as f32,
        }
    }

    /// Consume everything available and refresh the published curve
    ///
    /// Blocks are consumed in the exact order they were pushed; each one
    /// advances the rolling window and yields one FFT frame. When
    /// nothing new arrived the previously published curve stays valid.
    pub fn drain(&mut self, bounds: CurveBounds) {
        while self.blocks.pop(&mut self.block) {
            self.frames.push_block(&self.block);
            self.frames.produce_frame();
        }

        while self.frames_rx.pop(&mut self.frame) {
            self.paths.generate(&self.frame, bounds, self.bin_width);
        }

        self.paths.sync_latest();
    }

    /// The most recently completed spectrum curve
    pub fn path(&self) -> &SpectrumPath {
        self.paths.path()
    }

    /// Blocks waiting in the cross-thread FIFO
    pub fn blocks_pending(&self) -> usize {
        self.blocks.len()
    }
}
