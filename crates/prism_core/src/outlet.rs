//! Spectrum Outlet
//!
//! The UI-facing end of the analysis pipeline: owns both channels'
//! analyzers and recomputes the analytic response curve from the
//! parameter table. Driven by the display side at its own rate (e.g.
//! 60Hz); completely decoupled from the audio thread - it only ever
//! reads the block FIFOs and the parameter atomics.

use std::sync::Arc;

use prism_dsp::fifo::Consumer;
use prism_dsp::{CurveBounds, ResponseCurve, SpectrumAnalyzer, SpectrumPath, MAX_GAIN_DB};

use crate::params::ParamTable;

/// Everything the renderer needs for one frame
#[derive(Debug, Clone)]
pub struct RenderedCurves {
    /// Live spectrum of the left channel
    pub spectrum_left: SpectrumPath,
    /// Live spectrum of the right channel
    pub spectrum_right: SpectrumPath,
    /// Theoretical response of the current EQ settings
    pub response: SpectrumPath,
}

/// Consumer-side bundle handed out when a session starts
pub struct SpectrumOutlet {
    left: SpectrumAnalyzer,
    right: SpectrumAnalyzer,
    params: Arc<ParamTable>,
    sample_rate: f32,
}

impl SpectrumOutlet {
    pub fn new(
        left_blocks: Consumer<Vec<f32>>,
        right_blocks: Consumer<Vec<f32>>,
        block_len: usize,
        sample_rate: f32,
        params: Arc<ParamTable>,
    ) -> Self {
        Self {
            left: SpectrumAnalyzer::new(left_blocks, block_len, sample_rate),
            right: SpectrumAnalyzer::new(right_blocks, block_len, sample_rate),
            params,
            sample_rate,
        }
    }

    /// Drain pending audio and produce all three curves
    ///
    /// When no new audio arrived since the last call, the previous
    /// spectrum curves are returned again; the response curve always
    /// reflects the current parameters.
    pub fn render(&mut self, bounds: CurveBounds) -> RenderedCurves {
        self.left.drain(bounds);
        self.right.drain(bounds);

        let response = ResponseCurve::new(&self.params.snapshot(), self.sample_rate).curve(
            bounds,
            -MAX_GAIN_DB,
            MAX_GAIN_DB,
        );

        RenderedCurves {
            spectrum_left: self.left.path().clone(),
            spectrum_right: self.right.path().clone(),
            response,
        }
    }

    /// Blocks waiting in each channel's FIFO (left, right)
    pub fn blocks_pending(&self) -> (usize, usize) {
        (self.left.blocks_pending(), self.right.blocks_pending())
    }
}
