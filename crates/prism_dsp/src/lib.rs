//! Prism DSP - Equalizer Signal Path
//!
//! This crate provides the signal path of the Prism parametric EQ:
//! - 4-band filter chain (low-cut, two peaks, high-cut) built from
//!   cascaded BiQuad sections, based on the RBJ Audio EQ Cookbook and
//!   Butterworth pole decomposition
//! - Lock-free SPSC block FIFOs for handing audio to the analysis side
//! - Windowed-FFT spectrum pipeline producing renderable curves
//! - Analytic response curve computed from coefficients, not audio
//!
//! # Architecture
//!
//! ```text
//! audio thread (hard real-time)        analysis task (periodic, 60Hz)
//! ┌──────────────────────────┐         ┌────────────────────────────┐
//! │ settings snapshot        │         │ SpectrumAnalyzer per chan  │
//! │  └▶ CoefficientFactory   │  blocks │  blocks ─▶ FFT frames      │
//! │      └▶ FilterChain ─────┼──fifo──▶│  frames ─▶ SpectrumPath    │
//! │          process in place│         │ ResponseCurve from settings│
//! └──────────────────────────┘         └────────────────────────────┘
//! ```
//!
//! The processing path never allocates, locks, or blocks; the only
//! cross-thread resource is the overwrite-oldest FIFO.

mod analyzer;
mod bands;
mod chain;
pub mod coefficients;
mod error;
pub mod fifo;
mod path;
mod response;
mod spectrum;

// Re-export the filter crate's standard Q for callers building defaults
pub use biquad::Q_BUTTERWORTH_F32;

pub use analyzer::SpectrumAnalyzer;
pub use bands::{
    ChainSettings, CutBand, PeakBand, Slope, MAX_FREQUENCY, MAX_GAIN_DB, MAX_Q, MIN_FREQUENCY,
    MIN_Q,
};
pub use chain::{
    FilterChain, HIGH_CUT_START, LOW_CUT_START, NUM_SECTIONS, PEAK1_INDEX, PEAK2_INDEX,
};
pub use coefficients::{Cascade, IDENTITY, MAX_CUT_SECTIONS};
pub use error::DspError;
pub use fifo::ChannelSampleFifo;
pub use path::{
    frequency_position, position_frequency, CurveBounds, PathGenerator, Point, SpectrumPath,
    PATH_BIN_STRIDE, PATH_FIFO_DEPTH,
};
pub use response::{section_magnitude, ResponseCurve};
pub use spectrum::{
    gain_to_db, FftFrameGenerator, SpectrumFrame, FFT_SIZE, FRAME_FIFO_DEPTH, MIN_DB, NUM_BINS,
};
