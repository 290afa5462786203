//! EQ Band Settings
//!
//! Value types describing the four logical bands of the equalizer:
//! a low-cut, two parametric peaks, and a high-cut. A [`ChainSettings`]
//! is an immutable snapshot - the audio thread compares snapshots to
//! decide when coefficients need recomputing, so every type here is
//! `Copy + PartialEq`.

use biquad::Q_BUTTERWORTH_F32;

/// Frequency range shared by every band (Hz)
pub const MIN_FREQUENCY: f32 = 20.0;
pub const MAX_FREQUENCY: f32 = 20_000.0;

/// Q range shared by every band
pub const MIN_Q: f32 = 0.025;
pub const MAX_Q: f32 = 10.0;

/// Peak gain range (dB)
pub const MAX_GAIN_DB: f32 = 24.0;

/// Rolloff steepness of a cut filter
///
/// Each step adds one cascaded second-order section, so the filter
/// order is `2 * (index + 1)` and the rolloff is `12 * (index + 1)`
/// dB per octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slope {
    Db12,
    Db24,
    Db36,
    Db48,
}

impl Slope {
    /// All slopes in choice order (index 0 = gentlest)
    pub const ALL: [Slope; 4] = [Slope::Db12, Slope::Db24, Slope::Db36, Slope::Db48];

    /// Choice index (0-3)
    pub fn index(self) -> usize {
        match self {
            Slope::Db12 => 0,
            Slope::Db24 => 1,
            Slope::Db36 => 2,
            Slope::Db48 => 3,
        }
    }

    /// Slope for a choice index; out-of-range indices clamp to the steepest
    pub fn from_index(index: usize) -> Self {
        *Slope::ALL.get(index).unwrap_or(&Slope::Db48)
    }

    /// Number of cascaded second-order sections this slope requires (1-4)
    pub fn sections(self) -> usize {
        self.index() + 1
    }

    /// Total filter order (2, 4, 6 or 8)
    pub fn order(self) -> usize {
        2 * self.sections()
    }

    /// Display label, e.g. "24 dB/oct"
    pub fn label(self) -> &'static str {
        match self {
            Slope::Db12 => "12 dB/oct",
            Slope::Db24 => "24 dB/oct",
            Slope::Db36 => "36 dB/oct",
            Slope::Db48 => "48 dB/oct",
        }
    }
}

impl Default for Slope {
    fn default() -> Self {
        Slope::Db12
    }
}

/// Settings for a cut (low-cut or high-cut) band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutBand {
    /// Corner frequency in Hz
    pub frequency: f32,
    /// Resonance; stored and persisted, the Butterworth cascade itself
    /// uses fixed per-stage Qs
    pub q: f32,
    pub slope: Slope,
    pub bypassed: bool,
}

impl CutBand {
    pub fn new(frequency: f32) -> Self {
        Self {
            frequency,
            q: Q_BUTTERWORTH_F32,
            slope: Slope::default(),
            bypassed: false,
        }
    }
}

/// Settings for a parametric peak band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakBand {
    /// Center frequency in Hz
    pub frequency: f32,
    /// Boost/cut in dB (negative = cut)
    pub gain_db: f32,
    pub q: f32,
    pub bypassed: bool,
}

impl PeakBand {
    pub fn new(frequency: f32) -> Self {
        Self {
            frequency,
            gain_db: 0.0,
            q: 1.0,
            bypassed: false,
        }
    }
}

/// Complete snapshot of all four bands
///
/// Bands are listed in processing order: low-cut, peak 1, peak 2, high-cut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainSettings {
    pub low_cut: CutBand,
    pub peak1: PeakBand,
    pub peak2: PeakBand,
    pub high_cut: CutBand,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            low_cut: CutBand::new(MIN_FREQUENCY),
            peak1: PeakBand::new(500.0),
            peak2: PeakBand::new(2_000.0),
            high_cut: CutBand::new(MAX_FREQUENCY),
        }
    }
}
