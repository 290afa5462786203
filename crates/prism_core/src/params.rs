//! Parameter Surface
//!
//! One entry per EQ control, each with a display name, numeric range,
//! default, and (for the slope choices) enumerated labels. Values live
//! in a [`ParamTable`] of atomics shared between the UI writer and the
//! real-time reader: the audio callback materializes a `ChainSettings`
//! snapshot from it every block with sixteen relaxed loads and no
//! locking.

use std::sync::atomic::{AtomicU32, Ordering};

use prism_dsp::{
    ChainSettings, CutBand, PeakBand, Slope, MAX_FREQUENCY, MAX_GAIN_DB, MAX_Q, MIN_FREQUENCY,
    MIN_Q,
};

/// Labels for the slope choice parameters, in choice order
pub const SLOPE_LABELS: [&str; 4] = ["12 dB/oct", "24 dB/oct", "36 dB/oct", "48 dB/oct"];

/// Identifier of one EQ control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    LowCutFreq,
    LowCutQ,
    LowCutSlope,
    LowCutBypass,
    HighCutFreq,
    HighCutQ,
    HighCutSlope,
    HighCutBypass,
    Peak1Freq,
    Peak1Gain,
    Peak1Q,
    Peak1Bypass,
    Peak2Freq,
    Peak2Gain,
    Peak2Q,
    Peak2Bypass,
}

/// Total number of parameters
pub const NUM_PARAMS: usize = 16;

impl ParamId {
    /// All parameters in declaration order
    pub const ALL: [ParamId; NUM_PARAMS] = [
        ParamId::LowCutFreq,
        ParamId::LowCutQ,
        ParamId::LowCutSlope,
        ParamId::LowCutBypass,
        ParamId::HighCutFreq,
        ParamId::HighCutQ,
        ParamId::HighCutSlope,
        ParamId::HighCutBypass,
        ParamId::Peak1Freq,
        ParamId::Peak1Gain,
        ParamId::Peak1Q,
        ParamId::Peak1Bypass,
        ParamId::Peak2Freq,
        ParamId::Peak2Gain,
        ParamId::Peak2Q,
        ParamId::Peak2Bypass,
    ];

    /// Display name as it appears in the persisted parameter tree
    pub fn name(self) -> &'static str {
        match self {
            ParamId::LowCutFreq => "LowCut Freq",
            ParamId::LowCutQ => "LowCut Q",
            ParamId::LowCutSlope => "LowCut Slope",
            ParamId::LowCutBypass => "LowCut Bypass",
            ParamId::HighCutFreq => "HighCut Freq",
            ParamId::HighCutQ => "HighCut Q",
            ParamId::HighCutSlope => "HighCut Slope",
            ParamId::HighCutBypass => "HighCut Bypass",
            ParamId::Peak1Freq => "Peak1 Freq",
            ParamId::Peak1Gain => "Peak1 Gain",
            ParamId::Peak1Q => "Peak1 Q",
            ParamId::Peak1Bypass => "Peak1 Bypass",
            ParamId::Peak2Freq => "Peak2 Freq",
            ParamId::Peak2Gain => "Peak2 Gain",
            ParamId::Peak2Q => "Peak2 Q",
            ParamId::Peak2Bypass => "Peak2 Bypass",
        }
    }

    /// Valid value range (inclusive)
    pub fn range(self) -> (f32, f32) {
        match self {
            ParamId::LowCutFreq
            | ParamId::HighCutFreq
            | ParamId::Peak1Freq
            | ParamId::Peak2Freq => (MIN_FREQUENCY, MAX_FREQUENCY),
            ParamId::LowCutQ | ParamId::HighCutQ | ParamId::Peak1Q | ParamId::Peak2Q => {
                (MIN_Q, MAX_Q)
            }
            ParamId::LowCutSlope | ParamId::HighCutSlope => (0.0, 3.0),
            ParamId::Peak1Gain | ParamId::Peak2Gain => (-MAX_GAIN_DB, MAX_GAIN_DB),
            ParamId::LowCutBypass
            | ParamId::HighCutBypass
            | ParamId::Peak1Bypass
            | ParamId::Peak2Bypass => (0.0, 1.0),
        }
    }

    pub fn default_value(self) -> f32 {
        match self {
            ParamId::LowCutFreq => MIN_FREQUENCY,
            ParamId::HighCutFreq => MAX_FREQUENCY,
            ParamId::Peak1Freq => 500.0,
            ParamId::Peak2Freq => 2_000.0,
            ParamId::LowCutQ | ParamId::HighCutQ => prism_dsp::Q_BUTTERWORTH_F32,
            ParamId::Peak1Q | ParamId::Peak2Q => 1.0,
            _ => 0.0,
        }
    }

    /// Labels for choice-type parameters, None for continuous ones
    pub fn choice_labels(self) -> Option<&'static [&'static str]> {
        match self {
            ParamId::LowCutSlope | ParamId::HighCutSlope => Some(&SLOPE_LABELS),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Lock-free parameter store shared between UI and audio threads
///
/// Values are f32 bits in `AtomicU32` cells (there is no `AtomicF32`);
/// bypass flags are 0.0/1.0, slopes are choice indices. Writers clamp
/// into the parameter's range; non-finite writes reset to the default.
pub struct ParamTable {
    values: [AtomicU32; NUM_PARAMS],
}

impl ParamTable {
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|i| {
                AtomicU32::new(ParamId::ALL[i].default_value().to_bits())
            }),
        }
    }

    /// Store a parameter value, clamped into its range
    pub fn set(&self, id: ParamId, value: f32) {
        let (lo, hi) = id.range();
        let value = if value.is_finite() {
            value.clamp(lo, hi)
        } else {
            id.default_value()
        };
        self.values[id.index()].store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self, id: ParamId) -> f32 {
        f32::from_bits(self.values[id.index()].load(Ordering::Relaxed))
    }

    fn get_bool(&self, id: ParamId) -> bool {
        self.get(id) >= 0.5
    }

    fn get_slope(&self, id: ParamId) -> Slope {
        Slope::from_index(self.get(id).round().max(0.0) as usize)
    }

    /// Materialize a settings snapshot for the filter chain
    ///
    /// # Real-time Safety
    /// Sixteen relaxed atomic loads; no allocation, no locking.
    pub fn snapshot(&self) -> ChainSettings {
        ChainSettings {
            low_cut: CutBand {
                frequency: self.get(ParamId::LowCutFreq),
                q: self.get(ParamId::LowCutQ),
                slope: self.get_slope(ParamId::LowCutSlope),
                bypassed: self.get_bool(ParamId::LowCutBypass),
            },
            peak1: PeakBand {
                frequency: self.get(ParamId::Peak1Freq),
                gain_db: self.get(ParamId::Peak1Gain),
                q: self.get(ParamId::Peak1Q),
                bypassed: self.get_bool(ParamId::Peak1Bypass),
            },
            peak2: PeakBand {
                frequency: self.get(ParamId::Peak2Freq),
                gain_db: self.get(ParamId::Peak2Gain),
                q: self.get(ParamId::Peak2Q),
                bypassed: self.get_bool(ParamId::Peak2Bypass),
            },
            high_cut: CutBand {
                frequency: self.get(ParamId::HighCutFreq),
                q: self.get(ParamId::HighCutQ),
                slope: self.get_slope(ParamId::HighCutSlope),
                bypassed: self.get_bool(ParamId::HighCutBypass),
            },
        }
    }

    /// Reset every parameter to its default
    pub fn reset(&self) {
        for id in ParamId::ALL {
            self.set(id, id.default_value());
        }
    }
}

impl Default for ParamTable {
    fn default() -> Self {
        Self::new()
    }
}
