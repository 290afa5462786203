//! Persistent Settings Management
//!
//! Saves and restores the EQ parameter tree as a flat, named key→value
//! JSON document. The signal path never reads this directly - it only
//! ever consumes the `ChainSettings` snapshot materialized from the
//! [`ParamTable`].
//!
//! # Storage Locations
//! - Linux: `~/.config/prism/settings.json`
//! - Windows: `%APPDATA%\prism\settings.json`
//! - macOS: `~/Library/Application Support/prism/settings.json`

use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use prism_dsp::{ChainSettings, Slope};

use crate::params::{ParamId, ParamTable};

/// The persisted parameter tree, one named entry per control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqSettings {
    #[serde(rename = "LowCut Freq")]
    pub low_cut_freq: f32,
    #[serde(rename = "LowCut Q")]
    pub low_cut_q: f32,
    #[serde(rename = "LowCut Slope")]
    pub low_cut_slope: u32,
    #[serde(rename = "LowCut Bypass")]
    pub low_cut_bypass: bool,

    #[serde(rename = "HighCut Freq")]
    pub high_cut_freq: f32,
    #[serde(rename = "HighCut Q")]
    pub high_cut_q: f32,
    #[serde(rename = "HighCut Slope")]
    pub high_cut_slope: u32,
    #[serde(rename = "HighCut Bypass")]
    pub high_cut_bypass: bool,

    #[serde(rename = "Peak1 Freq")]
    pub peak1_freq: f32,
    #[serde(rename = "Peak1 Gain")]
    pub peak1_gain_db: f32,
    #[serde(rename = "Peak1 Q")]
    pub peak1_q: f32,
    #[serde(rename = "Peak1 Bypass")]
    pub peak1_bypass: bool,

    #[serde(rename = "Peak2 Freq")]
    pub peak2_freq: f32,
    #[serde(rename = "Peak2 Gain")]
    pub peak2_gain_db: f32,
    #[serde(rename = "Peak2 Q")]
    pub peak2_q: f32,
    #[serde(rename = "Peak2 Bypass")]
    pub peak2_bypass: bool,
}

impl Default for EqSettings {
    fn default() -> Self {
        Self {
            low_cut_freq: ParamId::LowCutFreq.default_value(),
            low_cut_q: ParamId::LowCutQ.default_value(),
            low_cut_slope: 0,
            low_cut_bypass: false,
            high_cut_freq: ParamId::HighCutFreq.default_value(),
            high_cut_q: ParamId::HighCutQ.default_value(),
            high_cut_slope: 0,
            high_cut_bypass: false,
            peak1_freq: ParamId::Peak1Freq.default_value(),
            peak1_gain_db: 0.0,
            peak1_q: ParamId::Peak1Q.default_value(),
            peak1_bypass: false,
            peak2_freq: ParamId::Peak2Freq.default_value(),
            peak2_gain_db: 0.0,
            peak2_q: ParamId::Peak2Q.default_value(),
            peak2_bypass: false,
        }
    }
}

impl EqSettings {
    /// Load settings from disk, or return defaults if missing/corrupt
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                match fs::File::open(&path) {
                    Ok(file) => match serde_json::from_reader(file) {
                        Ok(settings) => {
                            info!("Settings loaded from {:?}", path);
                            return settings;
                        }
                        Err(e) => {
                            error!("Failed to parse settings file: {}", e);
                        }
                    },
                    Err(e) => {
                        error!("Failed to open settings file: {}", e);
                    }
                }
            }
        }

        info!("Using default settings");
        Self::default()
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<(), String> {
        let path = Self::config_path().ok_or("Could not determine config path")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let file = fs::File::create(&path).map_err(|e| e.to_string())?;
        serde_json::to_writer_pretty(file, self).map_err(|e| e.to_string())?;

        info!("Settings saved to {:?}", path);
        Ok(())
    }

    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "prism", "prism")
            .map(|proj| proj.config_dir().join("settings.json"))
    }

    /// Capture the current values of a parameter table
    pub fn from_params(params: &ParamTable) -> Self {
        Self {
            low_cut_freq: params.get(ParamId::LowCutFreq),
            low_cut_q: params.get(ParamId::LowCutQ),
            low_cut_slope: params.get(ParamId::LowCutSlope).round().max(0.0) as u32,
            low_cut_bypass: params.get(ParamId::LowCutBypass) >= 0.5,
            high_cut_freq: params.get(ParamId::HighCutFreq),
            high_cut_q: params.get(ParamId::HighCutQ),
            high_cut_slope: params.get(ParamId::HighCutSlope).round().max(0.0) as u32,
            high_cut_bypass: params.get(ParamId::HighCutBypass) >= 0.5,
            peak1_freq: params.get(ParamId::Peak1Freq),
            peak1_gain_db: params.get(ParamId::Peak1Gain),
            peak1_q: params.get(ParamId::Peak1Q),
            peak1_bypass: params.get(ParamId::Peak1Bypass) >= 0.5,
            peak2_freq: params.get(ParamId::Peak2Freq),
            peak2_gain_db: params.get(ParamId::Peak2Gain),
            peak2_q: params.get(ParamId::Peak2Q),
            peak2_bypass: params.get(ParamId::Peak2Bypass) >= 0.5,
        }
    }

    /// Write every value into a parameter table (clamping applies)
    pub fn apply_to(&self, params: &ParamTable) {
        params.set(ParamId::LowCutFreq, self.low_cut_freq);
        params.set(ParamId::LowCutQ, self.low_cut_q);
        params.set(ParamId::LowCutSlope, self.low_cut_slope as f32);
        params.set(ParamId::LowCutBypass, bool_param(self.low_cut_bypass));
        params.set(ParamId::HighCutFreq, self.high_cut_freq);
        params.set(ParamId::HighCutQ, self.high_cut_q);
        params.set(ParamId::HighCutSlope, self.high_cut_slope as f32);
        params.set(ParamId::HighCutBypass, bool_param(self.high_cut_bypass));
        params.set(ParamId::Peak1Freq, self.peak1_freq);
        params.set(ParamId::Peak1Gain, self.peak1_gain_db);
        params.set(ParamId::Peak1Q, self.peak1_q);
        params.set(ParamId::Peak1Bypass, bool_param(self.peak1_bypass));
        params.set(ParamId::Peak2Freq, self.peak2_freq);
        params.set(ParamId::Peak2Gain, self.peak2_gain_db);
        params.set(ParamId::Peak2Q, self.peak2_q);
        params.set(ParamId::Peak2Bypass, bool_param(self.peak2_bypass));
    }

    /// Materialize the snapshot the DSP consumes
    pub fn chain_settings(&self) -> ChainSettings {
        let mut settings = ChainSettings::default();
        settings.low_cut.frequency = self.low_cut_freq;
        settings.low_cut.q = self.low_cut_q;
        settings.low_cut.slope = Slope::from_index(self.low_cut_slope as usize);
        settings.low_cut.bypassed = self.low_cut_bypass;
        settings.high_cut.frequency = self.high_cut_freq;
        settings.high_cut.q = self.high_cut_q;
        settings.high_cut.slope = Slope::from_index(self.high_cut_slope as usize);
        settings.high_cut.bypassed = self.high_cut_bypass;
        settings.peak1.frequency = self.peak1_freq;
        settings.peak1.gain_db = self.peak1_gain_db;
        settings.peak1.q = self.peak1_q;
        settings.peak1.bypassed = self.peak1_bypass;
        settings.peak2.frequency = self.peak2_freq;
        settings.peak2.gain_db = self.peak2_gain_db;
        settings.peak2.q = self.peak2_q;
        settings.peak2.bypassed = self.peak2_bypass;
        settings
    }
}

fn bool_param(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn busy_settings() -> EqSettings {
        EqSettings {
            low_cut_freq: 80.0,
            low_cut_slope: 2,
            high_cut_freq: 15_000.0,
            high_cut_slope: 1,
            high_cut_bypass: true,
            peak1_freq: 350.0,
            peak1_gain_db: -4.5,
            peak1_q: 2.2,
            peak2_freq: 3_200.0,
            peak2_gain_db: 6.0,
            peak2_bypass: true,
            ..EqSettings::default()
        }
    }

    #[test]
    fn test_default_matches_param_defaults() {
        let params = ParamTable::new();
        assert_eq!(EqSettings::default(), EqSettings::from_params(&params));
        assert_eq!(
            EqSettings::default().chain_settings(),
            ChainSettings::default()
        );
    }

    #[test]
    fn test_serialization_uses_parameter_names() {
        let json = serde_json::to_string(&EqSettings::default()).unwrap();
        for id in ParamId::ALL {
            assert!(
                json.contains(id.name()),
                "Persisted tree must contain key {:?}",
                id.name()
            );
        }
    }

    #[test]
    fn test_json_roundtrip_is_identical() {
        let settings = busy_settings();
        let json = serde_json::to_string_pretty(&settings).unwrap();
        let restored: EqSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, restored);
    }

    #[test]
    fn test_roundtrip_reproduces_identical_coefficients() {
        // Snapshot -> serialize -> deserialize -> reapply must yield
        // bit-identical coefficients
        let settings = busy_settings();

        let params = ParamTable::new();
        settings.apply_to(&params);
        let before = params.snapshot();

        let json = serde_json::to_string(&EqSettings::from_params(&params)).unwrap();
        let restored: EqSettings = serde_json::from_str(&json).unwrap();
        restored.apply_to(&params);
        let after = params.snapshot();

        assert_eq!(before, after);

        let rate = 48_000.0;
        let a = prism_dsp::coefficients::peak(&before.peak1, rate);
        let b = prism_dsp::coefficients::peak(&after.peak1, rate);
        assert_eq!(a.b0, b.b0);
        assert_eq!(a.b1, b.b1);
        assert_eq!(a.b2, b.b2);
        assert_eq!(a.a1, b.a1);
        assert_eq!(a.a2, b.a2);

        let ca = prism_dsp::coefficients::low_cut(&before.low_cut, rate);
        let cb = prism_dsp::coefficients::low_cut(&after.low_cut, rate);
        assert_eq!(ca.active, cb.active);
        for (sa, sb) in ca.sections.iter().zip(cb.sections.iter()) {
            assert_eq!(sa.b0, sb.b0);
            assert_eq!(sa.a1, sb.a1);
            assert_eq!(sa.a2, sb.a2);
        }
    }

    #[test]
    fn test_apply_clamps_out_of_range_values() {
        let mut settings = EqSettings::default();
        settings.peak1_gain_db = 80.0;
        settings.low_cut_freq = 1.0;
        settings.low_cut_slope = 11;

        let params = ParamTable::new();
        settings.apply_to(&params);

        assert_eq!(params.get(ParamId::Peak1Gain), prism_dsp::MAX_GAIN_DB);
        assert_eq!(params.get(ParamId::LowCutFreq), prism_dsp::MIN_FREQUENCY);
        // Slope choice saturates at the steepest
        assert_eq!(params.snapshot().low_cut.slope, Slope::Db48);
    }

    #[test]
    fn test_chain_settings_matches_param_route() {
        // Going through the parameter table or straight from the tree
        // must produce the same snapshot (modulo clamping)
        let settings = busy_settings();

        let params = ParamTable::new();
        settings.apply_to(&params);

        assert_eq!(settings.chain_settings(), params.snapshot());
    }
}
