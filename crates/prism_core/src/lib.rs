//! Prism Core - Audio Engine
//!
//! This crate hosts the Prism EQ's real-time side and its glue:
//! - Audio device enumeration and stream management (via CPAL)
//! - The hard-real-time callback running the filter chain
//! - Lock-free parameter surface shared between UI and audio threads
//! - Persisted settings as a flat named parameter tree
//! - The UI-facing spectrum outlet draining the analysis FIFOs
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     Control / UI thread                    │
//! │   AudioEngine ──commands──▶  ◀──events──  SpectrumOutlet   │
//! │        └─ ParamTable (atomics) ─┐              ▲           │
//! └─────────────────────────────────┼──────────────┼───────────┘
//!                                   ▼              │ block FIFOs
//! ┌────────────────────────────────────────────────┼───────────┐
//! │                      Audio thread              │           │
//! │   Capture ──rtrb──▶ FilterChain ──▶ Output ────┘           │
//! │              (zero allocation in this path)                │
//! └────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod device;
mod engine;
mod error;
mod message;
mod outlet;
mod params;
mod settings;
mod stream;

pub use config::{EngineConfig, StreamConfig};
pub use device::{find_input_device, find_output_device, AudioDevice, DeviceType};
pub use engine::AudioEngine;
pub use error::{EngineError, EngineResult};
pub use message::{Command, Event};
pub use outlet::{RenderedCurves, SpectrumOutlet};
pub use params::{ParamId, ParamTable, NUM_PARAMS, SLOPE_LABELS};
pub use settings::EqSettings;
pub use stream::{AudioStream, SharedState};

// Re-export DSP types for convenience
pub use prism_dsp::{ChainSettings, CurveBounds, FilterChain, Point, Slope, SpectrumPath};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        // Verify public API is accessible
        let _config = EngineConfig::default();
        let _params = ParamTable::new();
        let _settings = EqSettings::default();
    }
}
