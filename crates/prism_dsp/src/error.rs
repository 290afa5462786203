//! DSP Error Types

use thiserror::Error;

/// Errors that can occur during DSP operations
#[derive(Error, Debug)]
pub enum DspError {
    #[error("Invalid section index: {0} (must be 0-9)")]
    InvalidSection(usize),

    #[error("Sample rate must be positive, got {0}")]
    InvalidSampleRate(f32),
}
